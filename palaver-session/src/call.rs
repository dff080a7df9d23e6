use crate::endpoint::{LocalTracks, MediaEndpoint, MediaProfile, MediaSource, SignalSink};
use crate::error::{CallError, NegotiationError};
use crate::negotiation::{ConnectivityVerdict, NegotiationState, Negotiator, Role};
use palaver_core::{CandidateInit, ClientMessage, ConnId, SessionDescription};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One call, owned end to end: a negotiator over its own endpoint, the
/// remote's connection id once known, and the local capture state. Built per
/// call and dropped with it; nothing here is shared across calls.
///
/// Inbound `ServerMessage`s map one-to-one onto the handler methods; local
/// media events arrive through `tracks_changed`/`tracks_applied` and
/// `local_candidate`.
pub struct CallSession<E: MediaEndpoint> {
    negotiator: Negotiator<E>,
    endpoint_factory: Box<dyn Fn() -> E + Send + Sync>,
    sink: Arc<dyn SignalSink>,
    media: Arc<dyn MediaSource>,
    local_id: Option<ConnId>,
    remote: Option<ConnId>,
    local_tracks: Option<LocalTracks>,
    renegotiate_wanted: bool,
}

impl<E: MediaEndpoint> CallSession<E> {
    pub fn new(
        endpoint_factory: impl Fn() -> E + Send + Sync + 'static,
        sink: Arc<dyn SignalSink>,
        media: Arc<dyn MediaSource>,
    ) -> Self {
        let endpoint = endpoint_factory();
        Self {
            negotiator: Negotiator::new(endpoint, Role::Impolite),
            endpoint_factory: Box::new(endpoint_factory),
            sink,
            media,
            local_id: None,
            remote: None,
            local_tracks: None,
            renegotiate_wanted: false,
        }
    }

    pub fn negotiator(&self) -> &Negotiator<E> {
        &self.negotiator
    }

    pub fn remote(&self) -> Option<&ConnId> {
        self.remote.as_ref()
    }

    pub fn has_local_tracks(&self) -> bool {
        self.local_tracks.is_some()
    }

    /// The relay's `Welcome`: remember our own connection id. Needed to
    /// break the tie when both sides place the initial call at once.
    pub fn welcome(&mut self, conn_id: ConnId) {
        self.local_id = Some(conn_id);
    }

    /// A `PeerJoined` fan-out: remember who we can call.
    pub fn peer_joined(&mut self, conn_id: ConnId) {
        info!("peer available: {}", conn_id);
        self.remote = Some(conn_id);
    }

    /// Start the call: capture media, offer, send `CallOffer`. The caller
    /// takes the impolite role for any later glare.
    pub async fn place_call(&mut self) -> Result<(), CallError> {
        let to = self.remote.clone().ok_or(CallError::NoRemote)?;

        self.acquire_media().await?;
        self.negotiator.assume_role(Role::Impolite);

        if let Some(offer) = self.negotiator.create_offer().await? {
            self.sink.send(ClientMessage::CallOffer { to, offer }).await;
        }
        Ok(())
    }

    /// An `IncomingCall`: capture media, answer, send `CallAccepted`. The
    /// callee takes the polite role.
    pub async fn incoming_call(
        &mut self,
        from: ConnId,
        offer: SessionDescription,
    ) -> Result<(), CallError> {
        info!("incoming call from {}", from);
        self.remote = Some(from.clone());

        self.acquire_media().await?;
        // Plain callee: polite. With our own offer already outstanding, both
        // sides placed the call at once and both would flip polite here, so
        // the role must come from an asymmetric fact instead: the lower
        // connection id keeps its offer, the higher one yields.
        let role = if self.negotiator.state() == NegotiationState::HaveLocalOffer {
            self.pair_role(&from)
        } else {
            Role::Polite
        };
        self.negotiator.assume_role(role);

        if let Some(answer) = self.negotiator.accept_offer(offer).await? {
            self.sink
                .send(ClientMessage::CallAccepted { to: from, answer })
                .await;
        }
        Ok(())
    }

    /// The remote accepted our `CallOffer`.
    pub async fn call_accepted(&mut self, answer: SessionDescription) -> Result<(), CallError> {
        self.finish_answer(answer).await
    }

    /// A renegotiation offer from the remote; answer it.
    pub async fn negotiation_offer(
        &mut self,
        from: ConnId,
        offer: SessionDescription,
    ) -> Result<(), CallError> {
        if let Some(answer) = self.negotiator.accept_offer(offer).await? {
            self.sink
                .send(ClientMessage::NegotiationAnswer { to: from, answer })
                .await;
        }
        Ok(())
    }

    /// The remote's answer to our renegotiation offer.
    pub async fn negotiation_final(
        &mut self,
        answer: SessionDescription,
    ) -> Result<(), CallError> {
        self.finish_answer(answer).await
    }

    /// A candidate (or the end-of-candidates sentinel) from the remote.
    pub async fn candidate(&mut self, candidate: Option<CandidateInit>) {
        self.negotiator.add_candidate(candidate).await;
    }

    /// A locally gathered candidate to forward; `None` signals end of
    /// gathering and is forwarded so the remote's bookkeeping completes.
    /// Dropped when no remote is known yet.
    pub async fn local_candidate(&self, candidate: Option<CandidateInit>) {
        let Some(to) = self.remote.clone() else {
            return;
        };
        self.sink
            .send(ClientMessage::CandidateExchange { to, candidate })
            .await;
    }

    /// The set of actively-sent tracks changed; renegotiate once the media
    /// layer acknowledges the change via `tracks_applied`.
    pub fn tracks_changed(&mut self) {
        self.renegotiate_wanted = true;
    }

    /// Acknowledgment that track changes have landed on the endpoint. Only
    /// now is a fresh offer attempted, and only with live local tracks and a
    /// known remote; otherwise there is nothing to offer or nobody to send
    /// it to.
    pub async fn tracks_applied(&mut self) -> Result<(), CallError> {
        if !self.renegotiate_wanted {
            return Ok(());
        }
        self.renegotiate_wanted = false;

        let Some(to) = self.remote.clone() else {
            return Ok(());
        };
        if self.local_tracks.is_none() {
            return Ok(());
        }

        if let Some(offer) = self.negotiator.create_offer().await? {
            self.sink
                .send(ClientMessage::NegotiationOffer { to, offer })
                .await;
        }
        Ok(())
    }

    /// Connectivity-layer failure: restart on the existing session while the
    /// negotiator allows it, then rebuild from scratch.
    pub async fn connectivity_failed(&mut self) -> Result<(), CallError> {
        match self.negotiator.on_connectivity_failed().await {
            ConnectivityVerdict::Restarted => Ok(()),
            ConnectivityVerdict::Escalate => self.rebuild_and_reoffer().await,
        }
    }

    /// Idempotent teardown.
    pub async fn hang_up(&mut self) {
        self.negotiator.close().await;
    }

    async fn finish_answer(&mut self, answer: SessionDescription) -> Result<(), CallError> {
        match self.negotiator.apply_answer(answer).await {
            Ok(()) => Ok(()),
            Err(err @ NegotiationError::InvalidState { .. }) => {
                warn!("{}; rebuilding session", err);
                self.rebuild_and_reoffer().await
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Universal recovery: close everything and start over on a brand-new
    /// endpoint, keeping the glare role. With live tracks and a known remote
    /// the call is re-offered immediately.
    async fn rebuild_and_reoffer(&mut self) -> Result<(), CallError> {
        self.negotiator.close().await;
        let role = self.negotiator.role();
        self.negotiator = Negotiator::new((self.endpoint_factory)(), role);
        debug!("session rebuilt");

        let (Some(to), Some(_)) = (self.remote.clone(), self.local_tracks.as_ref()) else {
            return Ok(());
        };
        if let Some(offer) = self.negotiator.create_offer().await? {
            self.sink.send(ClientMessage::CallOffer { to, offer }).await;
        }
        Ok(())
    }

    /// Glare role for a pair, identical on both ends: the side with the
    /// lower connection id is impolite. Without a known local id we yield.
    fn pair_role(&self, remote: &ConnId) -> Role {
        match &self.local_id {
            Some(local) if local.0 < remote.0 => Role::Impolite,
            _ => Role::Polite,
        }
    }

    /// Capture local media: preferred constraints first, minimal once as a
    /// fallback, then give up and abort call setup.
    async fn acquire_media(&mut self) -> Result<(), CallError> {
        match self.media.acquire(MediaProfile::Preferred).await {
            Ok(tracks) => {
                self.local_tracks = Some(tracks);
                Ok(())
            }
            Err(e) => {
                warn!("preferred media profile failed ({}), trying minimal", e);
                match self.media.acquire(MediaProfile::Minimal).await {
                    Ok(tracks) => {
                        self.local_tracks = Some(tracks);
                        Ok(())
                    }
                    Err(e) => Err(CallError::MediaUnavailable(e)),
                }
            }
        }
    }
}
