use crate::candidate_queue::CandidateQueue;
use crate::endpoint::MediaEndpoint;
use crate::error::NegotiationError;
use palaver_core::{CandidateInit, SessionDescription};
use tracing::{debug, trace, warn};

/// Offer/answer progress for one session. `Closed` is terminal; recovery
/// from it means building a fresh `Negotiator`, never transitioning out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    Stable,
    HaveLocalOffer,
    Closed,
}

/// Glare tie-break, fixed when the call direction becomes known. The polite
/// side rolls back its own offer when offers cross; the impolite side
/// ignores the incoming one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Polite,
    Impolite,
}

/// Outcome of a connectivity failure report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityVerdict {
    /// A candidate restart was issued on the existing session.
    Restarted,
    /// Restarts are exhausted (or impossible); rebuild the session.
    Escalate,
}

/// Connectivity restarts attempted before a failure escalates to full
/// reconstruction.
pub const MAX_CONNECTIVITY_RESTARTS: u32 = 2;

/// Drives one endpoint through offer/answer exchange, buffering candidates
/// until a remote description exists.
///
/// All description-setting operations suspend on the endpoint and must
/// complete before the next is issued; the `offer_in_flight` slot is the
/// cooperative exclusion that serializes concurrent offer attempts on the
/// same session.
pub struct Negotiator<E: MediaEndpoint> {
    endpoint: E,
    role: Role,
    state: NegotiationState,
    offer_in_flight: bool,
    local: Option<SessionDescription>,
    remote: Option<SessionDescription>,
    pending: CandidateQueue,
    restarts: u32,
}

impl<E: MediaEndpoint> Negotiator<E> {
    pub fn new(endpoint: E, role: Role) -> Self {
        Self {
            endpoint,
            role,
            state: NegotiationState::Stable,
            offer_in_flight: false,
            local: None,
            remote: None,
            pending: CandidateQueue::new(),
            restarts: 0,
        }
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Fix the glare tie-break once the call direction is known.
    pub fn assume_role(&mut self, role: Role) {
        self.role = role;
    }

    pub fn local_description(&self) -> Option<&SessionDescription> {
        self.local.as_ref()
    }

    pub fn remote_description(&self) -> Option<&SessionDescription> {
        self.remote.as_ref()
    }

    pub fn pending_candidates(&self) -> usize {
        self.pending.len()
    }

    /// Produce and install a local offer. Returns `None` without touching
    /// the endpoint when a negotiation is already underway; callers treat
    /// that as "skip", not as an error.
    pub async fn create_offer(
        &mut self,
    ) -> Result<Option<SessionDescription>, NegotiationError> {
        if self.state != NegotiationState::Stable || self.offer_in_flight {
            debug!(
                state = ?self.state,
                in_flight = self.offer_in_flight,
                "negotiation already underway, skipping offer"
            );
            return Ok(None);
        }

        self.offer_in_flight = true;
        let offer = match self.endpoint.create_offer().await {
            Ok(offer) => offer,
            Err(e) => {
                self.offer_in_flight = false;
                return Err(e.into());
            }
        };
        if let Err(e) = self.endpoint.set_local_description(offer.clone()).await {
            self.offer_in_flight = false;
            return Err(e.into());
        }

        self.local = Some(offer.clone());
        self.state = NegotiationState::HaveLocalOffer;
        debug!("local offer set, awaiting answer");
        Ok(Some(offer))
    }

    /// Handle a remote offer. Under glare the polite side rolls back its own
    /// offer and answers; the impolite side returns `None` and keeps waiting
    /// for its answer. Returns the answer to forward when one was produced.
    pub async fn accept_offer(
        &mut self,
        remote_offer: SessionDescription,
    ) -> Result<Option<SessionDescription>, NegotiationError> {
        match self.state {
            NegotiationState::Closed => {
                return Err(NegotiationError::InvalidState {
                    op: "accept_offer",
                    state: self.state,
                });
            }
            NegotiationState::HaveLocalOffer => {
                if self.role == Role::Impolite {
                    debug!("glare: impolite side ignoring remote offer");
                    return Ok(None);
                }
                debug!("glare: polite side rolling back local offer");
                self.endpoint.rollback().await?;
                self.local = None;
                self.offer_in_flight = false;
                self.state = NegotiationState::Stable;
            }
            NegotiationState::Stable => {}
        }

        self.endpoint.set_remote_description(remote_offer.clone()).await?;
        self.remote = Some(remote_offer);
        self.apply_pending().await;

        let answer = self.endpoint.create_answer().await?;
        self.endpoint.set_local_description(answer.clone()).await?;
        self.local = Some(answer.clone());
        debug!("remote offer answered");
        Ok(Some(answer))
    }

    /// Install the remote answer to our outstanding offer. Any other state
    /// is an unrecoverable local/remote desync: the caller must discard this
    /// negotiator, build a fresh one, and re-offer if it still has tracks.
    pub async fn apply_answer(
        &mut self,
        remote_answer: SessionDescription,
    ) -> Result<(), NegotiationError> {
        if self.state != NegotiationState::HaveLocalOffer {
            return Err(NegotiationError::InvalidState {
                op: "apply_answer",
                state: self.state,
            });
        }

        self.endpoint.set_remote_description(remote_answer.clone()).await?;
        self.remote = Some(remote_answer);
        self.apply_pending().await;

        self.offer_in_flight = false;
        self.state = NegotiationState::Stable;
        debug!("remote answer applied, negotiation stable");
        Ok(())
    }

    /// Apply a candidate now if a remote description exists, otherwise
    /// buffer it. `None` is the end-of-candidates sentinel: it is carried
    /// through the same path but never reaches the endpoint.
    pub async fn add_candidate(&mut self, candidate: Option<CandidateInit>) {
        if self.remote.is_some() {
            self.apply_candidate(candidate).await;
        } else {
            trace!("no remote description yet, queueing candidate");
            self.pending.enqueue(candidate);
        }
    }

    async fn apply_pending(&mut self) {
        let buffered = self.pending.drain();
        if buffered.is_empty() {
            return;
        }
        debug!("applying {} buffered candidates", buffered.len());
        for candidate in buffered {
            self.apply_candidate(candidate).await;
        }
    }

    async fn apply_candidate(&mut self, candidate: Option<CandidateInit>) {
        let Some(candidate) = candidate else {
            trace!("end-of-candidates marker, nothing to apply");
            return;
        };
        // Candidate application is best-effort; a malformed or late one
        // must not abort the call.
        if let Err(e) = self.endpoint.add_candidate(candidate).await {
            warn!("failed to apply candidate: {}", e);
        }
    }

    /// React to a connectivity-layer failure: restart candidates on the
    /// existing session up to `MAX_CONNECTIVITY_RESTARTS`, then ask the
    /// caller to rebuild.
    pub async fn on_connectivity_failed(&mut self) -> ConnectivityVerdict {
        if self.state == NegotiationState::Closed {
            return ConnectivityVerdict::Escalate;
        }
        if self.restarts >= MAX_CONNECTIVITY_RESTARTS {
            warn!("connectivity restarts exhausted, escalating to rebuild");
            return ConnectivityVerdict::Escalate;
        }

        self.restarts += 1;
        warn!(attempt = self.restarts, "connectivity failed, restarting candidates");
        match self.endpoint.restart_connectivity().await {
            Ok(()) => ConnectivityVerdict::Restarted,
            Err(e) => {
                warn!("connectivity restart failed: {}", e);
                ConnectivityVerdict::Escalate
            }
        }
    }

    /// Release the endpoint and drop all negotiation state. Idempotent.
    pub async fn close(&mut self) {
        if self.state == NegotiationState::Closed {
            return;
        }
        self.endpoint.close().await;
        self.pending.clear();
        self.local = None;
        self.remote = None;
        self.offer_in_flight = false;
        self.restarts = 0;
        self.state = NegotiationState::Closed;
        debug!("negotiator closed");
    }
}
