use crate::error::EndpointError;
use async_trait::async_trait;
use palaver_core::{CandidateInit, ClientMessage, SessionDescription};

/// The connection capability the negotiator drives. Producing and consuming
/// SDP blobs and connectivity candidates happens behind this trait; the
/// session layer never looks inside either.
#[async_trait]
pub trait MediaEndpoint: Send + Sync {
    async fn create_offer(&self) -> Result<SessionDescription, EndpointError>;

    async fn create_answer(&self) -> Result<SessionDescription, EndpointError>;

    async fn set_local_description(&self, desc: SessionDescription) -> Result<(), EndpointError>;

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<(), EndpointError>;

    async fn add_candidate(&self, candidate: CandidateInit) -> Result<(), EndpointError>;

    /// Discard the outstanding local offer, returning the endpoint to its
    /// pre-offer state. Used on the polite side of a glare.
    async fn rollback(&self) -> Result<(), EndpointError>;

    /// Re-advertise connectivity candidates on the already-negotiated
    /// session, without tearing it down.
    async fn restart_connectivity(&self) -> Result<(), EndpointError>;

    async fn close(&self);
}

/// Capture quality requested from the media layer. `Minimal` is the one-shot
/// fallback when `Preferred` constraints cannot be satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaProfile {
    Preferred,
    Minimal,
}

/// What local capture produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalTracks {
    pub audio: bool,
    pub video: bool,
}

#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn acquire(&self, profile: MediaProfile) -> Result<LocalTracks, EndpointError>;
}

/// The orchestrator's handle on the signaling relay.
#[async_trait]
pub trait SignalSink: Send + Sync {
    async fn send(&self, msg: ClientMessage);
}
