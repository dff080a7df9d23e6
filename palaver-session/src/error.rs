use crate::negotiation::NegotiationState;
use thiserror::Error;

/// Failure inside the media endpoint capability. The session layer treats
/// the cause as opaque; what matters is which operation failed.
#[derive(Debug, Clone, Error)]
#[error("media endpoint: {0}")]
pub struct EndpointError(pub String);

impl EndpointError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

#[derive(Debug, Error)]
pub enum NegotiationError {
    /// The operation does not exist in the current state. Not retried in
    /// place; the session must be torn down and rebuilt.
    #[error("{op} attempted in state {state:?}: renegotiation required")]
    InvalidState {
        op: &'static str,
        state: NegotiationState,
    },

    #[error(transparent)]
    Endpoint(#[from] EndpointError),
}

#[derive(Debug, Error)]
pub enum CallError {
    #[error("no remote participant to address")]
    NoRemote,

    /// Capture failed under the preferred profile and the minimal fallback.
    #[error("local media unavailable: {0}")]
    MediaUnavailable(EndpointError),

    #[error(transparent)]
    Negotiation(#[from] NegotiationError),
}
