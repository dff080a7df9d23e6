pub mod call;
pub mod candidate_queue;
pub mod endpoint;
pub mod error;
pub mod negotiation;

pub use call::CallSession;
pub use candidate_queue::CandidateQueue;
pub use endpoint::{LocalTracks, MediaEndpoint, MediaProfile, MediaSource, SignalSink};
pub use error::{CallError, EndpointError, NegotiationError};
pub use negotiation::{
    ConnectivityVerdict, MAX_CONNECTIVITY_RESTARTS, NegotiationState, Negotiator, Role,
};
