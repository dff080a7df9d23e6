pub mod model;

pub use model::{
    CandidateInit, ClientMessage, ConnId, RoomId, SdpKind, ServerMessage, SessionDescription,
};
