mod conn;
mod room;
mod session;
mod signaling;

pub use conn::ConnId;
pub use room::RoomId;
pub use session::{CandidateInit, SdpKind, SessionDescription};
pub use signaling::{ClientMessage, ServerMessage};
