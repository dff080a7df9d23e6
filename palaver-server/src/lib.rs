pub mod registry;
pub mod signaling;

pub use registry::RoomRegistry;
pub use signaling::{SignalingService, ws_handler};
