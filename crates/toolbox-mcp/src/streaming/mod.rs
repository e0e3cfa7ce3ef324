//! Streaming support — outbound stream handles and the streaming session manager.

pub mod manager;
pub mod stream;

pub use manager::{DisconnectGuard, MessageOutcome, OpenedStream, StreamingManager};
pub use stream::OutboundStream;
