//! Transports: stdio, single-shot HTTP and SSE streaming.

pub mod stdio;

#[cfg(feature = "sse")]
pub mod http;
#[cfg(feature = "sse")]
pub mod sse;

pub use stdio::StdioTransport;

#[cfg(feature = "sse")]
pub use sse::SseTransport;
