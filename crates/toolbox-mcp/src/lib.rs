//! Toolbox MCP server: session management and capability negotiation for
//! the Model Context Protocol.
//!
//! Clients negotiate once per session; every later request is checked against
//! the negotiated set before it reaches a tool, resource, or prompt. Sessions
//! are served over stdio, a single-shot HTTP endpoint, or an SSE stream.

pub mod config;
pub mod prompts;
pub mod protocol;
pub mod resources;
pub mod session;
pub mod streaming;
pub mod tools;
pub mod transport;
pub mod types;

pub use config::ServerConfig;
pub use protocol::ProtocolHandler;
pub use session::SessionStore;
pub use streaming::StreamingManager;
pub use transport::StdioTransport;
