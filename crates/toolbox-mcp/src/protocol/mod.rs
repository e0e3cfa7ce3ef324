//! MCP protocol layer — validation, capability negotiation and routing.

pub mod handler;
pub mod method;
pub mod negotiation;
pub mod validator;

pub use handler::ProtocolHandler;
pub use method::Method;
pub use negotiation::negotiate;
