//! MCP resource implementations — static, read-only documents.

pub mod docs;
pub mod registry;
pub mod server_info;
pub mod templates;

pub use registry::ResourceRegistry;
