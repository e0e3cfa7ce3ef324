//! MCP tool implementations and the registry that dispatches to them.

pub mod calculate;
pub mod echo;
pub mod get_time;
pub mod random_number;
pub mod registry;
pub mod string_transform;

pub use registry::ToolRegistry;
