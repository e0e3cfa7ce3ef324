//! MCP prompt templates.

pub mod code_review;
pub mod greeting;
pub mod registry;
pub mod template;

pub use registry::PromptRegistry;
