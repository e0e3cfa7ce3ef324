//! Resource registration and dispatch for MCP resources.

use crate::types::{
    McpError, McpResult, ReadResourceResult, ResourceDefinition, ResourceTemplateDefinition,
};

use super::templates::{README_URI, SERVER_INFO_URI};
use super::{docs, server_info, templates};

/// Registry of all available MCP resources.
pub struct ResourceRegistry;

impl ResourceRegistry {
    /// List all resource URI templates.
    pub fn list_templates() -> Vec<ResourceTemplateDefinition> {
        templates::list_templates()
    }

    /// List all concrete (non-templated) resources.
    pub fn list_resources() -> Vec<ResourceDefinition> {
        templates::list_resources()
    }

    /// Read a resource by URI. Unknown URIs are [`McpError::ResourceNotFound`].
    pub fn read(uri: &str) -> McpResult<ReadResourceResult> {
        match uri {
            SERVER_INFO_URI => server_info::read(),
            README_URI => docs::read(),
            _ => Err(McpError::ResourceNotFound(uri.to_string())),
        }
    }
}
