//! Resource definitions and URI constants.

use crate::types::{ResourceDefinition, ResourceTemplateDefinition};

/// URI of the server information resource.
pub const SERVER_INFO_URI: &str = "toolbox://server/info";

/// URI of the readme resource.
pub const README_URI: &str = "toolbox://docs/readme";

/// Return all resource URI templates. This catalog has none.
pub fn list_templates() -> Vec<ResourceTemplateDefinition> {
    Vec::new()
}

/// Return all concrete resource definitions.
pub fn list_resources() -> Vec<ResourceDefinition> {
    vec![
        ResourceDefinition {
            uri: SERVER_INFO_URI.to_string(),
            name: "Server Information".to_string(),
            description: Some("Server identity, protocol versions and tool names".to_string()),
            mime_type: Some("application/json".to_string()),
        },
        ResourceDefinition {
            uri: README_URI.to_string(),
            name: "Readme".to_string(),
            description: Some("How to use this server".to_string()),
            mime_type: Some("text/markdown".to_string()),
        },
    ]
}
