//! Resource handler for `toolbox://server/info`.

use serde_json::json;

use crate::tools::ToolRegistry;
use crate::types::{
    McpResult, ReadResourceResult, ResourceContent, SERVER_NAME, SERVER_VERSION,
    SUPPORTED_PROTOCOL_VERSIONS,
};

use super::templates::SERVER_INFO_URI;

/// Read the server information document.
pub fn read() -> McpResult<ReadResourceResult> {
    let tools: Vec<String> = ToolRegistry::list_tools()
        .into_iter()
        .map(|t| t.name)
        .collect();

    let content = json!({
        "name": SERVER_NAME,
        "version": SERVER_VERSION,
        "protocol_versions": SUPPORTED_PROTOCOL_VERSIONS,
        "tools": tools,
    });

    Ok(ReadResourceResult {
        contents: vec![ResourceContent {
            uri: SERVER_INFO_URI.to_string(),
            mime_type: "application/json".to_string(),
            text: serde_json::to_string_pretty(&content)?,
        }],
    })
}
