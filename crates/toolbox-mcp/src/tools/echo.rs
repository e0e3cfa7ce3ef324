//! Tool: echo — Return the message unchanged.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::types::{McpError, McpResult, ToolCallResult, ToolDefinition};

#[derive(Debug, Deserialize)]
struct EchoParams {
    message: String,
}

/// Return the tool definition for echo.
pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "echo".to_string(),
        description: Some("Echo back the provided message".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "message": { "type": "string", "description": "Message to echo" }
            },
            "required": ["message"]
        }),
    }
}

/// Execute the echo tool.
pub async fn execute(args: Value) -> McpResult<ToolCallResult> {
    let params: EchoParams =
        serde_json::from_value(args).map_err(|e| McpError::InvalidParams(e.to_string()))?;
    Ok(ToolCallResult::text(params.message))
}
