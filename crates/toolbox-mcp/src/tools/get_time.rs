//! Tool: get_time — Current time as ISO-8601, Unix seconds, or local text.

use chrono::{Local, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::types::{McpError, McpResult, ToolCallResult, ToolDefinition};

#[derive(Debug, Deserialize)]
struct TimeParams {
    #[serde(default = "default_format")]
    format: String,
}

fn default_format() -> String {
    "iso".to_string()
}

/// Return the tool definition for get_time.
pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "get_time".to_string(),
        description: Some("Get the current time".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "format": {
                    "type": "string",
                    "enum": ["iso", "unix", "locale"],
                    "default": "iso",
                    "description": "Output format"
                }
            }
        }),
    }
}

/// Execute the get_time tool.
pub async fn execute(args: Value) -> McpResult<ToolCallResult> {
    let params: TimeParams =
        serde_json::from_value(args).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    let text = match params.format.as_str() {
        "iso" => Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "unix" => Utc::now().timestamp().to_string(),
        "locale" => Local::now().format("%c").to_string(),
        other => {
            return Err(McpError::InvalidParams(format!(
                "Unknown format '{other}', expected iso, unix or locale"
            )))
        }
    };

    Ok(ToolCallResult::text(text))
}
