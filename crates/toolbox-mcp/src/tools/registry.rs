//! Tool registration and dispatch.

use serde_json::Value;

use crate::types::{McpError, McpResult, ToolCallResult, ToolDefinition};

use super::{calculate, echo, get_time, random_number, string_transform};

/// Registry of all available MCP tools.
pub struct ToolRegistry;

impl ToolRegistry {
    /// List all available tool definitions.
    pub fn list_tools() -> Vec<ToolDefinition> {
        vec![
            echo::definition(),
            calculate::definition(),
            get_time::definition(),
            random_number::definition(),
            string_transform::definition(),
        ]
    }

    /// Call a tool by name. Unknown names are [`McpError::ToolNotFound`].
    pub async fn call(name: &str, arguments: Option<Value>) -> McpResult<ToolCallResult> {
        let args = arguments.unwrap_or(Value::Object(serde_json::Map::new()));

        match name {
            "echo" => echo::execute(args).await,
            "calculate" => calculate::execute(args).await,
            "get_time" => get_time::execute(args).await,
            "random_number" => random_number::execute(args).await,
            "string_transform" => string_transform::execute(args).await,
            _ => Err(McpError::ToolNotFound(name.to_string())),
        }
    }

    /// Call a tool, folding every failure into an error-flagged result.
    pub async fn invoke(name: &str, arguments: Option<Value>) -> ToolCallResult {
        match Self::call(name, arguments).await {
            Ok(result) => result,
            Err(e) => {
                tracing::debug!(tool = %name, "Tool call failed: {e}");
                ToolCallResult::error(e.to_string())
            }
        }
    }
}
