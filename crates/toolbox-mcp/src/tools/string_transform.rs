//! Tool: string_transform — Simple text transformations.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::types::{McpError, McpResult, ToolCallResult, ToolDefinition};

const OPERATIONS: &[&str] = &[
    "uppercase",
    "lowercase",
    "reverse",
    "length",
    "word_count",
    "capitalize",
];

#[derive(Debug, Deserialize)]
struct TransformParams {
    text: String,
    operation: String,
}

/// Return the tool definition for string_transform.
pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "string_transform".to_string(),
        description: Some("Transform text (case, reverse, length, word count)".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "text": { "type": "string", "description": "Input text" },
                "operation": { "type": "string", "enum": OPERATIONS }
            },
            "required": ["text", "operation"]
        }),
    }
}

/// Execute the string_transform tool.
pub async fn execute(args: Value) -> McpResult<ToolCallResult> {
    let params: TransformParams =
        serde_json::from_value(args).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    let text = &params.text;
    let output = match params.operation.as_str() {
        "uppercase" => text.to_uppercase(),
        "lowercase" => text.to_lowercase(),
        "reverse" => text.chars().rev().collect(),
        "length" => text.chars().count().to_string(),
        "word_count" => text.split_whitespace().count().to_string(),
        "capitalize" => capitalize_words(text),
        other => {
            return Err(McpError::InvalidParams(format!(
                "Unknown operation '{other}', expected one of {}",
                OPERATIONS.join(", ")
            )))
        }
    };

    Ok(ToolCallResult::text(output))
}

fn capitalize_words(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
