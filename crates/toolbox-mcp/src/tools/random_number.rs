//! Tool: random_number — Random number in an inclusive range.

use rand::Rng;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::types::{McpError, McpResult, ToolCallResult, ToolDefinition};

#[derive(Debug, Deserialize)]
struct RandomParams {
    min: f64,
    max: f64,
    #[serde(default = "default_integer")]
    integer: bool,
}

fn default_integer() -> bool {
    true
}

/// Return the tool definition for random_number.
pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "random_number".to_string(),
        description: Some("Generate a random number between min and max (inclusive)".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "min": { "type": "number", "description": "Lower bound (inclusive)" },
                "max": { "type": "number", "description": "Upper bound (inclusive)" },
                "integer": { "type": "boolean", "default": true, "description": "Truncate to an integer" }
            },
            "required": ["min", "max"]
        }),
    }
}

/// Execute the random_number tool.
pub async fn execute(args: Value) -> McpResult<ToolCallResult> {
    let params: RandomParams =
        serde_json::from_value(args).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    let text = generate(params.min, params.max, params.integer)?;
    Ok(ToolCallResult::text(text))
}

fn generate(min: f64, max: f64, integer: bool) -> McpResult<String> {
    if !min.is_finite() || !max.is_finite() {
        return Err(McpError::InvalidParams("min and max must be finite".to_string()));
    }
    if min > max {
        return Err(McpError::ToolExecution(format!(
            "min ({min}) must be less than or equal to max ({max})"
        )));
    }

    let mut rng = rand::thread_rng();
    if integer {
        let (lo, hi) = (min.ceil(), max.floor());
        if lo > hi {
            return Err(McpError::ToolExecution(format!(
                "No integer lies between {min} and {max}"
            )));
        }
        let value = rng.gen_range(lo as i64..=hi as i64);
        Ok(value.to_string())
    } else if min == max {
        Ok(min.to_string())
    } else if !(max - min).is_finite() {
        Err(McpError::ToolExecution(format!(
            "Range from {min} to {max} is too wide"
        )))
    } else {
        Ok(rng.gen_range(min..=max).to_string())
    }
}
