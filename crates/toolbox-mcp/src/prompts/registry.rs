//! Prompt registration and dispatch for MCP prompt templates.

use serde_json::Value;

use crate::types::{McpError, McpResult, PromptDefinition, PromptGetResult, PromptMessage};

use super::template::substitute;
use super::{code_review, greeting};

/// Registry of all available MCP prompts.
pub struct PromptRegistry;

impl PromptRegistry {
    /// List all available prompt definitions.
    pub fn list_prompts() -> Vec<PromptDefinition> {
        vec![greeting::definition(), code_review::definition()]
    }

    /// Raw template text for `name`.
    pub fn template(name: &str) -> Option<&'static str> {
        match name {
            "greeting" => Some(greeting::TEMPLATE),
            "code_review" => Some(code_review::TEMPLATE),
            _ => None,
        }
    }

    /// Expand a prompt with the given arguments.
    ///
    /// Missing arguments are not an error; their placeholders stay in the text.
    pub fn get(name: &str, arguments: Option<Value>) -> McpResult<PromptGetResult> {
        let template =
            Self::template(name).ok_or_else(|| McpError::PromptNotFound(name.to_string()))?;

        let args = match arguments {
            None | Some(Value::Null) => serde_json::Map::new(),
            Some(Value::Object(map)) => map,
            Some(_) => {
                return Err(McpError::InvalidParams(
                    "Prompt arguments must be an object".to_string(),
                ))
            }
        };

        let description = Self::list_prompts()
            .into_iter()
            .find(|p| p.name == name)
            .and_then(|p| p.description);

        Ok(PromptGetResult {
            description,
            messages: vec![PromptMessage::user(substitute(template, &args))],
        })
    }
}
