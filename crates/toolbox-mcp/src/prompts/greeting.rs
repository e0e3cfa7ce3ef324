//! Prompt template: greeting.

use crate::types::{PromptArgument, PromptDefinition};

/// Template text.
pub const TEMPLATE: &str = "Write a {{style}} greeting addressed to {{name}}. \
Keep it to two sentences.";

/// Return the prompt definition for greeting.
pub fn definition() -> PromptDefinition {
    PromptDefinition {
        name: "greeting".to_string(),
        description: Some("Compose a short greeting for someone".to_string()),
        arguments: Some(vec![
            PromptArgument {
                name: "name".to_string(),
                description: Some("Who to greet".to_string()),
                required: true,
            },
            PromptArgument {
                name: "style".to_string(),
                description: Some("Tone of the greeting, e.g. formal or casual".to_string()),
                required: false,
            },
        ]),
    }
}
