//! Prompt template: code_review.

use crate::types::{PromptArgument, PromptDefinition};

/// Template text.
pub const TEMPLATE: &str = "Please review the following {{language}} code. \
Pay particular attention to {{focus}}.\n\n{{code}}";

/// Return the prompt definition for code_review.
pub fn definition() -> PromptDefinition {
    PromptDefinition {
        name: "code_review".to_string(),
        description: Some("Ask for a review of a code snippet".to_string()),
        arguments: Some(vec![
            PromptArgument {
                name: "language".to_string(),
                description: Some("Programming language of the snippet".to_string()),
                required: true,
            },
            PromptArgument {
                name: "code".to_string(),
                description: Some("The code to review".to_string()),
                required: true,
            },
            PromptArgument {
                name: "focus".to_string(),
                description: Some("What to focus on, e.g. performance".to_string()),
                required: false,
            },
        ]),
    }
}
