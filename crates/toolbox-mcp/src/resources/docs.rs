//! Resource handler for `toolbox://docs/readme`.

use crate::types::{McpResult, ReadResourceResult, ResourceContent};

use super::templates::README_URI;

const README: &str = "# Toolbox MCP\n\
\n\
Call `initialize` first. Only the capabilities both sides advertise are\n\
enabled for your session; calls outside them fail with -32601.\n\
\n\
## Tools\n\
\n\
- `echo` returns `message` unchanged.\n\
- `calculate` evaluates `expression` using + - * / and parentheses.\n\
- `get_time` returns the time as `iso`, `unix` or `locale`.\n\
- `random_number` picks a number in `[min, max]`; `integer` defaults to true.\n\
- `string_transform` applies `operation` to `text`.\n\
\n\
## Prompts\n\
\n\
- `greeting` and `code_review` fill `{{placeholders}}` from arguments.\n";

/// Read the readme document.
pub fn read() -> McpResult<ReadResourceResult> {
    Ok(ReadResourceResult {
        contents: vec![ResourceContent {
            uri: README_URI.to_string(),
            mime_type: "text/markdown".to_string(),
            text: README.to_string(),
        }],
    })
}
