//! `{{placeholder}}` substitution.

use serde_json::{Map, Value};

/// Fill `{{key}}` placeholders in `template` from `args`.
///
/// Each argument replaces only the first occurrence of its placeholder.
/// Placeholders without a matching argument are left as they are.
/// Non-string values are inserted as their JSON text.
pub fn substitute(template: &str, args: &Map<String, Value>) -> String {
    let mut text = template.to_string();
    for (key, value) in args {
        let placeholder = format!("{{{{{key}}}}}");
        let replacement = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        text = text.replacen(&placeholder, &replacement, 1);
    }
    text
}
