//! The closed set of methods this server answers.

use crate::types::Capability;

/// Every method the router dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// `initialize`
    Initialize,
    /// `notifications/initialized`
    Initialized,
    /// `notifications/cancelled`
    Cancelled,
    /// `ping`
    Ping,
    /// `tools/list`
    ToolsList,
    /// `tools/call`
    ToolsCall,
    /// `resources/list`
    ResourcesList,
    /// `resources/read`
    ResourcesRead,
    /// `resources/templates/list`
    ResourceTemplatesList,
    /// `prompts/list`
    PromptsList,
    /// `prompts/get`
    PromptsGet,
    /// `logging/setLevel`
    LoggingSetLevel,
}

impl Method {
    /// Resolve an exact method name.
    pub fn from_name(name: &str) -> Option<Self> {
        let method = match name {
            "initialize" => Method::Initialize,
            "notifications/initialized" | "initialized" => Method::Initialized,
            "notifications/cancelled" => Method::Cancelled,
            "ping" => Method::Ping,
            "tools/list" => Method::ToolsList,
            "tools/call" => Method::ToolsCall,
            "resources/list" => Method::ResourcesList,
            "resources/read" => Method::ResourcesRead,
            "resources/templates/list" => Method::ResourceTemplatesList,
            "prompts/list" => Method::PromptsList,
            "prompts/get" => Method::PromptsGet,
            "logging/setLevel" => Method::LoggingSetLevel,
            _ => return None,
        };
        Some(method)
    }
}

/// Capability guarding a method name, decided by its prefix.
///
/// Works for names that are not in [`Method`] so unknown `tools/*` calls
/// still hit the gate before being reported as missing.
pub fn required_capability(method: &str) -> Option<Capability> {
    let (prefix, _) = method.split_once('/')?;
    match prefix {
        "tools" => Some(Capability::Tools),
        "resources" => Some(Capability::Resources),
        "prompts" => Some(Capability::Prompts),
        "logging" => Some(Capability::Logging),
        _ => None,
    }
}
