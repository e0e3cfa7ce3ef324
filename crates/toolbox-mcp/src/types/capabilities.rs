//! MCP capability and initialization types.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// MCP protocol version this server prefers.
pub const MCP_VERSION: &str = "2024-11-05";

/// Every protocol version the server accepts at initialize time.
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &[MCP_VERSION, "2025-03-26"];

/// Server name constant.
pub const SERVER_NAME: &str = "toolbox-mcp";

/// Server version constant.
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Implementation info for server or client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Implementation {
    /// Name of the implementation.
    #[serde(default)]
    pub name: String,
    /// Version string.
    #[serde(default)]
    pub version: String,
}

/// Client capabilities sent during initialization.
///
/// Every field is lenient: an absent, `null` or `false` entry means "not
/// advertised". Any other value (usually `{}`) means advertised.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientCapabilities {
    /// Experimental capability flags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experimental: Option<BTreeMap<String, Value>>,
    /// Sampling capability.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampling: Option<Value>,
    /// Roots capability.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roots: Option<Value>,
    /// Tools capability.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Value>,
    /// Resources capability.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Value>,
    /// Prompts capability.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompts: Option<Value>,
    /// Logging capability.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<Value>,
}

/// Server capabilities advertised during initialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerCapabilities {
    /// Experimental capabilities.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experimental: Option<BTreeMap<String, Value>>,
    /// Logging capability.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingCapability>,
    /// Prompts capability.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompts: Option<PromptsCapability>,
    /// Resources capability.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourcesCapability>,
    /// Tools capability.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsCapability>,
    /// Sampling capability. Servers rarely set this; negotiation ignores it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampling: Option<SamplingCapability>,
}

/// Sampling capability marker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SamplingCapability {}

/// Logging capability marker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingCapability {}

/// Prompts capability.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptsCapability {
    /// Whether the server supports prompts/list_changed notifications.
    #[serde(default)]
    pub list_changed: bool,
}

/// Resources capability.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourcesCapability {
    /// Whether the server supports resource subscriptions.
    #[serde(default)]
    pub subscribe: bool,
    /// Whether the server supports resources/list_changed notifications.
    #[serde(default)]
    pub list_changed: bool,
}

/// Tools capability.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsCapability {
    /// Whether the server supports tools/list_changed notifications.
    #[serde(default)]
    pub list_changed: bool,
}

/// The capability set actually active for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegotiatedCapabilities {
    /// tools/* methods allowed.
    pub tools: bool,
    /// resources/* methods allowed.
    pub resources: bool,
    /// prompts/* methods allowed.
    pub prompts: bool,
    /// logging/* methods allowed.
    pub logging: bool,
    /// Server may issue sampling requests to the client.
    pub sampling: bool,
    /// Per-flag experimental features.
    #[serde(default)]
    pub experimental: BTreeMap<String, bool>,
}

impl NegotiatedCapabilities {
    /// Whether `capability` is active.
    pub fn is_enabled(&self, capability: &Capability) -> bool {
        match capability {
            Capability::Tools => self.tools,
            Capability::Resources => self.resources,
            Capability::Prompts => self.prompts,
            Capability::Logging => self.logging,
            Capability::Sampling => self.sampling,
            Capability::Experimental(key) => self.experimental.get(key).copied().unwrap_or(false),
        }
    }
}

/// A named capability.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Capability {
    /// `tools`
    Tools,
    /// `resources`
    Resources,
    /// `prompts`
    Prompts,
    /// `logging`
    Logging,
    /// `sampling`
    Sampling,
    /// `experimental.<key>`
    Experimental(String),
}

impl Capability {
    /// The fixed (non-experimental) capabilities.
    pub const STANDARD: [Capability; 5] = [
        Capability::Tools,
        Capability::Resources,
        Capability::Prompts,
        Capability::Logging,
        Capability::Sampling,
    ];
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Tools => write!(f, "tools"),
            Capability::Resources => write!(f, "resources"),
            Capability::Prompts => write!(f, "prompts"),
            Capability::Logging => write!(f, "logging"),
            Capability::Sampling => write!(f, "sampling"),
            Capability::Experimental(key) => write!(f, "experimental.{key}"),
        }
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tools" => Ok(Capability::Tools),
            "resources" => Ok(Capability::Resources),
            "prompts" => Ok(Capability::Prompts),
            "logging" => Ok(Capability::Logging),
            "sampling" => Ok(Capability::Sampling),
            other => match other.strip_prefix("experimental.") {
                Some(key) if !key.is_empty() => Ok(Capability::Experimental(key.to_string())),
                _ => Err(format!("unknown capability: {other}")),
            },
        }
    }
}

/// Initialize request parameters from client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// Requested protocol version.
    #[serde(default)]
    pub protocol_version: String,
    /// Client capabilities.
    #[serde(default)]
    pub capabilities: ClientCapabilities,
    /// Client implementation info.
    #[serde(default)]
    pub client_info: Implementation,
}

/// Initialize response result from server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    /// Agreed protocol version.
    pub protocol_version: String,
    /// Server capabilities active for this session.
    pub capabilities: ServerCapabilities,
    /// Server implementation info.
    pub server_info: Implementation,
    /// Optional instructions for the client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    /// Boolean view of the negotiated set.
    #[serde(default)]
    pub negotiated_capabilities: NegotiatedCapabilities,
}

impl ServerCapabilities {
    /// Build the default capabilities for this server.
    pub fn default_capabilities() -> Self {
        Self {
            experimental: None,
            logging: Some(LoggingCapability {}),
            prompts: Some(PromptsCapability {
                list_changed: false,
            }),
            resources: Some(ResourcesCapability {
                subscribe: false,
                list_changed: false,
            }),
            tools: Some(ToolsCapability {
                list_changed: false,
            }),
            sampling: None,
        }
    }

    /// Keep only the entries that are active in `negotiated`.
    pub fn restricted_to(&self, negotiated: &NegotiatedCapabilities) -> Self {
        let experimental = self.experimental.as_ref().map(|flags| {
            flags
                .iter()
                .filter(|(key, _)| negotiated.experimental.get(*key).copied().unwrap_or(false))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect::<BTreeMap<_, _>>()
        });

        Self {
            experimental: experimental.filter(|flags| !flags.is_empty()),
            logging: self.logging.clone().filter(|_| negotiated.logging),
            prompts: self.prompts.clone().filter(|_| negotiated.prompts),
            resources: self.resources.clone().filter(|_| negotiated.resources),
            tools: self.tools.clone().filter(|_| negotiated.tools),
            sampling: None,
        }
    }
}

impl Implementation {
    /// This server's identity.
    pub fn server() -> Self {
        Self {
            name: SERVER_NAME.to_string(),
            version: SERVER_VERSION.to_string(),
        }
    }
}

impl InitializeResult {
    /// Default instructions sent to clients.
    pub const INSTRUCTIONS: &'static str = "Toolbox MCP server. \
         Use tools for small computations (echo, calculate, get_time, random_number, string_transform), \
         resources for server documentation and prompts for reusable message templates.";
}
