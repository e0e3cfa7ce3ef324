//! TOML configuration with defaults for every field.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::types::{
    LoggingCapability, McpError, McpResult, PromptsCapability, ResourcesCapability,
    ServerCapabilities, ToolsCapability,
};

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address for the HTTP transports.
    pub addr: String,
    /// Seconds of inactivity before a session is evicted.
    pub idle_timeout_secs: u64,
    /// Seconds between idle sweeps.
    pub sweep_interval_secs: u64,
    /// Upper bound on a single tool call, in seconds.
    pub tool_timeout_secs: u64,
    /// Maximum concurrent streaming sessions.
    pub max_sessions: usize,
    /// Session id used by the single-shot endpoint when the client sends none.
    pub default_session_id: String,
    /// Capabilities the server advertises.
    pub capabilities: CapabilityConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:3000".to_string(),
            idle_timeout_secs: 300,
            sweep_interval_secs: 60,
            tool_timeout_secs: 30,
            max_sessions: 10_000,
            default_session_id: "default".to_string(),
            capabilities: CapabilityConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Idle timeout as a duration.
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Sweep interval as a duration.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Tool timeout as a duration.
    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }

    /// Reject values the server cannot run with.
    pub fn validate(&self) -> McpResult<()> {
        if self.sweep_interval_secs == 0 {
            return Err(McpError::Config("sweep_interval_secs must be positive".to_string()));
        }
        if self.tool_timeout_secs == 0 {
            return Err(McpError::Config("tool_timeout_secs must be positive".to_string()));
        }
        if self.default_session_id.is_empty() {
            return Err(McpError::Config("default_session_id must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Which capabilities the server advertises.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapabilityConfig {
    /// Advertise `tools`.
    pub tools: bool,
    /// Advertise `resources`.
    pub resources: bool,
    /// Advertise `prompts`.
    pub prompts: bool,
    /// Advertise `logging`.
    pub logging: bool,
    /// Experimental flags to advertise.
    pub experimental: Vec<String>,
}

impl Default for CapabilityConfig {
    fn default() -> Self {
        Self {
            tools: true,
            resources: true,
            prompts: true,
            logging: true,
            experimental: Vec::new(),
        }
    }
}

impl CapabilityConfig {
    /// The advertised set in wire form.
    pub fn server_capabilities(&self) -> ServerCapabilities {
        let experimental: BTreeMap<String, Value> = self
            .experimental
            .iter()
            .map(|flag| (flag.clone(), json!({})))
            .collect();

        ServerCapabilities {
            experimental: (!experimental.is_empty()).then_some(experimental),
            logging: self.logging.then_some(LoggingCapability {}),
            prompts: self.prompts.then(PromptsCapability::default),
            resources: self.resources.then(ResourcesCapability::default),
            tools: self.tools.then(ToolsCapability::default),
            sampling: None,
        }
    }
}

/// Load configuration from `path`, or defaults when no path is given.
pub fn load_config(path: Option<&str>) -> McpResult<ServerConfig> {
    let Some(path) = path else {
        return Ok(ServerConfig::default());
    };

    let path = Path::new(path);
    let text = std::fs::read_to_string(path).map_err(|e| {
        McpError::Config(format!("Failed to read {}: {e}", path.display()))
    })?;
    let config: ServerConfig = toml::from_str(&text)
        .map_err(|e| McpError::Config(format!("Failed to parse {}: {e}", path.display())))?;
    config.validate()?;

    tracing::debug!("Loaded configuration from {}", path.display());
    Ok(config)
}
