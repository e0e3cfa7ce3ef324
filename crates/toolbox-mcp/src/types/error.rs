//! Error taxonomy and JSON-RPC error codes.

use thiserror::Error;

use super::message::{JsonRpcError, RequestId};

/// Standard JSON-RPC 2.0 error codes.
pub mod error_codes {
    /// Invalid JSON was received.
    pub const PARSE_ERROR: i32 = -32700;
    /// The JSON sent is not a valid request object.
    pub const INVALID_REQUEST: i32 = -32600;
    /// The method does not exist or is not available.
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid method parameters.
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal JSON-RPC error.
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// Server-specific error codes (JSON-RPC reserved range -32000..-32099).
pub mod mcp_error_codes {
    /// Unknown or expired session identifier.
    pub const SESSION_NOT_FOUND: i32 = -32000;
    /// Tool name is not registered.
    pub const TOOL_NOT_FOUND: i32 = -32001;
    /// Tool ran and failed.
    pub const TOOL_EXECUTION: i32 = -32002;
}

/// Errors produced anywhere in the server.
#[derive(Debug, Error)]
pub enum McpError {
    /// Body could not be parsed as JSON.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Envelope is not a valid JSON-RPC request.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Method is unknown.
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// Method is known but its capability is not active for the session.
    #[error("Capability '{capability}' not negotiated for this session (method: {method})")]
    CapabilityNotNegotiated {
        /// Requested method.
        method: String,
        /// Capability the method requires.
        capability: String,
    },

    /// Parameters are missing or malformed.
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// Unexpected failure.
    #[error("Internal error: {0}")]
    InternalError(String),

    /// No session is registered under the identifier.
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// No tool is registered under the name.
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Tool ran and reported a failure.
    #[error("{0}")]
    ToolExecution(String),

    /// No resource is registered under the URI.
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// No prompt is registered under the name.
    #[error("Prompt not found: {0}")]
    PromptNotFound(String),

    /// The outbound stream was already closed.
    #[error("Stream already closed for session {0}")]
    StreamClosed(String),

    /// Transport could not be initialised or failed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias used throughout the crate.
pub type McpResult<T> = Result<T, McpError>;

impl McpError {
    /// The JSON-RPC error code for this error.
    pub fn code(&self) -> i32 {
        match self {
            McpError::ParseError(_) => error_codes::PARSE_ERROR,
            McpError::InvalidRequest(_) => error_codes::INVALID_REQUEST,
            McpError::MethodNotFound(_) | McpError::CapabilityNotNegotiated { .. } => {
                error_codes::METHOD_NOT_FOUND
            }
            McpError::InvalidParams(_)
            | McpError::ResourceNotFound(_)
            | McpError::PromptNotFound(_) => error_codes::INVALID_PARAMS,
            McpError::SessionNotFound(_) => mcp_error_codes::SESSION_NOT_FOUND,
            McpError::ToolNotFound(_) => mcp_error_codes::TOOL_NOT_FOUND,
            McpError::ToolExecution(_) => mcp_error_codes::TOOL_EXECUTION,
            McpError::InternalError(_)
            | McpError::StreamClosed(_)
            | McpError::Transport(_)
            | McpError::Config(_)
            | McpError::Io(_)
            | McpError::Json(_) => error_codes::INTERNAL_ERROR,
        }
    }

    /// Build a JSON-RPC error envelope carrying this error.
    pub fn to_json_rpc_error(&self, id: RequestId) -> JsonRpcError {
        JsonRpcError::new(id, self.code(), self.to_string())
    }
}
