//! Envelope shape validation, run before any session lookup.

use serde_json::Value;

use crate::types::{JsonRpcRequest, McpError, RequestId, JSONRPC_VERSION};

/// A message that failed validation, with the id to answer under.
#[derive(Debug)]
pub struct Rejection {
    /// Echoed id, or `Null` when the id itself was unusable.
    pub id: RequestId,
    /// Why the message was rejected.
    pub error: McpError,
}

impl Rejection {
    fn new(id: RequestId, error: McpError) -> Self {
        Self { id, error }
    }
}

/// Parse a raw body and validate it.
pub fn parse_message(raw: &str) -> Result<JsonRpcRequest, Rejection> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| Rejection::new(RequestId::Null, McpError::ParseError(e.to_string())))?;
    validate_message(value)
}

/// Check the JSON-RPC 2.0 request shape and build a typed request.
pub fn validate_message(value: Value) -> Result<JsonRpcRequest, Rejection> {
    let mut object = match value {
        Value::Object(object) => object,
        Value::Array(_) => {
            return Err(Rejection::new(
                RequestId::Null,
                McpError::InvalidRequest("Batch requests are not supported".to_string()),
            ))
        }
        _ => {
            return Err(Rejection::new(
                RequestId::Null,
                McpError::InvalidRequest("Request must be a JSON object".to_string()),
            ))
        }
    };

    let id = match object.remove("id") {
        None | Some(Value::Null) => RequestId::Null,
        Some(Value::String(s)) => RequestId::String(s),
        Some(Value::Number(n)) => RequestId::Number(n),
        Some(other) => {
            return Err(Rejection::new(
                RequestId::Null,
                McpError::InvalidRequest(format!("Unsupported id: {other}")),
            ))
        }
    };

    match object.get("jsonrpc") {
        Some(Value::String(v)) if v == JSONRPC_VERSION => {}
        Some(other) => {
            return Err(Rejection::new(
                id,
                McpError::InvalidRequest(format!("jsonrpc must be \"2.0\", got {other}")),
            ))
        }
        None => {
            return Err(Rejection::new(
                id,
                McpError::InvalidRequest("Missing jsonrpc field".to_string()),
            ))
        }
    }

    let method = match object.remove("method") {
        Some(Value::String(m)) if !m.is_empty() => m,
        Some(_) => {
            return Err(Rejection::new(
                id,
                McpError::InvalidRequest("method must be a non-empty string".to_string()),
            ))
        }
        None => {
            return Err(Rejection::new(
                id,
                McpError::InvalidRequest("Missing method field".to_string()),
            ))
        }
    };

    let params = match object.remove("params") {
        None | Some(Value::Null) => None,
        Some(p @ (Value::Object(_) | Value::Array(_))) => Some(p),
        Some(_) => {
            return Err(Rejection::new(
                id,
                McpError::InvalidRequest("params must be an object or array".to_string()),
            ))
        }
    };

    Ok(JsonRpcRequest::new(id, method, params))
}
