//! Test data fixtures for MCP server tests.

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{json, Value};

use toolbox_mcp::protocol::ProtocolHandler;
use toolbox_mcp::session::SessionStore;
use toolbox_mcp::types::{ClientCapabilities, Implementation, ServerCapabilities};

/// A store advertising tools, resources, prompts and logging.
pub fn create_test_store() -> Arc<SessionStore> {
    Arc::new(SessionStore::new(ServerCapabilities::default_capabilities()))
}

/// A router over a fresh default store.
pub fn create_test_handler() -> ProtocolHandler {
    ProtocolHandler::new(create_test_store())
}

/// Client capabilities parsed from a JSON literal.
pub fn client_caps(value: Value) -> ClientCapabilities {
    serde_json::from_value(value).expect("valid client capabilities")
}

/// Client identity used throughout the tests.
pub fn test_client() -> Implementation {
    Implementation {
        name: "test-client".to_string(),
        version: "1.0.0".to_string(),
    }
}

/// An `initialize` request body.
pub fn initialize_request(id: i64, capabilities: Value) -> String {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "initialize",
        "params": {
            "protocolVersion": "2024-11-05",
            "capabilities": capabilities,
            "clientInfo": { "name": "test-client", "version": "1.0.0" }
        }
    })
    .to_string()
}

/// A request body with the given id, method and params.
pub fn request(id: i64, method: &str, params: Value) -> String {
    json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params }).to_string()
}

/// A notification body (no id).
pub fn notification(method: &str) -> String {
    json!({ "jsonrpc": "2.0", "method": method }).to_string()
}

/// Initialize `session_id` on `handler` advertising every client capability.
pub async fn initialize_all(handler: &ProtocolHandler, session_id: &str) -> Value {
    let body = initialize_request(
        0,
        json!({ "tools": {}, "resources": {}, "prompts": {}, "logging": {}, "sampling": {} }),
    );
    handler
        .handle_raw(session_id, &body)
        .await
        .expect("initialize must be answered")
}

/// Call a tool on an initialized session and return the `result` payload.
pub async fn call_tool(handler: &ProtocolHandler, session_id: &str, name: &str, args: Value) -> Value {
    let body = request(7, "tools/call", json!({ "name": name, "arguments": args }));
    let response = handler
        .handle_raw(session_id, &body)
        .await
        .expect("tools/call must be answered");
    assert!(response.get("error").is_none(), "unexpected error: {response}");
    response["result"].clone()
}
