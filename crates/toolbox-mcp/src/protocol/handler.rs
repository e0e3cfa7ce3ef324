//! Request routing: validation, capability gate, dispatch, envelopes.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::config::ServerConfig;
use crate::prompts::PromptRegistry;
use crate::resources::ResourceRegistry;
use crate::session::SessionStore;
use crate::tools::ToolRegistry;
use crate::types::{
    error_codes, CancelledParams, Implementation, InitializeParams, InitializeResult,
    JsonRpcRequest, JsonRpcResponse, ListParams, McpError, McpResult, PromptGetParams,
    PromptListResult, RequestId, ResourceListResult, ResourceReadParams,
    ResourceTemplateListResult, SetLevelParams, ToolCallParams, ToolCallResult, ToolListResult,
};

use super::method::{required_capability, Method};
use super::negotiation::agree_protocol_version;
use super::validator::{parse_message, validate_message};

/// Default upper bound on a single tool execution.
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);

/// How `initialize` treats the session id it arrives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admission {
    /// `initialize` creates the session when it is missing.
    Open,
    /// The session belongs to a transport and must still exist.
    Bound,
}

/// Routes JSON-RPC messages for any number of sessions.
///
/// Every failure is turned into an envelope here; nothing escapes to the
/// transport except "no response" for notifications.
pub struct ProtocolHandler {
    store: Arc<SessionStore>,
    tool_timeout: Duration,
}

impl ProtocolHandler {
    /// Create a handler over a shared session store.
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self {
            store,
            tool_timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    /// Build the store and handler described by `config`.
    pub fn from_config(config: &ServerConfig) -> Self {
        let store = Arc::new(SessionStore::new(config.capabilities.server_capabilities()));
        Self::new(store).with_tool_timeout(config.tool_timeout())
    }

    /// Override the per-call tool timeout.
    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    /// The session store this handler gates against.
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Handle a raw message body. `None` means nothing should be sent back.
    pub async fn handle_raw(&self, session_id: &str, raw: &str) -> Option<Value> {
        self.handle_raw_as(Admission::Open, session_id, raw).await
    }

    /// Handle a raw message for a session owned by a transport.
    ///
    /// `initialize` only renegotiates a live record; once the session is
    /// removed it answers `SessionNotFound` instead of creating it again.
    pub async fn handle_bound(&self, session_id: &str, raw: &str) -> Option<Value> {
        self.handle_raw_as(Admission::Bound, session_id, raw).await
    }

    async fn handle_raw_as(&self, admission: Admission, session_id: &str, raw: &str) -> Option<Value> {
        match parse_message(raw) {
            Ok(request) => self.respond(admission, session_id, request).await,
            Err(rejection) => Some(error_envelope(&rejection.error, rejection.id)),
        }
    }

    /// Handle an already-parsed JSON message.
    pub async fn handle_value(&self, session_id: &str, message: Value) -> Option<Value> {
        match validate_message(message) {
            Ok(request) => self.handle_request(session_id, request).await,
            Err(rejection) => Some(error_envelope(&rejection.error, rejection.id)),
        }
    }

    /// Handle a validated request or notification.
    pub async fn handle_request(&self, session_id: &str, request: JsonRpcRequest) -> Option<Value> {
        self.respond(Admission::Open, session_id, request).await
    }

    async fn respond(
        &self,
        admission: Admission,
        session_id: &str,
        request: JsonRpcRequest,
    ) -> Option<Value> {
        let JsonRpcRequest {
            id, method, params, ..
        } = request;

        tracing::debug!(session_id = %session_id, method = %method, id = %id, "Routing message");
        let outcome = self.route(admission, session_id, &method, params).await;

        if id.is_null() {
            if let Err(e) = outcome {
                tracing::warn!(session_id = %session_id, method = %method, "Notification failed: {e}");
            }
            return None;
        }

        Some(match outcome {
            Ok(result) => success_envelope(id, result),
            Err(e) => {
                if e.code() == error_codes::INTERNAL_ERROR {
                    tracing::error!(session_id = %session_id, method = %method, "Internal error: {e}");
                }
                error_envelope(&e, id)
            }
        })
    }

    async fn route(
        &self,
        admission: Admission,
        session_id: &str,
        name: &str,
        params: Option<Value>,
    ) -> McpResult<Value> {
        let method = Method::from_name(name);

        if method != Some(Method::Initialize) {
            self.store.touch(session_id).await;
        }

        if let Some(capability) = required_capability(name) {
            if !self.store.has_capability(session_id, &capability).await {
                return Err(McpError::CapabilityNotNegotiated {
                    method: name.to_string(),
                    capability: capability.to_string(),
                });
            }
        }

        let method = method.ok_or_else(|| McpError::MethodNotFound(name.to_string()))?;
        self.dispatch(admission, session_id, method, params).await
    }

    async fn dispatch(
        &self,
        admission: Admission,
        session_id: &str,
        method: Method,
        params: Option<Value>,
    ) -> McpResult<Value> {
        match method {
            Method::Initialize => self.initialize(admission, session_id, params).await,
            Method::Initialized => {
                self.store.mark_initialized(session_id).await;
                Ok(json!({}))
            }
            Method::Cancelled => {
                if let Some(p) = params.and_then(|p| serde_json::from_value::<CancelledParams>(p).ok()) {
                    tracing::debug!(
                        session_id = %session_id,
                        request_id = %p.request_id,
                        reason = p.reason.as_deref().unwrap_or(""),
                        "Client cancelled request"
                    );
                }
                Ok(json!({}))
            }
            Method::Ping => Ok(json!({})),
            Method::ToolsList => {
                let _page: ListParams = parse_optional(params)?;
                to_result(&ToolListResult::complete(ToolRegistry::list_tools()))
            }
            Method::ToolsCall => {
                let call: ToolCallParams = parse_required(params)?;
                to_result(&self.call_tool(call).await)
            }
            Method::ResourcesList => {
                let _page: ListParams = parse_optional(params)?;
                to_result(&ResourceListResult::complete(ResourceRegistry::list_resources()))
            }
            Method::ResourcesRead => {
                let read: ResourceReadParams = parse_required(params)?;
                to_result(&ResourceRegistry::read(&read.uri)?)
            }
            Method::ResourceTemplatesList => to_result(&ResourceTemplateListResult::complete(
                ResourceRegistry::list_templates(),
            )),
            Method::PromptsList => {
                let _page: ListParams = parse_optional(params)?;
                to_result(&PromptListResult::complete(PromptRegistry::list_prompts()))
            }
            Method::PromptsGet => {
                let get: PromptGetParams = parse_required(params)?;
                to_result(&PromptRegistry::get(&get.name, get.arguments)?)
            }
            Method::LoggingSetLevel => {
                let set: SetLevelParams = parse_required(params)?;
                let mut partial = Map::new();
                partial.insert("logLevel".to_string(), serde_json::to_value(set.level)?);
                self.store.update_metadata(session_id, partial).await;
                Ok(json!({}))
            }
        }
    }

    async fn initialize(
        &self,
        admission: Admission,
        session_id: &str,
        params: Option<Value>,
    ) -> McpResult<Value> {
        let params: InitializeParams = parse_optional(params)?;
        let protocol_version = agree_protocol_version(&params.protocol_version);

        let session = match admission {
            Admission::Open => {
                self.store
                    .create_session(
                        session_id,
                        params.client_info,
                        protocol_version,
                        params.capabilities,
                    )
                    .await
            }
            Admission::Bound => {
                self.store
                    .renegotiate_session(
                        session_id,
                        params.client_info,
                        protocol_version,
                        params.capabilities,
                    )
                    .await?
            }
        };

        tracing::info!(
            session_id = %session_id,
            "Initialized with client: {} v{}",
            session.client_info.name,
            session.client_info.version
        );

        to_result(&InitializeResult {
            protocol_version: session.protocol_version.clone(),
            capabilities: self
                .store
                .server_capabilities()
                .restricted_to(&session.negotiated),
            server_info: Implementation::server(),
            instructions: Some(InitializeResult::INSTRUCTIONS.to_string()),
            negotiated_capabilities: session.negotiated,
        })
    }

    /// Run a tool on its own task so a panic or a stall stays contained.
    async fn call_tool(&self, call: ToolCallParams) -> ToolCallResult {
        let ToolCallParams { name, arguments } = call;
        let tool_name = name.clone();
        let mut task = tokio::spawn(async move { ToolRegistry::invoke(&tool_name, arguments).await });

        match tokio::time::timeout(self.tool_timeout, &mut task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => {
                tracing::error!(tool = %name, "Tool task failed: {join_error}");
                ToolCallResult::error(format!("Tool '{name}' failed unexpectedly"))
            }
            Err(_) => {
                task.abort();
                tracing::warn!(tool = %name, timeout_secs = self.tool_timeout.as_secs_f64(), "Tool timed out");
                ToolCallResult::error(format!(
                    "Tool '{name}' timed out after {:?}",
                    self.tool_timeout
                ))
            }
        }
    }
}

fn parse_required<T: serde::de::DeserializeOwned>(params: Option<Value>) -> McpResult<T> {
    let params = params.ok_or_else(|| McpError::InvalidParams("Missing params".to_string()))?;
    serde_json::from_value(params).map_err(|e| McpError::InvalidParams(e.to_string()))
}

fn parse_optional<T: serde::de::DeserializeOwned + Default>(params: Option<Value>) -> McpResult<T> {
    match params {
        Some(params) => {
            serde_json::from_value(params).map_err(|e| McpError::InvalidParams(e.to_string()))
        }
        None => Ok(T::default()),
    }
}

fn to_result(value: &impl Serialize) -> McpResult<Value> {
    Ok(serde_json::to_value(value)?)
}

fn success_envelope(id: RequestId, result: Value) -> Value {
    envelope(&JsonRpcResponse::new(id, result))
}

fn error_envelope(error: &McpError, id: RequestId) -> Value {
    envelope(&error.to_json_rpc_error(id))
}

fn envelope(message: &impl Serialize) -> Value {
    serde_json::to_value(message).unwrap_or_else(|e| {
        json!({
            "jsonrpc": "2.0",
            "id": null,
            "error": { "code": error_codes::INTERNAL_ERROR, "message": e.to_string() }
        })
    })
}
