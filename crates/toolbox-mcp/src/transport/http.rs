//! Single-shot HTTP endpoint: one POST, one JSON-RPC response.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::protocol::ProtocolHandler;

/// Header carrying an explicit session id.
pub const MCP_SESSION_ID_HEADER: &str = "mcp-session-id";

/// State for the single-shot endpoint.
#[derive(Clone)]
pub struct SingleShotState {
    /// Shared router.
    pub handler: Arc<ProtocolHandler>,
    /// Session used when the request carries no session header.
    pub default_session_id: Arc<str>,
}

/// Session id from the request header, or the process-wide default.
pub fn session_id_from(headers: &HeaderMap, default_session_id: &str) -> String {
    headers
        .get(MCP_SESSION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or(default_session_id)
        .to_string()
}

/// Handle `POST /mcp`.
pub async fn handle_post(
    State(state): State<SingleShotState>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let session_id = session_id_from(&headers, &state.default_session_id);

    match state.handler.handle_raw(&session_id, &body).await {
        Some(response) => {
            let mut resp = Json(response).into_response();
            if let Ok(value) = HeaderValue::from_str(&session_id) {
                resp.headers_mut().insert(MCP_SESSION_ID_HEADER, value);
            }
            resp
        }
        None => StatusCode::ACCEPTED.into_response(),
    }
}
