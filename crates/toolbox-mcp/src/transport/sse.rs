//! SSE transport — Server-Sent Events over HTTP for web-based MCP clients.
//!
//! `GET /sse` opens a session and keeps the response open for pushes. The
//! first event (`endpoint`) tells the client where to POST its messages:
//! `/messages?sessionId=<id>`. Responses to those messages arrive on the
//! stream as `message` events. The same router also serves the single-shot
//! `POST /mcp` endpoint and a few administrative routes.

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::{Stream, StreamExt};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::config::ServerConfig;
use crate::protocol::ProtocolHandler;
use crate::streaming::{DisconnectGuard, MessageOutcome, OpenedStream, StreamingManager};
use crate::types::{mcp_error_codes, error_codes, McpError, McpResult, RequestId};

use super::http::{self, SingleShotState};

/// SSE event name carrying the message endpoint.
const ENDPOINT_EVENT: &str = "endpoint";

/// SSE event name carrying JSON-RPC messages.
const MESSAGE_EVENT: &str = "message";

#[derive(Clone)]
struct SseState {
    streaming: Arc<StreamingManager>,
}

#[derive(Debug, Deserialize)]
struct MessageQuery {
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

/// Event stream of one session. Dropping it (client gone) drops the guard,
/// which removes the session.
struct SessionEvents<S> {
    events: S,
    _guard: DisconnectGuard,
}

impl<S> Stream for SessionEvents<S>
where
    S: Stream + Unpin,
{
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().events).poll_next(cx)
    }
}

/// HTTP server hosting the single-shot and streaming transports.
pub struct SseTransport {
    handler: Arc<ProtocolHandler>,
    streaming: Arc<StreamingManager>,
    default_session_id: Arc<str>,
}

impl SseTransport {
    /// Create a new SSE transport.
    pub fn new(handler: ProtocolHandler, config: &ServerConfig) -> Self {
        let handler = Arc::new(handler);
        let streaming = Arc::new(StreamingManager::new(handler.clone(), config));
        Self {
            handler,
            streaming,
            default_session_id: Arc::from(config.default_session_id.as_str()),
        }
    }

    /// The streaming session manager.
    pub fn streaming(&self) -> &Arc<StreamingManager> {
        &self.streaming
    }

    /// Build the axum router for every endpoint.
    pub fn router(&self) -> Router {
        let single_shot = Router::new()
            .route("/mcp", post(http::handle_post))
            .with_state(SingleShotState {
                handler: self.handler.clone(),
                default_session_id: self.default_session_id.clone(),
            });

        let streaming = Router::new()
            .route("/sse", get(handle_open))
            .route("/messages", post(handle_message))
            .route("/sessions", get(list_sessions).delete(clear_sessions))
            .with_state(SseState {
                streaming: self.streaming.clone(),
            });

        Router::new()
            .route("/health", get(|| async { "ok" }))
            .merge(single_shot)
            .merge(streaming)
            .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
    }

    /// Run the server on the given address until Ctrl-C.
    pub async fn run(&self, addr: &str) -> McpResult<()> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(McpError::Io)?;

        self.streaming.start();
        tracing::info!("SSE transport listening on {addr}");

        let streaming = self.streaming.clone();
        let shutdown = async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {e}");
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutdown requested");
            // Open streams would otherwise keep graceful shutdown waiting.
            streaming.destroy().await;
        };

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| McpError::Transport(e.to_string()))?;

        self.streaming.destroy().await;
        Ok(())
    }
}

async fn handle_open(State(state): State<SseState>) -> Response {
    let OpenedStream {
        session,
        receiver,
        guard,
    } = match state.streaming.create_session().await {
        Ok(opened) => opened,
        Err(e) => {
            tracing::warn!("Rejected stream: {e}");
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(e.to_json_rpc_error(RequestId::Null)),
            )
                .into_response();
        }
    };

    let endpoint = Event::default()
        .event(ENDPOINT_EVENT)
        .data(format!("/messages?sessionId={}", session.id));

    let messages = ReceiverStream::new(receiver)
        .map(|message| Ok::<_, Infallible>(Event::default().event(MESSAGE_EVENT).data(message)));
    let events = SessionEvents {
        events: tokio_stream::once(Ok::<_, Infallible>(endpoint)).chain(messages),
        _guard: guard,
    };

    Sse::new(events)
        .keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
        .into_response()
}

async fn handle_message(
    State(state): State<SseState>,
    Query(query): Query<MessageQuery>,
    body: String,
) -> Response {
    let Some(session_id) = query.session_id.filter(|id| !id.is_empty()) else {
        let error = McpError::SessionNotFound("missing sessionId".to_string());
        return (
            StatusCode::BAD_REQUEST,
            Json(error.to_json_rpc_error(RequestId::Null)),
        )
            .into_response();
    };

    match state.streaming.handle_message(&session_id, &body).await {
        MessageOutcome::Accepted => StatusCode::ACCEPTED.into_response(),
        MessageOutcome::Rejected(error) => {
            let status = match error.error.code {
                mcp_error_codes::SESSION_NOT_FOUND => StatusCode::NOT_FOUND,
                error_codes::INTERNAL_ERROR => StatusCode::GONE,
                _ => StatusCode::BAD_REQUEST,
            };
            (status, Json(error)).into_response()
        }
    }
}

async fn list_sessions(State(state): State<SseState>) -> Response {
    let summaries: Vec<_> = state
        .streaming
        .store()
        .list_active()
        .await
        .iter()
        .map(|session| session.summary())
        .collect();
    Json(summaries).into_response()
}

async fn clear_sessions(State(state): State<SseState>) -> Response {
    let cleared = state.streaming.store().clear().await;
    Json(json!({ "cleared": cleared })).into_response()
}
