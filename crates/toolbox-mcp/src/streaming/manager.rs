//! Streaming sessions: one outbound stream per session, torn down exactly once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::ServerConfig;
use crate::protocol::ProtocolHandler;
use crate::session::{LifecycleManager, Session, SessionStore};
use crate::types::{JsonRpcError, McpError, McpResult, RequestId};

use super::stream::{OutboundStream, DEFAULT_STREAM_CAPACITY};

/// What happened to a message submitted for a streaming session.
#[derive(Debug)]
pub enum MessageOutcome {
    /// Handled; the response (if any) was pushed onto the session's stream.
    Accepted,
    /// Not handled. The error goes back on the submission channel.
    Rejected(JsonRpcError),
}

/// A freshly opened streaming session.
pub struct OpenedStream {
    /// Snapshot of the new session.
    pub session: Session,
    /// Messages to forward to the client, in order.
    pub receiver: mpsc::Receiver<String>,
    /// Removes the session when dropped (peer disconnect).
    pub guard: DisconnectGuard,
}

/// Removes its session when the transport drops the client stream.
pub struct DisconnectGuard {
    store: Arc<SessionStore>,
    session_id: String,
}

impl DisconnectGuard {
    /// Session this guard watches.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        let store = self.store.clone();
        let session_id = std::mem::take(&mut self.session_id);
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    if store.remove_session(&session_id).await.is_some() {
                        tracing::info!(session_id = %session_id, "Client disconnected, session removed");
                    }
                });
            }
            Err(_) => {
                tracing::warn!(session_id = %session_id, "No runtime to remove disconnected session")
            }
        }
    }
}

/// Creates, feeds and tears down streaming sessions.
pub struct StreamingManager {
    handler: Arc<ProtocolHandler>,
    lifecycle: LifecycleManager,
    max_sessions: usize,
    channel_capacity: usize,
    shutting_down: AtomicBool,
}

impl StreamingManager {
    /// Create a manager over `handler`'s session store.
    pub fn new(handler: Arc<ProtocolHandler>, config: &ServerConfig) -> Self {
        let lifecycle = LifecycleManager::new(
            handler.store().clone(),
            config.idle_timeout(),
            config.sweep_interval(),
        );
        Self {
            handler,
            lifecycle,
            max_sessions: config.max_sessions,
            channel_capacity: DEFAULT_STREAM_CAPACITY,
            shutting_down: AtomicBool::new(false),
        }
    }

    /// The router messages are forwarded to.
    pub fn handler(&self) -> &Arc<ProtocolHandler> {
        &self.handler
    }

    /// The shared session store.
    pub fn store(&self) -> &Arc<SessionStore> {
        self.handler.store()
    }

    /// The idle-sweep manager.
    pub fn lifecycle(&self) -> &LifecycleManager {
        &self.lifecycle
    }

    /// Start the idle sweep.
    pub fn start(&self) {
        self.lifecycle.start();
    }

    /// Open a new streaming session under a fresh id.
    pub async fn create_session(&self) -> McpResult<OpenedStream> {
        if self.shutting_down.load(Ordering::SeqCst) {
            return Err(McpError::Transport("Server is shutting down".to_string()));
        }

        let session_id = uuid::Uuid::new_v4().to_string();
        let (stream, receiver) = OutboundStream::channel(&session_id, self.channel_capacity);
        let session = self
            .store()
            .open_streaming(&session_id, stream, self.max_sessions)
            .await?;

        tracing::info!(session_id = %session_id, "Streaming session opened");
        Ok(OpenedStream {
            session,
            receiver,
            guard: DisconnectGuard {
                store: self.store().clone(),
                session_id,
            },
        })
    }

    /// Handle a message submitted for `session_id`.
    ///
    /// The response travels over the session's stream, not back to the caller.
    pub async fn handle_message(&self, session_id: &str, payload: &str) -> MessageOutcome {
        let Some(session) = self.store().get_session(session_id).await else {
            let error = McpError::SessionNotFound(session_id.to_string());
            return MessageOutcome::Rejected(error.to_json_rpc_error(request_id_of(payload)));
        };
        let Some(stream) = session.stream else {
            let error = McpError::SessionNotFound(format!("{session_id} has no open stream"));
            return MessageOutcome::Rejected(error.to_json_rpc_error(request_id_of(payload)));
        };

        let Some(response) = self.handler.handle_bound(session_id, payload).await else {
            return MessageOutcome::Accepted;
        };

        let push = serde_json::to_string(&response).map_err(McpError::from);
        match push {
            Ok(text) => match stream.send(text).await {
                Ok(()) => MessageOutcome::Accepted,
                Err(e) => {
                    tracing::warn!(session_id = %session_id, "Dropping response: {e}");
                    MessageOutcome::Rejected(e.to_json_rpc_error(request_id_of(payload)))
                }
            },
            Err(e) => MessageOutcome::Rejected(e.to_json_rpc_error(request_id_of(payload))),
        }
    }

    /// Close the session's stream and forget it. Idempotent.
    pub async fn remove_session(&self, session_id: &str) -> bool {
        self.store().remove_session(session_id).await.is_some()
    }

    /// Stop the sweep and remove every streaming session.
    pub async fn destroy(&self) {
        if self.shutting_down.swap(true, Ordering::SeqCst) {
            return;
        }
        self.lifecycle.stop();

        let mut removed = 0;
        for session in self.store().list_active().await {
            if session.stream.is_some() && self.remove_session(&session.id).await {
                removed += 1;
            }
        }
        tracing::info!(removed, "Streaming transport destroyed");
    }
}

/// Best-effort id extraction so rejections can still be correlated.
fn request_id_of(payload: &str) -> RequestId {
    serde_json::from_str::<serde_json::Value>(payload)
        .ok()
        .and_then(|v| v.get("id").cloned())
        .and_then(|id| serde_json::from_value(id).ok())
        .unwrap_or(RequestId::Null)
}
