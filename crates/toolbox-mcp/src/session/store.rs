//! Concurrent session store: creation, lookup, activity tracking, removal.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::protocol::negotiation::negotiate;
use crate::streaming::OutboundStream;
use crate::types::{
    Capability, ClientCapabilities, Implementation, McpError, McpResult, NegotiatedCapabilities,
    ServerCapabilities,
};

/// Server-side state for one client connection.
///
/// Values handed out by [`SessionStore`] are snapshots; mutating them does
/// not touch the stored record.
#[derive(Debug, Clone)]
pub struct Session {
    /// Opaque session identifier.
    pub id: String,
    /// Client name and version (informational).
    pub client_info: Implementation,
    /// Protocol version agreed at initialize time.
    pub protocol_version: String,
    /// What the client advertised.
    pub client_capabilities: ClientCapabilities,
    /// What is active for this session.
    pub negotiated: NegotiatedCapabilities,
    /// Set by `notifications/initialized`.
    pub initialized: bool,
    /// Free-form adapter bookkeeping.
    pub metadata: Map<String, Value>,
    /// Bound outbound stream, for streaming sessions.
    pub stream: Option<OutboundStream>,
    /// Wall-clock creation time.
    pub started_at: DateTime<Utc>,
    created: Instant,
    last_activity: Instant,
}

impl Session {
    fn new(id: &str) -> Self {
        let now = Instant::now();
        Self {
            id: id.to_string(),
            client_info: Implementation::default(),
            protocol_version: String::new(),
            client_capabilities: ClientCapabilities::default(),
            negotiated: NegotiatedCapabilities::default(),
            initialized: false,
            metadata: Map::new(),
            stream: None,
            started_at: Utc::now(),
            created: now,
            last_activity: now,
        }
    }

    /// Time since creation.
    pub fn age(&self) -> Duration {
        self.created.elapsed()
    }

    /// Time since the last request touched this session.
    pub fn idle_for(&self) -> Duration {
        self.last_activity.elapsed()
    }

    /// Whether the session has been idle longer than `timeout`.
    pub fn is_idle(&self, timeout: Duration) -> bool {
        self.idle_for() > timeout
    }

    /// Whether `initialize` has run for this session.
    pub fn is_negotiated(&self) -> bool {
        !self.protocol_version.is_empty()
    }

    fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    /// Serializable view for administration endpoints.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            client: self.client_info.clone(),
            protocol_version: self.protocol_version.clone(),
            negotiated: self.negotiated.clone(),
            initialized: self.initialized,
            streaming: self.stream.is_some(),
            started_at: self.started_at,
            age_secs: self.age().as_secs(),
            idle_secs: self.idle_for().as_secs(),
        }
    }
}

/// Serializable description of a session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    /// Session identifier.
    pub id: String,
    /// Client identity.
    pub client: Implementation,
    /// Agreed protocol version (empty before initialize).
    pub protocol_version: String,
    /// Negotiated capabilities.
    pub negotiated: NegotiatedCapabilities,
    /// Handshake complete.
    pub initialized: bool,
    /// Bound to an outbound stream.
    pub streaming: bool,
    /// Creation time.
    pub started_at: DateTime<Utc>,
    /// Seconds since creation.
    pub age_secs: u64,
    /// Seconds since last activity.
    pub idle_secs: u64,
}

/// Mapping from session id to session record.
///
/// Every operation holds the map lock for its whole read-modify-write, so
/// concurrent calls for the same id never interleave.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    server_capabilities: ServerCapabilities,
}

impl SessionStore {
    /// Create an empty store advertising `server_capabilities`.
    pub fn new(server_capabilities: ServerCapabilities) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            server_capabilities,
        }
    }

    /// The capability set this server advertises.
    pub fn server_capabilities(&self) -> &ServerCapabilities {
        &self.server_capabilities
    }

    /// Negotiate and store a session, replacing any previous negotiation.
    ///
    /// A stream already bound to `id` stays bound; everything else about the
    /// previous record, timestamps included, is reset.
    pub async fn create_session(
        &self,
        id: &str,
        client_info: Implementation,
        protocol_version: String,
        client_capabilities: ClientCapabilities,
    ) -> Session {
        let negotiated = negotiate(&self.server_capabilities, &client_capabilities);

        let mut sessions = self.sessions.write().await;
        let mut session = Session::new(id);
        if let Some(previous) = sessions.remove(id) {
            session.stream = previous.stream;
        }
        session.client_info = client_info;
        session.protocol_version = protocol_version;
        session.client_capabilities = client_capabilities;
        session.negotiated = negotiated;

        sessions.insert(id.to_string(), session.clone());
        tracing::info!(
            session_id = %id,
            client = %session.client_info.name,
            total = sessions.len(),
            "Session negotiated"
        );
        session
    }

    /// Like [`create_session`](Self::create_session), but only for a record
    /// that still exists. A removed session stays removed.
    pub async fn renegotiate_session(
        &self,
        id: &str,
        client_info: Implementation,
        protocol_version: String,
        client_capabilities: ClientCapabilities,
    ) -> McpResult<Session> {
        let negotiated = negotiate(&self.server_capabilities, &client_capabilities);

        let mut sessions = self.sessions.write().await;
        let Some(slot) = sessions.get_mut(id) else {
            tracing::debug!(session_id = %id, "Refusing to negotiate a removed session");
            return Err(McpError::SessionNotFound(id.to_string()));
        };

        let mut session = Session::new(id);
        session.stream = slot.stream.take();
        session.client_info = client_info;
        session.protocol_version = protocol_version;
        session.client_capabilities = client_capabilities;
        session.negotiated = negotiated;
        *slot = session.clone();

        tracing::info!(
            session_id = %id,
            client = %session.client_info.name,
            "Session renegotiated"
        );
        Ok(session)
    }

    /// Register a not-yet-negotiated session that owns `stream`.
    ///
    /// Fails when `max_sessions` streaming sessions already exist.
    pub async fn open_streaming(
        &self,
        id: &str,
        stream: OutboundStream,
        max_sessions: usize,
    ) -> McpResult<Session> {
        let mut sessions = self.sessions.write().await;
        let streaming = sessions.values().filter(|s| s.stream.is_some()).count();
        if streaming >= max_sessions {
            tracing::warn!(
                max = max_sessions,
                current = streaming,
                "Session limit reached, rejecting new stream"
            );
            return Err(McpError::Transport(format!(
                "Session limit of {max_sessions} reached"
            )));
        }

        let mut session = Session::new(id);
        session.stream = Some(stream);
        if let Some(previous) = sessions.insert(id.to_string(), session.clone()) {
            release(&previous);
        }
        tracing::debug!(session_id = %id, total = sessions.len(), "Opened streaming session");
        Ok(session)
    }

    /// Look up a session, touching its activity time.
    pub async fn get_session(&self, id: &str) -> Option<Session> {
        let mut sessions = self.sessions.write().await;
        sessions.get_mut(id).map(|session| {
            session.touch();
            session.clone()
        })
    }

    /// Update the activity time. Returns false if the session is absent.
    pub async fn touch(&self, id: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(id) {
            Some(session) => {
                session.touch();
                true
            }
            None => false,
        }
    }

    /// The authorization gate: is `capability` active for `id`?
    pub async fn has_capability(&self, id: &str, capability: &Capability) -> bool {
        self.sessions
            .read()
            .await
            .get(id)
            .map(|session| session.negotiated.is_enabled(capability))
            .unwrap_or(false)
    }

    /// Merge `partial` into the session metadata.
    pub async fn update_metadata(&self, id: &str, partial: Map<String, Value>) {
        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get_mut(id) {
            session.metadata.extend(partial);
            session.touch();
        }
    }

    /// Record the `initialized` notification.
    pub async fn mark_initialized(&self, id: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(id) {
            Some(session) => {
                session.initialized = true;
                session.touch();
                tracing::info!(session_id = %id, "MCP handshake complete");
                true
            }
            None => false,
        }
    }

    /// Remove a session, closing its stream. Idempotent.
    pub async fn remove_session(&self, id: &str) -> Option<Session> {
        let mut sessions = self.sessions.write().await;
        let removed = sessions.remove(id);
        if let Some(session) = &removed {
            release(session);
            tracing::debug!(session_id = %id, total = sessions.len(), "Removed session");
        }
        removed
    }

    /// Remove a session only if it is still idle beyond `timeout`.
    pub async fn remove_if_idle(&self, id: &str, timeout: Duration) -> Option<Session> {
        let mut sessions = self.sessions.write().await;
        if !sessions.get(id).is_some_and(|s| s.is_idle(timeout)) {
            return None;
        }
        let removed = sessions.remove(id);
        if let Some(session) = &removed {
            release(session);
        }
        removed
    }

    /// Ids of sessions idle longer than `timeout`.
    pub async fn idle_session_ids(&self, timeout: Duration) -> Vec<String> {
        self.sessions
            .read()
            .await
            .values()
            .filter(|session| session.is_idle(timeout))
            .map(|session| session.id.clone())
            .collect()
    }

    /// Snapshot of every stored session.
    pub async fn list_active(&self) -> Vec<Session> {
        self.sessions.read().await.values().cloned().collect()
    }

    /// Remove every session, closing bound streams. Returns how many went.
    pub async fn clear(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let count = sessions.len();
        for (_, session) in sessions.drain() {
            release(&session);
        }
        if count > 0 {
            tracing::info!(removed = count, "Cleared all sessions");
        }
        count
    }

    /// Number of stored sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// True when no sessions are stored.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

/// Close the bound stream of a session leaving the store.
fn release(session: &Session) {
    if let Some(stream) = &session.stream {
        if let Err(e) = stream.close() {
            tracing::debug!(session_id = %session.id, "Stream close skipped: {e}");
        }
    }
}
