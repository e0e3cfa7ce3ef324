//! Outbound stream handle bound to one session.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;

use crate::types::{McpError, McpResult};

/// Default number of queued server → client messages per stream.
pub const DEFAULT_STREAM_CAPACITY: usize = 64;

/// Server → client push channel for one streaming session.
///
/// Cloning shares the same channel. The channel is closed at most once;
/// later `close` calls report [`McpError::StreamClosed`].
#[derive(Debug, Clone)]
pub struct OutboundStream {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    session_id: String,
    tx: Mutex<Option<mpsc::Sender<String>>>,
}

impl OutboundStream {
    /// Create a stream and the receiver the transport drains.
    pub fn channel(session_id: &str, capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let stream = Self {
            inner: Arc::new(Inner {
                session_id: session_id.to_string(),
                tx: Mutex::new(Some(tx)),
            }),
        };
        (stream, rx)
    }

    /// Session this stream belongs to.
    pub fn session_id(&self) -> &str {
        &self.inner.session_id
    }

    /// Queue a message for the client.
    pub async fn send(&self, message: String) -> McpResult<()> {
        let tx = self
            .sender()
            .as_ref()
            .cloned()
            .ok_or_else(|| McpError::StreamClosed(self.inner.session_id.clone()))?;

        tx.send(message)
            .await
            .map_err(|_| McpError::StreamClosed(self.inner.session_id.clone()))
    }

    /// Close the stream. Errors if it was already closed.
    pub fn close(&self) -> McpResult<()> {
        match self.sender().take() {
            Some(_) => {
                tracing::debug!(session_id = %self.inner.session_id, "Closed outbound stream");
                Ok(())
            }
            None => Err(McpError::StreamClosed(self.inner.session_id.clone())),
        }
    }

    /// True once closed here or after the receiving side went away.
    pub fn is_closed(&self) -> bool {
        self.sender().as_ref().map_or(true, |tx| tx.is_closed())
    }

    fn sender(&self) -> MutexGuard<'_, Option<mpsc::Sender<String>>> {
        self.inner
            .tx
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
