//! Periodic idle-session sweep.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::store::SessionStore;

/// Default idle timeout before a session is evicted.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Default time between sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Evicts sessions that have been idle longer than a timeout.
pub struct LifecycleManager {
    store: Arc<SessionStore>,
    idle_timeout: Duration,
    sweep_interval: Duration,
    task: Mutex<Option<SweepTask>>,
}

struct SweepTask {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl LifecycleManager {
    /// Create a stopped manager.
    pub fn new(store: Arc<SessionStore>, idle_timeout: Duration, sweep_interval: Duration) -> Self {
        Self {
            store,
            idle_timeout,
            sweep_interval,
            task: Mutex::new(None),
        }
    }

    /// Configured idle timeout.
    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Spawn the background sweep. No-op if already running.
    pub fn start(&self) {
        let mut task = self.task.lock().unwrap_or_else(|p| p.into_inner());
        if task.is_some() {
            return;
        }

        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let store = self.store.clone();
        let idle_timeout = self.idle_timeout;
        let interval = self.sweep_interval.max(Duration::from_millis(1));

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        sweep_idle(&store, idle_timeout).await;
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }
            tracing::debug!("Session sweep stopped");
        });

        tracing::info!(
            idle_timeout_secs = idle_timeout.as_secs(),
            sweep_interval_secs = interval.as_secs(),
            "Session sweep started"
        );
        *task = Some(SweepTask { shutdown, handle });
    }

    /// Cancel the background sweep. Safe to call repeatedly or before `start`.
    pub fn stop(&self) {
        let task = self.task.lock().unwrap_or_else(|p| p.into_inner()).take();
        if let Some(task) = task {
            let _ = task.shutdown.send(true);
            task.handle.abort();
        }
    }

    /// Whether the background sweep is running.
    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .as_ref()
            .is_some_and(|task| !task.handle.is_finished())
    }

    /// Run one sweep now. Returns the number of evicted sessions.
    pub async fn sweep(&self) -> usize {
        sweep_idle(&self.store, self.idle_timeout).await
    }
}

impl Drop for LifecycleManager {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Evict every session idle longer than `idle_timeout`.
///
/// Each eviction is independent; a session that was touched or removed
/// between listing and eviction is skipped.
pub async fn sweep_idle(store: &SessionStore, idle_timeout: Duration) -> usize {
    let candidates = store.idle_session_ids(idle_timeout).await;
    let mut evicted = 0;

    for id in candidates {
        match store.remove_if_idle(&id, idle_timeout).await {
            Some(session) => {
                evicted += 1;
                tracing::info!(
                    session_id = %id,
                    idle_secs = session.idle_for().as_secs(),
                    "Evicted idle session"
                );
            }
            None => tracing::debug!(session_id = %id, "Session no longer idle, skipped"),
        }
    }

    if evicted > 0 {
        let remaining = store.len().await;
        tracing::info!(evicted, remaining, "Idle sweep finished");
    }
    evicted
}
