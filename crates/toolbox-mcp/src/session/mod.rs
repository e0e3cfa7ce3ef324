//! Session management: the session store and its idle lifecycle.

pub mod lifecycle;
pub mod store;

pub use lifecycle::{sweep_idle, LifecycleManager};
pub use store::{Session, SessionStore, SessionSummary};
