//! Phase 4: Session store and idle lifecycle tests.

mod common;

use std::io::Write;
use std::time::Duration;

use serde_json::json;

use toolbox_mcp::config::load_config;
use toolbox_mcp::session::{sweep_idle, LifecycleManager};
use toolbox_mcp::streaming::OutboundStream;
use toolbox_mcp::types::{Capability, McpError};

use common::fixtures::{client_caps, create_test_store, test_client};

#[tokio::test]
async fn test_create_and_get_session() {
    let store = create_test_store();
    let session = store
        .create_session(
            "s1",
            test_client(),
            "2024-11-05".to_string(),
            client_caps(json!({"tools": {}})),
        )
        .await;

    assert_eq!(session.id, "s1");
    assert!(session.is_negotiated());
    assert!(!session.initialized);
    assert!(session.negotiated.tools);

    let fetched = store.get_session("s1").await.unwrap();
    assert_eq!(fetched.client_info.name, "test-client");
    assert_eq!(fetched.protocol_version, "2024-11-05");
    assert!(store.get_session("missing").await.is_none());
}

#[tokio::test]
async fn test_has_capability_matches_negotiation() {
    let store = create_test_store();
    store
        .create_session(
            "s1",
            test_client(),
            "2024-11-05".to_string(),
            client_caps(json!({"tools": {}, "prompts": {}, "sampling": {}})),
        )
        .await;

    assert!(store.has_capability("s1", &Capability::Tools).await);
    assert!(!store.has_capability("s1", &Capability::Resources).await);
    assert!(store.has_capability("s1", &Capability::Prompts).await);
    assert!(!store.has_capability("s1", &Capability::Logging).await);
    assert!(store.has_capability("s1", &Capability::Sampling).await);

    for capability in Capability::STANDARD {
        assert!(!store.has_capability("nobody", &capability).await);
    }
}

#[tokio::test]
async fn test_second_create_replaces_negotiation() {
    let store = create_test_store();
    store
        .create_session("s1", test_client(), "2024-11-05".into(), client_caps(json!({"tools": {}})))
        .await;
    let mut partial = serde_json::Map::new();
    partial.insert("logLevel".to_string(), json!("debug"));
    store.update_metadata("s1", partial).await;
    store.mark_initialized("s1").await;

    let second = store
        .create_session(
            "s1",
            test_client(),
            "2025-03-26".into(),
            client_caps(json!({"resources": {}})),
        )
        .await;

    assert!(!second.negotiated.tools);
    assert!(second.negotiated.resources);
    assert_eq!(second.protocol_version, "2025-03-26");
    assert!(second.metadata.is_empty());
    assert!(!second.initialized);
    assert!(!store.has_capability("s1", &Capability::Tools).await);
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_snapshots_are_detached() {
    let store = create_test_store();
    let mut snapshot = store
        .create_session("s1", test_client(), "2024-11-05".into(), client_caps(json!({})))
        .await;
    snapshot.negotiated.tools = true;
    snapshot.metadata.insert("x".to_string(), json!(1));

    let stored = store.get_session("s1").await.unwrap();
    assert!(!stored.negotiated.tools);
    assert!(stored.metadata.is_empty());
}

#[tokio::test]
async fn test_update_metadata_merges() {
    let store = create_test_store();
    store
        .create_session("s1", test_client(), "2024-11-05".into(), client_caps(json!({})))
        .await;

    let mut first = serde_json::Map::new();
    first.insert("a".to_string(), json!(1));
    first.insert("b".to_string(), json!(2));
    store.update_metadata("s1", first).await;

    let mut second = serde_json::Map::new();
    second.insert("b".to_string(), json!(3));
    store.update_metadata("s1", second).await;

    let session = store.get_session("s1").await.unwrap();
    assert_eq!(session.metadata["a"], 1);
    assert_eq!(session.metadata["b"], 3);

    // Unknown sessions are ignored.
    store.update_metadata("ghost", serde_json::Map::new()).await;
    assert!(store.get_session("ghost").await.is_none());
}

#[tokio::test]
async fn test_remove_session_is_idempotent() {
    let store = create_test_store();
    store
        .create_session("s1", test_client(), "2024-11-05".into(), client_caps(json!({})))
        .await;

    assert!(store.remove_session("s1").await.is_some());
    assert!(store.remove_session("s1").await.is_none());
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_remove_closes_bound_stream_once() {
    let store = create_test_store();
    let (stream, mut rx) = OutboundStream::channel("s1", 4);
    store.open_streaming("s1", stream.clone(), 10).await.unwrap();

    assert!(store.remove_session("s1").await.is_some());
    assert!(stream.is_closed());
    assert!(rx.recv().await.is_none());

    assert!(store.remove_session("s1").await.is_none());
    assert!(matches!(stream.close(), Err(McpError::StreamClosed(_))));
}

#[tokio::test]
async fn test_initialize_keeps_stream_binding() {
    let store = create_test_store();
    let (stream, _rx) = OutboundStream::channel("s1", 4);
    let opened = store.open_streaming("s1", stream, 10).await.unwrap();
    assert!(!opened.is_negotiated());

    let negotiated = store
        .create_session("s1", test_client(), "2024-11-05".into(), client_caps(json!({"tools": {}})))
        .await;
    assert!(negotiated.stream.is_some());
    assert!(negotiated.started_at >= opened.started_at);
    assert!(!negotiated.stream.unwrap().is_closed());
}

#[tokio::test]
async fn test_renegotiate_keeps_stream_and_resets_record() {
    let store = create_test_store();
    let (stream, _rx) = OutboundStream::channel("s1", 4);
    store.open_streaming("s1", stream.clone(), 10).await.unwrap();
    let mut partial = serde_json::Map::new();
    partial.insert("k".into(), json!(1));
    store.update_metadata("s1", partial).await;

    let session = store
        .renegotiate_session("s1", test_client(), "2024-11-05".into(), client_caps(json!({"tools": {}})))
        .await
        .unwrap();
    assert!(session.negotiated.tools);
    assert!(session.metadata.is_empty());
    assert!(session.stream.is_some());
    assert!(!stream.is_closed());
    assert!(store.has_capability("s1", &Capability::Tools).await);
}

#[tokio::test]
async fn test_renegotiate_refuses_removed_session() {
    let store = create_test_store();
    let (stream, _rx) = OutboundStream::channel("gone", 4);
    store.open_streaming("gone", stream, 10).await.unwrap();
    store.remove_session("gone").await;

    let err = store
        .renegotiate_session("gone", test_client(), "2024-11-05".into(), client_caps(json!({"tools": {}})))
        .await
        .unwrap_err();
    assert!(matches!(err, McpError::SessionNotFound(_)));
    assert!(store.get_session("gone").await.is_none());
}

#[tokio::test]
async fn test_open_streaming_respects_limit() {
    let store = create_test_store();
    let (a, _rx_a) = OutboundStream::channel("a", 4);
    let (b, _rx_b) = OutboundStream::channel("b", 4);

    store.open_streaming("a", a, 1).await.unwrap();
    let err = store.open_streaming("b", b, 1).await.unwrap_err();
    assert!(matches!(err, McpError::Transport(_)));
    assert!(store.get_session("b").await.is_none());
}

#[tokio::test]
async fn test_list_active_and_clear() {
    let store = create_test_store();
    for id in ["a", "b", "c"] {
        store
            .create_session(id, test_client(), "2024-11-05".into(), client_caps(json!({})))
            .await;
    }
    let (stream, _rx) = OutboundStream::channel("d", 4);
    store.open_streaming("d", stream.clone(), 10).await.unwrap();

    let mut ids: Vec<String> = store.list_active().await.into_iter().map(|s| s.id).collect();
    ids.sort();
    assert_eq!(ids, vec!["a", "b", "c", "d"]);

    assert_eq!(store.clear().await, 4);
    assert!(store.is_empty().await);
    assert!(stream.is_closed());
}

#[tokio::test]
async fn test_summary_serialization() {
    let store = create_test_store();
    store
        .create_session("s1", test_client(), "2024-11-05".into(), client_caps(json!({"tools": {}})))
        .await;
    store.mark_initialized("s1").await;

    let summary = store.get_session("s1").await.unwrap().summary();
    let value = serde_json::to_value(&summary).unwrap();
    assert_eq!(value["id"], "s1");
    assert_eq!(value["client"]["name"], "test-client");
    assert_eq!(value["protocolVersion"], "2024-11-05");
    assert_eq!(value["initialized"], true);
    assert_eq!(value["streaming"], false);
    assert_eq!(value["negotiated"]["tools"], true);
}

#[tokio::test]
async fn test_sweep_evicts_idle_and_spares_touched() {
    let store = create_test_store();
    for id in ["stale", "fresh"] {
        store
            .create_session(id, test_client(), "2024-11-05".into(), client_caps(json!({})))
            .await;
    }

    tokio::time::sleep(Duration::from_millis(120)).await;
    assert!(store.touch("fresh").await);

    let evicted = sweep_idle(&store, Duration::from_millis(60)).await;
    assert_eq!(evicted, 1);
    assert!(store.get_session("stale").await.is_none());
    assert!(store.get_session("fresh").await.is_some());
}

#[tokio::test]
async fn test_sweep_runs_on_spawned_task() {
    let store = create_test_store();
    store
        .create_session("stale", test_client(), "2024-11-05".into(), client_caps(json!({})))
        .await;
    tokio::time::sleep(Duration::from_millis(40)).await;

    let sweeper = store.clone();
    let evicted = tokio::spawn(async move { sweep_idle(&sweeper, Duration::from_millis(10)).await })
        .await
        .unwrap();
    assert_eq!(evicted, 1);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_sweep_closes_stream_of_evicted_session() {
    let store = create_test_store();
    let (stream, _rx) = OutboundStream::channel("idle", 4);
    store.open_streaming("idle", stream.clone(), 10).await.unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(sweep_idle(&store, Duration::from_millis(10)).await, 1);
    assert!(stream.is_closed());
}

#[tokio::test]
async fn test_lifecycle_background_sweep() {
    let store = create_test_store();
    store
        .create_session("s1", test_client(), "2024-11-05".into(), client_caps(json!({})))
        .await;

    let lifecycle = LifecycleManager::new(
        store.clone(),
        Duration::from_millis(30),
        Duration::from_millis(20),
    );
    lifecycle.start();
    assert!(lifecycle.is_running());

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(store.is_empty().await);

    lifecycle.stop();
    assert!(!lifecycle.is_running());
}

#[tokio::test]
async fn test_lifecycle_stop_is_idempotent() {
    let store = create_test_store();
    let lifecycle = LifecycleManager::new(store.clone(), Duration::from_millis(10), Duration::from_millis(10));

    // Before start.
    lifecycle.stop();
    assert!(!lifecycle.is_running());

    lifecycle.start();
    lifecycle.start();
    lifecycle.stop();
    lifecycle.stop();
    assert!(!lifecycle.is_running());

    // Stopped manager no longer evicts.
    store
        .create_session("s1", test_client(), "2024-11-05".into(), client_caps(json!({})))
        .await;
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert!(store.get_session("s1").await.is_some());
}

#[tokio::test]
async fn test_manual_sweep_uses_configured_timeout() {
    let store = create_test_store();
    store
        .create_session("s1", test_client(), "2024-11-05".into(), client_caps(json!({})))
        .await;
    let lifecycle = LifecycleManager::new(store.clone(), Duration::from_secs(300), Duration::from_secs(60));

    assert_eq!(lifecycle.idle_timeout(), Duration::from_secs(300));
    assert_eq!(lifecycle.sweep().await, 0);
    assert_eq!(store.len().await, 1);
}

#[test]
fn test_config_defaults() {
    let config = load_config(None).unwrap();
    assert_eq!(config.idle_timeout(), Duration::from_secs(300));
    assert_eq!(config.sweep_interval(), Duration::from_secs(60));
    assert_eq!(config.tool_timeout(), Duration::from_secs(30));
    assert_eq!(config.max_sessions, 10_000);
    assert_eq!(config.default_session_id, "default");

    let caps = config.capabilities.server_capabilities();
    assert!(caps.tools.is_some() && caps.resources.is_some());
    assert!(caps.prompts.is_some() && caps.logging.is_some());
    assert!(caps.experimental.is_none());
}

#[test]
fn test_config_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
idle_timeout_secs = 5
max_sessions = 2

[capabilities]
prompts = false
experimental = ["streaming"]
"#
    )
    .unwrap();

    let config = load_config(Some(file.path().to_str().unwrap())).unwrap();
    assert_eq!(config.idle_timeout_secs, 5);
    assert_eq!(config.max_sessions, 2);
    assert_eq!(config.sweep_interval_secs, 60);

    let caps = config.capabilities.server_capabilities();
    assert!(caps.prompts.is_none());
    assert!(caps.tools.is_some());
    assert!(caps.experimental.unwrap().contains_key("streaming"));
}

#[test]
fn test_config_errors() {
    let err = load_config(Some("/definitely/not/here.toml")).unwrap_err();
    assert!(matches!(err, McpError::Config(_)));

    let mut bad = tempfile::NamedTempFile::new().unwrap();
    writeln!(bad, "idle_timeout_secs = \"soon\"").unwrap();
    assert!(matches!(
        load_config(Some(bad.path().to_str().unwrap())),
        Err(McpError::Config(_))
    ));

    let mut zero = tempfile::NamedTempFile::new().unwrap();
    writeln!(zero, "sweep_interval_secs = 0").unwrap();
    assert!(matches!(
        load_config(Some(zero.path().to_str().unwrap())),
        Err(McpError::Config(_))
    ));
}
