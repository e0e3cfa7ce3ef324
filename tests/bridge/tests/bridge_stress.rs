//! Stress tests: many sessions, many requests, streaming churn.
//!
//! Tests verify that the router keeps up with thousands of requests and that
//! streaming sessions opened and dropped in bulk leave nothing behind.

use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{json, Value};
use tempfile::NamedTempFile;
use toolbox_mcp::config::load_config;
use toolbox_mcp::streaming::{MessageOutcome, StreamingManager};
use toolbox_mcp::ProtocolHandler;

// ─── Helpers ───────────────────────────────────────────────────────────────

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create config file");
    file.write_all(contents.as_bytes()).expect("Failed to write config");
    file
}

fn create_manager(contents: &str) -> Arc<StreamingManager> {
    let file = write_config(contents);
    let config = load_config(Some(file.path().to_str().unwrap())).expect("valid config");
    let handler = Arc::new(ProtocolHandler::from_config(&config));
    Arc::new(StreamingManager::new(handler, &config))
}

fn initialize(id: i64) -> String {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "initialize",
        "params": {
            "protocolVersion": "2025-03-26",
            "capabilities": {"tools": {}, "resources": {}, "prompts": {}},
            "clientInfo": {"name": "stress", "version": "1.0"}
        }
    })
    .to_string()
}

fn call(id: i64, name: &str, args: Value) -> String {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": {"name": name, "arguments": args}
    })
    .to_string()
}

// ─── Tests ─────────────────────────────────────────────────────────────────

/// 2,000 tool calls spread over 20 sessions.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_tool_calls() {
    let manager = create_manager("");
    let handler = manager.handler().clone();
    let start = Instant::now();

    let mut handles = vec![];
    for client in 0..20 {
        let handler = handler.clone();
        handles.push(tokio::spawn(async move {
            let session_id = format!("load-{client}");
            handler.handle_raw(&session_id, &initialize(0)).await;

            for i in 0..100i64 {
                let expression = format!("{i} * 2 + {client}");
                let response = handler
                    .handle_raw(&session_id, &call(i, "calculate", json!({"expression": expression})))
                    .await
                    .unwrap();
                let expected = (i * 2 + client).to_string();
                assert_eq!(response["result"]["content"][0]["text"], expected.as_str());
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let elapsed = start.elapsed();
    assert!(elapsed < Duration::from_secs(30), "2,000 calls took {elapsed:?}");
    assert_eq!(handler.store().len().await, 20);
}

/// Open, use and drop 200 streams; every session goes away.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_stream_churn() {
    let manager = create_manager("max_sessions = 500\n");

    let mut handles = vec![];
    for _ in 0..200 {
        let manager = manager.clone();
        handles.push(tokio::spawn(async move {
            let mut opened = manager.create_session().await.unwrap();
            let id = opened.session.id.clone();

            let outcome = manager.handle_message(&id, &initialize(1)).await;
            assert!(matches!(outcome, MessageOutcome::Accepted));
            let pushed = opened.receiver.recv().await.unwrap();
            assert!(pushed.contains("negotiatedCapabilities"));

            // Client disconnect.
            drop(opened);
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let mut remaining = usize::MAX;
    for _ in 0..100 {
        remaining = manager.store().len().await;
        if remaining == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(remaining, 0);
}

/// The background sweep and disconnects race over the same sessions.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_sweep_and_disconnect_race() {
    let manager = create_manager("idle_timeout_secs = 0\nsweep_interval_secs = 1\n");
    manager.start();

    let mut opened = vec![];
    for _ in 0..50 {
        opened.push(manager.create_session().await.unwrap());
    }

    // Let the sweep evict some while the guards drop the rest.
    tokio::time::sleep(Duration::from_millis(1100)).await;
    drop(opened);

    let mut remaining = usize::MAX;
    for _ in 0..100 {
        remaining = manager.store().len().await;
        if remaining == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(remaining, 0);

    manager.destroy().await;
    assert!(!manager.lifecycle().is_running());
}
