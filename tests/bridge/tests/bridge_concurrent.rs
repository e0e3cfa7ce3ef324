//! Concurrent access: many clients sharing one router and session store.
//!
//! Tests verify that sessions negotiated in parallel never see each other's
//! capabilities, that racing `initialize` calls for one id leave exactly one
//! consistent record, that concurrent removals close a stream once, and that
//! a removed streaming session is never recreated by a late `initialize`.

use std::sync::Arc;
use tokio::sync::Barrier;

use serde_json::{json, Value};
use toolbox_mcp::config::ServerConfig;
use toolbox_mcp::session::SessionStore;
use toolbox_mcp::streaming::{OutboundStream, StreamingManager};
use toolbox_mcp::types::{Capability, ServerCapabilities};
use toolbox_mcp::ProtocolHandler;

// ─── Helpers ───────────────────────────────────────────────────────────────

fn create_handler() -> Arc<ProtocolHandler> {
    let store = Arc::new(SessionStore::new(ServerCapabilities::default_capabilities()));
    Arc::new(ProtocolHandler::new(store))
}

async fn send(handler: &ProtocolHandler, session_id: &str, message: Value) -> Value {
    handler
        .handle_raw(session_id, &message.to_string())
        .await
        .expect("request must be answered")
}

async fn init_session(handler: &ProtocolHandler, session_id: &str, capabilities: Value) -> Value {
    let response = send(
        handler,
        session_id,
        json!({
            "jsonrpc": "2.0",
            "id": 0,
            "method": "initialize",
            "params": {
                "protocolVersion": "2024-11-05",
                "capabilities": capabilities,
                "clientInfo": {"name": session_id, "version": "1.0"}
            }
        }),
    )
    .await;

    handler
        .handle_raw(
            session_id,
            &json!({"jsonrpc": "2.0", "method": "notifications/initialized"}).to_string(),
        )
        .await;
    response
}

fn request(id: i64, method: &str, params: Value) -> Value {
    json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params})
}

// ─── Tests ─────────────────────────────────────────────────────────────────

/// Fifty clients with alternating capability sets, all at once.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_sessions_stay_isolated() {
    let handler = create_handler();
    let barrier = Arc::new(Barrier::new(50));
    let mut handles = vec![];

    for client in 0..50u32 {
        let handler = handler.clone();
        let barrier = barrier.clone();

        handles.push(tokio::spawn(async move {
            let session_id = format!("client-{client}");
            let wants_tools = client % 2 == 0;
            let capabilities = if wants_tools {
                json!({"tools": {}})
            } else {
                json!({"prompts": {}})
            };

            barrier.wait().await;
            init_session(&handler, &session_id, capabilities).await;

            for i in 0..10 {
                let response = send(&handler, &session_id, request(i, "tools/list", json!({}))).await;
                if wants_tools {
                    assert!(response["result"]["tools"].is_array(), "{session_id}: {response}");
                } else {
                    assert_eq!(response["error"]["code"], -32601, "{session_id}: {response}");
                }
            }
            client
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    let sessions = handler.store().list_active().await;
    assert_eq!(sessions.len(), 50);
    assert!(sessions.iter().all(|s| s.initialized));
}

/// Racing initialize calls for one id end with one complete negotiation.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_initialize_same_id() {
    let handler = create_handler();
    let barrier = Arc::new(Barrier::new(20));
    let mut handles = vec![];

    for attempt in 0..20u32 {
        let handler = handler.clone();
        let barrier = barrier.clone();
        handles.push(tokio::spawn(async move {
            let capabilities = if attempt % 2 == 0 {
                json!({"tools": {}, "logging": {}})
            } else {
                json!({"resources": {}, "prompts": {}})
            };
            barrier.wait().await;
            init_session(&handler, "shared", capabilities).await
        }));
    }

    for handle in handles {
        let response = handle.await.unwrap();
        assert_eq!(response["result"]["protocolVersion"], "2024-11-05");
    }

    let store = handler.store();
    assert_eq!(store.len().await, 1);

    // Whichever call won, its negotiation is whole, never a merge of two.
    let session = store.get_session("shared").await.unwrap();
    let negotiated = &session.negotiated;
    let even = negotiated.tools && negotiated.logging && !negotiated.resources && !negotiated.prompts;
    let odd = !negotiated.tools && !negotiated.logging && negotiated.resources && negotiated.prompts;
    assert!(even ^ odd, "negotiation was merged: {negotiated:?}");

    assert_eq!(store.has_capability("shared", &Capability::Tools).await, even);
    assert_eq!(store.has_capability("shared", &Capability::Resources).await, odd);
}

/// Removal from a disconnect, a sweep and an admin clear at the same time.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_removal_closes_once() {
    let handler = create_handler();
    let store = handler.store().clone();

    for round in 0..25 {
        let id = format!("stream-{round}");
        let (stream, mut rx) = OutboundStream::channel(&id, 4);
        store.open_streaming(&id, stream.clone(), 1000).await.unwrap();

        let barrier = Arc::new(Barrier::new(3));
        let mut handles = vec![];
        for _ in 0..3 {
            let store = store.clone();
            let barrier = barrier.clone();
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                barrier.wait().await;
                store.remove_session(&id).await.is_some()
            }));
        }

        let mut removed = 0;
        for handle in handles {
            if handle.await.unwrap() {
                removed += 1;
            }
        }
        assert_eq!(removed, 1, "round {round}: exactly one caller removes");
        assert!(stream.is_closed());
        assert!(rx.recv().await.is_none());
    }

    assert!(store.is_empty().await);
}

/// Requests touching a session while it is being swept.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_sweep_races_with_activity() {
    let handler = create_handler();
    for i in 0..20 {
        init_session(&handler, &format!("s{i}"), json!({"tools": {}})).await;
    }

    tokio::time::sleep(std::time::Duration::from_millis(60)).await;

    let store = handler.store().clone();
    let sweeper = tokio::spawn(async move {
        toolbox_mcp::session::sweep_idle(&store, std::time::Duration::from_millis(30)).await
    });

    let mut pings = vec![];
    for i in 0..20 {
        let handler = handler.clone();
        pings.push(tokio::spawn(async move {
            send(&handler, &format!("s{i}"), request(1, "ping", json!({}))).await
        }));
    }
    for ping in pings {
        let response = ping.await.unwrap();
        assert_eq!(response["result"], json!({}));
    }

    let evicted = sweeper.await.unwrap();
    let remaining = handler.store().len().await;
    assert_eq!(evicted + remaining, 20);
}

/// Initialize racing a disconnect never brings the removed session back.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_initialize_racing_removal_stays_removed() {
    let manager = Arc::new(StreamingManager::new(create_handler(), &ServerConfig::default()));

    for round in 0..300 {
        let opened = manager.create_session().await.unwrap();
        let id = opened.session.id.clone();
        let barrier = Arc::new(Barrier::new(2));

        let init = {
            let manager = manager.clone();
            let barrier = barrier.clone();
            let id = id.clone();
            tokio::spawn(async move {
                let message = json!({
                    "jsonrpc": "2.0",
                    "id": round,
                    "method": "initialize",
                    "params": {
                        "protocolVersion": "2024-11-05",
                        "capabilities": {"tools": {}},
                        "clientInfo": {"name": "racer", "version": "1.0"}
                    }
                });
                barrier.wait().await;
                manager.handle_message(&id, &message.to_string()).await
            })
        };
        let remove = {
            let manager = manager.clone();
            let id = id.clone();
            tokio::spawn(async move {
                barrier.wait().await;
                manager.remove_session(&id).await
            })
        };

        init.await.unwrap();
        assert!(remove.await.unwrap(), "round {round}: removal must win once");
        assert!(
            manager.store().get_session(&id).await.is_none(),
            "round {round}: removed session came back"
        );
        drop(opened);
    }

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(manager.store().is_empty().await);
}
