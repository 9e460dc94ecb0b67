//! Integration tests for the streamable HTTP MCP host.
//!
//! Run with: `cargo test --test test_http_transport`

mod common;

use bitpin_mcp::mcp::http;
use httpmock::MockServer;
use serde_json::json;
use tokio::{net::TcpListener, sync::oneshot};

fn initialize_request() -> serde_json::Value {
    json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "initialize",
        "params": {
            "protocolVersion": "2025-03-26",
            "capabilities": {},
            "clientInfo": { "name": "http-test", "version": "0.0.1" }
        }
    })
}

#[tokio::test]
async fn test_http_host_answers_initialize() {
    let upstream = MockServer::start_async().await;
    let mcp = common::test_server(&upstream);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = oneshot::channel::<()>();
    let host = tokio::spawn(http::serve(mcp, listener, async {
        let _ = stopped.await;
    }));

    let client = reqwest::Client::new();
    let url = format!("http://{}{}", addr, http::MCP_PATH);

    let response = client
        .post(&url)
        .header("accept", "application/json, text/event-stream")
        .json(&initialize_request())
        .send()
        .await
        .expect("initialize request should reach the host");

    assert_eq!(response.status(), 200);
    assert!(response.headers().contains_key("mcp-session-id"));

    let body = response.text().await.unwrap();
    assert!(body.contains("bitpin-mcp"), "unexpected initialize response: {}", body);

    let rejected = client.post(&url).json(&initialize_request()).send().await.unwrap();
    assert_eq!(rejected.status(), 406);

    drop(client);
    stop.send(()).unwrap();
    host.await.unwrap().expect("host should shut down cleanly");
}
