//! Common utilities for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use bitpin_mcp::{bitpin::ManualClock, BitpinClient, BitpinServer, Config};
use httpmock::prelude::*;
use httpmock::Mock;
use serde_json::json;

pub const API_KEY: &str = "test-api-key";
pub const API_SECRET: &str = "test-api-secret";

/// Configuration pointing at the mock server, with millisecond retry backoff.
pub fn test_config(server: &MockServer) -> Config {
    let api_url = server.url("/api/v1/");

    Config::from_lookup(|key| match key {
        "BITPIN_API_KEY" => Some(API_KEY.to_string()),
        "BITPIN_API_SECRET" => Some(API_SECRET.to_string()),
        "BITPIN_API_URL" => Some(api_url.clone()),
        "BITPIN_TIMEOUT_SECS" => Some("5".to_string()),
        "BITPIN_RETRY_BASE_DELAY_MS" => Some("1".to_string()),
        _ => None,
    })
    .expect("Test configuration should be valid")
}

/// Client driven by a manual clock the test can advance.
pub fn test_client(server: &MockServer) -> (BitpinClient, ManualClock) {
    let clock = ManualClock::new();
    let client = BitpinClient::with_clock(&test_config(server), Arc::new(clock.clone()))
        .expect("Test client should build");

    (client, clock)
}

/// MCP server wrapping a test client.
pub fn test_server(server: &MockServer) -> BitpinServer {
    let (client, _clock) = test_client(server);
    BitpinServer::with_client(client)
}

/// Mock the authenticate exchange, answering with `access` / `refresh`.
pub async fn mock_authenticate<'a>(
    server: &'a MockServer,
    access: &str,
    refresh: &str,
) -> Mock<'a> {
    let body = json!({ "access": access, "refresh": refresh });

    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/v1/usr/authenticate/")
                .json_body(json!({ "api_key": API_KEY, "secret_key": API_SECRET }));
            then.status(200).json_body(body);
        })
        .await
}
