//! Shared HTTP transport.
//!
//! One `reqwest::Client` (connection pool, per-call timeout), the API base
//! URL, and the retry policy. Every upstream call, including the token
//! exchanges, goes through [`Transport::execute`].

use std::time::Duration;

use reqwest::{header, Method, Response, Url};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    bitpin::RetryPolicy,
    error::{AppError, Result},
};

/// Longest response body carried into a transport error.
const MAX_REASON_LEN: usize = 512;

/// One logical upstream call.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// Path relative to the base URL (no leading slash).
    pub path: String,
    /// Serialized JSON body.
    pub body: Option<Vec<u8>>,
    /// Whether a bearer token must be attached.
    pub needs_auth: bool,
    /// Whether the call may be repeated safely.
    pub idempotent: bool,
}

impl ApiRequest {
    /// A bodyless request. GET requests are treated as idempotent.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        let idempotent = method == Method::GET;
        Self { method, path: path.into(), body: None, needs_auth: false, idempotent }
    }

    /// Attach a JSON body, serializing it immediately.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        self.body = Some(serde_json::to_vec(body)?);
        Ok(self)
    }

    /// Require a bearer token.
    pub fn authenticated(mut self, needs_auth: bool) -> Self {
        self.needs_auth = needs_auth;
        self
    }

    /// Override the idempotency classification.
    pub fn idempotent(mut self, idempotent: bool) -> Self {
        self.idempotent = idempotent;
        self
    }
}

/// HTTP transport shared by the token manager and the dispatcher.
#[derive(Debug, Clone)]
pub struct Transport {
    http: reqwest::Client,
    base_url: Url,
    retry: RetryPolicy,
}

impl Transport {
    /// Build a transport with the given per-call timeout.
    pub fn new(base_url: Url, timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("bitpin-mcp/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { http, base_url, retry })
    }

    /// Resolve a relative path against the base URL.
    pub fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| AppError::InvalidInput(format!("Invalid request path '{}': {}", path, e)))
    }

    /// Send `request`, applying the retry policy, and fail on any non-success status.
    pub async fn execute(&self, request: &ApiRequest, bearer: Option<&str>) -> Result<Response> {
        let url = self.url(&request.path)?;

        self.retry.run(request.idempotent, || self.execute_once(request, &url, bearer)).await
    }

    async fn execute_once(
        &self,
        request: &ApiRequest,
        url: &Url,
        bearer: Option<&str>,
    ) -> Result<Response> {
        tracing::debug!(
            method = %request.method,
            url = %url,
            auth = bearer.is_some(),
            "Sending request"
        );

        let mut builder = self.http.request(request.method.clone(), url.clone());

        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }

        if let Some(body) = &request.body {
            builder = builder.header(header::CONTENT_TYPE, "application/json").body(body.clone());
        }

        let response = builder.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let reason = if body.trim().is_empty() {
            status.canonical_reason().unwrap_or("Unknown status").to_string()
        } else {
            truncate(body.trim(), MAX_REASON_LEN)
        };

        tracing::debug!(status = status.as_u16(), url = %url, "Upstream returned error status");

        Err(AppError::Transport { status: status.as_u16(), reason })
    }
}

/// Read the body and decode it as `T`, reporting the JSON path of any mismatch.
///
/// An empty body decodes as JSON `null`, so `Option` targets accept it.
pub async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let text = response.text().await?;
    decode_str(&text)
}

/// Decode a JSON string as `T`; see [`decode_json`].
pub fn decode_str<T: DeserializeOwned>(text: &str) -> Result<T> {
    let text = if text.trim().is_empty() { "null" } else { text };
    let mut deserializer = serde_json::Deserializer::from_str(text);

    serde_path_to_error::deserialize(&mut deserializer).map_err(|err| {
        let path = err.path().to_string();
        AppError::Decode(format!("at '{}': {}", path, err.into_inner()))
    })
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Market;

    #[test]
    fn test_get_is_idempotent_by_default() {
        assert!(ApiRequest::new(Method::GET, "mkt/markets/").idempotent);
        assert!(!ApiRequest::new(Method::POST, "odr/orders/").idempotent);
        assert!(!ApiRequest::new(Method::DELETE, "odr/orders/1/").idempotent);
        assert!(ApiRequest::new(Method::POST, "usr/authenticate/").idempotent(true).idempotent);
    }

    #[test]
    fn test_body_serialized_eagerly() {
        let request = ApiRequest::new(Method::POST, "odr/orders/")
            .json(&serde_json::json!({"symbol": "BTC_IRT"}))
            .unwrap();
        assert_eq!(request.body.as_deref(), Some(br#"{"symbol":"BTC_IRT"}"#.as_slice()));
    }

    #[test]
    fn test_url_join() {
        let base = Url::parse("https://api.bitpin.org/api/v1/").unwrap();
        let transport = Transport::new(base, Duration::from_secs(1), RetryPolicy::none()).unwrap();

        assert_eq!(
            transport.url("mth/orderbook/BTC_IRT/").unwrap().as_str(),
            "https://api.bitpin.org/api/v1/mth/orderbook/BTC_IRT/"
        );
        assert_eq!(
            transport.url("/odr/orders/?state=active").unwrap().as_str(),
            "https://api.bitpin.org/api/v1/odr/orders/?state=active"
        );
    }

    #[test]
    fn test_decode_reports_path() {
        let err = decode_str::<Vec<Market>>(r#"[{"symbol":"BTC_IRT","base":"BTC"}]"#).unwrap_err();
        match err {
            AppError::Decode(msg) => {
                assert!(msg.contains("[0]"), "{msg}");
                assert!(msg.contains("quote"), "{msg}");
            }
            other => panic!("Expected Decode error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_body_decodes_as_null() {
        let none: Option<Vec<Market>> = decode_str("").unwrap();
        assert!(none.is_none());
        assert!(matches!(decode_str::<Vec<Market>>("  "), Err(AppError::Decode(_))));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 4), "abcd...");
    }
}
