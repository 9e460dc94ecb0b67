//! Configuration management module.
//!
//! Handles loading configuration from environment variables.

use std::{env, fmt, net::SocketAddr, str::FromStr, time::Duration};

use reqwest::Url;

use crate::{bitpin::RetryPolicy, error::AppError};

/// Default Bitpin REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.bitpin.org/api/v1/";

/// Default per-call timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default listen address of the HTTP MCP host.
pub const DEFAULT_HTTP_BIND: &str = "127.0.0.1:8000";

/// How the MCP server talks to its client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum McpTransport {
    /// JSON-RPC over stdin/stdout.
    #[default]
    Stdio,
    /// Streamable HTTP, served at `/mcp` on [`Config::http_bind`].
    Http,
}

impl FromStr for McpTransport {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stdio" => Ok(McpTransport::Stdio),
            "http" => Ok(McpTransport::Http),
            other => Err(AppError::Config(format!(
                "Invalid MCP_TRANSPORT '{}': expected 'stdio' or 'http'",
                other
            ))),
        }
    }
}

/// String wrapper that keeps credentials out of logs.
///
/// `Debug` prints `SecretString(***)`, `Display` prints a `abcd...wxyz` mask.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    /// Wrap a secret value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw secret. Only for putting on the wire.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Masked form safe for logging.
    pub fn masked(&self) -> String {
        let s = &self.0;
        if s.chars().count() <= 8 {
            return "***".to_string();
        }
        let head: String = s.chars().take(4).collect();
        let tail: String = s.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
        format!("{head}...{tail}")
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretString(***)")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.masked())
    }
}

/// Bitpin API key pair used to mint the first token pair.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Public API key.
    pub api_key: SecretString,
    /// API secret.
    pub api_secret: SecretString,
}

impl Credentials {
    /// Build credentials, rejecting blank values.
    pub fn new(api_key: &str, api_secret: &str) -> Result<Self, AppError> {
        let api_key = api_key.trim();
        let api_secret = api_secret.trim();

        if api_key.is_empty() {
            return Err(AppError::Config("BITPIN_API_KEY cannot be empty".into()));
        }
        if api_secret.is_empty() {
            return Err(AppError::Config("BITPIN_API_SECRET cannot be empty".into()));
        }

        Ok(Self { api_key: SecretString::new(api_key), api_secret: SecretString::new(api_secret) })
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// API credentials.
    pub credentials: Credentials,
    /// Base URL of the REST API, always ending with `/`.
    pub api_url: Url,
    /// Overall per-call timeout.
    pub timeout: Duration,
    /// Retry policy for idempotent calls.
    pub retry: RetryPolicy,
    /// Logging level (default: info).
    pub log_level: String,
    /// MCP host transport.
    pub transport: McpTransport,
    /// Listen address when `transport` is HTTP.
    pub http_bind: SocketAddr,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `BITPIN_API_KEY`: API key
    /// - `BITPIN_API_SECRET`: API secret
    ///
    /// Optional environment variables:
    /// - `BITPIN_API_URL`: REST base URL (default: `https://api.bitpin.org/api/v1/`)
    /// - `BITPIN_TIMEOUT_SECS`: per-call timeout (default: 10)
    /// - `BITPIN_RETRY_MAX_ATTEMPTS`: attempts for idempotent calls (default: 3)
    /// - `BITPIN_RETRY_BASE_DELAY_MS`: first backoff delay (default: 500)
    /// - `LOG_LEVEL`: Logging level (default: info)
    /// - `MCP_TRANSPORT`: `stdio` or `http` (default: stdio)
    /// - `MCP_HTTP_BIND`: HTTP listen address (default: `127.0.0.1:8000`)
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("BITPIN_API_KEY")
            .ok_or_else(|| AppError::Config("BITPIN_API_KEY environment variable not set".into()))?;

        let api_secret = lookup("BITPIN_API_SECRET").ok_or_else(|| {
            AppError::Config("BITPIN_API_SECRET environment variable not set".into())
        })?;

        let credentials = Credentials::new(&api_key, &api_secret)?;

        let api_url = parse_api_url(
            lookup("BITPIN_API_URL").as_deref().unwrap_or(DEFAULT_API_URL),
        )?;

        let timeout = match lookup("BITPIN_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = parse_number("BITPIN_TIMEOUT_SECS", &raw)?;
                if secs == 0 {
                    return Err(AppError::Config("BITPIN_TIMEOUT_SECS must be at least 1".into()));
                }
                Duration::from_secs(secs)
            }
            None => DEFAULT_TIMEOUT,
        };

        let mut retry = RetryPolicy::default();
        if let Some(raw) = lookup("BITPIN_RETRY_MAX_ATTEMPTS") {
            let attempts: u32 = parse_number("BITPIN_RETRY_MAX_ATTEMPTS", &raw)?;
            if attempts == 0 {
                return Err(AppError::Config(
                    "BITPIN_RETRY_MAX_ATTEMPTS must be at least 1".into(),
                ));
            }
            retry.max_attempts = attempts;
        }
        if let Some(raw) = lookup("BITPIN_RETRY_BASE_DELAY_MS") {
            retry.base_delay =
                Duration::from_millis(parse_number("BITPIN_RETRY_BASE_DELAY_MS", &raw)?);
        }

        let log_level = lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let transport = match lookup("MCP_TRANSPORT") {
            Some(raw) => raw.parse()?,
            None => McpTransport::default(),
        };

        let http_bind = parse_number(
            "MCP_HTTP_BIND",
            lookup("MCP_HTTP_BIND").as_deref().unwrap_or(DEFAULT_HTTP_BIND),
        )?;

        Ok(Self { credentials, api_url, timeout, retry, log_level, transport, http_bind })
    }
}

/// Parse the base URL and make sure relative paths join beneath it.
pub fn parse_api_url(raw: &str) -> Result<Url, AppError> {
    let trimmed = raw.trim();
    let normalized =
        if trimmed.ends_with('/') { trimmed.to_string() } else { format!("{trimmed}/") };

    let url = Url::parse(&normalized)
        .map_err(|e| AppError::Config(format!("Invalid BITPIN_API_URL '{}': {}", raw, e)))?;

    if url.cannot_be_a_base() {
        return Err(AppError::Config(format!("BITPIN_API_URL '{}' cannot be a base URL", raw)));
    }

    Ok(url)
}

fn parse_number<T: FromStr>(key: &str, raw: &str) -> Result<T, AppError>
where
    T::Err: fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| AppError::Config(format!("Invalid {}: {}", key, e)))
}
