//! Error types and handling module.
//!
//! Defines all application-specific error types and conversions.

use rmcp::ErrorData as McpError;
use thiserror::Error;

/// Application-wide error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Authenticate or refresh exchange was rejected or could not be decoded.
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Upstream answered with a non-success HTTP status.
    #[error("Transport error: HTTP {status}: {reason}")]
    Transport { status: u16, reason: String },

    /// Request never produced an HTTP status (connect, timeout, TLS).
    #[error("Network error: {0}")]
    Network(String),

    /// Response body did not match the expected shape.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Request body could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Caller-supplied argument rejected before any request was made.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl AppError {
    /// HTTP status carried by a [`AppError::Transport`] error.
    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::Transport { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether a retry of the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::Network(_) => true,
            AppError::Transport { status, .. } => {
                matches!(status, 408 | 429) || (500..600).contains(status)
            }
            _ => false,
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<AppError> for McpError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::InvalidInput(_) => McpError::invalid_params(err.to_string(), None),
            AppError::Config(_) => McpError::invalid_request(err.to_string(), None),
            _ => McpError::internal_error(err.to_string(), None),
        }
    }
}

/// Result type alias using AppError.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::ErrorCode;

    #[test]
    fn test_app_error_config_display() {
        let err = AppError::Config("BITPIN_API_KEY environment variable not set".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: BITPIN_API_KEY environment variable not set"
        );
    }

    #[test]
    fn test_app_error_authentication_display() {
        let err = AppError::Authentication("refresh rejected".to_string());
        assert_eq!(err.to_string(), "Authentication error: refresh rejected");
    }

    #[test]
    fn test_app_error_transport_display() {
        let err = AppError::Transport { status: 404, reason: "Not Found".to_string() };
        assert_eq!(err.to_string(), "Transport error: HTTP 404: Not Found");
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_app_error_decode_display() {
        let err = AppError::Decode("[0].symbol: missing field".to_string());
        assert_eq!(err.to_string(), "Decode error: [0].symbol: missing field");
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_transient_classification() {
        assert!(AppError::Network("timed out".into()).is_transient());
        assert!(AppError::Transport { status: 503, reason: String::new() }.is_transient());
        assert!(AppError::Transport { status: 429, reason: String::new() }.is_transient());
        assert!(AppError::Transport { status: 408, reason: String::new() }.is_transient());

        assert!(!AppError::Transport { status: 400, reason: String::new() }.is_transient());
        assert!(!AppError::Transport { status: 404, reason: String::new() }.is_transient());
        assert!(!AppError::Authentication("bad key".into()).is_transient());
        assert!(!AppError::Decode("bad json".into()).is_transient());
    }

    #[test]
    fn test_from_serde_json_error() {
        let parse_err = serde_json::from_str::<u32>("\"nope\"").unwrap_err();
        let app_err: AppError = parse_err.into();

        match app_err {
            AppError::Serialization(msg) => assert!(msg.contains("invalid type")),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_app_error_to_mcp_error_invalid_params() {
        let err = AppError::InvalidInput("symbol cannot be empty".to_string());
        let mcp_err: McpError = err.into();
        assert_eq!(mcp_err.code, ErrorCode::INVALID_PARAMS);
    }

    #[test]
    fn test_app_error_to_mcp_error_invalid_request() {
        let err = AppError::Config("config error".to_string());
        let mcp_err: McpError = err.into();
        assert_eq!(mcp_err.code, ErrorCode::INVALID_REQUEST);
    }

    #[test]
    fn test_app_error_to_mcp_error_internal_error() {
        let err = AppError::Transport { status: 500, reason: "boom".to_string() };
        let mcp_err: McpError = err.into();
        assert_eq!(mcp_err.code, ErrorCode::INTERNAL_ERROR);

        let err = AppError::Authentication("rejected".to_string());
        let mcp_err: McpError = err.into();
        assert_eq!(mcp_err.code, ErrorCode::INTERNAL_ERROR);

        let err = AppError::Decode("bad".to_string());
        let mcp_err: McpError = err.into();
        assert_eq!(mcp_err.code, ErrorCode::INTERNAL_ERROR);
    }

    #[test]
    fn test_mcp_error_message_preserved() {
        let err = AppError::Network("Connection refused".to_string());
        let mcp_err: McpError = err.into();
        assert!(mcp_err.message.contains("Connection refused"));
        assert!(mcp_err.data.is_none());
    }
}
