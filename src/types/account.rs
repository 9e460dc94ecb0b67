//! Account and authentication types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Balance of one asset in one wallet service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    /// Wallet id.
    pub id: i64,
    /// Asset code (e.g., "USDT").
    pub asset: String,
    /// Total balance.
    pub balance: Decimal,
    /// Amount locked in open orders.
    pub frozen: Decimal,
    /// Wallet service (e.g., "main").
    #[serde(default)]
    pub service: String,
}

/// Body of `POST usr/authenticate/`.
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticateRequest<'a> {
    /// API key.
    pub api_key: &'a str,
    /// API secret.
    pub secret_key: &'a str,
}

/// Token pair returned by `usr/authenticate/`.
#[derive(Clone, Deserialize)]
pub struct TokenResponse {
    /// Access token.
    pub access: String,
    /// Refresh token.
    pub refresh: String,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse").field("access", &"***").field("refresh", &"***").finish()
    }
}

/// Body of `POST usr/refresh_token/`.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshRequest<'a> {
    /// Refresh token.
    pub refresh: &'a str,
}

/// New access token returned by `usr/refresh_token/`.
#[derive(Clone, Deserialize)]
pub struct RefreshResponse {
    /// Access token.
    pub access: String,
}

impl std::fmt::Debug for RefreshResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshResponse").field("access", &"***").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wallet_decoding() {
        let json = r#"{"id":1,"asset":"USDT","balance":"12.5","frozen":"0","service":"main"}"#;
        let wallet: Wallet = serde_json::from_str(json).unwrap();
        assert_eq!(wallet.asset, "USDT");
        assert_eq!(wallet.balance, Decimal::new(125, 1));
    }

    #[test]
    fn test_authenticate_request_field_names() {
        let body = serde_json::to_value(AuthenticateRequest { api_key: "k", secret_key: "s" })
            .unwrap();
        assert_eq!(body, serde_json::json!({"api_key": "k", "secret_key": "s"}));
    }

    #[test]
    fn test_token_debug_hides_values() {
        let tokens = TokenResponse { access: "access-1".into(), refresh: "refresh-1".into() };
        let debug = format!("{:?}", tokens);
        assert!(!debug.contains("access-1"));
        assert!(!debug.contains("refresh-1"));
    }
}
