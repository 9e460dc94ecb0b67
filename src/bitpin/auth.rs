//! Bearer token lifecycle.
//!
//! [`TokenManager::ensure_valid_token`] hands out an access token that is
//! valid now, authenticating with the API key pair on first use and
//! refreshing once the token enters the safety margin before expiry. The
//! token pair sits behind one async mutex held across the exchange, so
//! concurrent callers wait for a single in-flight authenticate or refresh
//! instead of each issuing their own.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use reqwest::Method;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    bitpin::{
        clock::Clock,
        transport::{decode_json, ApiRequest, Transport},
    },
    config::Credentials,
    error::{AppError, Result},
    types::{AuthenticateRequest, RefreshRequest, RefreshResponse, TokenResponse},
};

/// Lifetime assumed for each access token from the moment it is issued.
pub const TOKEN_VALIDITY: Duration = Duration::from_secs(13 * 60);

/// Tokens closer than this to expiry are refreshed before use.
pub const REFRESH_MARGIN: Duration = Duration::from_secs(30);

const AUTHENTICATE_PATH: &str = "usr/authenticate/";
const REFRESH_PATH: &str = "usr/refresh_token/";

/// Access/refresh pair currently held.
struct TokenPair {
    access: String,
    refresh: String,
    expires_at: Instant,
}

impl TokenPair {
    fn needs_refresh(&self, now: Instant, margin: Duration) -> bool {
        now + margin >= self.expires_at
    }
}

/// Owns the token pair and decides when to authenticate or refresh.
pub struct TokenManager {
    transport: Transport,
    credentials: Credentials,
    clock: Arc<dyn Clock>,
    validity: Duration,
    margin: Duration,
    state: Mutex<Option<TokenPair>>,
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("credentials", &self.credentials)
            .field("validity", &self.validity)
            .field("margin", &self.margin)
            .finish_non_exhaustive()
    }
}

impl TokenManager {
    /// Create a manager with an explicit time source.
    pub fn with_clock(
        transport: Transport,
        credentials: Credentials,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            transport,
            credentials,
            clock,
            validity: TOKEN_VALIDITY,
            margin: REFRESH_MARGIN,
            state: Mutex::new(None),
        }
    }

    /// Return an access token valid now, authenticating or refreshing as needed.
    pub async fn ensure_valid_token(&self) -> Result<String> {
        let mut state = self.state.lock().await;
        let now = self.clock.now();

        match state.as_mut() {
            None => {
                let tokens = self.request_token_pair().await?;
                *state = Some(self.store_pair(tokens));
            }
            Some(pair) if pair.needs_refresh(now, self.margin) => {
                debug!("Access token expired or expiring, refreshing");
                match self.request_refresh(&pair.refresh).await {
                    Ok(refreshed) => {
                        pair.access = refreshed.access;
                        pair.expires_at = self.clock.now() + self.validity;
                        info!("Access token refreshed");
                    }
                    Err(err) => {
                        warn!(error = %err, "Token refresh failed, dropping token pair");
                        *state = None;
                        return Err(err);
                    }
                }
            }
            Some(_) => {}
        }

        state
            .as_ref()
            .map(|pair| pair.access.clone())
            .ok_or_else(|| AppError::Authentication("No access token available".into()))
    }

    /// Perform a full authenticate exchange and replace the held pair.
    pub async fn authenticate(&self) -> Result<TokenResponse> {
        let mut state = self.state.lock().await;
        let tokens = self.request_token_pair().await?;
        *state = Some(self.store_pair(tokens.clone()));
        Ok(tokens)
    }

    /// Exchange the held refresh token for a new access token.
    pub async fn refresh(&self) -> Result<RefreshResponse> {
        let mut state = self.state.lock().await;
        let pair = state.as_mut().ok_or_else(|| {
            AppError::Authentication("Cannot refresh before authenticating".into())
        })?;

        match self.request_refresh(&pair.refresh).await {
            Ok(refreshed) => {
                pair.access = refreshed.access.clone();
                pair.expires_at = self.clock.now() + self.validity;
                Ok(refreshed)
            }
            Err(err) => {
                warn!(error = %err, "Token refresh failed, dropping token pair");
                *state = None;
                Err(err)
            }
        }
    }

    /// Forget the held pair; the next call authenticates from scratch.
    pub async fn invalidate(&self) {
        *self.state.lock().await = None;
    }

    /// Drop the held pair if its access token is `access`.
    ///
    /// A pair obtained by another caller since `access` was handed out is kept.
    pub async fn reject(&self, access: &str) {
        let mut state = self.state.lock().await;

        if state.as_ref().is_some_and(|pair| pair.access == access) {
            warn!("Access token rejected upstream, dropping token pair");
            *state = None;
        }
    }

    /// Whether a token pair is currently held.
    pub async fn has_token(&self) -> bool {
        self.state.lock().await.is_some()
    }

    fn store_pair(&self, tokens: TokenResponse) -> TokenPair {
        info!(api_key = %self.credentials.api_key, "Authenticated with API key");
        TokenPair {
            access: tokens.access,
            refresh: tokens.refresh,
            expires_at: self.clock.now() + self.validity,
        }
    }

    async fn request_token_pair(&self) -> Result<TokenResponse> {
        let body = AuthenticateRequest {
            api_key: self.credentials.api_key.expose(),
            secret_key: self.credentials.api_secret.expose(),
        };
        let request =
            ApiRequest::new(Method::POST, AUTHENTICATE_PATH).json(&body)?.idempotent(true);

        self.exchange(request).await
    }

    async fn request_refresh(&self, refresh: &str) -> Result<RefreshResponse> {
        let request = ApiRequest::new(Method::POST, REFRESH_PATH)
            .json(&RefreshRequest { refresh })?
            .idempotent(true);

        self.exchange(request).await
    }

    async fn exchange<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let response = self.transport.execute(&request, None).await.map_err(as_auth_error)?;
        decode_json(response).await.map_err(as_auth_error)
    }
}

/// Upstream rejections and undecodable token bodies are authentication failures.
fn as_auth_error(err: AppError) -> AppError {
    match err {
        AppError::Transport { status, reason } => {
            AppError::Authentication(format!("HTTP {}: {}", status, reason))
        }
        AppError::Decode(msg) => {
            AppError::Authentication(format!("Invalid token response {}", msg))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_refresh_boundaries() {
        let now = Instant::now();
        let pair = TokenPair {
            access: "a".into(),
            refresh: "r".into(),
            expires_at: now + Duration::from_secs(60),
        };

        assert!(!pair.needs_refresh(now, REFRESH_MARGIN));
        assert!(pair.needs_refresh(now + Duration::from_secs(30), REFRESH_MARGIN));
        assert!(pair.needs_refresh(now + Duration::from_secs(61), REFRESH_MARGIN));
        assert!(!pair.needs_refresh(now + Duration::from_secs(29), REFRESH_MARGIN));
    }

    #[test]
    fn test_rejections_become_authentication_errors() {
        let err = as_auth_error(AppError::Transport { status: 401, reason: "bad key".into() });
        assert!(matches!(err, AppError::Authentication(ref msg) if msg.contains("401")));

        let err = as_auth_error(AppError::Decode("at 'refresh': missing field".into()));
        assert!(matches!(err, AppError::Authentication(_)));

        let err = as_auth_error(AppError::Network("timed out".into()));
        assert!(matches!(err, AppError::Network(_)));
    }
}
