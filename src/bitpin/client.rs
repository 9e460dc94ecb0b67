//! Bitpin REST client.
//!
//! Typed operations on top of a small dispatcher: serialize the body, attach
//! a bearer token when the endpoint needs one, send through the shared
//! transport, reject non-success statuses, decode the typed response.

use std::sync::Arc;

use reqwest::Method;
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    bitpin::{
        auth::TokenManager,
        clock::{Clock, SystemClock},
        transport::{decode_json, ApiRequest, Transport},
    },
    config::Config,
    error::{AppError, Result},
    types::{
        CreateOrderRequest, Currency, Fill, Market, Match, Order, OrderSide, Orderbook,
        RefreshResponse, Ticker, TokenResponse, Wallet,
    },
};

/// Async client for the Bitpin REST API.
///
/// Cloning is cheap; clones share the connection pool and the token pair.
#[derive(Debug, Clone)]
pub struct BitpinClient {
    transport: Transport,
    tokens: Arc<TokenManager>,
}

impl BitpinClient {
    /// Create a client from configuration.
    ///
    /// No network calls are made until the first operation.
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a client whose token expiry is driven by `clock`.
    pub fn with_clock(config: &Config, clock: Arc<dyn Clock>) -> Result<Self> {
        let transport = Transport::new(config.api_url.clone(), config.timeout, config.retry)?;
        let tokens = TokenManager::with_clock(transport.clone(), config.credentials.clone(), clock);

        tracing::info!(api_url = %config.api_url, "Bitpin client created (lazy authentication)");

        Ok(Self { transport, tokens: Arc::new(tokens) })
    }

    /// Token manager backing authenticated calls.
    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    // ------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------

    /// Send a bodyless request and decode the response as `T`.
    pub async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        needs_auth: bool,
    ) -> Result<T> {
        let request = ApiRequest::new(method, path).authenticated(needs_auth);
        self.dispatch(request).await
    }

    /// Send `body` as JSON and decode the response as `T`.
    ///
    /// The body is serialized before any network activity.
    pub async fn send_with_body<B, T>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        needs_auth: bool,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = ApiRequest::new(method, path).json(body)?.authenticated(needs_auth);
        self.dispatch(request).await
    }

    /// Send a bodyless request whose response body is ignored.
    pub async fn send_empty(&self, method: Method, path: &str, needs_auth: bool) -> Result<()> {
        let request = ApiRequest::new(method, path).authenticated(needs_auth);
        self.execute(&request).await?;
        Ok(())
    }

    /// Dispatch a prepared request and decode the response as `T`.
    pub async fn dispatch<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let response = self.execute(&request).await?;
        decode_json(response).await
    }

    async fn execute(&self, request: &ApiRequest) -> Result<reqwest::Response> {
        if !request.needs_auth {
            return self.transport.execute(request, None).await;
        }

        let token = self.tokens.ensure_valid_token().await?;
        let result = self.transport.execute(request, Some(token.as_str())).await;

        if matches!(result, Err(AppError::Transport { status: 401, .. })) {
            self.tokens.reject(&token).await;
        }

        result
    }

    async fn list<T: DeserializeOwned>(&self, path: &str, needs_auth: bool) -> Result<Vec<T>> {
        let items: Option<Vec<T>> = self.send(Method::GET, path, needs_auth).await?;
        Ok(items.unwrap_or_default())
    }

    // ------------------------------------------------------------------
    // Market data
    // ------------------------------------------------------------------

    /// List all markets.
    pub async fn list_markets(&self) -> Result<Vec<Market>> {
        self.list("mkt/markets/", false).await
    }

    /// List the latest ticker of every market.
    pub async fn list_tickers(&self) -> Result<Vec<Ticker>> {
        self.list("mkt/tickers/", false).await
    }

    /// List supported currencies.
    pub async fn list_currencies(&self) -> Result<Vec<Currency>> {
        self.list("mkt/currencies/", false).await
    }

    /// Order book for `symbol`.
    pub async fn orderbook(&self, symbol: &str) -> Result<Orderbook> {
        let symbol = validate_symbol(symbol)?;
        self.send(Method::GET, &format!("mth/orderbook/{}/", symbol), false).await
    }

    /// Recent trades for `symbol`.
    pub async fn recent_matches(&self, symbol: &str) -> Result<Vec<Match>> {
        let symbol = validate_symbol(symbol)?;
        self.list(&format!("mth/matches/{}/", symbol), false).await
    }

    // ------------------------------------------------------------------
    // Account
    // ------------------------------------------------------------------

    /// Wallet balances.
    pub async fn list_wallets(&self) -> Result<Vec<Wallet>> {
        self.list("wlt/wallets/", true).await
    }

    /// All orders of the account.
    pub async fn list_orders(&self) -> Result<Vec<Order>> {
        self.list("odr/orders/", true).await
    }

    /// Orders still open on the book.
    pub async fn pending_orders(&self) -> Result<Vec<Order>> {
        self.list("odr/orders/?state=active", true).await
    }

    /// Executed trades of the account.
    pub async fn completed_orders(&self) -> Result<Vec<Fill>> {
        self.list("odr/fills/", true).await
    }

    /// A single order.
    pub async fn order_by_id(&self, order_id: i64) -> Result<Order> {
        self.send(Method::GET, &format!("odr/orders/{}/", order_id), true).await
    }

    /// Cancel an order. Never retried automatically.
    pub async fn cancel_order(&self, order_id: i64) -> Result<()> {
        tracing::info!(order_id, "Cancelling order");
        self.send_empty(Method::DELETE, &format!("odr/orders/{}/", order_id), true).await
    }

    // ------------------------------------------------------------------
    // Order placement (never retried automatically)
    // ------------------------------------------------------------------

    /// Place an order.
    pub async fn create_order(&self, request: &CreateOrderRequest) -> Result<Order> {
        validate_symbol(&request.symbol)?;
        tracing::info!(
            symbol = %request.symbol,
            side = ?request.side,
            order_type = ?request.order_type,
            base_amount = %request.base_amount,
            "Placing order"
        );
        self.send_with_body(Method::POST, "odr/orders/", request, true).await
    }

    /// Place a limit order.
    pub async fn create_limit_order(
        &self,
        symbol: &str,
        side: OrderSide,
        base_amount: Decimal,
        price: Decimal,
    ) -> Result<Order> {
        self.create_order(&CreateOrderRequest::limit(symbol.trim(), side, base_amount, price)).await
    }

    /// Place a market order.
    pub async fn create_market_order(
        &self,
        symbol: &str,
        side: OrderSide,
        base_amount: Decimal,
    ) -> Result<Order> {
        self.create_order(&CreateOrderRequest::market(symbol.trim(), side, base_amount)).await
    }

    /// Place a stop-limit order.
    pub async fn create_stop_limit_order(
        &self,
        symbol: &str,
        side: OrderSide,
        base_amount: Decimal,
        stop_price: Decimal,
        price: Decimal,
    ) -> Result<Order> {
        self.create_order(&CreateOrderRequest::stop_limit(
            symbol.trim(),
            side,
            base_amount,
            stop_price,
            price,
        ))
        .await
    }

    /// Place an OCO order.
    pub async fn create_oco_order(
        &self,
        symbol: &str,
        side: OrderSide,
        base_amount: Decimal,
        oco_target_price: Decimal,
        stop_price: Decimal,
        price: Decimal,
    ) -> Result<Order> {
        self.create_order(&CreateOrderRequest::oco(
            symbol.trim(),
            side,
            base_amount,
            oco_target_price,
            stop_price,
            price,
        ))
        .await
    }

    // ------------------------------------------------------------------
    // Tokens
    // ------------------------------------------------------------------

    /// Force a full authenticate exchange.
    pub async fn authenticate(&self) -> Result<TokenResponse> {
        self.tokens.authenticate().await
    }

    /// Force a refresh exchange.
    pub async fn refresh_token(&self) -> Result<RefreshResponse> {
        self.tokens.refresh().await
    }
}

/// Trim a market symbol and reject values that cannot form a path segment.
pub fn validate_symbol(symbol: &str) -> Result<&str> {
    let symbol = symbol.trim();

    if symbol.is_empty() {
        return Err(AppError::InvalidInput("Symbol cannot be empty".into()));
    }

    if !symbol.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return Err(AppError::InvalidInput(format!(
            "Invalid symbol '{}': only letters, digits, '_' and '-' are allowed",
            symbol
        )));
    }

    Ok(symbol)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_symbol() {
        assert_eq!(validate_symbol(" BTC_IRT ").unwrap(), "BTC_IRT");
        assert!(validate_symbol("").is_err());
        assert!(validate_symbol("   ").is_err());
        assert!(validate_symbol("../usr").is_err());
        assert!(validate_symbol("BTC/IRT").is_err());
    }
}
