//! MCP server implementation.

use std::str::FromStr;

use rmcp::{
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{Implementation, ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler,
};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    bitpin::BitpinClient,
    config::Config,
    error::AppError,
    types::{CreateOrderRequest, OrderSide},
};

/// Bitpin Exchange MCP Server.
///
/// Exposes market data, wallet, and order operations as tools.
#[derive(Clone)]
pub struct BitpinServer {
    client: BitpinClient,
    tool_router: ToolRouter<Self>,
}

impl BitpinServer {
    /// Create a new Bitpin MCP Server.
    ///
    /// Authentication is lazy: the first tool that needs a token obtains one.
    pub fn new(config: Config) -> Result<Self, AppError> {
        tracing::info!("Initializing Bitpin MCP Server");

        let client = BitpinClient::new(&config)?;

        Ok(Self::with_client(client))
    }

    /// Wrap an existing client.
    pub fn with_client(client: BitpinClient) -> Self {
        Self { client, tool_router: Self::tool_router() }
    }
}

/// Input parameters for tools that take a market symbol.
#[derive(Debug, Clone, serde::Deserialize, schemars::JsonSchema)]
pub struct SymbolInput {
    /// The trading pair symbol (e.g., "USDT_IRT" for Tether to Iranian Rial).
    pub symbol: String,
}

/// Input parameters for tools that take an order id.
#[derive(Debug, Clone, serde::Deserialize, schemars::JsonSchema)]
pub struct OrderIdInput {
    /// The unique identifier of the order.
    pub order_id: i64,
}

/// Input parameters for the create_limit_order tool.
#[derive(Debug, Clone, serde::Deserialize, schemars::JsonSchema)]
pub struct CreateLimitOrderInput {
    /// The trading pair symbol (e.g., "USDT_IRT").
    pub symbol: String,
    /// The order side: "buy" or "sell".
    pub side: String,
    /// Amount of the base currency to buy or sell, as a decimal string (e.g., "1.5").
    pub base_amount: String,
    /// Limit price as a decimal string.
    pub price: String,
    /// Optional client identifier echoed back on the order.
    #[serde(default)]
    pub identifier: Option<String>,
}

/// Input parameters for the create_market_order tool.
#[derive(Debug, Clone, serde::Deserialize, schemars::JsonSchema)]
pub struct CreateMarketOrderInput {
    /// The trading pair symbol (e.g., "USDT_IRT").
    pub symbol: String,
    /// The order side: "buy" or "sell".
    pub side: String,
    /// Amount of the base currency to buy or sell, as a decimal string.
    pub base_amount: String,
    /// Optional client identifier echoed back on the order.
    #[serde(default)]
    pub identifier: Option<String>,
}

/// Input parameters for the create_stop_limit_order tool.
#[derive(Debug, Clone, serde::Deserialize, schemars::JsonSchema)]
pub struct CreateStopLimitOrderInput {
    /// The trading pair symbol (e.g., "USDT_IRT").
    pub symbol: String,
    /// The order side: "buy" or "sell".
    pub side: String,
    /// Amount of the base currency to buy or sell, as a decimal string.
    pub base_amount: String,
    /// Price that triggers the limit order, as a decimal string.
    pub stop_price: String,
    /// Price the triggered limit order executes at, as a decimal string.
    pub price: String,
    /// Optional client identifier echoed back on the order.
    #[serde(default)]
    pub identifier: Option<String>,
}

/// Input parameters for the create_oco_order tool.
#[derive(Debug, Clone, serde::Deserialize, schemars::JsonSchema)]
pub struct CreateOcoOrderInput {
    /// The trading pair symbol (e.g., "BTC_USDT").
    pub symbol: String,
    /// The order side: "buy" or "sell".
    pub side: String,
    /// Amount of the base currency to buy or sell, as a decimal string.
    pub base_amount: String,
    /// Target price of the limit leg, as a decimal string.
    pub oco_target_price: String,
    /// Price that triggers the stop-limit leg, as a decimal string.
    pub stop_price: String,
    /// Price the stop-limit leg executes at, as a decimal string.
    pub price: String,
    /// Optional client identifier echoed back on the order.
    #[serde(default)]
    pub identifier: Option<String>,
}

/// Parse a strictly positive decimal argument.
fn parse_positive_decimal(field: &str, value: &str) -> Result<Decimal, McpError> {
    let parsed = Decimal::from_str(value.trim()).map_err(|e| {
        McpError::invalid_params(format!("Invalid {} '{}': {}", field, value, e), None)
    })?;

    if parsed <= Decimal::ZERO {
        return Err(McpError::invalid_params(format!("{} must be greater than zero", field), None));
    }

    Ok(parsed)
}

fn parse_side(value: &str) -> Result<OrderSide, McpError> {
    value.parse::<OrderSide>().map_err(|e| McpError::invalid_params(e, None))
}

fn parse_identifier(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn to_json<T: Serialize>(value: &T) -> Result<String, McpError> {
    serde_json::to_string_pretty(value).map_err(|e| McpError::internal_error(e.to_string(), None))
}

#[tool_router]
impl BitpinServer {
    /// List every trading market on Bitpin.
    #[tool(
        description = "Retrieve the full list of trading markets supported on Bitpin, including the market symbol, name, base currency, quote currency and precisions."
    )]
    pub async fn get_markets(&self) -> Result<String, McpError> {
        tracing::info!("get_markets called");
        let markets = self.client.list_markets().await?;
        to_json(&markets)
    }

    /// Latest prices for every market.
    #[tool(description = "Retrieve the current price list (tickers) of Bitpin's markets.")]
    pub async fn get_tickers(&self) -> Result<String, McpError> {
        tracing::info!("get_tickers called");
        let tickers = self.client.list_tickers().await?;
        to_json(&tickers)
    }

    /// Supported currencies.
    #[tool(
        description = "Retrieve the list of cryptocurrencies supported on Bitpin with their name, tradability and precision."
    )]
    pub async fn get_currencies(&self) -> Result<String, McpError> {
        tracing::info!("get_currencies called");
        let currencies = self.client.list_currencies().await?;
        to_json(&currencies)
    }

    /// Order book for a market.
    #[tool(
        description = "View open orders (asks and bids as [price, amount] pairs) in one of Bitpin's markets."
    )]
    pub async fn get_orderbook(
        &self,
        Parameters(input): Parameters<SymbolInput>,
    ) -> Result<String, McpError> {
        tracing::info!(symbol = %input.symbol, "get_orderbook called");
        let book = self.client.orderbook(&input.symbol).await?;
        to_json(&book)
    }

    /// Recent trades for a market.
    #[tool(
        description = "Retrieve the latest trades executed in a market, with price, traded volume and side."
    )]
    pub async fn get_matches(
        &self,
        Parameters(input): Parameters<SymbolInput>,
    ) -> Result<String, McpError> {
        tracing::info!(symbol = %input.symbol, "get_matches called");
        let matches = self.client.recent_matches(&input.symbol).await?;
        to_json(&matches)
    }

    /// Wallet balances of the account.
    #[tool(
        description = "Retrieve the balance of your Bitpin wallets across different cryptocurrencies, including frozen amounts."
    )]
    pub async fn get_wallets(&self) -> Result<String, McpError> {
        tracing::info!("get_wallets called");
        let wallets = self.client.list_wallets().await?;
        to_json(&wallets)
    }

    /// All orders of the account.
    #[tool(description = "Retrieve and review your list of orders.")]
    pub async fn get_orders(&self) -> Result<String, McpError> {
        tracing::info!("get_orders called");
        let orders = self.client.list_orders().await?;
        to_json(&orders)
    }

    /// Open orders of the account.
    #[tool(description = "Retrieve your orders that are still active on the order book.")]
    pub async fn get_pending_orders(&self) -> Result<String, McpError> {
        tracing::info!("get_pending_orders called");
        let orders = self.client.pending_orders().await?;
        to_json(&orders)
    }

    /// Trade history of the account.
    #[tool(
        description = "View the details of your executed trades: amount, price, fee and fee currency."
    )]
    pub async fn get_completed_orders(&self) -> Result<String, McpError> {
        tracing::info!("get_completed_orders called");
        let fills = self.client.completed_orders().await?;
        to_json(&fills)
    }

    /// One order by id.
    #[tool(description = "View a specific order by its order ID.")]
    pub async fn get_order_by_id(
        &self,
        Parameters(input): Parameters<OrderIdInput>,
    ) -> Result<String, McpError> {
        tracing::info!(order_id = input.order_id, "get_order_by_id called");
        let order = self.client.order_by_id(input.order_id).await?;
        to_json(&order)
    }

    /// Cancel an order by id.
    #[tool(description = "Cancel a specific order using its order ID.")]
    pub async fn cancel_order(
        &self,
        Parameters(input): Parameters<OrderIdInput>,
    ) -> Result<String, McpError> {
        tracing::info!(order_id = input.order_id, "cancel_order called");
        self.client.cancel_order(input.order_id).await?;
        to_json(&serde_json::json!({ "order_id": input.order_id, "canceled": true }))
    }

    /// Place a limit order.
    #[tool(
        description = "Place a limit order: buy or sell at a specific price you set. The order only executes when the market reaches your price. Amounts and prices are decimal strings."
    )]
    pub async fn create_limit_order(
        &self,
        Parameters(input): Parameters<CreateLimitOrderInput>,
    ) -> Result<String, McpError> {
        tracing::info!(
            symbol = %input.symbol,
            side = %input.side,
            base_amount = %input.base_amount,
            price = %input.price,
            "create_limit_order called"
        );

        let side = parse_side(&input.side)?;
        let base_amount = parse_positive_decimal("base_amount", &input.base_amount)?;
        let price = parse_positive_decimal("price", &input.price)?;

        let mut request = CreateOrderRequest::limit(input.symbol.trim(), side, base_amount, price);
        request.identifier = parse_identifier(input.identifier);

        let order = self.client.create_order(&request).await?;
        to_json(&order)
    }

    /// Place a market order.
    #[tool(
        description = "Place a market order: buy or sell immediately at the best available price. No price is required."
    )]
    pub async fn create_market_order(
        &self,
        Parameters(input): Parameters<CreateMarketOrderInput>,
    ) -> Result<String, McpError> {
        tracing::info!(
            symbol = %input.symbol,
            side = %input.side,
            base_amount = %input.base_amount,
            "create_market_order called"
        );

        let side = parse_side(&input.side)?;
        let base_amount = parse_positive_decimal("base_amount", &input.base_amount)?;

        let mut request = CreateOrderRequest::market(input.symbol.trim(), side, base_amount);
        request.identifier = parse_identifier(input.identifier);

        let order = self.client.create_order(&request).await?;
        to_json(&order)
    }

    /// Place a stop-limit order.
    #[tool(
        description = "Place a stop-limit order: once the market reaches the stop price, a limit order at the given price is placed. Useful to limit losses or capture breakouts."
    )]
    pub async fn create_stop_limit_order(
        &self,
        Parameters(input): Parameters<CreateStopLimitOrderInput>,
    ) -> Result<String, McpError> {
        tracing::info!(
            symbol = %input.symbol,
            side = %input.side,
            base_amount = %input.base_amount,
            stop_price = %input.stop_price,
            price = %input.price,
            "create_stop_limit_order called"
        );

        let side = parse_side(&input.side)?;
        let base_amount = parse_positive_decimal("base_amount", &input.base_amount)?;
        let stop_price = parse_positive_decimal("stop_price", &input.stop_price)?;
        let price = parse_positive_decimal("price", &input.price)?;

        let mut request = CreateOrderRequest::stop_limit(
            input.symbol.trim(),
            side,
            base_amount,
            stop_price,
            price,
        );
        request.identifier = parse_identifier(input.identifier);

        let order = self.client.create_order(&request).await?;
        to_json(&order)
    }

    /// Place an OCO order.
    #[tool(
        description = "Place an OCO (one-cancels-the-other) order: a limit leg at the target price and a stop-limit leg; when one executes the other is canceled."
    )]
    pub async fn create_oco_order(
        &self,
        Parameters(input): Parameters<CreateOcoOrderInput>,
    ) -> Result<String, McpError> {
        tracing::info!(
            symbol = %input.symbol,
            side = %input.side,
            base_amount = %input.base_amount,
            oco_target_price = %input.oco_target_price,
            stop_price = %input.stop_price,
            price = %input.price,
            "create_oco_order called"
        );

        let side = parse_side(&input.side)?;
        let base_amount = parse_positive_decimal("base_amount", &input.base_amount)?;
        let oco_target_price = parse_positive_decimal("oco_target_price", &input.oco_target_price)?;
        let stop_price = parse_positive_decimal("stop_price", &input.stop_price)?;
        let price = parse_positive_decimal("price", &input.price)?;

        let mut request = CreateOrderRequest::oco(
            input.symbol.trim(),
            side,
            base_amount,
            oco_target_price,
            stop_price,
            price,
        );
        request.identifier = parse_identifier(input.identifier);

        let order = self.client.create_order(&request).await?;
        to_json(&order)
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for BitpinServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "bitpin-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Bitpin Exchange MCP Server. Provides tools for market data (markets, tickers, \
                 currencies, order books, trades), wallet balances, and order management \
                 (list, inspect, cancel, and place limit, market, stop-limit and OCO orders). \
                 Amounts and prices are decimal strings. Order placement and cancellation are \
                 sent exactly once and never retried automatically."
                    .to_string(),
            ),
        }
    }
}
