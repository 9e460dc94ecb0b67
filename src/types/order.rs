//! Order and trade history types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    /// Buy the base currency.
    Buy,
    /// Sell the base currency.
    Sell,
}

impl std::str::FromStr for OrderSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "buy" => Ok(OrderSide::Buy),
            "sell" => Ok(OrderSide::Sell),
            _ => Err(format!("Invalid order side: '{}'. Expected 'buy' or 'sell'", s)),
        }
    }
}

/// Order type tag as sent on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    /// Rest on the book at a fixed price.
    Limit,
    /// Fill immediately at the best available price.
    Market,
    /// Place a limit order once the stop price is reached.
    StopLimit,
    /// One-cancels-the-other: a limit and a stop-limit leg.
    Oco,
}

/// Body of `POST odr/orders/`.
///
/// Built only through the typed constructors so each order type carries the
/// fields it needs. Decimals are serialized as strings with the caller's
/// exact scale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateOrderRequest {
    /// Market symbol.
    pub symbol: String,
    /// Order type tag.
    #[serde(rename = "type")]
    pub order_type: OrderType,
    /// Order side.
    pub side: OrderSide,
    /// Base currency amount.
    pub base_amount: Decimal,
    /// Limit price.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    /// Trigger price for stop-limit and OCO orders.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_price: Option<Decimal>,
    /// Take-profit price of the OCO limit leg.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oco_target_price: Option<Decimal>,
    /// Client-chosen identifier echoed back on the order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
}

impl CreateOrderRequest {
    fn base(
        symbol: impl Into<String>,
        order_type: OrderType,
        side: OrderSide,
        base_amount: Decimal,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            order_type,
            side,
            base_amount,
            price: None,
            stop_price: None,
            oco_target_price: None,
            identifier: None,
        }
    }

    /// A limit order at `price`.
    pub fn limit(
        symbol: impl Into<String>,
        side: OrderSide,
        base_amount: Decimal,
        price: Decimal,
    ) -> Self {
        Self { price: Some(price), ..Self::base(symbol, OrderType::Limit, side, base_amount) }
    }

    /// A market order.
    pub fn market(symbol: impl Into<String>, side: OrderSide, base_amount: Decimal) -> Self {
        Self::base(symbol, OrderType::Market, side, base_amount)
    }

    /// A stop-limit order: once `stop_price` trades, a limit order at `price` is placed.
    pub fn stop_limit(
        symbol: impl Into<String>,
        side: OrderSide,
        base_amount: Decimal,
        stop_price: Decimal,
        price: Decimal,
    ) -> Self {
        Self {
            price: Some(price),
            stop_price: Some(stop_price),
            ..Self::base(symbol, OrderType::StopLimit, side, base_amount)
        }
    }

    /// An OCO order: a limit leg at `oco_target_price` and a stop-limit leg
    /// triggered at `stop_price` executing at `price`.
    pub fn oco(
        symbol: impl Into<String>,
        side: OrderSide,
        base_amount: Decimal,
        oco_target_price: Decimal,
        stop_price: Decimal,
        price: Decimal,
    ) -> Self {
        Self {
            price: Some(price),
            stop_price: Some(stop_price),
            oco_target_price: Some(oco_target_price),
            ..Self::base(symbol, OrderType::Oco, side, base_amount)
        }
    }

    /// Attach a client identifier.
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }
}

/// An order as reported by the exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Order id.
    pub id: i64,
    /// Market symbol.
    pub symbol: String,
    /// Order type.
    #[serde(rename = "type")]
    pub order_type: OrderType,
    /// Order side.
    pub side: OrderSide,
    /// Requested base amount.
    pub base_amount: Decimal,
    /// Requested quote amount.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_amount: Option<Decimal>,
    /// Limit price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    /// Stop trigger price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_price: Option<Decimal>,
    /// OCO target price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oco_target_price: Option<Decimal>,
    /// Client identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    /// Lifecycle state (e.g., "initial", "active", "closed", "canceled").
    pub state: String,
    /// Creation time (ISO 8601).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Close time (ISO 8601).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<String>,
    /// Base amount filled so far.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dealed_base_amount: Option<Decimal>,
    /// Quote amount filled so far.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dealed_quote_amount: Option<Decimal>,
    /// Whether a cancel has been requested.
    #[serde(default)]
    pub req_to_cancel: bool,
    /// Commission charged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commission: Option<Decimal>,
}

/// An executed trade from the account's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    /// Fill id.
    pub id: i64,
    /// Market symbol.
    pub symbol: String,
    /// Filled base amount.
    pub base_amount: Decimal,
    /// Filled quote amount.
    pub quote_amount: Decimal,
    /// Execution price.
    pub price: Decimal,
    /// Execution time (ISO 8601).
    pub created_at: String,
    /// Commission charged.
    pub commission: Decimal,
    /// Side of the owning order.
    pub side: OrderSide,
    /// Currency the commission was charged in.
    pub commission_currency: String,
    /// Owning order id.
    pub order_id: i64,
    /// Client identifier of the owning order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
}
