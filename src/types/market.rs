//! Public market data types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::OrderSide;

/// A tradable market (trading pair).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Market {
    /// Market symbol (e.g., "BTC_IRT").
    pub symbol: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Base currency code.
    pub base: String,
    /// Quote currency code.
    pub quote: String,
    /// Whether the market currently accepts orders.
    #[serde(default)]
    pub tradable: bool,
    /// Decimal places allowed for prices.
    #[serde(default)]
    pub price_precision: u32,
    /// Decimal places allowed for base amounts.
    #[serde(default)]
    pub base_amount_precision: u32,
    /// Decimal places allowed for quote amounts.
    #[serde(default)]
    pub quote_amount_precision: u32,
}

/// Latest price summary for a market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    /// Market symbol.
    pub symbol: String,
    /// Last traded price.
    pub price: Decimal,
    /// Price change over the last 24 hours.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_change_price: Option<Decimal>,
    /// 24 hour low.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<Decimal>,
    /// 24 hour high.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<Decimal>,
    /// Unix timestamp of the snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
}

/// A currency listed on the exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    /// Currency code (e.g., "BTC").
    pub currency: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Whether the currency can be traded.
    #[serde(default)]
    pub tradable: bool,
    /// Amount precision as reported upstream (e.g., "0.00000001").
    #[serde(default)]
    pub precision: String,
}

/// One order book level, sent upstream as `[price, amount]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel(pub Decimal, pub Decimal);

impl PriceLevel {
    /// Level price.
    pub fn price(&self) -> Decimal {
        self.0
    }

    /// Amount resting at this price.
    pub fn amount(&self) -> Decimal {
        self.1
    }
}

/// Open buy and sell interest for a market.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Orderbook {
    /// Sell side, best first.
    #[serde(default)]
    pub asks: Vec<PriceLevel>,
    /// Buy side, best first.
    #[serde(default)]
    pub bids: Vec<PriceLevel>,
}

/// A recently executed trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    /// Trade identifier.
    pub id: String,
    /// Execution price.
    pub price: Decimal,
    /// Traded base amount.
    pub base_amount: Decimal,
    /// Traded quote amount.
    pub quote_amount: Decimal,
    /// Taker side.
    pub side: OrderSide,
    /// Unix timestamp of the trade.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
}
