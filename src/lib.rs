//! Bitpin MCP Server Library
//!
//! A Model Context Protocol server for the Bitpin cryptocurrency exchange.
//! Provides tools for market data, wallet balances, and order management.
//!
//! # Features
//!
//! - **Market Data**: Markets, tickers, currencies, order books and recent trades
//! - **Account**: Wallet balances, orders and executed trades
//! - **Trading**: Limit, market, stop-limit and OCO orders, cancellation
//!
//! Authenticated calls share one bearer token that is obtained lazily and
//! refreshed shortly before it expires. The server runs over stdio or, with
//! `MCP_TRANSPORT=http`, as a streamable HTTP endpoint.
//!
//! # Example
//!
//! ```rust,ignore
//! use bitpin_mcp::{BitpinClient, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let client = BitpinClient::new(&config)?;
//!     let wallets = client.list_wallets().await?;
//!     println!("{:?}", wallets);
//!     Ok(())
//! }
//! ```

pub mod bitpin;
pub mod config;
pub mod error;
pub mod mcp;
pub mod types;

pub use bitpin::{BitpinClient, TokenManager};
pub use config::Config;
pub use error::{AppError, Result};
pub use mcp::BitpinServer;
