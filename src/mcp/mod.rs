//! MCP server module.
//!
//! Contains the MCP server implementation with tool handlers and the HTTP host.

pub mod http;
pub mod server;

pub use server::BitpinServer;
pub use server::{
    CreateLimitOrderInput, CreateMarketOrderInput, CreateOcoOrderInput, CreateStopLimitOrderInput,
    OrderIdInput, SymbolInput,
};
