//! Type definitions module.
//!
//! Wire types for the Bitpin REST API.

pub mod account;
pub mod market;
pub mod order;

pub use account::*;
pub use market::*;
pub use order::*;
