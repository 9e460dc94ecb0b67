//! Bitpin exchange interaction module.
//!
//! Contains the REST client, the token manager, and the shared transport.

pub mod auth;
pub mod client;
pub mod clock;
pub mod retry;
pub mod transport;

pub use auth::TokenManager;
pub use client::BitpinClient;
pub use clock::{Clock, ManualClock, SystemClock};
pub use retry::RetryPolicy;
pub use transport::{ApiRequest, Transport};
