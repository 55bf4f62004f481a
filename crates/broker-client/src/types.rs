// In crates/broker-client/src/types.rs

use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

/// The main client for interacting with the broker's REST API.
///
/// One instance exists per authenticated user; it is cheap to clone and safe
/// to share across concurrent tasks.
#[derive(Debug, Clone)]
pub struct BrokerClient {
    /// The persistent HTTP client.
    pub(crate) http_client: Client,
    /// The per-user bearer token; requests without one are unauthenticated.
    pub(crate) access_token: Option<String>,
    /// The base URL for the broker API.
    pub(crate) base_url: String,
}

/// Available funds as reported by the broker.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct FundsInfo {
    /// The total fund limit available for new positions.
    #[serde(default)]
    pub fund_limit: Decimal,
}

/// The broker's acknowledgement of a newly placed order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderResponse {
    /// The broker-assigned order id, when provided.
    pub order_id: Option<String>,
    /// The raw broker status string for the new order.
    pub status: Option<String>,
    /// The human-readable broker message.
    pub message: Option<String>,
}

/// The authoritative state of a previously placed order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderStatus {
    /// The raw broker status string (e.g., "filled", "cancelled").
    pub status: String,
    /// Shares filled so far, when reported.
    pub filled_quantity: Option<i64>,
    /// Average fill price, when reported.
    pub average_price: Option<Decimal>,
}
