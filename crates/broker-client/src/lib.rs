// In crates/broker-client/src/lib.rs

use app_config::types::BrokerSettings;
use core_types::{OrderSide, Symbol};
use reqwest::Method;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;

pub mod error;
pub mod types;

// Re-export public types
pub use error::{Error, Result};
pub use types::*;

/// Maximum attempts for a single logical request. Only transport-level
/// failures and 5xx responses are retried; broker-reported errors are not.
const MAX_ATTEMPTS: u32 = 3;

impl BrokerClient {
    /// Constructs a new client from broker settings and an optional per-user token.
    pub fn new(settings: &BrokerSettings, access_token: Option<String>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|e| Error::ClientBuildError(e.to_string()))?;

        Ok(BrokerClient {
            http_client,
            access_token,
            base_url: settings.base_url.clone(),
        })
    }

    /// Sends a request with bounded exponential-backoff retry.
    ///
    /// Transport errors and 5xx responses are retried up to [`MAX_ATTEMPTS`]
    /// with 1s/2s waits. API-level errors (a non-200 `code` in the response
    /// envelope) are returned immediately.
    async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
        query: Option<&[(&str, String)]>,
    ) -> Result<Value> {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            let mut request = self.http_client.request(method.clone(), &url);
            if let Some(token) = &self.access_token {
                request = request.bearer_auth(token);
            }
            if let Some(body) = body {
                request = request.json(body);
            }
            if let Some(query) = query {
                request = request.query(query);
            }

            let response = match request.send().await {
                Ok(response) => response,
                Err(e) if attempt < MAX_ATTEMPTS => {
                    tracing::warn!(attempt, error = %e, url = %url, "Broker request failed, retrying");
                    tokio::time::sleep(backoff_delay(attempt)).await;
                    continue;
                }
                Err(e) => return Err(Error::RequestFailed(e)),
            };

            let status = response.status();
            if status.is_server_error() && attempt < MAX_ATTEMPTS {
                tracing::warn!(attempt, status = status.as_u16(), url = %url, "Broker returned server error, retrying");
                tokio::time::sleep(backoff_delay(attempt)).await;
                continue;
            }

            let text = response.text().await.map_err(Error::RequestFailed)?;
            let value: Value = serde_json::from_str(&text).map_err(Error::DeserializationFailed)?;

            check_envelope(&value)?;

            if !status.is_success() {
                return Err(Error::HttpStatus {
                    status: status.as_u16(),
                });
            }

            return Ok(value);
        }
    }

    /// Fetches the available funds for the authenticated user.
    pub async fn get_funds(&self) -> Result<FundsInfo> {
        let value = self.request(Method::GET, "/funds", None, None).await?;
        let data = value
            .get("data")
            .cloned()
            .ok_or_else(|| Error::MissingData("funds".to_string()))?;
        let funds: FundsInfo = serde_json::from_value(data).map_err(Error::DeserializationFailed)?;
        Ok(funds)
    }

    /// Fetches the last traded price for a symbol.
    ///
    /// Returns `None` when the quote cannot be resolved; callers must treat
    /// a missing price as "do not trade".
    pub async fn get_current_price(&self, symbol: &Symbol) -> Option<Decimal> {
        let query = [("symbols", symbol.0.clone())];
        match self
            .request(Method::GET, "/quotes", None, Some(&query))
            .await
        {
            Ok(value) => extract_last_price(&value, symbol),
            Err(e) => {
                tracing::error!(symbol = %symbol, error = %e, "Failed to fetch current price");
                None
            }
        }
    }

    /// Checks whether the market is currently open.
    pub async fn is_market_open(&self) -> Result<bool> {
        let value = self.request(Method::GET, "/market-status", None, None).await?;
        Ok(value
            .get("data")
            .and_then(|d| d.get("is_open"))
            .and_then(Value::as_bool)
            .unwrap_or(false))
    }

    /// Places a market order.
    pub async fn place_market_order(
        &self,
        symbol: &Symbol,
        side: OrderSide,
        quantity: i64,
    ) -> Result<OrderResponse> {
        let order = json!({
            "symbol": symbol.0,
            "qty": quantity,
            "type": 1, // Market order
            "side": side_code(side),
            "productType": "INTRADAY",
            "limitPrice": 0,
            "stopPrice": 0,
            "validity": "DAY",
            "disclosedQty": 0,
            "offlineOrder": "False",
        });

        let value = self
            .request(Method::POST, "/orders", Some(&order), None)
            .await?;
        parse_order_response(&value)
    }

    /// Places a limit order at the given price.
    pub async fn place_limit_order(
        &self,
        symbol: &Symbol,
        side: OrderSide,
        quantity: i64,
        price: Decimal,
    ) -> Result<OrderResponse> {
        let order = json!({
            "symbol": symbol.0,
            "qty": quantity,
            "type": 2, // Limit order
            "side": side_code(side),
            "productType": "INTRADAY",
            "limitPrice": price,
            "stopPrice": 0,
            "validity": "DAY",
            "disclosedQty": 0,
            "offlineOrder": "False",
        });

        let value = self
            .request(Method::POST, "/orders", Some(&order), None)
            .await?;
        parse_order_response(&value)
    }

    /// Queries the authoritative status of a previously placed order.
    pub async fn get_order_status(&self, order_id: &str) -> Result<OrderStatus> {
        let endpoint = format!("/orders/{order_id}");
        let value = self.request(Method::GET, &endpoint, None, None).await?;
        let data = value
            .get("data")
            .cloned()
            .ok_or_else(|| Error::MissingData(format!("order {order_id}")))?;

        let raw: RawOrderStatus =
            serde_json::from_value(data).map_err(Error::DeserializationFailed)?;
        Ok(OrderStatus {
            status: raw.status.unwrap_or_default(),
            filled_quantity: raw.filled_qty,
            average_price: raw.avg_price.and_then(Decimal::from_f64),
        })
    }

    /// Cancels an open order.
    pub async fn cancel_order(&self, order_id: &str) -> Result<()> {
        let endpoint = format!("/orders/{order_id}");
        self.request(Method::DELETE, &endpoint, None, None).await?;
        Ok(())
    }
}

/// The broker's wire representation of an order-status record.
#[derive(Debug, Deserialize)]
struct RawOrderStatus {
    #[serde(default)]
    status: Option<String>,
    #[serde(default, rename = "filledQty")]
    filled_qty: Option<i64>,
    #[serde(default, rename = "avgPrice")]
    avg_price: Option<f64>,
}

fn side_code(side: OrderSide) -> i64 {
    match side {
        OrderSide::Buy => 1,
        OrderSide::Sell => -1,
    }
}

fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(1 << (attempt - 1))
}

/// Rejects responses whose envelope carries a broker error code.
fn check_envelope(value: &Value) -> Result<()> {
    if let Some(code) = value.get("code").and_then(Value::as_i64) {
        if code != 200 {
            let msg = value
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Unknown error")
                .to_string();
            return Err(Error::ApiError { code, msg });
        }
    }
    Ok(())
}

/// Pulls the last traded price out of a quotes response.
fn extract_last_price(value: &Value, symbol: &Symbol) -> Option<Decimal> {
    value
        .get("data")
        .and_then(|d| d.get(&symbol.0))
        .and_then(|q| q.get("v"))
        .and_then(|v| v.get("lp"))
        .and_then(Value::as_f64)
        .and_then(Decimal::from_f64)
}

/// Extracts the order acknowledgement from a placement response.
fn parse_order_response(value: &Value) -> Result<OrderResponse> {
    let data = value
        .get("data")
        .ok_or_else(|| Error::MissingData("order placement".to_string()))?;

    let order_id = match data.get("id") {
        Some(Value::String(id)) => Some(id.clone()),
        Some(Value::Number(id)) => Some(id.to_string()),
        _ => None,
    };

    Ok(OrderResponse {
        order_id,
        status: data
            .get("status")
            .and_then(Value::as_str)
            .map(str::to_string),
        message: value
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn envelope_accepts_code_200() {
        let value = json!({"code": 200, "message": "", "data": {}});
        assert!(check_envelope(&value).is_ok());
    }

    #[test]
    fn envelope_rejects_error_code() {
        let value = json!({"code": -50, "message": "Invalid order id"});
        match check_envelope(&value) {
            Err(Error::ApiError { code, msg }) => {
                assert_eq!(code, -50);
                assert_eq!(msg, "Invalid order id");
            }
            other => panic!("expected ApiError, got {other:?}"),
        }
    }

    #[test]
    fn envelope_ignores_missing_code() {
        let value = json!({"data": {"id": "1"}});
        assert!(check_envelope(&value).is_ok());
    }

    #[test]
    fn parses_order_response_with_numeric_id() {
        let value = json!({"code": 200, "message": "ok", "data": {"id": 8102710298291i64, "status": "submitted"}});
        let response = parse_order_response(&value).unwrap();
        assert_eq!(response.order_id.as_deref(), Some("8102710298291"));
        assert_eq!(response.status.as_deref(), Some("submitted"));
        assert_eq!(response.message.as_deref(), Some("ok"));
    }

    #[test]
    fn order_placement_without_data_is_an_error() {
        let value = json!({"code": 200, "message": "ok"});
        assert!(matches!(
            parse_order_response(&value),
            Err(Error::MissingData(_))
        ));
    }

    #[test]
    fn extracts_last_price_from_quote_payload() {
        let symbol = Symbol("NSE:RELIANCE-EQ".to_string());
        let value = json!({"data": {"NSE:RELIANCE-EQ": {"v": {"lp": 2501.25}}}});
        assert_eq!(
            extract_last_price(&value, &symbol),
            Some(Decimal::from_f64(2501.25).unwrap())
        );
    }

    #[test]
    fn missing_quote_yields_no_price() {
        let symbol = Symbol("NSE:RELIANCE-EQ".to_string());
        let value = json!({"data": {}});
        assert_eq!(extract_last_price(&value, &symbol), None);
    }

    #[test]
    fn order_status_deserializes_broker_field_names() {
        let raw: RawOrderStatus =
            serde_json::from_value(json!({"status": "filled", "filledQty": 10, "avgPrice": 2501.25}))
                .unwrap();
        assert_eq!(raw.status.as_deref(), Some("filled"));
        assert_eq!(raw.filled_qty, Some(10));
        assert_eq!(raw.avg_price, Some(2501.25));
    }
}
