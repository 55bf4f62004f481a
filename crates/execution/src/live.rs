// In crates/execution/src/live.rs

use async_trait::async_trait;
use broker_client::BrokerClient;
use core_types::{OrderTicket, OrderType};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::Submission;
use crate::Executor;

/// Routes orders to the broker API using the owning user's credentials.
#[derive(Clone)]
pub struct LiveExecutor {
    client: Arc<BrokerClient>,
}

impl LiveExecutor {
    pub fn new(client: Arc<BrokerClient>) -> Self {
        LiveExecutor { client }
    }
}

#[async_trait]
impl Executor for LiveExecutor {
    fn name(&self) -> &'static str {
        "live"
    }

    async fn submit(&self, order: &OrderTicket) -> Result<Submission> {
        let response = match order.order_type {
            OrderType::Market => {
                self.client
                    .place_market_order(&order.symbol, order.side, order.quantity)
                    .await?
            }
            OrderType::Limit => {
                let price = order.price.ok_or_else(|| Error::ExecutionFailed {
                    reason: "Limit order has no limit price".to_string(),
                })?;
                self.client
                    .place_limit_order(&order.symbol, order.side, order.quantity, price)
                    .await?
            }
            other => {
                return Err(Error::ExecutionFailed {
                    reason: format!("Unsupported order type: {other}"),
                });
            }
        };

        tracing::info!(
            symbol = %order.symbol,
            side = %order.side,
            quantity = order.quantity,
            order_id = ?response.order_id,
            "Live order submitted to broker"
        );

        Ok(Submission::Accepted {
            order_id: response.order_id,
            status: response.status,
            message: response.message,
        })
    }
}
