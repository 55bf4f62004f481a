// In crates/execution/src/paper.rs

use async_trait::async_trait;
use core_types::OrderTicket;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::{PaperSettings, Submission};
use crate::Executor;

/// Simulated executor: every order fills instantly at its reference price.
///
/// The caller must have resolved a market price onto the ticket before
/// submission; a ticket without one cannot be filled.
#[derive(Debug, Clone)]
pub struct PaperExecutor {
    settings: PaperSettings,
}

impl PaperExecutor {
    pub fn new(settings: PaperSettings) -> Self {
        PaperExecutor { settings }
    }
}

#[async_trait]
impl Executor for PaperExecutor {
    fn name(&self) -> &'static str {
        "paper"
    }

    async fn submit(&self, order: &OrderTicket) -> Result<Submission> {
        let price = order.price.ok_or_else(|| Error::ExecutionFailed {
            reason: "Paper order has no reference price".to_string(),
        })?;

        // Simulated broker latency.
        tokio::time::sleep(Duration::from_millis(self.settings.fill_delay_ms)).await;

        tracing::info!(
            symbol = %order.symbol,
            side = %order.side,
            quantity = order.quantity,
            price = %price,
            "Paper order filled"
        );

        Ok(Submission::Filled {
            filled_quantity: order.quantity,
            average_price: price,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{OrderSide, OrderType, Symbol};
    use rust_decimal_macros::dec;

    fn ticket(price: Option<rust_decimal::Decimal>) -> OrderTicket {
        OrderTicket {
            symbol: Symbol("NSE:RELIANCE-EQ".to_string()),
            exchange: "NSE".to_string(),
            side: OrderSide::Buy,
            order_type: OrderType::Market,
            quantity: 4,
            price,
        }
    }

    #[tokio::test]
    async fn paper_orders_fill_at_the_reference_price() {
        let executor = PaperExecutor::new(PaperSettings { fill_delay_ms: 0 });
        let submission = executor.submit(&ticket(Some(dec!(2500)))).await.unwrap();
        assert_eq!(
            submission,
            Submission::Filled {
                filled_quantity: 4,
                average_price: dec!(2500),
            }
        );
    }

    #[tokio::test]
    async fn paper_orders_require_a_price() {
        let executor = PaperExecutor::new(PaperSettings { fill_delay_ms: 0 });
        let result = executor.submit(&ticket(None)).await;
        assert!(matches!(result, Err(Error::ExecutionFailed { .. })));
    }
}
