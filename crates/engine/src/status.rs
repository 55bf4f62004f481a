// In crates/engine/src/status.rs

use broker_client::OrderStatus;
use chrono::{DateTime, Utc};
use core_types::TradeStatus;
use database::Trade;
use rust_decimal::Decimal;

/// Folds the broker's authoritative order state into a trade record.
///
/// The mapping is idempotent: re-applying the same broker status leaves the
/// record unchanged, and the fill/cancel timestamps are only stamped on the
/// first transition into that state. Unrecognized broker statuses update only
/// the raw `broker_status` field so the record still reflects what the broker
/// said.
pub fn apply_broker_status(trade: &mut Trade, status: &OrderStatus, now: DateTime<Utc>) {
    let normalized = status.status.to_lowercase();
    trade.broker_status = Some(normalized.clone());

    match normalized.as_str() {
        "filled" => {
            if trade.status != TradeStatus::Filled {
                trade.filled_at = Some(now);
            }
            trade.status = TradeStatus::Filled;
            trade.filled_quantity = status.filled_quantity.unwrap_or(trade.quantity);
            trade.average_price = status.average_price.or(trade.price);
            trade.total_amount = trade
                .average_price
                .map(|price| price * Decimal::from(trade.filled_quantity));
        }
        "partially_filled" | "partial" => {
            trade.status = TradeStatus::PartiallyFilled;
            if let Some(quantity) = status.filled_quantity {
                trade.filled_quantity = quantity;
            }
            if let Some(price) = status.average_price {
                trade.average_price = Some(price);
            }
        }
        "cancelled" | "canceled" => {
            if trade.status != TradeStatus::Cancelled {
                trade.cancelled_at = Some(now);
            }
            trade.status = TradeStatus::Cancelled;
        }
        "rejected" => {
            trade.status = TradeStatus::Rejected;
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{OrderSide, OrderType};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn submitted_trade() -> Trade {
        Trade {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            strategy_id: Uuid::new_v4(),
            alert_id: None,
            symbol: "NSE:RELIANCE-EQ".to_string(),
            exchange: "NSE".to_string(),
            side: OrderSide::Buy,
            order_type: OrderType::Market,
            quantity: 10,
            price: Some(dec!(2500)),
            filled_quantity: 0,
            average_price: None,
            total_amount: None,
            broker_order_id: Some("8102710298291".to_string()),
            broker_status: Some("submitted".to_string()),
            broker_message: None,
            status: TradeStatus::Submitted,
            submitted_at: Some(Utc::now()),
            filled_at: None,
            cancelled_at: None,
            realized_pnl: None,
            fees: None,
            net_pnl: None,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn fill_stamps_quantities_prices_and_time() {
        let mut trade = submitted_trade();
        let now = Utc::now();
        let status = OrderStatus {
            status: "FILLED".to_string(),
            filled_quantity: Some(10),
            average_price: Some(dec!(2501.25)),
        };

        apply_broker_status(&mut trade, &status, now);

        assert_eq!(trade.status, TradeStatus::Filled);
        assert_eq!(trade.filled_quantity, 10);
        assert_eq!(trade.average_price, Some(dec!(2501.25)));
        assert_eq!(trade.total_amount, Some(dec!(25012.50)));
        assert_eq!(trade.filled_at, Some(now));
        assert_eq!(trade.broker_status.as_deref(), Some("filled"));
    }

    #[test]
    fn fill_falls_back_to_order_fields() {
        let mut trade = submitted_trade();
        let status = OrderStatus {
            status: "filled".to_string(),
            filled_quantity: None,
            average_price: None,
        };

        apply_broker_status(&mut trade, &status, Utc::now());

        assert_eq!(trade.filled_quantity, 10);
        assert_eq!(trade.average_price, Some(dec!(2500)));
        assert_eq!(trade.total_amount, Some(dec!(25000)));
    }

    #[test]
    fn reapplying_a_fill_preserves_the_first_timestamp() {
        let mut trade = submitted_trade();
        let first = Utc::now();
        let status = OrderStatus {
            status: "filled".to_string(),
            filled_quantity: Some(10),
            average_price: Some(dec!(2500)),
        };

        apply_broker_status(&mut trade, &status, first);
        let later = first + chrono::Duration::minutes(5);
        apply_broker_status(&mut trade, &status, later);

        assert_eq!(trade.filled_at, Some(first));
        assert_eq!(trade.status, TradeStatus::Filled);
    }

    #[test]
    fn cancellation_stamps_once() {
        let mut trade = submitted_trade();
        let first = Utc::now();
        let status = OrderStatus {
            status: "cancelled".to_string(),
            filled_quantity: None,
            average_price: None,
        };

        apply_broker_status(&mut trade, &status, first);
        apply_broker_status(&mut trade, &status, first + chrono::Duration::minutes(1));

        assert_eq!(trade.status, TradeStatus::Cancelled);
        assert_eq!(trade.cancelled_at, Some(first));
    }

    #[test]
    fn partial_fill_updates_progress() {
        let mut trade = submitted_trade();
        let status = OrderStatus {
            status: "partially_filled".to_string(),
            filled_quantity: Some(4),
            average_price: Some(dec!(2499)),
        };

        apply_broker_status(&mut trade, &status, Utc::now());

        assert_eq!(trade.status, TradeStatus::PartiallyFilled);
        assert_eq!(trade.filled_quantity, 4);
        assert_eq!(trade.average_price, Some(dec!(2499)));
    }

    #[test]
    fn unknown_status_only_records_the_raw_value() {
        let mut trade = submitted_trade();
        let status = OrderStatus {
            status: "pending_validation".to_string(),
            filled_quantity: None,
            average_price: None,
        };

        apply_broker_status(&mut trade, &status, Utc::now());

        assert_eq!(trade.status, TradeStatus::Submitted);
        assert_eq!(trade.broker_status.as_deref(), Some("pending_validation"));
        assert!(trade.filled_at.is_none());
    }
}
