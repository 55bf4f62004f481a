// In crates/database/src/models.rs

use chrono::{DateTime, Utc};
use core_types::{
    AlertSource, AlertStatus, AlertType, OrderSide, OrderType, SizingSpec, TradeStatus,
};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

/// A platform user with optional broker credentials.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub broker_access_token: Option<String>,
    #[serde(skip_serializing)]
    pub broker_refresh_token: Option<String>,
    pub broker_token_expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether live broker calls can be made on this user's behalf.
    pub fn has_broker_credentials(&self) -> bool {
        self.broker_access_token
            .as_deref()
            .is_some_and(|token| !token.is_empty())
    }
}

/// A user-owned trading strategy governing how alerts become trades.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Strategy {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub position_sizing: Json<SizingSpec>,
    pub max_position_size: Option<Decimal>,
    pub max_daily_trades: Option<i32>,
    pub is_active: bool,
    pub is_paper_trading: bool,
    pub total_trades: i32,
    pub winning_trades: i32,
    pub losing_trades: i32,
    pub total_pnl: Decimal,
    pub max_drawdown: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_executed_at: Option<DateTime<Utc>>,
}

impl Strategy {
    /// Folds a settled trade outcome into the running performance counters.
    pub fn update_performance_metrics(&mut self, trade_pnl: Decimal, is_winning: bool) {
        self.total_trades += 1;
        self.total_pnl += trade_pnl;

        if is_winning {
            self.winning_trades += 1;
        } else {
            self.losing_trades += 1;
        }

        // Drawdown tracks the worst negative cumulative P&L seen so far.
        if self.total_pnl < Decimal::ZERO && self.total_pnl.abs() > self.max_drawdown {
            self.max_drawdown = self.total_pnl.abs();
        }

        self.last_executed_at = Some(Utc::now());
    }
}

/// A normalized external trading signal awaiting processing.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Alert {
    pub id: Uuid,
    pub user_id: Uuid,
    pub symbol: String,
    pub exchange: String,
    pub alert_type: AlertType,
    pub source: AlertSource,
    pub price: Option<Decimal>,
    pub quantity: Option<i64>,
    pub message: Option<String>,
    pub metadata: Json<Value>,
    pub status: AlertStatus,
    pub processed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub matched_strategy_id: Option<Uuid>,
    pub confidence_score: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Alert {
    /// Scan alerts are informational only and never produce trades.
    ///
    /// Any non-null, non-false `is_scan_alert` metadata value marks the alert
    /// as a scan.
    pub fn is_scan_alert(&self) -> bool {
        match self.metadata.0.get("is_scan_alert") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(flag)) => *flag,
            Some(_) => true,
        }
    }
}

/// One order lifecycle record, from creation through its terminal state.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Trade {
    pub id: Uuid,
    pub user_id: Uuid,
    pub strategy_id: Uuid,
    pub alert_id: Option<Uuid>,
    pub symbol: String,
    pub exchange: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub quantity: i64,
    pub price: Option<Decimal>,
    pub filled_quantity: i64,
    pub average_price: Option<Decimal>,
    pub total_amount: Option<Decimal>,
    pub broker_order_id: Option<String>,
    pub broker_status: Option<String>,
    pub broker_message: Option<String>,
    pub status: TradeStatus,
    pub submitted_at: Option<DateTime<Utc>>,
    pub filled_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub realized_pnl: Option<Decimal>,
    pub fees: Option<Decimal>,
    pub net_pnl: Option<Decimal>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Trade {
    /// Unrealized P&L against the given market price. Zero until filled.
    pub fn unrealized_pnl(&self, current_price: Decimal) -> Decimal {
        let Some(average_price) = self.average_price else {
            return Decimal::ZERO;
        };
        if self.status != TradeStatus::Filled {
            return Decimal::ZERO;
        }
        let delta = match self.side {
            OrderSide::Buy => current_price - average_price,
            OrderSide::Sell => average_price - current_price,
        };
        delta * Decimal::from(self.filled_quantity)
    }
}

/// Input for creating a trade row.
#[derive(Debug, Clone)]
pub struct NewTrade {
    pub user_id: Uuid,
    pub strategy_id: Uuid,
    pub alert_id: Option<Uuid>,
    pub symbol: String,
    pub exchange: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub quantity: i64,
    pub price: Option<Decimal>,
    pub status: TradeStatus,
    pub notes: Option<String>,
}

/// How a successful executor dispatch should be recorded.
#[derive(Debug, Clone)]
pub enum SubmissionUpdate {
    /// The order filled at submission time (paper path).
    Filled {
        filled_quantity: i64,
        average_price: Decimal,
    },
    /// The broker accepted the order; fills arrive via reconciliation.
    Accepted {
        order_id: Option<String>,
        status: Option<String>,
        message: Option<String>,
    },
}

/// A net open position per (user, symbol), read-only to the trade engine.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PortfolioPosition {
    pub id: Uuid,
    pub user_id: Uuid,
    pub symbol: String,
    pub exchange: String,
    pub quantity: i64,
    pub average_price: Decimal,
    pub invested_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Aggregates over today's settled trades, consumed by the risk check.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct DailyTradeStats {
    /// Count of filled/partially-filled trades created today.
    pub filled_count: i64,
    /// Sum of today's negative net P&L values (zero or negative).
    pub realized_loss: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn user(token: Option<&str>) -> User {
        User {
            id: Uuid::new_v4(),
            email: "trader@example.com".to_string(),
            username: "trader".to_string(),
            broker_access_token: token.map(str::to_string),
            broker_refresh_token: None,
            broker_token_expires_at: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn strategy() -> Strategy {
        Strategy {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "momentum".to_string(),
            description: None,
            position_sizing: Json(SizingSpec::default()),
            max_position_size: None,
            max_daily_trades: None,
            is_active: true,
            is_paper_trading: true,
            total_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            total_pnl: Decimal::ZERO,
            max_drawdown: Decimal::ZERO,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_executed_at: None,
        }
    }

    fn alert_with_metadata(metadata: Value) -> Alert {
        Alert {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            symbol: "NSE:RELIANCE-EQ".to_string(),
            exchange: "NSE".to_string(),
            alert_type: AlertType::Buy,
            source: AlertSource::Manual,
            price: None,
            quantity: None,
            message: None,
            metadata: Json(metadata),
            status: AlertStatus::Received,
            processed_at: None,
            error_message: None,
            matched_strategy_id: None,
            confidence_score: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn credentials_require_a_non_empty_token() {
        assert!(user(Some("token")).has_broker_credentials());
        assert!(!user(Some("")).has_broker_credentials());
        assert!(!user(None).has_broker_credentials());
    }

    #[test]
    fn scan_alert_detection_is_truthy() {
        assert!(alert_with_metadata(serde_json::json!({"is_scan_alert": true})).is_scan_alert());
        assert!(alert_with_metadata(serde_json::json!({"is_scan_alert": "yes"})).is_scan_alert());
        assert!(!alert_with_metadata(serde_json::json!({"is_scan_alert": false})).is_scan_alert());
        assert!(!alert_with_metadata(serde_json::json!({"is_scan_alert": null})).is_scan_alert());
        assert!(!alert_with_metadata(serde_json::json!({})).is_scan_alert());
    }

    #[test]
    fn performance_metrics_track_wins_losses_and_drawdown() {
        let mut strategy = strategy();

        strategy.update_performance_metrics(dec!(100), true);
        assert_eq!(strategy.total_trades, 1);
        assert_eq!(strategy.winning_trades, 1);
        assert_eq!(strategy.total_pnl, dec!(100));
        assert_eq!(strategy.max_drawdown, Decimal::ZERO);

        strategy.update_performance_metrics(dec!(-250), false);
        assert_eq!(strategy.total_trades, 2);
        assert_eq!(strategy.losing_trades, 1);
        assert_eq!(strategy.total_pnl, dec!(-150));
        assert_eq!(strategy.max_drawdown, dec!(150));
        assert!(strategy.last_executed_at.is_some());
    }
}
