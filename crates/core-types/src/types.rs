// In crates/core-types/src/types.rs

use crate::{Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A broker-scoped instrument identifier (e.g., "NSE:RELIANCE-EQ").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol(pub String);

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle states of an incoming alert.
///
/// Transitions are strictly forward:
/// `received -> processing -> {processed | failed | ignored}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "alert_status", rename_all = "snake_case")]
pub enum AlertStatus {
    Received,
    Processing,
    Processed,
    Failed,
    Ignored,
}

impl AlertStatus {
    /// Whether the alert has reached a terminal state and requires no further work.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Processed | Self::Failed | Self::Ignored)
    }
}

/// The signal carried by an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "alert_type", rename_all = "snake_case")]
pub enum AlertType {
    Buy,
    Sell,
    Hold,
    StopLoss,
    TakeProfit,
}

impl AlertType {
    /// Only buy/sell alerts can turn into orders.
    pub fn is_actionable(&self) -> bool {
        matches!(self, Self::Buy | Self::Sell)
    }
}

/// Where an alert originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "alert_source", rename_all = "snake_case")]
pub enum AlertSource {
    Chartlink,
    Manual,
    System,
    Webhook,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "order_side", rename_all = "snake_case")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "order_type", rename_all = "snake_case")]
pub enum OrderType {
    Market,
    Limit,
    StopLoss,
    StopLimit,
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Market => write!(f, "market"),
            Self::Limit => write!(f, "limit"),
            Self::StopLoss => write!(f, "stop_loss"),
            Self::StopLimit => write!(f, "stop_limit"),
        }
    }
}

/// Lifecycle states of a trade record.
///
/// `pending -> submitted -> {filled | partially_filled | cancelled | rejected}`,
/// with `failed` for executor failures and `risk_rejected` as the terminal
/// audit state for trades vetoed before submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "trade_status", rename_all = "snake_case")]
pub enum TradeStatus {
    Pending,
    Submitted,
    Filled,
    PartiallyFilled,
    Cancelled,
    Rejected,
    Failed,
    RiskRejected,
}

impl TradeStatus {
    /// Whether the order still awaits a broker-side resolution.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::Submitted | Self::PartiallyFilled)
    }
}

/// The raw position sizing rule document as stored on a strategy.
///
/// More than one field may be present; `resolve` applies the documented
/// precedence (fixed amount, then percentage of capital, then fixed quantity),
/// falling back to 1% of available funds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizingSpec {
    pub fixed_amount: Option<Decimal>,
    pub percentage_of_capital: Option<Decimal>,
    pub fixed_quantity: Option<i64>,
}

/// A resolved, closed sizing rule. Exactly one interpretation applies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SizingRule {
    /// Spend a fixed notional amount.
    FixedAmount(Decimal),
    /// Spend a percentage (0..=100] of available funds.
    PercentageOfCapital(Decimal),
    /// Order exactly this many shares, funds notwithstanding.
    FixedQuantity(i64),
    /// No rule configured: 1% of available funds.
    DefaultPercent,
}

impl SizingSpec {
    /// Applies the precedence order to produce a single rule.
    pub fn resolve(&self) -> SizingRule {
        if let Some(amount) = self.fixed_amount {
            SizingRule::FixedAmount(amount)
        } else if let Some(pct) = self.percentage_of_capital {
            SizingRule::PercentageOfCapital(pct)
        } else if let Some(qty) = self.fixed_quantity {
            SizingRule::FixedQuantity(qty)
        } else {
            SizingRule::DefaultPercent
        }
    }

    /// Validates the rule document at strategy-creation time, so execution
    /// never sees a malformed rule.
    pub fn validate(&self) -> Result<()> {
        if let Some(amount) = self.fixed_amount {
            if amount <= Decimal::ZERO {
                return Err(Error::InvalidSizingRule(format!(
                    "fixed_amount must be positive, got {amount}"
                )));
            }
        }
        if let Some(pct) = self.percentage_of_capital {
            if pct <= Decimal::ZERO || pct > Decimal::ONE_HUNDRED {
                return Err(Error::InvalidSizingRule(format!(
                    "percentage_of_capital must be in (0, 100], got {pct}"
                )));
            }
        }
        if let Some(qty) = self.fixed_quantity {
            if qty <= 0 {
                return Err(Error::InvalidSizingRule(format!(
                    "fixed_quantity must be positive, got {qty}"
                )));
            }
        }
        Ok(())
    }
}

/// A validated order ready for submission to an executor.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderTicket {
    pub symbol: Symbol,
    pub exchange: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub quantity: i64,
    /// Reference price. Required for limit orders and for paper fills.
    pub price: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn sizing_precedence_fixed_amount_wins() {
        let spec = SizingSpec {
            fixed_amount: Some(dec!(10000)),
            percentage_of_capital: Some(dec!(5)),
            fixed_quantity: Some(3),
        };
        assert_eq!(spec.resolve(), SizingRule::FixedAmount(dec!(10000)));
    }

    #[test]
    fn sizing_precedence_percentage_over_quantity() {
        let spec = SizingSpec {
            fixed_amount: None,
            percentage_of_capital: Some(dec!(5)),
            fixed_quantity: Some(3),
        };
        assert_eq!(spec.resolve(), SizingRule::PercentageOfCapital(dec!(5)));
    }

    #[test]
    fn empty_spec_resolves_to_default() {
        assert_eq!(SizingSpec::default().resolve(), SizingRule::DefaultPercent);
    }

    #[test]
    fn validate_rejects_bad_percentage() {
        let spec = SizingSpec {
            percentage_of_capital: Some(dec!(150)),
            ..Default::default()
        };
        assert!(spec.validate().is_err());
    }

    #[test]
    fn validate_rejects_non_positive_quantity() {
        let spec = SizingSpec {
            fixed_quantity: Some(0),
            ..Default::default()
        };
        assert!(spec.validate().is_err());
    }

    #[test]
    fn alert_terminal_states() {
        assert!(!AlertStatus::Received.is_terminal());
        assert!(!AlertStatus::Processing.is_terminal());
        assert!(AlertStatus::Processed.is_terminal());
        assert!(AlertStatus::Failed.is_terminal());
        assert!(AlertStatus::Ignored.is_terminal());
    }
}
