// In crates/risk/src/lib.rs

use core_types::OrderSide;
use rust_decimal::Decimal;

pub mod error;
pub mod types;

// Re-export public types
pub use error::{Error, Result};
pub use types::{AccountSnapshot, PositionExposure, RiskLimits, TradeCandidate};

/// Evaluates candidate trades against configured risk ceilings.
///
/// The checks are short-circuiting and run in a fixed order: daily trade
/// count, daily loss, order notional, prospective total exposure. The first
/// violated limit's reason is returned. The evaluator performs no I/O; the
/// caller supplies an [`AccountSnapshot`] and must treat any failure to
/// assemble one as a veto (fail closed).
#[derive(Debug, Clone)]
pub struct RiskManager {
    limits: RiskLimits,
}

impl RiskManager {
    pub fn new(limits: RiskLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &RiskLimits {
        &self.limits
    }

    /// Checks whether the candidate order violates any configured limit.
    ///
    /// Returns `Ok(())` when all checks pass, or `Err(Error::Vetoed)` carrying
    /// the first failing check's reason.
    pub fn check_risk_limits(
        &self,
        candidate: &TradeCandidate,
        snapshot: &AccountSnapshot,
    ) -> Result<()> {
        if snapshot.daily_filled_trades >= self.limits.max_daily_trades {
            return Err(Error::Vetoed {
                reason: format!(
                    "Daily trade limit exceeded ({})",
                    self.limits.max_daily_trades
                ),
            });
        }

        if snapshot.daily_realized_loss.abs() >= self.limits.max_daily_loss {
            return Err(Error::Vetoed {
                reason: format!("Daily loss limit exceeded ({})", self.limits.max_daily_loss),
            });
        }

        if candidate.notional() > self.limits.max_position_size {
            return Err(Error::Vetoed {
                reason: format!(
                    "Position size exceeds limit ({})",
                    self.limits.max_position_size
                ),
            });
        }

        if let Some(position) = &snapshot.position {
            let signed_qty = match candidate.side {
                OrderSide::Buy => candidate.quantity,
                OrderSide::Sell => -candidate.quantity,
            };
            let prospective_qty = (position.quantity + signed_qty).abs();
            let prospective_exposure = Decimal::from(prospective_qty) * candidate.price;
            if prospective_exposure > self.limits.max_position_size {
                return Err(Error::Vetoed {
                    reason: "Total position size would exceed limit".to_string(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn limits() -> RiskLimits {
        RiskLimits {
            max_position_size: dec!(100000),
            max_daily_loss: dec!(5000),
            max_daily_trades: 50,
        }
    }

    fn buy(quantity: i64, price: Decimal) -> TradeCandidate {
        TradeCandidate {
            side: OrderSide::Buy,
            quantity,
            price,
        }
    }

    #[test]
    fn passes_within_all_limits() {
        let manager = RiskManager::new(limits());
        let snapshot = AccountSnapshot::default();
        assert!(
            manager
                .check_risk_limits(&buy(10, dec!(2500)), &snapshot)
                .is_ok()
        );
    }

    #[test]
    fn vetoes_at_daily_trade_limit() {
        let manager = RiskManager::new(limits());
        let snapshot = AccountSnapshot {
            daily_filled_trades: 50,
            ..Default::default()
        };
        let err = manager
            .check_risk_limits(&buy(1, dec!(100)), &snapshot)
            .unwrap_err();
        assert!(err.to_string().contains("Daily trade limit"));
    }

    #[test]
    fn vetoes_at_daily_loss_limit() {
        let manager = RiskManager::new(limits());
        let snapshot = AccountSnapshot {
            daily_realized_loss: dec!(-5000),
            ..Default::default()
        };
        let err = manager
            .check_risk_limits(&buy(1, dec!(100)), &snapshot)
            .unwrap_err();
        assert!(err.to_string().contains("Daily loss limit"));
    }

    #[test]
    fn vetoes_oversized_order() {
        let manager = RiskManager::new(limits());
        let err = manager
            .check_risk_limits(&buy(100, dec!(2500)), &AccountSnapshot::default())
            .unwrap_err();
        assert!(err.to_string().contains("Position size exceeds limit"));
    }

    #[test]
    fn vetoes_prospective_exposure() {
        let manager = RiskManager::new(limits());
        let snapshot = AccountSnapshot {
            position: Some(PositionExposure { quantity: 30 }),
            ..Default::default()
        };
        // 30 + 15 = 45 shares at 2500 = 112_500 > 100_000.
        let err = manager
            .check_risk_limits(&buy(15, dec!(2500)), &snapshot)
            .unwrap_err();
        assert!(err.to_string().contains("Total position size"));
    }

    #[test]
    fn sell_reduces_prospective_exposure() {
        let manager = RiskManager::new(limits());
        let snapshot = AccountSnapshot {
            position: Some(PositionExposure { quantity: 30 }),
            ..Default::default()
        };
        let candidate = TradeCandidate {
            side: OrderSide::Sell,
            quantity: 15,
            price: dec!(2500),
        };
        // |30 - 15| = 15 shares at 2500 = 37_500, within the limit.
        assert!(manager.check_risk_limits(&candidate, &snapshot).is_ok());
    }

    #[test]
    fn checks_short_circuit_in_order() {
        let manager = RiskManager::new(limits());
        // Both the trade-count and notional checks would fail; the trade-count
        // reason must win.
        let snapshot = AccountSnapshot {
            daily_filled_trades: 50,
            ..Default::default()
        };
        let err = manager
            .check_risk_limits(&buy(100, dec!(2500)), &snapshot)
            .unwrap_err();
        assert!(err.to_string().contains("Daily trade limit"));
    }
}
