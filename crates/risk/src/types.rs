// In crates/risk/src/types.rs

use core_types::OrderSide;
use rust_decimal::Decimal;
use serde::Deserialize;

/// Process-wide risk ceilings, read once at engine construction.
#[derive(Debug, Clone, Deserialize)]
pub struct RiskLimits {
    /// The maximum notional value of a single position.
    pub max_position_size: Decimal,

    /// The maximum absolute realized loss tolerated per day.
    pub max_daily_loss: Decimal,

    /// The maximum number of filled trades per day.
    pub max_daily_trades: i64,
}

/// The order under evaluation.
#[derive(Debug, Clone, Copy)]
pub struct TradeCandidate {
    pub side: OrderSide,
    pub quantity: i64,
    pub price: Decimal,
}

impl TradeCandidate {
    /// Notional value of the candidate order.
    pub fn notional(&self) -> Decimal {
        Decimal::from(self.quantity) * self.price
    }
}

/// The net open position for the candidate's symbol, if one exists.
#[derive(Debug, Clone, Copy)]
pub struct PositionExposure {
    /// Signed share count (negative for net short).
    pub quantity: i64,
}

/// A read-only snapshot of today's account activity, assembled by the caller.
///
/// Keeping the evaluator a pure function of this snapshot means the risk
/// checks have no side effects and are trivially testable; the caller is
/// responsible for failing closed when the snapshot cannot be assembled.
#[derive(Debug, Clone, Default)]
pub struct AccountSnapshot {
    /// Count of today's filled or partially-filled trades.
    pub daily_filled_trades: i64,

    /// Sum of today's negative net P&L values (zero or negative).
    pub daily_realized_loss: Decimal,

    /// Current position for the candidate's symbol.
    pub position: Option<PositionExposure>,
}
