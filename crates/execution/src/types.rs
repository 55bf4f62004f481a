// In crates/execution/src/types.rs

use rust_decimal::Decimal;

/// The outcome of handing an order to an executor.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// The order filled immediately (paper path).
    Filled {
        filled_quantity: i64,
        average_price: Decimal,
    },
    /// The broker accepted the order; its fill arrives asynchronously.
    Accepted {
        order_id: Option<String>,
        status: Option<String>,
        message: Option<String>,
    },
}

/// Tuning knobs for the simulated paper executor.
#[derive(Debug, Clone, Copy)]
pub struct PaperSettings {
    /// Simulated broker latency before the instant fill.
    pub fill_delay_ms: u64,
}

impl Default for PaperSettings {
    fn default() -> Self {
        PaperSettings { fill_delay_ms: 100 }
    }
}
