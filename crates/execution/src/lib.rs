// In crates/execution/src/lib.rs

use async_trait::async_trait;
use core_types::OrderTicket;

pub mod error;
pub mod live;
pub mod paper;
pub mod types;

pub use error::{Error, Result};
pub use live::LiveExecutor;
pub use paper::PaperExecutor;
pub use types::{PaperSettings, Submission};

/// The seam between trade decisioning and order placement.
///
/// An executor receives a fully sized and risk-approved ticket and does one
/// thing: submit it. It never touches the database.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Short label for logs ("paper" or "live").
    fn name(&self) -> &'static str;

    /// Submits the order and reports how it was taken.
    async fn submit(&self, order: &OrderTicket) -> Result<Submission>;
}
