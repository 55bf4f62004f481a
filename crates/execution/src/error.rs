// In crates/execution/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Execution failed: {reason}")]
    ExecutionFailed { reason: String },
    #[error("Broker error: {0}")]
    BrokerError(#[from] broker_client::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
