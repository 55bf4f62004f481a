// In crates/engine/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] database::Error),
    #[error("Broker error: {0}")]
    Broker(#[from] broker_client::Error),
    #[error("Execution error: {0}")]
    Execution(#[from] execution::Error),
    #[error("No market price available for {symbol}")]
    NoPrice { symbol: String },
}

pub type Result<T> = std::result::Result<T, Error>;
