// In crates/risk/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Trade was vetoed by risk manager: {reason}")]
    Vetoed { reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
