// In crates/core-types/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid position sizing rule: {0}")]
    InvalidSizingRule(String),
}

pub type Result<T> = std::result::Result<T, Error>;
