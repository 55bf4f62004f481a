// In crates/broker-client/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to build the broker client: {0}")]
    ClientBuildError(String),
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(#[from] serde_json::Error),
    #[error("Broker API error: code {code}, msg: {msg}")]
    ApiError { code: i64, msg: String },
    #[error("Broker returned HTTP status {status}")]
    HttpStatus { status: u16 },
    #[error("Broker response is missing expected data: {0}")]
    MissingData(String),
}

pub type Result<T> = std::result::Result<T, Error>;
