// In crates/app-config/src/types.rs

use risk::types::RiskLimits;
use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    /// The application's general settings.
    pub app: AppSettings,
    /// Settings for the HTTP API server.
    pub server: ServerSettings,
    /// Settings for the database connection.
    pub database: DatabaseSettings,
    /// Settings for the Redis task queue.
    pub redis: RedisSettings,
    /// Settings for the broker API.
    pub broker: BrokerSettings,
    /// Process-wide risk ceilings, consumed by the trade engine.
    pub risk: RiskLimits,
    /// Trade engine tunables.
    #[serde(default)]
    pub engine: EngineSettings,
}

#[derive(Deserialize, Debug, Clone)]
pub struct AppSettings {
    /// The environment the application is running in (e.g., "development", "production").
    pub environment: String,
    /// The log level for the application.
    pub log_level: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Debug, Clone)]
pub struct DatabaseSettings {
    /// The connection URL for the PostgreSQL database.
    pub url: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct RedisSettings {
    /// The connection URL for the Redis server.
    pub url: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct BrokerSettings {
    /// The application id issued by the broker.
    pub app_id: String,
    /// The secret key issued by the broker.
    pub secret_key: String,
    /// The REST API base URL for the broker.
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct EngineSettings {
    /// Simulated network latency applied before a paper fill, in milliseconds.
    #[serde(default = "default_paper_fill_delay_ms")]
    pub paper_fill_delay_ms: u64,
    /// Blocking wait used when polling the task queues, in seconds.
    #[serde(default = "default_queue_poll_secs")]
    pub queue_poll_secs: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            paper_fill_delay_ms: default_paper_fill_delay_ms(),
            queue_poll_secs: default_queue_poll_secs(),
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_paper_fill_delay_ms() -> u64 {
    100
}

fn default_queue_poll_secs() -> u64 {
    1
}
