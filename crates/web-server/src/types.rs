// In crates/web-server/src/types.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Query parameters for list endpoints (e.g., ?limit=20).
#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    50
}

/// Acknowledgement that a task was queued for asynchronous processing.
#[derive(Debug, Serialize)]
pub struct QueuedResponse {
    pub queued: bool,
    pub task_id: Uuid,
}

/// Result of an on-demand trade reconciliation.
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub updated: bool,
}
