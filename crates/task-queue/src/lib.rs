// In crates/task-queue/src/lib.rs

use app_config::types::RedisSettings;
use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub mod error;

pub use error::{Error, Result};

/// Queue of alert ids awaiting processing.
pub const ALERT_QUEUE: &str = "alert_processing";
/// Queue of trade ids awaiting broker-status reconciliation.
pub const TRADE_UPDATE_QUEUE: &str = "trade_updates";

/// One unit of deferred work, serialized as JSON into a Redis sorted set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub data: Value,
    pub priority: i64,
    pub created_at: DateTime<Utc>,
    pub attempts: u32,
    pub max_attempts: u32,
}

impl Task {
    pub fn new(data: Value, priority: i64) -> Self {
        Task {
            id: Uuid::new_v4(),
            data,
            priority,
            created_at: Utc::now(),
            attempts: 0,
            max_attempts: 3,
        }
    }
}

/// A priority queue backed by Redis sorted sets.
///
/// Each named queue is a sorted set under `queue:{name}`; members pop in
/// ascending score order, so a lower priority number means sooner. Delivery
/// is at-least-once: a consumer that crashes after popping loses nothing but
/// the in-flight task, and producers may enqueue the same id again.
#[derive(Clone)]
pub struct TaskQueue {
    conn: ConnectionManager,
}

/// Connects to Redis and returns a queue handle.
pub async fn connect(settings: &RedisSettings) -> Result<TaskQueue> {
    let client = redis::Client::open(settings.url.as_str())?;
    let conn = ConnectionManager::new(client).await?;
    tracing::info!("Connected to Redis task queue");
    Ok(TaskQueue { conn })
}

impl TaskQueue {
    /// Pushes a task onto the named queue.
    pub async fn enqueue(&self, queue: &str, task: &Task) -> Result<()> {
        let key = queue_key(queue);
        let member = serde_json::to_string(task)?;
        let score = task_score(task);

        let mut conn = self.conn.clone();
        let _: () = conn.zadd(&key, member, score).await?;

        tracing::debug!(queue, task_id = %task.id, "Enqueued task");
        Ok(())
    }

    /// Pops the lowest-scored task, blocking up to `timeout_secs`.
    ///
    /// Returns `None` on timeout. A member that fails to parse is dropped
    /// with an error log rather than poisoning the queue.
    pub async fn dequeue(&self, queue: &str, timeout_secs: f64) -> Result<Option<Task>> {
        let key = queue_key(queue);
        let mut conn = self.conn.clone();

        let popped: Option<(String, String, f64)> = redis::cmd("BZPOPMIN")
            .arg(&key)
            .arg(timeout_secs)
            .query_async(&mut conn)
            .await?;

        let Some((_, member, _)) = popped else {
            return Ok(None);
        };

        match serde_json::from_str::<Task>(&member) {
            Ok(task) => Ok(Some(task)),
            Err(e) => {
                tracing::error!(queue, error = %e, "Discarding malformed task payload");
                Ok(None)
            }
        }
    }

    /// Number of tasks currently waiting on the named queue.
    pub async fn len(&self, queue: &str) -> Result<u64> {
        let key = queue_key(queue);
        let mut conn = self.conn.clone();
        let count: u64 = conn.zcard(&key).await?;
        Ok(count)
    }
}

fn queue_key(queue: &str) -> String {
    format!("queue:{queue}")
}

/// Priority dominates; the enqueue timestamp breaks ties FIFO.
fn task_score(task: &Task) -> f64 {
    task.priority as f64 * 1e13 + task.created_at.timestamp_millis() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn task_round_trips_through_json() {
        let task = Task::new(json!({"alert_id": "8b5c1e1e-0000-0000-0000-000000000001"}), 1);
        let encoded = serde_json::to_string(&task).unwrap();
        let decoded: Task = serde_json::from_str(&encoded).unwrap();

        assert_eq!(decoded.id, task.id);
        assert_eq!(decoded.data, task.data);
        assert_eq!(decoded.priority, 1);
        assert_eq!(decoded.attempts, 0);
        assert_eq!(decoded.max_attempts, 3);
    }

    #[test]
    fn lower_priority_scores_sort_first() {
        let urgent = Task::new(json!({}), 0);
        let routine = Task::new(json!({}), 5);
        assert!(task_score(&urgent) < task_score(&routine));
    }

    #[test]
    fn earlier_tasks_win_within_a_priority() {
        let mut first = Task::new(json!({}), 1);
        let mut second = Task::new(json!({}), 1);
        first.created_at = Utc::now() - chrono::Duration::seconds(10);
        second.created_at = Utc::now();
        assert!(task_score(&first) < task_score(&second));
    }
}
