// In crates/engine/src/consumer.rs

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use task_queue::{ALERT_QUEUE, TRADE_UPDATE_QUEUE, Task, TaskQueue};
use uuid::Uuid;

use crate::TradeEngine;

/// Polls the Redis task queues and dispatches work into the engine.
///
/// Delivery is at-least-once; both handlers are idempotent (the alert claim
/// and the reconciliation rewrite), so a redelivered task is harmless. Errors
/// are logged and the loop keeps going.
pub struct QueueConsumer {
    engine: Arc<TradeEngine>,
    queue: TaskQueue,
    poll_secs: u64,
}

impl QueueConsumer {
    pub fn new(engine: Arc<TradeEngine>, queue: TaskQueue, poll_secs: u64) -> Self {
        QueueConsumer {
            engine,
            queue,
            poll_secs: poll_secs.max(1),
        }
    }

    /// Runs forever, alternating between the two queues.
    pub async fn run(self) {
        tracing::info!(poll_secs = self.poll_secs, "Queue consumer started");
        loop {
            self.drain_one(ALERT_QUEUE).await;
            self.drain_one(TRADE_UPDATE_QUEUE).await;
        }
    }

    async fn drain_one(&self, queue: &str) {
        match self.queue.dequeue(queue, self.poll_secs as f64).await {
            Ok(Some(task)) => self.dispatch(queue, task).await,
            Ok(None) => {}
            Err(e) => {
                tracing::error!(queue, error = %e, "Queue poll failed, backing off");
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
        }
    }

    async fn dispatch(&self, queue: &str, task: Task) {
        match queue {
            ALERT_QUEUE => {
                let Some(alert_id) = task_uuid(&task.data, "alert_id") else {
                    tracing::error!(task_id = %task.id, "Alert task is missing a valid alert_id");
                    return;
                };
                let processed = self.engine.process_alert(alert_id).await;
                tracing::debug!(%alert_id, processed, "Alert task handled");
            }
            TRADE_UPDATE_QUEUE => {
                let Some(trade_id) = task_uuid(&task.data, "trade_id") else {
                    tracing::error!(task_id = %task.id, "Trade task is missing a valid trade_id");
                    return;
                };
                if let Err(e) = self.engine.update_trade_status(trade_id).await {
                    tracing::error!(%trade_id, error = %e, "Trade reconciliation failed");
                }
            }
            other => tracing::error!(queue = other, "Task from unknown queue"),
        }
    }
}

fn task_uuid(data: &Value, key: &str) -> Option<Uuid> {
    data.get(key)
        .and_then(Value::as_str)
        .and_then(|raw| Uuid::parse_str(raw).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_a_valid_uuid() {
        let id = Uuid::new_v4();
        let data = json!({ "alert_id": id.to_string() });
        assert_eq!(task_uuid(&data, "alert_id"), Some(id));
    }

    #[test]
    fn rejects_missing_or_malformed_ids() {
        assert_eq!(task_uuid(&json!({}), "alert_id"), None);
        assert_eq!(task_uuid(&json!({ "alert_id": 42 }), "alert_id"), None);
        assert_eq!(
            task_uuid(&json!({ "alert_id": "not-a-uuid" }), "alert_id"),
            None
        );
    }
}
