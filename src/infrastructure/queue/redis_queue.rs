use super::JobQueue;
use async_trait::async_trait;
use std::time::Duration;
use uuid::Uuid;

const QUEUE_KEY: &str = "vaak:tts_jobs";

/// Redis-backed job queue.
///
/// Jobs are pushed as JSON envelopes onto a single list; the worker
/// pool pops from the other end and orders by the embedded priority.
pub struct RedisJobQueue {
    client: redis::Client,
}

impl RedisJobQueue {
    pub fn new(url: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(url)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl JobQueue for RedisJobQueue {
    async fn enqueue(&self, job_id: Uuid, priority: i32) -> Result<(), String> {
        use redis::AsyncCommands;

        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| format!("failed to connect to broker: {e}"))?;

        let envelope = serde_json::json!({
            "job_id": job_id,
            "priority": priority,
        })
        .to_string();

        let _: i64 = conn
            .lpush(QUEUE_KEY, &envelope)
            .await
            .map_err(|e| format!("LPUSH failed: {e}"))?;

        tracing::info!(
            job_id = %job_id,
            priority,
            queue = QUEUE_KEY,
            "Job enqueued for distributed workers"
        );

        Ok(())
    }

    async fn ping(&self, timeout: Duration) -> bool {
        let probe = async {
            let mut conn = self.client.get_multiplexed_async_connection().await.ok()?;
            let pong: String = redis::cmd("PING").query_async(&mut conn).await.ok()?;
            Some(pong)
        };

        match tokio::time::timeout(timeout, probe).await {
            Ok(Some(pong)) => pong.eq_ignore_ascii_case("pong"),
            Ok(None) => {
                tracing::warn!("Broker health probe failed");
                false
            }
            Err(_) => {
                tracing::warn!(timeout_ms = timeout.as_millis() as u64, "Broker health probe timed out");
                false
            }
        }
    }
}
