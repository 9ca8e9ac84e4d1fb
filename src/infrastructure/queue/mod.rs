pub mod redis_queue;

pub use redis_queue::RedisJobQueue;

use async_trait::async_trait;
use std::time::Duration;
use uuid::Uuid;

/// Minimum contract with the distributed task queue: hand a job to the
/// worker pool and check whether the broker is alive. Consumption,
/// redelivery, and acknowledgment semantics live on the worker side.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Push a job onto the queue for the worker pool.
    async fn enqueue(&self, job_id: Uuid, priority: i32) -> Result<(), String>;

    /// Broker liveness probe. Must complete within the timeout; a slow
    /// or unreachable broker reads as unhealthy, never as a hang.
    async fn ping(&self, timeout: Duration) -> bool;
}
