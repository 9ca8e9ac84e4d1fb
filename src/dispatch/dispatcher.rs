use super::executor::JobExecutor;
use crate::domain::job::{Job, JobTransition};
use crate::domain::tts::{classify, normalize_language, LanguageClass};
use crate::error::AppResult;
use crate::infrastructure::queue::JobQueue;
use crate::infrastructure::repositories::JobRepository;
use std::sync::Arc;
use std::time::Duration;

/// Where an admitted job goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Hand to the distributed worker pool via the broker.
    DistributedQueue,
    /// Execute on a background task in this process.
    InProcessFallback,
    /// Fail fast: the required path is unavailable and degrading is
    /// not allowed.
    Reject,
}

/// Decides, per job, between the distributed queue and the in-process
/// fallback, based on language class and live broker health.
///
/// High-fidelity synthesis must not silently run somewhere unobservable
/// in production, so a down broker rejects high-resource jobs unless
/// degraded routing was explicitly enabled at startup.
pub struct Dispatcher {
    queue: Arc<dyn JobQueue>,
    jobs: Arc<dyn JobRepository>,
    executor: Arc<JobExecutor>,
    allow_degraded_routing: bool,
    ping_timeout: Duration,
}

impl Dispatcher {
    pub fn new(
        queue: Arc<dyn JobQueue>,
        jobs: Arc<dyn JobRepository>,
        executor: Arc<JobExecutor>,
        allow_degraded_routing: bool,
        ping_timeout: Duration,
    ) -> Self {
        Self {
            queue,
            jobs,
            executor,
            allow_degraded_routing,
            ping_timeout,
        }
    }

    /// Routing decision for a job's language.
    pub async fn route(&self, language: &str) -> Route {
        let lang = normalize_language(language);

        match classify(&lang) {
            LanguageClass::Standard => Route::InProcessFallback,
            LanguageClass::HighResource => {
                if self.queue.ping(self.ping_timeout).await {
                    Route::DistributedQueue
                } else if self.allow_degraded_routing {
                    tracing::warn!(
                        language = %lang,
                        "Broker unavailable, degrading high-resource job to in-process execution"
                    );
                    Route::InProcessFallback
                } else {
                    Route::Reject
                }
            }
        }
    }

    /// Dispatch an admitted job along its route.
    ///
    /// Returns the job as the caller should report it: still `queued`
    /// for accepted dispatches, or already `failed` when the dispatch
    /// was rejected or enqueueing broke.
    pub async fn dispatch(&self, job: &Job) -> AppResult<Job> {
        let route = self.route(&job.language).await;

        tracing::info!(
            job_id = %job.id,
            language = %job.language,
            route = ?route,
            "Dispatch decision"
        );

        match route {
            Route::DistributedQueue => match self.queue.enqueue(job.id, job.priority).await {
                Ok(()) => Ok(job.clone()),
                Err(e) => {
                    tracing::error!(job_id = %job.id, error = %e, "Enqueue failed");
                    self.jobs
                        .transition(job.id, JobTransition::failed(format!("queueing failed: {e}")))
                        .await
                }
            },
            Route::InProcessFallback => {
                // Off the request path so the caller returns immediately
                let executor = self.executor.clone();
                let job_id = job.id;
                tokio::spawn(async move {
                    executor.run(job_id).await;
                });
                Ok(job.clone())
            }
            Route::Reject => {
                self.jobs
                    .transition(
                        job.id,
                        JobTransition::failed(
                            "distributed queue broker unavailable; high-fidelity synthesis cannot run",
                        ),
                    )
                    .await
            }
        }
    }
}
