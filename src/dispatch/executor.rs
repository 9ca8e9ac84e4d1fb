use crate::domain::job::{Job, JobTransition};
use crate::domain::quota::QuotaLedger;
use crate::domain::tts::{classify, normalize_language, Segmenter};
use crate::infrastructure::repositories::JobRepository;
use crate::infrastructure::storage::BlobStore;
use crate::infrastructure::synthesis::{AudioAssembler, SynthesisSpec, SynthesizerRegistry};
use std::sync::Arc;
use uuid::Uuid;

/// In-process execution of one job: segment, synthesize chunk by chunk
/// in order, upload, and drive the job to exactly one terminal state.
///
/// Quota is committed immediately after the terminal transition,
/// whether the job completed or failed; the audit record was already
/// written at admission.
pub struct JobExecutor {
    jobs: Arc<dyn JobRepository>,
    engines: Arc<SynthesizerRegistry>,
    blobs: Arc<dyn BlobStore>,
    ledger: Arc<QuotaLedger>,
}

impl JobExecutor {
    pub fn new(
        jobs: Arc<dyn JobRepository>,
        engines: Arc<SynthesizerRegistry>,
        blobs: Arc<dyn BlobStore>,
        ledger: Arc<QuotaLedger>,
    ) -> Self {
        Self {
            jobs,
            engines,
            blobs,
            ledger,
        }
    }

    /// Run a job to a terminal state. Never panics or propagates: all
    /// failures are recorded on the job itself and logged.
    pub async fn run(&self, job_id: Uuid) {
        let job = match self.jobs.find_any(job_id).await {
            Ok(Some(job)) => job,
            Ok(None) => {
                tracing::error!(job_id = %job_id, "Executor could not find job");
                return;
            }
            Err(e) => {
                tracing::error!(job_id = %job_id, error = %e, "Executor failed to load job");
                return;
            }
        };

        let job = match self.jobs.transition(job_id, JobTransition::Processing).await {
            Ok(job) => job,
            Err(e) => {
                // Another executor beat us to it, or the job was
                // already terminal; either way this execution stops.
                tracing::warn!(job_id = %job_id, error = %e, "Could not start processing");
                return;
            }
        };

        let start_time = std::time::Instant::now();
        let outcome = self.synthesize_and_upload(&job).await;

        let terminal = match outcome {
            Ok(audio_url) => {
                tracing::info!(
                    job_id = %job_id,
                    latency_ms = start_time.elapsed().as_millis() as u64,
                    audio_url = %audio_url,
                    "Job completed"
                );
                JobTransition::Completed { audio_url }
            }
            Err(message) => {
                tracing::error!(job_id = %job_id, error = %message, "Job failed");
                JobTransition::failed(message)
            }
        };

        if let Err(e) = self.jobs.transition(job_id, terminal).await {
            tracing::error!(job_id = %job_id, error = %e, "Terminal transition failed");
            return;
        }

        // Deduction fires once, after the terminal transition
        if let Err(e) = self.ledger.commit(job.owner_id, job.weighted_cost).await {
            tracing::error!(
                job_id = %job_id,
                owner_id = %job.owner_id,
                error = %e,
                "Quota commit failed"
            );
        }
    }

    /// Segment, synthesize in original order, and upload. Returns the
    /// public audio URL or the first fatal cause.
    async fn synthesize_and_upload(&self, job: &Job) -> Result<String, String> {
        let lang = normalize_language(&job.language);
        let engine = self.engines.for_class(classify(&lang));

        let chunks = Segmenter::new(engine.max_chunk_chars()).segment(&job.text);
        if chunks.is_empty() {
            return Err("no synthesizable text after normalization".to_string());
        }

        tracing::info!(
            job_id = %job.id,
            engine = engine.name(),
            chunk_count = chunks.len(),
            chunk_budget = engine.max_chunk_chars(),
            "Text segmented for synthesis"
        );

        let spec = SynthesisSpec::from_job(job);
        let mut assembler = AudioAssembler::new();

        // Chunks are synthesized and merged strictly in sequence; raw
        // samples get their container written once, after the loop.
        for (index, chunk) in chunks.iter().enumerate() {
            let payload = engine
                .synthesize(chunk, &spec)
                .await
                .map_err(|e| format!("synthesis failed on chunk {index}: {e}"))?;
            assembler
                .push(payload)
                .map_err(|e| format!("chunk {index} could not be merged: {e}"))?;

            tracing::debug!(
                job_id = %job.id,
                chunk_index = index,
                "Chunk synthesized and merged"
            );
        }

        let audio = assembler
            .finish()
            .map_err(|e| format!("audio assembly failed: {e}"))?;

        let key = format!("audio/{}/{}.{}", job.owner_id, job.id, engine.audio_format());
        self.blobs
            .put(&audio, &key)
            .await
            .map_err(|e| format!("audio upload failed: {e}"))
    }
}
