use super::error::JobServiceError;
use super::model::{Job, NewJob, ProsodyPreset, VoiceAge};
use crate::dispatch::Dispatcher;
use crate::domain::quota::QuotaLedger;
use crate::domain::tts::weighted_cost;
use crate::infrastructure::repositories::{JobRepository, UsageRepository};
use std::sync::Arc;
use uuid::Uuid;

/// One incoming TTS request, before admission.
#[derive(Debug, Clone)]
pub struct TtsJobRequest {
    pub text: String,
    pub voice_id: String,
    pub language: String,
    pub voice_age: VoiceAge,
    pub prosody_preset: ProsodyPreset,
    pub speaker_reference: Option<String>,
}

/// Admission policy knobs, read from config once at startup.
#[derive(Debug, Clone)]
pub struct AdmissionPolicy {
    pub max_chars_per_request: usize,
    pub high_cost_language_multiplier: f64,
    pub enable_voice_cloning: bool,
}

/// Owns the job lifecycle: admission (validation, cost, quota
/// authorization), creation, the audit usage record, and handing the
/// accepted job to the dispatcher.
pub struct JobService {
    jobs: Arc<dyn JobRepository>,
    usage: Arc<dyn UsageRepository>,
    ledger: Arc<QuotaLedger>,
    dispatcher: Arc<Dispatcher>,
    policy: AdmissionPolicy,
}

impl JobService {
    pub fn new(
        jobs: Arc<dyn JobRepository>,
        usage: Arc<dyn UsageRepository>,
        ledger: Arc<QuotaLedger>,
        dispatcher: Arc<Dispatcher>,
        policy: AdmissionPolicy,
    ) -> Self {
        Self {
            jobs,
            usage,
            ledger,
            dispatcher,
            policy,
        }
    }

    /// Admit and dispatch one TTS request.
    ///
    /// On success the job exists in `queued` (or already `failed` if
    /// dispatch was rejected) and exactly one usage record has been
    /// written. On any admission error nothing is created or charged.
    pub async fn submit(
        &self,
        owner_id: Uuid,
        request: TtsJobRequest,
    ) -> Result<Job, JobServiceError> {
        let char_count = request.text.chars().count();

        tracing::info!(
            owner_id = %owner_id,
            language = %request.language,
            text_length = char_count,
            "TTS job submitted"
        );

        self.validate(&request, char_count)?;

        // Lazy reset happens inside the ledger load
        let account = self.ledger.load(owner_id).await?;

        if request.speaker_reference.is_some() && !account.plan_tier.allows_voice_cloning() {
            return Err(JobServiceError::Validation(format!(
                "voice cloning is not available on the {} plan",
                account.plan_tier
            )));
        }

        let cost = weighted_cost(
            char_count,
            &request.language,
            self.policy.high_cost_language_multiplier,
        );

        if !account.can_afford(cost) {
            tracing::info!(
                owner_id = %owner_id,
                cost,
                remaining = account.remaining,
                "Admission denied: insufficient quota"
            );
            return Err(JobServiceError::InsufficientQuota(format!(
                "requires {cost} characters, {} remaining; upgrade your plan or wait for the quota reset",
                account.remaining
            )));
        }

        let job = self
            .jobs
            .create(NewJob {
                owner_id,
                text: request.text,
                voice_id: request.voice_id,
                language: request.language,
                voice_age: request.voice_age,
                prosody_preset: request.prosody_preset,
                speaker_reference: request.speaker_reference,
                priority: account.plan_tier.priority(),
                weighted_cost: cost,
            })
            .await?;

        // Audit entry is written at admission, not completion
        self.usage.append(owner_id, job.id, cost).await?;

        let job = self.dispatcher.dispatch(&job).await?;

        tracing::info!(
            job_id = %job.id,
            owner_id = %owner_id,
            status = %job.status,
            weighted_cost = cost,
            priority = job.priority,
            "TTS job admitted"
        );

        Ok(job)
    }

    /// Ownership-scoped lookup. Another owner's job reads as not found
    /// rather than forbidden, to avoid leaking existence.
    pub async fn get(&self, job_id: Uuid, owner_id: Uuid) -> Result<Job, JobServiceError> {
        self.jobs
            .find(job_id, owner_id)
            .await?
            .ok_or(JobServiceError::NotFound)
    }

    /// Paged job history, newest first.
    pub async fn history(
        &self,
        owner_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Job>, JobServiceError> {
        let jobs = self.jobs.list_by_owner(owner_id, limit, offset).await?;
        Ok(jobs)
    }

    fn validate(&self, request: &TtsJobRequest, char_count: usize) -> Result<(), JobServiceError> {
        if request.text.trim().is_empty() {
            return Err(JobServiceError::Validation(
                "text cannot be empty".to_string(),
            ));
        }

        if char_count > self.policy.max_chars_per_request {
            return Err(JobServiceError::TooLarge(format!(
                "text exceeds maximum length of {} characters",
                self.policy.max_chars_per_request
            )));
        }

        if request.voice_id.trim().is_empty() {
            return Err(JobServiceError::Validation(
                "voice_id cannot be empty".to_string(),
            ));
        }

        if request.speaker_reference.is_some() && !self.policy.enable_voice_cloning {
            return Err(JobServiceError::Validation(
                "voice cloning is currently disabled".to_string(),
            ));
        }

        Ok(())
    }
}
