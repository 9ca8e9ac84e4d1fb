use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        job::{Job, JobService, JobStatus, ProsodyPreset, TtsJobRequest, VoiceAge},
        quota::QuotaLedger,
        tts::{voices, Voice},
    },
    error::{AppError, AppResult},
    infrastructure::{auth::AuthUser, repositories::UsageRepository},
};

/// Request for POST /api/tts/generate
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub text: String,
    pub voice_id: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub voice_age: VoiceAge,
    #[serde(default)]
    pub prosody_preset: ProsodyPreset,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker_reference: Option<String>,
}

fn default_language() -> String {
    "en".to_string()
}

/// Summary row for listings and the 202 accepted response
#[derive(Debug, Serialize, Deserialize)]
pub struct JobResponse {
    pub job_id: Uuid,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub text_snippet: String,
}

impl JobResponse {
    fn from_job(job: &Job) -> Self {
        Self {
            job_id: job.id,
            status: job.status,
            audio_url: job.audio_url.clone(),
            created_at: job.created_at,
            text_snippet: job.text_snippet(),
        }
    }
}

/// Full job view for polling GET /api/tts/jobs/:id
#[derive(Debug, Serialize, Deserialize)]
pub struct JobDetail {
    pub job_id: Uuid,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub text: String,
    pub language: String,
    pub characters_charged: i64,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

/// Response for GET /api/usage
#[derive(Debug, Serialize, Deserialize)]
pub struct UsageResponse {
    pub characters_used_today: i64,
    pub characters_used_month: i64,
    pub requests_today: i64,
    pub credits_remaining: i64,
    pub credits_total: i64,
    pub plan_tier: String,
    pub quota_resets_at: DateTime<Utc>,
}

pub struct TtsController {
    job_service: Arc<JobService>,
    usage_repo: Arc<dyn UsageRepository>,
    ledger: Arc<QuotaLedger>,
}

impl TtsController {
    pub fn new(
        job_service: Arc<JobService>,
        usage_repo: Arc<dyn UsageRepository>,
        ledger: Arc<QuotaLedger>,
    ) -> Self {
        Self {
            job_service,
            usage_repo,
            ledger,
        }
    }

    /// POST /api/tts/generate - admit a job and return immediately.
    ///
    /// Audio is produced asynchronously; poll the job endpoint for the
    /// result.
    pub async fn generate(
        State(controller): State<Arc<TtsController>>,
        Extension(auth_user): Extension<AuthUser>,
        Json(request): Json<GenerateRequest>,
    ) -> AppResult<(StatusCode, Json<JobResponse>)> {
        let job = controller
            .job_service
            .submit(
                auth_user.user_id,
                TtsJobRequest {
                    text: request.text,
                    voice_id: request.voice_id,
                    language: request.language,
                    voice_age: request.voice_age,
                    prosody_preset: request.prosody_preset,
                    speaker_reference: request.speaker_reference,
                },
            )
            .await
            .map_err(AppError::from)?;

        Ok((StatusCode::ACCEPTED, Json(JobResponse::from_job(&job))))
    }

    /// GET /api/tts/jobs/:id - job status and result for polling.
    pub async fn get_job(
        State(controller): State<Arc<TtsController>>,
        Extension(auth_user): Extension<AuthUser>,
        Path(job_id): Path<Uuid>,
    ) -> AppResult<Json<JobDetail>> {
        let job = controller
            .job_service
            .get(job_id, auth_user.user_id)
            .await
            .map_err(AppError::from)?;

        Ok(Json(JobDetail {
            job_id: job.id,
            status: job.status,
            audio_url: job.audio_url.clone(),
            error_message: job.error_message.clone(),
            text: job.text.clone(),
            language: job.language.clone(),
            characters_charged: job.weighted_cost,
            created_at: job.created_at,
            started_at: job.started_at,
            completed_at: job.completed_at,
        }))
    }

    /// GET /api/tts/history - the caller's jobs, newest first.
    pub async fn history(
        State(controller): State<Arc<TtsController>>,
        Extension(auth_user): Extension<AuthUser>,
        Query(params): Query<HistoryParams>,
    ) -> AppResult<Json<Vec<JobResponse>>> {
        let limit = params.limit.clamp(1, 100);
        let jobs = controller
            .job_service
            .history(auth_user.user_id, limit, params.offset.max(0))
            .await
            .map_err(AppError::from)?;

        Ok(Json(jobs.iter().map(JobResponse::from_job).collect()))
    }

    /// GET /api/tts/voices - the static voice catalog.
    pub async fn list_voices() -> Json<Vec<Voice>> {
        Json(voices::catalog())
    }

    /// GET /api/usage - character spend and remaining allowance.
    pub async fn get_usage(
        State(controller): State<Arc<TtsController>>,
        Extension(auth_user): Extension<AuthUser>,
    ) -> AppResult<Json<UsageResponse>> {
        let now = Utc::now();
        let today_start = day_start(now);
        let month_start = month_start(now);

        let today = controller
            .usage_repo
            .totals_since(auth_user.user_id, today_start)
            .await?;
        let month = controller
            .usage_repo
            .totals_since(auth_user.user_id, month_start)
            .await?;

        // Balance after any lazy reset due now
        let account = controller.ledger.load(auth_user.user_id).await?;

        Ok(Json(UsageResponse {
            characters_used_today: today.characters,
            characters_used_month: month.characters,
            requests_today: today.requests,
            credits_remaining: account.remaining,
            credits_total: account.total,
            plan_tier: account.plan_tier.to_string(),
            quota_resets_at: account.reset_at,
        }))
    }
}

/// Midnight UTC of the given instant's day.
fn day_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Midnight UTC of the first day of the given instant's month.
fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    day_start(now) - Duration::days(now.day0() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_day_start_is_midnight_of_same_day() {
        let now = Utc.with_ymd_and_hms(2026, 8, 25, 14, 30, 59).unwrap();
        assert_eq!(
            day_start(now),
            Utc.with_ymd_and_hms(2026, 8, 25, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_month_start_is_midnight_of_first_day() {
        let now = Utc.with_ymd_and_hms(2026, 8, 25, 14, 30, 59).unwrap();
        assert_eq!(
            month_start(now),
            Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap()
        );

        // Already on the first: day and month start coincide
        let first = Utc.with_ymd_and_hms(2026, 9, 1, 3, 0, 0).unwrap();
        assert_eq!(month_start(first), day_start(first));
    }
}
