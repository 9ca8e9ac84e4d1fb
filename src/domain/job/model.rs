use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "text")]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Legal transitions: queued -> processing -> {completed|failed},
    /// plus queued -> failed when dispatch is rejected. Terminal states
    /// are final.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Queued, JobStatus::Processing)
                | (JobStatus::Queued, JobStatus::Failed)
                | (JobStatus::Processing, JobStatus::Completed)
                | (JobStatus::Processing, JobStatus::Failed)
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "queued"),
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "text")]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VoiceAge {
    #[default]
    Adult,
    Child,
    Elder,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "text")]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProsodyPreset {
    #[default]
    Neutral,
    Storytelling,
    Calm,
    News,
}

/// One TTS request's unit-of-work record.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Job {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub text: String,
    pub voice_id: String,
    pub language: String,
    pub voice_age: VoiceAge,
    pub prosody_preset: ProsodyPreset,
    pub speaker_reference: Option<String>,
    pub status: JobStatus,
    pub priority: i32,
    /// Language-weighted character cost, frozen at admission.
    pub weighted_cost: i64,
    pub audio_url: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    /// First 50 characters of the text for display in listings.
    pub fn text_snippet(&self) -> String {
        let chars: Vec<char> = self.text.chars().collect();
        if chars.len() > 50 {
            let head: String = chars[..50].iter().collect();
            format!("{head}...")
        } else {
            self.text.clone()
        }
    }

    /// Apply a lifecycle transition, enforcing the state machine.
    ///
    /// Used by every job store implementation so the rules live in one
    /// place: no transition out of a terminal state, completed jobs
    /// carry a URL, failed jobs carry a non-empty message.
    pub fn with_transition(
        &self,
        transition: &JobTransition,
        now: DateTime<Utc>,
    ) -> Result<Job, AppError> {
        let target = transition.target();
        if !self.status.can_transition_to(target) {
            return Err(AppError::Conflict(format!(
                "illegal job transition {} -> {}",
                self.status, target
            )));
        }

        let mut job = self.clone();
        job.status = target;
        match transition {
            JobTransition::Processing => {
                job.started_at = Some(now);
            }
            JobTransition::Completed { audio_url } => {
                job.audio_url = Some(audio_url.clone());
                job.completed_at = Some(now);
            }
            JobTransition::Failed { message } => {
                job.error_message = Some(message.clone());
                job.completed_at = Some(now);
            }
        }
        Ok(job)
    }
}

/// Input for creating a job at admission time.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub owner_id: Uuid,
    pub text: String,
    pub voice_id: String,
    pub language: String,
    pub voice_age: VoiceAge,
    pub prosody_preset: ProsodyPreset,
    pub speaker_reference: Option<String>,
    pub priority: i32,
    pub weighted_cost: i64,
}

/// A lifecycle transition together with its terminal outcome data.
#[derive(Debug, Clone)]
pub enum JobTransition {
    Processing,
    Completed { audio_url: String },
    Failed { message: String },
}

impl JobTransition {
    /// Failure transition with a guaranteed non-empty message.
    pub fn failed(message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            "unknown error".to_string()
        } else {
            message
        };
        JobTransition::Failed { message }
    }

    pub fn target(&self) -> JobStatus {
        match self {
            JobTransition::Processing => JobStatus::Processing,
            JobTransition::Completed { .. } => JobStatus::Completed,
            JobTransition::Failed { .. } => JobStatus::Failed,
        }
    }
}
