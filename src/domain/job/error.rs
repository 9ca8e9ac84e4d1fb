use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum JobServiceError {
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("text too large: {0}")]
    TooLarge(String),
    #[error("insufficient quota: {0}")]
    InsufficientQuota(String),
    #[error("job not found")]
    NotFound,
    #[error("dependency error: {0}")]
    Dependency(String),
}

impl From<AppError> for JobServiceError {
    fn from(err: AppError) -> Self {
        JobServiceError::Dependency(err.to_string())
    }
}

impl From<JobServiceError> for AppError {
    fn from(err: JobServiceError) -> Self {
        match err {
            JobServiceError::Validation(msg) => AppError::BadRequest(msg),
            JobServiceError::TooLarge(msg) => AppError::PayloadTooLarge(msg),
            JobServiceError::InsufficientQuota(msg) => AppError::InsufficientQuota(msg),
            JobServiceError::NotFound => AppError::NotFound("job not found".to_string()),
            JobServiceError::Dependency(msg) => AppError::ExternalService(msg),
        }
    }
}
