pub mod error;
pub mod model;
pub mod service;

pub use error::JobServiceError;
pub use model::{Job, JobStatus, JobTransition, NewJob, ProsodyPreset, VoiceAge};
pub use service::{AdmissionPolicy, JobService, TtsJobRequest};
