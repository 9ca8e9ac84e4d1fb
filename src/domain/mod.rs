pub mod job;
pub mod quota;
pub mod tts;
