pub mod mock;
pub mod parler;
pub mod polly;
pub mod wav;

pub use mock::MockSynthesizer;
pub use parler::ParlerSynthesizer;
pub use polly::PollySynthesizer;

use crate::domain::job::{Job, ProsodyPreset, VoiceAge};
use crate::domain::tts::LanguageClass;
use async_trait::async_trait;
use std::sync::Arc;

/// Voice selection carried from the job into every synthesis call.
#[derive(Debug, Clone)]
pub struct SynthesisSpec {
    pub voice_id: String,
    pub language: String,
    pub voice_age: VoiceAge,
    pub prosody_preset: ProsodyPreset,
    pub speaker_reference: Option<String>,
}

impl SynthesisSpec {
    pub fn from_job(job: &Job) -> Self {
        Self {
            voice_id: job.voice_id.clone(),
            language: job.language.clone(),
            voice_age: job.voice_age,
            prosody_preset: job.prosody_preset,
            speaker_reference: job.speaker_reference.clone(),
        }
    }
}

/// One chunk's synthesized audio.
///
/// Containered formats cannot simply be byte-concatenated across
/// chunks, so engines hand back audio in the form their format merges
/// in: raw samples for WAV producers (the container is written once,
/// around the whole job), self-contained frames for MP3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioPayload {
    /// Raw 16-bit little-endian mono samples at the given rate.
    Pcm16 { sample_rate: u32, samples: Vec<u8> },
    /// MP3 frames; files of these concatenate byte-wise.
    Mp3(Vec<u8>),
}

/// Accumulates per-chunk payloads, in order, into one playable file.
pub struct AudioAssembler {
    buffer: Option<AudioPayload>,
}

impl AudioAssembler {
    pub fn new() -> Self {
        Self { buffer: None }
    }

    /// Append one chunk's audio. All chunks of a job must share a
    /// format (and, for PCM, a sample rate); engines are picked once
    /// per job so a mismatch means a broken engine.
    pub fn push(&mut self, payload: AudioPayload) -> Result<(), String> {
        match (&mut self.buffer, payload) {
            (slot @ None, payload) => {
                *slot = Some(payload);
                Ok(())
            }
            (
                Some(AudioPayload::Pcm16 { sample_rate, samples }),
                AudioPayload::Pcm16 {
                    sample_rate: chunk_rate,
                    samples: chunk_samples,
                },
            ) => {
                if *sample_rate != chunk_rate {
                    return Err(format!(
                        "sample rate changed mid-job: {sample_rate} then {chunk_rate}"
                    ));
                }
                samples.extend(chunk_samples);
                Ok(())
            }
            (Some(AudioPayload::Mp3(bytes)), AudioPayload::Mp3(chunk_bytes)) => {
                bytes.extend(chunk_bytes);
                Ok(())
            }
            (Some(_), _) => Err("audio format changed mid-job".to_string()),
        }
    }

    /// Finalize into the bytes to upload: raw samples get a single WAV
    /// container, MP3 frames are already a playable file.
    pub fn finish(self) -> Result<Vec<u8>, String> {
        match self.buffer {
            Some(AudioPayload::Pcm16 {
                sample_rate,
                samples,
            }) => Ok(wav::encode_pcm16(sample_rate, &samples)),
            Some(AudioPayload::Mp3(bytes)) => Ok(bytes),
            None => Err("no audio was produced".to_string()),
        }
    }
}

impl Default for AudioAssembler {
    fn default() -> Self {
        Self::new()
    }
}

/// Uniform capability over concrete TTS engines.
///
/// Implementations synthesize one chunk at a time; the executor owns
/// segmentation and concatenation. Engines declare their own bounded
/// context window so the segmenter can size chunks per engine.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesize one chunk of text.
    async fn synthesize(&self, text: &str, spec: &SynthesisSpec) -> Result<AudioPayload, String>;

    /// Largest chunk (in characters) this engine accepts.
    fn max_chunk_chars(&self) -> usize;

    /// File extension of the produced audio ("mp3", "wav").
    fn audio_format(&self) -> &'static str;

    fn name(&self) -> &'static str;
}

/// Engine handles by language class, built once at startup and shared
/// by reference across all executions.
pub struct SynthesizerRegistry {
    standard: Arc<dyn Synthesizer>,
    high_resource: Arc<dyn Synthesizer>,
}

impl SynthesizerRegistry {
    pub fn new(standard: Arc<dyn Synthesizer>, high_resource: Arc<dyn Synthesizer>) -> Self {
        Self {
            standard,
            high_resource,
        }
    }

    pub fn for_class(&self, class: LanguageClass) -> Arc<dyn Synthesizer> {
        match class {
            LanguageClass::Standard => self.standard.clone(),
            LanguageClass::HighResource => self.high_resource.clone(),
        }
    }
}
