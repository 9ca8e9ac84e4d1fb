use super::{AudioPayload, SynthesisSpec, Synthesizer};
use async_trait::async_trait;

const MAX_CHUNK_CHARS: usize = 250;
const SAMPLE_RATE: u32 = 22_050;
const TONE_HZ: f32 = 440.0;
/// Samples of audio emitted per input character, so longer chunks yield
/// proportionally longer audio.
const SAMPLES_PER_CHAR: usize = 160;

/// Deterministic test double: always succeeds, emitting a sine tone
/// whose length tracks the input.
#[derive(Debug, Default)]
pub struct MockSynthesizer;

impl MockSynthesizer {
    fn sine_samples(&self, num_samples: usize) -> Vec<u8> {
        let mut samples = Vec::with_capacity(num_samples * 2);
        for i in 0..num_samples {
            let t = i as f32 / SAMPLE_RATE as f32;
            let sample = 0.3 * (2.0 * std::f32::consts::PI * TONE_HZ * t).sin();
            samples.extend_from_slice(&((sample * 32767.0) as i16).to_le_bytes());
        }
        samples
    }
}

#[async_trait]
impl Synthesizer for MockSynthesizer {
    async fn synthesize(&self, text: &str, spec: &SynthesisSpec) -> Result<AudioPayload, String> {
        let num_samples = text.chars().count().max(1) * SAMPLES_PER_CHAR;

        tracing::debug!(
            voice_id = %spec.voice_id,
            language = %spec.language,
            text_length = text.len(),
            num_samples,
            "Mock synthesis"
        );

        Ok(AudioPayload::Pcm16 {
            sample_rate: SAMPLE_RATE,
            samples: self.sine_samples(num_samples),
        })
    }

    fn max_chunk_chars(&self) -> usize {
        MAX_CHUNK_CHARS
    }

    fn audio_format(&self) -> &'static str {
        "wav"
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
