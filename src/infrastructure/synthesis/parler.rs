use super::{wav, AudioPayload, SynthesisSpec, Synthesizer};
use async_trait::async_trait;
use serde::Serialize;

/// The Parler model degrades on long inputs; generation is only stable
/// well under its context window.
const MAX_CHUNK_CHARS: usize = 150;

#[derive(Debug, Serialize)]
struct ParlerRequest<'a> {
    text: &'a str,
    voice_id: &'a str,
    language: &'a str,
    voice_age: &'a str,
    prosody_preset: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    speaker_reference: Option<&'a str>,
}

/// High-fidelity Indic engine served by a remote Parler inference
/// server. Used in-process only on the degraded routing path; the
/// distributed worker pool talks to the same server.
pub struct ParlerSynthesizer {
    client: reqwest::Client,
    endpoint: String,
}

impl ParlerSynthesizer {
    pub fn new(endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }
}

#[async_trait]
impl Synthesizer for ParlerSynthesizer {
    async fn synthesize(&self, text: &str, spec: &SynthesisSpec) -> Result<AudioPayload, String> {
        let url = format!("{}/synthesize", self.endpoint.trim_end_matches('/'));

        let voice_age = serde_json::to_value(spec.voice_age)
            .map_err(|e| format!("invalid voice age: {e}"))?;
        let prosody = serde_json::to_value(spec.prosody_preset)
            .map_err(|e| format!("invalid prosody preset: {e}"))?;

        let request = ParlerRequest {
            text,
            voice_id: &spec.voice_id,
            language: &spec.language,
            voice_age: voice_age.as_str().unwrap_or("adult"),
            prosody_preset: prosody.as_str().unwrap_or("neutral"),
            speaker_reference: spec.speaker_reference.as_deref(),
        };

        tracing::info!(
            endpoint = %url,
            language = %spec.language,
            text_length = text.len(),
            "Calling Parler inference server"
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| format!("Parler server unreachable: {e}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                body = %body,
                "Parler inference server returned an error"
            );
            return Err(format!("Parler server error ({status}): {body}"));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| format!("failed to read Parler audio body: {e}"))?;

        // The server responds with a per-chunk WAV file; unwrap it to
        // raw samples so the executor can write one container for the
        // whole job.
        let (sample_rate, samples) = wav::extract_pcm16(&bytes)
            .map_err(|e| format!("Parler returned unusable audio: {e}"))?;

        Ok(AudioPayload::Pcm16 {
            sample_rate,
            samples,
        })
    }

    fn max_chunk_chars(&self) -> usize {
        MAX_CHUNK_CHARS
    }

    fn audio_format(&self) -> &'static str {
        "wav"
    }

    fn name(&self) -> &'static str {
        "indic-parler"
    }
}
