use super::{AudioPayload, SynthesisSpec, Synthesizer};
use async_trait::async_trait;
use aws_sdk_polly::{
    types::{Engine, OutputFormat, VoiceId},
    Client as PollyClient,
};
use std::sync::Arc;

/// AWS Polly accepts up to 3000 characters per request
const MAX_CHUNK_CHARS: usize = 3000;

/// Standard-language engine backed by AWS Polly (neural, MP3 output).
pub struct PollySynthesizer {
    polly_client: Arc<PollyClient>,
}

impl PollySynthesizer {
    pub fn new(polly_client: Arc<PollyClient>) -> Self {
        Self { polly_client }
    }
}

#[async_trait]
impl Synthesizer for PollySynthesizer {
    async fn synthesize(&self, text: &str, spec: &SynthesisSpec) -> Result<AudioPayload, String> {
        let voice_id = VoiceId::from(spec.voice_id.as_str());
        let engine = Engine::Neural;

        tracing::info!(
            language = %spec.language,
            voice_id = ?voice_id,
            engine = ?engine,
            output_format = "Mp3",
            text_length = text.len(),
            "Calling AWS Polly synthesize_speech"
        );

        let voice_id_for_error = voice_id.clone();

        let result = self
            .polly_client
            .synthesize_speech()
            .text(text)
            .voice_id(voice_id)
            .output_format(OutputFormat::Mp3)
            .engine(engine.clone())
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = ?e,
                    voice_id = ?voice_id_for_error,
                    engine = ?engine,
                    text_length = text.len(),
                    "AWS Polly synthesize_speech failed"
                );
                format!("AWS Polly error: {e:?}")
            })?;

        let audio_stream = result.audio_stream.collect().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to collect audio stream from Polly response");
            format!("failed to read audio stream: {e}")
        })?;

        let audio_bytes = audio_stream.into_bytes().to_vec();
        tracing::debug!(
            audio_size = audio_bytes.len(),
            "Audio stream collected successfully"
        );

        // MP3 frames are self-delimiting, so chunk files concatenate
        Ok(AudioPayload::Mp3(audio_bytes))
    }

    fn max_chunk_chars(&self) -> usize {
        MAX_CHUNK_CHARS
    }

    fn audio_format(&self) -> &'static str {
        "mp3"
    }

    fn name(&self) -> &'static str {
        "polly"
    }
}
