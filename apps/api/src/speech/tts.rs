use async_trait::async_trait;
use aws_sdk_polly::types::{OutputFormat, VoiceId};
use bytes::Bytes;
use tracing::debug;

use super::{SpeechError, SpeechSynthesizer};

/// AWS Polly, Korean female voice.
pub struct PollySynthesizer {
    client: aws_sdk_polly::Client,
}

impl PollySynthesizer {
    pub fn new(client: aws_sdk_polly::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SpeechSynthesizer for PollySynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Bytes, SpeechError> {
        let output = self
            .client
            .synthesize_speech()
            .text(text)
            .output_format(OutputFormat::Mp3)
            .voice_id(VoiceId::Seoyeon)
            .send()
            .await
            .map_err(|e| SpeechError::Synthesis(e.into_service_error().to_string()))?;

        let audio = output
            .audio_stream
            .collect()
            .await
            .map_err(|e| SpeechError::Synthesis(format!("audio stream read failed: {e}")))?
            .into_bytes();

        if audio.is_empty() {
            return Err(SpeechError::EmptyOutput);
        }
        debug!("Synthesized {} bytes of audio", audio.len());
        Ok(audio)
    }
}
