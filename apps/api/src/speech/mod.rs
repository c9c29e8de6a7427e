//! Speech collaborators. Transcription and synthesis stay external; this
//! module only moves bytes between them and object storage.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub mod handlers;
pub mod stt;
pub mod tts;

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transcription API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Speech synthesis failed: {0}")]
    Synthesis(String),

    #[error("Speech service returned no content")]
    EmptyOutput,
}

#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Turns recorded audio into plain text.
    async fn transcribe(&self, audio: Bytes, file_name: &str) -> Result<String, SpeechError>;
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Renders `text` as MP3 audio.
    async fn synthesize(&self, text: &str) -> Result<Bytes, SpeechError>;
}
