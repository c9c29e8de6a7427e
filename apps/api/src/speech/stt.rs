use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tracing::debug;

use super::{SpeechError, Transcriber};

const TRANSCRIPTIONS_URL: &str = "https://api.openai.com/v1/audio/transcriptions";
const WHISPER_MODEL: &str = "whisper-1";

/// OpenAI Whisper over the audio transcription endpoint.
#[derive(Clone)]
pub struct WhisperClient {
    client: Client,
    api_key: String,
}

impl WhisperClient {
    pub fn new(api_key: String) -> Result<Self, SpeechError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(300))
                .build()?,
            api_key,
        })
    }
}

#[async_trait]
impl Transcriber for WhisperClient {
    async fn transcribe(&self, audio: Bytes, file_name: &str) -> Result<String, SpeechError> {
        let size = audio.len();
        let form = Form::new()
            .text("model", WHISPER_MODEL)
            .text("response_format", "text")
            .part(
                "file",
                Part::bytes(audio.to_vec())
                    .file_name(file_name.to_string())
                    .mime_str(audio_mime(file_name))?,
            );

        let response = self
            .client
            .post(TRANSCRIPTIONS_URL)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(SpeechError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        debug!("Transcribed {size} bytes of {file_name}");
        let transcript = body.trim();
        if transcript.is_empty() {
            return Err(SpeechError::EmptyOutput);
        }
        Ok(transcript.to_string())
    }
}

fn audio_mime(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "wav" => "audio/wav",
        "m4a" => "audio/mp4",
        "webm" => "audio/webm",
        "ogg" => "audio/ogg",
        _ => "audio/mpeg",
    }
}
