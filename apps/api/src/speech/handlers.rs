use std::time::Instant;

use axum::{extract::State, http::StatusCode, Json};
use bytes::Bytes;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::models::string_or_number;
use crate::state::AppState;
use crate::storage::S3Location;

#[derive(Debug, Deserialize)]
pub struct SttRequest {
    pub user_uuid: String,
    #[serde(deserialize_with = "string_or_number")]
    pub itv_cnt: String,
    pub file_path: String,
}

#[derive(Debug, Deserialize)]
pub struct TtsRequest {
    pub user_id: String,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct SpeechFileResponse {
    pub s3_file_path: String,
}

/// Object key of the transcript for an answer recording.
pub fn transcript_key(file_path: &str, itv_cnt: &str) -> String {
    format!("{file_path}/{itv_cnt}/text.txt")
}

/// Name the recording is uploaded under: `{user_uuid}{itv_cnt}` with the
/// extension of `file_path`, or `.mp3` when it has none.
pub fn upload_name(user_uuid: &str, itv_cnt: &str, file_path: &str) -> String {
    let last = file_path.rsplit('/').next().unwrap_or_default();
    let ext = last
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| "mp3".to_string());
    format!("{user_uuid}{itv_cnt}.{ext}")
}

/// POST /speech/stt
///
/// Transcribes `file_path` from the configured bucket and stores the text
/// next to it.
pub async fn handle_stt(
    State(state): State<AppState>,
    Json(request): Json<SttRequest>,
) -> Result<Json<SpeechFileResponse>, AppError> {
    let file_path = request.file_path.trim().trim_start_matches('/');
    if file_path.is_empty() {
        return Err(AppError::Validation("file_path cannot be empty".to_string()));
    }

    let started = Instant::now();
    let audio = state
        .objects
        .get(&S3Location::new(&state.config.s3_bucket, file_path))
        .await?;

    let file_name = upload_name(&request.user_uuid, &request.itv_cnt, file_path);
    let transcript = state.transcriber.transcribe(audio, &file_name).await?;

    let target = S3Location::new(
        &state.config.s3_bucket,
        transcript_key(file_path, &request.itv_cnt),
    );
    state
        .objects
        .put(&target, Bytes::from(transcript), "text/plain; charset=utf-8")
        .await?;

    info!(
        "STT for {} finished in {:.3}s",
        request.user_uuid,
        started.elapsed().as_secs_f64()
    );
    Ok(Json(SpeechFileResponse {
        s3_file_path: target.to_string(),
    }))
}

/// POST /speech/tts
pub async fn handle_tts(
    State(state): State<AppState>,
    Json(request): Json<TtsRequest>,
) -> Result<(StatusCode, Json<SpeechFileResponse>), AppError> {
    if request.text.trim().is_empty() {
        return Err(AppError::Validation("text cannot be empty".to_string()));
    }
    if request.user_id.trim().is_empty() {
        return Err(AppError::Validation("user_id cannot be empty".to_string()));
    }

    let audio = state.synthesizer.synthesize(&request.text).await?;
    let target = S3Location::new(
        &state.config.s3_bucket,
        format!(
            "tts/{}/{}.mp3",
            request.user_id,
            Utc::now().timestamp_millis()
        ),
    );
    state.objects.put(&target, audio, "audio/mpeg").await?;

    info!("TTS audio for {} stored at {target}", request.user_id);
    Ok((
        StatusCode::CREATED,
        Json(SpeechFileResponse {
            s3_file_path: target.to_string(),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::testing::{post_json, TestHarness, TEST_BUCKET};

    #[test]
    fn test_transcript_key_layout() {
        assert_eq!(
            transcript_key("audio/u1/1718324990967.mp3", "3"),
            "audio/u1/1718324990967.mp3/3/text.txt"
        );
    }

    #[test]
    fn test_upload_name_keeps_recording_extension() {
        assert_eq!(upload_name("abc", "2", "audio/u1/answer.WAV"), "abc2.wav");
        assert_eq!(upload_name("abc", "2", "audio/u1/answer.webm"), "abc2.webm");
        assert_eq!(upload_name("abc", "2", "audio/u1.d/answer"), "abc2.mp3");
        assert_eq!(upload_name("abc", "2", "audio/answer."), "abc2.mp3");
    }

    #[tokio::test]
    async fn test_stt_uploads_wav_under_its_own_extension() {
        let harness = TestHarness::new();
        harness
            .objects
            .insert(&format!("s3://{TEST_BUCKET}/audio/a.wav"), "RIFF-audio");
        harness.transcriber.set_transcript("네, 준비됐습니다.");

        let (status, _) = post_json(
            harness.router(),
            "/speech/stt",
            json!({"user_uuid": "abc", "itv_cnt": "4", "file_path": "audio/a.wav"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(harness.transcriber.file_names(), vec!["abc4.wav".to_string()]);
    }

    #[tokio::test]
    async fn test_stt_stores_transcript_next_to_audio() {
        let harness = TestHarness::new();
        harness
            .objects
            .insert(&format!("s3://{TEST_BUCKET}/audio/a.mp3"), "binary-audio");
        harness.transcriber.set_transcript("저는 백엔드 개발자입니다.");

        let (status, body) = post_json(
            harness.router(),
            "/speech/stt",
            json!({"user_uuid": "abc", "itv_cnt": 2, "file_path": "audio/a.mp3"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let expected = format!("s3://{TEST_BUCKET}/audio/a.mp3/2/text.txt");
        assert_eq!(body["s3_file_path"], expected.as_str());
        assert_eq!(
            harness.objects.text(&expected).as_deref(),
            Some("저는 백엔드 개발자입니다.")
        );
        assert_eq!(harness.transcriber.file_names(), vec!["abc2.mp3".to_string()]);
    }

    #[tokio::test]
    async fn test_stt_missing_audio_is_not_found() {
        let harness = TestHarness::new();
        let (status, _) = post_json(
            harness.router(),
            "/speech/stt",
            json!({"user_uuid": "abc", "itv_cnt": "1", "file_path": "audio/none.mp3"}),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_tts_uploads_audio() {
        let harness = TestHarness::new();
        let (status, body) = post_json(
            harness.router(),
            "/speech/tts",
            json!({"user_id": "kim", "text": "첫 번째 질문입니다."}),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        let path = body["s3_file_path"].as_str().unwrap();
        assert!(path.starts_with(&format!("s3://{TEST_BUCKET}/tts/kim/")));
        assert!(path.ends_with(".mp3"));
        assert!(harness.objects.text(path).is_some());
    }

    #[tokio::test]
    async fn test_tts_rejects_blank_text() {
        let harness = TestHarness::new();
        let (status, _) = post_json(
            harness.router(),
            "/speech/tts",
            json!({"user_id": "kim", "text": "  "}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
