//! In-memory stand-ins for every external collaborator, plus helpers that
//! drive the router in tests.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header::CONTENT_TYPE, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use bytes::Bytes;
use serde_json::Value;
use tower::ServiceExt;

use crate::auth::kakao::{IdentityProvider, OAuthError};
use crate::config::{Config, KakaoConfig, PromptOverrides};
use crate::interview::history::{HistoryError, HistoryField, HistoryStore};
use crate::interview::prompts::SystemPrompts;
use crate::llm_client::{ChatMessage, ChatModel, LlmError};
use crate::models::interview::{InterviewInfo, QuestionInfo};
use crate::models::user::UserInfo;
use crate::records::crypto::PhoneCipher;
use crate::records::store::{RecordError, RecordStore};
use crate::routes::build_router;
use crate::speech::{SpeechError, SpeechSynthesizer, Transcriber};
use crate::state::AppState;
use crate::storage::{ObjectStore, S3Location, StorageError};

pub const TEST_BUCKET: &str = "coach-test";
pub const TEST_FRONTEND_URL: &str = "https://coach.test";
pub const FAKE_CIPHER_PREFIX: &str = "enc:";

pub fn test_config() -> Config {
    Config {
        redis_url: "redis://localhost:6379".to_string(),
        history_ttl_secs: None,
        s3_bucket: TEST_BUCKET.to_string(),
        s3_endpoint: None,
        aws_region: "ap-northeast-2".to_string(),
        aws_access_key_id: None,
        aws_secret_access_key: None,
        aws_kms_id: "alias/test".to_string(),
        dynamo_table: "ITM-TEST".to_string(),
        anthropic_api_key: "test".to_string(),
        openai_api_key: "test".to_string(),
        kakao: KakaoConfig {
            client_key: "client".to_string(),
            secret_key: None,
            redirect_uri: "http://localhost:8080/dbr/act/kakao/auth".to_string(),
            scope: "account_email".to_string(),
            frontend_url: TEST_FRONTEND_URL.to_string(),
        },
        prompts: PromptOverrides::default(),
        port: 0,
        rust_log: "debug".to_string(),
    }
}

// ── Object storage ──────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, Bytes>>,
}

impl MemoryObjectStore {
    pub fn insert(&self, url: &str, content: impl Into<Bytes>) {
        self.objects
            .lock()
            .unwrap()
            .insert(url.to_string(), content.into());
    }

    pub fn text(&self, url: &str) -> Option<String> {
        self.objects
            .lock()
            .unwrap()
            .get(url)
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get(&self, location: &S3Location) -> Result<Bytes, StorageError> {
        let url = location.to_string();
        self.objects
            .lock()
            .unwrap()
            .get(&url)
            .cloned()
            .ok_or(StorageError::NotFound(url))
    }

    async fn put(
        &self,
        location: &S3Location,
        body: Bytes,
        _content_type: &str,
    ) -> Result<(), StorageError> {
        self.insert(&location.to_string(), body);
        Ok(())
    }
}

// ── Interview history ───────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryHistoryStore {
    hashes: Mutex<HashMap<String, BTreeMap<String, String>>>,
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn set(
        &self,
        itv_no: &str,
        field: HistoryField,
        value: &str,
    ) -> Result<(), HistoryError> {
        self.hashes
            .lock()
            .unwrap()
            .entry(itv_no.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
        Ok(())
    }

    async fn get(&self, itv_no: &str, field: HistoryField) -> Result<Option<String>, HistoryError> {
        Ok(self
            .hashes
            .lock()
            .unwrap()
            .get(itv_no)
            .and_then(|h| h.get(&field.to_string()).cloned()))
    }

    async fn get_all(&self, itv_no: &str) -> Result<BTreeMap<String, String>, HistoryError> {
        Ok(self
            .hashes
            .lock()
            .unwrap()
            .get(itv_no)
            .cloned()
            .unwrap_or_default())
    }
}

// ── LLM ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub system: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
}

/// Replies with queued texts in order and records every call.
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedModel {
    pub fn push_reply(&self, reply: &str) {
        self.replies.lock().unwrap().push_back(reply.to_string());
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(
        &self,
        system: &str,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        self.calls.lock().unwrap().push(RecordedCall {
            system: system.to_string(),
            messages: messages.to_vec(),
            max_tokens,
        });
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(LlmError::EmptyContent)
    }
}

// ── Speech ──────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeTranscriber {
    transcript: Mutex<String>,
    file_names: Mutex<Vec<String>>,
}

impl FakeTranscriber {
    pub fn set_transcript(&self, text: &str) {
        *self.transcript.lock().unwrap() = text.to_string();
    }

    pub fn file_names(&self) -> Vec<String> {
        self.file_names.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(&self, _audio: Bytes, file_name: &str) -> Result<String, SpeechError> {
        self.file_names.lock().unwrap().push(file_name.to_string());
        Ok(self.transcript.lock().unwrap().clone())
    }
}

pub struct FakeSynthesizer;

#[async_trait]
impl SpeechSynthesizer for FakeSynthesizer {
    async fn synthesize(&self, _text: &str) -> Result<Bytes, SpeechError> {
        Ok(Bytes::from_static(b"ID3-fake-mp3"))
    }
}

// ── Records ─────────────────────────────────────────────────────────────────

#[derive(Default)]
struct RecordTables {
    users: HashMap<String, UserInfo>,
    counts: HashMap<String, u32>,
    interviews: HashMap<String, BTreeMap<String, InterviewInfo>>,
    questions: HashMap<String, BTreeMap<String, QuestionInfo>>,
}

#[derive(Default)]
pub struct MemoryRecordStore {
    tables: Mutex<RecordTables>,
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn put_user(&self, user_id: &str, info: &UserInfo) -> Result<(), RecordError> {
        let mut t = self.tables.lock().unwrap();
        t.users.insert(user_id.to_string(), info.clone());
        t.counts.insert(user_id.to_string(), 0);
        Ok(())
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<UserInfo>, RecordError> {
        Ok(self.tables.lock().unwrap().users.get(user_id).cloned())
    }

    async fn update_user(
        &self,
        user_id: &str,
        fields: &BTreeMap<String, String>,
    ) -> Result<(), RecordError> {
        let mut t = self.tables.lock().unwrap();
        let user = t.users.entry(user_id.to_string()).or_default();
        for (name, value) in fields {
            let slot = match name.as_str() {
                "user_nm" => &mut user.user_nm,
                "user_nicknm" => &mut user.user_nicknm,
                "user_gender" => &mut user.user_gender,
                "user_birthday" => &mut user.user_birthday,
                "user_tel" => &mut user.user_tel,
                _ => continue,
            };
            *slot = value.clone();
        }
        Ok(())
    }

    async fn get_interview_count(&self, user_id: &str) -> Result<Option<u32>, RecordError> {
        Ok(self.tables.lock().unwrap().counts.get(user_id).copied())
    }

    async fn set_interview_count(&self, user_id: &str, count: u32) -> Result<(), RecordError> {
        self.tables
            .lock()
            .unwrap()
            .counts
            .insert(user_id.to_string(), count);
        Ok(())
    }

    async fn put_interview(
        &self,
        user_id: &str,
        itv_no: &str,
        info: &InterviewInfo,
    ) -> Result<(), RecordError> {
        self.tables
            .lock()
            .unwrap()
            .interviews
            .entry(user_id.to_string())
            .or_default()
            .insert(itv_no.to_string(), info.clone());
        Ok(())
    }

    async fn get_interview(
        &self,
        user_id: &str,
        itv_no: &str,
    ) -> Result<Option<InterviewInfo>, RecordError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .interviews
            .get(user_id)
            .and_then(|m| m.get(itv_no).cloned()))
    }

    async fn list_interviews(
        &self,
        user_id: &str,
    ) -> Result<BTreeMap<String, InterviewInfo>, RecordError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .interviews
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn update_feedback(
        &self,
        user_id: &str,
        itv_no: &str,
        qs_cnt: &str,
        fb_url: &str,
    ) -> Result<(), RecordError> {
        let mut t = self.tables.lock().unwrap();
        let info = t
            .interviews
            .entry(user_id.to_string())
            .or_default()
            .entry(itv_no.to_string())
            .or_default();
        info.itv_qs_cnt = qs_cnt.to_string();
        info.itv_fb_url = fb_url.to_string();
        Ok(())
    }

    async fn put_question(
        &self,
        itv_no: &str,
        qs_no: &str,
        question: &QuestionInfo,
    ) -> Result<(), RecordError> {
        self.tables
            .lock()
            .unwrap()
            .questions
            .entry(itv_no.to_string())
            .or_default()
            .insert(qs_no.to_string(), question.clone());
        Ok(())
    }

    async fn list_questions(
        &self,
        itv_no: &str,
    ) -> Result<BTreeMap<String, QuestionInfo>, RecordError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .questions
            .get(itv_no)
            .cloned()
            .unwrap_or_default())
    }
}

/// Reversible prefix "encryption"; unprefixed values decrypt to themselves.
pub struct FakeCipher;

#[async_trait]
impl PhoneCipher for FakeCipher {
    async fn encrypt(&self, plain: &str) -> Result<String, RecordError> {
        Ok(format!("{FAKE_CIPHER_PREFIX}{plain}"))
    }

    async fn decrypt(&self, stored: &str) -> Result<String, RecordError> {
        Ok(stored
            .strip_prefix(FAKE_CIPHER_PREFIX)
            .unwrap_or(stored)
            .to_string())
    }
}

// ── OAuth ───────────────────────────────────────────────────────────────────

pub struct FakeIdentity {
    email: Mutex<Option<String>>,
    reject_unlink: AtomicBool,
    unlinked: Mutex<Vec<String>>,
}

impl Default for FakeIdentity {
    fn default() -> Self {
        Self {
            email: Mutex::new(Some("user@kakao.test".to_string())),
            reject_unlink: AtomicBool::new(false),
            unlinked: Mutex::new(Vec::new()),
        }
    }
}

impl FakeIdentity {
    pub fn set_email(&self, email: Option<&str>) {
        *self.email.lock().unwrap() = email.map(str::to_string);
    }

    pub fn reject_unlink(&self) {
        self.reject_unlink.store(true, Ordering::SeqCst);
    }

    pub fn unlinked(&self) -> Vec<String> {
        self.unlinked.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    fn authorize_url(&self) -> String {
        "https://kauth.test/oauth/authorize?client_id=client".to_string()
    }

    async fn exchange_code(&self, code: &str) -> Result<String, OAuthError> {
        Ok(format!("token-for-{code}"))
    }

    async fn fetch_email(&self, _access_token: &str) -> Result<Option<String>, OAuthError> {
        Ok(self.email.lock().unwrap().clone())
    }

    async fn unlink(&self, access_token: &str) -> Result<(), OAuthError> {
        if self.reject_unlink.load(Ordering::SeqCst) {
            return Err(OAuthError::Kakao {
                status: 401,
                message: "this access token does not exist".to_string(),
            });
        }
        self.unlinked.lock().unwrap().push(access_token.to_string());
        Ok(())
    }
}

// ── Harness ─────────────────────────────────────────────────────────────────

/// Every fake behind the router, kept reachable for assertions.
pub struct TestHarness {
    pub llm: Arc<ScriptedModel>,
    pub objects: Arc<MemoryObjectStore>,
    pub history: Arc<MemoryHistoryStore>,
    pub records: Arc<MemoryRecordStore>,
    pub transcriber: Arc<FakeTranscriber>,
    pub identity: Arc<FakeIdentity>,
    pub prompts: Arc<SystemPrompts>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self {
            llm: Arc::default(),
            objects: Arc::default(),
            history: Arc::default(),
            records: Arc::default(),
            transcriber: Arc::default(),
            identity: Arc::default(),
            prompts: Arc::new(SystemPrompts::default()),
        }
    }

    pub fn state(&self) -> AppState {
        AppState {
            llm: self.llm.clone(),
            objects: self.objects.clone(),
            history: self.history.clone(),
            records: self.records.clone(),
            phone_cipher: Arc::new(FakeCipher),
            transcriber: self.transcriber.clone(),
            synthesizer: Arc::new(FakeSynthesizer),
            identity: self.identity.clone(),
            prompts: self.prompts.clone(),
            config: Arc::new(test_config()),
        }
    }

    pub fn router(&self) -> Router {
        build_router(self.state())
    }
}

async fn body_json(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

pub async fn send_json(app: Router, method: Method, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    body_json(app.oneshot(request).await.unwrap()).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send_json(app, Method::POST, uri, body).await
}

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    body_json(get(app, uri).await).await
}
