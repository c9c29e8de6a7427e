use std::sync::Arc;

use crate::auth::kakao::IdentityProvider;
use crate::config::Config;
use crate::interview::history::HistoryStore;
use crate::interview::prompts::SystemPrompts;
use crate::llm_client::ChatModel;
use crate::records::crypto::PhoneCipher;
use crate::records::store::RecordStore;
use crate::speech::{SpeechSynthesizer, Transcriber};
use crate::storage::ObjectStore;

/// Shared application state injected into all route handlers via Axum extractors.
/// Every external collaborator sits behind a trait object so tests can swap it.
#[derive(Clone)]
pub struct AppState {
    pub llm: Arc<dyn ChatModel>,
    pub objects: Arc<dyn ObjectStore>,
    /// Redis-backed question/answer history, keyed by `itv_no`.
    pub history: Arc<dyn HistoryStore>,
    pub records: Arc<dyn RecordStore>,
    pub phone_cipher: Arc<dyn PhoneCipher>,
    pub transcriber: Arc<dyn Transcriber>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub identity: Arc<dyn IdentityProvider>,
    pub prompts: Arc<SystemPrompts>,
    pub config: Arc<Config>,
}
