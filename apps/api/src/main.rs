mod auth;
mod config;
mod db;
mod documents;
mod errors;
mod interview;
mod llm_client;
mod models;
mod records;
mod routes;
mod speech;
mod state;
mod storage;
#[cfg(test)]
mod testing;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::kakao::KakaoClient;
use crate::config::Config;
use crate::db::{build_s3_client, connect_redis, load_aws_config};
use crate::interview::history::RedisHistoryStore;
use crate::interview::prompts::SystemPrompts;
use crate::llm_client::LlmClient;
use crate::records::crypto::KmsPhoneCipher;
use crate::records::store::DynamoRecordStore;
use crate::routes::build_router;
use crate::speech::stt::WhisperClient;
use crate::speech::tts::PollySynthesizer;
use crate::state::AppState;
use crate::storage::S3ObjectStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting coach API v{}", env!("CARGO_PKG_VERSION"));

    // Interview history
    let redis = connect_redis(&config.redis_url).await?;
    let history = RedisHistoryStore::new(redis, config.history_ttl_secs);

    // AWS clients
    let aws = load_aws_config(&config).await;
    let s3 = build_s3_client(&aws, config.s3_endpoint.as_deref());
    let dynamo = aws_sdk_dynamodb::Client::new(&aws);
    let kms = aws_sdk_kms::Client::new(&aws);
    let polly = aws_sdk_polly::Client::new(&aws);
    info!("AWS clients initialized (region: {})", config.aws_region);

    // Hosted models
    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);
    let transcriber = WhisperClient::new(config.openai_api_key.clone())?;
    let identity = KakaoClient::new(config.kakao.clone())?;

    let prompts = SystemPrompts::new(&config.prompts);

    let state = AppState {
        llm: Arc::new(llm),
        objects: Arc::new(S3ObjectStore::new(s3)),
        history: Arc::new(history),
        records: Arc::new(DynamoRecordStore::new(dynamo, config.dynamo_table.clone())),
        phone_cipher: Arc::new(KmsPhoneCipher::new(kms, config.aws_kms_id.clone())),
        transcriber: Arc::new(transcriber),
        synthesizer: Arc::new(PollySynthesizer::new(polly)),
        identity: Arc::new(identity),
        prompts: Arc::new(prompts),
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
