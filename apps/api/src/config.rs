use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub redis_url: String,
    pub history_ttl_secs: Option<u64>,
    pub s3_bucket: String,
    pub s3_endpoint: Option<String>,
    pub aws_region: String,
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub aws_kms_id: String,
    pub dynamo_table: String,
    pub anthropic_api_key: String,
    pub openai_api_key: String,
    pub kakao: KakaoConfig,
    pub prompts: PromptOverrides,
    pub port: u16,
    pub rust_log: String,
}

#[derive(Debug, Clone)]
pub struct KakaoConfig {
    pub client_key: String,
    pub secret_key: Option<String>,
    pub redirect_uri: String,
    pub scope: String,
    /// Frontend base URL the OAuth callback redirects back to.
    pub frontend_url: String,
}

/// System prompts may be replaced per deployment without a rebuild.
#[derive(Debug, Clone, Default)]
pub struct PromptOverrides {
    pub coverletter: Option<String>,
    pub chat: Option<String>,
    pub report: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            redis_url: require_env("REDIS_URL")?,
            history_ttl_secs: optional_env("HISTORY_TTL_SECS")
                .map(|v| v.parse::<u64>())
                .transpose()
                .context("HISTORY_TTL_SECS must be a number of seconds")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: optional_env("S3_ENDPOINT"),
            aws_region: require_env("AWS_REGION")?,
            aws_access_key_id: optional_env("AWS_ACCESS_KEY_ID"),
            aws_secret_access_key: optional_env("AWS_SECRET_ACCESS_KEY"),
            aws_kms_id: require_env("AWS_KMS_ID")?,
            dynamo_table: optional_env("DYNAMO_TABLE")
                .unwrap_or_else(|| "ITM-PRD-DYN-TBL".to_string()),
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            openai_api_key: require_env("OPENAI_API_KEY")?,
            kakao: KakaoConfig {
                client_key: require_env("KAKAO_CLIENT_KEY")?,
                secret_key: optional_env("KAKAO_SECRET_KEY"),
                redirect_uri: require_env("KAKAO_REDIRECT_URI")?,
                scope: optional_env("KAKAO_SCOPE")
                    .unwrap_or_else(|| "account_email profile_nickname".to_string()),
                frontend_url: require_env("FRONTEND_URL")?,
            },
            prompts: PromptOverrides {
                coverletter: optional_env("SYSTEM_COVERLETTER"),
                chat: optional_env("SYSTEM_CHAT"),
                report: optional_env("SYSTEM_REPORT"),
            },
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Treats an empty value the same as an unset one.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
