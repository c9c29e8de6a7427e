use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::config::KakaoConfig;

const AUTHORIZE_URL: &str = "https://kauth.kakao.com/oauth/authorize";
const TOKEN_URL: &str = "https://kauth.kakao.com/oauth/token";
const USER_ME_URL: &str = "https://kapi.kakao.com/v2/user/me";
const UNLINK_URL: &str = "https://kapi.kakao.com/v1/user/unlink";

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Kakao returned {status}: {message}")]
    Kakao { status: u16, message: String },

    #[error("Kakao token response carried no access token")]
    MissingToken,
}

/// Login provider used by the OAuth endpoints.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Where the browser is sent to log in.
    fn authorize_url(&self) -> String;

    /// Trades an authorization code for an access token.
    async fn exchange_code(&self, code: &str) -> Result<String, OAuthError>;

    /// Account email, if the user consented to share it.
    async fn fetch_email(&self, access_token: &str) -> Result<Option<String>, OAuthError>;

    /// Revokes the app's link to the account.
    async fn unlink(&self, access_token: &str) -> Result<(), OAuthError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserMe {
    kakao_account: Option<KakaoAccount>,
}

#[derive(Debug, Deserialize)]
struct KakaoAccount {
    email: Option<String>,
}

pub struct KakaoClient {
    client: Client,
    config: KakaoConfig,
}

impl KakaoClient {
    pub fn new(config: KakaoConfig) -> Result<Self, OAuthError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()?,
            config,
        })
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, OAuthError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(OAuthError::Kakao {
        status: status.as_u16(),
        message,
    })
}

pub fn authorize_url(config: &KakaoConfig) -> String {
    format!(
        "{AUTHORIZE_URL}?client_id={}&redirect_uri={}&response_type=code&scope={}",
        urlencoding::encode(&config.client_key),
        urlencoding::encode(&config.redirect_uri),
        urlencoding::encode(&config.scope),
    )
}

#[async_trait]
impl IdentityProvider for KakaoClient {
    fn authorize_url(&self) -> String {
        authorize_url(&self.config)
    }

    async fn exchange_code(&self, code: &str) -> Result<String, OAuthError> {
        let mut params = vec![
            ("grant_type", "authorization_code"),
            ("client_id", self.config.client_key.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("code", code),
        ];
        if let Some(secret) = &self.config.secret_key {
            params.push(("client_secret", secret.as_str()));
        }

        let response = self.client.post(TOKEN_URL).form(&params).send().await?;
        let token: TokenResponse = ensure_success(response).await?.json().await?;
        token.access_token.ok_or(OAuthError::MissingToken)
    }

    async fn fetch_email(&self, access_token: &str) -> Result<Option<String>, OAuthError> {
        let response = self
            .client
            .get(USER_ME_URL)
            .bearer_auth(access_token)
            .send()
            .await?;
        let me: UserMe = ensure_success(response).await?.json().await?;
        Ok(me.kakao_account.and_then(|account| account.email))
    }

    async fn unlink(&self, access_token: &str) -> Result<(), OAuthError> {
        let response = self
            .client
            .post(UNLINK_URL)
            .bearer_auth(access_token)
            .send()
            .await?;
        ensure_success(response).await?;
        debug!("Kakao account unlinked");
        Ok(())
    }
}
