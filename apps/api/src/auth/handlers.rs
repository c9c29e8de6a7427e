use axum::{
    extract::{Path, Query, State},
    http::header::SET_COOKIE,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::errors::AppError;
use crate::state::AppState;

const SESSION_COOKIE: &str = "kakao";

#[derive(Debug, Deserialize)]
pub struct AuthQuery {
    pub code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    pub access_token: String,
}

fn session_cookie(access_token: &str) -> String {
    format!("{SESSION_COOKIE}={access_token}; Path=/; HttpOnly")
}

fn cleared_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; Max-Age=0")
}

/// Frontend landing URL after login. `message` is `new` for accounts that
/// still have to sign up and `main` otherwise.
pub fn landing_url(frontend_url: &str, email: &str, access_token: &str, known: bool) -> String {
    format!(
        "{}/auth?email_id={}&access_token={}&message={}",
        frontend_url.trim_end_matches('/'),
        urlencoding::encode(email),
        urlencoding::encode(access_token),
        if known { "main" } else { "new" }
    )
}

/// GET /dbr/act/kakao
pub async fn handle_login(State(state): State<AppState>) -> Redirect {
    Redirect::to(&state.identity.authorize_url())
}

/// GET /dbr/act/kakao/auth?code=
pub async fn handle_callback(
    State(state): State<AppState>,
    Query(query): Query<AuthQuery>,
) -> Result<Response, AppError> {
    let code = query
        .code
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| AppError::Validation("code is missing".to_string()))?;

    let access_token = state.identity.exchange_code(&code).await?;
    let Some(email) = state.identity.fetch_email(&access_token).await? else {
        return Ok(Json(json!({"error": "Email not available"})).into_response());
    };

    let known = state.records.get_user(&email).await?.is_some();
    info!(
        "Kakao {} for {email}",
        if known { "login" } else { "sign-up" }
    );

    let target = landing_url(
        &state.config.kakao.frontend_url,
        &email,
        &access_token,
        known,
    );
    Ok((
        [(SET_COOKIE, session_cookie(&access_token))],
        Redirect::to(&target),
    )
        .into_response())
}

async fn unlink(state: &AppState, access_token: &str) -> Result<Response, AppError> {
    state.identity.unlink(access_token).await?;
    info!("Kakao logout");
    Ok((
        [(SET_COOKIE, cleared_cookie())],
        Json(json!({"logout": "success"})),
    )
        .into_response())
}

/// POST /dbr/act/kakao/logout
pub async fn handle_logout(
    State(state): State<AppState>,
    Json(request): Json<LogoutRequest>,
) -> Result<Response, AppError> {
    unlink(&state, &request.access_token).await
}

/// GET /dbr/act/kakao/kill/:token
pub async fn handle_kill(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Response, AppError> {
    unlink(&state, &token).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header::LOCATION, StatusCode};

    use crate::auth::kakao::IdentityProvider;
    use crate::records::store::RecordStore;
    use crate::testing::{get, get_json, post_json, TestHarness, TEST_FRONTEND_URL};

    #[test]
    fn test_landing_url_encodes_email() {
        assert_eq!(
            landing_url("https://app.example.com/", "T1@T1.com", "tok", false),
            "https://app.example.com/auth?email_id=T1%40T1.com&access_token=tok&message=new"
        );
    }

    #[tokio::test]
    async fn test_login_redirects_to_provider() {
        let harness = TestHarness::new();
        let response = get(harness.router(), "/dbr/act/kakao").await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()[LOCATION],
            harness.identity.authorize_url()
        );
    }

    #[tokio::test]
    async fn test_callback_for_known_user_goes_to_main() {
        let harness = TestHarness::new();
        harness.identity.set_email(Some("T1@T1.com"));
        harness
            .records
            .put_user("T1@T1.com", &Default::default())
            .await
            .unwrap();

        let response = get(harness.router(), "/dbr/act/kakao/auth?code=abc").await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = response.headers()[LOCATION].to_str().unwrap();
        assert_eq!(
            location,
            format!(
                "{TEST_FRONTEND_URL}/auth?email_id=T1%40T1.com&access_token=token-for-abc&message=main"
            )
        );
        let cookie = response.headers()[SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("kakao=token-for-abc"));
    }

    #[tokio::test]
    async fn test_callback_for_new_user_goes_to_signup() {
        let harness = TestHarness::new();
        harness.identity.set_email(Some("new@user.kr"));

        let response = get(harness.router(), "/dbr/act/kakao/auth?code=xyz").await;
        let location = response.headers()[LOCATION].to_str().unwrap();
        assert!(location.ends_with("&message=new"));
    }

    #[tokio::test]
    async fn test_callback_without_email() {
        let harness = TestHarness::new();
        harness.identity.set_email(None);

        let (status, body) = get_json(harness.router(), "/dbr/act/kakao/auth?code=abc").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"error": "Email not available"}));
    }

    #[tokio::test]
    async fn test_callback_without_code_is_rejected() {
        let harness = TestHarness::new();
        let (status, _) = get_json(harness.router(), "/dbr/act/kakao/auth").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_logout_clears_cookie() {
        let harness = TestHarness::new();
        let (status, body) = post_json(
            harness.router(),
            "/dbr/act/kakao/logout",
            json!({"access_token": "tok"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"logout": "success"}));
        assert_eq!(harness.identity.unlinked(), vec!["tok".to_string()]);
    }

    #[tokio::test]
    async fn test_kill_with_rejected_token_is_bad_gateway() {
        let harness = TestHarness::new();
        harness.identity.reject_unlink();

        let response = get(harness.router(), "/dbr/act/kakao/kill/expired").await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
