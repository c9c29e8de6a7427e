pub mod health;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::auth::handlers as auth;
use crate::interview::handlers as interview;
use crate::records::handlers as records;
use crate::speech::handlers as speech;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Interview engine
        .route("/question/coverletter", post(interview::handle_coverletter))
        .route("/question/chat", post(interview::handle_chat))
        .route("/question/report", post(interview::handle_report))
        .route("/question/chatbot", post(interview::handle_chatbot))
        .route("/analyze/summarize", post(interview::handle_summarize))
        // Speech
        .route("/speech/stt", post(speech::handle_stt))
        .route("/speech/tts", post(speech::handle_tts))
        // Record writes
        .route("/dbw/create_user", post(records::handle_create_user))
        .route("/dbw/mod_user", patch(records::handle_update_user))
        .route("/dbw/new_itv", post(records::handle_new_interview))
        .route("/dbw/new_qs", post(records::handle_new_question))
        .route("/dbw/update_fb", patch(records::handle_update_feedback))
        // Record reads
        .route("/dbr/get_user/:user_id", get(records::handle_get_user))
        .route("/dbr/get_tel/:user_id", get(records::handle_get_tel))
        .route(
            "/dbr/get_newitvcnt/:user_id",
            get(records::handle_get_interview_count),
        )
        .route("/dbr/get_itv/:user_id", get(records::handle_list_interviews))
        .route(
            "/dbr/get_itv/:user_id/:itv_no",
            get(records::handle_get_interview),
        )
        // Kakao OAuth
        .route("/dbr/act/kakao", get(auth::handle_login))
        .route("/dbr/act/kakao/auth", get(auth::handle_callback))
        .route("/dbr/act/kakao/logout", post(auth::handle_logout))
        .route("/dbr/act/kakao/kill/:token", get(auth::handle_kill))
        .with_state(state)
}
