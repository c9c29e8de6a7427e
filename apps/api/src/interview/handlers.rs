//! Axum route handlers for the interview question flow.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::interview::conversation::{
    load_transcript, render_transcript, Conversation, ANSWER_PREFIX, MAX_QUESTIONS,
};
use crate::interview::history::HistoryField;
use crate::interview::prompts::coverletter_prompt;
use crate::interview::report::InterviewReport;
use crate::llm_client::{parse_json, ChatMessage, DEFAULT_MAX_TOKENS};
use crate::state::AppState;
use crate::storage::fetch_document_text;

/// Sent back when the model's reply could not be used as a question.
pub const NO_MESSAGES: &str = "No messages";
/// Sent back when the model's reply could not be used as a report.
pub const NO_ANSWER: &str = "noanswer";
const REPORT_MAX_TOKENS: u32 = 10_000;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CoverletterRequest {
    pub coverletter_url: String,
    #[serde(default)]
    pub position: String,
    pub itv_no: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub answer_url: String,
    pub itv_no: String,
    pub question_number: u32,
}

#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    pub itv_no: String,
    pub question_number: u32,
}

#[derive(Debug, Deserialize)]
pub struct ChatbotRequest {
    #[serde(default)]
    pub text_content: String,
}

#[derive(Debug, Deserialize)]
pub struct SummarizeRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct QuestionResponse {
    pub response: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ReportResponse {
    Report(InterviewReport),
    Unavailable { response: &'static str },
}

#[derive(Debug, Serialize)]
pub struct ChatbotResponse {
    pub response: String,
    pub stop: u8,
}

#[derive(Debug, Serialize)]
pub struct SummarizeResponse {
    pub result: String,
}

#[derive(Debug, Deserialize)]
struct QuestionReply {
    question: String,
}

/// Pulls the question out of a model reply, or `None` if it is unusable.
fn extract_question(reply: &str) -> Option<String> {
    match parse_json::<QuestionReply>(reply) {
        Ok(q) if !q.question.trim().is_empty() => Some(q.question.trim().to_string()),
        Ok(_) => {
            warn!("Model returned an empty question");
            None
        }
        Err(e) => {
            warn!("Model reply is not a question object: {e}");
            None
        }
    }
}

fn require_itv_no(itv_no: &str) -> Result<(), AppError> {
    if itv_no.trim().is_empty() {
        return Err(AppError::Validation("itv_no cannot be empty".to_string()));
    }
    Ok(())
}

fn require_question_number(question_number: u32, min: u32) -> Result<(), AppError> {
    if question_number > MAX_QUESTIONS {
        return Err(AppError::Validation(format!(
            "question_number cannot exceed {MAX_QUESTIONS}"
        )));
    }
    if question_number < min {
        return Err(AppError::Validation(format!(
            "question_number must be at least {min}"
        )));
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /question/coverletter
///
/// Parses the cover letter, asks for the opening question and seeds the
/// interview history with `coverletter` and `question-1`.
pub async fn handle_coverletter(
    State(state): State<AppState>,
    Json(request): Json<CoverletterRequest>,
) -> Result<Json<QuestionResponse>, AppError> {
    if request.coverletter_url.trim().is_empty() {
        return Err(AppError::Validation("coverletter_url is missing".to_string()));
    }
    require_itv_no(&request.itv_no)?;

    let text = fetch_document_text(state.objects.as_ref(), &request.coverletter_url).await?;
    let prompt = coverletter_prompt(&text, &request.position);

    let reply = state
        .llm
        .complete(
            &state.prompts.coverletter,
            &[ChatMessage::user(prompt.as_str())],
            DEFAULT_MAX_TOKENS,
        )
        .await?;

    let Some(question) = extract_question(&reply) else {
        return Ok(Json(QuestionResponse {
            response: NO_MESSAGES.to_string(),
        }));
    };

    state
        .history
        .set(&request.itv_no, HistoryField::Coverletter, &prompt)
        .await?;
    state
        .history
        .set(&request.itv_no, HistoryField::Question(1), &question)
        .await?;

    info!("Interview {} started", request.itv_no);
    Ok(Json(QuestionResponse { response: question }))
}

/// POST /question/chat
///
/// Records the answer to question `n - 1`, replays the whole interview and
/// asks for question `n`.
pub async fn handle_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<QuestionResponse>, AppError> {
    require_itv_no(&request.itv_no)?;
    // Question 1 comes from /question/coverletter.
    require_question_number(request.question_number, 2)?;
    let answered = request.question_number - 1;

    let answer = fetch_document_text(state.objects.as_ref(), &request.answer_url).await?;
    state
        .history
        .set(&request.itv_no, HistoryField::Answer(answered), &answer)
        .await?;

    let conversation = Conversation::load(state.history.as_ref(), &request.itv_no, answered).await?;
    let reply = state
        .llm
        .complete(
            &state.prompts.chat,
            &conversation.messages(),
            DEFAULT_MAX_TOKENS,
        )
        .await?;

    let Some(question) = extract_question(&reply) else {
        return Ok(Json(QuestionResponse {
            response: NO_MESSAGES.to_string(),
        }));
    };

    state
        .history
        .set(
            &request.itv_no,
            HistoryField::Question(request.question_number),
            &question,
        )
        .await?;

    info!(
        "Interview {} asked question {}",
        request.itv_no, request.question_number
    );
    Ok(Json(QuestionResponse { response: question }))
}

/// POST /question/report
///
/// Evaluates questions `1..=question_number` and stores the report.
pub async fn handle_report(
    State(state): State<AppState>,
    Json(request): Json<ReportRequest>,
) -> Result<Json<ReportResponse>, AppError> {
    require_itv_no(&request.itv_no)?;
    require_question_number(request.question_number, 1)?;

    let pairs = load_transcript(
        state.history.as_ref(),
        &request.itv_no,
        request.question_number,
    )
    .await?;
    if pairs.is_empty() {
        return Err(AppError::Conflict(format!(
            "interview {} has no questions to evaluate",
            request.itv_no
        )));
    }

    let reply = state
        .llm
        .complete(
            &state.prompts.report,
            &[ChatMessage::user(render_transcript(&pairs))],
            REPORT_MAX_TOKENS,
        )
        .await?;

    let report = match InterviewReport::from_llm_reply(&reply) {
        Ok(report) => report,
        Err(e) => {
            warn!("Report for {} unusable: {e}", request.itv_no);
            return Ok(Json(ReportResponse::Unavailable {
                response: NO_ANSWER,
            }));
        }
    };

    // The serialized form of a plain struct cannot fail.
    let stored = serde_json::to_string(&report).unwrap_or_default();
    state
        .history
        .set(&request.itv_no, HistoryField::Report, &stored)
        .await?;

    info!(
        "Interview {} report generated (score {})",
        request.itv_no, report.overall_score
    );
    Ok(Json(ReportResponse::Report(report)))
}

/// POST /question/chatbot
///
/// Free-form coaching chat. `stop` is 1 once the coach ends the session.
pub async fn handle_chatbot(
    State(state): State<AppState>,
    Json(request): Json<ChatbotRequest>,
) -> Result<Json<ChatbotResponse>, AppError> {
    if request.text_content.trim().is_empty() {
        return Err(AppError::Validation("text_content is missing".to_string()));
    }

    let prompt = format!("{ANSWER_PREFIX}{}", request.text_content.replace('\n', " "));
    let reply = state
        .llm
        .complete(
            &state.prompts.chatbot,
            &[ChatMessage::user(prompt)],
            DEFAULT_MAX_TOKENS,
        )
        .await?;

    let stop = u8::from(reply.contains("STOP"));
    Ok(Json(ChatbotResponse {
        response: reply.trim().to_string(),
        stop,
    }))
}

/// POST /analyze/summarize
pub async fn handle_summarize(
    State(state): State<AppState>,
    Json(request): Json<SummarizeRequest>,
) -> Result<Json<SummarizeResponse>, AppError> {
    let text = request.text.replace('\n', " ");
    if text.trim().is_empty() {
        return Err(AppError::Validation("text cannot be empty".to_string()));
    }

    let reply = state
        .llm
        .complete(
            &state.prompts.summarize,
            &[ChatMessage::user(text)],
            DEFAULT_MAX_TOKENS,
        )
        .await?;

    Ok(Json(SummarizeResponse {
        result: reply.trim().to_string(),
    }))
}
