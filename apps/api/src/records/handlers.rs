//! `/dbw` (write) and `/dbr` (read) record endpoints.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Local;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::interview::{
    question_key, FeedbackRequest, InterviewDetail, InterviewInfo, InterviewListing,
    InterviewNumbering, NewInterviewRequest, NewQuestionRequest, QuestionInfo,
};
use crate::models::user::{
    CreateUserRequest, UpdateUserRequest, UserHistory, UserInfo, UserProfile,
};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CreateUserResponse {
    pub message: &'static str,
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct UpdatedResponse<T: Serialize> {
    pub status: &'static str,
    pub updated_fields: T,
}

impl<T: Serialize> UpdatedResponse<T> {
    fn success(updated_fields: T) -> Json<Self> {
        Json(Self {
            status: "success",
            updated_fields,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct NewInterviewResponse {
    pub message: &'static str,
    pub new_itv_no: String,
}

#[derive(Debug, Serialize)]
pub struct FeedbackFields {
    pub itv_qs_cnt: String,
    pub itv_fb_url: String,
}

#[derive(Debug, Serialize)]
pub struct PhoneLookup {
    pub user_id: String,
    pub user_info: PhoneInfo,
}

#[derive(Debug, Serialize)]
pub struct PhoneInfo {
    pub user_nm: String,
    pub user_tel: String,
}

#[derive(Debug, Serialize)]
pub struct InterviewCountResponse {
    pub new_itv_cnt: u32,
}

fn require_fields(fields: &[(&str, &String)]) -> Result<(), AppError> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )))
    }
}

async fn load_user(state: &AppState, user_id: &str) -> Result<UserInfo, AppError> {
    state
        .records
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {user_id}")))
}

async fn load_history(state: &AppState, user_id: &str) -> Result<UserHistory, AppError> {
    let user_itv_cnt = state
        .records
        .get_interview_count(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("history of user {user_id}")))?;
    Ok(UserHistory { user_itv_cnt })
}

async fn interview_detail(
    state: &AppState,
    itv_no: &str,
    info: InterviewInfo,
) -> Result<InterviewDetail, AppError> {
    let qs_info = state.records.list_questions(itv_no).await?;
    Ok(InterviewDetail { info, qs_info })
}

// ────────────────────────────────────────────────────────────────────────────
// Writes
// ────────────────────────────────────────────────────────────────────────────

/// POST /dbw/create_user
pub async fn handle_create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<Json<CreateUserResponse>, AppError> {
    require_fields(&[
        ("user_id", &request.user_id),
        ("name", &request.name),
        ("nickname", &request.nickname),
        ("gender", &request.gender),
        ("birthday", &request.birthday),
        ("tel", &request.tel),
    ])?;

    let info = UserInfo {
        user_uuid: Uuid::new_v4().simple().to_string(),
        user_nm: request.name,
        user_nicknm: request.nickname,
        user_gender: request.gender,
        user_birthday: request.birthday,
        user_tel: state.phone_cipher.encrypt(&request.tel).await?,
    };
    state.records.put_user(&request.user_id, &info).await?;

    info!("User {} signed up", request.user_id);
    Ok(Json(CreateUserResponse {
        message: "User added successfully",
        user_id: request.user_id,
    }))
}

/// PATCH /dbw/mod_user
///
/// Writes only the provided fields whose value actually changed.
pub async fn handle_update_user(
    State(state): State<AppState>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<UpdatedResponse<BTreeMap<String, String>>>, AppError> {
    let mut current = load_user(&state, &request.user_id).await?;
    current.user_tel = state.phone_cipher.decrypt(&current.user_tel).await?;

    let mut updated = BTreeMap::new();
    let mut stored = BTreeMap::new();
    for (name, value) in request.requested() {
        let Some(value) = value else { continue };
        if current.attribute(name) == Some(value) {
            continue;
        }
        let at_rest = if name == "user_tel" {
            state.phone_cipher.encrypt(value).await?
        } else {
            value.to_string()
        };
        stored.insert(name.to_string(), at_rest);
        updated.insert(name.to_string(), value.to_string());
    }

    if !stored.is_empty() {
        state.records.update_user(&request.user_id, &stored).await?;
        info!(
            "User {} updated {:?}",
            request.user_id,
            updated.keys().collect::<Vec<_>>()
        );
    }
    Ok(UpdatedResponse::success(updated))
}

/// POST /dbw/new_itv
pub async fn handle_new_interview(
    State(state): State<AppState>,
    Json(request): Json<NewInterviewRequest>,
) -> Result<Json<NewInterviewResponse>, AppError> {
    require_fields(&[("user_id", &request.user_id), ("itv_cate", &request.itv_cate)])?;

    let user = load_user(&state, &request.user_id).await?;
    let count = state
        .records
        .get_interview_count(&request.user_id)
        .await?
        .unwrap_or(0)
        .checked_add(1)
        .ok_or_else(|| {
            AppError::Conflict(format!(
                "interview count for {} cannot grow further",
                request.user_id
            ))
        })?;

    let numbering = InterviewNumbering::new(
        &user.user_uuid,
        &user.user_nicknm,
        &request.itv_cate,
        count,
        Local::now().date_naive(),
    );
    let interview = InterviewInfo {
        itv_sub: numbering.itv_sub,
        itv_date: numbering.itv_date,
        itv_cate: request.itv_cate,
        itv_job: request.itv_job,
        itv_text_url: request.itv_text_url,
        itv_fb_url: String::new(),
        itv_qs_cnt: "0".to_string(),
    };

    state
        .records
        .put_interview(&request.user_id, &numbering.itv_no, &interview)
        .await?;
    state
        .records
        .set_interview_count(&request.user_id, count)
        .await?;

    info!("User {} started interview {}", request.user_id, numbering.itv_no);
    Ok(Json(NewInterviewResponse {
        message: "Update successful",
        new_itv_no: numbering.itv_no,
    }))
}

/// POST /dbw/new_qs
pub async fn handle_new_question(
    State(state): State<AppState>,
    Json(request): Json<NewQuestionRequest>,
) -> Result<Json<UpdatedResponse<QuestionInfo>>, AppError> {
    require_fields(&[("itv_no", &request.itv_no)])?;

    let question = QuestionInfo {
        qs_content: request.qs_content,
        qs_video_url: request.qs_video_url,
        qs_audio_url: request.qs_audio_url,
        qs_text_url: request.qs_text_url,
    };
    state
        .records
        .put_question(&request.itv_no, &question_key(request.qs_no), &question)
        .await?;

    info!(
        "User {} recorded question {} of {}",
        request.user_id, request.qs_no, request.itv_no
    );
    Ok(UpdatedResponse::success(question))
}

/// PATCH /dbw/update_fb
pub async fn handle_update_feedback(
    State(state): State<AppState>,
    Json(request): Json<FeedbackRequest>,
) -> Result<Json<UpdatedResponse<FeedbackFields>>, AppError> {
    if state
        .records
        .get_interview(&request.user_id, &request.itv_no)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound(format!("interview {}", request.itv_no)));
    }

    state
        .records
        .update_feedback(
            &request.user_id,
            &request.itv_no,
            &request.itv_qs_cnt,
            &request.itv_fb_url,
        )
        .await?;

    Ok(UpdatedResponse::success(FeedbackFields {
        itv_qs_cnt: request.itv_qs_cnt,
        itv_fb_url: request.itv_fb_url,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Reads
// ────────────────────────────────────────────────────────────────────────────

/// GET /dbr/get_user/:user_id
pub async fn handle_get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserProfile>, AppError> {
    let mut user_info = load_user(&state, &user_id).await?;
    user_info.user_tel = state.phone_cipher.decrypt(&user_info.user_tel).await?;
    let user_itv_cnt = state
        .records
        .get_interview_count(&user_id)
        .await?
        .unwrap_or(0);

    Ok(Json(UserProfile {
        user_id,
        user_info,
        user_history: UserHistory { user_itv_cnt },
    }))
}

/// GET /dbr/get_tel/:user_id
pub async fn handle_get_tel(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<PhoneLookup>, AppError> {
    let user = load_user(&state, &user_id).await?;
    let user_tel = state.phone_cipher.decrypt(&user.user_tel).await?;

    Ok(Json(PhoneLookup {
        user_id,
        user_info: PhoneInfo {
            user_nm: user.user_nm,
            user_tel,
        },
    }))
}

/// GET /dbr/get_newitvcnt/:user_id
pub async fn handle_get_interview_count(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<InterviewCountResponse>, AppError> {
    let history = load_history(&state, &user_id).await?;
    Ok(Json(InterviewCountResponse {
        new_itv_cnt: history.user_itv_cnt,
    }))
}

/// GET /dbr/get_itv/:user_id
pub async fn handle_list_interviews(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<InterviewListing>, AppError> {
    let history = load_history(&state, &user_id).await?;

    let mut itv_info = BTreeMap::new();
    for (itv_no, info) in state.records.list_interviews(&user_id).await? {
        let detail = interview_detail(&state, &itv_no, info).await?;
        itv_info.insert(itv_no, detail);
    }

    Ok(Json(InterviewListing {
        user_id,
        user_history: Some(history),
        itv_info,
    }))
}

/// GET /dbr/get_itv/:user_id/:itv_no
pub async fn handle_get_interview(
    State(state): State<AppState>,
    Path((user_id, itv_no)): Path<(String, String)>,
) -> Result<Json<InterviewListing>, AppError> {
    let info = state
        .records
        .get_interview(&user_id, &itv_no)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("interview {itv_no}")))?;
    let detail = interview_detail(&state, &itv_no, info).await?;

    Ok(Json(InterviewListing {
        user_id,
        user_history: None,
        itv_info: BTreeMap::from([(itv_no, detail)]),
    }))
}
