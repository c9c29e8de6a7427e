use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::string_or_number;
use crate::models::user::UserHistory;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewInfo {
    pub itv_sub: String,
    pub itv_date: String,
    pub itv_cate: String,
    pub itv_job: String,
    pub itv_text_url: String,
    pub itv_fb_url: String,
    pub itv_qs_cnt: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionInfo {
    pub qs_content: String,
    pub qs_video_url: String,
    pub qs_audio_url: String,
    pub qs_text_url: String,
}

/// One interview together with its recorded questions, keyed by `qs_no`.
#[derive(Debug, Serialize)]
pub struct InterviewDetail {
    #[serde(flatten)]
    pub info: InterviewInfo,
    pub qs_info: BTreeMap<String, QuestionInfo>,
}

#[derive(Debug, Serialize)]
pub struct InterviewListing {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_history: Option<UserHistory>,
    pub itv_info: BTreeMap<String, InterviewDetail>,
}

#[derive(Debug, Deserialize)]
pub struct NewInterviewRequest {
    pub user_id: String,
    pub itv_cate: String,
    pub itv_job: String,
    pub itv_text_url: String,
}

#[derive(Debug, Deserialize)]
pub struct NewQuestionRequest {
    pub user_id: String,
    pub itv_no: String,
    pub qs_no: u32,
    pub qs_content: String,
    pub qs_video_url: String,
    pub qs_audio_url: String,
    pub qs_text_url: String,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub user_id: String,
    pub itv_no: String,
    #[serde(deserialize_with = "string_or_number")]
    pub itv_qs_cnt: String,
    pub itv_fb_url: String,
}

/// Identifier and title of a user's `count`-th interview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterviewNumbering {
    pub itv_no: String,
    pub itv_sub: String,
    pub itv_date: String,
}

impl InterviewNumbering {
    pub fn new(user_uuid: &str, nickname: &str, category: &str, count: u32, today: NaiveDate) -> Self {
        Self {
            itv_no: format!("{user_uuid}_{}_{count:03}", today.format("%y%m%d")),
            itv_sub: format!("{nickname}_{category}_면접_{count:03}"),
            itv_date: today.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Sort key suffix of a question: zero-padded to two digits.
pub fn question_key(qs_no: u32) -> String {
    format!("{qs_no:02}")
}
