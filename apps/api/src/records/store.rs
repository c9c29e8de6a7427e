//! User and interview records in one DynamoDB table.
//!
//! | PK                      | SK            |
//! |-------------------------|---------------|
//! | `u#{user_id}`           | `info`        |
//! | `u#{user_id}`           | `history`     |
//! | `u#{user_id}#itv_info`  | `i#{itv_no}`  |
//! | `i#{itv_no}#qs_info`    | `q#{qs_no}`   |

use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::models::interview::{InterviewInfo, QuestionInfo};
use crate::models::user::UserInfo;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("DynamoDB {operation} failed: {message}")]
    Dynamo {
        operation: &'static str,
        message: String,
    },

    #[error("Phone number cipher failed: {0}")]
    Cipher(String),
}

type Item = HashMap<String, AttributeValue>;

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Writes the `info` item and a `history` item with a zero count.
    async fn put_user(&self, user_id: &str, info: &UserInfo) -> Result<(), RecordError>;

    async fn get_user(&self, user_id: &str) -> Result<Option<UserInfo>, RecordError>;

    /// Sets the given `info` attributes; others are untouched.
    async fn update_user(
        &self,
        user_id: &str,
        fields: &BTreeMap<String, String>,
    ) -> Result<(), RecordError>;

    /// `None` when the user has no `history` item.
    async fn get_interview_count(&self, user_id: &str) -> Result<Option<u32>, RecordError>;

    async fn set_interview_count(&self, user_id: &str, count: u32) -> Result<(), RecordError>;

    async fn put_interview(
        &self,
        user_id: &str,
        itv_no: &str,
        info: &InterviewInfo,
    ) -> Result<(), RecordError>;

    async fn get_interview(
        &self,
        user_id: &str,
        itv_no: &str,
    ) -> Result<Option<InterviewInfo>, RecordError>;

    /// Every interview of the user keyed by `itv_no`.
    async fn list_interviews(
        &self,
        user_id: &str,
    ) -> Result<BTreeMap<String, InterviewInfo>, RecordError>;

    async fn update_feedback(
        &self,
        user_id: &str,
        itv_no: &str,
        qs_cnt: &str,
        fb_url: &str,
    ) -> Result<(), RecordError>;

    async fn put_question(
        &self,
        itv_no: &str,
        qs_no: &str,
        question: &QuestionInfo,
    ) -> Result<(), RecordError>;

    /// Recorded questions of an interview keyed by zero-padded `qs_no`.
    async fn list_questions(
        &self,
        itv_no: &str,
    ) -> Result<BTreeMap<String, QuestionInfo>, RecordError>;
}

fn user_pk(user_id: &str) -> String {
    format!("u#{user_id}")
}

fn interviews_pk(user_id: &str) -> String {
    format!("u#{user_id}#itv_info")
}

fn questions_pk(itv_no: &str) -> String {
    format!("i#{itv_no}#qs_info")
}

/// Reads a stored interview count. Older rows hold it as a string; only its
/// trailing digits count, anything else is 0.
pub fn parse_count(value: Option<&AttributeValue>) -> u32 {
    static TRAILING_DIGITS: OnceLock<Regex> = OnceLock::new();
    match value {
        Some(AttributeValue::N(n)) => n.parse::<f64>().map(|n| n.max(0.0) as u32).unwrap_or(0),
        Some(AttributeValue::S(s)) => {
            let re = TRAILING_DIGITS.get_or_init(|| Regex::new(r"\d+$").expect("valid regex"));
            re.find(s.trim())
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0)
        }
        _ => 0,
    }
}

/// String view of an attribute; numbers are rendered, anything else is "".
fn text(item: &Item, name: &str) -> String {
    match item.get(name) {
        Some(AttributeValue::S(s)) => s.clone(),
        Some(AttributeValue::N(n)) => n.clone(),
        _ => String::new(),
    }
}

fn user_from_item(item: &Item) -> UserInfo {
    UserInfo {
        user_uuid: text(item, "user_uuid"),
        user_nm: text(item, "user_nm"),
        user_nicknm: text(item, "user_nicknm"),
        user_gender: text(item, "user_gender"),
        user_birthday: text(item, "user_birthday"),
        user_tel: text(item, "user_tel"),
    }
}

fn interview_from_item(item: &Item) -> InterviewInfo {
    InterviewInfo {
        itv_sub: text(item, "itv_sub"),
        itv_date: text(item, "itv_date"),
        itv_cate: text(item, "itv_cate"),
        itv_job: text(item, "itv_job"),
        itv_text_url: text(item, "itv_text_url"),
        itv_fb_url: text(item, "itv_fb_url"),
        itv_qs_cnt: text(item, "itv_qs_cnt"),
    }
}

fn question_from_item(item: &Item) -> QuestionInfo {
    QuestionInfo {
        qs_content: text(item, "qs_content"),
        qs_video_url: text(item, "qs_video_url"),
        qs_audio_url: text(item, "qs_audio_url"),
        qs_text_url: text(item, "qs_text_url"),
    }
}

fn keyed(pk: String, sk: String, attributes: Vec<(&str, &str)>) -> Item {
    let mut item = Item::with_capacity(attributes.len() + 2);
    item.insert("PK".to_string(), AttributeValue::S(pk));
    item.insert("SK".to_string(), AttributeValue::S(sk));
    for (name, value) in attributes {
        item.insert(name.to_string(), AttributeValue::S(value.to_string()));
    }
    item
}

pub struct DynamoRecordStore {
    client: aws_sdk_dynamodb::Client,
    table: String,
}

impl DynamoRecordStore {
    pub fn new(client: aws_sdk_dynamodb::Client, table: String) -> Self {
        Self { client, table }
    }

    async fn get_item(&self, pk: String, sk: String) -> Result<Option<Item>, RecordError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table)
            .key("PK", AttributeValue::S(pk))
            .key("SK", AttributeValue::S(sk))
            .send()
            .await
            .map_err(|e| RecordError::Dynamo {
                operation: "GetItem",
                message: e.into_service_error().to_string(),
            })?;
        Ok(output.item)
    }

    async fn put_item(&self, item: Item) -> Result<(), RecordError> {
        self.client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|e| RecordError::Dynamo {
                operation: "PutItem",
                message: e.into_service_error().to_string(),
            })?;
        Ok(())
    }

    /// `SET` the given attributes on one item.
    async fn set_attributes(
        &self,
        pk: String,
        sk: String,
        values: Vec<(String, AttributeValue)>,
    ) -> Result<(), RecordError> {
        if values.is_empty() {
            return Ok(());
        }

        let mut request = self
            .client
            .update_item()
            .table_name(&self.table)
            .key("PK", AttributeValue::S(pk))
            .key("SK", AttributeValue::S(sk));

        let mut assignments = Vec::with_capacity(values.len());
        for (i, (name, value)) in values.into_iter().enumerate() {
            assignments.push(format!("#f{i} = :v{i}"));
            request = request
                .expression_attribute_names(format!("#f{i}"), name)
                .expression_attribute_values(format!(":v{i}"), value);
        }

        request
            .update_expression(format!("SET {}", assignments.join(", ")))
            .send()
            .await
            .map_err(|e| RecordError::Dynamo {
                operation: "UpdateItem",
                message: e.into_service_error().to_string(),
            })?;
        Ok(())
    }

    /// All items under one partition key, following pagination.
    async fn query_partition(&self, pk: String) -> Result<Vec<Item>, RecordError> {
        let mut items = Vec::new();
        let mut start_key = None;

        loop {
            let output = self
                .client
                .query()
                .table_name(&self.table)
                .key_condition_expression("PK = :pk")
                .expression_attribute_values(":pk", AttributeValue::S(pk.clone()))
                .set_exclusive_start_key(start_key)
                .send()
                .await
                .map_err(|e| RecordError::Dynamo {
                    operation: "Query",
                    message: e.into_service_error().to_string(),
                })?;

            items.extend(output.items.unwrap_or_default());
            match output.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        debug!("Query {pk} returned {} items", items.len());
        Ok(items)
    }
}

/// Maps `prefix{id}` sort keys to their id.
fn strip_sort_keys<T>(
    items: Vec<Item>,
    prefix: &str,
    convert: fn(&Item) -> T,
) -> BTreeMap<String, T> {
    items
        .iter()
        .filter_map(|item| {
            let sk = text(item, "SK");
            let id = sk.strip_prefix(prefix)?.to_string();
            Some((id, convert(item)))
        })
        .collect()
}

#[async_trait]
impl RecordStore for DynamoRecordStore {
    async fn put_user(&self, user_id: &str, info: &UserInfo) -> Result<(), RecordError> {
        let pk = user_pk(user_id);
        self.put_item(keyed(
            pk.clone(),
            "info".to_string(),
            vec![
                ("user_uuid", info.user_uuid.as_str()),
                ("user_nm", info.user_nm.as_str()),
                ("user_nicknm", info.user_nicknm.as_str()),
                ("user_gender", info.user_gender.as_str()),
                ("user_birthday", info.user_birthday.as_str()),
                ("user_tel", info.user_tel.as_str()),
            ],
        ))
        .await?;

        let mut history = keyed(pk, "history".to_string(), Vec::new());
        history.insert("user_itv_cnt".to_string(), AttributeValue::N("0".to_string()));
        self.put_item(history).await
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<UserInfo>, RecordError> {
        Ok(self
            .get_item(user_pk(user_id), "info".to_string())
            .await?
            .map(|item| user_from_item(&item)))
    }

    async fn update_user(
        &self,
        user_id: &str,
        fields: &BTreeMap<String, String>,
    ) -> Result<(), RecordError> {
        let values = fields
            .iter()
            .map(|(name, value)| (name.clone(), AttributeValue::S(value.clone())))
            .collect();
        self.set_attributes(user_pk(user_id), "info".to_string(), values)
            .await
    }

    async fn get_interview_count(&self, user_id: &str) -> Result<Option<u32>, RecordError> {
        Ok(self
            .get_item(user_pk(user_id), "history".to_string())
            .await?
            .map(|item| parse_count(item.get("user_itv_cnt"))))
    }

    async fn set_interview_count(&self, user_id: &str, count: u32) -> Result<(), RecordError> {
        self.set_attributes(
            user_pk(user_id),
            "history".to_string(),
            vec![("user_itv_cnt".to_string(), AttributeValue::N(count.to_string()))],
        )
        .await
    }

    async fn put_interview(
        &self,
        user_id: &str,
        itv_no: &str,
        info: &InterviewInfo,
    ) -> Result<(), RecordError> {
        let mut attributes = vec![
            ("itv_sub", info.itv_sub.as_str()),
            ("itv_cate", info.itv_cate.as_str()),
            ("itv_job", info.itv_job.as_str()),
            ("itv_text_url", info.itv_text_url.as_str()),
            ("itv_date", info.itv_date.as_str()),
            ("itv_qs_cnt", info.itv_qs_cnt.as_str()),
        ];
        if !info.itv_fb_url.is_empty() {
            attributes.push(("itv_fb_url", info.itv_fb_url.as_str()));
        }
        self.put_item(keyed(interviews_pk(user_id), format!("i#{itv_no}"), attributes))
            .await
    }

    async fn get_interview(
        &self,
        user_id: &str,
        itv_no: &str,
    ) -> Result<Option<InterviewInfo>, RecordError> {
        Ok(self
            .get_item(interviews_pk(user_id), format!("i#{itv_no}"))
            .await?
            .map(|item| interview_from_item(&item)))
    }

    async fn list_interviews(
        &self,
        user_id: &str,
    ) -> Result<BTreeMap<String, InterviewInfo>, RecordError> {
        let items = self.query_partition(interviews_pk(user_id)).await?;
        Ok(strip_sort_keys(items, "i#", interview_from_item))
    }

    async fn update_feedback(
        &self,
        user_id: &str,
        itv_no: &str,
        qs_cnt: &str,
        fb_url: &str,
    ) -> Result<(), RecordError> {
        self.set_attributes(
            interviews_pk(user_id),
            format!("i#{itv_no}"),
            vec![
                ("itv_qs_cnt".to_string(), AttributeValue::S(qs_cnt.to_string())),
                ("itv_fb_url".to_string(), AttributeValue::S(fb_url.to_string())),
            ],
        )
        .await
    }

    async fn put_question(
        &self,
        itv_no: &str,
        qs_no: &str,
        question: &QuestionInfo,
    ) -> Result<(), RecordError> {
        self.put_item(keyed(
            questions_pk(itv_no),
            format!("q#{qs_no}"),
            vec![
                ("qs_content", question.qs_content.as_str()),
                ("qs_video_url", question.qs_video_url.as_str()),
                ("qs_audio_url", question.qs_audio_url.as_str()),
                ("qs_text_url", question.qs_text_url.as_str()),
            ],
        ))
        .await
    }

    async fn list_questions(
        &self,
        itv_no: &str,
    ) -> Result<BTreeMap<String, QuestionInfo>, RecordError> {
        let items = self.query_partition(questions_pk(itv_no)).await?;
        Ok(strip_sort_keys(items, "q#", question_from_item))
    }
}
