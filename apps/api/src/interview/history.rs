//! Per-interview question/answer history, kept in a Redis hash named by `itv_no`.
//!
//! Values are stored JSON-encoded so hashes written by earlier deployments
//! remain readable.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Corrupt value in {itv_no}/{field}: {source}")]
    Corrupt {
        itv_no: String,
        field: String,
        source: serde_json::Error,
    },
}

/// A field of the interview hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryField {
    Coverletter,
    Question(u32),
    Answer(u32),
    Report,
}

impl fmt::Display for HistoryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryField::Coverletter => f.write_str("coverletter"),
            HistoryField::Question(n) => write!(f, "question-{n}"),
            HistoryField::Answer(n) => write!(f, "answer-{n}"),
            HistoryField::Report => f.write_str("report"),
        }
    }
}

impl HistoryField {
    /// Parses a hash field name back into a field. Unknown names give `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "coverletter" => Some(HistoryField::Coverletter),
            "report" => Some(HistoryField::Report),
            _ => {
                if let Some(n) = name.strip_prefix("question-") {
                    n.parse().ok().map(HistoryField::Question)
                } else if let Some(n) = name.strip_prefix("answer-") {
                    n.parse().ok().map(HistoryField::Answer)
                } else {
                    None
                }
            }
        }
    }
}

#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn set(&self, itv_no: &str, field: HistoryField, value: &str)
        -> Result<(), HistoryError>;

    async fn get(&self, itv_no: &str, field: HistoryField) -> Result<Option<String>, HistoryError>;

    /// Every field of the interview, keyed by field name.
    async fn get_all(&self, itv_no: &str) -> Result<BTreeMap<String, String>, HistoryError>;
}

#[derive(Clone)]
pub struct RedisHistoryStore {
    conn: MultiplexedConnection,
    ttl_secs: Option<u64>,
}

impl RedisHistoryStore {
    pub fn new(conn: MultiplexedConnection, ttl_secs: Option<u64>) -> Self {
        Self { conn, ttl_secs }
    }
}

#[async_trait]
impl HistoryStore for RedisHistoryStore {
    async fn set(
        &self,
        itv_no: &str,
        field: HistoryField,
        value: &str,
    ) -> Result<(), HistoryError> {
        let encoded = encode(value);
        let mut conn = self.conn.clone();
        let field = field.to_string();

        let pipe = write_pipeline(itv_no, &field, &encoded, self.ttl_secs);
        let _: () = pipe.query_async(&mut conn).await?;

        debug!("Stored {itv_no}/{field}");
        Ok(())
    }

    async fn get(&self, itv_no: &str, field: HistoryField) -> Result<Option<String>, HistoryError> {
        let mut conn = self.conn.clone();
        let field = field.to_string();
        let raw: Option<String> = conn.hget(itv_no, &field).await?;
        raw.map(|raw| decode(itv_no, &field, &raw)).transpose()
    }

    async fn get_all(&self, itv_no: &str) -> Result<BTreeMap<String, String>, HistoryError> {
        let mut conn = self.conn.clone();
        let raw: HashMap<String, String> = conn.hgetall(itv_no).await?;
        raw.into_iter()
            .map(|(field, value)| {
                let decoded = decode(itv_no, &field, &value)?;
                Ok((field, decoded))
            })
            .collect()
    }
}

/// `HSET`, followed by `EXPIRE` when the history has a TTL.
fn write_pipeline(
    itv_no: &str,
    field: &str,
    encoded: &str,
    ttl_secs: Option<u64>,
) -> redis::Pipeline {
    let mut pipe = redis::pipe();
    pipe.hset(itv_no, field, encoded).ignore();
    if let Some(ttl) = ttl_secs {
        pipe.expire(itv_no, ttl as i64).ignore();
    }
    pipe
}

fn encode(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

fn decode(itv_no: &str, field: &str, raw: &str) -> Result<String, HistoryError> {
    serde_json::from_str::<String>(raw).map_err(|source| HistoryError::Corrupt {
        itv_no: itv_no.to_string(),
        field: field.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names_match_hash_layout() {
        assert_eq!(HistoryField::Coverletter.to_string(), "coverletter");
        assert_eq!(HistoryField::Question(1).to_string(), "question-1");
        assert_eq!(HistoryField::Answer(12).to_string(), "answer-12");
        assert_eq!(HistoryField::Report.to_string(), "report");
    }

    #[test]
    fn test_field_names_parse_back() {
        for field in [
            HistoryField::Coverletter,
            HistoryField::Question(3),
            HistoryField::Answer(40),
            HistoryField::Report,
        ] {
            assert_eq!(HistoryField::parse(&field.to_string()), Some(field));
        }
        assert_eq!(HistoryField::parse("question-"), None);
        assert_eq!(HistoryField::parse("question-x"), None);
        assert_eq!(HistoryField::parse("notes"), None);
    }

    fn packed(pipe: &redis::Pipeline) -> String {
        String::from_utf8_lossy(&pipe.get_packed_pipeline()).into_owned()
    }

    #[test]
    fn test_write_sets_expiry_only_with_ttl() {
        let with_ttl = packed(&write_pipeline("itv", "question-1", "\"Q\"", Some(3600)));
        assert!(with_ttl.contains("HSET"));
        assert!(with_ttl.contains("EXPIRE"));
        assert!(with_ttl.contains("3600"));

        let without_ttl = packed(&write_pipeline("itv", "question-1", "\"Q\"", None));
        assert!(without_ttl.contains("HSET"));
        assert!(!without_ttl.contains("EXPIRE"));
    }

    #[test]
    fn test_values_are_json_strings() {
        let encoded = encode("대답: \"네\"\n감사합니다");
        assert_eq!(encoded, "\"대답: \\\"네\\\"\\n감사합니다\"");
        assert_eq!(decode("i", "f", &encoded).unwrap(), "대답: \"네\"\n감사합니다");
    }

    #[test]
    fn test_unencoded_value_is_reported_as_corrupt() {
        let err = decode("itv-1", "question-1", "plain text").unwrap_err();
        assert!(matches!(err, HistoryError::Corrupt { ref field, .. } if field == "question-1"));
    }
}
