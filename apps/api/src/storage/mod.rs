//! Object storage access. Every file the coach reads or writes is addressed by
//! an `s3://bucket/key` URL.

use std::fmt;

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, info};

use crate::documents::{extract_text, DocumentError, DocumentKind};
use crate::errors::AppError;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid object URL: {0}")]
    InvalidUrl(String),

    #[error("Unsupported URL format: {0}")]
    UnsupportedScheme(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Backend(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Location {
    pub bucket: String,
    pub key: String,
}

impl S3Location {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Parses `s3://bucket/key/with/slashes`. The key may be empty.
    pub fn parse(url: &str) -> Result<Self, StorageError> {
        let rest = url
            .trim()
            .strip_prefix("s3://")
            .ok_or_else(|| StorageError::UnsupportedScheme(url.to_string()))?;
        let (bucket, key) = rest.split_once('/').unwrap_or((rest, ""));
        if bucket.is_empty() {
            return Err(StorageError::InvalidUrl(url.to_string()));
        }
        Ok(Self::new(bucket, key))
    }
}

impl fmt::Display for S3Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get(&self, location: &S3Location) -> Result<Bytes, StorageError>;

    async fn put(
        &self,
        location: &S3Location,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError>;
}

pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get(&self, location: &S3Location) -> Result<Bytes, StorageError> {
        if location.key.is_empty() {
            return Err(StorageError::InvalidUrl(location.to_string()));
        }

        let output = self
            .client
            .get_object()
            .bucket(&location.bucket)
            .key(&location.key)
            .send()
            .await
            .map_err(|e| {
                let e = e.into_service_error();
                if e.is_no_such_key() {
                    StorageError::NotFound(location.to_string())
                } else {
                    StorageError::Backend(format!("S3 download of {location} failed: {e}"))
                }
            })?;

        let body = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Backend(format!("S3 body read of {location} failed: {e}")))?
            .into_bytes();

        debug!("Downloaded {} bytes from {location}", body.len());
        Ok(body)
    }

    async fn put(
        &self,
        location: &S3Location,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(&location.bucket)
            .key(&location.key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::Backend(format!("S3 upload to {location} failed: {e}")))?;

        info!("Uploaded {location}");
        Ok(())
    }
}

/// Downloads the document at `url` and extracts its text.
pub async fn fetch_document_text(store: &dyn ObjectStore, url: &str) -> Result<String, AppError> {
    let location = S3Location::parse(url)?;
    let kind = DocumentKind::from_key(&location.key)?;
    let bytes = store.get(&location).await?;

    let text = tokio::task::spawn_blocking(move || extract_text(kind, &bytes))
        .await
        .map_err(|e| DocumentError::Extraction(e.to_string()))??;

    debug!("Extracted {} characters from {location}", text.chars().count());
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryObjectStore;

    #[test]
    fn test_parse_splits_bucket_and_key_once() {
        let loc = S3Location::parse("s3://simulation-userdata/text/2024/06/a.txt").unwrap();
        assert_eq!(loc.bucket, "simulation-userdata");
        assert_eq!(loc.key, "text/2024/06/a.txt");
    }

    #[test]
    fn test_parse_bucket_without_key() {
        let loc = S3Location::parse("s3://bucket-only").unwrap();
        assert_eq!(loc.bucket, "bucket-only");
        assert_eq!(loc.key, "");
    }

    #[test]
    fn test_parse_rejects_other_schemes() {
        assert!(matches!(
            S3Location::parse("https://bucket.s3.amazonaws.com/a.pdf"),
            Err(StorageError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            S3Location::parse("s3:///a.pdf"),
            Err(StorageError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_display_round_trips() {
        let url = "s3://bucket/audio/1718324990967.mp3";
        assert_eq!(S3Location::parse(url).unwrap().to_string(), url);
    }

    #[tokio::test]
    async fn test_fetch_document_text_reads_txt() {
        let store = MemoryObjectStore::default();
        store.insert("s3://b/answers/1.txt", "  Redis 캐시를 도입했습니다. ");

        let text = fetch_document_text(&store, "s3://b/answers/1.txt").await.unwrap();
        assert_eq!(text, "Redis 캐시를 도입했습니다.");
    }

    #[tokio::test]
    async fn test_fetch_document_text_rejects_unknown_extension_before_download() {
        let store = MemoryObjectStore::default();
        let err = fetch_document_text(&store, "s3://b/answers/1.mp3")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Document(DocumentError::UnsupportedFormat(_))));
    }

    #[tokio::test]
    async fn test_fetch_document_text_missing_object() {
        let store = MemoryObjectStore::default();
        let err = fetch_document_text(&store, "s3://b/none.txt").await.unwrap_err();
        assert!(matches!(err, AppError::Storage(StorageError::NotFound(_))));
    }
}
