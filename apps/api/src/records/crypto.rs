//! Phone numbers are stored as base64 KMS ciphertext.

use async_trait::async_trait;
use aws_sdk_kms::primitives::Blob;
use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use tracing::warn;

use super::store::RecordError;

#[async_trait]
pub trait PhoneCipher: Send + Sync {
    async fn encrypt(&self, plain: &str) -> Result<String, RecordError>;

    /// Rows written before encryption was introduced hold plaintext; those
    /// come back unchanged.
    async fn decrypt(&self, stored: &str) -> Result<String, RecordError>;
}

pub struct KmsPhoneCipher {
    client: aws_sdk_kms::Client,
    key_id: String,
}

impl KmsPhoneCipher {
    pub fn new(client: aws_sdk_kms::Client, key_id: String) -> Self {
        Self { client, key_id }
    }
}

#[async_trait]
impl PhoneCipher for KmsPhoneCipher {
    async fn encrypt(&self, plain: &str) -> Result<String, RecordError> {
        let output = self
            .client
            .encrypt()
            .key_id(&self.key_id)
            .plaintext(Blob::new(plain.as_bytes()))
            .send()
            .await
            .map_err(|e| RecordError::Cipher(e.into_service_error().to_string()))?;

        let ciphertext = output
            .ciphertext_blob
            .ok_or_else(|| RecordError::Cipher("KMS returned no ciphertext".to_string()))?;
        Ok(B64.encode(ciphertext.as_ref()))
    }

    async fn decrypt(&self, stored: &str) -> Result<String, RecordError> {
        if stored.is_empty() {
            return Ok(String::new());
        }
        let Ok(ciphertext) = B64.decode(stored) else {
            return Ok(stored.to_string());
        };

        let output = match self
            .client
            .decrypt()
            .ciphertext_blob(Blob::new(ciphertext))
            .send()
            .await
        {
            Ok(output) => output,
            Err(e) => {
                let e = e.into_service_error();
                if e.is_invalid_ciphertext_exception() {
                    warn!("Phone number is not KMS ciphertext; returning it as stored");
                    return Ok(stored.to_string());
                }
                return Err(RecordError::Cipher(e.to_string()));
            }
        };

        let plaintext = output
            .plaintext
            .ok_or_else(|| RecordError::Cipher("KMS returned no plaintext".to_string()))?;
        String::from_utf8(plaintext.into_inner())
            .map_err(|e| RecordError::Cipher(format!("decrypted phone number is not UTF-8: {e}")))
    }
}
