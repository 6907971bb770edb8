//! Digest facility used by the `hash` filter

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha384};
use thiserror::Error;

/// Errors reported by a digest provider
#[derive(Debug, Error)]
pub enum DigestError {
    #[error("Digest provider not ready: {0}")]
    NotReady(String),

    #[error("Digest failed: {0}")]
    Failed(String),
}

/// Source of cryptographic digests, encoded as base64
#[async_trait]
pub trait DigestProvider: Send + Sync {
    /// Digest `value` and return it as URL-safe base64
    async fn digest(&self, value: &str) -> Result<String, DigestError>;
}

/// SHA-384 digest backed by the `sha2` crate
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha384Digest;

#[async_trait]
impl DigestProvider for Sha384Digest {
    async fn digest(&self, value: &str) -> Result<String, DigestError> {
        let hash = Sha384::digest(value.as_bytes());
        Ok(URL_SAFE_NO_PAD.encode(hash))
    }
}
