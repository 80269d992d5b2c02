use std::fmt;

use sha2::{Digest, Sha256};

use crate::ModelError;

/// A job identifier: 16 lowercase hex characters derived from the
/// submission payload.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct JobId(String);

impl JobId {
    pub fn new(value: impl Into<String>) -> Result<Self, ModelError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(ModelError::InvalidJobId(value));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Derives an id from arbitrary payload bytes: the first 8 bytes of the
    /// SHA-256 digest rendered as hex.
    #[must_use]
    pub fn derive(payload: &[u8]) -> Self {
        let digest = Sha256::digest(payload);
        Self(hex::encode(&digest[..8]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
