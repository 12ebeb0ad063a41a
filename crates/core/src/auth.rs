use std::fmt::{Debug, Formatter};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{AppError, AppResult};

const FINGERPRINT_HEX_LENGTH: usize = 12;

/// Returns a short, non-reversible fingerprint of a secret for log correlation.
#[must_use]
pub fn token_fingerprint(secret: &str) -> String {
    let digest = Sha256::digest(secret.as_bytes());
    let mut encoded = hex::encode(digest);
    encoded.truncate(FINGERPRINT_HEX_LENGTH);
    encoded
}

/// Opaque bearer token issued by the backend at login.
///
/// `Debug` only ever shows the fingerprint.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccessToken(String);

impl AccessToken {
    /// Creates a token from the raw value returned by the backend.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "access token must not be empty".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the raw token value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the `Authorization` header value carrying this token.
    #[must_use]
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.0)
    }

    /// Returns the log-safe fingerprint of this token.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        token_fingerprint(self.0.as_str())
    }
}

impl Debug for AccessToken {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "AccessToken({})", self.fingerprint())
    }
}

impl TryFrom<String> for AccessToken {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AccessToken> for String {
    fn from(value: AccessToken) -> Self {
        value.0
    }
}
