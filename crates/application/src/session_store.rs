//! Durable holder of at most one session.

use std::sync::Arc;

use admanager_core::{AccessToken, AppError, AppResult};
use admanager_domain::{Session, UserProfile};
use tracing::{debug, warn};

use crate::{SessionStorage, StorageWrite};

/// Storage key holding the raw bearer token.
pub const TOKEN_KEY: &str = "token";
/// Storage key holding the JSON-encoded user profile.
pub const PROFILE_KEY: &str = "user";

/// Session store over a durable key/value adapter.
///
/// Token and profile are always written and removed together, so readers
/// observe either a complete session or none.
pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
}

impl SessionStore {
    /// Creates a store over the given storage adapter.
    #[must_use]
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self { storage }
    }

    /// Persists a session, replacing any previous one in one batch.
    pub fn save(&self, session: &Session) -> AppResult<()> {
        let profile = serde_json::to_string(session.profile()).map_err(|error| {
            AppError::Internal(format!("failed to encode session profile: {error}"))
        })?;

        self.storage.apply(vec![
            StorageWrite::Put {
                key: TOKEN_KEY.to_owned(),
                value: session.token().as_str().to_owned(),
            },
            StorageWrite::Put {
                key: PROFILE_KEY.to_owned(),
                value: profile,
            },
        ])?;

        debug!(
            username = %session.username(),
            token = %session.token().fingerprint(),
            "session saved"
        );
        Ok(())
    }

    /// Returns the stored session if it is complete and well-formed.
    #[must_use]
    pub fn load(&self) -> Option<Session> {
        let mut values = self.read_snapshot()?.into_iter();
        let (Some(Some(token)), Some(Some(profile))) = (values.next(), values.next()) else {
            return None;
        };

        let token = match AccessToken::new(token) {
            Ok(token) => token,
            Err(error) => {
                warn!(error = %error, "ignoring stored session with unusable token");
                return None;
            }
        };

        match serde_json::from_str::<UserProfile>(profile.as_str()) {
            Ok(profile) => Some(Session::new(token, profile)),
            Err(error) => {
                warn!(
                    token = %token.fingerprint(),
                    error = %error,
                    "ignoring stored session with malformed profile"
                );
                None
            }
        }
    }

    /// Removes the stored session. Calling it again is a no-op.
    pub fn clear(&self) {
        let result = self.storage.apply(vec![
            StorageWrite::Remove {
                key: TOKEN_KEY.to_owned(),
            },
            StorageWrite::Remove {
                key: PROFILE_KEY.to_owned(),
            },
        ]);

        if let Err(error) = result {
            warn!(error = %error, "failed to clear stored session");
        }
    }

    /// Returns the token of the stored session, if there is a complete one.
    #[must_use]
    pub fn current_token(&self) -> Option<AccessToken> {
        self.load().map(|session| session.token().clone())
    }

    fn read_snapshot(&self) -> Option<Vec<Option<String>>> {
        match self.storage.read_many(&[TOKEN_KEY, PROFILE_KEY]) {
            Ok(values) => Some(values),
            Err(error) => {
                warn!(error = %error, "failed to read session storage");
                None
            }
        }
    }
}
