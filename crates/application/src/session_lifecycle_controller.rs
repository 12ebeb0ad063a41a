//! Session lifecycle: login, logout, passive validation and forced logout.
//!
//! Every transition that mutates the session store runs under the
//! generation lock. Asynchronous continuations capture the generation they
//! started in and drop their result if a newer transition happened while
//! they were waiting on the backend.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use admanager_domain::UserProfile;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{AuthBackend, BackendReply, SessionStore};

mod login;
mod validation;

#[cfg(test)]
pub(crate) mod tests;

/// Message shown when the backend gives no reason for a failed login.
pub const LOGIN_FAILED_MESSAGE: &str = "login failed";
/// Message shown when a successful login response is unusable.
pub const INVALID_LOGIN_RESPONSE_MESSAGE: &str = "invalid response from server";
/// Message returned when a newer session change overtook a login.
pub const LOGIN_SUPERSEDED_MESSAGE: &str = "login was superseded by a newer session change";

/// Authentication state observed by the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// No usable session.
    Unauthenticated,
    /// A login call is in flight.
    Authenticating,
    /// A session is established.
    Authenticated,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutReason {
    /// The user signed out.
    UserRequested,
    /// The backend no longer accepts the cached token.
    ValidationFailed,
    /// An API call was answered with HTTP 401.
    Unauthorized,
}

impl LogoutReason {
    /// Returns a stable label for logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserRequested => "user_requested",
            Self::ValidationFailed => "validation_failed",
            Self::Unauthorized => "unauthorized",
        }
    }

    /// Returns whether the UI should send the user back to the login page.
    #[must_use]
    pub fn requires_login_redirect(&self) -> bool {
        !matches!(self, Self::UserRequested)
    }
}

/// Snapshot published to subscribers after every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthStatus {
    /// Current state.
    pub state: AuthState,
    /// False until the first startup check, login or logout has resolved.
    pub initialized: bool,
    /// Reason of the most recent session end while unauthenticated.
    pub ended_by: Option<LogoutReason>,
}

impl AuthStatus {
    fn initial() -> Self {
        Self {
            state: AuthState::Unauthenticated,
            initialized: false,
            ended_by: None,
        }
    }
}

/// Orchestrates session transitions against the backend and the store.
pub struct SessionLifecycleController {
    backend: Arc<dyn AuthBackend>,
    store: Arc<SessionStore>,
    generation: Mutex<u64>,
    status: watch::Sender<AuthStatus>,
}

impl SessionLifecycleController {
    /// Creates a controller in the `Unauthenticated` state.
    #[must_use]
    pub fn new(backend: Arc<dyn AuthBackend>, store: Arc<SessionStore>) -> Self {
        let (status, _) = watch::channel(AuthStatus::initial());
        Self {
            backend,
            store,
            generation: Mutex::new(0),
            status,
        }
    }

    /// Returns the session store this controller writes to.
    #[must_use]
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Returns the latest published status.
    #[must_use]
    pub fn status(&self) -> AuthStatus {
        *self.status.borrow()
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> AuthState {
        self.status().state
    }

    /// Subscribes to status changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthStatus> {
        self.status.subscribe()
    }

    /// Signs the user out locally. No server-side revocation is performed.
    pub fn logout(&self) {
        self.force_logout(LogoutReason::UserRequested);
    }

    /// Ends the session regardless of in-flight operations.
    pub fn force_logout(&self, reason: LogoutReason) {
        let mut generation = self.lock_generation();
        *generation = generation.wrapping_add(1);
        self.end_session_locked(reason);
    }

    /// Fetches the caller's profile from the backend.
    ///
    /// Any failure reads as "not authenticated"; a 401 also ends the cached
    /// session.
    pub async fn current_user(&self) -> Option<UserProfile> {
        let token = self.store.current_token();
        let attempt = self.current_generation();

        match self.backend.current_user(token.as_ref()).await {
            Ok(BackendReply::Accepted(profile)) => profile,
            Ok(BackendReply::Rejected { status: 401, .. }) => {
                self.end_session_if_current(attempt, LogoutReason::Unauthorized);
                None
            }
            Ok(BackendReply::Rejected { status, message }) => {
                debug!(
                    status,
                    message = message.as_deref().unwrap_or_default(),
                    "current user lookup rejected"
                );
                None
            }
            Err(error) => {
                warn!(error = %error, "current user lookup failed");
                None
            }
        }
    }

    pub(crate) fn current_generation(&self) -> u64 {
        *self.lock_generation()
    }

    /// Ends the session only if no newer transition happened since `attempt`.
    ///
    /// Returns whether the session was ended.
    pub(crate) fn end_session_if_current(&self, attempt: u64, reason: LogoutReason) -> bool {
        let mut generation = self.lock_generation();
        if *generation != attempt {
            debug!(
                attempt,
                current = *generation,
                reason = reason.as_str(),
                "stale session end discarded"
            );
            return false;
        }

        *generation = generation.wrapping_add(1);
        self.end_session_locked(reason);
        true
    }

    fn end_session_locked(&self, reason: LogoutReason) {
        self.store.clear();
        self.publish(AuthStatus {
            state: AuthState::Unauthenticated,
            initialized: true,
            ended_by: Some(reason),
        });

        match reason {
            LogoutReason::UserRequested => info!("user logged out"),
            _ => warn!(reason = reason.as_str(), "session ended by forced logout"),
        }
    }

    fn publish(&self, status: AuthStatus) {
        self.status.send_replace(status);
    }

    fn lock_generation(&self) -> MutexGuard<'_, u64> {
        self.generation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
