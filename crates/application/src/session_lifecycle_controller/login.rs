use admanager_core::{AccessToken, AppError, AppResult};
use admanager_domain::{Credentials, Session, UserProfile};
use tracing::{debug, info, warn};

use crate::{BackendReply, LoginGrant};

use super::{
    AuthState, AuthStatus, INVALID_LOGIN_RESPONSE_MESSAGE, LOGIN_FAILED_MESSAGE,
    LOGIN_SUPERSEDED_MESSAGE, SessionLifecycleController,
};

/// Tracks one login attempt so an abandoned call cannot leave the
/// controller stuck in `Authenticating`.
struct PendingLogin<'a> {
    controller: &'a SessionLifecycleController,
    attempt: u64,
    settled: bool,
}

impl Drop for PendingLogin<'_> {
    fn drop(&mut self) {
        if !self.settled {
            debug!(attempt = self.attempt, "login attempt abandoned");
            self.controller.settle_login(self.attempt);
        }
    }
}

impl SessionLifecycleController {
    /// Exchanges credentials for a session and persists it.
    ///
    /// On failure the store is left untouched and the error is always
    /// `AppError::Authentication` carrying a user-facing message. The
    /// password is only ever sent in the request body.
    pub async fn login(&self, credentials: Credentials) -> AppResult<Session> {
        let mut pending = self.begin_login();
        let username = credentials.username().to_owned();

        let reply = self.backend.login(&credentials).await;
        drop(credentials);

        let outcome = match reply {
            Ok(BackendReply::Accepted(grant)) => session_from_grant(grant),
            Ok(BackendReply::Rejected { status, message }) => {
                warn!(username = %username, status, "login rejected by backend");
                Err(AppError::Authentication(
                    message
                        .filter(|message| !message.trim().is_empty())
                        .unwrap_or_else(|| LOGIN_FAILED_MESSAGE.to_owned()),
                ))
            }
            Err(AppError::Transport(detail)) => {
                warn!(username = %username, error = %detail, "login request did not reach backend");
                Err(AppError::Authentication(LOGIN_FAILED_MESSAGE.to_owned()))
            }
            Err(error) => {
                warn!(username = %username, error = %error, "login response unreadable");
                Err(AppError::Authentication(
                    INVALID_LOGIN_RESPONSE_MESSAGE.to_owned(),
                ))
            }
        };

        pending.settled = true;
        match outcome {
            Ok(session) => self.commit_login(pending.attempt, session),
            Err(error) => {
                self.settle_login(pending.attempt);
                Err(error)
            }
        }
    }

    fn begin_login(&self) -> PendingLogin<'_> {
        let mut generation = self.lock_generation();
        *generation = generation.wrapping_add(1);
        let attempt = *generation;

        let initialized = self.status().initialized;
        self.publish(AuthStatus {
            state: AuthState::Authenticating,
            initialized,
            ended_by: None,
        });

        PendingLogin {
            controller: self,
            attempt,
            settled: false,
        }
    }

    fn commit_login(&self, attempt: u64, session: Session) -> AppResult<Session> {
        let generation = self.lock_generation();
        if *generation != attempt {
            debug!(
                attempt,
                current = *generation,
                username = %session.username(),
                "stale login result discarded"
            );
            return Err(AppError::Authentication(
                LOGIN_SUPERSEDED_MESSAGE.to_owned(),
            ));
        }

        if let Err(error) = self.store.save(&session) {
            self.publish_resting_status();
            return Err(error);
        }

        self.publish(AuthStatus {
            state: AuthState::Authenticated,
            initialized: true,
            ended_by: None,
        });
        info!(
            username = %session.username(),
            token = %session.token().fingerprint(),
            roles = ?session.roles(),
            "login succeeded"
        );
        drop(generation);

        Ok(session)
    }

    /// Leaves `Authenticating` for a failed or abandoned attempt, unless a
    /// newer transition already did.
    pub(super) fn settle_login(&self, attempt: u64) {
        let generation = self.lock_generation();
        if *generation == attempt {
            self.publish_resting_status();
        }
    }

    /// Publishes the state implied by the store contents.
    pub(super) fn publish_resting_status(&self) {
        let state = if self.store.load().is_some() {
            AuthState::Authenticated
        } else {
            AuthState::Unauthenticated
        };
        let ended_by = self.status().ended_by;

        self.publish(AuthStatus {
            state,
            initialized: true,
            ended_by: if state == AuthState::Unauthenticated {
                ended_by
            } else {
                None
            },
        });
    }
}

fn session_from_grant(grant: LoginGrant) -> AppResult<Session> {
    let invalid = || AppError::Authentication(INVALID_LOGIN_RESPONSE_MESSAGE.to_owned());

    let token = grant
        .token
        .ok_or_else(invalid)
        .and_then(|token| AccessToken::new(token).map_err(|_| invalid()))?;
    let username = grant.username.ok_or_else(invalid)?;
    let profile = UserProfile::new(username, grant.full_name, grant.groups, grant.roles)
        .map_err(|_| invalid())?;

    Ok(Session::new(token, profile))
}
