use tracing::{debug, info, warn};

use crate::BackendReply;

use super::{AuthState, AuthStatus, LogoutReason, SessionLifecycleController};

impl SessionLifecycleController {
    /// Asks the backend whether the cached session is still valid.
    ///
    /// Never fails: a rejected token, a non-2xx answer or an unreachable
    /// backend all clear the session and return `false`. Without a cached
    /// token no request is made.
    pub async fn validate_cached_session(&self) -> bool {
        let Some(token) = self.store.current_token() else {
            self.settle_without_session();
            return false;
        };

        let attempt = self.current_generation();
        let valid = match self.backend.validate_token(&token).await {
            Ok(BackendReply::Accepted(valid)) => valid,
            Ok(BackendReply::Rejected { status, .. }) => {
                debug!(
                    token = %token.fingerprint(),
                    status,
                    "token validation rejected"
                );
                false
            }
            Err(error) => {
                warn!(
                    token = %token.fingerprint(),
                    error = %error,
                    "token validation failed"
                );
                false
            }
        };

        if valid {
            return self.confirm_session(attempt);
        }

        self.end_session_if_current(attempt, LogoutReason::ValidationFailed);
        false
    }

    fn confirm_session(&self, attempt: u64) -> bool {
        let generation = self.lock_generation();
        if *generation != attempt {
            debug!(
                attempt,
                current = *generation,
                "stale validation verdict discarded"
            );
            return self.state() == AuthState::Authenticated;
        }

        self.publish(AuthStatus {
            state: AuthState::Authenticated,
            initialized: true,
            ended_by: None,
        });
        info!("cached session validated");
        true
    }

    fn settle_without_session(&self) {
        let _generation = self.lock_generation();
        let status = self.status();
        if status.state == AuthState::Authenticating {
            return;
        }

        self.publish(AuthStatus {
            state: AuthState::Unauthenticated,
            initialized: true,
            ended_by: status.ended_by,
        });
    }
}
