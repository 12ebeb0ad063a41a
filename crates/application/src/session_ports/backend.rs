use admanager_core::{AccessToken, AppResult};
use admanager_domain::{Credentials, UserProfile};
use async_trait::async_trait;

/// Outcome of a backend call that reached the server.
///
/// Transport failures are reported through `AppResult` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendReply<T> {
    /// The server answered with a success status.
    Accepted(T),
    /// The server answered with a non-success status.
    Rejected {
        /// HTTP status code.
        status: u16,
        /// `message` field of the error body, when present.
        message: Option<String>,
    },
}

/// Login response body as returned by the backend, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginGrant {
    /// Issued bearer token; missing means the login did not succeed.
    pub token: Option<String>,
    /// Directory account name.
    pub username: Option<String>,
    /// Display name.
    pub full_name: Option<String>,
    /// Directory groups.
    pub groups: Vec<String>,
    /// Console roles.
    pub roles: Vec<String>,
}

/// Port for the remote authentication endpoints.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Exchanges credentials for a token (`POST /api/auth/login`).
    async fn login(&self, credentials: &Credentials) -> AppResult<BackendReply<LoginGrant>>;

    /// Asks whether a cached token is still valid (`GET /api/auth/validate`).
    async fn validate_token(&self, token: &AccessToken) -> AppResult<BackendReply<bool>>;

    /// Fetches the profile the backend associates with the caller
    /// (`GET /api/user/current`). An empty body yields `None`.
    async fn current_user(
        &self,
        token: Option<&AccessToken>,
    ) -> AppResult<BackendReply<Option<UserProfile>>>;
}
