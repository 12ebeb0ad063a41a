use admanager_application::{AuthBackend, BackendReply, LoginGrant};
use admanager_core::{AccessToken, AppError, AppResult};
use admanager_domain::{Credentials, UserProfile};
use async_trait::async_trait;
use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::http_support::{endpoint, error_message, normalize_base_url};

const LOGIN_PATH: &str = "/api/auth/login";
const VALIDATE_PATH: &str = "/api/auth/validate";
const CURRENT_USER_PATH: &str = "/api/user/current";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
    remember_me: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    token: Option<String>,
    username: Option<String>,
    full_name: Option<String>,
    groups: Option<Vec<String>>,
    roles: Option<Vec<String>>,
}

impl From<LoginResponse> for LoginGrant {
    fn from(response: LoginResponse) -> Self {
        Self {
            token: response.token,
            username: response.username,
            full_name: response.full_name,
            groups: response.groups.unwrap_or_default(),
            roles: response.roles.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ValidateResponse {
    #[serde(default)]
    valid: bool,
}

/// reqwest-based implementation of the authentication endpoints.
pub struct HttpAuthBackend {
    http_client: reqwest::Client,
    api_base_url: String,
}

impl HttpAuthBackend {
    /// Creates a backend client rooted at `api_base_url`.
    #[must_use]
    pub fn new(http_client: reqwest::Client, api_base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            api_base_url: normalize_base_url(api_base_url),
        }
    }
}

#[async_trait]
impl AuthBackend for HttpAuthBackend {
    async fn login(&self, credentials: &Credentials) -> AppResult<BackendReply<LoginGrant>> {
        let response = self
            .http_client
            .post(endpoint(self.api_base_url.as_str(), LOGIN_PATH))
            .json(&LoginRequest {
                username: credentials.username(),
                password: credentials.password(),
                remember_me: credentials.remember_me(),
            })
            .send()
            .await
            .map_err(|error| {
                AppError::Transport(format!("failed to call login endpoint: {error}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Ok(BackendReply::Rejected {
                status: status.as_u16(),
                message: error_message(response).await,
            });
        }

        let body = response.json::<LoginResponse>().await.map_err(|error| {
            AppError::Internal(format!("failed to parse login response body: {error}"))
        })?;

        Ok(BackendReply::Accepted(body.into()))
    }

    async fn validate_token(&self, token: &AccessToken) -> AppResult<BackendReply<bool>> {
        let response = self
            .http_client
            .get(endpoint(self.api_base_url.as_str(), VALIDATE_PATH))
            .header(header::AUTHORIZATION, token.bearer_header())
            .send()
            .await
            .map_err(|error| {
                AppError::Transport(format!("failed to call validate endpoint: {error}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "validate endpoint rejected token");
            return Ok(BackendReply::Rejected {
                status: status.as_u16(),
                message: error_message(response).await,
            });
        }

        let body = response.json::<ValidateResponse>().await.map_err(|error| {
            AppError::Internal(format!("failed to parse validate response body: {error}"))
        })?;

        Ok(BackendReply::Accepted(body.valid))
    }

    async fn current_user(
        &self,
        token: Option<&AccessToken>,
    ) -> AppResult<BackendReply<Option<UserProfile>>> {
        let mut request = self
            .http_client
            .get(endpoint(self.api_base_url.as_str(), CURRENT_USER_PATH));
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, token.bearer_header());
        }

        let response = request.send().await.map_err(|error| {
            AppError::Transport(format!("failed to call current user endpoint: {error}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Ok(BackendReply::Rejected {
                status: status.as_u16(),
                message: error_message(response).await,
            });
        }

        let body = response.text().await.map_err(|error| {
            AppError::Transport(format!("failed to read current user response body: {error}"))
        })?;
        if body.trim().is_empty() {
            return Ok(BackendReply::Accepted(None));
        }

        let profile = serde_json::from_str::<Option<UserProfile>>(body.as_str()).map_err(|error| {
            AppError::Internal(format!("failed to parse current user response body: {error}"))
        })?;

        Ok(BackendReply::Accepted(profile))
    }
}

#[cfg(test)]
mod tests {
    use admanager_application::LoginGrant;

    use super::{LoginRequest, LoginResponse};

    #[test]
    fn login_request_uses_camel_case_fields() {
        let body = serde_json::to_value(LoginRequest {
            username: "csb1",
            password: "secret",
            remember_me: true,
        })
        .unwrap_or_default();

        assert_eq!(
            body,
            serde_json::json!({
                "username": "csb1",
                "password": "secret",
                "rememberMe": true,
            })
        );
    }

    #[test]
    fn login_response_tolerates_missing_and_null_lists() {
        let response = serde_json::from_str::<LoginResponse>(
            r#"{"token":"token-1","username":"csb1","groups":null}"#,
        );
        assert!(response.is_ok());
        let Ok(response) = response else {
            return;
        };

        let grant = LoginGrant::from(response);
        assert_eq!(grant.token.as_deref(), Some("token-1"));
        assert_eq!(grant.full_name, None);
        assert!(grant.groups.is_empty());
        assert!(grant.roles.is_empty());
    }
}
