use admanager_application::{ResponseDisposition, SessionInterceptor, UNAUTHORIZED_STATUS};
use admanager_core::{AppError, AppResult};
use reqwest::header;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::http_support::{endpoint, error_message, normalize_base_url};

/// Client for console API calls that carry the session's bearer token.
///
/// Every request runs through [`SessionInterceptor`], so a 401 from any
/// endpoint ends the session.
pub struct AuthorizedApiClient {
    http_client: reqwest::Client,
    api_base_url: String,
    interceptor: SessionInterceptor,
}

impl AuthorizedApiClient {
    /// Creates a client rooted at `api_base_url`.
    #[must_use]
    pub fn new(
        http_client: reqwest::Client,
        api_base_url: impl Into<String>,
        interceptor: SessionInterceptor,
    ) -> Self {
        Self {
            http_client,
            api_base_url: normalize_base_url(api_base_url),
            interceptor,
        }
    }

    /// Sends an authorized `GET` and decodes the JSON response.
    pub async fn get_json<T>(&self, path: &str) -> AppResult<T>
    where
        T: DeserializeOwned,
    {
        let request = self
            .http_client
            .get(endpoint(self.api_base_url.as_str(), path));
        self.execute(request, path).await
    }

    /// Sends an authorized `POST` with a JSON body and decodes the response.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> AppResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self
            .http_client
            .post(endpoint(self.api_base_url.as_str(), path))
            .json(body);
        self.execute(request, path).await
    }

    async fn execute<T>(&self, request: reqwest::RequestBuilder, path: &str) -> AppResult<T>
    where
        T: DeserializeOwned,
    {
        let ticket = self.interceptor.before_request();
        let request = match ticket.authorization() {
            Some(authorization) => request.header(header::AUTHORIZATION, authorization),
            None => request,
        };

        let response = request.send().await.map_err(|error| {
            AppError::Transport(format!("failed to call '{path}': {error}"))
        })?;

        let status = response.status();
        let disposition = self.interceptor.after_response(&ticket, status.as_u16());
        if status.as_u16() == UNAUTHORIZED_STATUS {
            if disposition == ResponseDisposition::SessionEnded {
                warn!(path, "session ended by unauthorized response");
            }
            return Err(AppError::Unauthorized(
                "session is no longer valid; sign in again".to_owned(),
            ));
        }

        if !status.is_success() {
            let message = error_message(response).await.unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_owned()
            });
            debug!(path, status = status.as_u16(), "api request rejected");
            return Err(AppError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await.map_err(|error| {
            AppError::Transport(format!("failed to read response body of '{path}': {error}"))
        })?;
        let body = if body.trim().is_empty() {
            "null"
        } else {
            body.as_str()
        };

        serde_json::from_str::<T>(body).map_err(|error| {
            AppError::Internal(format!("failed to parse response body of '{path}': {error}"))
        })
    }
}
