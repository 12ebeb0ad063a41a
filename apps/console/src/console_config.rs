use std::env;
use std::path::PathBuf;
use std::time::Duration;

use admanager_core::{AppError, AppResult};
use tracing_subscriber::EnvFilter;
use url::Url;

const API_BASE_URL_VAR: &str = "ADMANAGER_API_BASE_URL";
const SESSION_FILE_VAR: &str = "ADMANAGER_SESSION_FILE";
const HTTP_TIMEOUT_VAR: &str = "ADMANAGER_HTTP_TIMEOUT_SECS";

const DEFAULT_API_BASE_URL: &str = "http://localhost:7180";
const DEFAULT_SESSION_FILE: &str = ".admanager/session.json";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    pub api_base_url: String,
    pub session_file: PathBuf,
    pub http_timeout: Duration,
}

impl ConsoleConfig {
    pub fn load() -> AppResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = parse_base_url(
            non_empty(lookup(API_BASE_URL_VAR))
                .as_deref()
                .unwrap_or(DEFAULT_API_BASE_URL),
        )?;
        let session_file = non_empty(lookup(SESSION_FILE_VAR))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE));
        let http_timeout_secs = match non_empty(lookup(HTTP_TIMEOUT_VAR)) {
            Some(value) => value.parse::<u64>().map_err(|error| {
                AppError::Validation(format!(
                    "invalid {HTTP_TIMEOUT_VAR} value '{value}': {error}"
                ))
            })?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        if http_timeout_secs == 0 {
            return Err(AppError::Validation(format!(
                "{HTTP_TIMEOUT_VAR} must be greater than zero"
            )));
        }

        Ok(Self {
            api_base_url,
            session_file,
            http_timeout: Duration::from_secs(http_timeout_secs),
        })
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn parse_base_url(value: &str) -> AppResult<String> {
    let url = Url::parse(value).map_err(|error| {
        AppError::Validation(format!("invalid {API_BASE_URL_VAR} '{value}': {error}"))
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::Validation(format!(
            "{API_BASE_URL_VAR} must use http or https, got '{}'",
            url.scheme()
        )));
    }

    Ok(url.as_str().trim_end_matches('/').to_owned())
}
