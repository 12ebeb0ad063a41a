use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Normalizes a configured base URL so paths can be appended directly.
pub(crate) fn normalize_base_url(api_base_url: impl Into<String>) -> String {
    api_base_url.into().trim_end_matches('/').to_owned()
}

pub(crate) fn endpoint(api_base_url: &str, path: &str) -> String {
    if path.starts_with('/') {
        format!("{api_base_url}{path}")
    } else {
        format!("{api_base_url}/{path}")
    }
}

/// Reads the `message` field of a JSON error body, if any.
pub(crate) async fn error_message(response: reqwest::Response) -> Option<String> {
    let body = response.text().await.ok()?;
    parse_error_message(body.as_str())
}

fn parse_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()?
        .message
        .map(|message| message.trim().to_owned())
        .filter(|message| !message.is_empty())
}
