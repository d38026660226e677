use crate::utils::error::{ImportError, Result};
use reqwest::Response;
use serde::de::DeserializeOwned;

/// Turns a non-success response into `RemoteError` carrying the body text.
pub async fn ensure_success(service: &str, response: Response) -> Result<Response> {
    let status = response.status();
    tracing::debug!("📡 {} response status: {}", service, status);
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ImportError::RemoteError {
        service: service.to_string(),
        status: status.as_u16(),
        body,
    })
}

pub async fn json_body<T: DeserializeOwned>(service: &str, response: Response) -> Result<T> {
    let response = ensure_success(service, response).await?;
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| ImportError::UnexpectedResponse {
        service: service.to_string(),
        message: format!("{} in body: {}", e, truncate(&text, 200)),
    })
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => format!("{}…", &text[..index]),
        None => text.to_string(),
    }
}

/// Joins a base url and a path without doubling or dropping the slash.
pub fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("https://a.org/api/", "/tokens"), "https://a.org/api/tokens");
        assert_eq!(join_url("https://a.org/api", "users"), "https://a.org/api/users");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("åäö", 2), "åä…");
        assert_eq!(truncate("short", 10), "short");
    }
}
