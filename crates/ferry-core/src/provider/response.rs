//! HTTP plumbing shared by every provider.

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{Error, FetchFailure, Result};

/// Header carrying a provider token, e.g. `("Authorization", "token abc")`.
pub type AuthHeader = (&'static str, String);

/// Build the HTTP client providers share.
pub fn default_client() -> Result<Client> {
    Client::builder()
        .user_agent(concat!("ferry/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))
}

/// GET `url` and return the body as text.
pub(crate) async fn get_text(
    client: &Client,
    provider: &str,
    url: &str,
    auth: Option<AuthHeader>,
) -> Result<String> {
    debug!("{} GET {}", provider, url);
    let has_token = auth.is_some();
    let mut request = client.get(url);
    if let Some((name, value)) = auth {
        request = request.header(name, value);
    }

    let response = request
        .send()
        .await
        .map_err(|e| transport_error(provider, url, &e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(status_error(provider, url, status.as_u16(), has_token));
    }

    response
        .text()
        .await
        .map_err(|e| transport_error(provider, url, &e))
}

/// GET `url` and decode a JSON body.
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    provider: &str,
    url: &str,
    auth: Option<AuthHeader>,
) -> Result<T> {
    let body = get_text(client, provider, url, auth).await?;
    serde_json::from_str(&body).map_err(|e| Error::ProviderFetch {
        provider: provider.to_string(),
        url: url.to_string(),
        failure: FetchFailure::Transport,
        message: format!("{}: unexpected response from {}: {}", provider, url, e),
    })
}

/// Ask the host for its default branch, falling back to
/// [`DEFAULT_BRANCH`](super::DEFAULT_BRANCH) on any failure.
pub(crate) async fn discover_branch<T, F>(
    client: &Client,
    provider: &str,
    url: &str,
    auth: Option<AuthHeader>,
    extract: F,
) -> String
where
    T: DeserializeOwned,
    F: FnOnce(T) -> Option<String>,
{
    match get_json::<T>(client, provider, url, auth).await {
        Ok(info) => match extract(info) {
            Some(branch) if !branch.is_empty() => branch,
            _ => {
                warn!("{}: no default branch in {}, using '{}'", provider, url, super::DEFAULT_BRANCH);
                super::DEFAULT_BRANCH.to_string()
            }
        },
        Err(e) => {
            warn!("{}; using default branch '{}'", e, super::DEFAULT_BRANCH);
            super::DEFAULT_BRANCH.to_string()
        }
    }
}

/// Turn a non-2xx status into a message that says what to check.
pub fn status_error(provider: &str, url: &str, status: u16, has_token: bool) -> Error {
    let failure = FetchFailure::from_status(status);
    let message = match failure {
        FetchFailure::NotFound if has_token => format!(
            "{}: {} was not found (404). Check the repository, ref and path.",
            provider, url
        ),
        FetchFailure::NotFound => format!(
            "{}: {} was not found (404). Check the repository, ref and path; \
             if the registry is private, provide a token.",
            provider, url
        ),
        FetchFailure::Unauthorized if has_token => format!(
            "{}: access to {} was denied ({}). The token may be expired or lack read access.",
            provider, url, status
        ),
        FetchFailure::Unauthorized => format!(
            "{}: access to {} was denied ({}). This registry needs a token.",
            provider, url, status
        ),
        FetchFailure::Status(code) => {
            format!("{}: {} responded with HTTP {}", provider, url, code)
        }
        FetchFailure::Transport => format!("{}: request to {} failed", provider, url),
    };
    Error::ProviderFetch {
        provider: provider.to_string(),
        url: url.to_string(),
        failure,
        message,
    }
}

fn transport_error(provider: &str, url: &str, error: &reqwest::Error) -> Error {
    Error::ProviderFetch {
        provider: provider.to_string(),
        url: url.to_string(),
        failure: FetchFailure::Transport,
        message: format!(
            "{}: could not reach {}: {}. Check your network connection.",
            provider, url, error
        ),
    }
}

/// Percent-encode one URL component.
pub(crate) fn encode_component(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_distinguishes_auth_and_missing() {
        let not_found = status_error("github", "https://x/a.ts", 404, false);
        assert_eq!(not_found.fetch_failure(), Some(FetchFailure::NotFound));
        assert!(not_found.to_string().contains("provide a token"));

        let denied = status_error("github", "https://x/a.ts", 401, true);
        assert_eq!(denied.fetch_failure(), Some(FetchFailure::Unauthorized));
        assert!(denied.to_string().contains("token may be expired"));

        let other = status_error("gitlab", "https://x/a.ts", 502, false);
        assert_eq!(other.fetch_failure(), Some(FetchFailure::Status(502)));
        assert!(other.to_string().contains("HTTP 502"));
    }

    #[test]
    fn test_encode_component() {
        assert_eq!(encode_component("group/repo"), "group%2Frepo");
        assert_eq!(encode_component("src/a b.ts"), "src%2Fa%20b.ts");
    }
}
