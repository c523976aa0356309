//! Blocking JSON client shared by the hosted API drivers.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::StatusCode;
use serde_json::Value;

use super::driver::VcsDriverError;

const USER_AGENT: &str = concat!("tagpack/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const PER_PAGE: usize = 100;
const MAX_PAGES: usize = 100;

/// How a request authenticates
#[derive(Debug, Clone, PartialEq)]
pub enum ApiAuth {
    None,
    Bearer(String),
    /// GitLab private token header
    PrivateToken(String),
}

pub struct ApiClient {
    client: Client,
    auth: ApiAuth,
    accept: &'static str,
}

impl ApiClient {
    pub fn new(auth: ApiAuth, accept: &'static str) -> Result<Self, VcsDriverError> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .gzip(true)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| VcsDriverError::Network(e.to_string()))?;

        Ok(Self { client, auth, accept })
    }

    fn request(&self, url: &str) -> RequestBuilder {
        let request = self.client.get(url).header("Accept", self.accept);
        match &self.auth {
            ApiAuth::None => request,
            ApiAuth::Bearer(token) => request.bearer_auth(token),
            ApiAuth::PrivateToken(token) => request.header("PRIVATE-TOKEN", token),
        }
    }

    /// GET a JSON document
    pub fn get_json(&self, url: &str) -> Result<Value, VcsDriverError> {
        log::debug!("Downloading {}", url);

        let response = self
            .request(url)
            .send()
            .map_err(|e| VcsDriverError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let exhausted = response
                .headers()
                .get("X-RateLimit-Remaining")
                .is_some_and(|v| v.as_bytes() == b"0");
            let body = response.text().unwrap_or_default();
            return Err(status_error(status, exhausted, &body, url));
        }

        response
            .json()
            .map_err(|e| VcsDriverError::InvalidFormat(format!("Invalid JSON response from {}: {}", url, e)))
    }

    /// GET every page of a list endpoint, in order
    pub fn get_all_pages(&self, url: &str) -> Result<Vec<Value>, VcsDriverError> {
        let separator = if url.contains('?') { '&' } else { '?' };
        let mut items = Vec::new();

        for page in 1..=MAX_PAGES {
            let page_url = format!("{}{}per_page={}&page={}", url, separator, PER_PAGE, page);
            let response = self.get_json(&page_url)?;

            let Value::Array(batch) = response else {
                return Err(VcsDriverError::InvalidFormat(format!("Expected a list from {}", url)));
            };

            let done = batch.len() < PER_PAGE;
            items.extend(batch);
            if done {
                break;
            }
        }

        Ok(items)
    }
}

/// Map a failed response onto a driver error
fn status_error(status: StatusCode, rate_limit_exhausted: bool, body: &str, url: &str) -> VcsDriverError {
    match status {
        StatusCode::NOT_FOUND => VcsDriverError::NotFound(url.to_string()),
        StatusCode::TOO_MANY_REQUESTS => VcsDriverError::RateLimited(url.to_string()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            if rate_limit_exhausted || body.to_lowercase().contains("rate limit") {
                VcsDriverError::RateLimited(url.to_string())
            } else {
                VcsDriverError::AuthRequired(url.to_string())
            }
        }
        _ => VcsDriverError::Network(format!("HTTP {} for {}", status.as_u16(), url)),
    }
}

/// Pull `(name, sha)` pairs out of a tags or branches listing
pub(crate) fn named_refs(items: &[Value], sha_field: &str) -> Vec<(String, String)> {
    items
        .iter()
        .filter_map(|item| {
            let name = item.get("name")?.as_str()?;
            let sha = item.get("commit")?.get(sha_field)?.as_str()?;
            Some((name.to_string(), sha.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_mapping() {
        let url = "https://api.example.org/x";
        assert!(status_error(StatusCode::NOT_FOUND, false, "", url).is_not_found());
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN, true, "", url),
            VcsDriverError::RateLimited(_)
        ));
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN, false, "API rate limit exceeded", url),
            VcsDriverError::RateLimited(_)
        ));
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, false, "Bad credentials", url),
            VcsDriverError::AuthRequired(_)
        ));
        assert!(matches!(
            status_error(StatusCode::BAD_GATEWAY, false, "", url),
            VcsDriverError::Network(_)
        ));
    }

    #[test]
    fn test_named_refs() {
        let items = vec![
            json!({"name": "v1.0.0", "commit": {"sha": "aaa"}}),
            json!({"name": "broken"}),
            json!({"name": "v1.1.0", "commit": {"sha": "bbb"}}),
        ];
        assert_eq!(
            named_refs(&items, "sha"),
            vec![
                ("v1.0.0".to_string(), "aaa".to_string()),
                ("v1.1.0".to_string(), "bbb".to_string())
            ]
        );
    }
}
