//! GitHub driver - uses the GitHub REST API for repository access.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::api::{named_refs, ApiAuth, ApiClient};
use super::driver::{parse_composer_json, parse_github_url, VcsDriver, VcsDriverError};
use crate::config::AuthConfig;
use crate::package::{Dist, Source};
use crate::util::base64_decode;

/// GitHub driver for GitHub and GitHub Enterprise repositories
pub struct GitHubDriver {
    url: String,
    host: String,
    owner: String,
    repo: String,
    oauth_token: Option<String>,
    client: Option<ApiClient>,
    /// Default branch, resolved by `initialize`
    root_identifier: Option<String>,
}

impl GitHubDriver {
    pub fn new(url: impl Into<String>) -> Result<Self, VcsDriverError> {
        let url = url.into();

        let (host, owner, repo) = parse_github_url(&url)
            .ok_or_else(|| VcsDriverError::InvalidFormat(format!("Invalid GitHub URL: {}", url)))?;

        Ok(Self {
            url,
            host,
            owner,
            repo,
            oauth_token: None,
            client: None,
            root_identifier: None,
        })
    }

    pub fn with_oauth_token(mut self, token: impl Into<String>) -> Self {
        self.oauth_token = Some(token.into());
        self
    }

    /// Pick up the token configured for this host
    pub fn with_auth(mut self, auth: &AuthConfig) -> Self {
        if let Some(token) = auth.get_github_oauth(&self.host) {
            self.oauth_token = Some(token.to_string());
        }
        self
    }

    fn api_base(&self) -> String {
        if self.host == "github.com" {
            "https://api.github.com".to_string()
        } else {
            format!("https://{}/api/v3", self.host)
        }
    }

    fn repo_endpoint(&self, path: &str) -> String {
        format!("{}/repos/{}/{}{}", self.api_base(), self.owner, self.repo, path)
    }

    fn client(&self) -> Result<&ApiClient, VcsDriverError> {
        self.client
            .as_ref()
            .ok_or_else(|| VcsDriverError::GitError(format!("{} driver is not initialized", self.url)))
    }

    fn list_refs(&self, kind: &str) -> Result<IndexMap<String, String>, VcsDriverError> {
        let items = self.client()?.get_all_pages(&self.repo_endpoint(kind))?;
        Ok(named_refs(&items, "sha").into_iter().collect())
    }

    fn commit_time(&self, identifier: &str) -> Option<String> {
        let endpoint = self.repo_endpoint(&format!("/commits/{}", urlencoding::encode(identifier)));
        let commit = self.client().ok()?.get_json(&endpoint).ok()?;

        commit
            .pointer("/commit/committer/date")
            .and_then(|d| d.as_str())
            .map(String::from)
    }
}

impl VcsDriver for GitHubDriver {
    fn initialize(&mut self) -> Result<(), VcsDriverError> {
        if self.root_identifier.is_some() {
            return Ok(());
        }

        let auth = match &self.oauth_token {
            Some(token) => ApiAuth::Bearer(token.clone()),
            None => ApiAuth::None,
        };
        let client = ApiClient::new(auth, "application/vnd.github.v3+json")?;
        let info = client.get_json(&self.repo_endpoint(""))?;

        let default_branch = info
            .get("default_branch")
            .and_then(|v| v.as_str())
            .unwrap_or("master")
            .to_string();

        log::debug!("{}/{} default branch is {}", self.owner, self.repo, default_branch);

        self.client = Some(client);
        self.root_identifier = Some(default_branch);
        Ok(())
    }

    fn get_root_identifier(&self) -> Result<String, VcsDriverError> {
        self.root_identifier
            .clone()
            .ok_or_else(|| VcsDriverError::GitError(format!("{} driver is not initialized", self.url)))
    }

    fn get_tags(&self) -> Result<IndexMap<String, String>, VcsDriverError> {
        self.list_refs("/tags")
    }

    fn get_branches(&self) -> Result<IndexMap<String, String>, VcsDriverError> {
        self.list_refs("/branches")
    }

    fn get_file_content(&self, file: &str, identifier: &str) -> Result<Option<String>, VcsDriverError> {
        let endpoint = self.repo_endpoint(&format!(
            "/contents/{}?ref={}",
            file,
            urlencoding::encode(identifier)
        ));

        let response = match self.client()?.get_json(&endpoint) {
            Ok(response) => response,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };

        // GitHub returns base64 encoded content
        let content = response
            .get("content")
            .and_then(|v| v.as_str())
            .ok_or_else(|| VcsDriverError::InvalidFormat(format!("No content for {} at {}", file, identifier)))?;

        base64_decode(content)
            .map(Some)
            .map_err(|e| VcsDriverError::InvalidFormat(format!("Failed to decode base64: {}", e)))
    }

    fn get_composer_information(
        &self,
        identifier: &str,
    ) -> Result<Option<Map<String, Value>>, VcsDriverError> {
        let Some(content) = self.get_file_content("composer.json", identifier)? else {
            return Ok(None);
        };
        let mut composer = parse_composer_json(&content, identifier)?;

        if !composer.contains_key("time") {
            if let Some(time) = self.commit_time(identifier) {
                composer.insert("time".to_string(), Value::String(time));
            }
        }

        Ok(Some(composer))
    }

    fn get_dist(&self, identifier: &str) -> Option<Dist> {
        let url = self.repo_endpoint(&format!("/zipball/{}", urlencoding::encode(identifier)));
        Some(Dist::zip(url).with_reference(identifier))
    }

    fn get_source(&self, identifier: &str) -> Source {
        Source::git(
            format!("https://{}/{}/{}.git", self.host, self.owner, self.repo),
            identifier,
        )
    }

    fn get_url(&self) -> &str {
        &self.url
    }
}
