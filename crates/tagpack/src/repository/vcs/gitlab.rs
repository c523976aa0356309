//! GitLab driver - uses the GitLab v4 API for repository access.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::api::{named_refs, ApiAuth, ApiClient};
use super::driver::{parse_composer_json, parse_gitlab_url, VcsDriver, VcsDriverError};
use crate::config::AuthConfig;
use crate::package::{Dist, Source};
use crate::util::base64_decode;

/// GitLab driver for gitlab.com and self-hosted instances
pub struct GitLabDriver {
    url: String,
    /// GitLab host (e.g., "gitlab.com" or self-hosted)
    api_host: String,
    /// Project path (e.g., "owner/repo" or "group/subgroup/repo")
    project_path: String,
    /// URL-encoded project path for API calls
    project_id: String,
    auth: ApiAuth,
    client: Option<ApiClient>,
    root_identifier: Option<String>,
}

impl GitLabDriver {
    pub fn new(url: impl Into<String>) -> Result<Self, VcsDriverError> {
        let url = url.into();

        let (api_host, project_path) = parse_gitlab_url(&url)
            .ok_or_else(|| VcsDriverError::InvalidFormat(format!("Invalid GitLab URL: {}", url)))?;

        let project_id = urlencoding::encode(&project_path).to_string();

        Ok(Self {
            url,
            api_host,
            project_path,
            project_id,
            auth: ApiAuth::None,
            client: None,
            root_identifier: None,
        })
    }

    pub fn with_private_token(mut self, token: impl Into<String>) -> Self {
        self.auth = ApiAuth::PrivateToken(token.into());
        self
    }

    /// Pick up the credential configured for this host
    pub fn with_auth(mut self, auth: &AuthConfig) -> Self {
        if let Some(token) = auth.get_gitlab_token(&self.api_host) {
            self.auth = if auth.is_gitlab_oauth(&self.api_host) {
                ApiAuth::Bearer(token.to_string())
            } else {
                ApiAuth::PrivateToken(token.to_string())
            };
        }
        self
    }

    fn project_endpoint(&self, path: &str) -> String {
        format!(
            "https://{}/api/v4/projects/{}{}",
            self.api_host, self.project_id, path
        )
    }

    fn client(&self) -> Result<&ApiClient, VcsDriverError> {
        self.client
            .as_ref()
            .ok_or_else(|| VcsDriverError::GitError(format!("{} driver is not initialized", self.url)))
    }

    fn list_refs(&self, kind: &str) -> Result<IndexMap<String, String>, VcsDriverError> {
        let items = self.client()?.get_all_pages(&self.project_endpoint(kind))?;
        Ok(named_refs(&items, "id").into_iter().collect())
    }

    fn commit_time(&self, identifier: &str) -> Option<String> {
        let endpoint = self.project_endpoint(&format!(
            "/repository/commits/{}",
            urlencoding::encode(identifier)
        ));
        let commit = self.client().ok()?.get_json(&endpoint).ok()?;

        commit
            .get("committed_date")
            .and_then(|d| d.as_str())
            .map(String::from)
    }
}

impl VcsDriver for GitLabDriver {
    fn initialize(&mut self) -> Result<(), VcsDriverError> {
        if self.root_identifier.is_some() {
            return Ok(());
        }

        let client = ApiClient::new(self.auth.clone(), "application/json")?;
        let project = client.get_json(&self.project_endpoint(""))?;

        let default_branch = project
            .get("default_branch")
            .and_then(|v| v.as_str())
            .unwrap_or("master")
            .to_string();

        log::debug!("{} default branch is {}", self.project_path, default_branch);

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
        self.list_refs("/repository/tags")
    }

    fn get_branches(&self) -> Result<IndexMap<String, String>, VcsDriverError> {
        self.list_refs("/repository/branches")
    }

    fn get_file_content(&self, file: &str, identifier: &str) -> Result<Option<String>, VcsDriverError> {
        let endpoint = self.project_endpoint(&format!(
            "/repository/files/{}?ref={}",
            urlencoding::encode(file),
            urlencoding::encode(identifier)
        ));

        let response = match self.client()?.get_json(&endpoint) {
            Ok(response) => response,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };

        // GitLab returns base64 encoded content
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
        let url = self.project_endpoint(&format!(
            "/repository/archive.zip?sha={}",
            urlencoding::encode(identifier)
        ));
        Some(Dist::zip(url).with_reference(identifier))
    }

    fn get_source(&self, identifier: &str) -> Source {
        Source::git(
            format!("https://{}/{}.git", self.api_host, self.project_path),
            identifier,
        )
    }

    fn get_url(&self) -> &str {
        &self.url
    }
}
