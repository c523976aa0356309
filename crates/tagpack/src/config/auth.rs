//! Credentials for the hosted VCS APIs
//!
//! Loaded from:
//! - `<composer home>/auth.json` (global)
//! - `./auth.json` (project-local)
//! - Environment variable `COMPOSER_AUTH`
//!
//! # auth.json format
//!
//! ```json
//! {
//!     "github-oauth": {
//!         "github.com": "token"
//!     },
//!     "gitlab-oauth": {
//!         "gitlab.com": "token"
//!     },
//!     "gitlab-token": {
//!         "gitlab.com": "token"
//!     }
//! }
//! ```
//!
//! Other sections Composer understands are accepted and ignored.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::source::ConfigLoader;
use crate::error::{Result, TagpackError};

/// GitLab private token, either bare or wrapped in an object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum GitLabAuth {
    Token(String),
    OAuth {
        #[serde(rename = "oauth-token")]
        oauth_token: String,
    },
}

impl GitLabAuth {
    pub fn token(&self) -> &str {
        match self {
            GitLabAuth::Token(t) => t,
            GitLabAuth::OAuth { oauth_token } => oauth_token,
        }
    }
}

/// Per-domain API credentials
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(rename = "github-oauth", default, skip_serializing_if = "HashMap::is_empty")]
    pub github_oauth: HashMap<String, String>,

    #[serde(rename = "gitlab-oauth", default, skip_serializing_if = "HashMap::is_empty")]
    pub gitlab_oauth: HashMap<String, String>,

    #[serde(rename = "gitlab-token", default, skip_serializing_if = "HashMap::is_empty")]
    pub gitlab_token: HashMap<String, GitLabAuth>,
}

impl AuthConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load auth config from a file; a missing file yields an empty config
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| TagpackError::Config(format!("Failed to read {}: {}", path.display(), e)))?;

        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| TagpackError::Config(format!("Failed to parse auth.json: {}", e)))
    }

    /// Load auth config from the COMPOSER_AUTH environment variable
    pub fn from_env() -> Result<Option<Self>> {
        match std::env::var("COMPOSER_AUTH") {
            Ok(json) if !json.is_empty() => Ok(Some(Self::from_json(&json)?)),
            _ => Ok(None),
        }
    }

    /// Build complete auth config from all sources
    ///
    /// Priority (highest to lowest):
    /// 1. COMPOSER_AUTH environment variable
    /// 2. Project auth.json
    /// 3. Global auth.json
    pub fn build<P: AsRef<Path>>(project_dir: Option<P>) -> Result<Self> {
        let loader = ConfigLoader::new(true);
        let mut config = Self::from_file(loader.get_composer_home().join("auth.json"))?;

        if let Some(project_dir) = project_dir {
            config.merge(Self::from_file(project_dir.as_ref().join("auth.json"))?);
        }

        if let Some(env_config) = Self::from_env()? {
            config.merge(env_config);
        }

        Ok(config)
    }

    /// Merge another auth config into this one (other takes precedence)
    pub fn merge(&mut self, other: AuthConfig) {
        self.github_oauth.extend(other.github_oauth);
        self.gitlab_oauth.extend(other.gitlab_oauth);
        self.gitlab_token.extend(other.gitlab_token);
    }

    pub fn get_github_oauth(&self, domain: &str) -> Option<&str> {
        self.github_oauth.get(domain).map(|s| s.as_str())
    }

    /// GitLab credential for a domain, OAuth tokens first
    pub fn get_gitlab_token(&self, domain: &str) -> Option<&str> {
        self.gitlab_oauth
            .get(domain)
            .map(|s| s.as_str())
            .or_else(|| self.gitlab_token.get(domain).map(|t| t.token()))
    }

    /// Whether the GitLab credential for a domain is an OAuth token
    pub fn is_gitlab_oauth(&self, domain: &str) -> bool {
        self.gitlab_oauth.contains_key(domain)
    }

    pub fn set_github_oauth(&mut self, domain: &str, token: &str) {
        self.github_oauth.insert(domain.to_string(), token.to_string());
    }

    pub fn set_gitlab_token(&mut self, domain: &str, token: &str) {
        self.gitlab_token
            .insert(domain.to_string(), GitLabAuth::Token(token.to_string()));
    }

    pub fn is_empty(&self) -> bool {
        self.github_oauth.is_empty() && self.gitlab_oauth.is_empty() && self.gitlab_token.is_empty()
    }
}
