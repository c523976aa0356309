//! VCS driver trait and common types.


use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

use crate::package::{Dist, Source};

/// Error type for VCS operations
#[derive(Debug, Clone, PartialEq)]
pub enum VcsDriverError {
    /// Repository or resource definitely absent
    NotFound(String),
    /// Authentication required
    AuthRequired(String),
    /// Network error
    Network(String),
    /// Git command failed
    GitError(String),
    /// Invalid repository format
    InvalidFormat(String),
    /// File not found in repository
    FileNotFound(String),
    /// API rate limit exceeded
    RateLimited(String),
}

impl VcsDriverError {
    /// Whether the error means the requested thing is definitely absent,
    /// as opposed to a failure to find out
    pub fn is_not_found(&self) -> bool {
        matches!(self, VcsDriverError::NotFound(_) | VcsDriverError::FileNotFound(_))
    }
}

impl std::fmt::Display for VcsDriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VcsDriverError::NotFound(msg) => write!(f, "Not found: {}", msg),
            VcsDriverError::AuthRequired(msg) => write!(f, "Authentication required: {}", msg),
            VcsDriverError::Network(msg) => write!(f, "Network error: {}", msg),
            VcsDriverError::GitError(msg) => write!(f, "Git error: {}", msg),
            VcsDriverError::InvalidFormat(msg) => write!(f, "Invalid format: {}", msg),
            VcsDriverError::FileNotFound(msg) => write!(f, "File not found: {}", msg),
            VcsDriverError::RateLimited(msg) => write!(f, "Rate limited: {}", msg),
        }
    }
}

impl std::error::Error for VcsDriverError {}

/// Access to one repository's revisions.
///
/// A driver is bound to a single location and owned by one scan. Probing
/// whether a driver can handle a location is the job of its
/// [`DriverFactory`](super::DriverFactory).
pub trait VcsDriver: Send + Sync {
    /// Complete any setup (API lookups, mirroring). Calling it twice is a no-op.
    fn initialize(&mut self) -> Result<(), VcsDriverError>;

    /// Revision holding the repository's default branch
    fn get_root_identifier(&self) -> Result<String, VcsDriverError>;

    /// Tag name -> revision, in enumeration order
    fn get_tags(&self) -> Result<IndexMap<String, String>, VcsDriverError>;

    /// Branch name -> revision, in enumeration order
    fn get_branches(&self) -> Result<IndexMap<String, String>, VcsDriverError>;

    /// Read a file at a revision. `Ok(None)` when the file does not exist.
    fn get_file_content(&self, file: &str, identifier: &str) -> Result<Option<String>, VcsDriverError>;

    /// Parsed `composer.json` at a revision. `Ok(None)` when there is none.
    fn get_composer_information(
        &self,
        identifier: &str,
    ) -> Result<Option<Map<String, Value>>, VcsDriverError> {
        match self.get_file_content("composer.json", identifier)? {
            Some(content) => parse_composer_json(&content, identifier).map(Some),
            None => Ok(None),
        }
    }

    /// False only when the revision definitely has no `composer.json`;
    /// read errors other than absence count as present
    fn has_composer_file(&self, identifier: &str) -> bool {
        match self.get_file_content("composer.json", identifier) {
            Ok(content) => content.is_some(),
            Err(e) => !e.is_not_found(),
        }
    }

    /// Archive location for a revision, if the host provides one
    fn get_dist(&self, identifier: &str) -> Option<Dist>;

    /// Checkout location for a revision
    fn get_source(&self, identifier: &str) -> Source;

    fn get_url(&self) -> &str;

    /// Release resources held for the scan
    fn cleanup(&mut self) {}
}

/// Parse `composer.json` content, which must hold a JSON object
pub fn parse_composer_json(content: &str, identifier: &str) -> Result<Map<String, Value>, VcsDriverError> {
    match serde_json::from_str(content) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(VcsDriverError::InvalidFormat(format!(
            "composer.json at {} is not a JSON object",
            identifier
        ))),
        Err(e) => Err(VcsDriverError::InvalidFormat(format!(
            "composer.json at {} is invalid: {}",
            identifier, e
        ))),
    }
}

lazy_static! {
    static ref HOSTED_URL_RE: Regex = Regex::new(
        r"^(?:(?:https?|git)://(?:[^@/]+@)?([^/:]+)(?::\d+)?/|git@([^:]+):/?)(.+?)(?:\.git|/)?$"
    )
    .unwrap();
}

/// Split a hosted repository URL into host and project path.
///
/// Handles:
/// - `https://host/owner/repo`
/// - `https://host/group/subgroup/repo.git`
/// - `git@host:owner/repo.git`
/// - `git://host/owner/repo.git`
pub fn parse_hosted_url(url: &str) -> Option<(String, String)> {
    let caps = HOSTED_URL_RE.captures(url.trim())?;
    let host = caps.get(1).or_else(|| caps.get(2))?.as_str().to_lowercase();
    let path = caps.get(3)?.as_str().trim_matches('/').to_string();

    if path.is_empty() {
        return None;
    }
    Some((host, path))
}

/// Parse a GitHub URL into host, owner and repo
pub fn parse_github_url(url: &str) -> Option<(String, String, String)> {
    let (host, path) = parse_hosted_url(url)?;
    let (owner, repo) = path.split_once('/')?;

    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return None;
    }
    Some((host, owner.to_string(), repo.to_string()))
}

/// Parse a GitLab URL into host and project path (groups may nest)
pub fn parse_gitlab_url(url: &str) -> Option<(String, String)> {
    let (host, path) = parse_hosted_url(url)?;
    if !path.contains('/') {
        return None;
    }
    Some((host, path))
}
