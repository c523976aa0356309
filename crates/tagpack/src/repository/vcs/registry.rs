//! Driver selection.
//!
//! A [`DriverRegistry`] is an ordered list of `(key, factory)` pairs. For a
//! [`RepositoryLocation`] it picks, in order of precedence:
//!
//! 1. the factory registered under the location's exact access-method key,
//! 2. the first factory whose shallow probe accepts the URL,
//! 3. the first factory whose deep probe accepts the URL.

use std::fmt;

use super::driver::{parse_github_url, parse_gitlab_url, VcsDriver, VcsDriverError};
use super::git::GitDriver;
use super::github::GitHubDriver;
use super::gitlab::GitLabDriver;
use crate::config::{AuthConfig, VcsConfig};

/// Where a repository lives and how it was declared
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryLocation {
    url: String,
    vcs_type: String,
}

impl RepositoryLocation {
    pub fn new(url: impl Into<String>, vcs_type: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            vcs_type: vcs_type.into(),
        }
    }

    /// A location whose driver is detected from the URL
    pub fn detect(url: impl Into<String>) -> Self {
        Self::new(url, "vcs")
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn vcs_type(&self) -> &str {
        &self.vcs_type
    }
}

impl fmt::Display for RepositoryLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.url, self.vcs_type)
    }
}

/// Settings and credentials handed to driver factories
#[derive(Debug, Clone, Default)]
pub struct DriverContext {
    pub config: VcsConfig,
    pub auth: AuthConfig,
}

impl DriverContext {
    pub fn new(config: VcsConfig, auth: AuthConfig) -> Self {
        Self { config, auth }
    }
}

/// Probes and instantiates one kind of driver
pub trait DriverFactory: Send + Sync {
    /// Whether drivers of this kind can read `url`. A deep probe may hit
    /// the network.
    fn supports(&self, url: &str, context: &DriverContext, deep: bool) -> bool;

    /// Create an uninitialized driver bound to `location`
    fn create(
        &self,
        location: &RepositoryLocation,
        context: &DriverContext,
    ) -> Result<Box<dyn VcsDriver>, VcsDriverError>;
}

/// The built-in drivers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverKind {
    /// GitHub REST API
    GitHub,
    /// GitLab v4 API
    GitLab,
    /// Git command line
    Git,
}

impl DriverKind {
    /// Registry key
    pub fn key(&self) -> &'static str {
        match self {
            DriverKind::GitHub => "github",
            DriverKind::GitLab => "gitlab",
            DriverKind::Git => "git",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "github" => Some(DriverKind::GitHub),
            "gitlab" => Some(DriverKind::GitLab),
            "git" => Some(DriverKind::Git),
            _ => None,
        }
    }

    /// All kinds, in default selection order
    pub fn all() -> [DriverKind; 3] {
        [DriverKind::GitHub, DriverKind::GitLab, DriverKind::Git]
    }
}

impl DriverFactory for DriverKind {
    fn supports(&self, url: &str, context: &DriverContext, deep: bool) -> bool {
        match self {
            DriverKind::GitHub => {
                context.config.use_github_api
                    && parse_github_url(url).is_some_and(|(host, _, _)| context.config.is_github_domain(&host))
            }
            DriverKind::GitLab => {
                parse_gitlab_url(url).is_some_and(|(host, _)| context.config.is_gitlab_domain(&host))
            }
            DriverKind::Git => GitDriver::supports(url, deep, &context.config),
        }
    }

    fn create(
        &self,
        location: &RepositoryLocation,
        context: &DriverContext,
    ) -> Result<Box<dyn VcsDriver>, VcsDriverError> {
        let url = location.url();
        Ok(match self {
            DriverKind::GitHub => Box::new(GitHubDriver::new(url)?.with_auth(&context.auth)),
            DriverKind::GitLab => Box::new(GitLabDriver::new(url)?.with_auth(&context.auth)),
            DriverKind::Git => Box::new(GitDriver::new(url, &context.config)),
        })
    }
}

/// Ordered `(key, factory)` pairs
pub struct DriverRegistry {
    entries: Vec<(String, Box<dyn DriverFactory>)>,
}

impl DriverRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Add a factory at the end, or replace the one registered under `key`
    /// keeping its position
    pub fn register(&mut self, key: impl Into<String>, factory: impl DriverFactory + 'static) -> &mut Self {
        let key = key.into();
        let factory: Box<dyn DriverFactory> = Box::new(factory);

        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = factory,
            None => self.entries.push((key, factory)),
        }
        self
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Key of the factory that would handle `location`, without creating anything
    pub fn resolve(&self, location: &RepositoryLocation, context: &DriverContext) -> Option<&str> {
        if let Some((key, _)) = self.entries.iter().find(|(k, _)| k == location.vcs_type()) {
            return Some(key);
        }

        for deep in [false, true] {
            if let Some((key, _)) = self
                .entries
                .iter()
                .find(|(_, factory)| factory.supports(location.url(), context, deep))
            {
                return Some(key);
            }
        }

        None
    }

    /// Create and initialize the driver for `location`.
    ///
    /// `Ok(None)` when no factory matches. Creation and initialization
    /// failures are returned as errors.
    pub fn select(
        &self,
        location: &RepositoryLocation,
        context: &DriverContext,
    ) -> Result<Option<Box<dyn VcsDriver>>, VcsDriverError> {
        let Some(key) = self.resolve(location, context) else {
            return Ok(None);
        };
        let Some((_, factory)) = self.entries.iter().find(|(k, _)| k == key) else {
            return Ok(None);
        };

        log::debug!("Using the {} driver for {}", key, location);

        let mut driver = factory.create(location, context)?;
        driver.initialize()?;
        Ok(Some(driver))
    }
}

impl Default for DriverRegistry {
    /// `github`, `gitlab`, `git`
    fn default() -> Self {
        let mut registry = Self::new();
        for kind in DriverKind::all() {
            registry.register(kind.key(), kind);
        }
        registry
    }
}

impl fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.keys()).finish()
    }
}
