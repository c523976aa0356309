use std::path::PathBuf;

use serde_json::Value;

use super::source::ConfigLoader;
use crate::error::{Result, TagpackError};

/// Settings consumed by the VCS drivers
#[derive(Debug, Clone, PartialEq)]
pub struct VcsConfig {
    /// Hosts handled by the GitHub API driver
    pub github_domains: Vec<String>,
    /// Hosts handled by the GitLab API driver
    pub gitlab_domains: Vec<String>,
    /// When false, GitHub URLs are read with the plain git driver
    pub use_github_api: bool,
    /// Where remote git repositories are mirrored. `None` mirrors into a
    /// temporary directory removed on cleanup.
    pub cache_vcs_dir: Option<PathBuf>,
    /// Seconds a single git process may run
    pub process_timeout: u64,
}

impl Default for VcsConfig {
    fn default() -> Self {
        Self {
            github_domains: vec!["github.com".to_string()],
            gitlab_domains: vec!["gitlab.com".to_string()],
            use_github_api: true,
            cache_vcs_dir: None,
            process_timeout: 300,
        }
    }
}

impl VcsConfig {
    /// Build from the global `config.json` and, if enabled, the environment
    pub fn build(use_environment: bool) -> Result<Self> {
        let loader = ConfigLoader::new(use_environment);
        let mut config = Self {
            cache_vcs_dir: Some(loader.get_cache_dir().join("vcs")),
            ..Self::default()
        };

        if let Some(values) = loader.load_global_config()?.config {
            for (key, value) in &values {
                config.apply(key, value)?;
            }
        }

        if let Some(timeout) = loader.get_env_config("process-timeout") {
            config.process_timeout = timeout.parse().map_err(|_| {
                TagpackError::Config(format!("COMPOSER_PROCESS_TIMEOUT is not a number: {}", timeout))
            })?;
        }
        if let Some(dir) = loader.get_env_config("cache-vcs-dir") {
            config.cache_vcs_dir = Some(expand_path(&dir));
        }

        Ok(config)
    }

    /// Apply one `config` section entry. Unknown keys are ignored.
    pub fn apply(&mut self, key: &str, value: &Value) -> Result<()> {
        match key {
            "github-domains" => self.github_domains = string_list(key, value)?,
            "gitlab-domains" => self.gitlab_domains = string_list(key, value)?,
            "use-github-api" => {
                self.use_github_api = value
                    .as_bool()
                    .ok_or_else(|| invalid(key, "expected a boolean"))?
            }
            "cache-vcs-dir" => {
                let dir = value.as_str().ok_or_else(|| invalid(key, "expected a string"))?;
                self.cache_vcs_dir = Some(expand_path(dir));
            }
            "process-timeout" => {
                self.process_timeout = value
                    .as_u64()
                    .ok_or_else(|| invalid(key, "expected a non-negative integer"))?
            }
            _ => {}
        }
        Ok(())
    }

    pub fn is_github_domain(&self, host: &str) -> bool {
        self.github_domains.iter().any(|d| d.eq_ignore_ascii_case(host))
    }

    pub fn is_gitlab_domain(&self, host: &str) -> bool {
        self.gitlab_domains.iter().any(|d| d.eq_ignore_ascii_case(host))
    }
}

fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

fn string_list(key: &str, value: &Value) -> Result<Vec<String>> {
    value
        .as_array()
        .and_then(|items| items.iter().map(|v| v.as_str().map(String::from)).collect())
        .ok_or_else(|| invalid(key, "expected a list of strings"))
}

fn invalid(key: &str, message: &str) -> TagpackError {
    TagpackError::Config(format!("Invalid value for \"{}\": {}", key, message))
}
