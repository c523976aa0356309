use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// The tagpack configuration file structure (tagpack.toml)
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TagpackConfig {
    /// Defaults for `tagpack scan`
    pub scan: ScanConfig,

    /// Extra credentials, merged over auth.json
    pub auth: AuthSection,
}

/// Scan defaults
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Access method tag (e.g. "git", "github"); "vcs" auto-detects
    #[serde(rename = "type")]
    pub vcs_type: Option<String>,

    /// Output format ("text" or "json")
    pub format: Option<String>,
}

/// Tokens keyed by host
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AuthSection {
    #[serde(rename = "github-oauth")]
    pub github_oauth: HashMap<String, String>,

    #[serde(rename = "gitlab-token")]
    pub gitlab_token: HashMap<String, String>,
}

impl TagpackConfig {
    /// Load configuration from tagpack.toml, searching upward from the given directory
    pub fn load(start_dir: &Path) -> Result<Option<Self>> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join("tagpack.toml");

            if config_path.exists() {
                let content = std::fs::read_to_string(&config_path)
                    .with_context(|| format!("Failed to read {}", config_path.display()))?;
                let config: TagpackConfig = toml::from_str(&content)
                    .with_context(|| format!("Failed to parse {}", config_path.display()))?;
                return Ok(Some(config));
            }

            if !current.pop() {
                return Ok(None);
            }
        }
    }
}
