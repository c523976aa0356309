use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, TagpackError};

/// Raw configuration data as found in a Composer `config.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<HashMap<String, serde_json::Value>>,
}

/// Locates Composer directories and loads configuration files
#[derive(Debug)]
pub struct ConfigLoader {
    use_environment: bool,
}

impl ConfigLoader {
    pub fn new(use_environment: bool) -> Self {
        Self { use_environment }
    }

    /// Get COMPOSER_* environment variable
    pub fn get_composer_env(&self, var: &str) -> Option<String> {
        if !self.use_environment {
            return None;
        }

        env::var(var).ok().filter(|s| !s.is_empty())
    }

    /// Get the composer home directory
    pub fn get_composer_home(&self) -> PathBuf {
        if let Some(home) = self.get_composer_env("COMPOSER_HOME") {
            return PathBuf::from(home);
        }

        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "composer") {
            proj_dirs.config_dir().to_path_buf()
        } else if let Some(base_dirs) = directories::BaseDirs::new() {
            base_dirs.home_dir().join(".composer")
        } else {
            PathBuf::from(".composer")
        }
    }

    /// Get the cache directory
    pub fn get_cache_dir(&self) -> PathBuf {
        if let Some(cache) = self.get_composer_env("COMPOSER_CACHE_DIR") {
            return PathBuf::from(cache);
        }

        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "composer") {
            proj_dirs.cache_dir().to_path_buf()
        } else {
            self.get_composer_home().join("cache")
        }
    }

    /// Load configuration from a JSON file; a missing file is an empty config
    pub fn load_config_file<P: AsRef<Path>>(&self, path: P) -> Result<RawConfig> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(RawConfig::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| TagpackError::Config(format!("Failed to read {}: {}", path.display(), e)))?;

        serde_json::from_str(&contents)
            .map_err(|e| TagpackError::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Load global configuration from `<composer home>/config.json`
    pub fn load_global_config(&self) -> Result<RawConfig> {
        self.load_config_file(self.get_composer_home().join("config.json"))
    }

    /// Get a configuration value from environment variable
    /// Converts "foo-bar" to "COMPOSER_FOO_BAR"
    pub fn get_env_config(&self, key: &str) -> Option<String> {
        let env_var = format!("COMPOSER_{}", key.replace('-', "_").to_uppercase());
        self.get_composer_env(&env_var)
    }

    /// Get boolean value from environment variable
    pub fn get_env_bool(&self, key: &str) -> Option<bool> {
        self.get_env_config(key)
            .map(|val| !matches!(val.to_lowercase().as_str(), "false" | "0"))
    }
}
