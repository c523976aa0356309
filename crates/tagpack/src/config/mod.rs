//! Configuration for VCS scanning
//!
//! Settings are read the way Composer reads them, so existing Composer
//! homes work unchanged:
//!
//! # Configuration Sources (in priority order, highest to lowest)
//!
//! 1. Environment variables (`COMPOSER_*`)
//! 2. Global `config.json` in the Composer home (`config` section)
//! 3. Built-in defaults
//!
//! # Authentication
//!
//! Credentials are loaded from `auth.json` files:
//! - Global: `<composer home>/auth.json`
//! - Project: `./auth.json`
//! - Environment: `COMPOSER_AUTH` (JSON string)
//!
//! # Example
//!
//! ```rust,no_run
//! use tagpack::config::{AuthConfig, VcsConfig};
//! use std::path::Path;
//!
//! let config = VcsConfig::build(true).unwrap();
//! let auth = AuthConfig::build(Some(Path::new("/path/to/project"))).unwrap();
//!
//! println!("VCS mirrors: {:?}", config.cache_vcs_dir);
//! if let Some(token) = auth.get_github_oauth("github.com") {
//!     println!("GitHub token: {}", token);
//! }
//! ```

mod auth;
mod source;
mod vcs;

pub use auth::{AuthConfig, GitLabAuth};
pub use source::{ConfigLoader, RawConfig};
pub use vcs::VcsConfig;
