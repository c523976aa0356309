use thiserror::Error;

use crate::repository::vcs::VcsDriverError;

#[derive(Error, Debug)]
pub enum TagpackError {
    // Driver selection errors
    #[error("No driver found to handle VCS repository {url} (type \"{vcs_type}\")")]
    NoDriverFound { url: String, vcs_type: String },

    // Driver setup errors
    #[error("VCS driver error: {0}")]
    Driver(#[from] VcsDriverError),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(String),

    // JSON/parsing errors
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TagpackError>;
