//! VCS repository support - discovers packages from version control systems.
//!
//! This module provides:
//! - Driver selection over an ordered registry (GitHub, GitLab, plain git)
//! - The tag and branch scanner that turns revisions into packages
//! - [`VcsRepository`], which ties both together behind the [`Repository`](super::Repository) trait

mod api;
mod driver;
mod git;
mod github;
mod gitlab;
mod observer;
mod registry;
mod repository;
mod scanner;

#[cfg(test)]
pub(crate) mod testing;

pub use driver::{parse_github_url, parse_gitlab_url, parse_hosted_url, VcsDriver, VcsDriverError};
pub use git::GitDriver;
pub use github::GitHubDriver;
pub use gitlab::GitLabDriver;
pub use observer::{LogObserver, NullObserver, ScanObserver};
pub use registry::{DriverContext, DriverFactory, DriverKind, DriverRegistry, RepositoryLocation};
pub use repository::VcsRepository;
pub use scanner::{
    ImportedRef, ItemOutcome, RefKind, ScanReport, SkipReason, SkippedRef, VcsScanner, VersionNormalizer,
};
