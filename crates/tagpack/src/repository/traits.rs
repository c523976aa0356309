use std::sync::Arc;
use async_trait::async_trait;

use crate::package::Package;

/// Repository interface - read-only package source
#[async_trait]
pub trait Repository: Send + Sync {
    /// Get a unique name for this repository
    fn name(&self) -> &str;

    /// Check if the repository contains a package with the given name
    async fn has_package(&self, name: &str) -> bool {
        !self.find_packages(name).await.is_empty()
    }

    /// Find all versions of a package by name
    async fn find_packages(&self, name: &str) -> Vec<Arc<Package>>;

    /// Find a specific package version, by pretty or normalized version
    async fn find_package(&self, name: &str, version: &str) -> Option<Arc<Package>> {
        self.find_packages(name)
            .await
            .into_iter()
            .find(|p| p.version == version || p.version_normalized == version)
    }

    /// Get all packages in the repository
    async fn get_packages(&self) -> Vec<Arc<Package>>;

    /// Get the number of packages in the repository
    async fn count(&self) -> usize {
        self.get_packages().await.len()
    }
}
