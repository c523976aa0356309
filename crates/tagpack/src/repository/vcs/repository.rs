//! VCS Repository - discovers packages from version control systems.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tagpack_semver::{Comparator, VersionParser};

use super::observer::{LogObserver, ScanObserver};
use super::registry::{DriverContext, DriverRegistry, RepositoryLocation};
use super::scanner::{ScanReport, VcsScanner, VersionNormalizer};
use crate::error::{Result, TagpackError};
use crate::package::{ArrayLoader, Package, PackageLoader};
use crate::repository::traits::Repository;

/// Packages found by the first query, kept for later ones
struct VcsRepositoryState {
    packages: Vec<Arc<Package>>,
    loaded: bool,
}

/// VCS repository - discovers packages from version control systems
pub struct VcsRepository {
    name: String,
    location: RepositoryLocation,
    registry: Arc<DriverRegistry>,
    context: DriverContext,
    normalizer: Arc<dyn VersionNormalizer>,
    loader: Arc<dyn PackageLoader>,
    observer: Arc<dyn ScanObserver>,
    state: Mutex<VcsRepositoryState>,
}

impl std::fmt::Debug for VcsRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f.debug_struct("VcsRepository")
            .field("name", &self.name)
            .field("location", &self.location)
            .field("registry", &self.registry)
            .field("packages", &state.packages.len())
            .field("loaded", &state.loaded)
            .finish()
    }
}

impl VcsRepository {
    /// Repository using the built-in drivers and default settings
    pub fn new(location: RepositoryLocation) -> Self {
        let name = format!("vcs ({})", location.url());

        Self {
            name,
            location,
            registry: Arc::new(DriverRegistry::default()),
            context: DriverContext::default(),
            normalizer: Arc::new(VersionParser::new()),
            loader: Arc::new(ArrayLoader::new()),
            observer: Arc::new(LogObserver),
            state: Mutex::new(VcsRepositoryState {
                packages: Vec::new(),
                loaded: false,
            }),
        }
    }

    pub fn with_registry(mut self, registry: Arc<DriverRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_context(mut self, context: DriverContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn ScanObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_loader(mut self, loader: Arc<dyn PackageLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_normalizer(mut self, normalizer: Arc<dyn VersionNormalizer>) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn location(&self) -> &RepositoryLocation {
        &self.location
    }

    /// Select a driver and scan every tag and branch.
    ///
    /// Each call scans afresh. Fails only when no driver can be set up for
    /// the location; problems with single tags or branches end up in the
    /// report.
    pub fn scan(&self) -> Result<ScanReport> {
        let mut driver = self
            .registry
            .select(&self.location, &self.context)?
            .ok_or_else(|| TagpackError::NoDriverFound {
                url: self.location.url().to_string(),
                vcs_type: self.location.vcs_type().to_string(),
            })?;

        let scanner = VcsScanner::new(&*self.normalizer, &*self.loader, &*self.observer);
        let report = scanner.scan(&*driver);
        driver.cleanup();

        Ok(report)
    }

    /// Scan once and keep the packages; later calls reuse them
    fn load_packages(&self) -> Vec<Arc<Package>> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.loaded {
            return state.packages.clone();
        }

        match run_blocking(|| self.scan()) {
            Ok(report) => {
                state.packages = report.into_packages().into_iter().map(Arc::new).collect();
                state.loaded = true;
            }
            Err(e) => log::warn!("Failed to scan {}: {}", self.location, e),
        }

        state.packages.clone()
    }

    /// Highest stable version of a package
    pub async fn find_latest(&self, name: &str) -> Option<Arc<Package>> {
        self.find_packages(name)
            .await
            .into_iter()
            .filter(|p| !p.is_dev())
            .max_by(|a, b| Comparator::compare(&a.version_normalized, &b.version_normalized))
    }
}

/// Drivers block on network and process I/O; keep that off the async workers
fn run_blocking<T: Send>(f: impl FnOnce() -> T + Send) -> T {
    use tokio::runtime::{Handle, RuntimeFlavor};

    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(f)
        }
        // blocking HTTP clients refuse to run on a current-thread runtime
        Ok(_) => std::thread::scope(|scope| match scope.spawn(f).join() {
            Ok(value) => value,
            Err(panic) => std::panic::resume_unwind(panic),
        }),
        Err(_) => f(),
    }
}

#[async_trait]
impl Repository for VcsRepository {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find_packages(&self, name: &str) -> Vec<Arc<Package>> {
        self.load_packages()
            .into_iter()
            .filter(|p| p.name.eq_ignore_ascii_case(name))
            .collect()
    }

    async fn get_packages(&self) -> Vec<Arc<Package>> {
        self.load_packages()
    }
}
