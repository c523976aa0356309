//! In-memory drivers for exercising selection and scanning.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::driver::{VcsDriver, VcsDriverError};
use super::registry::{DriverContext, DriverFactory, RepositoryLocation};
use crate::package::{Dist, Source};

#[derive(Clone)]
pub(crate) struct FakeDriver {
    url: String,
    root: String,
    tags: IndexMap<String, String>,
    branches: IndexMap<String, String>,
    metadata: HashMap<String, Result<Option<Map<String, Value>>, VcsDriverError>>,
    tags_error: Option<VcsDriverError>,
    init_error: Option<VcsDriverError>,
    pub initialized: Arc<AtomicUsize>,
    pub cleaned_up: Arc<AtomicUsize>,
}

impl FakeDriver {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            root: "root".to_string(),
            tags: IndexMap::new(),
            branches: IndexMap::new(),
            metadata: HashMap::new(),
            tags_error: None,
            init_error: None,
            initialized: Arc::new(AtomicUsize::new(0)),
            cleaned_up: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Metadata at the root revision
    pub fn root(self, metadata: Value) -> Self {
        let root = self.root.clone();
        self.revision(&root, metadata)
    }

    pub fn root_error(mut self, error: VcsDriverError) -> Self {
        self.metadata.insert(self.root.clone(), Err(error));
        self
    }

    pub fn tag(mut self, name: &str, identifier: &str, metadata: Value) -> Self {
        self.tags.insert(name.to_string(), identifier.to_string());
        self.revision(identifier, metadata)
    }

    pub fn branch(mut self, name: &str, identifier: &str, metadata: Value) -> Self {
        self.branches.insert(name.to_string(), identifier.to_string());
        self.revision(identifier, metadata)
    }

    /// A tag whose revision has no composer.json
    pub fn bare_tag(mut self, name: &str, identifier: &str) -> Self {
        self.tags.insert(name.to_string(), identifier.to_string());
        self
    }

    pub fn bare_branch(mut self, name: &str, identifier: &str) -> Self {
        self.branches.insert(name.to_string(), identifier.to_string());
        self
    }

    /// Fetching metadata at `identifier` fails
    pub fn failing(mut self, identifier: &str, error: VcsDriverError) -> Self {
        self.metadata.insert(identifier.to_string(), Err(error));
        self
    }

    pub fn failing_tags(mut self, error: VcsDriverError) -> Self {
        self.tags_error = Some(error);
        self
    }

    pub fn failing_initialize(mut self, error: VcsDriverError) -> Self {
        self.init_error = Some(error);
        self
    }

    fn revision(mut self, identifier: &str, metadata: Value) -> Self {
        let entry = match metadata {
            Value::Object(map) => Ok(Some(map)),
            _ => Ok(None),
        };
        self.metadata.insert(identifier.to_string(), entry);
        self
    }
}

impl VcsDriver for FakeDriver {
    fn initialize(&mut self) -> Result<(), VcsDriverError> {
        self.initialized.fetch_add(1, Ordering::SeqCst);
        match &self.init_error {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    fn get_root_identifier(&self) -> Result<String, VcsDriverError> {
        Ok(self.root.clone())
    }

    fn get_tags(&self) -> Result<IndexMap<String, String>, VcsDriverError> {
        match &self.tags_error {
            Some(e) => Err(e.clone()),
            None => Ok(self.tags.clone()),
        }
    }

    fn get_branches(&self) -> Result<IndexMap<String, String>, VcsDriverError> {
        Ok(self.branches.clone())
    }

    fn get_file_content(&self, _file: &str, identifier: &str) -> Result<Option<String>, VcsDriverError> {
        self.get_composer_information(identifier)
            .map(|m| m.map(|m| Value::Object(m).to_string()))
    }

    fn get_composer_information(
        &self,
        identifier: &str,
    ) -> Result<Option<Map<String, Value>>, VcsDriverError> {
        self.metadata.get(identifier).cloned().unwrap_or(Ok(None))
    }

    fn get_dist(&self, identifier: &str) -> Option<Dist> {
        Some(Dist::zip(format!("https://dist.example.org/{}.zip", identifier)).with_reference(identifier))
    }

    fn get_source(&self, identifier: &str) -> Source {
        Source::git(self.url.clone(), identifier)
    }

    fn get_url(&self) -> &str {
        &self.url
    }

    fn cleanup(&mut self) {
        self.cleaned_up.fetch_add(1, Ordering::SeqCst);
    }
}

/// Factory handing out clones of one fake driver
pub(crate) struct FakeFactory {
    driver: FakeDriver,
    shallow: bool,
    deep: bool,
    pub created: Arc<AtomicUsize>,
}

impl FakeFactory {
    pub fn new(driver: FakeDriver, shallow: bool, deep: bool) -> Self {
        Self {
            driver,
            shallow,
            deep,
            created: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl DriverFactory for FakeFactory {
    fn supports(&self, _url: &str, _context: &DriverContext, deep: bool) -> bool {
        if deep {
            self.deep
        } else {
            self.shallow
        }
    }

    fn create(
        &self,
        _location: &RepositoryLocation,
        _context: &DriverContext,
    ) -> Result<Box<dyn VcsDriver>, VcsDriverError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(self.driver.clone()))
    }
}
