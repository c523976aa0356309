//! Turns a repository's tags and branches into package versions.
//!
//! The scan reads the root revision once to learn the canonical package
//! name, then runs every tag and every branch through its own pipeline.
//! Each item ends in a `Result<Package, SkipReason>`; a failing item never
//! affects the others. Outcomes are folded, in enumeration order, into a
//! [`ScanReport`].

use std::fmt;

use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use tagpack_semver::{VersionParser, VersionParserError, DEFAULT_BRANCH_ALIAS};

use super::driver::{VcsDriver, VcsDriverError};
use super::observer::ScanObserver;
use crate::package::{Package, PackageLoader};

/// Version grammar used to validate tags and branches
pub trait VersionNormalizer: Send + Sync {
    fn normalize(&self, version: &str) -> Result<String, VersionParserError>;

    fn normalize_branch(&self, name: &str) -> Result<String, VersionParserError>;

    /// Normalized version the default branch maps to
    fn default_branch_alias(&self) -> &str {
        DEFAULT_BRANCH_ALIAS
    }
}

impl VersionNormalizer for VersionParser {
    fn normalize(&self, version: &str) -> Result<String, VersionParserError> {
        VersionParser::normalize(self, version)
    }

    fn normalize_branch(&self, name: &str) -> Result<String, VersionParserError> {
        VersionParser::normalize_branch(self, name)
    }
}

/// Whether an item came from a tag or a branch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RefKind {
    Tag,
    Branch,
}

impl fmt::Display for RefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefKind::Tag => write!(f, "tag"),
            RefKind::Branch => write!(f, "branch"),
        }
    }
}

/// Why a tag or branch produced no package
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    InvalidTagName,
    InvalidBranchName,
    /// The revision has no composer.json
    NoComposerFile,
    MetadataFetchFailed(String),
    /// composer.json declares a version that does not normalize
    InvalidVersion { version: String, message: String },
    /// composer.json declares a version other than the tag's
    VersionMismatch {
        tag_normalized: String,
        declared_normalized: String,
    },
    /// The package loader rejected the synthesized data
    InvalidPackage(String),
}

impl SkipReason {
    /// Skips shown even without verbose output: branches whose metadata
    /// could not be read for a reason other than absence
    pub fn is_always_visible(&self, kind: RefKind) -> bool {
        kind == RefKind::Branch && matches!(self, SkipReason::MetadataFetchFailed(_))
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::InvalidTagName => write!(f, "invalid tag name"),
            SkipReason::InvalidBranchName => write!(f, "invalid name"),
            SkipReason::NoComposerFile => write!(f, "no composer file was found"),
            SkipReason::MetadataFetchFailed(message) => write!(f, "{}", message),
            SkipReason::InvalidVersion { version, message } => {
                write!(f, "invalid version \"{}\": {}", version, message)
            }
            SkipReason::VersionMismatch {
                tag_normalized,
                declared_normalized,
            } => write!(
                f,
                "tag ({}) does not match version ({}) in composer.json",
                tag_normalized, declared_normalized
            ),
            SkipReason::InvalidPackage(message) => write!(f, "{}", message),
        }
    }
}

/// A tag or branch that became a package
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedRef {
    pub kind: RefKind,
    pub name: String,
    pub identifier: String,
    pub package: Package,
}

/// A tag or branch that was skipped
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRef {
    pub kind: RefKind,
    pub name: String,
    pub reason: SkipReason,
}

/// Outcome of processing one tag or branch
#[derive(Debug, Clone, PartialEq)]
pub struct ItemOutcome {
    pub kind: RefKind,
    pub name: String,
    pub identifier: String,
    pub result: Result<Package, SkipReason>,
}

/// Everything a scan produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanReport {
    /// Canonical name read from the root revision
    pub package_name: Option<String>,
    pub imported: Vec<ImportedRef>,
    pub skipped: Vec<SkippedRef>,
    /// Tag or branch listings that could not be read
    pub enumeration_errors: Vec<(RefKind, VcsDriverError)>,
}

impl ScanReport {
    pub fn new(package_name: Option<String>) -> Self {
        Self {
            package_name,
            ..Self::default()
        }
    }

    /// Fold step: add one outcome
    pub fn record(mut self, outcome: ItemOutcome) -> Self {
        match outcome.result {
            Ok(package) => self.imported.push(ImportedRef {
                kind: outcome.kind,
                name: outcome.name,
                identifier: outcome.identifier,
                package,
            }),
            Err(reason) => self.skipped.push(SkippedRef {
                kind: outcome.kind,
                name: outcome.name,
                reason,
            }),
        }
        self
    }

    /// Packages in import order
    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        self.imported.iter().map(|i| &i.package)
    }

    pub fn into_packages(self) -> Vec<Package> {
        self.imported.into_iter().map(|i| i.package).collect()
    }

    /// Reason a named tag or branch was skipped
    pub fn skip_reason(&self, kind: RefKind, name: &str) -> Option<&SkipReason> {
        self.skipped
            .iter()
            .find(|s| s.kind == kind && s.name == name)
            .map(|s| &s.reason)
    }
}

lazy_static! {
    static ref RAW_DEV_SUFFIX_RE: Regex = Regex::new(r"(?i)[.-]?dev$").unwrap();
    static ref NORMALIZED_DEV_MARKER_RE: Regex = Regex::new(r"(?i)(^dev-|[.-]?dev$)").unwrap();
}

/// Runs the tag and branch pipelines against one driver
pub struct VcsScanner<'a> {
    normalizer: &'a dyn VersionNormalizer,
    loader: &'a dyn PackageLoader,
    observer: &'a dyn ScanObserver,
}

impl<'a> VcsScanner<'a> {
    pub fn new(
        normalizer: &'a dyn VersionNormalizer,
        loader: &'a dyn PackageLoader,
        observer: &'a dyn ScanObserver,
    ) -> Self {
        Self {
            normalizer,
            loader,
            observer,
        }
    }

    /// Scan every tag, then every branch
    pub fn scan(&self, driver: &dyn VcsDriver) -> ScanReport {
        let package_name = self.resolve_package_name(driver);
        let mut enumeration_errors = Vec::new();

        let tags = self.enumerate(RefKind::Tag, driver.get_tags(), &mut enumeration_errors);
        let report = tags
            .iter()
            .map(|(name, id)| self.process(driver, package_name.as_deref(), RefKind::Tag, name, id))
            .fold(ScanReport::new(package_name.clone()), ScanReport::record);

        let branches = self.enumerate(RefKind::Branch, driver.get_branches(), &mut enumeration_errors);
        let mut report = branches
            .iter()
            .map(|(name, id)| self.process(driver, package_name.as_deref(), RefKind::Branch, name, id))
            .fold(report, ScanReport::record);

        report.enumeration_errors = enumeration_errors;
        self.observer.scan_finished(&report);
        report
    }

    /// Normalized tag version, or `None` if the tag name is not a version
    pub fn validate_tag(&self, name: &str) -> Option<String> {
        self.normalizer.normalize(name).ok()
    }

    /// Normalized branch version, or `None` if the name is unusable
    pub fn validate_branch(&self, name: &str) -> Option<String> {
        let name = name.trim();
        let normalized = self.normalizer.normalize_branch(name).ok()?;

        // a branch named `dev` cannot be written with a single dev marker
        if self.takes_dev_prefix(&normalized) && dev_branch_stem(name).eq_ignore_ascii_case("dev") {
            return None;
        }

        Some(normalized)
    }

    fn takes_dev_prefix(&self, normalized: &str) -> bool {
        normalized.starts_with("dev-") || normalized == self.normalizer.default_branch_alias()
    }

    fn resolve_package_name(&self, driver: &dyn VcsDriver) -> Option<String> {
        let root = match driver.get_root_identifier() {
            Ok(root) => root,
            Err(e) => {
                self.observer.root_skipped(&e);
                return None;
            }
        };

        if !driver.has_composer_file(&root) {
            self.observer.root_resolved(None);
            return None;
        }

        match driver.get_composer_information(&root) {
            Ok(Some(data)) => {
                let name = data
                    .get("name")
                    .and_then(Value::as_str)
                    .filter(|n| !n.is_empty())
                    .map(String::from);
                self.observer.root_resolved(name.as_deref());
                name
            }
            Ok(None) => {
                self.observer.root_resolved(None);
                None
            }
            Err(e) => {
                self.observer.root_skipped(&e);
                None
            }
        }
    }

    fn enumerate(
        &self,
        kind: RefKind,
        listing: Result<IndexMap<String, String>, VcsDriverError>,
        errors: &mut Vec<(RefKind, VcsDriverError)>,
    ) -> IndexMap<String, String> {
        listing.unwrap_or_else(|e| {
            self.observer.enumeration_failed(kind, &e);
            errors.push((kind, e));
            IndexMap::new()
        })
    }

    fn process(
        &self,
        driver: &dyn VcsDriver,
        package_name: Option<&str>,
        kind: RefKind,
        name: &str,
        identifier: &str,
    ) -> ItemOutcome {
        self.observer.item_started(kind, name);

        let result = match kind {
            RefKind::Tag => self.tag_package(driver, package_name, name, identifier),
            RefKind::Branch => self.branch_package(driver, package_name, name, identifier),
        };

        match &result {
            Ok(package) => self.observer.item_imported(kind, name, package),
            Err(reason) => self.observer.item_skipped(kind, name, reason),
        }

        ItemOutcome {
            kind,
            name: name.to_string(),
            identifier: identifier.to_string(),
            result,
        }
    }

    fn tag_package(
        &self,
        driver: &dyn VcsDriver,
        package_name: Option<&str>,
        tag: &str,
        identifier: &str,
    ) -> Result<Package, SkipReason> {
        let tag_normalized = self.validate_tag(tag).ok_or(SkipReason::InvalidTagName)?;
        let mut data = self.fetch_metadata(driver, identifier)?;

        let (version, normalized) = match data.get("version") {
            None | Some(Value::Null) => (tag.to_string(), tag_normalized.clone()),
            Some(Value::String(declared)) => {
                let normalized = self.normalizer.normalize(declared).map_err(|e| {
                    SkipReason::InvalidVersion {
                        version: declared.clone(),
                        message: e.to_string(),
                    }
                })?;
                (declared.clone(), normalized)
            }
            Some(other) => {
                return Err(SkipReason::InvalidVersion {
                    version: other.to_string(),
                    message: "version must be a string".to_string(),
                })
            }
        };

        // tags are never dev versions
        let version = RAW_DEV_SUFFIX_RE.replace(&version, "").into_owned();
        let normalized = NORMALIZED_DEV_MARKER_RE.replace(&normalized, "").into_owned();

        if normalized != tag_normalized {
            return Err(SkipReason::VersionMismatch {
                tag_normalized,
                declared_normalized: normalized,
            });
        }

        data.insert("version".to_string(), Value::String(version));
        data.insert("version_normalized".to_string(), Value::String(normalized));

        self.synthesize(driver, package_name, data, identifier)
    }

    fn branch_package(
        &self,
        driver: &dyn VcsDriver,
        package_name: Option<&str>,
        branch: &str,
        identifier: &str,
    ) -> Result<Package, SkipReason> {
        let branch = branch.trim();
        let normalized = self.validate_branch(branch).ok_or(SkipReason::InvalidBranchName)?;
        let mut data = self.fetch_metadata(driver, identifier)?;

        let version = if self.takes_dev_prefix(&normalized) {
            format!("dev-{}", dev_branch_stem(branch))
        } else {
            format!("{}-dev", branch)
        };

        data.insert("version".to_string(), Value::String(version));
        data.insert("version_normalized".to_string(), Value::String(normalized));

        self.synthesize(driver, package_name, data, identifier)
    }

    fn fetch_metadata(&self, driver: &dyn VcsDriver, identifier: &str) -> Result<Map<String, Value>, SkipReason> {
        match driver.get_composer_information(identifier) {
            Ok(Some(data)) => Ok(data),
            Ok(None) => Err(SkipReason::NoComposerFile),
            Err(e) if e.is_not_found() => Err(SkipReason::NoComposerFile),
            Err(e) => Err(SkipReason::MetadataFetchFailed(e.to_string())),
        }
    }

    fn synthesize(
        &self,
        driver: &dyn VcsDriver,
        package_name: Option<&str>,
        mut data: Map<String, Value>,
        identifier: &str,
    ) -> Result<Package, SkipReason> {
        if let Some(name) = package_name {
            data.insert("name".to_string(), Value::String(name.to_string()));
        }

        if data.get("dist").map_or(true, Value::is_null) {
            if let Some(dist) = driver.get_dist(identifier) {
                data.insert("dist".to_string(), to_value(&dist)?);
            }
        }

        if data.get("source").map_or(true, Value::is_null) {
            data.insert("source".to_string(), to_value(&driver.get_source(identifier))?);
        }

        self.loader
            .load(data)
            .map_err(|e| SkipReason::InvalidPackage(e.to_string()))
    }
}

/// Branch name without trailing `-dev` markers, so `feature-dev` reads `dev-feature`
fn dev_branch_stem(name: &str) -> &str {
    let mut stem = name;
    loop {
        let cut = stem.len().saturating_sub(4);
        match stem.get(cut..) {
            Some(suffix) if cut > 0 && suffix.eq_ignore_ascii_case("-dev") => stem = &stem[..cut],
            _ => return stem,
        }
    }
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, SkipReason> {
    serde_json::to_value(value).map_err(|e| SkipReason::InvalidPackage(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::{ArrayLoader, Dist};
    use crate::repository::vcs::observer::NullObserver;
    use crate::repository::vcs::testing::FakeDriver;
    use serde_json::json;
    use std::sync::Mutex;

    fn scan(driver: &FakeDriver) -> ScanReport {
        let parser = VersionParser::new();
        VcsScanner::new(&parser, &ArrayLoader, &NullObserver).scan(driver)
    }

    fn versions(report: &ScanReport) -> Vec<&str> {
        report.packages().map(|p| p.version.as_str()).collect()
    }

    #[test]
    fn test_tag_without_declared_version() {
        let driver = FakeDriver::new("https://example.org/acme/pkg.git")
            .root(json!({"name": "acme/pkg"}))
            .tag("1.0.0", "r1", json!({"name": "acme/pkg", "version": "1.0.0"}))
            .tag("v1.1.0", "r2", json!({"name": "acme/pkg"}));

        let report = scan(&driver);

        assert_eq!(report.package_name.as_deref(), Some("acme/pkg"));
        assert_eq!(versions(&report), vec!["1.0.0", "v1.1.0"]);

        let first = &report.imported[0].package;
        assert_eq!(first.name, "acme/pkg");
        assert_eq!(first.version_normalized, VersionParser::new().normalize("1.0.0").unwrap());
        assert_eq!(report.imported[1].package.version_normalized, "1.1.0.0");
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_tag_with_mismatched_version_is_skipped() {
        let driver = FakeDriver::new("repo")
            .tag("2.0.0", "r1", json!({"name": "acme/pkg", "version": "2.1.0"}))
            .tag("2.0.1", "r2", json!({"name": "acme/pkg"}));

        let report = scan(&driver);

        assert_eq!(versions(&report), vec!["2.0.1"]);
        assert_eq!(
            report.skip_reason(RefKind::Tag, "2.0.0"),
            Some(&SkipReason::VersionMismatch {
                tag_normalized: "2.0.0.0".to_string(),
                declared_normalized: "2.1.0.0".to_string(),
            })
        );
    }

    #[test]
    fn test_tag_dev_suffix_is_stripped() {
        let driver = FakeDriver::new("repo")
            .tag("2.0.0", "r1", json!({"name": "acme/pkg", "version": "2.0.0-dev"}));

        let report = scan(&driver);

        let package = &report.imported[0].package;
        assert_eq!(package.version, "2.0.0");
        assert_eq!(package.version_normalized, "2.0.0.0");
        assert!(!package.is_dev());
    }

    #[test]
    fn test_tag_with_unparseable_declared_version() {
        let driver = FakeDriver::new("repo")
            .tag("1.0.0", "r1", json!({"name": "acme/pkg", "version": "not a version"}))
            .tag("1.0.1", "r2", json!({"name": "acme/pkg", "version": 101}));

        let report = scan(&driver);

        assert!(report.imported.is_empty());
        assert!(matches!(
            report.skip_reason(RefKind::Tag, "1.0.0"),
            Some(SkipReason::InvalidVersion { .. })
        ));
        assert!(matches!(
            report.skip_reason(RefKind::Tag, "1.0.1"),
            Some(SkipReason::InvalidVersion { .. })
        ));
    }

    #[test]
    fn test_invalid_tag_names_are_skipped() {
        let driver = FakeDriver::new("repo")
            .tag("latest", "r1", json!({"name": "acme/pkg"}))
            .tag("1.0.0", "r2", json!({"name": "acme/pkg"}));

        let report = scan(&driver);

        assert_eq!(versions(&report), vec!["1.0.0"]);
        assert_eq!(report.skip_reason(RefKind::Tag, "latest"), Some(&SkipReason::InvalidTagName));
    }

    #[test]
    fn test_multibyte_tag_name_is_skipped() {
        let driver = FakeDriver::new("repo")
            .tag("1é€", "r1", json!({"name": "acme/pkg"}))
            .tag("1.0.0", "r2", json!({"name": "acme/pkg"}));

        let report = scan(&driver);

        assert_eq!(versions(&report), vec!["1.0.0"]);
        assert_eq!(report.skip_reason(RefKind::Tag, "1é€"), Some(&SkipReason::InvalidTagName));
    }

    #[test]
    fn test_tag_metadata_failures_are_isolated() {
        let driver = FakeDriver::new("repo")
            .bare_tag("1.0.0", "r1")
            .tag("1.1.0", "r2", json!({"name": "acme/pkg"}))
            .tag("1.2.0", "r3", json!({}))
            .failing("r3", VcsDriverError::Network("timeout".into()))
            .tag("1.3.0", "r4", json!({}))
            .failing("r4", VcsDriverError::FileNotFound("composer.json".into()))
            .tag("1.4.0", "r5", json!({"name": "acme/pkg"}));

        let report = scan(&driver);

        assert_eq!(versions(&report), vec!["1.1.0", "1.4.0"]);
        assert_eq!(report.skip_reason(RefKind::Tag, "1.0.0"), Some(&SkipReason::NoComposerFile));
        assert_eq!(
            report.skip_reason(RefKind::Tag, "1.2.0"),
            Some(&SkipReason::MetadataFetchFailed("Network error: timeout".to_string()))
        );
        assert_eq!(report.skip_reason(RefKind::Tag, "1.3.0"), Some(&SkipReason::NoComposerFile));
    }

    #[test]
    fn test_branch_versions() {
        let driver = FakeDriver::new("repo")
            .branch("master", "b1", json!({"name": "acme/pkg"}))
            .branch("2.1", "b2", json!({"name": "acme/pkg", "version": "9.9.9"}))
            .branch("feature/login", "b3", json!({"name": "acme/pkg"}))
            .branch("v3.x", "b4", json!({"name": "acme/pkg"}));

        let report = scan(&driver);

        assert_eq!(
            versions(&report),
            vec!["dev-master", "2.1-dev", "dev-feature/login", "v3.x-dev"]
        );
        let normalized: Vec<_> = report.packages().map(|p| p.version_normalized.as_str()).collect();
        assert_eq!(
            normalized,
            vec![
                "9999999-dev",
                "2.1.9999999.9999999-dev",
                "dev-feature/login",
                "3.9999999.9999999.9999999-dev"
            ]
        );

        for version in versions(&report) {
            assert!(version.starts_with("dev-") ^ version.ends_with("-dev"), "{}", version);
        }
    }

    #[test]
    fn test_branch_names_carrying_dev_marker() {
        let driver = FakeDriver::new("repo")
            .branch("feature-dev", "b1", json!({"name": "acme/pkg"}))
            .branch("2.1-dev", "b2", json!({"name": "acme/pkg"}))
            .branch("topic-DEV-dev", "b3", json!({"name": "acme/pkg"}))
            .branch(" spaced", "b4", json!({"name": "acme/pkg"}))
            .branch("dev", "b5", json!({"name": "acme/pkg"}));

        let report = scan(&driver);

        assert_eq!(
            versions(&report),
            vec!["dev-feature", "dev-2.1", "dev-topic", "dev-spaced"]
        );
        let normalized: Vec<_> = report.packages().map(|p| p.version_normalized.as_str()).collect();
        assert_eq!(normalized[0], "dev-feature-dev");
        assert_eq!(normalized[3], "dev-spaced");
        assert_eq!(report.skip_reason(RefKind::Branch, "dev"), Some(&SkipReason::InvalidBranchName));

        for version in versions(&report) {
            assert!(version.starts_with("dev-") ^ version.ends_with("-dev"), "{}", version);
        }
    }

    #[test]
    fn test_dev_branch_stem() {
        assert_eq!(dev_branch_stem("feature-dev"), "feature");
        assert_eq!(dev_branch_stem("feature-Dev-dev"), "feature");
        assert_eq!(dev_branch_stem("feature"), "feature");
        assert_eq!(dev_branch_stem("-dev"), "-dev");
        assert_eq!(dev_branch_stem("dev-dev"), "dev");
        assert_eq!(dev_branch_stem("é-dev"), "é");
        assert_eq!(dev_branch_stem("€"), "€");
    }

    #[test]
    fn test_branch_failures() {
        let driver = FakeDriver::new("repo")
            .branch("bad name", "b0", json!({"name": "acme/pkg"}))
            .bare_branch("docs", "b1")
            .branch("gone", "b2", json!({}))
            .failing("b2", VcsDriverError::NotFound("b2".into()))
            .branch("flaky", "b3", json!({}))
            .failing("b3", VcsDriverError::AuthRequired("b3".into()))
            .branch("main", "b4", json!({"name": "acme/pkg"}));

        let report = scan(&driver);

        assert_eq!(versions(&report), vec!["dev-main"]);
        assert_eq!(report.skip_reason(RefKind::Branch, "bad name"), Some(&SkipReason::InvalidBranchName));
        assert_eq!(report.skip_reason(RefKind::Branch, "docs"), Some(&SkipReason::NoComposerFile));
        assert_eq!(report.skip_reason(RefKind::Branch, "gone"), Some(&SkipReason::NoComposerFile));

        let flaky = report.skip_reason(RefKind::Branch, "flaky").unwrap();
        assert!(matches!(flaky, SkipReason::MetadataFetchFailed(_)));
        assert!(flaky.is_always_visible(RefKind::Branch));
    }

    #[test]
    fn test_canonical_name_overrides_item_names() {
        let driver = FakeDriver::new("repo")
            .root(json!({"name": "Acme/Pkg"}))
            .tag("1.0.0", "r1", json!({"name": "old/name"}))
            .branch("develop", "b1", json!({}));

        let report = scan(&driver);

        for package in report.packages() {
            assert_eq!(package.pretty_name, "Acme/Pkg");
            assert_eq!(package.name, "acme/pkg");
        }
        assert_eq!(report.imported.len(), 2);
    }

    #[test]
    fn test_root_failure_keeps_item_names() {
        let driver = FakeDriver::new("repo")
            .root_error(VcsDriverError::Network("connection reset".into()))
            .tag("1.0.0", "r1", json!({"name": "acme/one"}))
            .tag("1.1.0", "r2", json!({"name": "acme/two"}));

        let report = scan(&driver);

        assert_eq!(report.package_name, None);
        let names: Vec<_> = report.packages().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["acme/one", "acme/two"]);
    }

    #[test]
    fn test_missing_name_is_loader_rejection() {
        let driver = FakeDriver::new("repo")
            .tag("1.0.0", "r1", json!({"description": "nameless"}))
            .tag("1.1.0", "r2", json!({"name": "acme/pkg", "require": "php"}))
            .tag("1.2.0", "r3", json!({"name": "acme/pkg"}));

        let report = scan(&driver);

        assert_eq!(versions(&report), vec!["1.2.0"]);
        assert!(matches!(
            report.skip_reason(RefKind::Tag, "1.0.0"),
            Some(SkipReason::InvalidPackage(_))
        ));
        assert!(matches!(
            report.skip_reason(RefKind::Tag, "1.1.0"),
            Some(SkipReason::InvalidPackage(_))
        ));
    }

    #[test]
    fn test_dist_and_source_filled_from_driver() {
        let driver = FakeDriver::new("https://example.org/acme/pkg.git")
            .tag("1.0.0", "r1", json!({"name": "acme/pkg"}))
            .tag(
                "1.1.0",
                "r2",
                json!({
                    "name": "acme/pkg",
                    "dist": {"type": "tar", "url": "https://mirror.example.org/pkg.tar"}
                }),
            );

        let report = scan(&driver);

        let first = &report.imported[0].package;
        assert_eq!(
            first.dist,
            Some(Dist::zip("https://dist.example.org/r1.zip").with_reference("r1"))
        );
        let source = first.source.as_ref().unwrap();
        assert_eq!(source.url, "https://example.org/acme/pkg.git");
        assert_eq!(source.reference, "r1");

        let second = &report.imported[1].package;
        assert_eq!(second.dist.as_ref().unwrap().dist_type, "tar");
        assert_eq!(second.reference(), Some("r2"));
    }

    #[test]
    fn test_tags_processed_before_branches() {
        let driver = FakeDriver::new("repo")
            .branch("main", "b1", json!({"name": "acme/pkg"}))
            .tag("1.0.0", "r1", json!({"name": "acme/pkg"}));

        let report = scan(&driver);

        let kinds: Vec<_> = report.imported.iter().map(|i| i.kind).collect();
        assert_eq!(kinds, vec![RefKind::Tag, RefKind::Branch]);
    }

    #[test]
    fn test_tag_enumeration_failure_still_scans_branches() {
        let driver = FakeDriver::new("repo")
            .tag("1.0.0", "r1", json!({"name": "acme/pkg"}))
            .failing_tags(VcsDriverError::RateLimited("api".into()))
            .branch("main", "b1", json!({"name": "acme/pkg"}));

        let report = scan(&driver);

        assert_eq!(versions(&report), vec!["dev-main"]);
        assert_eq!(report.enumeration_errors.len(), 1);
        assert_eq!(report.enumeration_errors[0].0, RefKind::Tag);
    }

    #[test]
    fn test_repeated_scans_are_identical() {
        let driver = FakeDriver::new("repo")
            .root(json!({"name": "acme/pkg"}))
            .tag("1.0.0", "r1", json!({"time": "2024-03-01 10:00:00"}))
            .tag("oops", "r2", json!({}))
            .branch("1.x", "b1", json!({}));

        assert_eq!(scan(&driver), scan(&driver));
    }

    #[test]
    fn test_validate_helpers() {
        let parser = VersionParser::new();
        let scanner = VcsScanner::new(&parser, &ArrayLoader, &NullObserver);

        assert_eq!(scanner.validate_tag("v1.2.3"), Some("1.2.3.0".to_string()));
        assert_eq!(scanner.validate_tag("not-a-version"), None);
        assert_eq!(scanner.validate_branch("master"), Some("9999999-dev".to_string()));
        assert_eq!(scanner.validate_branch("with space"), None);
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl ScanObserver for Recorder {
        fn root_resolved(&self, name: Option<&str>) {
            self.events.lock().unwrap().push(format!("root {:?}", name));
        }

        fn root_skipped(&self, _error: &VcsDriverError) {
            self.events.lock().unwrap().push("root skipped".to_string());
        }

        fn item_started(&self, kind: RefKind, name: &str) {
            self.events.lock().unwrap().push(format!("start {} {}", kind, name));
        }

        fn item_skipped(&self, kind: RefKind, name: &str, _reason: &SkipReason) {
            self.events.lock().unwrap().push(format!("skip {} {}", kind, name));
        }

        fn item_imported(&self, kind: RefKind, name: &str, _package: &Package) {
            self.events.lock().unwrap().push(format!("import {} {}", kind, name));
        }

        fn scan_finished(&self, report: &ScanReport) {
            self.events
                .lock()
                .unwrap()
                .push(format!("done {}", report.imported.len()));
        }
    }

    #[test]
    fn test_observer_sees_pipeline_points() {
        let driver = FakeDriver::new("repo")
            .root(json!({"name": "acme/pkg"}))
            .tag("nope", "r1", json!({}))
            .branch("main", "b1", json!({}));

        let parser = VersionParser::new();
        let recorder = Recorder::default();
        VcsScanner::new(&parser, &ArrayLoader, &recorder).scan(&driver);

        assert_eq!(
            *recorder.events.lock().unwrap(),
            vec![
                "root Some(\"acme/pkg\")",
                "start tag nope",
                "skip tag nope",
                "start branch main",
                "import branch main",
                "done 1",
            ]
        );
    }

    fn root_events(driver: FakeDriver) -> Vec<String> {
        let parser = VersionParser::new();
        let recorder = Recorder::default();
        VcsScanner::new(&parser, &ArrayLoader, &recorder).scan(&driver);
        let events = recorder.events.lock().unwrap().clone();
        events.into_iter().filter(|e| e.starts_with("root")).collect()
    }

    #[test]
    fn test_root_without_composer_file_is_silent() {
        assert_eq!(root_events(FakeDriver::new("repo")), vec!["root None"]);
        assert_eq!(
            root_events(FakeDriver::new("repo").root_error(VcsDriverError::FileNotFound("composer.json".into()))),
            vec!["root None"]
        );
        assert_eq!(
            root_events(FakeDriver::new("repo").root_error(VcsDriverError::Network("connection reset".into()))),
            vec!["root skipped"]
        );
    }
}
