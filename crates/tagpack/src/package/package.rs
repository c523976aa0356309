use super::{Dist, Source};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tagpack_semver::{Stability, VersionParser};

/// Default package type when composer.json does not declare one
pub const DEFAULT_PACKAGE_TYPE: &str = "library";

/// A package version synthesized from one tag or branch
///
/// Serializes to the shape of an entry in a Composer `packages.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Package {
    /// Package name (lowercase, vendor/package format)
    #[serde(skip)]
    pub name: String,

    /// Package name as declared
    #[serde(rename = "name")]
    pub pretty_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Version as it appears to users (`1.0.0`, `dev-master`, `2.1-dev`)
    pub version: String,

    /// Normalized form of [`Package::version`]
    pub version_normalized: String,

    #[serde(rename = "type")]
    pub package_type: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub license: Vec<String>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub require: IndexMap<String, String>,

    #[serde(rename = "require-dev", skip_serializing_if = "IndexMap::is_empty")]
    pub require_dev: IndexMap<String, String>,

    /// Commit time of the revision
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dist: Option<Dist>,

    /// Remaining composer.json keys, carried through unchanged
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl Package {
    /// Creates a package with just a name and version
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        version_normalized: impl Into<String>,
    ) -> Self {
        let pretty_name = name.into();
        Self {
            name: pretty_name.to_lowercase(),
            pretty_name,
            description: None,
            version: version.into(),
            version_normalized: version_normalized.into(),
            package_type: DEFAULT_PACKAGE_TYPE.to_string(),
            license: Vec::new(),
            require: IndexMap::new(),
            require_dev: IndexMap::new(),
            time: None,
            source: None,
            dist: None,
            extra: IndexMap::new(),
        }
    }

    pub fn stability(&self) -> Stability {
        VersionParser::parse_stability(&self.version_normalized)
    }

    /// Whether this package tracks a branch rather than a fixed release
    pub fn is_dev(&self) -> bool {
        self.stability() == Stability::Dev
    }

    /// Revision the package points at, preferring the source reference
    pub fn reference(&self) -> Option<&str> {
        self.source
            .as_ref()
            .map(|s| s.reference.as_str())
            .or_else(|| self.dist.as_ref().and_then(|d| d.reference.as_deref()))
    }

    /// Replace `self.version` constraints with the package's own version
    pub fn replace_self_version(&mut self) {
        for constraint in self.require.values_mut().chain(self.require_dev.values_mut()) {
            if constraint == "self.version" {
                *constraint = self.version.clone();
            }
        }
    }
}

impl std::fmt::Display for Package {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.pretty_name, self.version)
    }
}
