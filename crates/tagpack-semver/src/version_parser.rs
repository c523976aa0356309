//! Version parsing and normalization module

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use thiserror::Error;

/// Normalized form of the repository's default branch (master/trunk/default)
pub const DEFAULT_BRANCH_ALIAS: &str = "9999999-dev";

/// Placeholder used for wildcard components of numeric branches
const WILDCARD_COMPONENT: &str = "9999999";

/// Stability levels for versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stability {
    Dev,
    Alpha,
    Beta,
    RC,
    Stable,
}

impl Stability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stability::Dev => "dev",
            Stability::Alpha => "alpha",
            Stability::Beta => "beta",
            Stability::RC => "RC",
            Stability::Stable => "stable",
        }
    }
}

impl std::fmt::Display for Stability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error type for version parsing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionParserError {
    #[error("Invalid version string \"{0}\"")]
    InvalidVersion(String),
    #[error("Invalid branch name \"{0}\"")]
    InvalidBranch(String),
}

lazy_static! {
    /// Pre-release / patch modifier, shared by the classical and date patterns
    static ref MODIFIER: &'static str = r"[._-]?(?:(stable|beta|b|RC|alpha|a|patch|pl|p)((?:[.-]?\d+)*)?)?([.-]?dev)?";

    static ref CLASSICAL_VERSION_RE: Regex = Regex::new(&format!(
        r"(?i)^v?(\d{{1,5}})(\.\d+)?(\.\d+)?(\.\d+)?{}$",
        *MODIFIER
    )).unwrap();

    static ref DATE_VERSION_RE: Regex = Regex::new(&format!(
        r"(?i)^v?(\d{{4}}(?:[.:-]?\d{{2}}){{1,6}}(?:[.:-]?\d{{1,3}}){{0,2}}){}$",
        *MODIFIER
    )).unwrap();

    static ref NUMERIC_BRANCH_RE: Regex = Regex::new(
        r"(?i)^v?(\d+)(?:\.(\d+|[x*]))?(?:\.(\d+|[x*]))?(?:\.(\d+|[x*]))?$"
    ).unwrap();

    static ref DEFAULT_BRANCH_RE: Regex = Regex::new(r"(?i)^(?:dev-)?(?:master|trunk|default)$").unwrap();

    static ref ALIAS_RE: Regex = Regex::new(r"^([^,\s]+) +as +[^,\s]+$").unwrap();

    static ref STABILITY_FLAG_RE: Regex = Regex::new(r"(?i)@(?:stable|RC|beta|alpha|dev)$").unwrap();

    static ref BUILD_METADATA_RE: Regex = Regex::new(r"^([^,\s+]+)\+[^\s]+$").unwrap();

    static ref DEV_SUFFIX_RE: Regex = Regex::new(r"(?i)^(.*?)[.-]?dev$").unwrap();

    static ref STABILITY_PARSE_RE: Regex = Regex::new(&format!(r"(?i){}(?:\+.*)?$", *MODIFIER)).unwrap();
}

/// Characters that would make a branch name collide with constraint syntax
const CONSTRAINT_METACHARACTERS: &[char] = &[',', '|', '@', '#', '^', '~', '<', '>', '=', '!', '*'];

/// Version parser for normalizing tag and branch names
#[derive(Debug, Clone, Copy, Default)]
pub struct VersionParser;

impl VersionParser {
    /// Create a new version parser
    pub fn new() -> Self {
        VersionParser
    }

    /// Check if a version string is valid
    pub fn is_valid(&self, version: &str) -> bool {
        self.normalize(version).is_ok()
    }

    /// Returns the stability of a version
    pub fn parse_stability(version: &str) -> Stability {
        let version = match version.find('#') {
            Some(pos) => &version[..pos],
            None => version,
        };

        if version.starts_with("dev-") || version.ends_with("-dev") {
            return Stability::Dev;
        }

        let lower = version.to_lowercase();
        let Some(caps) = STABILITY_PARSE_RE.captures(&lower) else {
            return Stability::Stable;
        };

        if caps.get(3).is_some_and(|m| !m.as_str().is_empty()) {
            return Stability::Dev;
        }

        match caps.get(1).map(|m| m.as_str()) {
            Some("beta" | "b") => Stability::Beta,
            Some("alpha" | "a") => Stability::Alpha,
            Some("rc") => Stability::RC,
            _ => Stability::Stable,
        }
    }

    /// Normalizes a version string to be able to perform comparisons on it
    pub fn normalize(&self, version: &str) -> Result<String, VersionParserError> {
        let original = version.trim();
        if original.is_empty() {
            return Err(VersionParserError::InvalidVersion(version.to_string()));
        }

        let mut version = match ALIAS_RE.captures(original) {
            Some(caps) => caps[1].to_string(),
            None => original.to_string(),
        };
        version = STABILITY_FLAG_RE.replace(&version, "").into_owned();

        if DEFAULT_BRANCH_RE.is_match(&version) {
            return Ok(DEFAULT_BRANCH_ALIAS.to_string());
        }

        if version.get(..4).is_some_and(|prefix| prefix.eq_ignore_ascii_case("dev-")) {
            return Ok(format!("dev-{}", &version[4..]));
        }

        if let Some(caps) = BUILD_METADATA_RE.captures(&version) {
            version = caps[1].to_string();
        }

        if let Some(caps) = CLASSICAL_VERSION_RE.captures(&version) {
            let mut result = caps[1].to_string();
            for group in 2..=4 {
                result.push_str(caps.get(group).map_or(".0", |m| m.as_str()));
            }
            return Ok(append_modifiers(&caps, result, 5));
        }

        if let Some(caps) = DATE_VERSION_RE.captures(&version) {
            let result: String = caps[1]
                .chars()
                .map(|c| if c.is_ascii_digit() { c } else { '.' })
                .collect();
            return Ok(append_modifiers(&caps, result, 2));
        }

        // `1.x-dev` style: only numeric branches are acceptable here
        if let Some(caps) = DEV_SUFFIX_RE.captures(&version) {
            if let Ok(normalized) = self.normalize_branch(&caps[1]) {
                if !normalized.starts_with("dev-") {
                    return Ok(normalized);
                }
            }
        }

        Err(VersionParserError::InvalidVersion(original.to_string()))
    }

    /// Normalizes a branch name
    ///
    /// Numeric branches (`2.1`, `v3.x`) become wildcard versions with a `-dev`
    /// suffix, the default branches become [`DEFAULT_BRANCH_ALIAS`] and
    /// everything else is prefixed with `dev-`.
    pub fn normalize_branch(&self, name: &str) -> Result<String, VersionParserError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(VersionParserError::InvalidBranch(name.to_string()));
        }

        if matches!(name, "master" | "trunk" | "default") {
            return Ok(DEFAULT_BRANCH_ALIAS.to_string());
        }

        if let Some(caps) = NUMERIC_BRANCH_RE.captures(name) {
            let parts: Vec<String> = (1..=4)
                .map(|i| match caps.get(i).map(|m| m.as_str()) {
                    Some(part) if part.chars().all(|c| c.is_ascii_digit()) => part.to_string(),
                    _ => WILDCARD_COMPONENT.to_string(),
                })
                .collect();
            return Ok(format!("{}-dev", parts.join(".")));
        }

        if name.chars().any(|c| c.is_whitespace() || CONSTRAINT_METACHARACTERS.contains(&c)) {
            return Err(VersionParserError::InvalidBranch(name.to_string()));
        }

        Ok(format!("dev-{}", name))
    }
}

/// Append the stability modifier captured at `index` (kind, number, dev flag)
fn append_modifiers(caps: &Captures, mut result: String, index: usize) -> String {
    if let Some(kind) = caps.get(index) {
        if !kind.as_str().eq_ignore_ascii_case("stable") {
            result.push('-');
            result.push_str(expand_stability(kind.as_str()));
            if let Some(number) = caps.get(index + 1) {
                result.push_str(number.as_str().trim_start_matches(['.', '-']));
            }
        }
    }

    if caps.get(index + 2).is_some_and(|m| !m.as_str().is_empty()) {
        result.push_str("-dev");
    }

    result
}

/// Expand shorthand stability strings
fn expand_stability(stability: &str) -> &'static str {
    match stability.to_lowercase().as_str() {
        "a" | "alpha" => "alpha",
        "b" | "beta" => "beta",
        "p" | "pl" | "patch" => "patch",
        "rc" => "RC",
        _ => "stable",
    }
}
