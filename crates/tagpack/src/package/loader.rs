//! Builds [`Package`] records from raw composer.json data.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::package::Package;

/// Errors that can occur when turning composer.json data into a package
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Missing required field \"{0}\"")]
    MissingField(&'static str),

    #[error("Invalid field \"{field}\": {message}")]
    InvalidField { field: String, message: String },
}

impl LoadError {
    fn invalid(field: &str, message: impl Into<String>) -> Self {
        LoadError::InvalidField {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Constructs the final package record from synthesized metadata
pub trait PackageLoader: Send + Sync {
    fn load(&self, data: Map<String, Value>) -> Result<Package, LoadError>;
}

/// Loader for composer.json-shaped maps
///
/// Requires `name`, `version` and `version_normalized`; typed fields are
/// validated and every unknown key ends up in [`Package::extra`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ArrayLoader;

impl ArrayLoader {
    pub fn new() -> Self {
        ArrayLoader
    }
}

impl PackageLoader for ArrayLoader {
    fn load(&self, data: Map<String, Value>) -> Result<Package, LoadError> {
        let mut name = None;
        let mut version = None;
        let mut version_normalized = None;
        let mut pkg = Package::new("", "", "");

        for (key, value) in data {
            match key.as_str() {
                "name" => name = Some(required_string("name", value)?),
                "version" => version = Some(required_string("version", value)?),
                "version_normalized" => {
                    version_normalized = Some(required_string("version_normalized", value)?)
                }
                "type" => {
                    if let Value::String(t) = value {
                        pkg.package_type = t;
                    }
                }
                "description" => pkg.description = value.as_str().map(str::to_string),
                "license" => pkg.license = parse_license(&value),
                "require" => pkg.require = parse_links("require", value)?,
                "require-dev" => pkg.require_dev = parse_links("require-dev", value)?,
                "time" => pkg.time = parse_time(&value),
                "source" if !value.is_null() => {
                    pkg.source = Some(
                        serde_json::from_value(value)
                            .map_err(|e| LoadError::invalid("source", e.to_string()))?,
                    )
                }
                "dist" if !value.is_null() => {
                    pkg.dist = Some(
                        serde_json::from_value(value)
                            .map_err(|e| LoadError::invalid("dist", e.to_string()))?,
                    )
                }
                "source" | "dist" => {}
                _ => {
                    pkg.extra.insert(key, value);
                }
            }
        }

        let pretty_name = name
            .filter(|n| !n.trim().is_empty())
            .ok_or(LoadError::MissingField("name"))?;
        pkg.name = pretty_name.to_lowercase();
        pkg.pretty_name = pretty_name;
        pkg.version = version.ok_or(LoadError::MissingField("version"))?;
        pkg.version_normalized =
            version_normalized.ok_or(LoadError::MissingField("version_normalized"))?;

        pkg.replace_self_version();

        Ok(pkg)
    }
}

fn required_string(field: &'static str, value: Value) -> Result<String, LoadError> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(LoadError::invalid(field, format!("expected a string, got {}", other))),
    }
}

/// Parse license from JSON value
fn parse_license(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(arr) => arr
            .iter()
            .filter_map(|v| v.as_str().map(|s| s.to_string()))
            .collect(),
        _ => Vec::new(),
    }
}

fn parse_links(field: &str, value: Value) -> Result<IndexMap<String, String>, LoadError> {
    let Value::Object(links) = value else {
        return Err(LoadError::invalid(field, "expected an object of package => constraint"));
    };

    links
        .into_iter()
        .map(|(target, constraint)| match constraint {
            Value::String(c) => Ok((target, c)),
            other => Err(LoadError::invalid(
                field,
                format!("constraint for {} must be a string, got {}", target, other),
            )),
        })
        .collect()
}

/// Commit times come in RFC 3339 or `Y-m-d H:i:s` form; anything else is dropped
fn parse_time(value: &Value) -> Option<DateTime<Utc>> {
    let raw = value.as_str()?;

    if let Ok(time) = DateTime::parse_from_rfc3339(raw) {
        return Some(time.with_timezone(&Utc));
    }
    if let Ok(time) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(time.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|t| t.and_utc());
    }

    log::debug!("Ignoring unparseable time \"{}\"", raw);
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_load_minimal() {
        let pkg = ArrayLoader
            .load(map(json!({
                "name": "Acme/Pkg",
                "version": "1.0.0",
                "version_normalized": "1.0.0.0"
            })))
            .unwrap();

        assert_eq!(pkg.name, "acme/pkg");
        assert_eq!(pkg.pretty_name, "Acme/Pkg");
        assert_eq!(pkg.version, "1.0.0");
        assert_eq!(pkg.version_normalized, "1.0.0.0");
        assert_eq!(pkg.package_type, "library");
    }

    #[test]
    fn test_load_full() {
        let pkg = ArrayLoader
            .load(map(json!({
                "name": "acme/pkg",
                "version": "2.1-dev",
                "version_normalized": "2.1.9999999.9999999-dev",
                "description": "A package",
                "type": "composer-plugin",
                "license": ["MIT", "Apache-2.0"],
                "require": {"php": ">=8.1", "acme/core": "self.version"},
                "require-dev": {"phpunit/phpunit": "^10.0"},
                "time": "2024-03-01T10:00:00+00:00",
                "source": {"type": "git", "url": "https://example.com/acme/pkg.git", "reference": "abc"},
                "dist": {"type": "zip", "url": "https://example.com/acme/pkg.zip", "reference": "abc"},
                "autoload": {"psr-4": {"Acme\\": "src/"}},
                "homepage": "https://acme.test"
            })))
            .unwrap();

        assert_eq!(pkg.description.as_deref(), Some("A package"));
        assert_eq!(pkg.package_type, "composer-plugin");
        assert_eq!(pkg.license, vec!["MIT", "Apache-2.0"]);
        assert_eq!(pkg.require["acme/core"], "2.1-dev");
        assert_eq!(pkg.require_dev.len(), 1);
        assert!(pkg.time.is_some());
        assert_eq!(pkg.source.as_ref().unwrap().reference, "abc");
        assert_eq!(pkg.dist.as_ref().unwrap().dist_type, "zip");
        let extra_keys: Vec<&str> = pkg.extra.keys().map(|k| k.as_str()).collect();
        assert_eq!(extra_keys, vec!["autoload", "homepage"]);
    }

    #[test]
    fn test_load_rejects_missing_name() {
        let err = ArrayLoader
            .load(map(json!({"version": "1.0.0", "version_normalized": "1.0.0.0"})))
            .unwrap_err();
        assert!(matches!(err, LoadError::MissingField("name")));

        let err = ArrayLoader
            .load(map(json!({"name": " ", "version": "1.0.0", "version_normalized": "1.0.0.0"})))
            .unwrap_err();
        assert!(matches!(err, LoadError::MissingField("name")));
    }

    #[test]
    fn test_load_rejects_malformed_fields() {
        let err = ArrayLoader
            .load(map(json!({
                "name": "acme/pkg",
                "version": "1.0.0",
                "version_normalized": "1.0.0.0",
                "require": ["php"]
            })))
            .unwrap_err();
        assert!(matches!(err, LoadError::InvalidField { ref field, .. } if field == "require"));

        let err = ArrayLoader
            .load(map(json!({
                "name": "acme/pkg",
                "version": "1.0.0",
                "version_normalized": "1.0.0.0",
                "source": {"url": "missing-type"}
            })))
            .unwrap_err();
        assert!(matches!(err, LoadError::InvalidField { ref field, .. } if field == "source"));
    }

    #[test]
    fn test_parse_time_formats() {
        assert!(parse_time(&json!("2024-03-01 10:00:00")).is_some());
        assert!(parse_time(&json!("2024-03-01")).is_some());
        assert!(parse_time(&json!("yesterday")).is_none());
        assert!(parse_time(&json!(12)).is_none());
    }
}
