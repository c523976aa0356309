use serde::{Deserialize, Serialize};

/// Where the sources of a revision can be checked out from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Type of source repository (git, hg, svn, etc.)
    #[serde(rename = "type")]
    pub source_type: String,

    /// URL to the repository
    pub url: String,

    /// Revision identifier to check out
    pub reference: String,
}

impl Source {
    pub fn new(
        source_type: impl Into<String>,
        url: impl Into<String>,
        reference: impl Into<String>,
    ) -> Self {
        Self {
            source_type: source_type.into(),
            url: url.into(),
            reference: reference.into(),
        }
    }

    /// Creates a git source
    pub fn git(url: impl Into<String>, reference: impl Into<String>) -> Self {
        Self::new("git", url, reference)
    }
}

/// Pre-packaged archive of a revision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dist {
    /// Type of distribution archive (zip, tar, etc.)
    #[serde(rename = "type")]
    pub dist_type: String,

    /// URL to download the archive
    pub url: String,

    /// Revision the archive was built from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    /// SHA-1 checksum of the archive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shasum: Option<String>,
}

impl Dist {
    pub fn new(dist_type: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            dist_type: dist_type.into(),
            url: url.into(),
            reference: None,
            shasum: None,
        }
    }

    /// Creates a zip distribution
    pub fn zip(url: impl Into<String>) -> Self {
        Self::new("zip", url)
    }

    /// Sets the reference
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_git() {
        let source = Source::git("https://github.com/example/repo.git", "abc123");

        assert_eq!(source.source_type, "git");
        assert_eq!(source.url, "https://github.com/example/repo.git");
        assert_eq!(source.reference, "abc123");
    }

    #[test]
    fn test_dist_serializes_without_empty_fields() {
        let dist = Dist::zip("https://example.com/package.zip").with_reference("abc123");
        let json = serde_json::to_value(&dist).unwrap();

        assert_eq!(json["type"], "zip");
        assert_eq!(json["reference"], "abc123");
        assert!(json.get("shasum").is_none());
    }
}
