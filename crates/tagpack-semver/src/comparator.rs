//! Ordering of normalized version strings

use std::cmp::Ordering;

/// Comparator for normalized version strings
///
/// Operates on the output of [`crate::VersionParser::normalize`] and
/// [`crate::VersionParser::normalize_branch`]. Named `dev-` branches carry no
/// order relative to releases and always sort below them.
pub struct Comparator;

impl Comparator {
    /// Check if version1 > version2
    pub fn greater_than(version1: &str, version2: &str) -> bool {
        Self::compare(version1, version2) == Ordering::Greater
    }

    /// Check if version1 < version2
    pub fn less_than(version1: &str, version2: &str) -> bool {
        Self::compare(version1, version2) == Ordering::Less
    }

    /// Check if version1 == version2
    pub fn equal_to(version1: &str, version2: &str) -> bool {
        Self::compare(version1, version2) == Ordering::Equal
    }

    /// Total order over normalized versions
    pub fn compare(version1: &str, version2: &str) -> Ordering {
        match (version1.strip_prefix("dev-"), version2.strip_prefix("dev-")) {
            (Some(a), Some(b)) => a.cmp(b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => SortKey::parse(version1).cmp(&SortKey::parse(version2)),
        }
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct SortKey {
    numbers: Vec<u64>,
    rank: u8,
    modifier: Vec<u64>,
    released: bool,
}

impl SortKey {
    fn parse(version: &str) -> Self {
        let (numeric, suffix) = version.split_once('-').unwrap_or((version, ""));
        let numbers = numeric.split('.').map(parse_component).collect();

        let (suffix, dev) = match suffix.strip_suffix("dev") {
            Some(rest) => (rest.trim_end_matches('-'), true),
            None => (suffix, false),
        };

        let label_len = suffix
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(suffix.len());
        let (label, number) = suffix.split_at(label_len);

        let rank = match label.to_lowercase().as_str() {
            "" if dev => 0,
            "alpha" => 1,
            "beta" => 2,
            "rc" => 3,
            "patch" => 5,
            _ => 4,
        };

        let modifier = if number.is_empty() {
            Vec::new()
        } else {
            number.split('.').map(parse_component).collect()
        };

        SortKey {
            numbers,
            rank,
            modifier,
            // `1.0.0.0-RC1-dev` precedes `1.0.0.0-RC1`
            released: !dev || rank == 0,
        }
    }
}

fn parse_component(part: &str) -> u64 {
    part.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greater_than() {
        assert!(Comparator::greater_than("1.25.0.0", "1.24.0.0"));
        assert!(!Comparator::greater_than("1.25.0.0", "1.25.0.0"));
        assert!(Comparator::greater_than("1.26.0.0", "dev-foo"));
        assert!(Comparator::greater_than("dev-foo", "dev-bar"));
        assert!(Comparator::greater_than("10.0.0.0", "9.0.0.0"));
    }

    #[test]
    fn test_stability_ordering() {
        assert!(Comparator::less_than("1.0.0.0-dev", "1.0.0.0-alpha1"));
        assert!(Comparator::less_than("1.0.0.0-alpha1", "1.0.0.0-alpha2"));
        assert!(Comparator::less_than("1.0.0.0-alpha2", "1.0.0.0-beta1"));
        assert!(Comparator::less_than("1.0.0.0-beta1", "1.0.0.0-RC1"));
        assert!(Comparator::less_than("1.0.0.0-RC1-dev", "1.0.0.0-RC1"));
        assert!(Comparator::less_than("1.0.0.0-RC1", "1.0.0.0"));
        assert!(Comparator::less_than("1.0.0.0", "1.0.0.0-patch1"));
    }

    #[test]
    fn test_branches_and_default_alias() {
        assert!(Comparator::greater_than("9999999-dev", "2.0.0.0"));
        assert!(Comparator::greater_than("2.1.9999999.9999999-dev", "2.1.3.0"));
        assert!(Comparator::less_than("dev-feature", "0.0.1.0"));
        assert!(Comparator::equal_to("dev-main", "dev-main"));
    }
}
