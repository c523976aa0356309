//! Version normalization compatible with Composer/semver
//!
//! This crate turns tag and branch names into the canonical, comparable
//! version strings used by PHP's Composer package manager.

mod comparator;
mod version_parser;

pub use comparator::Comparator;
pub use version_parser::{Stability, VersionParser, VersionParserError, DEFAULT_BRANCH_ALIAS};
