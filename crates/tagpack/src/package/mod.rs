// Package model for synthesized package versions
//
// Records produced from VCS tags and branches, the source/dist locations
// they point at, and the loader that builds them from composer.json data.

mod loader;
mod package;
mod source;

pub use loader::{ArrayLoader, LoadError, PackageLoader};
pub use package::{Package, DEFAULT_PACKAGE_TYPE};
pub use source::{Dist, Source};
