//! Discovers Composer package versions from version control repositories.
//!
//! A [`VcsRepository`] picks a driver for its URL, walks the tags and
//! branches it reports and turns every revision with a usable
//! `composer.json` into a [`Package`].

pub mod cli;
pub mod config;
pub mod error;
pub mod package;
pub mod repository;
pub mod util;

pub use error::{Result, TagpackError};
pub use package::Package;
pub use repository::{
    DriverContext, DriverFactory, DriverKind, DriverRegistry, Repository, RepositoryLocation,
    ScanReport, VcsRepository,
};
