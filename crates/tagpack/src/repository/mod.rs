mod traits;
pub mod vcs;

pub use traits::*;
pub use vcs::{
    DriverContext, DriverFactory, DriverKind, DriverRegistry, RepositoryLocation, ScanReport,
    VcsRepository,
};
