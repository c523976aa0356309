//! Hooks into a running scan.

use super::driver::VcsDriverError;
use super::scanner::{RefKind, ScanReport, SkipReason};
use crate::package::Package;

/// Receives scan events in pipeline order.
///
/// Every method defaults to doing nothing, so implementors only pick the
/// events they present.
pub trait ScanObserver: Send + Sync {
    /// The root revision was read; `name` is the canonical package name if it declared one
    fn root_resolved(&self, _name: Option<&str>) {}

    /// Reading the root revision failed; the scan goes on without a canonical name
    fn root_skipped(&self, _error: &VcsDriverError) {}

    /// Listing tags or branches failed; that loop processes nothing
    fn enumeration_failed(&self, _kind: RefKind, _error: &VcsDriverError) {}

    fn item_started(&self, _kind: RefKind, _name: &str) {}

    fn item_skipped(&self, _kind: RefKind, _name: &str, _reason: &SkipReason) {}

    fn item_imported(&self, _kind: RefKind, _name: &str, _package: &Package) {}

    fn scan_finished(&self, _report: &ScanReport) {}
}

/// Ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl ScanObserver for NullObserver {}

/// Reports events through the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl ScanObserver for LogObserver {
    fn root_resolved(&self, name: Option<&str>) {
        match name {
            Some(name) => log::debug!("Root revision declares package {}", name),
            None => log::debug!("Root revision declares no package name"),
        }
    }

    fn root_skipped(&self, error: &VcsDriverError) {
        log::debug!("Skipped parsing the root revision: {}", error);
    }

    fn enumeration_failed(&self, kind: RefKind, error: &VcsDriverError) {
        log::warn!("Could not list {}s: {}", kind, error);
    }

    fn item_started(&self, kind: RefKind, name: &str) {
        log::debug!("Reading composer.json of {} {}", kind, name);
    }

    fn item_skipped(&self, kind: RefKind, name: &str, reason: &SkipReason) {
        if reason.is_always_visible(kind) {
            log::warn!("Skipped {} {}, {}", kind, name, reason);
        } else {
            log::debug!("Skipped {} {}, {}", kind, name, reason);
        }
    }

    fn item_imported(&self, kind: RefKind, name: &str, package: &Package) {
        log::info!(
            "Importing {} {} ({})",
            kind,
            name,
            package.version_normalized
        );
    }

    fn scan_finished(&self, report: &ScanReport) {
        log::info!(
            "Scan finished: {} imported, {} skipped",
            report.imported.len(),
            report.skipped.len()
        );
    }
}
