//! Scan events rendered for a terminal.

use std::sync::Mutex;

use console::style;
use indicatif::ProgressBar;

use super::output::Output;
use super::progress::ProgressManager;
use crate::package::Package;
use crate::repository::vcs::{RefKind, ScanObserver, ScanReport, SkipReason, VcsDriverError};

/// Presents a scan on stderr.
///
/// Progress goes to a spinner (or the overwrite line when verbose output is
/// requested). Skipped tags and branches show up in verbose mode only,
/// except for branches whose metadata could not be fetched, which are always
/// reported.
pub struct ConsoleObserver {
    output: Output,
    spinner: ProgressBar,
    package: Mutex<Option<String>>,
}

impl ConsoleObserver {
    pub fn new(output: Output, progress: &ProgressManager) -> Self {
        let spinner = if output.is_quiet() || output.is_verbose() {
            ProgressBar::hidden()
        } else {
            progress.create_spinner("Scanning repository")
        };

        Self {
            output,
            spinner,
            package: Mutex::new(None),
        }
    }

    pub fn output(&self) -> &Output {
        &self.output
    }

    fn package_label(&self) -> String {
        self.package
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
            .unwrap_or_else(|| "the repository".to_string())
    }

    /// Print without tearing the spinner line
    fn print(&self, f: impl FnOnce(&Output)) {
        self.spinner.suspend(|| f(&self.output));
    }
}

impl ScanObserver for ConsoleObserver {
    fn root_resolved(&self, name: Option<&str>) {
        if let Ok(mut guard) = self.package.lock() {
            *guard = name.map(str::to_string);
        }
    }

    fn root_skipped(&self, error: &VcsDriverError) {
        self.print(|out| out.debug(&format!("Skipped parsing the root revision: {}", error)));
    }

    fn enumeration_failed(&self, kind: RefKind, error: &VcsDriverError) {
        self.print(|out| out.warning(&format!("Could not list {}s: {}", kind, error)));
    }

    fn item_started(&self, kind: RefKind, name: &str) {
        let message = format!(
            "Reading composer.json of {} ({} {})",
            style(self.package_label()).green(),
            kind,
            style(name).yellow()
        );

        if self.output.is_verbose() {
            self.output.overwrite(&message, false);
        } else {
            self.spinner.set_message(message);
        }
    }

    fn item_skipped(&self, kind: RefKind, name: &str, reason: &SkipReason) {
        let message = format!("Skipped {} {}, {}", kind, name, reason);

        if reason.is_always_visible(kind) {
            if self.output.is_verbose() {
                self.output.overwrite("", false);
            }
            self.print(|out| out.warning(&message));
        } else if self.output.is_verbose() {
            self.output.overwrite(&message, true);
        }
    }

    fn item_imported(&self, kind: RefKind, name: &str, package: &Package) {
        if self.output.is_verbose() {
            self.output.overwrite(
                &format!(
                    "Importing {} {} ({})",
                    kind,
                    name,
                    style(&package.version_normalized).dim()
                ),
                true,
            );
        }
    }

    fn scan_finished(&self, report: &ScanReport) {
        self.spinner.finish_and_clear();
        if self.output.is_verbose() {
            self.output.overwrite("", false);
        }
        self.output.debug(&format!(
            "Scan finished: {} imported, {} skipped",
            report.imported.len(),
            report.skipped.len()
        ));
    }
}
