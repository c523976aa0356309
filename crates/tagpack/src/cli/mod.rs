//! Terminal presentation for scans.
//!
//! [`Output`] is the diagnostic sink, [`ProgressManager`] draws the status
//! spinner and [`ConsoleObserver`] feeds both from scan events.

mod observer;
mod output;
mod progress;

pub use observer::ConsoleObserver;
pub use output::{Output, Verbosity};
pub use progress::ProgressManager;
