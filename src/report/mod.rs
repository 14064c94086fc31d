//! Structured diagnostics about save files: what is wrong, where, and how sure we are.

pub use builder::{err, fatal, tips, untidy, warn};
pub use error_loc::ErrorLoc;
pub use errorkey::{ErrorKey, ParseKeyError};
pub use errors::{
    disable_ansi_colors, emit_reports, log, minimum_confidence, minimum_severity, set_filter,
    set_output, set_output_file, set_output_style, take_reports, will_log,
};
pub(crate) use errors::Errors;
pub use filter::ReportFilter;
pub use output_style::OutputStyle;
pub use report_struct::{Confidence, LogReport, PointedMessage, Severity};

mod builder;
mod error_loc;
mod errorkey;
mod errors;
mod filter;
mod output_style;
mod report_struct;
mod writer;
mod writer_json;

/// Serializes the tests that inspect the global report storage.
#[cfg(test)]
pub(crate) static TEST_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Take the stored reports about `pathname`, putting back the ones about other files.
#[cfg(test)]
pub(crate) fn take_reports_for(pathname: &std::path::Path) -> Vec<LogReport> {
    let (mine, others): (Vec<_>, Vec<_>) = take_reports()
        .into_iter()
        .partition(|r| r.primary().is_some_and(|p| p.loc.pathname() == pathname));
    others.into_iter().for_each(log);
    mine
}
