//! Collect error reports and then write them out.

use std::cmp::Ordering;
use std::fs::{read, File};
use std::io::{stdout, Write};
use std::mem::take;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use encoding_rs::{UTF_8, WINDOWS_1252};

use crate::helpers::{TigerHashMap, TigerHashSet};
use crate::loc::Loc;
use crate::report::filter::ReportFilter;
use crate::report::writer::log_report;
use crate::report::writer_json::log_report_json;
use crate::report::{Confidence, LogReport, OutputStyle, Severity};

static ERRORS: LazyLock<Mutex<Errors>> = LazyLock::new(|| Mutex::new(Errors::default()));

#[allow(missing_debug_implementations)]
pub struct Errors {
    pub(crate) output: Box<dyn Write + Send>,

    /// Files that have been read in to get the lines where errors occurred.
    /// Cached here to avoid duplicate I/O and decoding.
    filecache: TigerHashMap<PathBuf, String>,

    /// Determines whether a report should be printed.
    pub(crate) filter: ReportFilter,
    /// Output color and style configuration.
    pub(crate) styles: OutputStyle,

    /// All reports that passed the checks, stored here to be sorted before being emitted all at once.
    /// It's a `HashSet` because the same brace problem is often found by more than one scan.
    storage: TigerHashSet<LogReport>,
}

impl Default for Errors {
    fn default() -> Self {
        Errors {
            output: Box::new(stdout()),
            filecache: TigerHashMap::default(),
            filter: ReportFilter::default(),
            styles: OutputStyle::default(),
            storage: TigerHashSet::default(),
        }
    }
}

impl Errors {
    /// Fetch the contents of a single line from a save file.
    pub(crate) fn get_line(&mut self, loc: &Loc) -> Option<String> {
        if loc.line == 0 {
            return None;
        }
        let idx = loc.line as usize - 1;
        if let Some(contents) = self.filecache.get(loc.pathname()) {
            return contents.lines().nth(idx).map(str::to_owned);
        }
        let bytes = read(loc.pathname()).ok()?;
        let contents = match UTF_8.decode_without_bom_handling_and_without_replacement(&bytes) {
            Some(contents) => contents.into_owned(),
            None => WINDOWS_1252.decode_without_bom_handling(&bytes).0.into_owned(),
        };
        // Strip the BOM, if any
        let contents = match contents.strip_prefix('\u{feff}') {
            Some(stripped) => stripped.to_owned(),
            None => contents,
        };
        let line = contents.lines().nth(idx).map(str::to_owned);
        self.filecache.insert(loc.pathname().to_path_buf(), contents);
        line
    }

    /// Remember the current contents of a file, so that reports show the text that was scanned
    /// rather than what is on disk.
    pub(crate) fn cache_source(&mut self, pathname: &Path, contents: &str) {
        self.filecache.insert(pathname.to_path_buf(), contents.to_owned());
    }

    /// Perform some checks to see whether the report should actually be logged.
    /// If yes, it will add it to the storage.
    fn push_report(&mut self, report: LogReport) {
        if !self.filter.should_print_report(&report) {
            return;
        }
        self.storage.insert(report);
    }

    /// Extract the stored reports, sort them, and return them as a vector of [`LogReport`].
    /// The stored reports will be left empty.
    pub fn take_reports(&mut self) -> Vec<LogReport> {
        let mut reports: Vec<LogReport> = take(&mut self.storage).into_iter().collect();
        reports.sort_unstable_by(|a, b| {
            // Severity in descending order
            let mut cmp = b.severity.cmp(&a.severity);
            if cmp != Ordering::Equal {
                return cmp;
            }
            // Confidence in descending order too
            cmp = b.confidence.cmp(&a.confidence);
            if cmp != Ordering::Equal {
                return cmp;
            }
            // If severity and confidence are the same, order by loc. Check all locs in order.
            for (a, b) in a.pointers.iter().zip(b.pointers.iter()) {
                cmp = a.loc.cmp(&b.loc);
                if cmp != Ordering::Equal {
                    return cmp;
                }
            }
            // Shorter chain goes first, if it comes to that.
            cmp = a.pointers.len().cmp(&b.pointers.len());
            if cmp != Ordering::Equal {
                return cmp;
            }
            // Fallback: order by message text.
            a.msg.cmp(&b.msg)
        });
        reports
    }

    /// Print all the stored reports to the error output.
    /// Set `json` if they should be printed as a JSON array. Otherwise they are printed in the
    /// default output format.
    ///
    /// Note that the default output format is not stable across versions. It is meant for human
    /// readability and occasionally gets changed to improve that.
    pub fn emit_reports(&mut self, json: bool) {
        let reports = self.take_reports();
        if json {
            _ = writeln!(self.output, "[");
            let mut first = true;
            for report in &reports {
                if !first {
                    _ = writeln!(self.output, ",");
                }
                first = false;
                log_report_json(self, report);
            }
            _ = writeln!(self.output, "\n]");
        } else {
            for report in &reports {
                log_report(self, report);
            }
        }
        _ = self.output.flush();
        self.filecache.clear();
    }

    /// Get a mutable lock on the global ERRORS struct.
    ///
    /// A panic in another thread while holding the lock does not leave the collector in an
    /// inconsistent state, so a poisoned lock is simply taken over.
    pub fn get_mut() -> MutexGuard<'static, Errors> {
        ERRORS.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Configure the error reports to be written to this file instead of to stdout.
pub fn set_output_file(file: &Path) -> Result<()> {
    let file =
        File::create(file).with_context(|| format!("could not create {}", file.display()))?;
    Errors::get_mut().output = Box::new(file);
    Ok(())
}

/// Configure the error reports to be written to any writer, such as an in-memory buffer.
pub fn set_output(output: Box<dyn Write + Send>) {
    Errors::get_mut().output = output;
}

/// Store an error report to be emitted when [`emit_reports`] is called.
pub fn log(report: LogReport) {
    Errors::get_mut().push_report(report);
}

/// Tests whether a report with these levels might be printed.
pub fn will_log(severity: Severity, confidence: Confidence) -> bool {
    let errors = Errors::get_mut();
    severity >= errors.filter.min_severity && confidence >= errors.filter.min_confidence
}

/// Print all the stored reports to the error output.
/// Set `json` if they should be printed as a JSON array. Otherwise they are printed in the
/// default output format.
pub fn emit_reports(json: bool) {
    Errors::get_mut().emit_reports(json);
}

/// Extract the stored reports, sort them, and return them as a vector of [`LogReport`].
/// The stored reports will be left empty, and the cached file contents are dropped.
pub fn take_reports() -> Vec<LogReport> {
    let mut errors = Errors::get_mut();
    errors.filecache.clear();
    errors.take_reports()
}

// =================================================================================================
// =============== Configuration (Output style):
// =================================================================================================

/// Override the default `OutputStyle`. (Controls ansi colors)
pub fn set_output_style(style: OutputStyle) {
    Errors::get_mut().styles = style;
}

/// Disable color in the output.
pub fn disable_ansi_colors() {
    Errors::get_mut().styles = OutputStyle::no_color();
}

// =================================================================================================
// =============== Configuration (Filter):
// =================================================================================================

/// Replace the whole report filter.
pub fn set_filter(filter: ReportFilter) {
    Errors::get_mut().filter = filter;
}

/// Only log reports of at least this severity.
pub fn minimum_severity(severity: Severity) {
    Errors::get_mut().filter.min_severity = severity;
}

/// Only log reports of at least this confidence.
pub fn minimum_confidence(confidence: Confidence) {
    Errors::get_mut().filter.min_confidence = confidence;
}
