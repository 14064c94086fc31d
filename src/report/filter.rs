use crate::report::{Confidence, ErrorKey, LogReport, Severity};

/// Determines whether a given Report should be printed.
#[derive(Debug, Clone)]
pub struct ReportFilter {
    /// Minimum severity to log
    pub min_severity: Severity,
    /// Minimum confidence to log
    pub min_confidence: Confidence,
    /// Keys that are never logged.
    pub ignore_keys: Vec<ErrorKey>,
}

impl Default for ReportFilter {
    /// Log everything until configured otherwise.
    fn default() -> Self {
        ReportFilter {
            min_severity: Severity::Tips,
            min_confidence: Confidence::Weak,
            ignore_keys: Vec::new(),
        }
    }
}

impl ReportFilter {
    /// Returns true iff the report should be printed.
    /// A print will be rejected if its severity or confidence level is too low, or if its key
    /// is ignored.
    pub fn should_print_report(&self, report: &LogReport) -> bool {
        self.should_print(report.key, report.severity, report.confidence)
    }

    pub fn should_print(&self, key: ErrorKey, severity: Severity, confidence: Confidence) -> bool {
        severity >= self.min_severity
            && confidence >= self.min_confidence
            && !self.ignore_keys.contains(&key)
    }
}
