//! Check that the braces of a whole save file balance, and report where they don't.
//!
//! A file that fails this check should not be edited: any span found in it may be wrong.

use std::path::Path;
use std::sync::Arc;

use crate::loc::Loc;
use crate::report::{err, fatal, warn, ErrorKey, Errors};
use crate::savefile::SaveFile;
use crate::scan::{find_closing_quote, skip_comment, ScanOptions};
use crate::span::TextSpan;

/// Summary of the braces in a buffer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BraceBalance {
    pub opens: usize,
    pub closes: usize,
    pub max_depth: usize,
    /// Offsets of `{` that are never closed.
    pub unclosed: Vec<usize>,
    /// Offsets of `}` that close nothing.
    pub unopened: Vec<usize>,
    /// Offsets of `"` whose string is not closed on the same line.
    pub unclosed_quotes: Vec<usize>,
}

impl BraceBalance {
    pub fn is_balanced(&self) -> bool {
        self.unclosed.is_empty() && self.unopened.is_empty()
    }

    /// Count the braces in `buffer` without reporting anything.
    pub fn measure(buffer: &str, options: ScanOptions) -> Self {
        Self::measure_with(buffer, options, |_| ())
    }

    /// Count the braces in `buffer`, calling `misplaced` for every `}` at the start of a line
    /// that does not close a top-level block.
    fn measure_with<F: FnMut(usize)>(buffer: &str, options: ScanOptions, mut misplaced: F) -> Self {
        let bytes = buffer.as_bytes();
        let mut balance = BraceBalance::default();
        let mut stack = Vec::new();
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'"' if options.quotes => {
                    match find_closing_quote(bytes, i) {
                        Ok(close) => i = close + 1,
                        Err(cut) => {
                            balance.unclosed_quotes.push(i);
                            i = cut;
                        }
                    }
                    continue;
                }
                b'#' if options.comments => {
                    i = skip_comment(bytes, i);
                    continue;
                }
                b'{' => {
                    balance.opens += 1;
                    stack.push(i);
                    balance.max_depth = balance.max_depth.max(stack.len());
                }
                b'}' => {
                    balance.closes += 1;
                    if stack.pop().is_some() {
                        if !stack.is_empty() && (i == 0 || bytes[i - 1] == b'\n') {
                            misplaced(i);
                        }
                    } else {
                        balance.unopened.push(i);
                    }
                }
                _ => (),
            }
            i += 1;
        }
        balance.unclosed = stack;
        balance
    }
}

/// Check the braces of a loaded save file, and report every problem found.
pub fn check_braces(file: &SaveFile, options: ScanOptions) -> BraceBalance {
    let buffer = file.contents();
    Errors::get_mut().cache_source(file.pathname(), buffer);

    let balance = BraceBalance::measure_with(buffer, options, |offset| {
        let msg = "possible brace error";
        let info = "This closing brace is at the start of the line but does not close a top-level block.";
        warn(ErrorKey::BracePlacement)
            .weak()
            .msg(msg)
            .info(info)
            .loc((file, TextSpan::new(offset, offset + 1)))
            .push();
    });
    for &offset in &balance.unopened {
        err(ErrorKey::BraceError)
            .strong()
            .msg("unexpected `}`")
            .info("There is no `{` for this brace to close.")
            .loc((file, TextSpan::new(offset, offset + 1)))
            .push();
    }
    for &offset in &balance.unclosed_quotes {
        warn(ErrorKey::ParseError)
            .msg("quoted string not closed")
            .info("The string is taken to end at the end of this line.")
            .loc((file, TextSpan::new(offset, offset + 1)))
            .push();
    }
    for &offset in &balance.unclosed {
        err(ErrorKey::BraceError)
            .strong()
            .msg("opening `{` was never closed")
            .loc((file, TextSpan::new(offset, offset + 1)))
            .push();
    }
    balance
}

/// Read the file at `pathname` and check its braces.
/// A file that cannot be read is reported and `None` is returned.
pub fn check_file(pathname: &Path, options: ScanOptions) -> Option<(SaveFile, BraceBalance)> {
    match SaveFile::read(pathname) {
        Ok(file) => {
            let balance = check_braces(&file, options);
            Some((file, balance))
        }
        Err(e) => {
            let loc = Loc::for_file(Arc::new(pathname.to_path_buf()));
            fatal(ErrorKey::ReadError).msg("could not read file").info(format!("{e:#}")).loc(loc).push();
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{take_reports_for, Severity, TEST_LOCK};

    #[test]
    fn test_balanced() {
        let buffer = "a={\n\tb={ c=1 }\n}\nd={ e=\"}\" } # {\n";
        let balance = BraceBalance::measure(buffer, ScanOptions::default());
        assert!(balance.is_balanced());
        assert_eq!((balance.opens, balance.closes, balance.max_depth), (3, 3, 2));
    }

    #[test]
    fn test_raw_counts_everything() {
        let buffer = "d={ e=\"}\" } # {\n";
        let balance = BraceBalance::measure(buffer, ScanOptions::raw());
        assert!(!balance.is_balanced());
        assert_eq!(balance.unopened, vec![10]);
        assert_eq!(balance.unclosed, vec![14]);
    }

    #[test]
    fn test_unbalanced() {
        let balance = BraceBalance::measure("{ { }", ScanOptions::default());
        assert_eq!(balance.unclosed, vec![0]);
        assert!(balance.unopened.is_empty());
    }

    #[test]
    fn test_reports() {
        let _guard = TEST_LOCK.lock();
        let pathname = Path::new("balance-test.v2");
        let file = SaveFile::from_string(pathname, "a={\n\tb={\n}\n}\n}\nc={".to_owned());
        let balance = check_braces(&file, ScanOptions::default());
        assert_eq!(balance.unopened, vec![13]);
        assert_eq!(balance.unclosed, vec![17]);

        let reports = take_reports_for(pathname);
        assert_eq!(reports.len(), 3);
        assert_eq!(reports[0].severity, Severity::Error);
        assert_eq!(reports[0].msg, "unexpected `}`");
        assert_eq!(reports[0].pointers[0].loc.line, 5);
        assert_eq!(reports[1].msg, "opening `{` was never closed");
        assert_eq!(reports[1].pointers[0].loc.line, 6);
        assert_eq!(reports[1].pointers[0].loc.column, 3);
        assert_eq!(reports[2].key, ErrorKey::BracePlacement);
        assert_eq!(reports[2].pointers[0].loc.line, 3);
    }

    #[test]
    fn test_unclosed_quote() {
        let _guard = TEST_LOCK.lock();
        let pathname = Path::new("stray-quote.v2");
        let text = "CHI={\n\tname=\"Beijing\n\tINNER={ a=1 }\n}\nENG={ b=\"}\" }\n";
        let file = SaveFile::from_string(pathname, text.to_owned());
        let balance = check_braces(&file, ScanOptions::default());
        assert!(balance.is_balanced());
        assert_eq!(balance.unclosed_quotes, vec![12]);
        assert_eq!(balance.opens, 3);

        let reports = take_reports_for(pathname);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].key, ErrorKey::ParseError);
        assert_eq!(reports[0].msg, "quoted string not closed");
        assert_eq!(reports[0].pointers[0].loc.line, 2);
        assert_eq!(reports[0].pointers[0].loc.column, 7);
    }

    #[test]
    fn test_missing_file() {
        let _guard = TEST_LOCK.lock();
        let pathname = Path::new("no/such/dir/missing.v2");
        assert!(check_file(pathname, ScanOptions::default()).is_none());
        let reports = take_reports_for(pathname);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].key, ErrorKey::ReadError);
        assert_eq!(reports[0].severity, Severity::Fatal);
        assert_eq!(reports[0].pointers[0].loc.line, 0);
    }
}
