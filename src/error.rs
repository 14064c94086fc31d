//! The ways a scan or splice over a save buffer can fail.

use thiserror::Error;

/// A fatal failure of one scan or splice operation.
///
/// Not finding a key is not an error; the lookup functions return `Ok(None)` for that.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ScanError {
    /// The caller asked for a matching close brace at an offset that does not hold a `{`.
    #[error("expected `{{` at offset {offset}")]
    InvalidStart { offset: usize },
    /// The end of the buffer was reached before the `{` at `start` was closed.
    #[error("`{{` at offset {start} is never closed")]
    UnbalancedBraces { start: usize },
    /// A `}` turned up at the top level of a block where no `{` was open.
    #[error("unexpected `}}` at offset {offset}")]
    UnmatchedClose { offset: usize },
    /// An `=` with nothing before it to serve as the key.
    #[error("missing key before `=` at offset {offset}")]
    MissingKey { offset: usize },
    /// A `key =` that is not followed by any value.
    #[error("missing value after `=` at offset {offset}")]
    MissingValue { offset: usize },
    /// A span that is not exactly one `{ ... }` block: its last byte is not the `}` that
    /// closes its first byte.
    #[error("span {start}..{end} is not a single brace block")]
    NotABlock { start: usize, end: usize },
    /// A span that does not fit inside the buffer, or does not fall on character boundaries.
    #[error("span {start}..{end} does not fit in a buffer of length {len}")]
    SpanOutOfBounds { start: usize, end: usize, len: usize },
}

impl ScanError {
    /// The byte offset in the buffer where the problem was found.
    pub fn offset(&self) -> usize {
        match *self {
            ScanError::InvalidStart { offset }
            | ScanError::UnmatchedClose { offset }
            | ScanError::MissingKey { offset }
            | ScanError::MissingValue { offset } => offset,
            ScanError::UnbalancedBraces { start }
            | ScanError::NotABlock { start, .. }
            | ScanError::SpanOutOfBounds { start, .. } => start,
        }
    }
}
