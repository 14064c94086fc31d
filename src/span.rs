use std::fmt::{Display, Formatter};
use std::ops::Range;

use crate::error::ScanError;

/// A half-open byte range `[start, end)` over a save buffer.
///
/// Spans handed out by the scanner include the braces of the block they cover: the byte at
/// `start` is `{` and the byte at `end - 1` is its matching `}`. Use [`TextSpan::inner`] for the
/// part between the braces.
///
/// A span is only meaningful for the buffer it was found in. After a splice, find it again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextSpan {
    pub start: usize,
    pub end: usize,
}

impl TextSpan {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        TextSpan { start, end }
    }

    /// The span covering a whole buffer.
    pub fn whole(buffer: &str) -> Self {
        TextSpan { start: 0, end: buffer.len() }
    }

    /// The fields are public, so a span may be built with `end < start`. Such a span is empty.
    pub fn len(self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(self) -> bool {
        self.start >= self.end
    }

    /// The span without its first and last byte, which for a block span are the braces.
    /// An empty span becomes the empty span at `start`.
    pub fn inner(self) -> Self {
        if self.len() < 2 {
            TextSpan { start: self.start, end: self.start }
        } else {
            TextSpan { start: self.start + 1, end: self.end - 1 }
        }
    }

    pub fn contains(self, other: TextSpan) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Check that the span fits in `buffer` and lies on character boundaries.
    pub fn check(self, buffer: &str) -> Result<(), ScanError> {
        if self.start <= self.end
            && self.end <= buffer.len()
            && buffer.is_char_boundary(self.start)
            && buffer.is_char_boundary(self.end)
        {
            Ok(())
        } else {
            Err(ScanError::SpanOutOfBounds { start: self.start, end: self.end, len: buffer.len() })
        }
    }

    /// Extract the text this span covers.
    pub fn text(self, buffer: &str) -> Result<&str, ScanError> {
        self.check(buffer)?;
        Ok(&buffer[self.start..self.end])
    }

    pub fn range(self) -> Range<usize> {
        self.start..self.end
    }
}

impl From<Range<usize>> for TextSpan {
    fn from(range: Range<usize>) -> Self {
        TextSpan::new(range.start, range.end)
    }
}

impl Display for TextSpan {
    fn fmt(&self, f: &mut Formatter) -> Result<(), std::fmt::Error> {
        write!(f, "{}..{}", self.start, self.end)
    }
}
