//! Locate brace-delimited blocks in a flat save buffer.
//!
//! All scans are pure functions of the buffer. They work on bytes: the characters that matter
//! (`{`, `}`, `"`, `#`, `=`) are all ASCII, so a scan never splits a multi-byte character.

use rayon::prelude::*;

use crate::block::ParsedBlock;
use crate::error::ScanError;
use crate::span::TextSpan;

/// Controls which parts of the text the scanner treats as opaque.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScanOptions {
    /// Ignore braces and keys inside `"quoted strings"`.
    pub quotes: bool,
    /// Ignore braces and keys from `#` to the end of the line.
    pub comments: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions { quotes: true, comments: true }
    }
}

impl ScanOptions {
    /// Count every brace in the buffer, wherever it appears.
    pub fn raw() -> Self {
        ScanOptions { quotes: false, comments: false }
    }
}

#[allow(clippy::wrong_self_convention)]
pub(crate) trait CharExt {
    fn is_id_char(self) -> bool;
}

impl CharExt for char {
    fn is_id_char(self) -> bool {
        self.is_alphabetic()
            || self.is_ascii_digit()
            || self == '.'
            || self == ':'
            || self == '_'
            || self == '-'
            || self == '&'
            || self == '/'
            || self == '|'
            || self == '\''
            || self == '@'
            || self == '$'
    }
}

/// Find the `"` that closes the string starting at `i`.
///
/// Quoted strings in save files never span lines, so a string still open at a newline is cut
/// off there. The `Err` holds the offset of that newline, or the end of the buffer.
pub(crate) fn find_closing_quote(bytes: &[u8], i: usize) -> Result<usize, usize> {
    for (j, &b) in bytes.iter().enumerate().skip(i + 1) {
        match b {
            b'"' => return Ok(j),
            b'\n' => return Err(j),
            _ => (),
        }
    }
    Err(bytes.len())
}

/// Return the offset just past the string that starts at `i`.
pub(crate) fn skip_quoted(bytes: &[u8], i: usize) -> usize {
    find_closing_quote(bytes, i).map_or_else(|cut| cut, |close| close + 1)
}

/// Return the offset of the newline that ends the comment starting at `i`,
/// or the end of the buffer.
pub(crate) fn skip_comment(bytes: &[u8], i: usize) -> usize {
    bytes[i..].iter().position(|&b| b == b'\n').map_or(bytes.len(), |pos| i + pos)
}

/// The brace-block locator.
///
/// It holds only its [`ScanOptions`], so one scanner can be shared freely between threads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BlockScanner {
    options: ScanOptions,
}

impl BlockScanner {
    pub fn new(options: ScanOptions) -> Self {
        BlockScanner { options }
    }

    /// A scanner that counts every brace, including ones in strings and comments.
    pub fn raw() -> Self {
        BlockScanner { options: ScanOptions::raw() }
    }

    pub fn options(&self) -> ScanOptions {
        self.options
    }

    /// Find the `}` that closes the `{` at `open`.
    ///
    /// Nested blocks of any depth are skipped over. If the buffer ends while the block is still
    /// open, the document is malformed and the result is [`ScanError::UnbalancedBraces`].
    pub fn find_matching_close(&self, buffer: &str, open: usize) -> Result<usize, ScanError> {
        let bytes = buffer.as_bytes();
        if bytes.get(open) != Some(&b'{') {
            return Err(ScanError::InvalidStart { offset: open });
        }
        let mut depth = 1usize;
        let mut i = open + 1;
        while i < bytes.len() {
            match bytes[i] {
                b'"' if self.options.quotes => {
                    i = skip_quoted(bytes, i);
                    continue;
                }
                b'#' if self.options.comments => {
                    i = skip_comment(bytes, i);
                    continue;
                }
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(i);
                    }
                }
                _ => (),
            }
            i += 1;
        }
        Err(ScanError::UnbalancedBraces { start: open })
    }

    /// Find the next `key = { ... }` at or after `from`, and return the span of its block,
    /// braces included.
    ///
    /// `key` only matches as a whole token, so `CHI` will not match inside `CHIEF` or `XCHI`.
    /// Occurrences of `key` whose value is not a block are skipped.
    /// `from` should not point into the middle of a quoted string or comment.
    pub fn find_key_block(
        &self,
        buffer: &str,
        key: &str,
        from: usize,
    ) -> Result<Option<TextSpan>, ScanError> {
        let bytes = buffer.as_bytes();
        if from > bytes.len() || !buffer.is_char_boundary(from) {
            return Err(ScanError::SpanOutOfBounds { start: from, end: from, len: bytes.len() });
        }
        let key_bytes = key.as_bytes();
        if key_bytes.is_empty() {
            return Ok(None);
        }
        let mut i = from;
        while i < bytes.len() {
            match bytes[i] {
                b'"' if self.options.quotes => {
                    i = skip_quoted(bytes, i);
                    continue;
                }
                b'#' if self.options.comments => {
                    i = skip_comment(bytes, i);
                    continue;
                }
                b if b == key_bytes[0]
                    && bytes[i..].starts_with(key_bytes)
                    && is_token_start(buffer, i) =>
                {
                    if let Some(open) = block_after_key(bytes, i + key_bytes.len()) {
                        let close = self.find_matching_close(buffer, open)?;
                        return Ok(Some(TextSpan::new(open, close + 1)));
                    }
                }
                _ => (),
            }
            i += 1;
        }
        Ok(None)
    }

    /// Iterate over every `key = { ... }` block in the buffer, in order.
    ///
    /// The search resumes after the end of each block found, so a block with the same key that
    /// is nested inside a found block is not reported separately.
    pub fn find_key_blocks<'a>(&self, buffer: &'a str, key: &'a str) -> KeyBlocks<'a> {
        KeyBlocks { scanner: *self, buffer, key, next: 0, done: false }
    }

    /// Follow a path of keys. The first key is searched anywhere in the buffer, each following
    /// key only among the immediate entries of the block found for the previous one.
    pub fn find_key_path(
        &self,
        buffer: &str,
        path: &[&str],
    ) -> Result<Option<TextSpan>, ScanError> {
        let Some((first, rest)) = path.split_first() else {
            return Ok(None);
        };
        let Some(mut span) = self.find_key_block(buffer, first, 0)? else {
            return Ok(None);
        };
        for key in rest {
            let block = ParsedBlock::from_scan(buffer, span, self.options);
            match block.get_field_block(key)? {
                Some(inner) => span = inner.span(),
                None => return Ok(None),
            }
        }
        Ok(Some(span))
    }

    /// Collect all blocks for each of `keys`, running the independent scans in parallel.
    /// The results are in the same order as `keys`.
    pub fn find_key_blocks_par<'k>(
        &self,
        buffer: &str,
        keys: &[&'k str],
    ) -> Vec<(&'k str, Result<Vec<TextSpan>, ScanError>)> {
        keys.par_iter().map(|&key| (key, self.find_key_blocks(buffer, key).collect())).collect()
    }
}

/// Is the token at `i` preceded by something that cannot be part of an identifier?
/// `i` must be on a character boundary.
fn is_token_start(buffer: &str, i: usize) -> bool {
    buffer[..i].chars().next_back().is_none_or(|c| !c.is_id_char() && c != '"')
}

/// If the text at `i` is optional whitespace, `=`, optional whitespace, `{`,
/// return the offset of the `{`.
fn block_after_key(bytes: &[u8], mut i: usize) -> Option<usize> {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    if bytes.get(i) != Some(&b'=') {
        return None;
    }
    i += 1;
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    (bytes.get(i) == Some(&b'{')).then_some(i)
}

/// Iterator returned by [`BlockScanner::find_key_blocks`].
#[derive(Clone, Debug)]
pub struct KeyBlocks<'a> {
    scanner: BlockScanner,
    buffer: &'a str,
    key: &'a str,
    next: usize,
    done: bool,
}

impl Iterator for KeyBlocks<'_> {
    type Item = Result<TextSpan, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.scanner.find_key_block(self.buffer, self.key, self.next) {
            Ok(Some(span)) => {
                self.next = span.end;
                Some(Ok(span))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                // After a brace error the rest of the buffer has no reliable structure.
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// [`BlockScanner::find_matching_close`] with the default options.
pub fn find_matching_close(buffer: &str, open: usize) -> Result<usize, ScanError> {
    BlockScanner::default().find_matching_close(buffer, open)
}

/// [`BlockScanner::find_key_block`] with the default options.
pub fn find_key_block(buffer: &str, key: &str, from: usize) -> Result<Option<TextSpan>, ScanError> {
    BlockScanner::default().find_key_block(buffer, key, from)
}
