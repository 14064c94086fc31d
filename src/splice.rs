//! Produce new buffers by replacing spans of old ones.
//!
//! A splice never mutates its input. Every span found in the old buffer is stale once the new
//! buffer exists, so anything further must be found again in the new buffer.

use crate::block::ParsedBlock;
use crate::error::ScanError;
use crate::scan::BlockScanner;
use crate::span::TextSpan;

/// Return `buffer[..span.start] + replacement + buffer[span.end..]` as a new string.
pub fn splice_span(buffer: &str, span: TextSpan, replacement: &str) -> Result<String, ScanError> {
    span.check(buffer)?;
    let mut result = String::with_capacity(buffer.len() - span.len() + replacement.len());
    result.push_str(&buffer[..span.start]);
    result.push_str(replacement);
    result.push_str(&buffer[span.end..]);
    Ok(result)
}

/// The outcome of [`rewrite_key_blocks`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rewrite {
    pub buffer: String,
    /// How many blocks were replaced.
    pub replaced: usize,
}

/// Offer every `key = { ... }` block to `f`, and replace the block (braces included) with the
/// text `f` returns, if any.
///
/// Each replacement produces a fresh buffer and the search for the next block continues in
/// that buffer, right after the inserted text. Blocks are visited in document order and the
/// inserted text itself is never searched.
pub fn rewrite_key_blocks<F>(
    scanner: &BlockScanner,
    buffer: &str,
    key: &str,
    mut f: F,
) -> Result<Rewrite, ScanError>
where
    F: FnMut(&ParsedBlock) -> Option<String>,
{
    let mut current = buffer.to_owned();
    let mut from = 0;
    let mut replaced = 0;
    while let Some(span) = scanner.find_key_block(&current, key, from)? {
        let block = ParsedBlock::from_scan(&current, span, scanner.options());
        if let Some(text) = f(&block) {
            let next = splice_span(&current, span, &text)?;
            from = span.start + text.len();
            current = next;
            replaced += 1;
        } else {
            from = span.end;
        }
    }
    Ok(Rewrite { buffer: current, replaced })
}
