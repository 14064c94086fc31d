//! A read-only view of one brace block and the entries directly inside it.
//!
//! Nothing is parsed up front. [`ParsedBlock::entries`] tokenizes lazily, and nested blocks are
//! handed out as further `ParsedBlock` views that have not been looked into yet.

use crate::error::ScanError;
use crate::scan::{find_closing_quote, skip_comment, BlockScanner, ScanOptions};
use crate::span::TextSpan;

/// A brace block within a save buffer, or the whole buffer treated as the top-level block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParsedBlock<'a> {
    buffer: &'a str,
    /// The span including the braces. For a whole document this is the same as `inner`.
    outer: TextSpan,
    inner: TextSpan,
    options: ScanOptions,
}

/// A single token that is not a block: a number, a bareword such as `yes` or `CHI`, or a
/// quoted string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Scalar<'a> {
    /// The text without quotes.
    text: &'a str,
    /// The span of the token, including quotes if it had them.
    span: TextSpan,
    quoted: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Value<'a> {
    Scalar(Scalar<'a>),
    Block(ParsedBlock<'a>),
}

/// One item directly inside a block.
///
/// `key = value` entries have a key. Bare items, like the numbers in `{ 1 2 3 }` or the
/// blocks in `{ { a=1 } { a=2 } }`, do not.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Entry<'a> {
    pub key: Option<Scalar<'a>>,
    pub value: Value<'a>,
}

impl<'a> ParsedBlock<'a> {
    /// View the block at `span`, which must start with `{` and end with the matching `}`.
    pub fn new(buffer: &'a str, span: TextSpan, options: ScanOptions) -> Result<Self, ScanError> {
        span.check(buffer)?;
        if span.is_empty() {
            return Err(ScanError::InvalidStart { offset: span.start });
        }
        let close = BlockScanner::new(options).find_matching_close(buffer, span.start)?;
        if close + 1 != span.end {
            return Err(ScanError::NotABlock { start: span.start, end: span.end });
        }
        Ok(Self::from_scan(buffer, span, options))
    }

    /// Wrap a span that a scanner with these `options` just returned for this buffer.
    pub(crate) fn from_scan(buffer: &'a str, span: TextSpan, options: ScanOptions) -> Self {
        ParsedBlock { buffer, outer: span, inner: span.inner(), options }
    }

    /// View a whole buffer as a block without braces, the way a save file or config file is
    /// one implicit top-level block.
    pub fn document(buffer: &'a str, options: ScanOptions) -> Self {
        let whole = TextSpan::whole(buffer);
        ParsedBlock { buffer, outer: whole, inner: whole, options }
    }

    /// The span of the block, braces included.
    pub fn span(&self) -> TextSpan {
        self.outer
    }

    /// The span between the braces.
    pub fn inner_span(&self) -> TextSpan {
        self.inner
    }

    /// The text between the braces, unparsed.
    pub fn raw_text(&self) -> &'a str {
        &self.buffer[self.inner.range()]
    }

    pub fn entries(&self) -> Entries<'a> {
        Entries {
            buffer: self.buffer,
            pos: self.inner.start,
            end: self.inner.end,
            options: self.options,
            done: false,
        }
    }

    /// Get the value of the first `key = value` entry with this key.
    pub fn get_field(&self, key: &str) -> Result<Option<Value<'a>>, ScanError> {
        for entry in self.entries() {
            let entry = entry?;
            if entry.key_is(key) {
                return Ok(Some(entry.value));
            }
        }
        Ok(None)
    }

    /// Like [`ParsedBlock::get_field`] but only for scalar values.
    pub fn get_field_value(&self, key: &str) -> Result<Option<Scalar<'a>>, ScanError> {
        for entry in self.entries() {
            let entry = entry?;
            if let (true, Value::Scalar(scalar)) = (entry.key_is(key), entry.value) {
                return Ok(Some(scalar));
            }
        }
        Ok(None)
    }

    /// Like [`ParsedBlock::get_field`] but only for block values.
    pub fn get_field_block(&self, key: &str) -> Result<Option<ParsedBlock<'a>>, ScanError> {
        for entry in self.entries() {
            let entry = entry?;
            if let (true, Value::Block(block)) = (entry.key_is(key), entry.value) {
                return Ok(Some(block));
            }
        }
        Ok(None)
    }

    /// All block values for this key, in order. Save files repeat keys freely.
    pub fn get_field_blocks(&self, key: &str) -> Result<Vec<ParsedBlock<'a>>, ScanError> {
        let mut vec = Vec::new();
        for entry in self.entries() {
            let entry = entry?;
            if let (true, Value::Block(block)) = (entry.key_is(key), entry.value) {
                vec.push(block);
            }
        }
        Ok(vec)
    }

    /// `Some(true)` for `key = yes`, `Some(false)` for `key = no`, otherwise `None`.
    pub fn get_field_bool(&self, key: &str) -> Result<Option<bool>, ScanError> {
        Ok(self.get_field_value(key)?.and_then(|v| v.as_bool()))
    }

    pub fn get_field_integer(&self, key: &str) -> Result<Option<i64>, ScanError> {
        Ok(self.get_field_value(key)?.and_then(|v| v.as_integer()))
    }

    pub fn get_field_number(&self, key: &str) -> Result<Option<f64>, ScanError> {
        Ok(self.get_field_value(key)?.and_then(|v| v.as_number()))
    }

    /// Count the `key = value` entries with this key, whatever their value.
    pub fn count_key(&self, key: &str) -> Result<usize, ScanError> {
        let mut count = 0;
        for entry in self.entries() {
            if entry?.key_is(key) {
                count += 1;
            }
        }
        Ok(count)
    }
}

impl<'a> Scalar<'a> {
    pub fn as_str(&self) -> &'a str {
        self.text
    }

    pub fn span(&self) -> TextSpan {
        self.span
    }

    pub fn is_quoted(&self) -> bool {
        self.quoted
    }

    pub fn is(&self, s: &str) -> bool {
        self.text == s
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.text {
            "yes" => Some(true),
            "no" => Some(false),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        self.text.parse().ok()
    }

    pub fn as_number(&self) -> Option<f64> {
        self.text.parse().ok()
    }
}

impl<'a> Value<'a> {
    pub fn as_scalar(&self) -> Option<Scalar<'a>> {
        match self {
            Value::Scalar(s) => Some(*s),
            Value::Block(_) => None,
        }
    }

    pub fn as_block(&self) -> Option<ParsedBlock<'a>> {
        match self {
            Value::Scalar(_) => None,
            Value::Block(b) => Some(*b),
        }
    }

    pub fn span(&self) -> TextSpan {
        match self {
            Value::Scalar(s) => s.span(),
            Value::Block(b) => b.span(),
        }
    }
}

impl Entry<'_> {
    pub fn key_is(&self, key: &str) -> bool {
        self.key.is_some_and(|k| k.is(key))
    }

    /// The span from the start of the key (or the bare value) to the end of the value.
    pub fn span(&self) -> TextSpan {
        let end = self.value.span().end;
        match self.key {
            Some(key) => TextSpan::new(key.span().start, end),
            None => self.value.span(),
        }
    }
}

/// Lazy iterator over the entries directly inside a [`ParsedBlock`].
///
/// After the first error the iterator is exhausted.
#[derive(Clone, Debug)]
pub struct Entries<'a> {
    buffer: &'a str,
    pos: usize,
    end: usize,
    options: ScanOptions,
    done: bool,
}

fn is_bareword_byte(b: u8) -> bool {
    // Bytes of multi-byte characters are always part of the word.
    !b.is_ascii_whitespace() && !matches!(b, b'=' | b'{' | b'}' | b'"' | b'#')
}

impl<'a> Entries<'a> {
    /// Skip whitespace and comments.
    fn skip_trivia(&self, mut i: usize) -> usize {
        let bytes = self.buffer.as_bytes();
        while i < self.end {
            if bytes[i].is_ascii_whitespace() {
                i += 1;
            } else if bytes[i] == b'#' {
                i = skip_comment(bytes, i).min(self.end);
            } else {
                break;
            }
        }
        i
    }

    /// Read the scalar token that starts at `i`, and return it with the offset after it.
    fn scalar_at(&self, i: usize) -> (Scalar<'a>, usize) {
        let bytes = self.buffer.as_bytes();
        if bytes[i] == b'"' {
            // An unclosed string stops at the end of its line or of the block.
            let (text_end, after) = match find_closing_quote(bytes, i) {
                Ok(close) if close < self.end => (close, close + 1),
                Ok(_) => (self.end, self.end),
                Err(cut) => (cut.min(self.end), cut.min(self.end)),
            };
            let scalar = Scalar {
                text: &self.buffer[i + 1..text_end],
                span: TextSpan::new(i, after),
                quoted: true,
            };
            (scalar, after)
        } else {
            let mut j = i;
            while j < self.end && is_bareword_byte(bytes[j]) {
                j += 1;
            }
            let scalar =
                Scalar { text: &self.buffer[i..j], span: TextSpan::new(i, j), quoted: false };
            (scalar, j)
        }
    }

    /// Read the block that opens at `i`, and return it with the offset after it.
    fn block_at(&self, i: usize) -> Result<(ParsedBlock<'a>, usize), ScanError> {
        let close = BlockScanner::new(self.options).find_matching_close(self.buffer, i)?;
        if close >= self.end {
            return Err(ScanError::UnbalancedBraces { start: i });
        }
        let block = ParsedBlock::from_scan(self.buffer, TextSpan::new(i, close + 1), self.options);
        Ok((block, close + 1))
    }

    fn value_at(&self, i: usize) -> Result<(Value<'a>, usize), ScanError> {
        if self.buffer.as_bytes()[i] == b'{' {
            let (block, after) = self.block_at(i)?;
            Ok((Value::Block(block), after))
        } else {
            let (scalar, after) = self.scalar_at(i);
            Ok((Value::Scalar(scalar), after))
        }
    }

    fn next_entry(&mut self) -> Result<Option<Entry<'a>>, ScanError> {
        let bytes = self.buffer.as_bytes();
        let i = self.skip_trivia(self.pos);
        if i >= self.end {
            return Ok(None);
        }
        match bytes[i] {
            b'}' => Err(ScanError::UnmatchedClose { offset: i }),
            b'=' => Err(ScanError::MissingKey { offset: i }),
            b'{' => {
                let (value, after) = self.value_at(i)?;
                self.pos = after;
                Ok(Some(Entry { key: None, value }))
            }
            _ => {
                let (token, after) = self.scalar_at(i);
                let eq = self.skip_trivia(after);
                if eq < self.end && bytes[eq] == b'=' {
                    let v = self.skip_trivia(eq + 1);
                    if v >= self.end || matches!(bytes[v], b'}' | b'=') {
                        return Err(ScanError::MissingValue { offset: eq });
                    }
                    let (value, after) = self.value_at(v)?;
                    self.pos = after;
                    Ok(Some(Entry { key: Some(token), value }))
                } else {
                    self.pos = after;
                    Ok(Some(Entry { key: None, value: Value::Scalar(token) }))
                }
            }
        }
    }
}

impl<'a> Iterator for Entries<'a> {
    type Item = Result<Entry<'a>, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::find_key_block;

    fn block_for<'a>(buffer: &'a str, key: &str) -> ParsedBlock<'a> {
        let span = find_key_block(buffer, key, 0).unwrap().unwrap();
        ParsedBlock::new(buffer, span, ScanOptions::default()).unwrap()
    }

    #[test]
    fn test_nested_raw_text() {
        let buffer = "CHI={\n a=1\n INNER={\n b=2\n }\n}";
        let block = block_for(buffer, "CHI");
        assert_eq!(block.raw_text(), "\n a=1\n INNER={\n b=2\n }\n");
        assert!(block.raw_text().contains("INNER={\n b=2\n }"));

        let entries: Vec<_> = block.entries().collect::<Result<_, _>>().unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].key_is("a"));
        assert_eq!(entries[0].value.as_scalar().map(|s| s.as_str()), Some("1"));
        assert!(entries[1].key_is("INNER"));
        let inner = entries[1].value.as_block().unwrap();
        assert_eq!(inner.raw_text(), "\n b=2\n ");
    }

    #[test]
    fn test_bare_values() {
        let buffer = "list={ 1 2 3 { x=1 } \"a b\" }";
        let block = block_for(buffer, "list");
        let entries: Vec<_> = block.entries().collect::<Result<_, _>>().unwrap();
        assert_eq!(entries.len(), 5);
        assert!(entries.iter().all(|e| e.key.is_none()));
        assert!(entries[3].value.as_block().is_some());
        let quoted = entries[4].value.as_scalar().unwrap();
        assert_eq!(quoted.as_str(), "a b");
        assert!(quoted.is_quoted());
        assert_eq!(quoted.span().text(buffer).unwrap(), "\"a b\"");
    }

    #[test]
    fn test_getters() {
        let buffer = "CHI={ civilized=yes prestige=12.5 money=-300 ruling_party=7\n \
                      name=\"Qing\" pop={ size=1 } pop={ size=2 } }";
        let block = block_for(buffer, "CHI");
        assert_eq!(block.get_field_bool("civilized"), Ok(Some(true)));
        assert_eq!(block.get_field_number("prestige"), Ok(Some(12.5)));
        assert_eq!(block.get_field_integer("money"), Ok(Some(-300)));
        assert_eq!(block.get_field_integer("ruling_party"), Ok(Some(7)));
        assert_eq!(block.get_field_value("name").unwrap().map(|s| s.as_str()), Some("Qing"));
        assert_eq!(block.get_field_blocks("pop").unwrap().len(), 2);
        assert_eq!(block.count_key("pop"), Ok(2));
        assert_eq!(block.get_field("missing"), Ok(None));
        assert_eq!(block.get_field_block("name"), Ok(None));
    }

    #[test]
    fn test_comments_and_spacing() {
        let buffer = "x = {\n\t# the ideology spread\n\tideology = {\n\t\t1 = 10.5 # trailing\n\t}\n}";
        let block = block_for(buffer, "x");
        let ideology = block.get_field_block("ideology").unwrap().unwrap();
        assert_eq!(ideology.get_field_number("1"), Ok(Some(10.5)));
    }

    #[test]
    fn test_document() {
        let buffer = "date=\"1836.1.1\"\nplayer=\"ENG\"\nENG={ tax=1 }\n";
        let doc = ParsedBlock::document(buffer, ScanOptions::default());
        assert_eq!(doc.raw_text(), buffer);
        assert_eq!(doc.get_field_value("player").unwrap().map(|s| s.as_str()), Some("ENG"));
        assert!(doc.get_field_block("ENG").unwrap().is_some());
    }

    #[test]
    fn test_missing_value() {
        let doc = ParsedBlock::document("a = 1 b =", ScanOptions::default());
        let results: Vec<_> = doc.entries().collect();
        assert_eq!(results.len(), 2);
        assert_eq!(results[1], Err(ScanError::MissingValue { offset: 8 }));
    }

    #[test]
    fn test_stray_close_in_document() {
        let doc = ParsedBlock::document("a = 1 } b = 2", ScanOptions::default());
        let results: Vec<_> = doc.entries().collect();
        assert_eq!(results[1], Err(ScanError::UnmatchedClose { offset: 6 }));
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_missing_key() {
        let doc = ParsedBlock::document("= 1", ScanOptions::default());
        assert_eq!(doc.get_field("a"), Err(ScanError::MissingKey { offset: 0 }));
    }

    #[test]
    fn test_new_rejects_bad_span() {
        let buffer = "a={ b=1 }";
        let opts = ScanOptions::default();
        assert_eq!(
            ParsedBlock::new(buffer, TextSpan::new(0, 9), opts),
            Err(ScanError::InvalidStart { offset: 0 })
        );
        assert_eq!(
            ParsedBlock::new(buffer, TextSpan::new(2, 8), opts),
            Err(ScanError::NotABlock { start: 2, end: 8 })
        );
        assert!(ParsedBlock::new(buffer, TextSpan::new(2, 9), opts).is_ok());
    }

    #[test]
    fn test_new_needs_matching_close() {
        let buffer = "a={ x } }";
        let opts = ScanOptions::default();
        assert_eq!(
            ParsedBlock::new(buffer, TextSpan::new(2, 9), opts),
            Err(ScanError::NotABlock { start: 2, end: 9 })
        );
        assert_eq!(ParsedBlock::new(buffer, TextSpan::new(2, 7), opts).map(|b| b.raw_text()), Ok(" x "));
        assert_eq!(
            ParsedBlock::new("a={ x", TextSpan::new(2, 5), opts),
            Err(ScanError::UnbalancedBraces { start: 2 })
        );
    }

    #[test]
    fn test_entry_span() {
        let buffer = "b={ tag = CHI }";
        let block = block_for(buffer, "b");
        let entry = block.entries().next().unwrap().unwrap();
        assert_eq!(entry.span().text(buffer).unwrap(), "tag = CHI");
    }
}
