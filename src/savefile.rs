//! Loading a save file into a buffer, and writing a buffer back.
//!
//! Save files are usually Windows-1252, but files that have passed through other tools are
//! often UTF-8, sometimes with a BOM. The scanner works on a decoded `&str`; this module
//! remembers how the file was encoded so it can be written back the same way.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};

use crate::loc::{LineIndex, Loc};
use crate::report::{tips, ErrorKey};

const BOM: &[u8] = b"\xef\xbb\xbf";

/// A whole save file held in memory as text.
#[derive(Clone, Debug)]
pub struct SaveFile {
    pathname: Arc<PathBuf>,
    contents: String,
    encoding: &'static Encoding,
    bom: bool,
    lines: LineIndex,
}

impl SaveFile {
    /// Read and decode the file at `pathname`.
    pub fn read(pathname: &Path) -> Result<Self> {
        let bytes =
            fs::read(pathname).with_context(|| format!("could not read {}", pathname.display()))?;
        Ok(Self::from_bytes(pathname, &bytes))
    }

    /// Decode `bytes` as the contents of `pathname`.
    ///
    /// Plain ASCII without a BOM is taken to be Windows-1252, the games' own encoding, so that
    /// non-ASCII text spliced in later is written back the way the game expects. Otherwise the
    /// file is UTF-8 if it is valid UTF-8, and Windows-1252, which accepts any byte sequence,
    /// if not.
    pub fn from_bytes(pathname: &Path, bytes: &[u8]) -> Self {
        let pathname = Arc::new(pathname.to_path_buf());
        let (bom, body) = match bytes.strip_prefix(BOM) {
            Some(body) => (true, body),
            None => (false, bytes),
        };
        let (contents, encoding) = if !bom && body.is_ascii() {
            (WINDOWS_1252.decode_without_bom_handling(body).0.into_owned(), WINDOWS_1252)
        } else {
            match UTF_8.decode_without_bom_handling_and_without_replacement(body) {
                Some(contents) => (contents.into_owned(), UTF_8),
                None => {
                    let msg = "file is not valid UTF-8, reading it as Windows-1252";
                    tips(ErrorKey::Encoding).msg(msg).loc(Loc::for_file(Arc::clone(&pathname))).push();
                    (WINDOWS_1252.decode_without_bom_handling(body).0.into_owned(), WINDOWS_1252)
                }
            }
        };
        let lines = LineIndex::new(&contents);
        SaveFile { pathname, contents, encoding, bom, lines }
    }

    /// Wrap text that is already in memory. It will be written out as UTF-8 without a BOM.
    pub fn from_string(pathname: &Path, contents: String) -> Self {
        let lines = LineIndex::new(&contents);
        SaveFile { pathname: Arc::new(pathname.to_path_buf()), contents, encoding: UTF_8, bom: false, lines }
    }

    pub fn pathname(&self) -> &Path {
        &self.pathname
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }

    /// The encoding the file was read with, and will be written with.
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    pub fn has_bom(&self) -> bool {
        self.bom
    }

    /// Swap in a new buffer, typically the result of a splice on the old one.
    /// Any span found in the old buffer is meaningless for the new one.
    pub fn replace_contents(&mut self, contents: String) {
        self.lines = LineIndex::new(&contents);
        self.contents = contents;
    }

    /// The report location of a byte offset in the contents.
    pub fn loc_at(&self, offset: usize) -> Loc {
        self.lines.loc(&self.pathname, &self.contents, offset)
    }

    /// Encode the contents the way the file was read.
    ///
    /// Text that cannot be represented in the file's encoding is an error; it is never
    /// silently replaced.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(self.contents.len() + BOM.len());
        if self.bom {
            bytes.extend_from_slice(BOM);
        }
        if self.encoding == UTF_8 {
            bytes.extend_from_slice(self.contents.as_bytes());
        } else {
            let (encoded, _, unmappable) = self.encoding.encode(&self.contents);
            if unmappable {
                let bad = self
                    .contents
                    .chars()
                    .find(|c| {
                        let mut buf = [0; 4];
                        self.encoding.encode(c.encode_utf8(&mut buf)).2
                    })
                    .unwrap_or(char::REPLACEMENT_CHARACTER);
                bail!(
                    "{} contains `{bad}`, which cannot be written as {}",
                    self.pathname.display(),
                    self.encoding.name()
                );
            }
            bytes.extend_from_slice(&encoded);
        }
        Ok(bytes)
    }

    /// Write the contents to `pathname`, in the original encoding.
    pub fn write(&self, pathname: &Path) -> Result<()> {
        let bytes = self.encode()?;
        fs::write(pathname, bytes).with_context(|| format!("could not write {}", pathname.display()))
    }
}
