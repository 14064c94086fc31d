use std::borrow::Cow;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A position in a file, for use in reports.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Loc {
    pathname: Arc<PathBuf>,
    /// line 0 means the loc applies to the file as a whole.
    pub line: u32,
    /// Counted in characters, starting at 1.
    pub column: u32,
    /// Byte offset into the buffer.
    pub offset: usize,
}

impl Loc {
    pub fn for_file(pathname: Arc<PathBuf>) -> Self {
        Loc { pathname, line: 0, column: 0, offset: 0 }
    }

    pub fn pathname(&self) -> &Path {
        &self.pathname
    }

    pub fn line_marker(&self) -> String {
        format!("line {}", self.line)
    }

    pub fn filename(&self) -> Cow<'_, str> {
        self.pathname.file_name().unwrap_or_else(|| OsStr::new("")).to_string_lossy()
    }
}

/// The byte offsets at which each line of a buffer starts.
///
/// Save files run to tens of megabytes, so locating an offset should not rescan the buffer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(buffer: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(buffer.bytes().enumerate().filter(|&(_, b)| b == b'\n').map(|(i, _)| i + 1));
        LineIndex { starts }
    }

    /// Return the 1-based line and column of `offset`. The column counts characters.
    /// Offsets past the end are clamped to the end of the buffer.
    #[allow(clippy::cast_possible_truncation)] // no save file has 4 billion lines
    pub fn locate(&self, buffer: &str, offset: usize) -> (u32, u32) {
        let mut offset = offset.min(buffer.len());
        while !buffer.is_char_boundary(offset) {
            offset -= 1;
        }
        let line = self.starts.partition_point(|&start| start <= offset);
        let line_start = self.starts[line - 1];
        let column = buffer[line_start..offset].chars().count() + 1;
        (line as u32, column as u32)
    }

    /// Make a [`Loc`] for `offset` in `buffer`, which must be the buffer this index was made for.
    pub fn loc(&self, pathname: &Arc<PathBuf>, buffer: &str, offset: usize) -> Loc {
        let (line, column) = self.locate(buffer, offset);
        Loc { pathname: Arc::clone(pathname), line, column, offset }
    }

    pub fn line_count(&self) -> usize {
        self.starts.len()
    }
}
