use crate::loc::Loc;
use crate::savefile::SaveFile;
use crate::span::TextSpan;

/// This trait lets the error reporting functions accept a variety of things as the error locator.
pub trait ErrorLoc {
    fn loc_length(&self) -> usize {
        1
    }
    fn into_loc(self) -> Loc;
}

impl ErrorLoc for Loc {
    fn into_loc(self) -> Loc {
        self
    }
}

impl ErrorLoc for &Loc {
    fn into_loc(self) -> Loc {
        self.clone()
    }
}

/// A span of a loaded save file. The carets cover the span up to the end of its first line.
impl ErrorLoc for (&SaveFile, TextSpan) {
    fn loc_length(&self) -> usize {
        let (file, span) = *self;
        span.text(file.contents())
            .map_or(1, |text| text.lines().next().map_or(1, |line| line.chars().count().max(1)))
    }

    fn into_loc(self) -> Loc {
        let (file, span) = self;
        file.loc_at(span.start)
    }
}
