//! Core shared types for mapcheck.
//!
//! Text positions, line indexing and text edits. Everything else in the
//! workspace builds on these.

mod edit;
mod text;

pub use edit::{apply_text_edits, EditError, EditSet, TextEdit};
pub use text::{LineCol, LineIndex, TextRange, TextSize};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a compilation unit handed to the analyzer by the host.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FileId(u32);

impl FileId {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn to_raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileId({})", self.0)
    }
}

/// Convenience constructor used throughout the analyzer, which works in `usize`
/// byte offsets.
#[inline]
pub fn text_range(start: usize, end: usize) -> TextRange {
    TextRange::new(TextSize::from(start as u32), TextSize::from(end as u32))
}

/// Byte slice of `text` covered by `range`, or `None` when the range does not
/// fall on character boundaries inside the text.
pub fn slice(text: &str, range: TextRange) -> Option<&str> {
    let start = u32::from(range.start()) as usize;
    let end = u32::from(range.end()) as usize;
    text.get(start..end)
}
