//! Text edits and their composition.
//!
//! A fix is assembled from independent pieces (a chain rewrite, `using`
//! directives, sibling statements, appended types) that are produced without
//! knowledge of each other. [`EditSet`] collects them against one snapshot,
//! rejecting any piece that would rewrite text another piece already touches.

use crate::{TextRange, TextSize};
use thiserror::Error;

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct TextEdit {
    pub range: TextRange,
    pub replacement: String,
}

impl TextEdit {
    pub fn new(range: TextRange, replacement: impl Into<String>) -> Self {
        Self {
            range,
            replacement: replacement.into(),
        }
    }

    pub fn insert(offset: TextSize, text: impl Into<String>) -> Self {
        Self::new(TextRange::empty(offset), text)
    }

    fn is_insert(&self) -> bool {
        self.range.is_empty()
    }

    /// Whether both edits rewrite some of the same text. Inserts only conflict
    /// with replacements strictly around their offset.
    fn conflicts_with(&self, other: &TextEdit) -> bool {
        match (self.is_insert(), other.is_insert()) {
            (true, true) => false,
            (true, false) => strictly_inside(self.range.start(), other.range),
            (false, true) => strictly_inside(other.range.start(), self.range),
            (false, false) => {
                self.range.start() < other.range.end() && other.range.start() < self.range.end()
            }
        }
    }
}

fn strictly_inside(offset: TextSize, range: TextRange) -> bool {
    range.start() < offset && offset < range.end()
}

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum EditError {
    #[error("edit range {range:?} is out of bounds for text length {text_len:?}")]
    RangeOutOfBounds { range: TextRange, text_len: TextSize },
    #[error("offset {offset:?} is not a UTF-8 character boundary")]
    InvalidUtf8Boundary { offset: TextSize },
    #[error("conflicting edits: {first:?} overlaps {second:?}")]
    Conflict { first: TextRange, second: TextRange },
}

/// Edits against one text snapshot, kept sorted by range.
///
/// Inserts at the same offset are merged in the order they were pushed, so
/// text pushed later ends up after text pushed earlier.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct EditSet {
    edits: Vec<TextEdit>,
}

impl EditSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn push(&mut self, edit: TextEdit) -> Result<(), EditError> {
        if let Some(existing) = self.edits.iter().find(|e| e.conflicts_with(&edit)) {
            return Err(EditError::Conflict {
                first: existing.range,
                second: edit.range,
            });
        }
        if edit.is_insert() {
            if let Some(existing) = self
                .edits
                .iter_mut()
                .find(|e| e.is_insert() && e.range == edit.range)
            {
                existing.replacement.push_str(&edit.replacement);
                return Ok(());
            }
        }
        let key = (edit.range.start(), edit.range.end());
        let at = self
            .edits
            .partition_point(|e| (e.range.start(), e.range.end()) <= key);
        self.edits.insert(at, edit);
        Ok(())
    }

    pub fn edits(&self) -> &[TextEdit] {
        &self.edits
    }

    pub fn into_edits(self) -> Vec<TextEdit> {
        self.edits
    }

    /// Apply every edit to `text`, checking each range against it first.
    pub fn apply(&self, text: &str) -> Result<String, EditError> {
        let text_len = TextSize::of(text);
        for edit in &self.edits {
            if edit.range.end() > text_len {
                return Err(EditError::RangeOutOfBounds {
                    range: edit.range,
                    text_len,
                });
            }
            for offset in [edit.range.start(), edit.range.end()] {
                if !text.is_char_boundary(u32::from(offset) as usize) {
                    return Err(EditError::InvalidUtf8Boundary { offset });
                }
            }
        }

        // Back to front, so earlier offsets stay valid.
        let mut out = text.to_string();
        for edit in self.edits.iter().rev() {
            let start = u32::from(edit.range.start()) as usize;
            let end = u32::from(edit.range.end()) as usize;
            out.replace_range(start..end, &edit.replacement);
        }
        Ok(out)
    }
}

impl TryFrom<&[TextEdit]> for EditSet {
    type Error = EditError;

    fn try_from(edits: &[TextEdit]) -> Result<Self, EditError> {
        let mut set = EditSet::new();
        for edit in edits {
            set.push(edit.clone())?;
        }
        Ok(set)
    }
}

/// Apply `edits`, in the order given, to a text snapshot.
pub fn apply_text_edits(text: &str, edits: &[TextEdit]) -> Result<String, EditError> {
    EditSet::try_from(edits)?.apply(text)
}
