//! The shared text buffer and its registered positions.
//!
//! Every tracked region of the metadata text is a [`Span`] registered with
//! the [`TextDocument`]. All mutation goes through [`TextDocument::replace`],
//! which relocates every registered span so that model bookkeeping survives
//! any sequence of edits. Spans whose text is removed outright are collapsed
//! and flagged rather than dropped, so holders can detect staleness.

use crate::errors::{EditorError, EditorResult};

/// A byte range in the document. Zero-length spans mark points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub offset: usize,
    pub length: usize,
    /// Set once the spanned text has been deleted by an edit.
    pub deleted: bool,
}

impl Span {
    pub fn new(offset: usize, length: usize) -> Self {
        Self {
            offset,
            length,
            deleted: false,
        }
    }

    pub fn end(&self) -> usize {
        self.offset + self.length
    }
}

/// Handle to a registered span. Ids are never reused within one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PositionId(usize);

/// Text buffer plus the position registry.
#[derive(Debug, Default)]
pub struct TextDocument {
    text: String,
    slots: Vec<Option<Span>>,
}

impl TextDocument {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            slots: Vec::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn add_position(&mut self, span: Span) -> PositionId {
        self.slots.push(Some(span));
        PositionId(self.slots.len() - 1)
    }

    /// Unregisters a span. Unknown or already removed ids are ignored.
    pub fn remove_position(&mut self, id: PositionId) {
        if let Some(slot) = self.slots.get_mut(id.0) {
            *slot = None;
        }
    }

    pub fn get(&self, id: PositionId) -> Option<Span> {
        self.slots.get(id.0).copied().flatten()
    }

    /// The current text under a live span.
    pub fn slice(&self, id: PositionId) -> Option<&str> {
        let span = self.get(id)?;
        if span.deleted {
            return None;
        }
        self.text.get(span.offset..span.end())
    }

    /// Rewrites a span in place. Used by the model when it extends a call
    /// region after appending arguments at its very end, where `replace`
    /// deliberately does not grow spans.
    pub fn set_span(&mut self, id: PositionId, offset: usize, length: usize) {
        if let Some(slot) = self.slots.get_mut(id.0) {
            if let Some(span) = slot {
                span.offset = offset;
                span.length = length;
                span.deleted = false;
            }
        }
    }

    /// 1-based line number of a byte offset.
    pub fn line_of_offset(&self, offset: usize) -> u32 {
        let end = offset.min(self.text.len());
        1 + self.text[..end].bytes().filter(|b| *b == b'\n').count() as u32
    }

    /// Replaces `offset..offset+length` with `text` and relocates every
    /// registered span:
    ///
    /// * spans ending at or before the edit are untouched; insertion at a
    ///   span's end does not grow it,
    /// * spans starting at or after the edit's end shift by the length
    ///   delta; insertion at a span's start pushes the span right,
    /// * a span exactly covering the edited range adopts the replacement
    ///   text as its new extent (deletion collapses it instead),
    /// * spans strictly containing the edit grow or shrink by the delta,
    /// * spans swallowed by the edit collapse to a deleted point at the
    ///   edit offset,
    /// * partial overlaps keep only the untouched part of the span.
    pub fn replace(&mut self, offset: usize, length: usize, text: &str) -> EditorResult<()> {
        let end = offset.checked_add(length).ok_or(EditorError::OutOfRange {
            offset,
            length,
            len: self.text.len(),
        })?;
        if end > self.text.len() {
            return Err(EditorError::OutOfRange {
                offset,
                length,
                len: self.text.len(),
            });
        }
        if !self.text.is_char_boundary(offset) {
            return Err(EditorError::NotCharBoundary { offset });
        }
        if !self.text.is_char_boundary(end) {
            return Err(EditorError::NotCharBoundary { offset: end });
        }

        let new_len = text.len();
        let delta = new_len as isize - length as isize;
        tracing::debug!(offset, length, new_len, "replacing document text");
        self.text.replace_range(offset..end, text);

        for slot in self.slots.iter_mut() {
            let Some(span) = slot else { continue };
            if span.deleted {
                continue;
            }
            let span_end = span.end();
            if span_end <= offset {
                continue;
            }
            if span.offset >= end {
                span.offset = (span.offset as isize + delta) as usize;
            } else if offset <= span.offset && end >= span_end {
                if offset == span.offset && end == span_end && new_len > 0 {
                    // In-place rewrite of exactly this span.
                    span.length = new_len;
                } else {
                    span.offset = offset;
                    span.length = 0;
                    span.deleted = true;
                }
            } else if offset >= span.offset && end <= span_end {
                // Edit strictly inside the span.
                span.length = (span.length as isize + delta) as usize;
            } else if offset < span.offset {
                // Edit overlaps the span's head.
                let cut = end - span.offset;
                span.offset = offset + new_len;
                span.length -= cut;
            } else {
                // Edit overlaps the span's tail.
                span.length = offset - span.offset;
            }
        }
        Ok(())
    }
}
