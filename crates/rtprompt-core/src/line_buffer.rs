//! Single-line text buffer with a rune-indexed cursor.
//!
//! Every operation keeps `0 <= cursor <= len` and treats out-of-range
//! requests as no-ops rather than errors.

use crate::unicode;

/// Editable input text plus cursor.
///
/// # Examples
///
/// ```
/// use rtprompt_core::line_buffer::LineBuffer;
///
/// let mut buffer = LineBuffer::new();
/// buffer.insert("hello world");
/// buffer.move_cursor(-6);
/// buffer.delete_backward(2);
/// assert_eq!(buffer.text(), "hel world");
/// assert_eq!(buffer.cursor(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineBuffer {
    text: String,
    /// Cursor position as rune index
    cursor: usize,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer pre-filled with `text`, cursor at the end.
    pub fn with_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let cursor = unicode::rune_count(&text);
        Self { text, cursor }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Length in runes.
    pub fn len(&self) -> usize {
        unicode::rune_count(&self.text)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn text_before_cursor(&self) -> &str {
        unicode::rune_slice(&self.text, 0, self.cursor)
    }

    pub fn text_after_cursor(&self) -> &str {
        let start = unicode::byte_index_from_rune_index(&self.text, self.cursor);
        &self.text[start..]
    }

    /// Place the cursor, clamped into `[0, len]`.
    pub fn set_cursor(&mut self, position: usize) {
        self.cursor = position.min(self.len());
    }

    /// Insert `s` at rune index `at` and leave the cursor just after it.
    /// No-op when `s` is empty.
    pub fn insert_at(&mut self, at: usize, s: &str) {
        if s.is_empty() {
            return;
        }
        let at = at.min(self.len());
        let byte = unicode::byte_index_from_rune_index(&self.text, at);
        self.text.insert_str(byte, s);
        self.cursor = at + unicode::rune_count(s);
    }

    /// Insert at the cursor.
    pub fn insert(&mut self, s: &str) {
        self.insert_at(self.cursor, s);
    }

    /// Remove up to `n` runes before the cursor and return them.
    pub fn delete_backward(&mut self, n: usize) -> String {
        let n = n.min(self.cursor);
        if n == 0 {
            return String::new();
        }
        let start = unicode::byte_index_from_rune_index(&self.text, self.cursor - n);
        let end = unicode::byte_index_from_rune_index(&self.text, self.cursor);
        self.cursor -= n;
        self.text.drain(start..end).collect()
    }

    /// Remove up to `n` runes from the cursor onward and return them.
    pub fn delete_forward(&mut self, n: usize) -> String {
        let n = n.min(self.len() - self.cursor);
        if n == 0 {
            return String::new();
        }
        let start = unicode::byte_index_from_rune_index(&self.text, self.cursor);
        let end = unicode::byte_index_from_rune_index(&self.text, self.cursor + n);
        self.text.drain(start..end).collect()
    }

    /// Shift the cursor by `delta` runes, clamped. Returns whether it moved.
    pub fn move_cursor(&mut self, delta: isize) -> bool {
        let target = self
            .cursor
            .saturating_add_signed(delta)
            .min(self.len());
        let moved = target != self.cursor;
        self.cursor = target;
        moved
    }

    /// Rune index of the nearest space before the cursor, ignoring spaces
    /// that directly precede it. `None` at the start of the line.
    ///
    /// ```
    /// use rtprompt_core::line_buffer::LineBuffer;
    ///
    /// let buffer = LineBuffer::with_text("this is a test ");
    /// assert_eq!(buffer.word_boundary_before(), Some(9));
    /// ```
    pub fn word_boundary_before(&self) -> Option<usize> {
        let prefix = self.text_before_cursor().trim_end_matches(' ');
        let byte = prefix.rfind(' ')?;
        Some(unicode::rune_count(&prefix[..byte]))
    }

    /// Rune index of the nearest space at or after the cursor, after skipping
    /// spaces sitting directly at the cursor. End of text when there is none.
    pub fn word_boundary_after(&self) -> usize {
        let after = self.text_after_cursor();
        let skipped = after.chars().take_while(|&c| c == ' ').count();
        let rest = after.chars().skip(skipped);
        let to_space = rest.take_while(|&c| c != ' ').count();
        self.cursor + skipped + to_space
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }
}
