//! Escape-sequence rendering for the prompt line and the auxiliary region.
//!
//! The prompt is never redrawn as a whole screen. The input line is patched in
//! place from the first changed column, and callback output is painted into a
//! block of rows below it while the cursor is parked on the input line using
//! save/restore. Rows are counted from the input line (row 0) downward.

use crate::console::{ClearType, ConsoleOutput};
use crate::error::ConsoleResult;
use crate::unicode;
use std::cmp::Ordering;

/// Draws the prompt and keeps track of what is on screen.
pub struct Renderer {
    output: Box<dyn ConsoleOutput>,
    prefix: String,
    padding: usize,
    /// Input text currently visible after the prefix
    shown_text: String,
    /// Cursor as rune index into `shown_text`
    shown_cursor: usize,
    /// Content rows of the last result painted at `padding`
    last_rows: usize,
    /// Furthest extent below the input line ever painted, for teardown
    written_line_count: usize,
}

impl Renderer {
    pub fn new(output: Box<dyn ConsoleOutput>, prefix: impl Into<String>, padding: usize) -> Self {
        Self {
            output,
            prefix: prefix.into(),
            padding,
            shown_text: String::new(),
            shown_cursor: 0,
            last_rows: 0,
            written_line_count: 0,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn padding(&self) -> usize {
        self.padding
    }

    pub fn written_line_count(&self) -> usize {
        self.written_line_count
    }

    /// Write the prefix. Called once when the session starts.
    pub fn begin(&mut self) -> ConsoleResult<()> {
        self.output.write_text(&self.prefix)?;
        self.output.flush()
    }

    /// Bring the visible input line in line with `text` and `cursor`.
    pub fn update_line(&mut self, text: &str, cursor: usize) -> ConsoleResult<()> {
        let old_col = unicode::display_width(unicode::rune_slice(
            &self.shown_text,
            0,
            self.shown_cursor,
        ));

        if text == self.shown_text {
            let new_col = unicode::display_width(unicode::rune_slice(text, 0, cursor));
            self.shown_cursor = cursor;
            return self.output.move_cursor_relative(0, column_delta(old_col, new_col));
        }

        let common = self
            .shown_text
            .chars()
            .zip(text.chars())
            .take_while(|(a, b)| a == b)
            .count();
        let common_col = unicode::display_width(unicode::rune_slice(text, 0, common));
        self.output
            .move_cursor_relative(0, column_delta(old_col, common_col))?;

        if common < unicode::rune_count(&self.shown_text) {
            self.output.clear(ClearType::FromCursorToEndOfLine)?;
        }
        let tail = &text[unicode::byte_index_from_rune_index(text, common)..];
        self.output.write_text(tail)?;

        let end_col = unicode::display_width(text);
        let cursor_col = unicode::display_width(unicode::rune_slice(text, 0, cursor));
        self.output
            .move_cursor_relative(0, column_delta(end_col, cursor_col))?;

        self.shown_text = text.to_string();
        self.shown_cursor = cursor;
        Ok(())
    }

    /// Paint `s` starting `padding` rows below the input line and return the
    /// cursor to where it was.
    ///
    /// An empty `s` writes nothing and leaves the bookkeeping untouched.
    pub fn paint(&mut self, s: &str, padding: usize) -> ConsoleResult<()> {
        if s.is_empty() {
            return Ok(());
        }

        // Make room below the prompt; padding rows are left as they are.
        self.output.write_text(&"\n".repeat(padding))?;

        let linecnt = s.matches('\n').count();
        self.output.clear(ClearType::CurrentLine)?;
        for _ in 0..linecnt {
            self.output.write_text("\n")?;
            self.output.clear(ClearType::CurrentLine)?;
        }

        self.written_line_count = self.written_line_count.max(linecnt + 1 + padding);

        let up = linecnt + padding;
        if up > 0 {
            self.output.move_cursor_relative(-(up as i32), 0)?;
        }
        self.output.save_cursor()?;

        // Raw mode output has no CR translation
        self.output.write_text(&"\n\r".repeat(padding))?;
        self.output.write_text(&s.replace('\n', "\n\r"))?;
        self.output.restore_cursor()
    }

    /// Blank `n` rows that start `p` rows below the input line.
    pub fn clear_previous_region(&mut self, n: usize, p: usize) -> ConsoleResult<()> {
        if n == 0 {
            return Ok(());
        }
        self.output.save_cursor()?;
        self.output.write_text(&"\n".repeat(p))?;
        for row in 0..n {
            if row > 0 {
                self.output.write_text("\n")?;
            }
            self.output.clear(ClearType::CurrentLine)?;
        }
        self.output.restore_cursor()
    }

    /// Replace the previously painted callback result with `s`.
    ///
    /// Empty output keeps whatever is currently shown.
    pub fn repaint(&mut self, s: &str) -> ConsoleResult<()> {
        if s.is_empty() {
            return Ok(());
        }
        self.clear_previous_region(self.last_rows, self.padding)?;
        self.paint(s, self.padding)?;
        self.last_rows = s.matches('\n').count() + 1;
        Ok(())
    }

    /// Erase everything painted below the input line and move to a fresh line.
    pub fn erase(&mut self) -> ConsoleResult<()> {
        if self.written_line_count > 0 {
            self.output.save_cursor()?;
            for _ in 0..self.written_line_count {
                self.output.write_text("\n")?;
                self.output.clear(ClearType::CurrentLine)?;
            }
            self.output.restore_cursor()?;
        }
        self.output.write_text("\r\n")?;
        self.written_line_count = 0;
        self.last_rows = 0;
        self.output.flush()
    }

    pub fn flush(&self) -> ConsoleResult<()> {
        self.output.flush()
    }
}

fn column_delta(from: usize, to: usize) -> i32 {
    match to.cmp(&from) {
        Ordering::Greater => (to - from) as i32,
        Ordering::Less => -((from - to) as i32),
        Ordering::Equal => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Recorder {
        bytes: Arc<Mutex<Vec<u8>>>,
    }

    impl Recorder {
        fn take(&self) -> String {
            let mut bytes = self.bytes.lock().unwrap();
            String::from_utf8(std::mem::take(&mut *bytes)).unwrap()
        }
    }

    impl ConsoleOutput for Recorder {
        fn write_raw(&self, bytes: &[u8]) -> ConsoleResult<()> {
            self.bytes.lock().unwrap().extend_from_slice(bytes);
            Ok(())
        }

        fn flush(&self) -> ConsoleResult<()> {
            Ok(())
        }
    }

    fn renderer(padding: usize) -> (Renderer, Recorder) {
        let recorder = Recorder::default();
        let renderer = Renderer::new(Box::new(recorder.clone()), "> ", padding);
        (renderer, recorder)
    }

    #[test]
    fn test_begin_writes_prefix() {
        let (mut r, out) = renderer(2);
        r.begin().unwrap();
        assert_eq!(out.take(), "> ");
    }

    #[test]
    fn test_empty_paint_is_idempotent() {
        let (mut r, out) = renderer(2);
        r.paint("", 2).unwrap();
        r.repaint("").unwrap();
        assert_eq!(out.take(), "");
        assert_eq!(r.written_line_count(), 0);

        r.paint("a\n", 2).unwrap();
        let written = r.written_line_count();
        out.take();
        r.paint("", 2).unwrap();
        assert_eq!(out.take(), "");
        assert_eq!(r.written_line_count(), written);
    }

    #[test]
    fn test_paint_sequence() {
        let (mut r, out) = renderer(2);
        r.paint("one\ntwo", 2).unwrap();
        assert_eq!(
            out.take(),
            "\n\n\x1b[2K\n\x1b[2K\x1b[3A\x1b[s\n\r\n\rone\n\rtwo\x1b[u"
        );
        assert_eq!(r.written_line_count(), 4);
    }

    #[test]
    fn test_paint_without_padding_does_not_move_up() {
        let (mut r, out) = renderer(0);
        r.paint("x", 0).unwrap();
        assert_eq!(out.take(), "\x1b[2K\x1b[sx\x1b[u");
    }

    #[test]
    fn test_written_line_count_keeps_maximum() {
        let (mut r, _out) = renderer(2);
        r.paint("a\nb\nc\n", 2).unwrap();
        assert_eq!(r.written_line_count(), 6);
        r.paint("a", 2).unwrap();
        assert_eq!(r.written_line_count(), 6);
        r.paint("debug\n", 10).unwrap();
        assert_eq!(r.written_line_count(), 12);
    }

    #[test]
    fn test_clear_previous_region() {
        let (mut r, out) = renderer(2);
        r.clear_previous_region(2, 2).unwrap();
        assert_eq!(out.take(), "\x1b[s\n\n\x1b[2K\n\x1b[2K\x1b[u");

        r.clear_previous_region(0, 2).unwrap();
        assert_eq!(out.take(), "");
    }

    #[test]
    fn test_repaint_clears_previous_rows() {
        let (mut r, out) = renderer(1);
        r.repaint("a\nb").unwrap();
        out.take();

        r.repaint("c").unwrap();
        let written = out.take();
        assert!(written.starts_with("\x1b[s\n\x1b[2K\n\x1b[2K\x1b[u"));
        assert!(written.ends_with("c\x1b[u"));
    }

    #[test]
    fn test_update_line_append() {
        let (mut r, out) = renderer(2);
        r.update_line("a", 1).unwrap();
        r.update_line("ab", 2).unwrap();
        assert_eq!(out.take(), "ab");
    }

    #[test]
    fn test_update_line_cursor_only() {
        let (mut r, out) = renderer(2);
        r.update_line("hello", 5).unwrap();
        out.take();

        r.update_line("hello", 2).unwrap();
        assert_eq!(out.take(), "\x1b[3D");

        // nothing to do at the same position
        r.update_line("hello", 2).unwrap();
        assert_eq!(out.take(), "");

        r.update_line("hello", 5).unwrap();
        assert_eq!(out.take(), "\x1b[3C");
    }

    #[test]
    fn test_update_line_insert_in_middle() {
        let (mut r, out) = renderer(2);
        r.update_line("held", 4).unwrap();
        r.update_line("held", 2).unwrap();
        out.take();

        r.update_line("hexld", 3).unwrap();
        assert_eq!(out.take(), "\x1b[Kxld\x1b[2D");
    }

    #[test]
    fn test_update_line_delete_backward() {
        let (mut r, out) = renderer(2);
        r.update_line("hello world", 11).unwrap();
        out.take();

        r.update_line("hello ", 6).unwrap();
        assert_eq!(out.take(), "\x1b[5D\x1b[K");
    }

    #[test]
    fn test_update_line_wide_chars() {
        let (mut r, out) = renderer(2);
        r.update_line("世界", 2).unwrap();
        out.take();

        r.update_line("世界", 1).unwrap();
        assert_eq!(out.take(), "\x1b[2D");
    }

    #[test]
    fn test_erase() {
        let (mut r, out) = renderer(1);
        r.paint("a", 1).unwrap();
        out.take();

        r.erase().unwrap();
        assert_eq!(out.take(), "\x1b[s\n\x1b[2K\n\x1b[2K\x1b[u\r\n");
        assert_eq!(r.written_line_count(), 0);
    }

    #[test]
    fn test_erase_without_output() {
        let (mut r, out) = renderer(2);
        r.erase().unwrap();
        assert_eq!(out.take(), "\r\n");
    }
}
