//! Console input/output abstraction traits and types
//!
//! Backends implement two small required surfaces: starting a key reader and
//! writing bytes. Everything the renderer needs on top of that (cursor
//! movement, line clearing, save/restore, styling) is expressed as ANSI
//! sequences in provided trait methods so every backend emits the same bytes.

use crate::error::ConsoleResult;
use crate::key::KeyEvent;

/// Receives every parsed key event, or the error that interrupted a read.
pub type KeySink = Box<dyn FnMut(ConsoleResult<KeyEvent>) + Send>;

/// Console input interface
pub trait ConsoleInput: Send + Sync {
    /// Enable raw terminal mode with automatic restoration
    fn enable_raw_mode(&self) -> ConsoleResult<RawModeGuard>;

    /// Start reading keys on a background thread, delivering them to `sink`
    fn start_reader(&self, sink: KeySink) -> ConsoleResult<()>;

    /// Stop the reader; returns once it will deliver no more events
    fn stop_reader(&self) -> ConsoleResult<()>;

    fn is_running(&self) -> bool;

    /// Deliver the platform interrupt to the current process.
    fn raise_interrupt(&self);
}

/// Console output interface
pub trait ConsoleOutput: Send + Sync {
    /// Write raw bytes at the current cursor position
    fn write_raw(&self, bytes: &[u8]) -> ConsoleResult<()>;

    /// Flush buffered output to terminal
    fn flush(&self) -> ConsoleResult<()>;

    fn write_text(&self, text: &str) -> ConsoleResult<()> {
        self.write_raw(text.as_bytes())
    }

    fn write_styled_text(&self, text: &str, style: &TextStyle) -> ConsoleResult<()> {
        self.write_text(&style.paint(text))
    }

    /// Move cursor relative to current position. A zero delta writes nothing.
    fn move_cursor_relative(&self, row_delta: i32, col_delta: i32) -> ConsoleResult<()> {
        let mut seq = String::new();
        if row_delta < 0 {
            seq.push_str(&format!("\x1b[{}A", -row_delta));
        } else if row_delta > 0 {
            seq.push_str(&format!("\x1b[{row_delta}B"));
        }
        if col_delta < 0 {
            seq.push_str(&format!("\x1b[{}D", -col_delta));
        } else if col_delta > 0 {
            seq.push_str(&format!("\x1b[{col_delta}C"));
        }
        if seq.is_empty() {
            return Ok(());
        }
        self.write_raw(seq.as_bytes())
    }

    fn clear(&self, clear_type: ClearType) -> ConsoleResult<()> {
        let seq: &[u8] = match clear_type {
            ClearType::CurrentLine => b"\x1b[2K",
            ClearType::FromCursorToEndOfLine => b"\x1b[K",
        };
        self.write_raw(seq)
    }

    fn save_cursor(&self) -> ConsoleResult<()> {
        self.write_raw(b"\x1b[s")
    }

    fn restore_cursor(&self) -> ConsoleResult<()> {
        self.write_raw(b"\x1b[u")
    }
}

/// RAII guard for terminal raw mode.
///
/// The restore closure runs exactly once: either through [`restore`](Self::restore)
/// or when the guard is dropped.
pub struct RawModeGuard {
    restore_fn: Option<Box<dyn FnOnce() + Send>>,
    platform_info: String,
}

impl RawModeGuard {
    pub fn new<F>(restore_fn: F, platform_info: String) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            restore_fn: Some(Box::new(restore_fn)),
            platform_info,
        }
    }

    pub fn platform_info(&self) -> &str {
        &self.platform_info
    }

    /// Whether the terminal still has to be restored
    pub fn is_active(&self) -> bool {
        self.restore_fn.is_some()
    }

    /// Restore terminal mode now instead of on drop
    pub fn restore(mut self) {
        self.run_restore();
    }

    fn run_restore(&mut self) {
        if let Some(restore_fn) = self.restore_fn.take() {
            restore_fn();
        }
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        self.run_restore();
    }
}

impl std::fmt::Debug for RawModeGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawModeGuard")
            .field("platform_info", &self.platform_info)
            .field("is_active", &self.is_active())
            .finish()
    }
}

/// Text styling configuration
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextStyle {
    pub foreground: Option<Color>,
    pub background: Option<Color>,
    pub bold: bool,
    pub dim: bool,
    pub italic: bool,
    pub underline: bool,
    pub reverse: bool,
}

impl TextStyle {
    pub fn fg(color: Color) -> Self {
        Self {
            foreground: Some(color),
            ..Self::default()
        }
    }

    pub fn is_plain(&self) -> bool {
        *self == Self::default()
    }

    /// SGR sequence selecting this style; empty for a plain style
    pub fn to_ansi(&self) -> String {
        let mut codes = Vec::new();

        if let Some(fg) = &self.foreground {
            codes.push(fg.fg_code());
        }
        if let Some(bg) = &self.background {
            codes.push(bg.bg_code());
        }
        if self.bold {
            codes.push("1".to_string());
        }
        if self.dim {
            codes.push("2".to_string());
        }
        if self.italic {
            codes.push("3".to_string());
        }
        if self.underline {
            codes.push("4".to_string());
        }
        if self.reverse {
            codes.push("7".to_string());
        }

        if codes.is_empty() {
            String::new()
        } else {
            format!("\x1b[{}m", codes.join(";"))
        }
    }

    /// Wrap `text` in this style, resetting afterwards.
    pub fn paint(&self, text: &str) -> String {
        if self.is_plain() {
            return text.to_string();
        }
        format!("{}{text}\x1b[0m", self.to_ansi())
    }
}

/// Color specification for text styling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Color {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    BrightBlack,
    BrightRed,
    BrightGreen,
    BrightYellow,
    BrightBlue,
    BrightMagenta,
    BrightCyan,
    BrightWhite,
    Rgb(u8, u8, u8),
    Ansi256(u8),
}

impl Color {
    fn base_index(&self) -> Option<u8> {
        let index = match self {
            Color::Black => 0,
            Color::Red => 1,
            Color::Green => 2,
            Color::Yellow => 3,
            Color::Blue => 4,
            Color::Magenta => 5,
            Color::Cyan => 6,
            Color::White => 7,
            Color::BrightBlack => 60,
            Color::BrightRed => 61,
            Color::BrightGreen => 62,
            Color::BrightYellow => 63,
            Color::BrightBlue => 64,
            Color::BrightMagenta => 65,
            Color::BrightCyan => 66,
            Color::BrightWhite => 67,
            Color::Rgb(..) | Color::Ansi256(_) => return None,
        };
        Some(index)
    }

    pub fn fg_code(&self) -> String {
        match (self, self.base_index()) {
            (_, Some(index)) => (30 + index as u16).to_string(),
            (Color::Rgb(r, g, b), None) => format!("38;2;{r};{g};{b}"),
            (Color::Ansi256(n), None) => format!("38;5;{n}"),
            _ => String::new(),
        }
    }

    pub fn bg_code(&self) -> String {
        match (self, self.base_index()) {
            (_, Some(index)) => (40 + index as u16).to_string(),
            (Color::Rgb(r, g, b), None) => format!("48;2;{r};{g};{b}"),
            (Color::Ansi256(n), None) => format!("48;5;{n}"),
            _ => String::new(),
        }
    }
}

/// Line clearing options
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClearType {
    /// Clear current line
    CurrentLine,
    /// Clear from cursor to end of line
    FromCursorToEndOfLine,
}
