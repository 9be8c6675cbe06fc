// Common test utilities for rendering and session tests.
// A small VT emulator replays the bytes the prompt wrote so tests can assert
// what a user would actually see.

#![allow(dead_code)]

use rtprompt::mock::MockConsoleOutput;

/// Error types for test operations
#[derive(Debug, thiserror::Error)]
pub enum TestError {
    #[error("Unsupported escape sequence: {0:?}")]
    UnsupportedSequence(String),

    #[error("Cursor restored without a saved position")]
    NothingSaved,
}

/// Result type for test operations
pub type TestResult<T> = Result<T, TestError>;

/// Terminal emulator covering the sequences the prompt emits: relative cursor
/// movement, CR/LF without output translation, line erasure, save/restore and
/// SGR (ignored).
pub struct TerminalEmulator {
    screen_size: (usize, usize),
    cursor_position: (usize, usize),
    saved_position: Option<(usize, usize)>,
    screen_buffer: Vec<Vec<char>>,
}

impl TerminalEmulator {
    /// Create a new terminal emulator with specified dimensions
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            screen_size: (cols, rows),
            cursor_position: (0, 0),
            saved_position: None,
            screen_buffer: vec![vec![' '; cols]; rows],
        }
    }

    /// Replay everything `output` has recorded so far.
    pub fn replay(output: &MockConsoleOutput) -> TestResult<Self> {
        let mut emulator = Self::new(80, 24);
        emulator.feed(&output.output_string())?;
        Ok(emulator)
    }

    /// Interpret a chunk of terminal output.
    pub fn feed(&mut self, data: &str) -> TestResult<()> {
        let mut chars = data.chars().peekable();
        while let Some(ch) = chars.next() {
            match ch {
                '\x1b' => {
                    let mut seq = String::from("\x1b");
                    match chars.next() {
                        Some('[') => seq.push('['),
                        Some(other) => {
                            seq.push(other);
                            return Err(TestError::UnsupportedSequence(seq));
                        }
                        None => return Err(TestError::UnsupportedSequence(seq)),
                    }
                    let mut params = String::new();
                    let final_byte = loop {
                        match chars.next() {
                            Some(c) if c.is_ascii_digit() || c == ';' => params.push(c),
                            Some(c) => break c,
                            None => return Err(TestError::UnsupportedSequence(seq + &params)),
                        }
                    };
                    self.apply_csi(&params, final_byte)?;
                }
                '\n' => self.line_feed(),
                '\r' => self.cursor_position.1 = 0,
                c => self.put(c),
            }
        }
        Ok(())
    }

    fn apply_csi(&mut self, params: &str, final_byte: char) -> TestResult<()> {
        let n = params.parse::<usize>().unwrap_or(1).max(1);
        let (row, col) = self.cursor_position;
        let (cols, rows) = self.screen_size;
        match final_byte {
            'A' => self.cursor_position.0 = row.saturating_sub(n),
            'B' => self.cursor_position.0 = (row + n).min(rows - 1),
            'C' => self.cursor_position.1 = (col + n).min(cols - 1),
            'D' => self.cursor_position.1 = col.saturating_sub(n),
            'K' => match params {
                "" | "0" => self.screen_buffer[row][col..].fill(' '),
                "1" => self.screen_buffer[row][..=col].fill(' '),
                "2" => self.screen_buffer[row].fill(' '),
                _ => return Err(TestError::UnsupportedSequence(format!("\\x1b[{params}K"))),
            },
            's' => self.saved_position = Some(self.cursor_position),
            'u' => self.cursor_position = self.saved_position.ok_or(TestError::NothingSaved)?,
            'm' => {}
            other => {
                return Err(TestError::UnsupportedSequence(format!("\\x1b[{params}{other}")));
            }
        }
        Ok(())
    }

    fn line_feed(&mut self) {
        let rows = self.screen_size.1;
        if self.cursor_position.0 + 1 < rows {
            self.cursor_position.0 += 1;
        } else {
            self.screen_buffer.remove(0);
            self.screen_buffer.push(vec![' '; self.screen_size.0]);
        }
    }

    fn put(&mut self, c: char) {
        let (row, col) = self.cursor_position;
        if col < self.screen_size.0 {
            self.screen_buffer[row][col] = c;
            self.cursor_position.1 = col + 1;
        }
    }

    /// Get current cursor position as (row, col)
    pub fn cursor_position(&self) -> (usize, usize) {
        self.cursor_position
    }

    /// Visible lines with trailing blanks trimmed and trailing empty rows dropped
    pub fn screen_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .screen_buffer
            .iter()
            .map(|row| row.iter().collect::<String>().trim_end().to_string())
            .collect();
        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }
        lines
    }

    /// Get screen contents as a single string
    pub fn screen_contents(&self) -> String {
        self.screen_lines().join("\n")
    }
}
