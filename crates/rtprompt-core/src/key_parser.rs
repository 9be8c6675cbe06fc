//! State machine-based key parser for handling raw terminal input.
//!
//! The parser keeps state between calls so escape sequences and multi-byte
//! UTF-8 characters that arrive split across reads still decode to a single
//! event. A lone `ESC` is held back until more bytes arrive or [`KeyParser::flush`]
//! is called, which is how a bare Escape press is told apart from an alt
//! combination or the start of a CSI sequence.

use crate::key::{Key, KeyEvent};
use crate::sequence_matcher::{MatchResult, SequenceMatcher};

/// Maximum buffer size to prevent unbounded memory growth
const MAX_BUFFER_SIZE: usize = 1024;

const ESC: u8 = 0x1b;

/// Parser state for handling different types of input sequences
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParserState {
    /// Plain input and known single-byte sequences
    Normal,
    /// Seen ESC, waiting to learn what follows
    EscapeSequence,
    /// Inside a Control Sequence Introducer sequence (ESC[)
    CsiSequence,
    /// Collecting the continuation bytes of a UTF-8 character
    Utf8 { expected: usize },
}

/// State machine parser for converting raw terminal input bytes to key events
pub struct KeyParser {
    state: ParserState,
    buffer: Vec<u8>,
    sequence_matcher: SequenceMatcher,
}

impl KeyParser {
    pub fn new() -> Self {
        Self {
            state: ParserState::Normal,
            buffer: Vec::new(),
            sequence_matcher: SequenceMatcher::new(),
        }
    }

    /// Feed raw bytes to the parser and return any complete key events.
    ///
    /// Partial sequences are buffered until they complete, turn out to be
    /// invalid, or are forced out by [`flush`](Self::flush).
    pub fn feed(&mut self, data: &[u8]) -> Vec<KeyEvent> {
        let mut events = Vec::new();

        for &byte in data {
            if self.buffer.len() >= MAX_BUFFER_SIZE {
                events.push(KeyEvent::simple(Key::NotDefined, self.buffer.clone()));
                self.reset();
            }

            match self.state {
                ParserState::Normal => self.handle_normal_byte(byte, &mut events),
                ParserState::EscapeSequence => self.handle_escape_byte(byte, &mut events),
                ParserState::CsiSequence => self.handle_csi_byte(byte, &mut events),
                ParserState::Utf8 { expected } => {
                    self.handle_utf8_byte(byte, expected, &mut events)
                }
            }
        }

        events
    }

    /// Resolve whatever is still buffered.
    ///
    /// Called by the reader when input goes quiet. A buffered lone `ESC`
    /// becomes a bare Escape; `ESC` plus one printable byte becomes an alt
    /// combination.
    pub fn flush(&mut self) -> Vec<KeyEvent> {
        let mut events = Vec::new();
        if self.buffer.is_empty() {
            self.reset();
            return events;
        }

        match self.state {
            ParserState::Utf8 { .. } => {
                events.push(KeyEvent::simple(Key::NotDefined, self.buffer.clone()));
            }
            _ => match self.buffer.as_slice() {
                [ESC] => events.push(KeyEvent::simple(Key::Escape, vec![ESC])),
                [ESC, b] if is_printable(*b) => events.push(KeyEvent::alt(*b as char)),
                _ => {
                    let bytes = self.buffer.clone();
                    match self.sequence_matcher.find_longest_match(&bytes) {
                        Some(longest) => {
                            let (head, tail) = bytes.split_at(longest.consumed_bytes);
                            self.emit(longest.key, head.to_vec(), &mut events);
                            events.extend(tail.iter().map(|&b| byte_event(b)));
                        }
                        None => events.extend(bytes.iter().map(|&b| byte_event(b))),
                    }
                }
            },
        }

        self.reset();
        events
    }

    /// Whether a partial sequence is waiting on more input.
    pub fn has_pending(&self) -> bool {
        !self.buffer.is_empty()
    }

    pub fn reset(&mut self) {
        self.state = ParserState::Normal;
        self.buffer.clear();
    }

    fn handle_normal_byte(&mut self, byte: u8, events: &mut Vec<KeyEvent>) {
        if byte == ESC {
            self.buffer.push(byte);
            self.state = ParserState::EscapeSequence;
            return;
        }

        if let MatchResult::Exact(key) = self.sequence_matcher.match_sequence(&[byte]) {
            self.emit(key, vec![byte], events);
            return;
        }

        match utf8_len(byte) {
            Some(1) => events.push(byte_event(byte)),
            Some(expected) => {
                self.buffer.push(byte);
                self.state = ParserState::Utf8 { expected };
            }
            None => events.push(KeyEvent::simple(Key::NotDefined, vec![byte])),
        }
    }

    fn handle_escape_byte(&mut self, byte: u8, events: &mut Vec<KeyEvent>) {
        if byte == ESC {
            // ESC ESC: the first one was a bare press
            events.push(KeyEvent::simple(Key::Escape, vec![ESC]));
            return;
        }

        self.buffer.push(byte);

        if byte == b'[' {
            self.state = ParserState::CsiSequence;
            return;
        }

        match self.sequence_matcher.match_sequence(&self.buffer) {
            MatchResult::Exact(key) => {
                let raw = std::mem::take(&mut self.buffer);
                self.emit(key, raw, events);
                self.reset();
            }
            MatchResult::Prefix => {}
            MatchResult::NoMatch if self.buffer.len() == 2 && is_printable(byte) => {
                events.push(KeyEvent::alt(byte as char));
                self.reset();
            }
            MatchResult::NoMatch => {
                let rest = self.buffer.split_off(1);
                events.push(KeyEvent::simple(Key::Escape, vec![ESC]));
                self.reset();
                for b in rest {
                    self.handle_normal_byte(b, events);
                }
            }
        }
    }

    fn handle_csi_byte(&mut self, byte: u8, events: &mut Vec<KeyEvent>) {
        self.buffer.push(byte);

        match self.sequence_matcher.match_sequence(&self.buffer) {
            MatchResult::Exact(key) => {
                let raw = std::mem::take(&mut self.buffer);
                self.emit(key, raw, events);
                self.reset();
            }
            MatchResult::Prefix => {}
            MatchResult::NoMatch => {
                if is_csi_parameter_byte(byte) {
                    // keep accumulating parameters
                } else if is_csi_final_byte(byte) {
                    // well-formed but unknown; swallowed as a rune-less event
                    events.push(KeyEvent::simple(Key::NotDefined, self.buffer.clone()));
                    self.reset();
                } else {
                    let rest = self.buffer.split_off(2);
                    events.push(KeyEvent::alt('['));
                    self.reset();
                    for b in rest {
                        self.handle_normal_byte(b, events);
                    }
                }
            }
        }
    }

    fn handle_utf8_byte(&mut self, byte: u8, expected: usize, events: &mut Vec<KeyEvent>) {
        if byte & 0xc0 != 0x80 {
            // truncated character; drop what we had and start over with this byte
            events.push(KeyEvent::simple(Key::NotDefined, self.buffer.clone()));
            self.reset();
            self.handle_normal_byte(byte, events);
            return;
        }

        self.buffer.push(byte);
        if self.buffer.len() < expected {
            return;
        }

        let raw = std::mem::take(&mut self.buffer);
        let rune = std::str::from_utf8(&raw).ok().and_then(|s| s.chars().next());
        events.push(KeyEvent::new(Key::NotDefined, raw, rune));
        self.reset();
    }

    fn emit(&self, key: Key, raw: Vec<u8>, events: &mut Vec<KeyEvent>) {
        if key != Key::Ignore {
            events.push(KeyEvent::simple(key, raw));
        }
    }
}

impl Default for KeyParser {
    fn default() -> Self {
        Self::new()
    }
}

fn is_printable(byte: u8) -> bool {
    byte.is_ascii() && !byte.is_ascii_control()
}

fn is_csi_parameter_byte(byte: u8) -> bool {
    matches!(byte, b'0'..=b'9' | b';' | b':' | b'<' | b'=' | b'>' | b'?')
}

fn is_csi_final_byte(byte: u8) -> bool {
    matches!(byte, b'@'..=b'~')
}

/// Total encoded length for a UTF-8 leading byte.
fn utf8_len(byte: u8) -> Option<usize> {
    match byte {
        0x00..=0x7f => Some(1),
        0xc2..=0xdf => Some(2),
        0xe0..=0xef => Some(3),
        0xf0..=0xf4 => Some(4),
        _ => None,
    }
}

fn byte_event(byte: u8) -> KeyEvent {
    if is_printable(byte) {
        KeyEvent::char(byte as char)
    } else {
        KeyEvent::simple(Key::NotDefined, vec![byte])
    }
}
