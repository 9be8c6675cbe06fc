//! Key definitions and key event structures for terminal input parsing.
//!
//! Only the keys a single-line prompt can act on get their own variant. Anything
//! else the parser recognizes but the prompt has no use for collapses into
//! [`Key::Ignore`] or [`Key::NotDefined`].

/// Key represents the named inputs that can be parsed from terminal input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Escape key. Carries a rune when it arrives as the first half of an
    /// alt combination (`ESC b`).
    Escape,

    // Control characters (Ctrl+A through Ctrl+Z)
    ControlA,
    ControlB,
    ControlC,
    ControlD,
    ControlE,
    ControlF,
    ControlG,
    ControlH,
    ControlK,
    ControlL,
    ControlM,
    ControlN,
    ControlO,
    ControlP,
    ControlQ,
    ControlR,
    ControlS,
    ControlT,
    ControlU,
    ControlV,
    ControlW,
    ControlX,
    ControlY,
    ControlZ,

    // Additional control combinations
    ControlSpace,
    ControlBackslash,
    ControlSquareClose,
    ControlCircumflex,
    ControlUnderscore,
    ControlLeft,
    ControlRight,

    // Navigation keys (arrow keys)
    Up,
    Down,
    Right,
    Left,

    // Navigation and editing keys
    Home,
    End,
    Delete,
    PageUp,
    PageDown,
    BackTab,
    Insert,
    Backspace,

    Tab,
    Enter,

    // Meta keys
    /// Key which should be ignored (no action should be taken)
    Ignore,
    /// Key is not defined: a printable rune or an unknown sequence
    NotDefined,
}

/// KeyEvent represents a parsed key input event.
///
/// `rune` is `None` when the key has no printable character. `Some('\0')` is a
/// real rune and never stands in for "nothing".
#[derive(Debug, Clone, PartialEq)]
pub struct KeyEvent {
    /// The parsed key type
    pub key: Key,
    /// The raw bytes that were parsed to produce this key event
    pub raw_bytes: Vec<u8>,
    /// Printable character carried by the event, if any
    pub rune: Option<char>,
}

impl KeyEvent {
    pub fn new(key: Key, raw_bytes: Vec<u8>, rune: Option<char>) -> Self {
        Self {
            key,
            raw_bytes,
            rune,
        }
    }

    /// Create a KeyEvent for a simple key without a rune
    pub fn simple(key: Key, raw_bytes: Vec<u8>) -> Self {
        Self::new(key, raw_bytes, None)
    }

    /// Create a KeyEvent for a printable character
    pub fn with_rune(key: Key, raw_bytes: Vec<u8>, rune: char) -> Self {
        Self::new(key, raw_bytes, Some(rune))
    }

    /// Shorthand for a typed character, with the UTF-8 encoding as raw bytes.
    pub fn char(c: char) -> Self {
        let mut buf = [0u8; 4];
        let raw = c.encode_utf8(&mut buf).as_bytes().to_vec();
        Self::with_rune(Key::NotDefined, raw, c)
    }

    /// Shorthand for an alt combination (`ESC` + letter).
    pub fn alt(c: char) -> Self {
        let mut raw = vec![0x1b];
        let mut buf = [0u8; 4];
        raw.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
        Self::with_rune(Key::Escape, raw, c)
    }

    pub fn has_rune(&self) -> bool {
        self.rune.is_some()
    }
}

impl Default for KeyEvent {
    fn default() -> Self {
        Self {
            key: Key::NotDefined,
            raw_bytes: Vec::new(),
            rune: None,
        }
    }
}
