//! Keybinding table mapping key events to line edits and session actions.
//!
//! The defaults reproduce the usual terminal line discipline (Ctrl-A, Ctrl-W,
//! Ctrl-U and friends) since raw mode switches the kernel's version off.

use crate::key::{Key, KeyEvent};
use crate::line_buffer::LineBuffer;
use log::trace;
use std::collections::HashMap;

/// Something a key can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditAction {
    MoveToStart,
    MoveToEnd,
    MoveLeft,
    MoveRight,
    DeleteBackward,
    DeleteForward,
    KillToStart,
    KillToEnd,
    DeletePreviousWord,
    WordLeft,
    WordRight,
    /// Ask the callback to act on Tab without touching the text
    Complete,
    Submit,
    Cancel,
    Interrupt,
    Ignore,
}

/// What the session should do after a key has been routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Continue,
    Submit,
    Cancel,
    Interrupt,
}

/// Outcome of routing a single key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Routed {
    pub command: Command,
    /// The buffer text differs from before the key
    pub changed: bool,
    pub tab: bool,
}

impl Routed {
    fn new(command: Command) -> Self {
        Self {
            command,
            changed: false,
            tab: false,
        }
    }

    /// Whether this key warrants a new callback invocation. Navigation never
    /// does.
    pub fn needs_callback(&self) -> bool {
        self.command == Command::Continue && (self.changed || self.tab)
    }
}

/// Routes key events to [`LineBuffer`] operations.
#[derive(Debug, Clone)]
pub struct KeyRouter {
    bindings: HashMap<Key, EditAction>,
    /// Bindings for `ESC` + letter
    alt_bindings: HashMap<char, EditAction>,
}

impl KeyRouter {
    pub fn new() -> Self {
        Self {
            bindings: Self::default_bindings(),
            alt_bindings: Self::default_alt_bindings(),
        }
    }

    fn default_bindings() -> HashMap<Key, EditAction> {
        let mut bindings = HashMap::new();

        // Navigation
        bindings.insert(Key::ControlA, EditAction::MoveToStart);
        bindings.insert(Key::Home, EditAction::MoveToStart);
        bindings.insert(Key::ControlE, EditAction::MoveToEnd);
        bindings.insert(Key::End, EditAction::MoveToEnd);
        bindings.insert(Key::ControlB, EditAction::MoveLeft);
        bindings.insert(Key::Left, EditAction::MoveLeft);
        bindings.insert(Key::ControlF, EditAction::MoveRight);
        bindings.insert(Key::Right, EditAction::MoveRight);
        bindings.insert(Key::ControlLeft, EditAction::WordLeft);
        bindings.insert(Key::ControlRight, EditAction::WordRight);

        // Editing
        bindings.insert(Key::Backspace, EditAction::DeleteBackward);
        bindings.insert(Key::ControlH, EditAction::DeleteBackward);
        bindings.insert(Key::Delete, EditAction::DeleteForward);
        bindings.insert(Key::ControlD, EditAction::DeleteForward);
        bindings.insert(Key::ControlU, EditAction::KillToStart);
        bindings.insert(Key::ControlK, EditAction::KillToEnd);
        bindings.insert(Key::ControlW, EditAction::DeletePreviousWord);

        // Session
        bindings.insert(Key::Tab, EditAction::Complete);
        bindings.insert(Key::Enter, EditAction::Submit);
        bindings.insert(Key::ControlM, EditAction::Submit);
        bindings.insert(Key::ControlC, EditAction::Interrupt);
        bindings.insert(Key::Escape, EditAction::Cancel);

        bindings
    }

    fn default_alt_bindings() -> HashMap<char, EditAction> {
        HashMap::from([('b', EditAction::WordLeft), ('f', EditAction::WordRight)])
    }

    /// Override or add a binding.
    pub fn bind(&mut self, key: Key, action: EditAction) {
        self.bindings.insert(key, action);
    }

    /// Override or add an alt (`ESC` + letter) binding.
    pub fn bind_alt(&mut self, letter: char, action: EditAction) {
        self.alt_bindings.insert(letter, action);
    }

    /// Resolve the action for an event. Printable runes without a binding
    /// insert themselves.
    pub fn action_for(&self, event: &KeyEvent) -> Option<EditAction> {
        if event.key == Key::Escape {
            return match event.rune {
                None => self.bindings.get(&Key::Escape).copied(),
                Some(letter) => self.alt_bindings.get(&letter).copied(),
            };
        }
        self.bindings.get(&event.key).copied()
    }

    /// Apply `event` to `buffer`.
    pub fn route(&self, event: &KeyEvent, buffer: &mut LineBuffer) -> Routed {
        let before = buffer.text().to_string();

        let mut routed = match self.action_for(event) {
            Some(action) => {
                trace!("key {:?} -> {:?}", event.key, action);
                apply(action, buffer)
            }
            None => match event.rune {
                Some(c) if event.key != Key::Escape && !c.is_control() => {
                    let mut buf = [0u8; 4];
                    buffer.insert(c.encode_utf8(&mut buf));
                    Routed::new(Command::Continue)
                }
                _ => {
                    trace!("ignoring key {:?} {:?}", event.key, event.raw_bytes);
                    Routed::new(Command::Continue)
                }
            },
        };

        routed.changed = buffer.text() != before;
        routed
    }
}

impl Default for KeyRouter {
    fn default() -> Self {
        Self::new()
    }
}

/// Cursor position at the start of the word before the cursor.
fn word_start(buffer: &LineBuffer) -> usize {
    buffer.word_boundary_before().map_or(0, |space| space + 1)
}

fn apply(action: EditAction, buffer: &mut LineBuffer) -> Routed {
    let mut routed = Routed::new(Command::Continue);
    match action {
        EditAction::MoveToStart => buffer.set_cursor(0),
        EditAction::MoveToEnd => buffer.set_cursor(buffer.len()),
        EditAction::MoveLeft => {
            buffer.move_cursor(-1);
        }
        EditAction::MoveRight => {
            buffer.move_cursor(1);
        }
        EditAction::DeleteBackward => {
            buffer.delete_backward(1);
        }
        EditAction::DeleteForward => {
            buffer.delete_forward(1);
        }
        EditAction::KillToStart => {
            buffer.delete_backward(buffer.cursor());
        }
        EditAction::KillToEnd => {
            buffer.delete_forward(buffer.len() - buffer.cursor());
        }
        EditAction::DeletePreviousWord => {
            let start = word_start(buffer);
            buffer.delete_backward(buffer.cursor() - start);
        }
        EditAction::WordLeft => {
            let start = word_start(buffer);
            buffer.set_cursor(start);
        }
        EditAction::WordRight => {
            let next = buffer.word_boundary_after() + 1;
            buffer.set_cursor(next);
        }
        EditAction::Complete => routed.tab = true,
        EditAction::Submit => routed.command = Command::Submit,
        EditAction::Cancel => routed.command = Command::Cancel,
        EditAction::Interrupt => routed.command = Command::Interrupt,
        EditAction::Ignore => {}
    }
    routed
}
