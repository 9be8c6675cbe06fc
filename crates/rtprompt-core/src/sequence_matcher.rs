//! Trie-based sequence matcher for key sequence parsing.
//!
//! Maps byte sequences to keys and tells the parser whether a partial sequence
//! could still become a longer valid one, so it knows whether to wait for more
//! bytes or to give up on what it has.

use crate::key::Key;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
struct TrieNode {
    key: Option<Key>,
    children: BTreeMap<u8, TrieNode>,
}

/// Result of matching a byte sequence against the Trie
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    /// Found an exact match for the sequence
    Exact(Key),
    /// The sequence is a prefix of one or more longer sequences
    Prefix,
    /// No match possible
    NoMatch,
}

/// Result of finding the longest valid sequence from the start of input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongestMatchResult {
    pub key: Key,
    pub consumed_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct SequenceMatcher {
    root: TrieNode,
}

impl SequenceMatcher {
    /// Create a new SequenceMatcher with all standard key sequences
    pub fn new() -> Self {
        let mut matcher = Self {
            root: TrieNode::default(),
        };
        matcher.build_standard_sequences();
        matcher
    }

    /// Whether the given bytes are an exact match, a prefix, or nothing.
    pub fn match_sequence(&self, bytes: &[u8]) -> MatchResult {
        if bytes.is_empty() {
            return MatchResult::NoMatch;
        }

        match self.find_node(bytes) {
            Some(TrieNode { key: Some(key), .. }) => MatchResult::Exact(*key),
            Some(_) => MatchResult::Prefix,
            None => MatchResult::NoMatch,
        }
    }

    /// Find the longest valid sequence from the start of bytes
    pub fn find_longest_match(&self, bytes: &[u8]) -> Option<LongestMatchResult> {
        let mut longest_match = None;
        let mut current_node = &self.root;

        for (i, byte) in bytes.iter().enumerate() {
            let Some(child) = current_node.children.get(byte) else {
                break;
            };
            current_node = child;
            if let Some(key) = current_node.key {
                longest_match = Some(LongestMatchResult {
                    key,
                    consumed_bytes: i + 1,
                });
            }
        }

        longest_match
    }

    fn find_node(&self, bytes: &[u8]) -> Option<&TrieNode> {
        let mut current = &self.root;
        for byte in bytes {
            current = current.children.get(byte)?;
        }
        Some(current)
    }

    /// Register a custom sequence mapping
    pub fn insert(&mut self, bytes: &[u8], key: Key) {
        let mut current = &mut self.root;
        for &byte in bytes {
            current = current.children.entry(byte).or_default();
        }
        current.key = Some(key);
    }

    fn build_standard_sequences(&mut self) {
        // Control characters (single byte)
        self.insert(&[0x1b], Key::Escape);
        self.insert(&[0x00], Key::ControlSpace);
        self.insert(&[0x01], Key::ControlA);
        self.insert(&[0x02], Key::ControlB);
        self.insert(&[0x03], Key::ControlC);
        self.insert(&[0x04], Key::ControlD);
        self.insert(&[0x05], Key::ControlE);
        self.insert(&[0x06], Key::ControlF);
        self.insert(&[0x07], Key::ControlG);
        self.insert(&[0x08], Key::ControlH);
        self.insert(&[0x09], Key::Tab);
        self.insert(&[0x0a], Key::Enter);
        self.insert(&[0x0b], Key::ControlK);
        self.insert(&[0x0c], Key::ControlL);
        self.insert(&[0x0d], Key::ControlM);
        self.insert(&[0x0e], Key::ControlN);
        self.insert(&[0x0f], Key::ControlO);
        self.insert(&[0x10], Key::ControlP);
        self.insert(&[0x11], Key::ControlQ);
        self.insert(&[0x12], Key::ControlR);
        self.insert(&[0x13], Key::ControlS);
        self.insert(&[0x14], Key::ControlT);
        self.insert(&[0x15], Key::ControlU);
        self.insert(&[0x16], Key::ControlV);
        self.insert(&[0x17], Key::ControlW);
        self.insert(&[0x18], Key::ControlX);
        self.insert(&[0x19], Key::ControlY);
        self.insert(&[0x1a], Key::ControlZ);
        self.insert(&[0x1c], Key::ControlBackslash);
        self.insert(&[0x1d], Key::ControlSquareClose);
        self.insert(&[0x1e], Key::ControlCircumflex);
        self.insert(&[0x1f], Key::ControlUnderscore);
        self.insert(&[0x7f], Key::Backspace);

        // Arrow keys (standard VT100)
        self.insert(&[0x1b, 0x5b, 0x41], Key::Up);
        self.insert(&[0x1b, 0x5b, 0x42], Key::Down);
        self.insert(&[0x1b, 0x5b, 0x43], Key::Right);
        self.insert(&[0x1b, 0x5b, 0x44], Key::Left);

        // Arrow keys (application cursor mode)
        self.insert(&[0x1b, 0x4f, 0x41], Key::Up);
        self.insert(&[0x1b, 0x4f, 0x42], Key::Down);
        self.insert(&[0x1b, 0x4f, 0x43], Key::Right);
        self.insert(&[0x1b, 0x4f, 0x44], Key::Left);

        // Home and End keys (multiple variants)
        self.insert(&[0x1b, 0x5b, 0x48], Key::Home);
        self.insert(&[0x1b, 0x4f, 0x48], Key::Home);
        self.insert(&[0x1b, 0x5b, 0x46], Key::End);
        self.insert(&[0x1b, 0x4f, 0x46], Key::End);
        self.insert(&[0x1b, 0x5b, 0x31, 0x7e], Key::Home);
        self.insert(&[0x1b, 0x5b, 0x34, 0x7e], Key::End);
        self.insert(&[0x1b, 0x5b, 0x37, 0x7e], Key::Home);
        self.insert(&[0x1b, 0x5b, 0x38, 0x7e], Key::End);

        self.insert(&[0x1b, 0x5b, 0x33, 0x7e], Key::Delete);
        self.insert(&[0x1b, 0x5b, 0x32, 0x7e], Key::Insert);
        self.insert(&[0x1b, 0x5b, 0x35, 0x7e], Key::PageUp);
        self.insert(&[0x1b, 0x5b, 0x36, 0x7e], Key::PageDown);
        self.insert(&[0x1b, 0x5b, 0x5a], Key::BackTab);

        // Control + Arrow keys
        self.insert(&[0x1b, 0x5b, 0x31, 0x3b, 0x35, 0x43], Key::ControlRight);
        self.insert(&[0x1b, 0x5b, 0x31, 0x3b, 0x35, 0x44], Key::ControlLeft);

        // Function keys have no binding in a prompt; swallow the common ones
        // instead of letting their tails leak in as printable text.
        for f in [0x50, 0x51, 0x52, 0x53] {
            self.insert(&[0x1b, 0x4f, f], Key::Ignore);
        }
        self.insert(&[0x1b, 0x5b, 0x45], Key::Ignore);
    }
}

impl Default for SequenceMatcher {
    fn default() -> Self {
        Self::new()
    }
}
