//! Unicode helpers for the line buffer and renderer.
//!
//! The buffer indexes by rune (character count) while the terminal moves the
//! cursor by display column, so both views are needed.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Count the number of Unicode characters (runes) in a string.
///
/// # Examples
///
/// ```
/// use rtprompt_core::unicode::rune_count;
///
/// assert_eq!(rune_count("hello"), 5);
/// assert_eq!(rune_count("こんにちは"), 5);
/// ```
pub fn rune_count(s: &str) -> usize {
    s.chars().count()
}

/// Get the display width of a string, accounting for wide characters.
///
/// # Examples
///
/// ```
/// use rtprompt_core::unicode::display_width;
///
/// assert_eq!(display_width("hello"), 5);
/// assert_eq!(display_width("こんにちは"), 10);
/// ```
pub fn display_width(s: &str) -> usize {
    s.width()
}

/// Display width of a single rune. Control characters count as zero.
pub fn char_width(c: char) -> usize {
    c.width().unwrap_or(0)
}

/// Extract a substring by rune indices (not byte indices).
///
/// Out-of-range indices are clamped; `end <= start` yields an empty string.
///
/// ```
/// use rtprompt_core::unicode::rune_slice;
///
/// assert_eq!(rune_slice("hello", 1, 4), "ell");
/// assert_eq!(rune_slice("こんにちは", 1, 3), "んに");
/// ```
pub fn rune_slice(s: &str, start: usize, end: usize) -> &str {
    if start >= end {
        return "";
    }
    let start_byte = byte_index_from_rune_index(s, start);
    let end_byte = byte_index_from_rune_index(s, end);
    &s[start_byte..end_byte]
}

/// Convert a rune index to a byte index, clamped to the string length.
pub fn byte_index_from_rune_index(s: &str, rune_index: usize) -> usize {
    s.char_indices()
        .nth(rune_index)
        .map(|(byte_idx, _)| byte_idx)
        .unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rune_count() {
        assert_eq!(rune_count(""), 0);
        assert_eq!(rune_count("hello"), 5);
        assert_eq!(rune_count("世界"), 2);
        assert_eq!(rune_count("🦀🚀"), 2);
        assert_eq!(rune_count("Hello 世界 🦀"), 10);
        assert_eq!(rune_count("e\u{0301}"), 2);
    }

    #[test]
    fn test_display_width() {
        assert_eq!(display_width(""), 0);
        assert_eq!(display_width("hello"), 5);
        assert_eq!(display_width("世界"), 4);
        assert_eq!(display_width("🦀"), 2);
        assert_eq!(display_width("Hello 世界"), 10);
        assert_eq!(display_width("a\u{200B}b"), 2);
    }

    #[test]
    fn test_char_width() {
        assert_eq!(char_width('a'), 1);
        assert_eq!(char_width('世'), 2);
        assert_eq!(char_width('\u{0301}'), 0);
        assert_eq!(char_width('\x07'), 0);
    }

    #[test]
    fn test_rune_slice() {
        assert_eq!(rune_slice("hello", 0, 5), "hello");
        assert_eq!(rune_slice("hello", 1, 4), "ell");
        assert_eq!(rune_slice("こんにちは", 3, 5), "ちは");
        assert_eq!(rune_slice("🦀🚀🎉", 1, 2), "🚀");
        assert_eq!(rune_slice("Hello 世界 🦀", 6, 8), "世界");

        assert_eq!(rune_slice("hello", 10, 20), "");
        assert_eq!(rune_slice("hello", 3, 3), "");
        assert_eq!(rune_slice("hello", 2, 1), "");
        assert_eq!(rune_slice("hello", 3, 99), "lo");
    }

    #[test]
    fn test_byte_index_from_rune_index() {
        assert_eq!(byte_index_from_rune_index("hello", 2), 2);
        assert_eq!(byte_index_from_rune_index("こんにちは", 2), 6);
        assert_eq!(byte_index_from_rune_index("café", 4), 5);
        assert_eq!(byte_index_from_rune_index("hello", 10), 5);
        assert_eq!(byte_index_from_rune_index("", 5), 0);
    }
}
