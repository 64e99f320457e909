//! Text helpers for story normalization.
//!
//! Length limits count grapheme clusters so that truncation never splits a
//! user-perceived character.

use sha2::{Digest, Sha256};
use unicode_segmentation::UnicodeSegmentation;

/// Number of grapheme clusters in `text`.
pub fn grapheme_len(text: &str) -> usize {
    text.graphemes(true).count()
}

/// The first `max` grapheme clusters of `text`.
pub fn take_graphemes(text: &str, max: usize) -> &str {
    match text.grapheme_indices(true).nth(max) {
        Some((byte_offset, _)) => &text[..byte_offset],
        None => text,
    }
}

/// Replace line breaks with spaces and trim the ends.
pub fn flatten_lines(text: &str) -> String {
    text.replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
        .trim()
        .to_string()
}

/// SHA-256 of whitespace-collapsed, lowercased text, hex encoded.
pub fn content_hash(text: &str) -> String {
    let canonical = text
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_graphemes_respects_clusters() {
        assert_eq!(take_graphemes("héllo", 2), "hé");
        assert_eq!(take_graphemes("e\u{301}x", 1), "e\u{301}");
        assert_eq!(take_graphemes("short", 100), "short");
        assert_eq!(grapheme_len("e\u{301}x"), 2);
    }

    #[test]
    fn test_flatten_lines() {
        assert_eq!(flatten_lines("  line one\nline two\r\nthree \n"), "line one line two three");
    }

    #[test]
    fn test_content_hash_ignores_case_and_spacing() {
        assert_eq!(content_hash("I got  better"), content_hash("i got better "));
        assert_ne!(content_hash("I got better"), content_hash("I got worse"));
        assert_eq!(content_hash("x").len(), 64);
    }
}
