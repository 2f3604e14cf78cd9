//! Codepoint classification and codepoint-indexed string helpers.
//!
//! Every caret in the engine counts Unicode scalar values, never bytes, so
//! the helpers here convert between the two.

use unicode_normalization::UnicodeNormalization;

pub const HANJI_CUTOFF: char = '\u{2e80}';
pub const NASAL_LOWER: char = '\u{207f}';
pub const NASAL_UPPER: char = '\u{1d3a}';
pub const DOT_ABOVE_RIGHT: char = '\u{0358}';
pub const DOTS_BELOW: char = '\u{0324}';
pub const KHIN_DOT: char = '\u{00b7}';

const LOW_COMBINING: char = '\u{0300}';
const HIGH_COMBINING: char = '\u{030d}';

/// Display category of a glyph, used to decide where a virtual space
/// must separate two adjacent pieces of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphCategory {
    Other,
    Alnum,
    AsciiPunct,
    Khin,
    Hanji,
}

pub fn is_hanji(c: char) -> bool {
    c >= HANJI_CUTOFF
}

pub fn is_nasal(c: char) -> bool {
    c == NASAL_LOWER || c == NASAL_UPPER
}

/// Combining marks that never get a caret stop of their own.
pub fn is_combining(c: char) -> bool {
    (LOW_COMBINING..=DOT_ABOVE_RIGHT).contains(&c)
}

pub fn glyph_category(c: char) -> GlyphCategory {
    if c.is_ascii_alphanumeric() || is_nasal(c) {
        GlyphCategory::Alnum
    } else if c.is_ascii_punctuation() {
        GlyphCategory::AsciiPunct
    } else if c == KHIN_DOT {
        GlyphCategory::Khin
    } else if is_hanji(c) {
        GlyphCategory::Hanji
    } else {
        GlyphCategory::Other
    }
}

pub fn to_nfd(s: &str) -> String {
    s.nfd().collect()
}

pub fn to_nfc(s: &str) -> String {
    s.nfc().collect()
}

/// Remove tone marks (U+0300..=U+030D). With `strip_letter_diacritics`,
/// also remove the dots below and dot above right.
pub fn strip_diacritics(s: &str, strip_letter_diacritics: bool) -> String {
    let upper = if strip_letter_diacritics {
        DOT_ABOVE_RIGHT
    } else {
        HIGH_COMBINING
    };
    s.nfd()
        .filter(|c| !(LOW_COMBINING..=upper).contains(c))
        .collect()
}

pub fn start_glyph_type(s: &str) -> GlyphCategory {
    s.nfd()
        .next()
        .map(glyph_category)
        .unwrap_or(GlyphCategory::Other)
}

pub fn end_glyph_type(s: &str) -> GlyphCategory {
    strip_diacritics(s, true)
        .chars()
        .last()
        .map(glyph_category)
        .unwrap_or(GlyphCategory::Other)
}

/// Whether two adjacent runs of text need a separating space on display.
pub fn needs_virtual_space(lhs: &str, rhs: &str) -> bool {
    use GlyphCategory::*;
    matches!(
        (end_glyph_type(lhs), start_glyph_type(rhs)),
        (Alnum, Alnum) | (Alnum, Hanji) | (Hanji, Alnum) | (Alnum, Khin) | (Hanji, Khin)
    )
}

pub fn contains_hanji(s: &str) -> bool {
    s.chars().any(is_hanji)
}

/// True when no ASCII letter in `s` is uppercase.
pub fn all_lower(s: &str) -> bool {
    !s.nfd().any(|c| c.is_ascii_uppercase())
}

/// Number of codepoints in `s`.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte offset of the codepoint at `index`, clamped to the end of `s`.
pub fn byte_offset(s: &str, index: usize) -> usize {
    s.char_indices()
        .nth(index)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// The first `n` codepoints of `s`.
pub fn prefix(s: &str, n: usize) -> &str {
    &s[..byte_offset(s, n)]
}

/// Everything after the first `n` codepoints of `s`.
pub fn suffix(s: &str, n: usize) -> &str {
    &s[byte_offset(s, n)..]
}

/// Codepoints `[from, to)` of `s`.
pub fn slice(s: &str, from: usize, to: usize) -> &str {
    let start = byte_offset(s, from);
    let end = byte_offset(s, to.max(from));
    &s[start..end]
}

/// Erase `count` codepoints starting at `index`. No-op when out of range.
pub fn safe_erase(s: &mut String, index: usize, count: usize) {
    if index >= char_len(s) {
        return;
    }
    let from = byte_offset(s, index);
    let to = byte_offset(s, index + count);
    s.replace_range(from..to, "");
}

/// Insert `ch` before the codepoint at `index` (or at the end).
pub fn insert_char(s: &mut String, index: usize, ch: char) {
    let at = byte_offset(s, index);
    s.insert(at, ch);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glyph_categories() {
        assert_eq!(glyph_category('a'), GlyphCategory::Alnum);
        assert_eq!(glyph_category('7'), GlyphCategory::Alnum);
        assert_eq!(glyph_category(NASAL_LOWER), GlyphCategory::Alnum);
        assert_eq!(glyph_category('.'), GlyphCategory::AsciiPunct);
        assert_eq!(glyph_category(KHIN_DOT), GlyphCategory::Khin);
        assert_eq!(glyph_category('好'), GlyphCategory::Hanji);
        assert_eq!(glyph_category(' '), GlyphCategory::Other);
    }

    #[test]
    fn test_start_and_end_glyphs() {
        assert_eq!(start_glyph_type("á"), GlyphCategory::Alnum);
        assert_eq!(end_glyph_type("o\u{0358}"), GlyphCategory::Alnum);
        assert_eq!(end_glyph_type("好"), GlyphCategory::Hanji);
        assert_eq!(start_glyph_type(""), GlyphCategory::Other);
    }

    #[test]
    fn test_needs_virtual_space() {
        assert!(needs_virtual_space("tāi", "chi"));
        assert!(needs_virtual_space("好", "bo"));
        assert!(needs_virtual_space("bo", "好"));
        assert!(needs_virtual_space("a", "·a"));
        assert!(!needs_virtual_space("好", "無"));
        assert!(!needs_virtual_space("a", "."));
    }

    #[test]
    fn test_strip_diacritics() {
        assert_eq!(strip_diacritics("ó\u{0358}", false), "o\u{0358}");
        assert_eq!(strip_diacritics("ó\u{0358}", true), "o");
    }

    #[test]
    fn test_codepoint_helpers() {
        let mut s = String::from("a\u{030d}h");
        assert_eq!(char_len(&s), 3);
        assert_eq!(prefix(&s, 2), "a\u{030d}");
        assert_eq!(suffix(&s, 2), "h");
        assert_eq!(slice("好無bo", 1, 3), "無b");
        safe_erase(&mut s, 1, 1);
        assert_eq!(s, "ah");
        safe_erase(&mut s, 5, 1);
        assert_eq!(s, "ah");
        insert_char(&mut s, 1, 'x');
        assert_eq!(s, "axh");
    }

    #[test]
    fn test_all_lower() {
        assert!(all_lower("góa"));
        assert!(!all_lower("Góa"));
    }
}
