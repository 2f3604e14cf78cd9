//! Splitting raw input into typed segments.
//!
//! The segmenter looks at the lowercased raw input and marks out runs of
//! hyphens, punctuation, dictionary words, word or syllable prefixes and
//! user dictionary items. Anything unrecognized is gathered into plain text
//! segments. Offsets and sizes count codepoints of the raw input.

use std::collections::BTreeSet;

use khiin_core::unicode::{start_glyph_type, GlyphCategory};

use crate::dictionary::Dictionary;
use crate::keyconfig::KeyConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentType {
    /// Plain text
    None,
    /// Fully covered by dictionary words
    Splittable,
    /// The start of a dictionary word
    WordPrefix,
    /// The start of a syllable
    SyllablePrefix,
    Hyphens,
    Punct,
    UserItem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentOffset {
    pub kind: SegmentType,
    pub start: usize,
    pub size: usize,
}

impl SegmentOffset {
    fn new(kind: SegmentType, start: usize, size: usize) -> Self {
        Self { kind, start, size }
    }
}

struct Segmenter<'a> {
    dictionary: &'a Dictionary,
    keyconfig: &'a KeyConfig,
}

impl Segmenter<'_> {
    fn hyphens(&self, chars: &[char]) -> usize {
        chars
            .iter()
            .take_while(|&&c| self.keyconfig.is_hyphen(c))
            .count()
    }

    fn ascii_punctuation(&self, s: &str) -> usize {
        usize::from(start_glyph_type(s) == GlyphCategory::AsciiPunct)
    }

    fn splittable(&self, s: &str) -> bool {
        self.dictionary.word_splitter().can_split(s)
    }

    fn word_prefix(&self, s: &str) -> bool {
        self.dictionary.is_word_prefix(s)
    }

    fn syllable_prefix(&self, s: &str) -> bool {
        self.dictionary.is_syllable_prefix(self.keyconfig, s)
    }

    fn user_item_exact(&self, s: &str) -> bool {
        self.dictionary
            .user_dictionary()
            .is_some_and(|u| u.has_exact(s))
    }

    fn user_item_prefix(&self, s: &str) -> usize {
        self.dictionary
            .user_dictionary()
            .map_or(0, |u| u.starts_with_word(s))
    }

    /// Size of the longest splittable head whose tail is a word prefix.
    fn splittable_with_trailing_prefix(&self, chars: &[char]) -> usize {
        for split in (1..=chars.len()).rev() {
            let lhs: String = chars[..split].iter().collect();
            let rhs: String = chars[split..].iter().collect();
            if self.splittable(&lhs) && self.word_prefix(&rhs) {
                return split;
            }
        }
        0
    }

    /// Length of the longest head of `chars` that is still a syllable or a
    /// syllable prefix.
    fn max_syllable(&self, chars: &[char]) -> usize {
        let s: String = chars.iter().collect();
        if !self.dictionary.starts_with_syllable(&s) {
            return 0;
        }

        let mut size = 0;
        let mut head = String::new();
        for &c in chars {
            head.push(c);
            if !self.syllable_prefix(&head) {
                break;
            }
            size += 1;
        }
        size
    }

    /// Positions a word may not end at: right before a tone key.
    fn invalid_split_indices(&self, chars: &[char]) -> BTreeSet<usize> {
        (0..chars.len().saturating_sub(1))
            .filter(|&i| self.keyconfig.is_tone_key(chars[i + 1]))
            .collect()
    }

    fn max_split_size(&self, chars: &[char]) -> usize {
        let s: String = chars.iter().collect();
        let invalid = self.invalid_split_indices(chars);
        self.dictionary.word_splitter().max_split_size(&s, &invalid)
    }

    fn syllable_or_splittable(&self, chars: &[char]) -> (usize, SegmentType) {
        let max_syl = self.max_syllable(chars);
        let max_split = self.max_split_size(chars);

        if max_syl > max_split {
            (max_syl, SegmentType::SyllablePrefix)
        } else if max_split > 0 {
            (max_split, SegmentType::Splittable)
        } else {
            (0, SegmentType::None)
        }
    }

    fn segment_text(&self, chars: &[char]) -> Vec<SegmentOffset> {
        let mut ret = Vec::new();
        let mut plaintext: Option<(usize, usize)> = None;
        let mut index = 0;

        let flush = |ret: &mut Vec<SegmentOffset>, plaintext: &mut Option<(usize, usize)>| {
            if let Some((start, size)) = plaintext.take() {
                ret.push(SegmentOffset::new(SegmentType::None, start, size));
            }
        };

        while index < chars.len() {
            let rest = &chars[index..];
            let remainder: String = rest.iter().collect();
            let size = rest.len();

            let hyphens = self.hyphens(rest);
            if hyphens > 0 {
                flush(&mut ret, &mut plaintext);
                ret.push(SegmentOffset::new(SegmentType::Hyphens, index, hyphens));
                index += hyphens;
                continue;
            }

            let punct = self.ascii_punctuation(&remainder);
            if punct > 0 {
                flush(&mut ret, &mut plaintext);
                ret.push(SegmentOffset::new(SegmentType::Punct, index, punct));
                index += punct;
                continue;
            }

            let whole = if self.splittable(&remainder) {
                Some(SegmentType::Splittable)
            } else if self.user_item_exact(&remainder) {
                Some(SegmentType::UserItem)
            } else if self.word_prefix(&remainder) {
                Some(SegmentType::WordPrefix)
            } else if self.syllable_prefix(&remainder) {
                Some(SegmentType::SyllablePrefix)
            } else {
                None
            };
            if let Some(kind) = whole {
                flush(&mut ret, &mut plaintext);
                ret.push(SegmentOffset::new(kind, index, size));
                break;
            }

            let split = self.splittable_with_trailing_prefix(rest);
            if split > 0 {
                flush(&mut ret, &mut plaintext);
                ret.push(SegmentOffset::new(SegmentType::Splittable, index, split));
                ret.push(SegmentOffset::new(
                    SegmentType::WordPrefix,
                    index + split,
                    size - split,
                ));
                break;
            }

            let (found, kind) = self.syllable_or_splittable(rest);
            if found > 0 {
                flush(&mut ret, &mut plaintext);
                ret.push(SegmentOffset::new(kind, index, found));
                index += found;
                continue;
            }

            let user = self.user_item_prefix(&remainder);
            if user > 0 {
                flush(&mut ret, &mut plaintext);
                ret.push(SegmentOffset::new(SegmentType::UserItem, index, user));
                index += user;
                continue;
            }

            match &mut plaintext {
                Some((_, size)) => *size += 1,
                None => plaintext = Some((index, 1)),
            }
            index += 1;
        }

        flush(&mut ret, &mut plaintext);
        ret
    }

    fn longest_segment_from_start(&self, chars: &[char]) -> SegmentOffset {
        let s: String = chars.iter().collect();
        let all = chars.len();

        let hyphens = self.hyphens(chars);
        if hyphens > 0 {
            return SegmentOffset::new(SegmentType::Hyphens, 0, hyphens);
        }

        let punct = self.ascii_punctuation(&s);
        if punct > 0 {
            return SegmentOffset::new(SegmentType::Punct, 0, punct);
        }

        let split = self.max_split_size(chars);
        if split > 0 {
            return SegmentOffset::new(SegmentType::Splittable, 0, split);
        }

        let user = self.user_item_prefix(&s);
        if user > 0 {
            return SegmentOffset::new(SegmentType::UserItem, 0, user);
        }

        if self.word_prefix(&s) {
            return SegmentOffset::new(SegmentType::WordPrefix, 0, all);
        }

        if self.syllable_prefix(&s) {
            return SegmentOffset::new(SegmentType::SyllablePrefix, 0, all);
        }

        SegmentOffset::new(SegmentType::None, 0, all)
    }
}

/// Segment the whole of `raw`.
pub fn segment_text(dictionary: &Dictionary, keyconfig: &KeyConfig, raw: &str) -> Vec<SegmentOffset> {
    let chars: Vec<char> = raw.to_lowercase().chars().collect();
    Segmenter {
        dictionary,
        keyconfig,
    }
    .segment_text(&chars)
}

/// The single longest segment at the start of `raw`.
pub fn longest_segment_from_start(
    dictionary: &Dictionary,
    keyconfig: &KeyConfig,
    raw: &str,
) -> SegmentOffset {
    let chars: Vec<char> = raw.to_lowercase().chars().collect();
    Segmenter {
        dictionary,
        keyconfig,
    }
    .longest_segment_from_start(&chars)
}
