//! Tone and khin helpers for romanized (POJ) text.
//!
//! Tones are keyed as a trailing digit and displayed as a combining
//! diacritic on the syllable's main vowel. Khin (neutral tone) is keyed as a
//! leading "--" or a trailing khin key and displayed as a leading "·".

use khiin_core::unicode::{self, is_combining, HANJI_CUTOFF, KHIN_DOT, NASAL_LOWER, NASAL_UPPER};
use phf::phf_map;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tone {
    /// No tone
    #[default]
    NaT,
    T1,
    T2,
    T3,
    T4,
    T5,
    T6,
    T7,
    T8,
    T9,
    /// Khin tone
    TK,
}

impl Tone {
    /// Tone for a digit key, `NaT` for anything else.
    pub fn from_digit(ch: char) -> Tone {
        match ch {
            '1' => Tone::T1,
            '2' => Tone::T2,
            '3' => Tone::T3,
            '4' => Tone::T4,
            '5' => Tone::T5,
            '6' => Tone::T6,
            '7' => Tone::T7,
            '8' => Tone::T8,
            '9' => Tone::T9,
            _ => Tone::NaT,
        }
    }

    pub fn digit(self) -> Option<char> {
        match self {
            Tone::T1 => Some('1'),
            Tone::T2 => Some('2'),
            Tone::T3 => Some('3'),
            Tone::T4 => Some('4'),
            Tone::T5 => Some('5'),
            Tone::T6 => Some('6'),
            Tone::T7 => Some('7'),
            Tone::T8 => Some('8'),
            Tone::T9 => Some('9'),
            Tone::NaT | Tone::TK => None,
        }
    }

    /// The combining mark that displays this tone, if any.
    pub fn diacritic(self) -> Option<char> {
        match self {
            Tone::T2 => Some('\u{0301}'),
            Tone::T3 => Some('\u{0300}'),
            Tone::T5 => Some('\u{0302}'),
            Tone::T7 => Some('\u{0304}'),
            Tone::T8 => Some('\u{030d}'),
            Tone::T9 => Some('\u{0306}'),
            _ => None,
        }
    }

    pub fn needs_diacritic(self) -> bool {
        !matches!(self, Tone::NaT | Tone::T1 | Tone::T4)
    }
}

static DIACRITIC_TONES: phf::Map<char, Tone> = phf_map! {
    '\u{0301}' => Tone::T2,
    '\u{0300}' => Tone::T3,
    '\u{0302}' => Tone::T5,
    '\u{0304}' => Tone::T7,
    '\u{030d}' => Tone::T8,
    '\u{0306}' => Tone::T9,
};

const TONEABLE_LETTERS: [char; 7] = ['a', 'e', 'i', 'm', 'n', 'o', 'u'];
const TONE_PRIORITY_PAIRS: [&str; 2] = ["oa", "oe"];
const TONE_PRIORITY_LETTERS: [&str; 7] = ["o", "a", "e", "u", "i", "ng", "m"];

pub const KHIN_DOT_STR: &str = "\u{00b7}";
pub const KHIN_HYPHEN_STR: &str = "--";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorDirection {
    Left,
    Right,
}

/// True if `s` contains a letter that can carry a tone mark.
pub fn has_toneable_letter(s: &str) -> bool {
    s.chars()
        .any(|c| TONEABLE_LETTERS.contains(&c.to_ascii_lowercase()))
}

/// True if `s` contains any tone mark (U+0300..=U+030D).
pub fn has_tone_diacritic(s: &str) -> bool {
    unicode::to_nfd(s)
        .chars()
        .any(|c| ('\u{0300}'..='\u{030d}').contains(&c))
}

/// True if `s` contains no Han characters.
pub fn is_lomaji(s: &str) -> bool {
    s.chars().all(|c| c < HANJI_CUTOFF)
}

/// Byte offset after the letter that takes the tone mark.
///
/// "oa" and "oe" followed by another letter put the mark on their second
/// vowel. Otherwise the first of o, a, e, u, i, ng, m present wins.
pub fn find_tone_position(syllable: &str) -> Option<usize> {
    let lower = syllable.to_ascii_lowercase();

    for pair in TONE_PRIORITY_PAIRS {
        if let Some(i) = lower.find(pair) {
            if lower.len() > i + 2 {
                return Some(i + 2);
            }
        }
    }

    TONE_PRIORITY_LETTERS
        .iter()
        .find_map(|letter| lower.find(letter).map(|i| i + 1))
}

/// Insert the tone mark for `tone` into `syllable`. No-op for tones without
/// a mark or syllables without a toneable letter.
pub fn apply_tone_diacritic(tone: Tone, syllable: &mut String) {
    let Some(mark) = tone.diacritic() else {
        return;
    };
    if let Some(pos) = find_tone_position(syllable) {
        syllable.insert(pos, mark);
    }
}

/// Remove the tone mark from `syllable`, leaving it decomposed, and return
/// the tone it carried.
pub fn remove_tone_diacritic(syllable: &mut String) -> Tone {
    if syllable.is_empty() {
        return Tone::NaT;
    }

    let mut tone = Tone::NaT;
    let mut out = String::with_capacity(syllable.len());
    for c in unicode::to_nfd(syllable).chars() {
        match DIACRITIC_TONES.get(&c) {
            Some(&t) if tone == Tone::NaT => tone = t,
            _ => out.push(c),
        }
    }

    *syllable = out;
    tone
}

/// Strip a leading khin marker ("·" or "--"). Returns whether one was found.
pub fn remove_khin(syllable: &mut String) -> bool {
    if let Some(rest) = syllable.strip_prefix(KHIN_DOT) {
        *syllable = rest.to_string();
        return true;
    }
    if syllable.chars().count() > 1 {
        if let Some(rest) = syllable.strip_prefix(KHIN_HYPHEN_STR) {
            *syllable = rest.to_string();
            return true;
        }
    }
    false
}

/// Replace the first "·" with "--".
pub fn replace_khin_dot(s: &mut String) {
    if let Some(pos) = s.find(KHIN_DOT) {
        s.replace_range(pos..pos + KHIN_DOT.len_utf8(), KHIN_HYPHEN_STR);
    }
}

/// Move a codepoint caret one stop in `dir`, stepping over combining marks
/// so that a letter and its diacritics form one stop.
pub fn move_caret(s: &str, start: usize, dir: CursorDirection) -> usize {
    let chars: Vec<char> = s.chars().collect();
    let size = chars.len();
    if start > size {
        return size;
    }

    match dir {
        CursorDirection::Left => {
            let mut pos = start;
            while pos > 0 {
                pos -= 1;
                if !is_combining(chars[pos]) {
                    break;
                }
            }
            pos
        }
        CursorDirection::Right => {
            if start == size {
                return start;
            }
            let mut pos = start + 1;
            while pos < size && is_combining(chars[pos]) {
                pos += 1;
            }
            pos
        }
    }
}

/// Copy the letter casing of `pattern` (what the user typed) onto
/// `output` (a dictionary romanization), ignoring diacritics, spaces and
/// hyphens. An uppercase nasal key turns "ⁿ" into "ᴺ".
pub fn match_capitalization(pattern: &str, output: &str) -> String {
    if pattern.is_empty() || output.is_empty() {
        return output.to_string();
    }

    let p: Vec<char> = unicode::to_nfd(pattern).chars().collect();
    let o: Vec<char> = unicode::to_nfd(output).chars().collect();
    let (mut pi, mut oi) = (0, 0);
    let mut ret = String::with_capacity(output.len());

    while pi < p.len() && oi < o.len() {
        while pi < p.len() && !p[pi].is_ascii_alphabetic() {
            pi += 1;
        }
        while oi < o.len() && o[oi] != NASAL_LOWER && !o[oi].is_ascii_alphabetic() {
            ret.push(o[oi]);
            oi += 1;
        }
        if pi == p.len() || oi == o.len() {
            break;
        }

        if o[oi].is_ascii_alphabetic() {
            if p[pi].eq_ignore_ascii_case(&o[oi]) {
                ret.push(p[pi]);
                pi += 1;
                oi += 1;
                continue;
            }
            break;
        }

        // o[oi] is the nasal mark
        if p[pi].is_ascii_uppercase() {
            ret.push(NASAL_UPPER);
            let key = p[pi].to_ascii_lowercase();
            pi += 1;
            oi += 1;
            if pi < p.len() && p[pi].to_ascii_lowercase() == key {
                pi += 1;
            }
            continue;
        }

        ret.push(o[oi]);
        pi += 1;
        oi += 1;
    }

    ret.extend(&o[oi..]);
    unicode::to_nfc(&ret)
}
