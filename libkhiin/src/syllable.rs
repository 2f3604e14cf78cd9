//! A single POJ syllable, held in both raw (typed) and composed (displayed)
//! form.
//!
//! Either form can be set and the other is derived from it:
//!
//! - raw "ho2" composes to "hó"
//! - raw "--a" composes to "·a" (or "--a" without the khin dot)
//! - composed "tāi" rebuilds the raw input "tai7"
//!
//! Carets on both sides count codepoints. Every operation that depends on the
//! keyboard layout takes the `KeyConfig` explicitly.

use khiin_core::unicode::{char_len, prefix, slice, to_nfc};

use crate::keyconfig::KeyConfig;
use crate::lomaji::{
    apply_tone_diacritic, find_tone_position, has_tone_diacritic, has_toneable_letter,
    move_caret, remove_khin, remove_tone_diacritic, replace_khin_dot, CursorDirection, Tone,
    KHIN_DOT_STR, KHIN_HYPHEN_STR,
};

/// Where the khin marker was typed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KhinKeyPosition {
    #[default]
    None,
    /// Leading double hyphen, "--a"
    Start,
    /// Trailing khin key, "a0"
    End,
    /// Displayed but never typed; carried over by autokhin
    Virtual,
}

#[derive(Debug, Clone, Default)]
pub struct Syllable {
    raw_input: String,
    raw_body: String,
    tone: Tone,
    tone_key: Option<char>,
    khin_pos: KhinKeyPosition,
    khin_key: Option<char>,
    composed: String,
    dotted_khin: bool,
}

impl PartialEq for Syllable {
    fn eq(&self, other: &Self) -> bool {
        self.raw_body == other.raw_body
            && self.tone == other.tone
            && self.khin_pos == other.khin_pos
    }
}

impl Eq for Syllable {}

impl Syllable {
    /// An empty syllable. `dotted_khin` selects "·" or "--" as the displayed
    /// khin marker.
    pub fn new(dotted_khin: bool) -> Self {
        Self {
            dotted_khin,
            ..Self::default()
        }
    }

    pub fn from_raw(kc: &KeyConfig, dotted_khin: bool, input: &str) -> Self {
        let mut syl = Self::new(dotted_khin);
        syl.set_raw_input(kc, input);
        syl
    }

    pub fn from_composed(kc: &KeyConfig, dotted_khin: bool, input: &str) -> Self {
        let mut syl = Self::new(dotted_khin);
        syl.set_composed(kc, input);
        syl
    }

    /// Replace the syllable with the parse of `input`.
    pub fn set_raw_input(&mut self, kc: &KeyConfig, input: &str) {
        self.clear();
        self.raw_input = input.to_string();
        self.raw_body = input.to_string();
        self.extract_raw_khin(kc);
        self.extract_raw_tone(kc);
        self.build_composed(kc);
    }

    /// Replace the syllable with composed text and rebuild the raw input.
    pub fn set_composed(&mut self, kc: &KeyConfig, input: &str) {
        self.clear();
        self.composed = input.to_string();
        self.build_raw(kc);
    }

    pub fn raw_input(&self) -> &str {
        &self.raw_input
    }

    pub fn raw_body(&self) -> &str {
        &self.raw_body
    }

    pub fn composed(&self) -> &str {
        &self.composed
    }

    pub fn tone(&self) -> Tone {
        self.tone
    }

    pub fn tone_key(&self) -> Option<char> {
        self.tone_key
    }

    pub fn khin_pos(&self) -> KhinKeyPosition {
        self.khin_pos
    }

    pub fn khin_key(&self) -> Option<char> {
        self.khin_key
    }

    pub fn raw_size(&self) -> usize {
        char_len(&self.raw_input)
    }

    pub fn composed_size(&self) -> usize {
        char_len(&self.composed)
    }

    pub fn is_empty(&self) -> bool {
        self.raw_input.is_empty()
            && self.raw_body.is_empty()
            && self.composed.is_empty()
            && self.tone == Tone::NaT
            && self.tone_key.is_none()
            && self.khin_pos == KhinKeyPosition::None
            && self.khin_key.is_none()
    }

    pub fn clear(&mut self) {
        *self = Self::new(self.dotted_khin);
    }

    fn khin_str(&self) -> &'static str {
        if self.dotted_khin {
            KHIN_DOT_STR
        } else {
            KHIN_HYPHEN_STR
        }
    }

    fn extract_raw_khin(&mut self, kc: &KeyConfig) {
        let chars: Vec<char> = self.raw_body.chars().collect();
        if chars.len() < 2 {
            return;
        }

        if kc.is_hyphen(chars[0]) && chars[1] == chars[0] {
            self.raw_body = chars[2..].iter().collect();
            self.khin_pos = KhinKeyPosition::Start;
            self.khin_key = Some(chars[0]);
            return;
        }

        let last = chars[chars.len() - 1];
        if kc.khin_keys().contains(&last) {
            self.raw_body.pop();
            self.khin_pos = KhinKeyPosition::End;
            self.khin_key = Some(last);
        }
    }

    fn extract_raw_tone(&mut self, kc: &KeyConfig) {
        if !has_toneable_letter(&self.raw_body) {
            return;
        }
        let Some(last) = self.raw_body.chars().last() else {
            return;
        };

        let tone = kc.check_tone_key(last);
        if tone != Tone::NaT {
            self.tone = tone;
            self.tone_key = Some(last);
            self.raw_body.pop();
        }
    }

    fn build_composed(&mut self, kc: &KeyConfig) {
        let mut composed = kc.convert(&self.raw_body);
        apply_tone_diacritic(self.tone, &mut composed);
        if self.khin_pos != KhinKeyPosition::None {
            composed.insert_str(0, self.khin_str());
        }
        self.composed = to_nfc(&composed);
    }

    fn build_raw(&mut self, kc: &KeyConfig) {
        if self.composed == "-" {
            self.clear();
            self.composed = "-".to_string();
            self.raw_input = "-".to_string();
            return;
        }

        let mut body = self.composed.clone();

        self.tone = remove_tone_diacritic(&mut body);
        if self.tone == Tone::NaT {
            self.tone_key = None;
        } else if self.tone_key.map(|k| kc.check_tone_key(k)) != Some(self.tone) {
            self.tone_key = kc.tone_key(self.tone);
        }

        if remove_khin(&mut body) {
            self.ensure_khin_key(kc);
        } else {
            self.khin_pos = KhinKeyPosition::None;
            self.khin_key = None;
        }

        self.raw_body = kc.deconvert(&body);

        let mut raw = self.raw_body.clone();
        raw.extend(self.tone_key);
        match (self.khin_pos, self.khin_key) {
            (KhinKeyPosition::Start, Some(key)) => {
                raw.insert(0, key);
                raw.insert(0, key);
            }
            (KhinKeyPosition::End, Some(key)) => raw.push(key),
            _ => {}
        }
        self.raw_input = raw;
    }

    fn ensure_khin_key(&mut self, kc: &KeyConfig) {
        if self.khin_key.is_none() {
            match self.khin_pos {
                KhinKeyPosition::None => {
                    self.khin_key = Some('-');
                    self.khin_pos = KhinKeyPosition::Start;
                }
                KhinKeyPosition::Start => self.khin_key = Some('-'),
                KhinKeyPosition::End => self.khin_key = kc.khin_keys().first().copied(),
                KhinKeyPosition::Virtual => {}
            }
        }

        if self.khin_pos == KhinKeyPosition::None {
            if let Some(key) = self.khin_key {
                self.khin_pos = if kc.is_hyphen(key) {
                    KhinKeyPosition::Start
                } else {
                    KhinKeyPosition::End
                };
            }
        }
    }

    /// Map a caret in the raw input to the composed text. `None` when the
    /// caret is past the end.
    pub fn raw_to_composed_caret(&self, kc: &KeyConfig, raw_caret: usize) -> Option<usize> {
        let raw_size = self.raw_size();
        if raw_caret == 0 {
            return Some(0);
        }
        if raw_caret == raw_size {
            return Some(self.composed_size());
        }
        if raw_caret > raw_size {
            return None;
        }

        let mut lhs = prefix(&self.raw_input, raw_caret).to_string();
        if let (Some(pos), Some(key)) = (find_tone_position(&self.raw_input), self.tone_key) {
            if pos <= lhs.len() {
                lhs.push(key);
            }
        }

        let mut partial = Syllable::from_raw(kc, self.dotted_khin, &lhs);
        if self.khin_pos == KhinKeyPosition::Virtual {
            partial.set_khin(KhinKeyPosition::Virtual, None);
        }
        Some(partial.composed_size())
    }

    /// Map a caret in the composed text to the raw input. `None` when the
    /// caret is past the end.
    pub fn composed_to_raw_caret(&self, kc: &KeyConfig, caret: usize) -> Option<usize> {
        let size = self.composed_size();
        if caret == size {
            return Some(self.raw_size());
        }
        if caret > size {
            return None;
        }

        let mut lhs = prefix(&self.composed, caret).to_string();
        remove_tone_diacritic(&mut lhs);
        let mut lhs = kc.deconvert(&lhs);

        match self.khin_pos {
            KhinKeyPosition::Virtual | KhinKeyPosition::End => {
                remove_khin(&mut lhs);
            }
            KhinKeyPosition::Start => replace_khin_dot(&mut lhs),
            KhinKeyPosition::None => {}
        }

        Some(char_len(&lhs))
    }

    /// Erase the glyph (letter plus its marks) at composed caret `index`.
    pub fn erase(&mut self, kc: &KeyConfig, index: usize) {
        if index >= self.composed_size() {
            return;
        }

        let to = move_caret(&self.composed, index, CursorDirection::Right);
        if has_tone_diacritic(slice(&self.composed, index, to)) {
            self.tone = Tone::NaT;
            self.tone_key = None;
        }

        let mut composed: String = self.composed.chars().take(index).collect();
        composed.extend(self.composed.chars().skip(to));

        if composed.is_empty() {
            self.clear();
        } else {
            self.composed = composed;
            self.build_raw(kc);
        }
    }

    /// Add or remove the khin marker.
    ///
    /// `Start` and `End` insert `key` into the raw input; `Virtual` only
    /// changes the display. Fails on an empty syllable, or when a typed
    /// marker would be replaced by a different one.
    pub fn set_khin(&mut self, pos: KhinKeyPosition, key: Option<char>) -> bool {
        use KhinKeyPosition as K;

        if self.is_empty() {
            return false;
        }

        let typed = matches!(self.khin_pos, K::Start | K::End);
        if typed && pos != K::None && pos != self.khin_pos {
            return false;
        }

        let khin = self.khin_str();
        match (self.khin_pos, pos) {
            (K::None, K::None) => {}
            (K::None, _) => {
                if let (K::Start, Some(k)) = (pos, key) {
                    self.raw_input.insert(0, k);
                    self.raw_input.insert(0, k);
                } else if let (K::End, Some(k)) = (pos, key) {
                    self.raw_input.push(k);
                }
                self.composed.insert_str(0, khin);
            }
            (_, K::None) => {
                if let Some(rest) = self.composed.strip_prefix(khin) {
                    self.composed = rest.to_string();
                    match self.khin_pos {
                        K::Start => {
                            self.raw_input = self.raw_input.chars().skip(2).collect();
                        }
                        K::End => {
                            self.raw_input.pop();
                        }
                        _ => {}
                    }
                }
            }
            (K::Virtual, K::Start) => {
                if let Some(k) = key {
                    self.raw_input.insert(0, k);
                    self.raw_input.insert(0, k);
                }
            }
            _ => {}
        }

        self.khin_pos = pos;
        if key.is_some() || pos == K::None || pos == K::Virtual {
            self.khin_key = key;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn raw(input: &str) -> Syllable {
        Syllable::from_raw(&KeyConfig::new(), true, input)
    }

    fn composed(input: &str) -> Syllable {
        Syllable::from_composed(&KeyConfig::new(), true, input)
    }

    #[test]
    fn test_raw_input_with_tone() {
        let syl = raw("ho2");
        assert_eq!(syl.composed(), "hó");
        assert_eq!(syl.raw_body(), "ho");
        assert_eq!(syl.tone(), Tone::T2);
        assert_eq!(syl.tone_key(), Some('2'));

        assert_eq!(raw("ta1").composed(), "ta");
        assert_eq!(raw("chiah8").composed(), "chia\u{030d}h");
        assert_eq!(raw("sou2").composed(), "só\u{0358}");
    }

    #[test]
    fn test_raw_input_without_toneable_letter_keeps_digit() {
        let syl = raw("k2");
        assert_eq!(syl.composed(), "k2");
        assert_eq!(syl.tone(), Tone::NaT);
    }

    #[test]
    fn test_raw_input_with_khin() {
        let syl = raw("--a");
        assert_eq!(syl.composed(), "·a");
        assert_eq!(syl.khin_pos(), KhinKeyPosition::Start);
        assert_eq!(syl.raw_input(), "--a");

        let syl = raw("a0");
        assert_eq!(syl.composed(), "·a");
        assert_eq!(syl.khin_pos(), KhinKeyPosition::End);

        let syl = Syllable::from_raw(&KeyConfig::new(), false, "--a");
        assert_eq!(syl.composed(), "--a");

        let syl = raw("--");
        assert_eq!(syl.composed(), "·");
        assert_eq!(syl.raw_size(), 2);
    }

    #[test]
    fn test_composed_rebuilds_raw() {
        assert_eq!(composed("tāi").raw_input(), "tai7");
        assert_eq!(composed("hó").raw_input(), "ho2");
        assert_eq!(composed("sa\u{207f}").raw_input(), "sann");
        assert_eq!(composed("·a").raw_input(), "--a");
        assert_eq!(composed("-").raw_input(), "-");

        let syl = composed("ô\u{0358}");
        assert_eq!(syl.raw_input(), "ou5");
        assert_eq!(syl.tone(), Tone::T5);
    }

    #[test]
    fn test_equality_ignores_keys() {
        assert_eq!(raw("ho2"), composed("hó"));
        assert_ne!(raw("ho2"), raw("ho3"));
    }

    #[test]
    fn test_raw_to_composed_caret() {
        let kc = KeyConfig::new();
        let syl = raw("tai7");
        assert_eq!(syl.raw_to_composed_caret(&kc, 0), Some(0));
        assert_eq!(syl.raw_to_composed_caret(&kc, 1), Some(1));
        assert_eq!(syl.raw_to_composed_caret(&kc, 2), Some(2));
        assert_eq!(syl.raw_to_composed_caret(&kc, 3), Some(3));
        assert_eq!(syl.raw_to_composed_caret(&kc, 4), Some(3));
        assert_eq!(syl.raw_to_composed_caret(&kc, 5), None);

        let syl = raw("sann");
        assert_eq!(syl.raw_to_composed_caret(&kc, 4), Some(3));
    }

    #[test]
    fn test_composed_to_raw_caret() {
        let kc = KeyConfig::new();
        let syl = raw("tai7");
        assert_eq!(syl.composed_to_raw_caret(&kc, 0), Some(0));
        assert_eq!(syl.composed_to_raw_caret(&kc, 2), Some(2));
        assert_eq!(syl.composed_to_raw_caret(&kc, 3), Some(4));
        assert_eq!(syl.composed_to_raw_caret(&kc, 4), None);

        let syl = raw("--a");
        assert_eq!(syl.composed_to_raw_caret(&kc, 1), Some(2));
    }

    #[test]
    fn test_erase_glyph_with_tone() {
        let kc = KeyConfig::new();
        let mut syl = raw("ho2");
        syl.erase(&kc, 1);
        assert_eq!(syl.composed(), "h");
        assert_eq!(syl.raw_input(), "h");
        assert_eq!(syl.tone(), Tone::NaT);

        syl.erase(&kc, 0);
        assert!(syl.is_empty());
    }

    #[test]
    fn test_erase_keeps_khin() {
        let kc = KeyConfig::new();
        let mut syl = raw("--a");
        syl.erase(&kc, 1);
        assert_eq!(syl.composed(), "·");
        assert_eq!(syl.raw_input(), "--");

        syl.erase(&kc, 0);
        assert!(syl.is_empty());
    }

    #[test]
    fn test_set_khin() {
        let mut syl = raw("a");
        assert!(syl.set_khin(KhinKeyPosition::Start, Some('-')));
        assert_eq!(syl.raw_input(), "--a");
        assert_eq!(syl.composed(), "·a");

        assert!(syl.set_khin(KhinKeyPosition::None, None));
        assert_eq!(syl.raw_input(), "a");
        assert_eq!(syl.composed(), "a");

        assert!(syl.set_khin(KhinKeyPosition::Virtual, None));
        assert_eq!(syl.raw_input(), "a");
        assert_eq!(syl.composed(), "·a");

        let mut typed = raw("a0");
        assert!(!typed.set_khin(KhinKeyPosition::Start, Some('-')));

        assert!(!Syllable::new(true).set_khin(KhinKeyPosition::Virtual, None));
    }

    proptest! {
        #[test]
        fn test_composed_form_is_stable(input in "[bcghklmnpst]{0,2}[aeiou]{1,2}(nn|ng|h)?[1-9]?") {
            let kc = KeyConfig::new();
            let first = Syllable::from_raw(&kc, true, &input);
            let second = Syllable::from_composed(&kc, true, first.composed());
            prop_assert_eq!(second.composed(), first.composed());
        }
    }
}
