//! Syllable parsing and dictionary key generation.
//!
//! `SyllableParser` turns raw keystrokes or composed POJ into `Syllable`s,
//! expands dictionary words into the key sequences a user may type for them,
//! and aligns raw input against a dictionary word's syllables.

use khiin_core::unicode::to_nfd;

use crate::keyconfig::KeyConfig;
use crate::lomaji::{remove_tone_diacritic, Tone, KHIN_DOT_STR};
use crate::syllable::Syllable;
use crate::tai_text::TaiText;

const SYLLABLE_SEPARATORS: [char; 2] = [' ', '-'];

/// One way of typing a dictionary word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSequence {
    pub input: String,
    /// A toneless single syllable: matches only as a fuzzy fallback
    pub fuzzy: bool,
}

impl InputSequence {
    fn new(input: String, fuzzy: bool) -> Self {
        Self { input, fuzzy }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SyllableParser<'a> {
    keyconfig: &'a KeyConfig,
    dotted_khin: bool,
}

impl<'a> SyllableParser<'a> {
    pub fn new(keyconfig: &'a KeyConfig, dotted_khin: bool) -> Self {
        Self {
            keyconfig,
            dotted_khin,
        }
    }

    pub fn keyconfig(&self) -> &'a KeyConfig {
        self.keyconfig
    }

    pub fn dotted_khin(&self) -> bool {
        self.dotted_khin
    }

    pub fn parse_raw(&self, input: &str) -> Syllable {
        Syllable::from_raw(self.keyconfig, self.dotted_khin, input)
    }

    pub fn parse_composed(&self, input: &str) -> Syllable {
        Syllable::from_composed(self.keyconfig, self.dotted_khin, input)
    }

    /// Keys for one composed syllable, and whether it carried a tone mark.
    ///
    /// A toneless syllable yields itself and its explicit tone 1 or 4 form
    /// ("ho" gives "ho", "ho1"). A toned syllable yields its digit form and,
    /// with telex on, its telex form ("hó" gives "ho2", "hos").
    pub fn to_fuzzy(&self, composed: &str) -> (Vec<String>, bool) {
        let mut syl = to_nfd(composed);
        let tone = remove_tone_diacritic(&mut syl);
        let syl = self.keyconfig.deconvert(&syl).to_lowercase();

        if tone == Tone::NaT {
            let explicit = if syl.ends_with(['p', 't', 'k', 'h']) {
                '4'
            } else {
                '1'
            };
            let with_tone = format!("{syl}{explicit}");
            return (vec![syl, with_tone], false);
        }

        let mut keys = Vec::with_capacity(2);
        if let Some(digit) = self.keyconfig.tone_key(tone) {
            keys.push(format!("{syl}{digit}"));
        }
        if let Some(telex) = self.keyconfig.telex_key(tone) {
            keys.push(format!("{syl}{telex}"));
        }
        (keys, true)
    }

    /// Every key sequence that should find `word` in the dictionary.
    ///
    /// Khin dots are dropped and syllable separators are not typed. For a
    /// multi-syllable word each syllable may be typed with or without its
    /// tone, and all combinations are produced.
    pub fn as_input_sequences(&self, word: &str) -> Vec<InputSequence> {
        let word = word.replace(KHIN_DOT_STR, "");

        if !word.contains(SYLLABLE_SEPARATORS) {
            let (keys, has_tone) = self.to_fuzzy(&word);
            let toneless = keys.first().filter(|_| has_tone).map(|key| {
                let mut key = key.clone();
                key.pop();
                key
            });

            let mut ret: Vec<InputSequence> = keys
                .into_iter()
                .map(|key| InputSequence::new(key, false))
                .collect();
            ret.extend(toneless.map(|key| InputSequence::new(key, true)));
            return ret;
        }

        let chunks: Vec<Vec<String>> = word
            .split(SYLLABLE_SEPARATORS)
            .filter(|s| !s.is_empty())
            .map(|syl| {
                let (mut keys, has_tone) = self.to_fuzzy(syl);
                if let Some(mut toneless) = keys.first().filter(|_| has_tone).cloned() {
                    toneless.pop();
                    keys.push(toneless);
                }
                keys
            })
            .collect();

        odometer_merge(&chunks)
            .into_iter()
            .map(|key| InputSequence::new(key, false))
            .collect()
    }

    /// Align `raw` to the syllables of the dictionary word `target`.
    ///
    /// Each target syllable consumes the raw characters that spell it,
    /// case-insensitively. A trailing tone key is consumed when it gives the
    /// target's tone, or when it is an explicit tone 1 or 4 on a toneless
    /// syllable. Whatever raw input is left over becomes a final syllable,
    /// so the raw text is always preserved.
    pub fn as_tai_text(&self, raw: &str, target: &str) -> TaiText {
        let mut ret = TaiText::new();
        let mut rest = raw;

        for piece in target.split(SYLLABLE_SEPARATORS).filter(|s| !s.is_empty()) {
            if rest.is_empty() {
                break;
            }

            let target_syl = self.parse_composed(piece);
            let consumed = self.align_raw_to_composed(&target_syl, rest);
            if consumed == 0 {
                break;
            }

            let (head, tail) = rest.split_at(consumed);
            push_spaced(&mut ret, self.parse_raw(head));
            rest = tail;
        }

        if !rest.is_empty() {
            push_spaced(&mut ret, self.parse_raw(rest));
        }

        ret
    }

    /// Byte length of the prefix of `raw` that spells `target`.
    fn align_raw_to_composed(&self, target: &Syllable, raw: &str) -> usize {
        let kc = self.keyconfig;
        let mut raw_chars = raw.char_indices().peekable();
        let mut prev: Option<char> = None;
        let mut end = 0;

        for t in target.raw_input().chars() {
            match raw_chars.peek() {
                Some(&(i, r)) if r.eq_ignore_ascii_case(&t) => {
                    end = i + r.len_utf8();
                    prev = Some(r);
                    raw_chars.next();
                }
                _ => break,
            }
        }

        let Some(&(i, next)) = raw_chars.peek() else {
            return end;
        };

        let next_tone = kc.check_tone_key(next);
        let target_tone = target.tone();
        let takes_next = if target_tone != Tone::NaT {
            let prev_tone = prev.map_or(Tone::NaT, |p| kc.check_tone_key(p));
            prev_tone != target_tone && next_tone == target_tone
        } else {
            matches!(next_tone, Tone::T1 | Tone::T4)
        };

        if takes_next {
            i + next.len_utf8()
        } else {
            end
        }
    }
}

fn push_spaced(text: &mut TaiText, syllable: Syllable) {
    if text.syllable_count() > 0 {
        text.push_spacer();
    }
    text.push_syllable(syllable);
}

/// Cartesian product of `sets`, concatenated, with the last set varying
/// fastest.
fn odometer_merge(sets: &[Vec<String>]) -> Vec<String> {
    sets.iter().fold(vec![String::new()], |acc, set| {
        acc.iter()
            .flat_map(|head| set.iter().map(move |s| format!("{head}{s}")))
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KhiinConfig;

    fn syllable_raw_sizes(text: &TaiText) -> Vec<usize> {
        text.syllables().map(|s| s.raw_size()).collect()
    }

    fn inputs(seqs: &[InputSequence]) -> Vec<&str> {
        seqs.iter().map(|s| s.input.as_str()).collect()
    }

    #[test]
    fn test_to_fuzzy() {
        let kc = KeyConfig::new();
        let parser = SyllableParser::new(&kc, true);

        assert_eq!(
            parser.to_fuzzy("ho"),
            (vec!["ho".to_string(), "ho1".to_string()], false)
        );
        assert_eq!(
            parser.to_fuzzy("chiah"),
            (vec!["chiah".to_string(), "chiah4".to_string()], false)
        );
        assert_eq!(parser.to_fuzzy("Hó"), (vec!["ho2".to_string()], true));
        assert_eq!(
            parser.to_fuzzy("sa\u{207f}"),
            (vec!["sann".to_string(), "sann1".to_string()], false)
        );
    }

    #[test]
    fn test_to_fuzzy_with_telex() {
        let cfg = KhiinConfig {
            telex: true,
            ..KhiinConfig::default()
        };
        let kc = KeyConfig::from_config(&cfg).unwrap();
        let parser = SyllableParser::new(&kc, true);
        assert_eq!(
            parser.to_fuzzy("hó"),
            (vec!["ho2".to_string(), "hos".to_string()], true)
        );
    }

    #[test]
    fn test_single_syllable_sequences() {
        let kc = KeyConfig::new();
        let parser = SyllableParser::new(&kc, true);

        let seqs = parser.as_input_sequences("hó");
        assert_eq!(inputs(&seqs), vec!["ho2", "ho"]);
        assert!(!seqs[0].fuzzy);
        assert!(seqs[1].fuzzy);

        let seqs = parser.as_input_sequences("·a");
        assert_eq!(inputs(&seqs), vec!["a", "a1"]);
        assert!(seqs.iter().all(|s| !s.fuzzy));
    }

    #[test]
    fn test_multi_syllable_sequences() {
        let kc = KeyConfig::new();
        let parser = SyllableParser::new(&kc, true);

        let seqs = parser.as_input_sequences("tāi-chì");
        assert_eq!(
            inputs(&seqs),
            vec!["tai7chi3", "tai7chi", "taichi3", "taichi"]
        );
        assert!(seqs.iter().all(|s| !s.fuzzy));

        let seqs = parser.as_input_sequences("a bô");
        assert_eq!(inputs(&seqs), vec!["abo5", "abo", "a1bo5", "a1bo"]);
    }

    #[test]
    fn test_as_tai_text_aligns_tones() {
        let kc = KeyConfig::new();
        let parser = SyllableParser::new(&kc, true);

        let text = parser.as_tai_text("tai7chi3", "tāi-chì");
        assert_eq!(text.composed(), "tāi chì");
        assert_eq!(syllable_raw_sizes(&text), vec![4, 4]);

        let text = parser.as_tai_text("taichi", "tāi-chì");
        assert_eq!(text.composed(), "tai chi");

        let text = parser.as_tai_text("a1bo", "a bô");
        assert_eq!(text.composed(), "a bo");
        assert_eq!(syllable_raw_sizes(&text), vec![2, 2]);
    }

    #[test]
    fn test_as_tai_text_keeps_leftover_raw() {
        let kc = KeyConfig::new();
        let parser = SyllableParser::new(&kc, true);

        let text = parser.as_tai_text("taichia", "tāi-chì");
        assert_eq!(text.raw(), "taichia");
        assert_eq!(text.composed(), "tai chi a");

        let text = parser.as_tai_text("ta", "tāi-chì");
        assert_eq!(text.raw(), "ta");
        assert_eq!(text.syllable_count(), 1);
    }

    #[test]
    fn test_odometer_merge_order() {
        let sets = vec![
            vec!["a".to_string(), "b".to_string()],
            vec!["1".to_string(), "2".to_string()],
        ];
        assert_eq!(odometer_merge(&sets), vec!["a1", "a2", "b1", "b2"]);
        assert_eq!(odometer_merge(&[]), vec![""]);
    }
}
