//! Keyboard configuration: which keys produce tones, khin, hyphens and the
//! special POJ letters (ⁿ, o͘, o̤, ṳ).
//!
//! Conversion rules map a raw key sequence to composed text ("nn" -> "ⁿ").
//! `convert` applies each rule once, in rule order, to the first occurrence
//! it finds; `deconvert` applies the inverse mapping the same way.

use crate::config::KhiinConfig;
use crate::error::{Error, Result};
use crate::lomaji::Tone;

const ALLOWED_OTHER_KEYS: [char; 9] = ['d', 'f', 'q', 'r', 'v', 'w', 'x', 'y', 'z'];
const DISALLOWED_TELEX_KEYS: [char; 11] = ['a', 'e', 'h', 'i', 'k', 'm', 'n', 'o', 'p', 't', 'u'];

const NASAL: &str = "\u{207f}";
const NASAL_UPPER: &str = "\u{1d3a}";
const O_DOT: &str = "o\u{0358}";
const O_DOT_UPPER: &str = "O\u{0358}";
const O_DOTS_BELOW: &str = "o\u{0324}";
const O_DOTS_BELOW_UPPER: &str = "O\u{0324}";
const U_DOTS_BELOW: &str = "u\u{0324}";
const U_DOTS_BELOW_UPPER: &str = "U\u{0324}";

/// A virtual key: a function that can be bound to a physical key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VKey {
    Nasal,
    DotAboveRight,
    DotsBelow,
    Hyphen,
    TelexKhin,
}

impl VKey {
    fn role(self) -> &'static str {
        match self {
            VKey::Nasal => "nasal",
            VKey::DotAboveRight => "dot-above-right",
            VKey::DotsBelow => "dots-below",
            VKey::Hyphen => "hyphen",
            VKey::TelexKhin => "khin",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRule {
    pub raw: String,
    pub composed: String,
}

#[derive(Debug, Clone)]
struct RuleSet {
    vkey: VKey,
    rules: Vec<ConversionRule>,
}

#[derive(Debug, Clone, Default)]
pub struct KeyConfig {
    rule_sets: Vec<RuleSet>,
    key_map: Vec<(VKey, char)>,
    telex_tones: Vec<(char, Tone)>,
    standalone_nasal: bool,
    standalone_dot_above_right: bool,
    /// Whether "N" + nasal key gives ᴺ rather than ⁿ
    uppercase_nasal: bool,
}

impl KeyConfig {
    /// The default layout: "nn" for ⁿ, "ou" for o͘, "or"/"ur" for o̤/ṳ.
    pub fn new() -> Self {
        let mut kc = Self::empty();
        kc.set_nasal('n', false);
        kc.set_dot_above_right('u', false);
        kc.set_dots_below('r');
        kc
    }

    /// A configuration with no conversion rules at all.
    pub fn empty() -> Self {
        Self {
            uppercase_nasal: true,
            ..Self::default()
        }
    }

    /// Build the key configuration described by `config`.
    pub fn from_config(config: &KhiinConfig) -> Result<Self> {
        let mut kc = Self::empty();
        kc.uppercase_nasal = config.uppercase_nasal;

        let nasal: Vec<char> = config.nasal.chars().collect();
        match nasal.as_slice() {
            [key] => kc.bind(VKey::Nasal, key.to_ascii_lowercase(), true)?,
            [n, key] if n.eq_ignore_ascii_case(&'n') => {
                kc.bind(VKey::Nasal, key.to_ascii_lowercase(), false)?
            }
            _ => kc.bind(VKey::Nasal, 'n', false)?,
        }

        let dot: Vec<char> = config.dot_above_right.chars().collect();
        match dot.as_slice() {
            [key] => kc.bind(VKey::DotAboveRight, key.to_ascii_lowercase(), true)?,
            [o, key] if o.eq_ignore_ascii_case(&'o') => {
                kc.bind(VKey::DotAboveRight, key.to_ascii_lowercase(), false)?
            }
            _ => kc.bind(VKey::DotAboveRight, 'u', false)?,
        }

        kc.bind(VKey::DotsBelow, config.dots_below.to_ascii_lowercase(), false)?;

        if let Some(key) = config.alt_hyphen {
            kc.bind(VKey::Hyphen, key, false)?;
        }

        if config.telex {
            kc.bind(VKey::TelexKhin, config.telex_khin, false)?;
            for (key, tone) in [
                (config.telex_t2, Tone::T2),
                (config.telex_t3, Tone::T3),
                (config.telex_t5, Tone::T5),
                (config.telex_t7, Tone::T7),
                (config.telex_t8, Tone::T8),
                (config.telex_t9, Tone::T9),
            ] {
                kc.set_telex_tone(key, tone)?;
            }
        }

        Ok(kc)
    }

    fn bind(&mut self, vkey: VKey, key: char, standalone: bool) -> Result<()> {
        if self.set_key(key, vkey, standalone) {
            return Ok(());
        }
        match self.key_map.iter().find(|(v, k)| *k == key && *v != vkey) {
            Some((other, _)) => Err(Error::KeyConflict {
                key,
                first: other.role(),
                second: vkey.role(),
            }),
            None => Err(Error::InvalidKey {
                key,
                role: vkey.role(),
            }),
        }
    }

    /// Bind `key` to `vkey`. Returns false if the key is not allowed for that
    /// function or is already bound to another one.
    pub fn set_key(&mut self, key: char, vkey: VKey, standalone: bool) -> bool {
        match vkey {
            VKey::Nasal => self.set_nasal(key, standalone),
            VKey::DotAboveRight => self.set_dot_above_right(key, standalone),
            VKey::DotsBelow => self.set_dots_below(key),
            VKey::Hyphen | VKey::TelexKhin => {
                if !is_allowed_other_key(key) || !self.is_key_available(key, vkey) {
                    return false;
                }
                self.map_key(vkey, key);
                true
            }
        }
    }

    fn set_telex_tone(&mut self, key: char, tone: Tone) -> Result<()> {
        if !key.is_ascii_lowercase() || DISALLOWED_TELEX_KEYS.contains(&key) {
            return Err(Error::InvalidKey { key, role: "tone" });
        }
        if self.key_map.iter().any(|(_, k)| *k == key) {
            return Err(Error::KeyConflict {
                key,
                first: "tone",
                second: "letter",
            });
        }
        if !self.telex_tones.iter().any(|(k, _)| *k == key) {
            self.telex_tones.push((key, tone));
        }
        Ok(())
    }

    fn set_nasal(&mut self, key: char, standalone: bool) -> bool {
        let allowed = is_allowed_other_key(key) || (!standalone && key == 'n');
        if !allowed || !self.is_key_available(key, VKey::Nasal) {
            return false;
        }

        self.map_key(VKey::Nasal, key);
        self.standalone_nasal = standalone;
        let lc = key.to_string();
        let uc = key.to_ascii_uppercase().to_string();
        let upper = if self.uppercase_nasal { NASAL_UPPER } else { NASAL };

        let rules = if standalone {
            vec![(lc, NASAL), (uc, upper)]
        } else {
            vec![
                (format!("n{lc}"), NASAL),
                (format!("n{uc}"), NASAL),
                (format!("N{lc}"), upper),
                (format!("N{uc}"), upper),
            ]
        };
        self.replace_rules(VKey::Nasal, rules);
        true
    }

    fn set_dot_above_right(&mut self, key: char, standalone: bool) -> bool {
        let allowed = is_allowed_other_key(key) || (!standalone && (key == 'o' || key == 'u'));
        if !allowed || !self.is_key_available(key, VKey::DotAboveRight) {
            return false;
        }

        self.map_key(VKey::DotAboveRight, key);
        self.standalone_dot_above_right = standalone;
        let lc = key.to_string();
        let uc = key.to_ascii_uppercase().to_string();

        let rules = if standalone {
            vec![(lc, O_DOT), (uc, O_DOT_UPPER)]
        } else {
            vec![
                (format!("o{lc}"), O_DOT),
                (format!("o{uc}"), O_DOT),
                (format!("O{lc}"), O_DOT_UPPER),
                (format!("O{uc}"), O_DOT_UPPER),
            ]
        };
        self.replace_rules(VKey::DotAboveRight, rules);
        true
    }

    fn set_dots_below(&mut self, key: char) -> bool {
        if !is_allowed_other_key(key) || !self.is_key_available(key, VKey::DotsBelow) {
            return false;
        }

        self.map_key(VKey::DotsBelow, key);
        let lc = key.to_string();
        let uc = key.to_ascii_uppercase().to_string();

        let rules = vec![
            (format!("o{lc}"), O_DOTS_BELOW),
            (format!("o{uc}"), O_DOTS_BELOW),
            (format!("O{lc}"), O_DOTS_BELOW_UPPER),
            (format!("O{uc}"), O_DOTS_BELOW_UPPER),
            (format!("u{lc}"), U_DOTS_BELOW),
            (format!("u{uc}"), U_DOTS_BELOW),
            (format!("U{lc}"), U_DOTS_BELOW_UPPER),
            (format!("U{uc}"), U_DOTS_BELOW_UPPER),
        ];
        self.replace_rules(VKey::DotsBelow, rules);
        true
    }

    fn map_key(&mut self, vkey: VKey, key: char) {
        self.key_map.retain(|(v, _)| *v != vkey);
        self.key_map.push((vkey, key));
    }

    fn replace_rules(&mut self, vkey: VKey, rules: Vec<(String, &str)>) {
        let rules = rules
            .into_iter()
            .map(|(raw, composed)| ConversionRule {
                raw,
                composed: composed.to_string(),
            })
            .collect();

        match self.rule_sets.iter_mut().find(|s| s.vkey == vkey) {
            Some(set) => set.rules = rules,
            None => self.rule_sets.push(RuleSet { vkey, rules }),
        }
    }

    fn is_key_available(&self, key: char, vkey: VKey) -> bool {
        self.key_map
            .iter()
            .all(|(v, k)| *k != key || *v == vkey)
    }

    /// All conversion rules in application order.
    pub fn conversion_rules(&self) -> impl Iterator<Item = &ConversionRule> {
        self.rule_sets.iter().flat_map(|s| s.rules.iter())
    }

    pub fn convert(&self, input: &str) -> String {
        let mut ret = input.to_string();
        for rule in self.conversion_rules() {
            if let Some(pos) = ret.find(&rule.raw) {
                ret.replace_range(pos..pos + rule.raw.len(), &rule.composed);
            }
        }
        ret
    }

    pub fn deconvert(&self, input: &str) -> String {
        let mut ret = input.to_string();
        for rule in self.conversion_rules() {
            if let Some(pos) = ret.find(&rule.composed) {
                ret.replace_range(pos..pos + rule.composed.len(), &rule.raw);
            }
        }
        ret
    }

    pub fn key_for(&self, vkey: VKey) -> Option<char> {
        self.key_map
            .iter()
            .find(|(v, _)| *v == vkey)
            .map(|(_, k)| *k)
    }

    /// '-' followed by the alternate hyphen key, if any.
    pub fn hyphen_keys(&self) -> Vec<char> {
        let mut keys = vec!['-'];
        keys.extend(self.key_for(VKey::Hyphen));
        keys
    }

    /// '0' followed by the telex khin key, if any.
    pub fn khin_keys(&self) -> Vec<char> {
        let mut keys = vec!['0'];
        keys.extend(self.key_for(VKey::TelexKhin));
        keys
    }

    pub fn is_hyphen(&self, ch: char) -> bool {
        ch == '-' || self.key_for(VKey::Hyphen) == Some(ch)
    }

    /// Tone produced by `ch` at the end of a syllable.
    pub fn check_tone_key(&self, ch: char) -> Tone {
        match Tone::from_digit(ch) {
            Tone::NaT => self
                .telex_tones
                .iter()
                .find(|(k, _)| *k == ch.to_ascii_lowercase())
                .map(|(_, t)| *t)
                .unwrap_or(Tone::NaT),
            tone => tone,
        }
    }

    /// Whether `ch` is a digit key. Words never end right before one.
    pub fn is_tone_key(&self, ch: char) -> bool {
        ch.is_ascii_digit()
    }

    /// The key that produces `tone`, for rebuilding raw input from
    /// composed text.
    pub fn tone_key(&self, tone: Tone) -> Option<char> {
        tone.digit()
    }

    /// The telex letter bound to `tone`, if telex keys are enabled.
    pub fn telex_key(&self, tone: Tone) -> Option<char> {
        self.telex_tones
            .iter()
            .find(|(_, t)| *t == tone)
            .map(|(k, _)| *k)
    }

    pub fn standalone_nasal(&self) -> bool {
        self.standalone_nasal
    }

    pub fn standalone_dot_above_right(&self) -> bool {
        self.standalone_dot_above_right
    }
}

fn is_allowed_other_key(key: char) -> bool {
    ALLOWED_OTHER_KEYS.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use khiin_core::unicode::to_nfc;

    #[test]
    fn test_default_conversions() {
        let kc = KeyConfig::new();
        assert_eq!(kc.convert("sann"), "sa\u{207f}");
        assert_eq!(kc.convert("SANN"), "SA\u{1d3a}");
        assert_eq!(kc.convert("hou"), "ho\u{0358}");
        assert_eq!(kc.convert("Ou"), "O\u{0358}");
        assert_eq!(kc.convert("or"), "o\u{0324}");
        assert_eq!(to_nfc(&kc.convert("ur")), "ṳ");
        assert_eq!(kc.convert("ho"), "ho");
    }

    #[test]
    fn test_each_rule_applies_once() {
        let kc = KeyConfig::new();
        assert_eq!(kc.convert("nnnn"), "\u{207f}nn");
    }

    #[test]
    fn test_deconvert_inverts_convert() {
        let kc = KeyConfig::new();
        for raw in ["sann", "hou", "Hou", "or", "ur", "hounn"] {
            assert_eq!(kc.deconvert(&kc.convert(raw)), raw);
        }
    }

    #[test]
    fn test_standalone_keys() {
        let cfg = KhiinConfig {
            nasal: "v".to_string(),
            dot_above_right: "w".to_string(),
            ..KhiinConfig::default()
        };
        let kc = KeyConfig::from_config(&cfg).unwrap();
        assert!(kc.standalone_nasal());
        assert_eq!(kc.convert("sav"), "sa\u{207f}");
        assert_eq!(kc.convert("hw"), "ho\u{0358}");
        assert_eq!(kc.convert("hou"), "hou");
    }

    #[test]
    fn test_invalid_and_conflicting_keys() {
        let cfg = KhiinConfig {
            nasal: "a".to_string(),
            ..KhiinConfig::default()
        };
        assert!(matches!(
            KeyConfig::from_config(&cfg),
            Err(Error::InvalidKey { key: 'a', .. })
        ));

        let cfg = KhiinConfig {
            nasal: "nr".to_string(),
            ..KhiinConfig::default()
        };
        assert!(matches!(
            KeyConfig::from_config(&cfg),
            Err(Error::KeyConflict { key: 'r', .. })
        ));
    }

    #[test]
    fn test_hyphen_and_khin_keys() {
        let kc = KeyConfig::new();
        assert_eq!(kc.hyphen_keys(), vec!['-']);
        assert_eq!(kc.khin_keys(), vec!['0']);

        let cfg = KhiinConfig {
            alt_hyphen: Some('v'),
            telex: true,
            ..KhiinConfig::default()
        };
        let kc = KeyConfig::from_config(&cfg).unwrap();
        assert_eq!(kc.hyphen_keys(), vec!['-', 'v']);
        assert_eq!(kc.khin_keys(), vec!['0', 'q']);
        assert!(kc.is_hyphen('v'));
    }

    #[test]
    fn test_tone_keys() {
        let kc = KeyConfig::new();
        assert_eq!(kc.check_tone_key('2'), Tone::T2);
        assert_eq!(kc.check_tone_key('0'), Tone::NaT);
        assert_eq!(kc.check_tone_key('s'), Tone::NaT);
        assert!(kc.is_tone_key('0'));
        assert!(!kc.is_tone_key('s'));
        assert_eq!(kc.tone_key(Tone::T8), Some('8'));

        let cfg = KhiinConfig {
            telex: true,
            ..KhiinConfig::default()
        };
        let kc = KeyConfig::from_config(&cfg).unwrap();
        assert_eq!(kc.check_tone_key('s'), Tone::T2);
        assert_eq!(kc.check_tone_key('J'), Tone::T7);
        assert_eq!(kc.telex_key(Tone::T8), Some('x'));
        assert_eq!(KeyConfig::new().telex_key(Tone::T8), None);
    }

    #[test]
    fn test_uppercase_nasal_can_be_disabled() {
        let cfg = KhiinConfig {
            uppercase_nasal: false,
            ..KhiinConfig::default()
        };
        let kc = KeyConfig::from_config(&cfg).unwrap();
        assert_eq!(kc.convert("SANN"), "SA\u{207f}");
        assert_eq!(kc.deconvert("SA\u{207f}"), "SAnn");
    }
}
