//! One element of the composition buffer.
//!
//! An element is plain text, a run of Tai syllables, a punctuation mark, a
//! user dictionary item or a virtual space. Each element knows its raw
//! input, its composed and converted display, and how to map carets between
//! them. Display carets count codepoints of the converted text when the
//! element is converted and of the composed text otherwise.

use khiin_core::unicode::{char_len, insert_char, safe_erase};
use khiin_core::{Punctuation, TaiToken};

use crate::keyconfig::KeyConfig;
use crate::parser::SyllableParser;
use crate::syllable::KhinKeyPosition;
use crate::tai_text::{TaiText, VirtualSpace};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserItem {
    pub input: String,
    pub token: TaiToken,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    Plaintext(String),
    TaiText(TaiText),
    Punctuation(Punctuation),
    UserItem(UserItem),
    VirtualSpace(VirtualSpace),
}

#[derive(Debug, Clone)]
pub struct BufferElement {
    kind: ElementKind,
    converted: bool,
    selected: bool,
}

impl PartialEq for BufferElement {
    fn eq(&self, other: &Self) -> bool {
        self.converted_text() == other.converted_text()
    }
}

impl BufferElement {
    fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            converted: false,
            selected: false,
        }
    }

    pub fn plaintext<S: Into<String>>(text: S) -> Self {
        Self::new(ElementKind::Plaintext(text.into()))
    }

    pub fn tai_text(text: TaiText) -> Self {
        Self::new(ElementKind::TaiText(text))
    }

    pub fn punctuation(punct: Punctuation) -> Self {
        Self::new(ElementKind::Punctuation(punct))
    }

    pub fn user_item<S: Into<String>>(input: S, token: TaiToken) -> Self {
        Self::new(ElementKind::UserItem(UserItem {
            input: input.into(),
            token,
        }))
    }

    pub fn spacer() -> Self {
        Self::new(ElementKind::VirtualSpace(VirtualSpace::default()))
    }

    /// Build the element for `input`.
    ///
    /// A user dictionary token gives a user item. Otherwise, with a parser,
    /// the input is aligned to `token` (attached as the candidate when
    /// `with_candidate` is set) or parsed as a single syllable. Without a
    /// parser the input is kept as plain text.
    pub fn build(
        parser: Option<&SyllableParser<'_>>,
        input: &str,
        token: Option<&TaiToken>,
        with_candidate: bool,
    ) -> Self {
        if let Some(token) = token.filter(|t| t.custom) {
            return Self::user_item(input, token.clone());
        }

        let Some(parser) = parser else {
            return Self::plaintext(input);
        };

        match token {
            Some(token) => {
                let mut text = TaiText::from_matching(parser, input, token);
                if with_candidate {
                    text.set_candidate(Some(token.clone()));
                }
                Self::tai_text(text)
            }
            None => Self::tai_text(TaiText::from_raw_syllable(parser, input)),
        }
    }

    pub fn with_converted(mut self, converted: bool) -> Self {
        self.converted = converted;
        self
    }

    pub fn with_selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    pub fn is_converted(&self) -> bool {
        self.converted
    }

    pub fn set_converted(&mut self, converted: bool) {
        self.converted = converted;
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    pub fn is_tai_text(&self) -> bool {
        matches!(self.kind, ElementKind::TaiText(_))
    }

    pub fn is_virtual_space(&self) -> bool {
        matches!(self.kind, ElementKind::VirtualSpace(_))
    }

    pub fn is_erased_space(&self) -> bool {
        matches!(self.kind, ElementKind::VirtualSpace(VirtualSpace { erased: true }))
    }

    /// Whether display position `index` falls on a virtual space, either
    /// this element itself or one inside a syllable run.
    pub fn is_virtual_space_at(&self, index: usize) -> bool {
        match &self.kind {
            ElementKind::VirtualSpace(_) => index == 0,
            ElementKind::TaiText(t) if !self.converted => t.is_virtual_space(index),
            _ => false,
        }
    }

    pub fn candidate(&self) -> Option<&TaiToken> {
        match &self.kind {
            ElementKind::TaiText(t) => t.candidate(),
            ElementKind::UserItem(u) => Some(&u.token),
            _ => None,
        }
    }

    pub fn raw(&self) -> String {
        match &self.kind {
            ElementKind::Plaintext(s) => s.clone(),
            ElementKind::TaiText(t) => t.raw(),
            ElementKind::Punctuation(p) => p.input.clone(),
            ElementKind::UserItem(u) => u.input.clone(),
            ElementKind::VirtualSpace(_) => String::new(),
        }
    }

    pub fn raw_size(&self) -> usize {
        char_len(&self.raw())
    }

    pub fn composed(&self) -> String {
        match &self.kind {
            ElementKind::Plaintext(s) => s.clone(),
            ElementKind::TaiText(t) => t.composed(),
            ElementKind::Punctuation(p) => p.output.clone(),
            ElementKind::UserItem(u) => u.input.clone(),
            ElementKind::VirtualSpace(_) => " ".to_string(),
        }
    }

    pub fn converted_text(&self) -> String {
        match &self.kind {
            ElementKind::TaiText(t) => t.converted(),
            ElementKind::UserItem(u) => u.token.output.clone(),
            _ => self.composed(),
        }
    }

    /// What the element currently displays.
    pub fn display(&self) -> String {
        if self.converted {
            self.converted_text()
        } else {
            self.composed()
        }
    }

    /// Display size in codepoints.
    pub fn size(&self) -> usize {
        char_len(&self.display())
    }

    pub fn raw_to_composed_caret(&self, kc: &KeyConfig, raw_caret: usize) -> usize {
        match &self.kind {
            ElementKind::Plaintext(s) => raw_caret.min(char_len(s)),
            ElementKind::TaiText(t) => {
                if self.converted && t.candidate().is_some() {
                    if raw_caret == 0 {
                        0
                    } else {
                        t.converted_size()
                    }
                } else {
                    t.raw_to_composed_caret(kc, raw_caret)
                }
            }
            ElementKind::Punctuation(p) => {
                if raw_caret == 0 {
                    0
                } else {
                    char_len(&p.output)
                }
            }
            ElementKind::UserItem(u) => {
                if self.converted {
                    if raw_caret == 0 {
                        0
                    } else {
                        char_len(&u.token.output)
                    }
                } else {
                    raw_caret.min(char_len(&u.input))
                }
            }
            ElementKind::VirtualSpace(_) => 0,
        }
    }

    pub fn composed_to_raw_caret(&self, kc: &KeyConfig, caret: usize) -> usize {
        match &self.kind {
            ElementKind::Plaintext(s) => caret.min(char_len(s)),
            ElementKind::TaiText(t) => {
                if self.converted {
                    t.converted_to_raw_caret(kc, caret)
                } else {
                    t.composed_to_raw_caret(kc, caret)
                }
            }
            ElementKind::Punctuation(p) => {
                if caret == 0 {
                    0
                } else {
                    char_len(&p.input)
                }
            }
            ElementKind::UserItem(u) => {
                if self.converted && caret > 0 {
                    char_len(&u.input)
                } else {
                    caret.min(char_len(&u.input))
                }
            }
            ElementKind::VirtualSpace(_) => 0,
        }
    }

    /// Erase the glyph at display position `index`.
    pub fn erase(&mut self, kc: &KeyConfig, index: usize) {
        let replacement = match &mut self.kind {
            ElementKind::Plaintext(s) => {
                safe_erase(s, index, 1);
                None
            }
            ElementKind::TaiText(t) => {
                t.erase(kc, index);
                None
            }
            ElementKind::Punctuation(_) => Some(String::new()),
            ElementKind::UserItem(u) => {
                let mut input = std::mem::take(&mut u.input);
                safe_erase(&mut input, index, 1);
                Some(input)
            }
            ElementKind::VirtualSpace(v) => {
                v.erased = true;
                None
            }
        };

        if let Some(text) = replacement {
            self.kind = ElementKind::Plaintext(text);
        }
    }

    /// Apply a khin marker.
    ///
    /// Only syllable runs can carry one. Plain text gets the typed keys
    /// back so no raw input is lost, but still reports failure.
    pub fn set_khin(&mut self, pos: KhinKeyPosition, key: Option<char>) -> bool {
        match &mut self.kind {
            ElementKind::TaiText(t) => t.set_khin(pos, key),
            ElementKind::Plaintext(s) => {
                if let Some(key) = key {
                    match pos {
                        KhinKeyPosition::Start => {
                            insert_char(s, 0, key);
                            insert_char(s, 0, key);
                        }
                        KhinKeyPosition::End => s.push(key),
                        _ => {}
                    }
                }
                false
            }
            _ => false,
        }
    }

    /// Turn the element into plain text, keeping its converted display.
    pub fn replace_with_plaintext<S: Into<String>>(&mut self, text: S) {
        self.kind = ElementKind::Plaintext(text.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(input: &str, output: &str) -> TaiToken {
        TaiToken {
            input: input.to_string(),
            output: output.to_string(),
            ..TaiToken::default()
        }
    }

    #[test]
    fn test_build_variants() {
        let kc = KeyConfig::new();
        let parser = SyllableParser::new(&kc, true);

        let el = BufferElement::build(Some(&parser), "ho2", Some(&token("hó", "好")), true);
        assert!(el.is_tai_text());
        assert_eq!(el.composed(), "hó");
        assert_eq!(el.converted_text(), "好");
        assert_eq!(el.size(), 2);
        assert_eq!(el.clone().with_converted(true).size(), 1);

        let el = BufferElement::build(Some(&parser), "ho2", Some(&token("hó", "好")), false);
        assert_eq!(el.candidate(), None);

        let el = BufferElement::build(None, "xyz", None, false);
        assert_eq!(el.kind(), &ElementKind::Plaintext("xyz".to_string()));

        let custom = TaiToken {
            custom: true,
            ..token("hi", "嗨")
        };
        let el = BufferElement::build(Some(&parser), "hi", Some(&custom), true);
        assert!(matches!(el.kind(), ElementKind::UserItem(_)));
        assert_eq!(el.converted_text(), "嗨");
    }

    #[test]
    fn test_converted_carets() {
        let kc = KeyConfig::new();
        let parser = SyllableParser::new(&kc, true);
        let el = BufferElement::build(Some(&parser), "ho2", Some(&token("hó", "好")), true)
            .with_converted(true);
        assert_eq!(el.raw_to_composed_caret(&kc, 0), 0);
        assert_eq!(el.raw_to_composed_caret(&kc, 2), 1);
        assert_eq!(el.composed_to_raw_caret(&kc, 1), 3);

        let punct = BufferElement::punctuation(Punctuation {
            id: 1,
            input: ".".to_string(),
            output: "。".to_string(),
            annotation: String::new(),
        });
        assert_eq!(punct.raw_to_composed_caret(&kc, 1), 1);
        assert_eq!(punct.composed_to_raw_caret(&kc, 1), 1);
    }

    #[test]
    fn test_erase_variants() {
        let kc = KeyConfig::new();

        let mut el = BufferElement::plaintext("abc");
        el.erase(&kc, 1);
        assert_eq!(el.raw(), "ac");

        let mut el = BufferElement::spacer();
        el.erase(&kc, 0);
        assert!(el.is_erased_space());
        assert_eq!(el.raw_size(), 0);

        let mut el = BufferElement::user_item("hi", token("hi", "嗨"));
        el.erase(&kc, 1);
        assert_eq!(el.kind(), &ElementKind::Plaintext("h".to_string()));
    }

    #[test]
    fn test_set_khin_on_plaintext_keeps_keys() {
        let mut el = BufferElement::plaintext("x");
        assert!(!el.set_khin(KhinKeyPosition::Start, Some('-')));
        assert_eq!(el.raw(), "--x");
        assert!(!BufferElement::spacer().set_khin(KhinKeyPosition::Virtual, None));
    }

    #[test]
    fn test_equality_by_converted_text() {
        assert_eq!(BufferElement::plaintext("a"), BufferElement::plaintext("a"));
        assert_ne!(BufferElement::plaintext("a"), BufferElement::spacer());
    }
}
