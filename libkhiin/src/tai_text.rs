//! A run of syllables, optionally matched to a dictionary candidate.
//!
//! Syllables inside one run are separated by virtual spaces: display-only
//! spaces with no raw counterpart. "taichi" matched against "tāi-chì" is held
//! as `[tai] [ ] [chi]` and composes to "tai chi".

use khiin_core::unicode::{all_lower, char_len, contains_hanji};
use khiin_core::TaiToken;

use crate::keyconfig::KeyConfig;
use crate::lomaji::{is_lomaji, match_capitalization};
use crate::parser::SyllableParser;
use crate::syllable::{KhinKeyPosition, Syllable};

/// Display-only space between two syllables or elements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VirtualSpace {
    /// Set when the user deleted the space; it is then dropped on the next
    /// spacing pass instead of being shown.
    pub erased: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    Syllable(Syllable),
    Spacer(VirtualSpace),
}

#[derive(Debug, Clone, Default)]
pub struct TaiText {
    chunks: Vec<Chunk>,
    candidate: Option<TaiToken>,
}

impl PartialEq for TaiText {
    fn eq(&self, other: &Self) -> bool {
        self.chunks.len() == other.chunks.len() && self.converted() == other.converted()
    }
}

impl TaiText {
    pub fn new() -> Self {
        Self::default()
    }

    /// A run holding the parse of a single raw syllable.
    pub fn from_raw_syllable(parser: &SyllableParser<'_>, raw: &str) -> Self {
        let mut text = Self::new();
        text.push_syllable(parser.parse_raw(raw));
        text
    }

    /// Align `input` to the syllables of `token.input`. The candidate is not
    /// attached; see [`TaiText::set_candidate`].
    pub fn from_matching(parser: &SyllableParser<'_>, input: &str, token: &TaiToken) -> Self {
        parser.as_tai_text(input, &token.input)
    }

    pub fn push_syllable(&mut self, syllable: Syllable) {
        self.chunks.push(Chunk::Syllable(syllable));
    }

    pub fn push_spacer(&mut self) {
        self.chunks.push(Chunk::Spacer(VirtualSpace::default()));
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn syllables(&self) -> impl Iterator<Item = &Syllable> {
        self.chunks.iter().filter_map(|c| match c {
            Chunk::Syllable(s) => Some(s),
            Chunk::Spacer(_) => None,
        })
    }

    pub fn syllable_count(&self) -> usize {
        self.syllables().count()
    }

    pub fn set_candidate(&mut self, token: Option<TaiToken>) {
        self.candidate = token;
    }

    pub fn candidate(&self) -> Option<&TaiToken> {
        self.candidate.as_ref()
    }

    pub fn raw(&self) -> String {
        self.syllables().map(|s| s.raw_input()).collect()
    }

    pub fn raw_size(&self) -> usize {
        self.syllables().map(|s| s.raw_size()).sum()
    }

    pub fn composed(&self) -> String {
        self.chunks
            .iter()
            .map(|c| match c {
                Chunk::Syllable(s) => s.composed(),
                Chunk::Spacer(_) => " ",
            })
            .collect()
    }

    pub fn composed_size(&self) -> usize {
        self.chunks
            .iter()
            .map(|c| match c {
                Chunk::Syllable(s) => s.composed_size(),
                Chunk::Spacer(_) => 1,
            })
            .sum()
    }

    /// The candidate output, with the typed capitalization carried over
    /// onto romanized output. Falls back to the composed text.
    pub fn converted(&self) -> String {
        let Some(token) = &self.candidate else {
            return self.composed();
        };

        let raw = self.raw();
        if is_lomaji(&token.output) && !all_lower(&raw) {
            match_capitalization(&raw, &token.output)
        } else {
            token.output.clone()
        }
    }

    pub fn converted_size(&self) -> usize {
        char_len(&self.converted())
    }

    pub fn raw_to_composed_caret(&self, kc: &KeyConfig, raw_caret: usize) -> usize {
        let mut remainder = raw_caret;
        let mut caret = 0;

        for chunk in &self.chunks {
            match chunk {
                Chunk::Syllable(syl) => {
                    let size = syl.raw_size();
                    if remainder > size {
                        remainder -= size;
                        caret += syl.composed_size();
                    } else {
                        caret += syl
                            .raw_to_composed_caret(kc, remainder)
                            .unwrap_or_else(|| syl.composed_size());
                        break;
                    }
                }
                Chunk::Spacer(_) => {
                    if remainder > 0 {
                        caret += 1;
                    }
                }
            }
        }

        caret
    }

    pub fn composed_to_raw_caret(&self, kc: &KeyConfig, caret: usize) -> usize {
        let mut remainder = caret;
        let mut raw_caret = 0;

        for chunk in &self.chunks {
            if remainder == 0 {
                break;
            }
            match chunk {
                Chunk::Syllable(syl) => {
                    let size = syl.composed_size();
                    if remainder > size {
                        remainder -= size;
                        raw_caret += syl.raw_size();
                    } else {
                        raw_caret += syl
                            .composed_to_raw_caret(kc, remainder)
                            .unwrap_or_else(|| syl.raw_size());
                        remainder = 0;
                    }
                }
                Chunk::Spacer(_) => remainder -= 1,
            }
        }

        raw_caret
    }

    /// Map a caret in the converted text to the raw input.
    ///
    /// A Han candidate with one character per syllable maps character by
    /// character; anything else maps through the composed text.
    pub fn converted_to_raw_caret(&self, kc: &KeyConfig, caret: usize) -> usize {
        if caret >= self.converted_size() {
            return self.raw_size();
        }
        let Some(token) = &self.candidate else {
            return self.composed_to_raw_caret(kc, caret);
        };

        if contains_hanji(&token.output) && char_len(&token.output) == self.syllable_count() {
            return self.syllables().take(caret).map(|s| s.raw_size()).sum();
        }

        self.composed_to_raw_caret(kc, caret)
    }

    /// Erase one glyph at composed caret `index`. A virtual space at that
    /// position is removed instead.
    pub fn erase(&mut self, kc: &KeyConfig, index: usize) {
        let mut remainder = index;

        for i in 0..self.chunks.len() {
            let size = match &self.chunks[i] {
                Chunk::Syllable(s) => s.composed_size(),
                Chunk::Spacer(_) => 1,
            };
            if remainder >= size {
                remainder -= size;
                continue;
            }

            match &mut self.chunks[i] {
                Chunk::Syllable(syl) => syl.erase(kc, remainder),
                Chunk::Spacer(_) => {
                    self.chunks.remove(i);
                }
            }
            return;
        }
    }

    pub fn is_virtual_space(&self, index: usize) -> bool {
        let mut remainder = index;
        for chunk in &self.chunks {
            let size = match chunk {
                Chunk::Syllable(s) => s.composed_size(),
                Chunk::Spacer(_) => 1,
            };
            if remainder < size {
                return matches!(chunk, Chunk::Spacer(_));
            }
            remainder -= size;
        }
        false
    }

    /// Mark the run as khin: the first syllable gets `pos`/`key`, the rest
    /// a virtual marker. Fails when the first syllable cannot take it.
    pub fn set_khin(&mut self, pos: KhinKeyPosition, key: Option<char>) -> bool {
        let mut syllables = self.chunks.iter_mut().filter_map(|c| match c {
            Chunk::Syllable(s) => Some(s),
            Chunk::Spacer(_) => None,
        });

        let Some(first) = syllables.next() else {
            return false;
        };
        if !first.set_khin(pos, key) {
            return false;
        }

        for syl in syllables {
            syl.set_khin(KhinKeyPosition::Virtual, None);
        }
        true
    }
}
