//! The composition state machine.
//!
//! `BufferMgr` owns the composition buffer, the caret, the candidate list
//! and the focus, and applies each editing action to them. It holds no
//! reference to the dictionary or the configuration: every action takes a
//! [`Context`] that carries them for the duration of the call.
//!
//! The edit state moves through:
//! - `Empty`: nothing typed
//! - `Composing`: raw input shown in romanized form, re-matched on each key
//! - `Converted`: a candidate was chosen, navigation is by segment
//! - `Selecting`: the candidate list has focus

use std::cmp::max;
use std::mem;

use khiin_core::{CandidateList, EditState, Preedit, SegmentStatus, TaiToken};
use tracing::{debug, trace};

use crate::buffer::{Buffer, EditSession};
use crate::buffer_element::BufferElement;
use crate::candidate_finder::CandidateFinder;
use crate::config::{InputMode, KhiinConfig};
use crate::dictionary::Dictionary;
use crate::keyconfig::KeyConfig;
use crate::khin_handler::autokhin_buffer;
use crate::lomaji::{move_caret, CursorDirection};
use crate::parser::SyllableParser;

/// Everything an editing action needs besides the buffer state.
pub struct Context<'a> {
    pub config: &'a KhiinConfig,
    pub parser: SyllableParser<'a>,
    pub dictionary: &'a mut Dictionary,
}

impl<'a> Context<'a> {
    pub fn new(
        config: &'a KhiinConfig,
        keyconfig: &'a KeyConfig,
        dictionary: &'a mut Dictionary,
    ) -> Self {
        Self {
            config,
            parser: SyllableParser::new(keyconfig, config.dotted_khin),
            dictionary,
        }
    }

    fn keyconfig(&self) -> &'a KeyConfig {
        self.parser.keyconfig()
    }

    fn finder(&mut self) -> CandidateFinder<'_, 'a> {
        CandidateFinder::new(
            &mut *self.dictionary,
            self.parser,
            self.config.base.continuous_candidates,
        )
    }

    fn adjust_khin_and_spacing(&self, buffer: &mut Buffer) {
        adjust_khin_and_spacing(self.config, &self.parser, buffer);
    }
}

fn adjust_khin_and_spacing(config: &KhiinConfig, parser: &SyllableParser<'_>, buffer: &mut Buffer) {
    autokhin_buffer(buffer, config.autokhin, parser);
    buffer.adjust_virtual_spacing();
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum NavMode {
    #[default]
    ByCharacter,
    BySegment,
}

#[derive(Debug, Default)]
pub struct BufferMgr {
    composition: Buffer,
    candidates: Vec<Buffer>,
    caret: usize,
    focused_candidate: usize,
    focused_element: usize,
    edit_state: EditState,
    nav_mode: NavMode,
}

/// Left context for a new composition: the token of the last word before it.
fn last_token(buffer: &Buffer) -> Option<TaiToken> {
    buffer
        .iter()
        .rev()
        .find(|e| !e.is_virtual_space())
        .filter(|e| e.is_tai_text())
        .and_then(|e| e.candidate())
        .cloned()
}

/// Split off the part of `buffer` a keystroke at display `caret` edits:
/// the composing run if there is one, otherwise the element under the caret.
fn composing_session(buffer: &mut Buffer, caret: usize) -> EditSession<'_> {
    if buffer.has_composing() {
        EditSession::isolate_composing(buffer)
    } else {
        EditSession::split_for_composition(buffer, caret)
    }
}

/// Raw caret to focus after a session joins: the first element it produced.
fn focus_after(session: &EditSession<'_>) -> usize {
    let pre = session.pre().raw_text_size();
    if session.is_empty() {
        pre
    } else {
        pre + 1
    }
}

impl BufferMgr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.composition.is_empty()
    }

    pub fn edit_state(&self) -> EditState {
        self.edit_state
    }

    pub fn caret(&self) -> usize {
        self.caret
    }

    pub fn composition(&self) -> &Buffer {
        &self.composition
    }

    pub fn clear(&mut self) {
        self.composition.clear();
        self.candidates.clear();
        self.caret = 0;
        self.focused_candidate = 0;
        self.focused_element = 0;
        self.edit_state = EditState::Empty;
        self.nav_mode = NavMode::ByCharacter;
    }

    /// The preedit segments shown to the user.
    ///
    /// Adjacent composing elements, and the virtual spaces between them,
    /// merge into one `Composing` segment. Converted elements each get their
    /// own segment, `Focused` for the one that has focus.
    pub fn build_preedit(&self) -> Preedit {
        let mut preedit = Preedit::new();
        let elements = self.composition.elements();
        let mut i = 0;

        while i < elements.len() {
            let el = &elements[i];
            let space_before_composing = el.is_virtual_space()
                && elements.get(i + 1).is_some_and(|next| !next.is_converted());

            if space_before_composing || !el.is_converted() {
                let mut text = String::new();
                while let Some(el) = elements.get(i) {
                    if el.is_converted() && !el.is_virtual_space() {
                        break;
                    }
                    text.push_str(&el.display());
                    i += 1;
                }
                preedit.push(text, SegmentStatus::Composing);
                continue;
            }

            if el.is_virtual_space() {
                preedit.push(" ", SegmentStatus::Unmarked);
            } else if i == self.focused_element {
                preedit.push(el.converted_text(), SegmentStatus::Focused);
            } else {
                preedit.push(el.converted_text(), SegmentStatus::Converted);
            }
            i += 1;
        }

        preedit.caret = self.caret;
        preedit.focused_caret = self.focused_caret();
        preedit
    }

    /// Candidates for display, with khin and spacing applied. Empty once
    /// a candidate has been chosen and the user is moving between segments.
    pub fn get_candidates(&self, config: &KhiinConfig, keyconfig: &KeyConfig) -> CandidateList {
        if matches!(self.edit_state, EditState::Empty | EditState::Converted) {
            return CandidateList::new();
        }

        let parser = SyllableParser::new(keyconfig, config.dotted_khin);
        let values = self.candidates.iter().map(|c| {
            let mut c = c.clone();
            adjust_khin_and_spacing(config, &parser, &mut c);
            c.text()
        });
        CandidateList::from_values(values, Some(self.focused_candidate))
    }

    pub fn insert(&mut self, ctx: &mut Context<'_>, ch: char) {
        self.edit_state = EditState::Composing;
        self.insert_char(ctx, ch);
    }

    /// Record what was typed and hand back the committed text.
    pub fn commit(&mut self, ctx: &mut Context<'_>) -> String {
        let text = self.composition.text();
        if !self.composition.is_empty() {
            if let Err(e) = ctx.dictionary.record_ngrams(&self.composition) {
                tracing::warn!("could not record n-grams: {}", e);
            }
        }
        debug!("commit '{}'", text);
        self.clear();
        text
    }

    /// Undo the last level of conversion.
    pub fn revert(&mut self, ctx: &mut Context<'_>) {
        match self.edit_state {
            EditState::Empty => {}
            EditState::Composing => {
                if self.composition.all_composing() {
                    self.clear();
                } else {
                    self.composition.set_converted(false);
                    ctx.adjust_khin_and_spacing(&mut self.composition);
                    self.caret = self.composition.text_size();
                    self.set_focused_element(0);
                }
            }
            EditState::Converted => {
                let kc = ctx.keyconfig();
                let index = self.focused_element;
                if let Some(el) = self.composition.get_mut(index) {
                    el.set_converted(false);
                }
                let raw_caret = self.composition.raw_size_of(0..index + 1);
                ctx.adjust_khin_and_spacing(&mut self.composition);
                self.set_caret_from_raw(kc, raw_caret);
                let (element, _) = self.composition.element_at_caret(self.caret);
                self.focus_element(ctx, element);
                self.edit_state = EditState::Composing;
            }
            EditState::Selecting => {
                self.edit_state = EditState::Converted;
            }
        }
    }

    pub fn erase(&mut self, ctx: &mut Context<'_>, dir: CursorDirection) {
        if self.composition.is_empty() {
            return;
        }

        match dir {
            CursorDirection::Left if self.caret == 0 => return,
            CursorDirection::Left => self.move_caret(ctx, CursorDirection::Left),
            CursorDirection::Right if self.caret >= self.composition.text_size() => return,
            CursorDirection::Right => {}
        }

        let (mut index, mut pos) = self.composition.element_at_caret(self.caret);
        if self.composition.get(index).is_some_and(|e| e.size() == pos) {
            index += 1;
            pos = 0;
        }
        let Some(el) = self.composition.get(index) else {
            return;
        };

        if el.is_converted() && !el.is_virtual_space() {
            self.erase_converted(ctx, index, pos);
        } else {
            self.erase_composing(ctx, dir);
        }
    }

    pub fn handle_left_right(&mut self, ctx: &mut Context<'_>, dir: CursorDirection) {
        match self.edit_state {
            EditState::Empty => {}
            EditState::Composing => self.move_caret(ctx, dir),
            EditState::Converted | EditState::Selecting => {
                self.edit_state = EditState::Converted;
                self.move_focus_or_caret(ctx, dir);
            }
        }
    }

    /// Enter: choose the focused candidate while selecting, otherwise
    /// commit. Returns the committed text when a commit happened.
    pub fn handle_select_or_commit(&mut self, ctx: &mut Context<'_>) -> Option<String> {
        if self.edit_state == EditState::Selecting {
            self.select_candidate(ctx, self.focused_candidate);
            None
        } else {
            Some(self.commit(ctx))
        }
    }

    /// Space: convert, then open the candidate list, then cycle through it.
    pub fn handle_select_or_focus(&mut self, ctx: &mut Context<'_>) {
        match self.edit_state {
            EditState::Empty => {}
            EditState::Composing => {
                self.edit_state = EditState::Converted;
                self.select_candidate(ctx, 0);
            }
            EditState::Converted => {
                self.edit_state = EditState::Selecting;
                self.focus_next_candidate(ctx);
            }
            EditState::Selecting => self.focus_next_candidate(ctx),
        }
    }

    pub fn focus_next_candidate(&mut self, ctx: &mut Context<'_>) {
        match self.edit_state {
            EditState::Empty => {}
            EditState::Composing => {
                self.edit_state = EditState::Selecting;
                self.focus_candidate(ctx, 0);
            }
            EditState::Converted | EditState::Selecting => {
                self.edit_state = EditState::Selecting;
                let next = self.focused_candidate + 1;
                let next = if next >= self.candidates.len() { 0 } else { next };
                self.focus_candidate(ctx, next);
            }
        }
    }

    pub fn focus_prev_candidate(&mut self, ctx: &mut Context<'_>) {
        if self.edit_state == EditState::Empty {
            return;
        }
        self.edit_state = EditState::Selecting;
        let prev = if self.focused_candidate == 0 {
            self.candidates.len().saturating_sub(1)
        } else {
            self.focused_candidate - 1
        };
        self.focus_candidate(ctx, prev);
    }

    /// Show candidate `index` in place of the focused segment, without
    /// leaving the candidate list.
    pub fn focus_candidate(&mut self, ctx: &mut Context<'_>, index: usize) {
        if self.candidates.is_empty() {
            self.edit_state = EditState::Converted;
            return;
        }
        if index >= self.candidates.len() {
            return;
        }
        self.focus_candidate_at(ctx, index, false);
    }

    /// Choose candidate `index` for the focused segment and move on.
    pub fn select_candidate(&mut self, ctx: &mut Context<'_>, index: usize) {
        if index >= self.candidates.len() {
            if self.candidates.is_empty() {
                self.edit_state = EditState::Converted;
            }
            return;
        }

        let size = self.focus_candidate_at(ctx, index, true);
        let len = self.composition.len();
        let mut focused = self.focused_element;

        if self.edit_state == EditState::Selecting && len - focused.min(len) > size {
            focused += size;
        }
        while self
            .composition
            .get(focused)
            .is_some_and(|e| e.is_virtual_space())
        {
            focused += 1;
        }
        self.set_focused_element(focused);
        self.update_candidates_for_focused_element(ctx);
        self.begin_segment_navigation();
    }

    fn insert_char(&mut self, ctx: &mut Context<'_>, ch: char) {
        let kc = ctx.keyconfig();
        let mut composition = mem::take(&mut self.composition);

        let (raw_caret, focus_raw_caret) = {
            let mut session = composing_session(&mut composition, self.caret);
            let caret = self.caret.saturating_sub(session.pre().text_size());
            let mut raw_caret = session.raw_caret_from(kc, caret);

            let mut raw = session.raw_text();
            khiin_core::unicode::insert_char(&mut raw, raw_caret, ch);
            raw_caret += 1;

            let lgram = last_token(session.pre());
            *session = self.match_composition(ctx, lgram.as_ref(), &raw);
            session.set_converted(false);

            (
                raw_caret + session.pre().raw_text_size(),
                focus_after(&session),
            )
        };

        self.composition = composition;
        self.adjust_then_update_caret_and_focus(ctx, raw_caret, focus_raw_caret);
        trace!(
            "insert '{}': '{}' caret {}",
            ch,
            self.composition.text(),
            self.caret
        );
    }

    /// Build the composition for `raw` and refresh the candidates to go
    /// with it, according to the input mode.
    fn match_composition(
        &mut self,
        ctx: &mut Context<'_>,
        lgram: Option<&TaiToken>,
        raw: &str,
    ) -> Buffer {
        match ctx.config.input_mode {
            InputMode::Continuous => {
                self.candidates = ctx.finder().continuous_multi_match(lgram, raw);
                self.candidates.first().cloned().unwrap_or_default()
            }
            InputMode::Basic => {
                self.candidates = ctx.finder().multi_match(lgram, raw);
                match self.candidates.first() {
                    Some(first) => {
                        let mut comp = first.clone();
                        let used = comp.raw_text_size();
                        if khiin_core::unicode::char_len(raw) > used {
                            comp.push(BufferElement::plaintext(
                                khiin_core::unicode::suffix(raw, used),
                            ));
                        }
                        comp
                    }
                    None if raw.is_empty() => Buffer::new(),
                    None => BufferElement::plaintext(raw).into(),
                }
            }
            InputMode::Manual => {
                self.candidates.clear();
                ctx.finder().syllables_only(raw)
            }
        }
    }

    fn erase_converted(&mut self, ctx: &mut Context<'_>, index: usize, pos: usize) {
        let kc = ctx.keyconfig();
        let Some(el) = self.composition.get_mut(index) else {
            return;
        };

        let text = el.converted_text();
        let end = move_caret(&text, pos, CursorDirection::Right);
        let mut remaining: String = text.chars().take(pos).collect();
        remaining.extend(text.chars().skip(end));

        if remaining.is_empty() {
            let raw_caret = self.composition.raw_size_of(0..index);
            self.composition.remove(index);
            self.composition.strip_virtual_spacing();
            self.composition.adjust_virtual_spacing();
            self.set_caret_from_raw(kc, raw_caret);
        } else {
            el.replace_with_plaintext(remaining);
            self.composition.strip_virtual_spacing();
        }

        if self.composition.is_empty() {
            self.clear();
            return;
        }

        self.ensure_caret_and_focus_in_bounds();
        self.update_candidates_for_focused_element(ctx);
    }

    fn erase_composing(&mut self, ctx: &mut Context<'_>, dir: CursorDirection) {
        let kc = ctx.keyconfig();
        let raw_caret = self.composition.raw_caret_from(kc, self.caret);
        let mut composition = mem::take(&mut self.composition);
        let mut skip_space = false;

        let focus_raw_caret = {
            let mut session = composing_session(&mut composition, self.caret);
            let mut pos = self.caret.saturating_sub(session.pre().text_size());
            let mut index = 0;
            while let Some(el) = session.get(index) {
                if pos < el.size() {
                    break;
                }
                pos -= el.size();
                index += 1;
            }

            match session.get_mut(index) {
                Some(el) if el.is_virtual_space_at(pos) && dir == CursorDirection::Right => {
                    skip_space = true;
                }
                Some(el) => {
                    el.erase(kc, pos);
                    if el.size() == 0 {
                        session.remove(index);
                        session.strip_virtual_spacing();
                    }
                }
                None => {}
            }

            if !skip_space {
                let raw = session.raw_text();
                let lgram = last_token(session.pre());
                *session = self.match_composition(ctx, lgram.as_ref(), &raw);
                session.set_converted(false);
            }
            focus_after(&session)
        };

        self.composition = composition;
        if skip_space {
            self.move_caret(ctx, CursorDirection::Right);
            return;
        }
        if self.composition.is_empty() {
            self.clear();
            return;
        }
        self.adjust_then_update_caret_and_focus(ctx, raw_caret, focus_raw_caret);
    }

    fn move_caret(&mut self, ctx: &mut Context<'_>, dir: CursorDirection) {
        let text = self.composition.text();
        self.set_caret(move_caret(&text, self.caret, dir));
        if self.edit_state != EditState::Composing {
            let (element, _) = self.composition.element_at_caret(self.caret);
            self.focus_element(ctx, element);
        }
    }

    fn move_focus_or_caret(&mut self, ctx: &mut Context<'_>, dir: CursorDirection) {
        if self.nav_mode == NavMode::BySegment
            && self.focused_element == 0
            && dir == CursorDirection::Left
        {
            self.nav_mode = NavMode::ByCharacter;
        }

        match self.nav_mode {
            NavMode::BySegment => self.move_focus(ctx, dir),
            NavMode::ByCharacter => self.move_caret(ctx, dir),
        }
    }

    fn move_focus(&mut self, ctx: &mut Context<'_>, dir: CursorDirection) {
        let is_space = |buf: &Buffer, i: usize| buf.get(i).is_some_and(|e| e.is_virtual_space());
        let mut index = self.focused_element;

        match dir {
            CursorDirection::Right => {
                if index + 1 >= self.composition.len() {
                    return;
                }
                index += 1;
                while index + 1 < self.composition.len() && is_space(&self.composition, index) {
                    index += 1;
                }
            }
            CursorDirection::Left => {
                if index == 0 {
                    return;
                }
                index -= 1;
                while index > 0 && is_space(&self.composition, index) {
                    index -= 1;
                }
            }
        }

        self.focus_element(ctx, index);
    }

    fn begin_segment_navigation(&mut self) {
        self.nav_mode = NavMode::BySegment;
        self.edit_state = EditState::Converted;
        self.caret = self.composition.text_size();
    }

    fn focus_element(&mut self, ctx: &mut Context<'_>, index: usize) {
        if index != self.focused_element {
            self.on_focus_element_change(ctx, index);
        }
    }

    fn on_focus_element_change(&mut self, ctx: &mut Context<'_>, index: usize) {
        let mut index = index.min(self.composition.len().saturating_sub(1));
        while index + 1 < self.composition.len()
            && self
                .composition
                .get(index)
                .is_some_and(|e| e.is_virtual_space())
        {
            index += 1;
        }
        self.set_focused_element(index);

        if self.edit_state == EditState::Converted {
            self.update_candidates_for_focused_element(ctx);
        }
    }

    fn update_candidates_for_focused_element(&mut self, ctx: &mut Context<'_>) {
        if self.composition.is_empty() {
            self.candidates.clear();
            return;
        }

        let raw = self.composition.raw_text_from(self.focused_element);
        let lgram = self.focus_lgram();
        self.candidates = ctx.finder().multi_match(lgram.as_ref(), &raw);
        self.set_focused_candidate_to_current();
    }

    /// Token of the word just before the focused element.
    fn focus_lgram(&self) -> Option<TaiToken> {
        let mut index = self.focused_element.checked_sub(1)?;
        if self
            .composition
            .get(index)
            .is_some_and(|e| e.is_virtual_space())
        {
            index = index.checked_sub(1)?;
        }
        self.composition
            .get(index)
            .filter(|e| e.is_tai_text())
            .and_then(|e| e.candidate())
            .cloned()
    }

    fn set_focused_candidate_to_current(&mut self) {
        let current = self.composition.get(self.focused_element);
        let found = self
            .candidates
            .iter()
            .position(|c| c.first().is_some_and(|first| Some(first) == current));

        self.focused_candidate = found.unwrap_or_else(|| {
            trace!("focused element is not among its candidates");
            0
        });
    }

    /// Put candidate `index` in place of the focused element (and as much
    /// of what follows as it covers). Returns the candidate's element count
    /// after khin and spacing.
    fn focus_candidate_at(&mut self, ctx: &mut Context<'_>, index: usize, selected: bool) -> usize {
        let kc = ctx.keyconfig();
        let Some(candidate) = self.candidates.get(index) else {
            return 0;
        };
        let mut candidate = candidate.clone();
        candidate.set_selected(selected);

        let adjusted_size = {
            let mut c = candidate.clone();
            ctx.adjust_khin_and_spacing(&mut c);
            c.len()
        };

        let mut raw_caret = self.composition.raw_caret_from(kc, self.caret);
        let mut composition = mem::take(&mut self.composition);

        let focus_raw_caret = {
            let mut session = EditSession::split_at_element(&mut composition, self.focused_element);
            let candidate_raw = candidate.raw_text_size();
            let (last, _) = session.element_at_raw_caret(candidate_raw);
            let mut end = (last + 1).min(session.len());

            if session.raw_size_of(0..end) > candidate_raw {
                let covered: String = session.elements()[..end].iter().map(|e| e.raw()).collect();
                let mut rest = khiin_core::unicode::suffix(&covered, candidate_raw).to_string();
                let mut finder = ctx.finder();

                while end < session.len() && (rest.is_empty() || !finder.has_exact_match(&rest)) {
                    if let Some(el) = session.get(end) {
                        rest.push_str(&el.raw());
                    }
                    end += 1;
                }

                let lgram = last_token(&candidate);
                let mut tail = finder.continuous_single_match(lgram.as_ref(), &rest);
                if tail.is_empty() && !rest.is_empty() {
                    tail.push(BufferElement::plaintext(rest));
                }
                tail.set_converted(false);
                candidate.append(tail);

                raw_caret = max(
                    raw_caret,
                    candidate.raw_text_size() + session.pre().raw_text_size(),
                );
            }

            let mut next = session.replace(0..end, candidate);
            while let Some(el) = session.get_mut(next) {
                if el.is_selected() {
                    break;
                }
                el.set_converted(false);
                next += 1;
            }
            focus_after(&session)
        };

        self.composition = composition;
        self.focused_candidate = index;
        self.adjust_then_update_caret_and_focus(ctx, raw_caret, focus_raw_caret);
        adjusted_size
    }

    fn adjust_then_update_caret_and_focus(
        &mut self,
        ctx: &mut Context<'_>,
        raw_caret: usize,
        focus_raw_caret: usize,
    ) {
        let kc = ctx.keyconfig();
        let focus_raw_caret = focus_raw_caret.min(self.composition.raw_text_size());
        ctx.adjust_khin_and_spacing(&mut self.composition);
        let (element, _) = self.composition.element_at_raw_caret(focus_raw_caret);
        self.focus_element(ctx, element);
        self.set_caret_from_raw(kc, raw_caret);
    }

    /// Display offset of the focused element.
    fn focused_caret(&self) -> usize {
        let Some(mut end) = self.focused_element.checked_sub(1) else {
            return 0;
        };
        while end > 0
            && self
                .composition
                .get(end)
                .is_some_and(|e| e.is_virtual_space())
        {
            end -= 1;
        }
        self.composition.text_size_of(0..end + 1)
    }

    fn set_caret(&mut self, caret: usize) {
        self.caret = caret.min(self.composition.text_size());
    }

    fn set_caret_from_raw(&mut self, kc: &KeyConfig, raw_caret: usize) {
        let caret = self.composition.caret_from(kc, raw_caret);
        self.set_caret(caret);
    }

    fn set_focused_element(&mut self, index: usize) {
        self.focused_element = index.min(self.composition.len().saturating_sub(1));
    }

    fn ensure_caret_and_focus_in_bounds(&mut self) {
        self.set_caret(self.caret);
        self.set_focused_element(self.focused_element);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use khiin_core::{DictionaryStore, Lexicon};

    struct Fixture {
        config: KhiinConfig,
        keyconfig: KeyConfig,
        dictionary: Dictionary,
        mgr: BufferMgr,
    }

    impl Fixture {
        fn new(config: KhiinConfig) -> Self {
            let keyconfig = KeyConfig::new();
            let parser = SyllableParser::new(&keyconfig, config.dotted_khin);
            let store = DictionaryStore::in_memory(Lexicon::load_demo());
            let dictionary = Dictionary::new(Box::new(store), &parser, &config.base);
            Self {
                config,
                keyconfig,
                dictionary,
                mgr: BufferMgr::new(),
            }
        }

        fn run(&mut self, f: impl FnOnce(&mut BufferMgr, &mut Context<'_>)) {
            let mut ctx = Context::new(&self.config, &self.keyconfig, &mut self.dictionary);
            f(&mut self.mgr, &mut ctx);
        }

        fn type_str(&mut self, s: &str) {
            for ch in s.chars() {
                self.run(|m, ctx| m.insert(ctx, ch));
            }
        }

        fn text(&self) -> String {
            self.mgr.build_preedit().text()
        }

        fn focused(&self) -> Option<usize> {
            self.mgr.get_candidates(&self.config, &self.keyconfig).focused
        }

        fn candidates(&self) -> Vec<String> {
            self.mgr
                .get_candidates(&self.config, &self.keyconfig)
                .values()
                .into_iter()
                .map(str::to_string)
                .collect()
        }
    }

    #[test]
    fn test_insert_composes_syllables() {
        let mut f = Fixture::new(KhiinConfig::default());
        f.type_str("ho2");
        assert_eq!(f.text(), "hó");
        assert_eq!(f.mgr.caret(), 2);
        assert_eq!(f.mgr.edit_state(), EditState::Composing);
        assert_eq!(f.candidates()[0], "好");

        let preedit = f.mgr.build_preedit();
        assert_eq!(preedit.segments.len(), 1);
        assert_eq!(preedit.segments[0].status, SegmentStatus::Composing);
    }

    #[test]
    fn test_insert_multi_syllable_word() {
        let mut f = Fixture::new(KhiinConfig::default());
        f.type_str("tai7chi");
        assert_eq!(f.text(), "tāi chi");
        assert_eq!(f.mgr.caret(), 7);
    }

    #[test]
    fn test_backspace_to_empty() {
        let mut f = Fixture::new(KhiinConfig::default());
        f.type_str("bo");
        f.run(|m, ctx| m.erase(ctx, CursorDirection::Left));
        assert_eq!(f.text(), "b");
        assert_eq!(f.mgr.caret(), 1);
        f.run(|m, ctx| m.erase(ctx, CursorDirection::Left));
        assert_eq!(f.text(), "");
        assert_eq!(f.mgr.edit_state(), EditState::Empty);
    }

    #[test]
    fn test_caret_moves_over_diacritics() {
        let mut f = Fixture::new(KhiinConfig::default());
        f.type_str("chiah8");
        assert_eq!(f.text(), "chia\u{030d}h");
        assert_eq!(f.mgr.caret(), 6);
        f.run(|m, ctx| m.handle_left_right(ctx, CursorDirection::Left));
        assert_eq!(f.mgr.caret(), 5);
        f.run(|m, ctx| m.handle_left_right(ctx, CursorDirection::Left));
        assert_eq!(f.mgr.caret(), 3);
        f.run(|m, ctx| m.handle_left_right(ctx, CursorDirection::Right));
        assert_eq!(f.mgr.caret(), 5);
    }

    #[test]
    fn test_delete_at_end_does_nothing() {
        let mut f = Fixture::new(KhiinConfig::default());
        f.type_str("bo");
        f.run(|m, ctx| m.erase(ctx, CursorDirection::Right));
        assert_eq!(f.text(), "bo");
        f.run(|m, ctx| m.handle_left_right(ctx, CursorDirection::Left));
        f.run(|m, ctx| m.handle_left_right(ctx, CursorDirection::Left));
        f.run(|m, ctx| m.erase(ctx, CursorDirection::Left));
        assert_eq!(f.text(), "bo");
        f.run(|m, ctx| m.erase(ctx, CursorDirection::Right));
        assert_eq!(f.text(), "o");
        assert_eq!(f.mgr.caret(), 0);
    }

    #[test]
    fn test_select_converts_whole_buffer() {
        let mut f = Fixture::new(KhiinConfig::default());
        f.type_str("taichi");
        f.run(|m, ctx| m.handle_select_or_focus(ctx));

        assert_eq!(f.mgr.edit_state(), EditState::Converted);
        assert_eq!(f.text(), "代誌");
        assert!(f.candidates().is_empty());
        let preedit = f.mgr.build_preedit();
        assert!(preedit
            .segments
            .iter()
            .all(|s| s.status != SegmentStatus::Composing));
        assert_eq!(f.mgr.caret(), 2);
    }

    #[test]
    fn test_converted_then_backspace_clears() {
        let mut f = Fixture::new(KhiinConfig::default());
        f.type_str("ho2");
        f.run(|m, ctx| m.handle_select_or_focus(ctx));
        assert_eq!(f.text(), "好");
        f.run(|m, ctx| m.erase(ctx, CursorDirection::Left));
        assert_eq!(f.text(), "");
        assert_eq!(f.mgr.edit_state(), EditState::Empty);
    }

    #[test]
    fn test_focus_cycles_candidates() {
        let mut f = Fixture::new(KhiinConfig::default());
        f.type_str("ho2");
        f.run(|m, ctx| m.focus_next_candidate(ctx));
        assert_eq!(f.mgr.edit_state(), EditState::Selecting);
        assert_eq!(f.text(), "好");

        let count = f.candidates().len();
        assert!(count >= 2);
        f.run(|m, ctx| m.focus_next_candidate(ctx));
        assert_eq!(f.text(), "號");

        f.run(|m, ctx| m.focus_prev_candidate(ctx));
        assert_eq!(f.text(), "好");
        f.run(|m, ctx| m.focus_prev_candidate(ctx));
        assert_eq!(f.mgr.build_preedit().segments.len(), 1);
        assert_eq!(f.focused(), Some(count - 1));
    }

    #[test]
    fn test_revert_steps_back() {
        let mut f = Fixture::new(KhiinConfig::default());
        f.type_str("ho2");
        f.run(|m, ctx| m.handle_select_or_focus(ctx));
        f.run(|m, ctx| m.handle_select_or_focus(ctx));
        assert_eq!(f.mgr.edit_state(), EditState::Selecting);

        f.run(|m, ctx| m.revert(ctx));
        assert_eq!(f.mgr.edit_state(), EditState::Converted);

        f.run(|m, ctx| m.revert(ctx));
        assert_eq!(f.mgr.edit_state(), EditState::Composing);
        assert_eq!(f.text(), "hó");

        f.run(|m, ctx| m.revert(ctx));
        assert_eq!(f.mgr.edit_state(), EditState::Empty);
        assert_eq!(f.text(), "");
    }

    #[test]
    fn test_commit_returns_text_and_clears() {
        let mut f = Fixture::new(KhiinConfig::default());
        f.type_str("ho2");
        f.run(|m, ctx| m.handle_select_or_focus(ctx));
        let mut committed = None;
        f.run(|m, ctx| committed = m.handle_select_or_commit(ctx));
        assert_eq!(committed.as_deref(), Some("好"));
        assert!(f.mgr.is_empty());
        assert_eq!(f.mgr.edit_state(), EditState::Empty);
    }

    #[test]
    fn test_basic_mode_converts_leading_match() {
        let config = KhiinConfig {
            input_mode: InputMode::Basic,
            ..KhiinConfig::default()
        };
        let mut f = Fixture::new(config);
        f.type_str("ho2xx");
        assert_eq!(f.text(), "hó xx");
        assert_eq!(f.mgr.composition().raw_text(), "ho2xx");
        assert_eq!(f.candidates()[0], "好");
    }

    #[test]
    fn test_manual_mode_has_no_candidates() {
        let config = KhiinConfig {
            input_mode: InputMode::Manual,
            ..KhiinConfig::default()
        };
        let mut f = Fixture::new(config);
        f.type_str("ho2bo");
        assert_eq!(f.text(), "hó bo");
        assert!(f.candidates().is_empty());
    }
}
