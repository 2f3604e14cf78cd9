//! Taiwanese input method engine
//!
//! `Engine` owns the configuration, the key configuration derived from it,
//! the dictionary and the composition state. Hosts drive it one keystroke or
//! command at a time and read back the preedit and candidate list after
//! each call.

use khiin_core::{CandidateList, Database, DictionaryStore, EditState, Lexicon, Preedit, UserDictionary};
use tracing::debug;

use crate::buffer_mgr::{BufferMgr, Context};
use crate::candidate_finder::{Candidate, CandidateFinder};
use crate::config::KhiinConfig;
use crate::dictionary::Dictionary;
use crate::error::Result;
use crate::keyconfig::KeyConfig;
use crate::lomaji::CursorDirection;
use crate::parser::SyllableParser;

#[derive(Debug)]
pub struct Engine {
    config: KhiinConfig,
    keyconfig: KeyConfig,
    dictionary: Dictionary,
    buffer_mgr: BufferMgr,
}

impl Engine {
    /// Build an engine over `database`. Fails when the configuration
    /// assigns an unusable or conflicting key.
    pub fn new(database: Box<dyn Database>, config: KhiinConfig) -> Result<Self> {
        config.base.validate()?;
        let keyconfig = KeyConfig::from_config(&config)?;
        let parser = SyllableParser::new(&keyconfig, config.dotted_khin);
        let dictionary = Dictionary::new(database, &parser, &config.base);
        debug!("engine ready, input mode {:?}", config.input_mode);

        Ok(Self {
            config,
            keyconfig,
            dictionary,
            buffer_mgr: BufferMgr::new(),
        })
    }

    /// An engine over `lexicon` with n-grams kept in memory.
    pub fn in_memory(lexicon: Lexicon, config: KhiinConfig) -> Result<Self> {
        Self::new(Box::new(DictionaryStore::in_memory(lexicon)), config)
    }

    pub fn config(&self) -> &KhiinConfig {
        &self.config
    }

    pub fn keyconfig(&self) -> &KeyConfig {
        &self.keyconfig
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Apply a new configuration. Key bindings and dictionary indexes are
    /// rebuilt and the current composition is dropped.
    pub fn reload(&mut self, config: KhiinConfig) -> Result<()> {
        config.base.validate()?;
        let keyconfig = KeyConfig::from_config(&config)?;
        {
            let parser = SyllableParser::new(&keyconfig, config.dotted_khin);
            self.dictionary.reload(&parser, &config.base);
        }
        self.keyconfig = keyconfig;
        self.config = config;
        self.buffer_mgr.clear();
        debug!("configuration reloaded");
        Ok(())
    }

    pub fn set_user_dictionary(&mut self, userdict: Option<UserDictionary>) {
        self.dictionary.set_user_dictionary(userdict);
        self.buffer_mgr.clear();
    }

    fn with_context<R>(&mut self, f: impl FnOnce(&mut BufferMgr, &mut Context<'_>) -> R) -> R {
        let mut ctx = Context::new(&self.config, &self.keyconfig, &mut self.dictionary);
        f(&mut self.buffer_mgr, &mut ctx)
    }

    pub fn clear(&mut self) {
        self.buffer_mgr.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.buffer_mgr.is_empty()
    }

    pub fn edit_state(&self) -> EditState {
        self.buffer_mgr.edit_state()
    }

    /// The keys typed so far, as the composition holds them.
    pub fn raw_text(&self) -> String {
        self.buffer_mgr.composition().raw_text()
    }

    /// Type one key. Returns `false` when the key is not part of the
    /// input alphabet and the host should handle it.
    pub fn insert(&mut self, ch: char) -> bool {
        let accepted = ch.is_ascii_alphanumeric()
            || ch.is_ascii_punctuation()
            || self.keyconfig.is_hyphen(ch);
        if !accepted {
            return false;
        }
        self.with_context(|mgr, ctx| mgr.insert(ctx, ch));
        true
    }

    /// Backspace (`Left`) or Delete (`Right`). Returns `false` when there
    /// is nothing to edit.
    pub fn erase(&mut self, dir: CursorDirection) -> bool {
        if self.is_empty() {
            return false;
        }
        self.with_context(|mgr, ctx| mgr.erase(ctx, dir));
        true
    }

    pub fn handle_left_right(&mut self, dir: CursorDirection) {
        self.with_context(|mgr, ctx| mgr.handle_left_right(ctx, dir));
    }

    pub fn focus_next_candidate(&mut self) {
        self.with_context(|mgr, ctx| mgr.focus_next_candidate(ctx));
    }

    pub fn focus_prev_candidate(&mut self) {
        self.with_context(|mgr, ctx| mgr.focus_prev_candidate(ctx));
    }

    pub fn focus_candidate(&mut self, index: usize) {
        self.with_context(|mgr, ctx| mgr.focus_candidate(ctx, index));
    }

    pub fn select_candidate(&mut self, index: usize) {
        self.with_context(|mgr, ctx| mgr.select_candidate(ctx, index));
    }

    /// Space key.
    pub fn handle_select_or_focus(&mut self) {
        self.with_context(|mgr, ctx| mgr.handle_select_or_focus(ctx));
    }

    /// Enter key. Returns the committed text, if this committed.
    pub fn handle_select_or_commit(&mut self) -> Option<String> {
        self.with_context(|mgr, ctx| mgr.handle_select_or_commit(ctx))
    }

    pub fn commit(&mut self) -> String {
        self.with_context(|mgr, ctx| mgr.commit(ctx))
    }

    pub fn revert(&mut self) {
        self.with_context(|mgr, ctx| mgr.revert(ctx));
    }

    pub fn build_preedit(&self) -> Preedit {
        self.buffer_mgr.build_preedit()
    }

    pub fn get_candidates(&self) -> CandidateList {
        self.buffer_mgr.get_candidates(&self.config, &self.keyconfig)
    }

    /// Dictionary words typed at the start of `raw`.
    pub fn find_candidates(&mut self, raw: &str, lgram: &str, fuzzy: bool) -> Vec<Candidate> {
        self.finder().find_candidates(raw, lgram, fuzzy)
    }

    /// Best greedy reading of the whole of `raw`.
    pub fn primary_candidate(&mut self, raw: &str, lgram: &str, fuzzy: bool) -> Candidate {
        self.finder().find_primary_candidate(raw, lgram, fuzzy)
    }

    fn finder(&mut self) -> CandidateFinder<'_, '_> {
        CandidateFinder::new(
            &mut self.dictionary,
            SyllableParser::new(&self.keyconfig, self.config.dotted_khin),
            self.config.base.continuous_candidates,
        )
    }
}
