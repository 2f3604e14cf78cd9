//! Typed-key index over the dictionary store.
//!
//! Every dictionary input is expanded into the key sequences a user can type
//! for it ("tāi-chì" gives "tai7chi3", "taichi", ...). The expanded keys feed
//! a word trie for prefix queries, a frequency-cost splitter for
//! segmentation, and a key -> input id map for token lookup. Token lookups
//! go through an LRU cache that is dropped on `reload`.

use std::collections::{HashMap, HashSet};

use khiin_core::unicode::{char_len, prefix, suffix};
use khiin_core::{Database, Punctuation, Splitter, TaiToken, TokenCache, Trie, UserDictionary};

use crate::buffer::Buffer;
use crate::error::Result;
use crate::keyconfig::KeyConfig;
use crate::parser::SyllableParser;

pub struct Dictionary {
    database: Box<dyn Database>,
    userdict: Option<UserDictionary>,
    input_ids: HashMap<String, Vec<u32>>,
    user_inputs: Vec<String>,
    fuzzy_only: HashSet<String>,
    word_trie: Trie,
    syllable_trie: Trie,
    splitter: Splitter,
    punctuation: Vec<Punctuation>,
    cache: TokenCache,
    autocomplete_limit: usize,
    autocomplete_depth: usize,
}

impl std::fmt::Debug for Dictionary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dictionary")
            .field("inputs", &self.user_inputs.len())
            .field("punctuation", &self.punctuation.len())
            .field("userdict", &self.userdict.as_ref().map(|u| u.len()))
            .field("cache", &self.cache)
            .finish()
    }
}

impl Dictionary {
    pub fn new(
        database: Box<dyn Database>,
        parser: &SyllableParser<'_>,
        config: &khiin_core::Config,
    ) -> Self {
        let mut dict = Self {
            database,
            userdict: None,
            input_ids: HashMap::new(),
            user_inputs: Vec::new(),
            fuzzy_only: HashSet::new(),
            word_trie: Trie::new(),
            syllable_trie: Trie::new(),
            splitter: Splitter::default(),
            punctuation: Vec::new(),
            cache: TokenCache::new(config.max_cache_size),
            autocomplete_limit: config.autocomplete_limit,
            autocomplete_depth: config.autocomplete_depth,
        };
        dict.build_indexes(parser);
        dict
    }

    /// Rebuild every index, for a changed key configuration, and drop the
    /// token cache.
    pub fn reload(&mut self, parser: &SyllableParser<'_>, config: &khiin_core::Config) {
        self.cache = TokenCache::new(config.max_cache_size);
        self.autocomplete_limit = config.autocomplete_limit;
        self.autocomplete_depth = config.autocomplete_depth;
        self.build_indexes(parser);
    }

    fn build_indexes(&mut self, parser: &SyllableParser<'_>) {
        self.input_ids.clear();
        self.user_inputs.clear();
        self.fuzzy_only.clear();
        let mut seen = HashSet::new();
        let mut strict = HashSet::new();

        for row in self.database.all_words_by_frequency() {
            for seq in parser.as_input_sequences(&row.input) {
                let ids = self.input_ids.entry(seq.input.clone()).or_default();
                if !ids.contains(&row.id) {
                    ids.push(row.id);
                }
                if seq.fuzzy {
                    self.fuzzy_only.insert(seq.input.clone());
                } else {
                    strict.insert(seq.input.clone());
                }
                if seen.insert(seq.input.clone()) {
                    self.user_inputs.push(seq.input);
                }
            }
        }

        self.fuzzy_only.retain(|key| !strict.contains(key));
        self.word_trie = Trie::from_keys(&self.user_inputs);

        self.syllable_trie = Trie::new();
        for syl in self.database.syllables() {
            for seq in parser.as_input_sequences(&syl) {
                self.syllable_trie.insert(&seq.input);
            }
        }

        self.splitter = Splitter::new(&self.user_inputs);
        self.punctuation = self.database.punctuation();

        tracing::debug!(
            "indexed {} typed keys for {} dictionary inputs",
            self.user_inputs.len(),
            self.input_ids.values().flatten().collect::<HashSet<_>>().len()
        );
    }

    pub fn set_user_dictionary(&mut self, userdict: Option<UserDictionary>) {
        self.userdict = userdict;
    }

    pub fn user_dictionary(&self) -> Option<&UserDictionary> {
        self.userdict.as_ref()
    }

    pub fn database(&self) -> &dyn Database {
        self.database.as_ref()
    }

    pub fn word_splitter(&self) -> &Splitter {
        &self.splitter
    }

    /// Typed keys, most frequent word first.
    pub fn all_inputs_by_freq(&self) -> &[String] {
        &self.user_inputs
    }

    pub fn starts_with_word(&self, query: &str) -> bool {
        self.word_trie.starts_with_key(query)
    }

    pub fn starts_with_syllable(&self, query: &str) -> bool {
        self.syllable_trie.starts_with_key(query)
    }

    /// Whether `query` is a syllable or the start of one. A trailing tone
    /// key is ignored.
    pub fn is_syllable_prefix(&self, kc: &KeyConfig, query: &str) -> bool {
        let Some(last) = query.chars().last() else {
            return false;
        };

        let query = if kc.check_tone_key(last).needs_diacritic() {
            prefix(query, char_len(query) - 1)
        } else {
            query
        };
        self.syllable_trie.has_key_or_prefix(query)
    }

    pub fn is_word_prefix(&self, query: &str) -> bool {
        self.word_trie.has_key_or_prefix(query)
    }

    pub fn is_word(&self, query: &str) -> bool {
        self.word_trie.has_key(query)
    }

    /// Conversions of the words typed exactly as `query`.
    pub fn word_search(&mut self, query: &str) -> Vec<TaiToken> {
        self.tokens_for(query)
    }

    /// Typed keys that are a prefix of `query`, shortest first. Keys that
    /// only exist as toneless fallbacks are left out unless `fuzzy` is set.
    pub fn prefix_keys(&self, query: &str, fuzzy: bool) -> Vec<String> {
        let mut keys = self.word_trie.find_keys(query);
        if !fuzzy {
            keys.retain(|key| !self.fuzzy_only.contains(key));
        }
        keys
    }

    /// Conversions of words whose keys start with `query`, shortest first.
    pub fn autocomplete(&mut self, query: &str) -> Vec<TaiToken> {
        let keys = self
            .word_trie
            .autocomplete(query, self.autocomplete_limit, self.autocomplete_depth);
        keys.iter().flat_map(|key| self.tokens_for(key)).collect()
    }

    /// Conversions of every word whose keys are a prefix of `query`.
    pub fn all_words_from_start(&mut self, query: &str) -> Vec<TaiToken> {
        let keys = self.word_trie.find_keys(query);
        keys.iter().flat_map(|key| self.tokens_for(key)).collect()
    }

    /// The `limit` cheapest ways to split `query` into typed words. The
    /// pieces keep the casing of `query`.
    pub fn segment(&self, query: &str, limit: usize) -> Vec<Vec<String>> {
        let lower = query.to_lowercase();
        self.word_trie
            .multisplit(&lower, self.splitter.cost_map(), limit)
            .into_iter()
            .map(|offsets| {
                let mut start = 0;
                offsets
                    .into_iter()
                    .map(|end| {
                        let piece = suffix(prefix(query, end), start).to_string();
                        start = end;
                        piece
                    })
                    .collect()
            })
            .collect()
    }

    pub fn search_punctuation(&self, query: &str) -> Vec<Punctuation> {
        self.punctuation
            .iter()
            .filter(|p| p.input == query)
            .cloned()
            .collect()
    }

    /// Record the converted syllable runs of a committed buffer: each one
    /// as a unigram and each adjacent pair (across virtual spaces) as a
    /// bigram.
    pub fn record_ngrams(&self, buffer: &Buffer) -> Result<()> {
        let grams: Vec<Option<String>> = buffer
            .iter()
            .filter(|e| !e.is_virtual_space())
            .map(|e| (e.is_tai_text() && e.is_converted()).then(|| e.converted_text()))
            .collect();

        let unigrams: Vec<String> = grams.iter().flatten().cloned().collect();
        let bigrams: Vec<(String, String)> = grams
            .windows(2)
            .filter_map(|pair| match pair {
                [Some(lhs), Some(rhs)] => Some((lhs.clone(), rhs.clone())),
                _ => None,
            })
            .collect();

        if unigrams.is_empty() {
            return Ok(());
        }

        tracing::trace!("recording {} unigrams, {} bigrams", unigrams.len(), bigrams.len());
        self.database.record_ngrams(&unigrams, &bigrams)?;
        Ok(())
    }

    pub fn add_ngrams_data(&self, lgram: Option<&str>, tokens: &mut [TaiToken]) {
        self.database.add_ngrams_data(lgram, tokens);
    }

    /// (hits, misses) of the token cache.
    pub fn cache_stats(&self) -> (usize, usize) {
        self.cache.stats()
    }

    fn tokens_for(&mut self, key: &str) -> Vec<TaiToken> {
        let Some(ids) = self.input_ids.get(key) else {
            return Vec::new();
        };

        let database = &self.database;
        let input_size = char_len(key);
        self.cache.get_or_insert_with(key, || {
            ids.iter()
                .flat_map(|&id| database.conversions_by_input_id(id))
                .map(|mut token| {
                    token.input_size = input_size;
                    token
                })
                .collect()
        })
    }
}
