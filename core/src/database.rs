//! The dictionary store the composition engine reads from.
//!
//! `Database` is the narrow interface the engine consumes: frequency-ranked
//! inputs, conversions, syllables, punctuation and learned n-gram counts,
//! plus a single write path for recording committed text.
//! `DictionaryStore` is the default implementation over a `Lexicon` and an
//! `NGramStore`.

use crate::lexicon::{InputByFreq, Lexicon, Punctuation, TaiToken};
use crate::ngram::NGramStore;
use crate::Result;

pub use crate::ngram::Bigram;

pub trait Database {
    /// All dictionary inputs, most frequent first.
    fn all_words_by_frequency(&self) -> Vec<InputByFreq>;

    /// Conversions of one input id.
    fn conversions_by_input_id(&self, input_id: u32) -> Vec<TaiToken>;

    /// Conversions of every input in `inputs`, in the order given.
    fn lookup_by_keys(&self, inputs: &[&str]) -> Vec<TaiToken>;

    /// The syllable inventory, in romanized form.
    fn syllables(&self) -> Vec<String>;

    fn punctuation(&self) -> Vec<Punctuation>;

    fn unigram_count(&self, gram: &str) -> u32;

    fn bigram_count(&self, lgram: &str, rgram: &str) -> u32;

    /// Record one commit worth of n-grams.
    fn record_ngrams(&self, unigrams: &[String], bigrams: &[Bigram]) -> Result<()>;

    fn clear_ngrams(&self) -> Result<()>;

    /// Fill in `unigram_count` and, when `lgram` is given, `bigram_count`
    /// for each token's output.
    fn add_ngrams_data(&self, lgram: Option<&str>, tokens: &mut [TaiToken]) {
        for token in tokens.iter_mut() {
            token.unigram_count = self.unigram_count(&token.output);
            token.bigram_count = match lgram {
                Some(lgram) if !lgram.is_empty() => self.bigram_count(lgram, &token.output),
                _ => 0,
            };
        }
    }
}

/// Default store: static dictionary data plus learned counts.
#[derive(Debug, Default)]
pub struct DictionaryStore {
    lexicon: Lexicon,
    ngrams: NGramStore,
}

impl DictionaryStore {
    pub fn new(lexicon: Lexicon, ngrams: NGramStore) -> Self {
        Self { lexicon, ngrams }
    }

    /// A store over `lexicon` with in-memory counts.
    pub fn in_memory(lexicon: Lexicon) -> Self {
        Self::new(lexicon, NGramStore::new_in_memory())
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn ngrams(&self) -> &NGramStore {
        &self.ngrams
    }
}

impl Database for DictionaryStore {
    fn all_words_by_frequency(&self) -> Vec<InputByFreq> {
        self.lexicon.inputs_by_frequency()
    }

    fn conversions_by_input_id(&self, input_id: u32) -> Vec<TaiToken> {
        self.lexicon.conversions(input_id)
    }

    fn lookup_by_keys(&self, inputs: &[&str]) -> Vec<TaiToken> {
        inputs
            .iter()
            .filter_map(|input| self.lexicon.input_id(input))
            .flat_map(|id| self.lexicon.conversions(id))
            .collect()
    }

    fn syllables(&self) -> Vec<String> {
        self.lexicon.syllables().to_vec()
    }

    fn punctuation(&self) -> Vec<Punctuation> {
        self.lexicon.punctuation().to_vec()
    }

    fn unigram_count(&self, gram: &str) -> u32 {
        self.ngrams.unigram_count(gram)
    }

    fn bigram_count(&self, lgram: &str, rgram: &str) -> u32 {
        self.ngrams.bigram_count(lgram, rgram)
    }

    fn record_ngrams(&self, unigrams: &[String], bigrams: &[Bigram]) -> Result<()> {
        tracing::debug!(
            unigrams = unigrams.len(),
            bigrams = bigrams.len(),
            "recording n-grams"
        );
        self.ngrams.record_unigrams(unigrams)?;
        self.ngrams.record_bigrams(bigrams)
    }

    fn clear_ngrams(&self) -> Result<()> {
        self.ngrams.clear()
    }
}
