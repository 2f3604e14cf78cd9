//! khiin-core
//!
//! Language-agnostic machinery shared by the Taiwanese romanization engine
//! (`libkhiin`): prefix trie, frequency-cost splitter, dictionary data,
//! learned n-gram counts, user dictionary and configuration.
//!
//! Public API:
//! - `Trie` - prefix tree with autocomplete and multi-way segmentation
//! - `Splitter` - minimum-cost word segmentation over a ranked vocabulary
//! - `Lexicon` - read-only dictionary data (inputs, conversions, punctuation)
//! - `NGramStore` - learned unigram/bigram counts, in memory or in redb
//! - `Database` - the store interface the engine reads dictionary data through
//! - `UserDictionary` - user-supplied `input output` entries
//! - `TokenCache` - LRU cache for dictionary token lookups
//! - `Preedit` / `CandidateList` - display records for the host
//! - `Config` - configuration shared by language crates
use serde::{Deserialize, Serialize};

pub mod error;
pub use error::{Error, Result};

pub mod unicode;

pub mod trie;
pub use trie::Trie;

pub mod splitter;
pub use splitter::{CostMap, Splitter};

pub mod lexicon;
pub use lexicon::{InputByFreq, Lexicon, Punctuation, TaiToken};

pub mod ngram;
pub use ngram::NGramStore;

pub mod database;
pub use database::{Bigram, Database, DictionaryStore};

pub mod userdict;
pub use userdict::UserDictionary;

pub mod cache;
pub use cache::TokenCache;

pub mod candidate;
pub use candidate::{CandidateItem, CandidateList};

pub mod preedit;
pub use preedit::{EditState, Preedit, PreeditSegment, SegmentStatus};

/// Generic configuration for the composition core.
///
/// Only language-agnostic knobs live here. Romanization and keyboard options
/// belong in `KhiinConfig`, which flattens this struct.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Maximum number of entries in the input -> tokens cache
    pub max_cache_size: usize,

    /// Alternative segmentations offered for continuous input
    pub continuous_candidates: usize,

    /// Maximum number of keys returned by trie autocomplete
    pub autocomplete_limit: usize,

    /// Maximum number of characters autocomplete may extend a prefix by
    pub autocomplete_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_cache_size: 1000,
            continuous_candidates: 5,
            autocomplete_limit: 10,
            autocomplete_depth: 5,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Ok(toml::from_str(&content)?)
    }

    /// Save configuration to a TOML file.
    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| Error::io(path, e))
    }

    /// Load configuration from TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Serialize configuration to TOML string.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.max_cache_size == 0 {
            return Err(Error::InvalidData("max_cache_size must be positive".into()));
        }
        if self.continuous_candidates == 0 {
            return Err(Error::InvalidData(
                "continuous_candidates must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Utility helpers.
pub mod utils {
    /// Normalize input strings (NFC) and trim whitespace.
    pub fn normalize(s: &str) -> String {
        use unicode_normalization::UnicodeNormalization;
        s.nfc().collect::<String>().trim().to_string()
    }
}
