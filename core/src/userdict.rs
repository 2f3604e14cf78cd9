//! User-supplied dictionary entries.
//!
//! The file format is one entry per line: an input key, one or more spaces or
//! tabs, then the output text. A `#` starts a comment that runs to the end of
//! the line. Lines without a separator, or whose input contains non-graphic
//! characters, are skipped.
//!
//! ```text
//! # input   output
//! khiin     起引
//! ktv       卡拉OK
//! ```
use std::path::Path;

use crate::lexicon::TaiToken;
use crate::trie::Trie;
use crate::{Error, Result};

/// Weight given to every user entry, above any dictionary weight.
pub const USER_ITEM_WEIGHT: i32 = 1000;

#[derive(Debug, Clone, Default)]
pub struct UserDictionary {
    entries: Vec<(String, String)>,
    trie: Trie,
}

fn parse_line(line: &str) -> Option<(String, String)> {
    let line = match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    };
    let line = line.trim();

    let sep = line.find([' ', '\t'])?;
    let input = &line[..sep];
    if input.chars().any(|c| !c.is_ascii_graphic() && !c.is_alphanumeric()) {
        return None;
    }

    let output = line[sep..].trim_start_matches([' ', '\t']);
    Some((input.to_string(), output.to_string()))
}

impl UserDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse entries from the text format described in the module docs.
    pub fn parse(content: &str) -> Self {
        let mut dict = Self::new();
        for (input, output) in content.lines().filter_map(parse_line) {
            dict.insert(input, output);
        }
        dict
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let dict = Self::parse(&content);
        tracing::debug!(
            "loaded {} user dictionary entries from {}",
            dict.len(),
            path.display()
        );
        Ok(dict)
    }

    pub fn insert<I: Into<String>, O: Into<String>>(&mut self, input: I, output: O) {
        let input = input.into();
        self.trie.insert(&input);
        self.entries.push((input, output.into()));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn tokens_for(&self, input: &str, input_size: usize, out: &mut Vec<TaiToken>) {
        out.extend(
            self.entries
                .iter()
                .filter(|(key, _)| key == input)
                .map(|(key, output)| TaiToken {
                    custom: true,
                    input: key.clone(),
                    output: output.clone(),
                    weight: USER_ITEM_WEIGHT,
                    input_size,
                    ..TaiToken::default()
                }),
        );
    }

    /// Entries for every stored input that is a prefix of `query`. Each
    /// token's `input_size` is the length of its own input.
    pub fn search(&self, query: &str) -> Vec<TaiToken> {
        let mut tokens = Vec::new();
        for key in self.trie.find_keys(query) {
            self.tokens_for(&key, key.chars().count(), &mut tokens);
        }
        tokens
    }

    /// Entries whose input is exactly `query`.
    pub fn search_exact(&self, query: &str) -> Vec<TaiToken> {
        let mut tokens = Vec::new();
        self.tokens_for(query, query.chars().count(), &mut tokens);
        tokens
    }

    pub fn has_exact(&self, query: &str) -> bool {
        self.trie.has_key(query)
    }

    /// Length of the longest stored input that starts `query`, 0 if none.
    pub fn starts_with_word(&self, query: &str) -> usize {
        self.trie.longest_key_of(query)
    }
}
