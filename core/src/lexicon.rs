//! Read-only dictionary data for the composition engine.
//!
//! A `Lexicon` holds the romanized dictionary inputs in descending frequency
//! order, the script conversions of each input, the syllable inventory and
//! the punctuation table. It is the data behind the default `Database`
//! implementation and can be (de)serialized with `bincode` for deployment or
//! with `serde_json` for small fixtures.
//!
//! Input ids are 1-based positions in frequency order and are stable for a
//! given lexicon file.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::{Error, Result};

/// A dictionary conversion as handed to the engine, with ranking data
/// attached by the candidate search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaiToken {
    /// True for entries coming from the user dictionary
    pub custom: bool,
    pub chhan_id: u32,
    pub input_id: u32,
    /// Romanized dictionary input (e.g. "hó")
    pub input: String,
    /// Converted output (e.g. "好")
    pub output: String,
    pub weight: i32,
    pub category: i32,
    pub annotation: String,

    /// Number of raw codepoints this token was matched against
    pub input_size: usize,
    pub bigram_count: u32,
    pub unigram_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Punctuation {
    pub id: u32,
    pub input: String,
    pub output: String,
    #[serde(default)]
    pub annotation: String,
}

/// One row of the frequency-ordered input table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputByFreq {
    pub id: u32,
    pub input: String,
}

/// A single conversion of a dictionary input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LexiconEntry {
    pub id: u32,
    pub output: String,
    pub weight: i32,
    pub category: i32,
    pub annotation: String,
}

impl LexiconEntry {
    pub fn new<T: Into<String>>(output: T, weight: i32) -> Self {
        Self {
            output: output.into(),
            weight,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct InputRow {
    input: String,
    #[serde(default)]
    conversions: Vec<LexiconEntry>,
}

/// In-memory dictionary data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Lexicon {
    #[serde(default)]
    inputs: Vec<InputRow>,
    #[serde(default)]
    syllables: Vec<String>,
    #[serde(default)]
    punctuation: Vec<Punctuation>,

    #[serde(skip)]
    index: HashMap<String, u32>,
    #[serde(skip)]
    next_conversion_id: u32,
}

impl Lexicon {
    /// Create an empty lexicon.
    pub fn new() -> Self {
        Self {
            next_conversion_id: 1,
            ..Self::default()
        }
    }

    /// Insert a conversion for `input`.
    ///
    /// Inputs are ranked in first-insertion order, so callers insert the most
    /// frequent words first. Returns the input id.
    pub fn insert<K: Into<String>, T: Into<String>>(
        &mut self,
        input: K,
        output: T,
        weight: i32,
    ) -> u32 {
        self.insert_entry(input, LexiconEntry::new(output, weight))
    }

    /// Insert a fully specified conversion for `input`. An `id` of 0 is
    /// replaced by the next free conversion id.
    pub fn insert_entry<K: Into<String>>(&mut self, input: K, mut entry: LexiconEntry) -> u32 {
        let input = input.into();
        if entry.id == 0 {
            entry.id = self.next_conversion_id.max(1);
        }
        self.next_conversion_id = self.next_conversion_id.max(entry.id + 1);

        let id = match self.index.get(&input) {
            Some(&id) => id,
            None => {
                self.inputs.push(InputRow {
                    input: input.clone(),
                    conversions: Vec::new(),
                });
                let id = self.inputs.len() as u32;
                self.index.insert(input, id);
                id
            }
        };

        self.inputs[(id - 1) as usize].conversions.push(entry);
        id
    }

    pub fn add_syllable<S: Into<String>>(&mut self, syllable: S) {
        self.syllables.push(syllable.into());
    }

    pub fn add_punctuation<I: Into<String>, O: Into<String>>(&mut self, input: I, output: O) {
        let id = self.punctuation.len() as u32 + 1;
        self.punctuation.push(Punctuation {
            id,
            input: input.into(),
            output: output.into(),
            annotation: String::new(),
        });
    }

    /// All inputs, most frequent first.
    pub fn inputs_by_frequency(&self) -> Vec<InputByFreq> {
        self.inputs
            .iter()
            .enumerate()
            .map(|(i, row)| InputByFreq {
                id: i as u32 + 1,
                input: row.input.clone(),
            })
            .collect()
    }

    pub fn input_id(&self, input: &str) -> Option<u32> {
        self.index.get(input).copied()
    }

    /// Conversions of one input id, in insertion order.
    pub fn conversions(&self, input_id: u32) -> Vec<TaiToken> {
        let Some(row) = input_id
            .checked_sub(1)
            .and_then(|i| self.inputs.get(i as usize))
        else {
            return Vec::new();
        };

        row.conversions
            .iter()
            .map(|c| TaiToken {
                chhan_id: c.id,
                input_id,
                input: row.input.clone(),
                output: c.output.clone(),
                weight: c.weight,
                category: c.category,
                annotation: c.annotation.clone(),
                ..TaiToken::default()
            })
            .collect()
    }

    pub fn syllables(&self) -> &[String] {
        &self.syllables
    }

    pub fn punctuation(&self) -> &[Punctuation] {
        &self.punctuation
    }

    /// Number of distinct inputs.
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Rebuild the skipped lookup fields after deserialization.
    fn reindex(mut self) -> Result<Self> {
        self.index.clear();
        let mut next_id = 1;

        for (i, row) in self.inputs.iter_mut().enumerate() {
            if self.index.insert(row.input.clone(), i as u32 + 1).is_some() {
                return Err(Error::InvalidData(format!(
                    "duplicate lexicon input '{}'",
                    row.input
                )));
            }
            for c in row.conversions.iter_mut() {
                next_id = next_id.max(c.id + 1);
            }
        }

        for row in self.inputs.iter_mut() {
            for c in row.conversions.iter_mut().filter(|c| c.id == 0) {
                c.id = next_id;
                next_id += 1;
            }
        }

        self.next_conversion_id = next_id;
        Ok(self)
    }

    /// Parse a lexicon from its JSON form.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let lexicon: Self = serde_json::from_str(content)?;
        lexicon.reindex()
    }

    /// Load a lexicon from a JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_json_str(&content)
    }

    /// Save the lexicon to a file using bincode serialization.
    pub fn save_bincode<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| Error::io(path, e))?;
        let writer = BufWriter::new(file);
        bincode::serialize_into(writer, self)?;
        Ok(())
    }

    /// Load the lexicon from a bincode file produced by `save_bincode`.
    pub fn load_bincode<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        let reader = BufReader::new(file);
        let lexicon: Self = bincode::deserialize_from(reader)?;
        lexicon.reindex()
    }

    /// A handful of everyday words for smoke-testing and the demo CLI.
    pub fn load_demo() -> Self {
        let mut lx = Self::new();
        for (input, outputs) in [
            ("ê", &[("的", 900), ("个", 100)][..]),
            ("sī", &[("是", 900)]),
            ("góa", &[("我", 900)]),
            ("lí", &[("你", 900), ("理", 300)]),
            ("hó", &[("好", 900), ("號", 200)]),
            ("bô", &[("無", 900)]),
            ("a", &[("仔", 500), ("阿", 400)]),
            ("tâi-oân", &[("台灣", 900)]),
            ("tâi", &[("台", 800)]),
            ("oân", &[("員", 200)]),
            ("chi", &[("支", 300)]),
            ("tāi-chì", &[("代誌", 800)]),
            ("lâng", &[("人", 900)]),
            ("gâu", &[("𠢕", 500)]),
            ("chá", &[("早", 700)]),
            ("chia̍h", &[("食", 800)]),
        ] {
            for (output, weight) in outputs {
                lx.insert(input, *output, *weight);
            }
        }

        for syl in [
            "a", "ê", "sī", "góa", "lí", "hó", "bô", "tâi", "oân", "chi", "tāi", "chì", "lâng",
            "gâu", "chá", "chia̍h", "ho", "bo", "tai", "lang",
        ] {
            lx.add_syllable(syl);
        }

        for (input, output) in [(".", "。"), (",", "，"), ("?", "？"), ("!", "！")] {
            lx.add_punctuation(input, output);
        }
        lx
    }
}
