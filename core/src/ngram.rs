//! Learned unigram and bigram counts.
//!
//! Every committed composition contributes one unigram per converted segment
//! and one bigram per adjacent pair of converted segments. Candidate ranking
//! reads the counts back to prefer what the user has chosen before.
//!
//! Two backends share one enum:
//! - `InMemory`: thread-safe map, used by tests and when no profile
//!   directory is configured.
//! - `Redb`: persistent counts in a `redb` database with one table per order.
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

use redb::{ReadableTable, TableDefinition};

use crate::Result;

pub type Bigram = (String, String);

#[derive(Debug, Default)]
struct Counts {
    unigrams: HashMap<String, u32>,
    bigrams: HashMap<Bigram, u32>,
}

/// Thread-safe in-memory n-gram counts.
#[derive(Clone, Debug, Default)]
pub struct InMemoryNGrams {
    inner: Arc<RwLock<Counts>>,
}

impl InMemoryNGrams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_unigrams(&self, grams: &[String]) {
        if let Ok(mut counts) = self.inner.write() {
            for gram in grams {
                let entry = counts.unigrams.entry(gram.clone()).or_insert(0);
                *entry = entry.saturating_add(1);
            }
        }
    }

    pub fn record_bigrams(&self, grams: &[Bigram]) {
        if let Ok(mut counts) = self.inner.write() {
            for gram in grams {
                let entry = counts.bigrams.entry(gram.clone()).or_insert(0);
                *entry = entry.saturating_add(1);
            }
        }
    }

    pub fn unigram_count(&self, gram: &str) -> u32 {
        self.inner
            .read()
            .ok()
            .and_then(|c| c.unigrams.get(gram).copied())
            .unwrap_or(0)
    }

    pub fn bigram_count(&self, lgram: &str, rgram: &str) -> u32 {
        self.inner
            .read()
            .ok()
            .and_then(|c| {
                c.bigrams
                    .get(&(lgram.to_string(), rgram.to_string()))
                    .copied()
            })
            .unwrap_or(0)
    }

    pub fn clear(&self) {
        if let Ok(mut counts) = self.inner.write() {
            counts.unigrams.clear();
            counts.bigrams.clear();
        }
    }
}

/// Redb-backed n-gram counts.
///
/// Each `record_*` call is a single write transaction, so a commit is either
/// fully counted or not at all.
pub struct RedbNGrams {
    db: redb::Database,
    path: std::path::PathBuf,
}

impl std::fmt::Debug for RedbNGrams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbNGrams").field("path", &self.path).finish()
    }
}

impl RedbNGrams {
    const UNIGRAMS: TableDefinition<'static, &'static str, u32> = TableDefinition::new("unigrams");
    const BIGRAMS: TableDefinition<'static, (&'static str, &'static str), u32> =
        TableDefinition::new("bigrams");

    /// Create or open a redb database at `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let db = redb::Database::create(path)?;

        // Create both tables up front so read transactions never miss them
        let write_txn = db.begin_write()?;
        {
            write_txn.open_table(Self::UNIGRAMS)?;
            write_txn.open_table(Self::BIGRAMS)?;
        }
        write_txn.commit()?;

        Ok(Self {
            db,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record_unigrams(&self, grams: &[String]) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(Self::UNIGRAMS)?;
            for gram in grams {
                let current = table.get(gram.as_str())?.map(|v| v.value()).unwrap_or(0);
                table.insert(gram.as_str(), current.saturating_add(1))?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn record_bigrams(&self, grams: &[Bigram]) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(Self::BIGRAMS)?;
            for (lgram, rgram) in grams {
                let key = (lgram.as_str(), rgram.as_str());
                let current = table.get(key)?.map(|v| v.value()).unwrap_or(0);
                table.insert(key, current.saturating_add(1))?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn unigram_count(&self, gram: &str) -> Result<u32> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(Self::UNIGRAMS)?;
        Ok(table.get(gram)?.map(|v| v.value()).unwrap_or(0))
    }

    pub fn bigram_count(&self, lgram: &str, rgram: &str) -> Result<u32> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(Self::BIGRAMS)?;
        Ok(table.get((lgram, rgram))?.map(|v| v.value()).unwrap_or(0))
    }

    pub fn clear(&self) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        write_txn.delete_table(Self::UNIGRAMS)?;
        write_txn.delete_table(Self::BIGRAMS)?;
        {
            write_txn.open_table(Self::UNIGRAMS)?;
            write_txn.open_table(Self::BIGRAMS)?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

/// Backend switch for learned n-gram counts.
#[derive(Debug)]
pub enum NGramStore {
    InMemory(InMemoryNGrams),
    Redb(RedbNGrams),
}

impl Default for NGramStore {
    fn default() -> Self {
        Self::new_in_memory()
    }
}

impl NGramStore {
    pub fn new_in_memory() -> Self {
        NGramStore::InMemory(InMemoryNGrams::new())
    }

    /// Open (or create) a persistent store at `path`.
    pub fn new_redb<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(NGramStore::Redb(RedbNGrams::new(path)?))
    }

    pub fn record_unigrams(&self, grams: &[String]) -> Result<()> {
        if grams.is_empty() {
            return Ok(());
        }
        match self {
            NGramStore::InMemory(m) => {
                m.record_unigrams(grams);
                Ok(())
            }
            NGramStore::Redb(r) => r.record_unigrams(grams),
        }
    }

    pub fn record_bigrams(&self, grams: &[Bigram]) -> Result<()> {
        if grams.is_empty() {
            return Ok(());
        }
        match self {
            NGramStore::InMemory(m) => {
                m.record_bigrams(grams);
                Ok(())
            }
            NGramStore::Redb(r) => r.record_bigrams(grams),
        }
    }

    /// Count for `gram`; storage failures read as zero.
    pub fn unigram_count(&self, gram: &str) -> u32 {
        match self {
            NGramStore::InMemory(m) => m.unigram_count(gram),
            NGramStore::Redb(r) => r.unigram_count(gram).unwrap_or_else(|e| {
                tracing::warn!("unigram lookup failed: {e}");
                0
            }),
        }
    }

    /// Count for the pair `(lgram, rgram)`; storage failures read as zero.
    pub fn bigram_count(&self, lgram: &str, rgram: &str) -> u32 {
        match self {
            NGramStore::InMemory(m) => m.bigram_count(lgram, rgram),
            NGramStore::Redb(r) => r.bigram_count(lgram, rgram).unwrap_or_else(|e| {
                tracing::warn!("bigram lookup failed: {e}");
                0
            }),
        }
    }

    pub fn clear(&self) -> Result<()> {
        match self {
            NGramStore::InMemory(m) => {
                m.clear();
                Ok(())
            }
            NGramStore::Redb(r) => r.clear(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grams(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_in_memory_counts() {
        let store = NGramStore::new_in_memory();
        store.record_unigrams(&grams(&["好", "好", "無"])).unwrap();
        store
            .record_bigrams(&[("好".into(), "無".into())])
            .unwrap();

        assert_eq!(store.unigram_count("好"), 2);
        assert_eq!(store.unigram_count("無"), 1);
        assert_eq!(store.unigram_count("人"), 0);
        assert_eq!(store.bigram_count("好", "無"), 1);
        assert_eq!(store.bigram_count("無", "好"), 0);
    }

    #[test]
    fn test_in_memory_clear() {
        let store = NGramStore::new_in_memory();
        store.record_unigrams(&grams(&["好"])).unwrap();
        store.clear().unwrap();
        assert_eq!(store.unigram_count("好"), 0);
    }

    #[test]
    fn test_in_memory_clones_share_counts() {
        let a = InMemoryNGrams::new();
        let b = a.clone();
        a.record_unigrams(&grams(&["台灣"]));
        assert_eq!(b.unigram_count("台灣"), 1);
    }

    #[test]
    fn test_redb_counts_persist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ngrams.redb");

        {
            let store = NGramStore::new_redb(&path).unwrap();
            store.record_unigrams(&grams(&["好", "好"])).unwrap();
            store
                .record_bigrams(&[("我".into(), "好".into())])
                .unwrap();
        }

        let store = NGramStore::new_redb(&path).unwrap();
        assert_eq!(store.unigram_count("好"), 2);
        assert_eq!(store.bigram_count("我", "好"), 1);
        assert_eq!(store.bigram_count("好", "我"), 0);

        store.clear().unwrap();
        assert_eq!(store.unigram_count("好"), 0);
        assert_eq!(store.bigram_count("我", "好"), 0);
    }
}
