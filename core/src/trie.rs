/// Prefix trie over romanized input keys.
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::hash::BuildHasher;

/// Longest query `multisplit` will consider; split points are stored as bits
/// of a `u64`.
pub const MAX_SPLIT_LEN: usize = 63;

/// A prefix tree of input keys (e.g. "tai", "taichi", "ho2").
///
/// Used for dictionary word lookup, syllable prefix checks and n-best
/// segmentation of continuous input.
///
/// # Example
/// ```
/// use khiin_core::trie::Trie;
///
/// let mut trie = Trie::new();
/// trie.insert("ho");
/// trie.insert("hobo");
///
/// assert!(trie.has_key("ho"));
/// assert!(!trie.has_key("hob"));
/// assert!(trie.has_key_or_prefix("hob"));
/// assert_eq!(trie.find_keys("hobox"), vec!["ho".to_string(), "hobo".to_string()]);
/// ```
#[derive(Debug, Default, Clone)]
pub struct Trie {
    root: Node,
}

#[derive(Debug, Default, Clone)]
struct Node {
    children: BTreeMap<char, Node>,
    is_end: bool,
}

#[derive(Debug, Clone, Copy)]
struct SplitCost {
    split: u64,
    cost: f32,
}

/// `list` is kept sorted by ascending cost and never grows past `limit`.
fn save_if_cheaper(list: &mut Vec<SplitCost>, limit: usize, split: u64, cost: f32) {
    if list.len() < limit {
        list.push(SplitCost { split, cost });
    } else if let Some(worst) = list.last_mut() {
        if cost < worst.cost {
            *worst = SplitCost { split, cost };
        } else {
            return;
        }
    } else {
        return;
    }
    list.sort_by(|a, b| a.cost.total_cmp(&b.cost));
}

fn bit_positions(mut bits: u64) -> Vec<usize> {
    let mut out = Vec::with_capacity(bits.count_ones() as usize);
    while bits != 0 {
        let pos = bits.trailing_zeros() as usize;
        out.push(pos);
        bits &= bits - 1;
    }
    out
}

impl Trie {
    /// Create an empty trie.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a trie from a list of keys.
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut trie = Self::new();
        for key in keys {
            trie.insert(key.as_ref());
        }
        trie
    }

    pub fn insert(&mut self, key: &str) {
        let mut node = &mut self.root;
        for ch in key.chars() {
            node = node.children.entry(ch).or_default();
        }
        node.is_end = true;
    }

    /// Remove `key`, pruning branches left without any key.
    ///
    /// Returns `false` if `key` was not stored.
    ///
    /// # Example
    /// ```
    /// use khiin_core::trie::Trie;
    ///
    /// let mut trie = Trie::from_keys(["a", "abc"]);
    /// assert!(trie.remove("abc"));
    /// assert!(!trie.has_key_or_prefix("ab"));
    /// assert!(trie.has_key("a"));
    /// assert!(!trie.remove("abc"));
    /// ```
    pub fn remove(&mut self, key: &str) -> bool {
        fn remove_rec(node: &mut Node, key: &[char]) -> bool {
            match key.split_first() {
                None => {
                    let found = node.is_end;
                    node.is_end = false;
                    found
                }
                Some((ch, rest)) => {
                    let Some(child) = node.children.get_mut(ch) else {
                        return false;
                    };
                    let removed = remove_rec(child, rest);
                    if removed && !child.is_end && child.children.is_empty() {
                        node.children.remove(ch);
                    }
                    removed
                }
            }
        }

        let chars: Vec<char> = key.chars().collect();
        remove_rec(&mut self.root, &chars)
    }

    fn find(&self, query: &str) -> Option<&Node> {
        let mut node = &self.root;
        for ch in query.chars() {
            node = node.children.get(&ch)?;
        }
        Some(node)
    }

    /// `query` is a stored key.
    pub fn has_key(&self, query: &str) -> bool {
        self.find(query).is_some_and(|n| n.is_end)
    }

    /// `query` is a stored key or the prefix of one.
    pub fn has_key_or_prefix(&self, query: &str) -> bool {
        self.find(query)
            .is_some_and(|n| n.is_end || !n.children.is_empty())
    }

    /// Some non-empty prefix of `query` is a stored key.
    pub fn starts_with_key(&self, query: &str) -> bool {
        if query.is_empty() {
            return false;
        }

        let mut node = &self.root;
        for ch in query.chars() {
            if node.is_end {
                return true;
            }
            match node.children.get(&ch) {
                Some(child) => node = child,
                None => return false,
            }
        }
        node.is_end
    }

    /// Length in codepoints of the longest stored key that prefixes `query`,
    /// or 0 if there is none.
    pub fn longest_key_of(&self, query: &str) -> usize {
        let mut longest = 0;
        let mut node = &self.root;
        for (i, ch) in query.chars().enumerate() {
            match node.children.get(&ch) {
                Some(child) => node = child,
                None => break,
            }
            if node.is_end {
                longest = i + 1;
            }
        }
        longest
    }

    /// Keys beginning with `prefix`, in breadth-first order (shorter keys
    /// first).
    ///
    /// Stops after `limit` keys; `limit == 0` means unbounded. `max_depth`
    /// bounds the number of characters added to `prefix`; 0 means unbounded.
    pub fn autocomplete(&self, prefix: &str, limit: usize, max_depth: usize) -> Vec<String> {
        let mut out = Vec::new();
        let Some(start) = self.find(prefix) else {
            return out;
        };

        let full = |out: &Vec<String>| limit != 0 && out.len() >= limit;

        if start.is_end {
            out.push(prefix.to_string());
            if full(&out) {
                return out;
            }
        }

        let mut queue: VecDeque<(String, &Node)> = start
            .children
            .iter()
            .map(|(ch, node)| (ch.to_string(), node))
            .collect();

        while let Some((suffix, node)) = queue.pop_front() {
            if node.is_end {
                out.push(format!("{prefix}{suffix}"));
                if full(&out) {
                    return out;
                }
            }

            if max_depth != 0 && suffix.chars().count() >= max_depth {
                continue;
            }

            for (ch, child) in &node.children {
                let mut next = suffix.clone();
                next.push(*ch);
                queue.push_back((next, child));
            }
        }

        out
    }

    /// Every prefix of `query` that is a stored key, shortest first.
    pub fn find_keys(&self, query: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut node = &self.root;
        for (idx, ch) in query.char_indices() {
            match node.children.get(&ch) {
                Some(child) => node = child,
                None => break,
            }
            if node.is_end {
                out.push(query[..idx + ch.len_utf8()].to_string());
            }
        }
        out
    }

    /// The `limit` cheapest ways to split `query` into stored keys.
    ///
    /// Each result is the ascending list of split offsets (codepoint
    /// positions where a key ends). Only keys present in `cost_map`
    /// participate. Queries longer than [`MAX_SPLIT_LEN`] are truncated.
    /// If the whole query cannot be covered, results for the longest
    /// coverable prefix are returned; if nothing can be covered the result
    /// is empty.
    ///
    /// # Example
    /// ```
    /// use std::collections::HashMap;
    /// use khiin_core::trie::Trie;
    ///
    /// let trie = Trie::from_keys(["ho", "bo", "hobo"]);
    /// let costs = HashMap::from([
    ///     ("ho".to_string(), 1.0),
    ///     ("bo".to_string(), 1.0),
    ///     ("hobo".to_string(), 1.5),
    /// ]);
    /// let splits = trie.multisplit("hobo", &costs, 5);
    /// assert_eq!(splits, vec![vec![4], vec![2, 4]]);
    /// ```
    pub fn multisplit<S: BuildHasher>(
        &self,
        query: &str,
        cost_map: &HashMap<String, f32, S>,
        limit: usize,
    ) -> Vec<Vec<usize>> {
        if limit == 0 {
            return Vec::new();
        }

        let chars: Vec<char> = query.chars().take(MAX_SPLIT_LEN).collect();
        let len = chars.len();

        let mut table: Vec<Vec<SplitCost>> = vec![Vec::new(); len + 1];
        table[0].push(SplitCost {
            split: 0,
            cost: 0.0,
        });

        for start in 0..len {
            if table[start].is_empty() {
                continue;
            }

            let mut node = &self.root;
            let mut word = String::new();

            for end in start..len {
                let ch = chars[end];
                match node.children.get(&ch) {
                    Some(child) => node = child,
                    None => break,
                }
                word.push(ch);

                if !node.is_end {
                    continue;
                }

                let Some(&word_cost) = cost_map.get(&word) else {
                    continue;
                };

                let split_at = end + 1;
                let extended: Vec<SplitCost> = table[start]
                    .iter()
                    .map(|r| SplitCost {
                        split: r.split | (1u64 << split_at),
                        cost: r.cost + word_cost,
                    })
                    .collect();

                for r in extended {
                    save_if_cheaper(&mut table[split_at], limit, r.split, r.cost);
                }
            }
        }

        table
            .iter()
            .skip(1)
            .rev()
            .find(|row| !row.is_empty())
            .map(|row| {
                row.iter()
                    .take(limit)
                    .map(|r| bit_positions(r.split))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn costs(words: &[(&str, f32)]) -> HashMap<String, f32> {
        words.iter().map(|(w, c)| (w.to_string(), *c)).collect()
    }

    #[test]
    fn test_basic_insert_and_has_key() {
        let trie = Trie::from_keys(["tai", "taichi", "chi"]);

        assert!(trie.has_key("tai"));
        assert!(trie.has_key("taichi"));
        assert!(!trie.has_key("ta"));
        assert!(!trie.has_key("taic"));
        assert!(trie.has_key_or_prefix("taic"));
        assert!(!trie.has_key_or_prefix("x"));
    }

    #[test]
    fn test_starts_with_key() {
        let trie = Trie::from_keys(["ho"]);
        assert!(trie.starts_with_key("ho"));
        assert!(trie.starts_with_key("hobo"));
        assert!(!trie.starts_with_key("h"));
        assert!(!trie.starts_with_key(""));
    }

    #[test]
    fn test_longest_key_of() {
        let trie = Trie::from_keys(["a", "ab", "abcd"]);
        assert_eq!(trie.longest_key_of("abc"), 2);
        assert_eq!(trie.longest_key_of("abcd"), 4);
        assert_eq!(trie.longest_key_of("abcde"), 4);
        assert_eq!(trie.longest_key_of("x"), 0);
        assert_eq!(trie.longest_key_of(""), 0);
    }

    #[test]
    fn test_remove_keeps_shared_prefixes() {
        let mut trie = Trie::from_keys(["ho", "hobo", "hong"]);
        assert!(trie.remove("hobo"));
        assert!(!trie.has_key("hobo"));
        assert!(trie.has_key("ho"));
        assert!(trie.has_key("hong"));
        assert!(!trie.has_key_or_prefix("hob"));

        assert!(trie.remove("ho"));
        assert!(!trie.has_key("ho"));
        assert!(trie.has_key_or_prefix("ho"));
        assert!(!trie.remove("x"));
    }

    #[test]
    fn test_autocomplete_breadth_first() {
        let trie = Trie::from_keys(["ho", "hong", "hoa", "hoan", "hoat8"]);
        let all = trie.autocomplete("ho", 0, 0);
        assert_eq!(all, vec!["ho", "hoa", "hoan", "hong", "hoat8"]);

        let two = trie.autocomplete("ho", 2, 0);
        assert_eq!(two, vec!["ho", "hoa"]);

        let shallow = trie.autocomplete("ho", 0, 1);
        assert_eq!(shallow, vec!["ho", "hoa"]);

        assert!(trie.autocomplete("x", 0, 0).is_empty());
    }

    #[test]
    fn test_find_keys() {
        let trie = Trie::from_keys(["tai", "taichi", "chi"]);
        assert_eq!(trie.find_keys("taichi"), vec!["tai", "taichi"]);
        assert_eq!(trie.find_keys("chit"), vec!["chi"]);
        assert!(trie.find_keys("").is_empty());
        assert!(trie.find_keys("x").is_empty());
    }

    #[test]
    fn test_multisplit_prefers_cheaper() {
        let trie = Trie::from_keys(["tai", "chi", "taichi"]);
        let cost_map = costs(&[("tai", 2.0), ("chi", 2.0), ("taichi", 3.0)]);

        let splits = trie.multisplit("taichi", &cost_map, 5);
        assert_eq!(splits, vec![vec![6], vec![3, 6]]);

        let one = trie.multisplit("taichi", &cost_map, 1);
        assert_eq!(one, vec![vec![6]]);
    }

    #[test]
    fn test_multisplit_no_split() {
        let trie = Trie::from_keys(["tai"]);
        let cost_map = costs(&[("tai", 1.0)]);
        assert!(trie.multisplit("xyz", &cost_map, 3).is_empty());
        assert!(trie.multisplit("", &cost_map, 3).is_empty());
    }

    #[test]
    fn test_multisplit_partial_coverage() {
        let trie = Trie::from_keys(["ho"]);
        let cost_map = costs(&[("ho", 1.0)]);
        assert_eq!(trie.multisplit("hox", &cost_map, 3), vec![vec![2]]);
    }

    #[test]
    fn test_multisplit_truncates_long_input() {
        let trie = Trie::from_keys(["a"]);
        let cost_map = costs(&[("a", 1.0)]);
        let long = "a".repeat(80);
        let splits = trie.multisplit(&long, &cost_map, 1);
        assert_eq!(splits.len(), 1);
        assert_eq!(splits[0].len(), MAX_SPLIT_LEN);
        assert_eq!(splits[0].last().copied(), Some(MAX_SPLIT_LEN));
    }

    proptest! {
        #[test]
        fn prop_multisplit_bounded_and_valid(query in "[abc]{0,20}", limit in 1usize..6) {
            let words = ["a", "b", "c", "ab", "bc", "abc", "ca"];
            let trie = Trie::from_keys(words);
            let cost_map: HashMap<String, f32> = words
                .iter()
                .enumerate()
                .map(|(i, w)| (w.to_string(), 1.0 + i as f32))
                .collect();

            let splits = trie.multisplit(&query, &cost_map, limit);
            prop_assert!(splits.len() <= limit);

            for split in &splits {
                let mut prev = 0;
                for &offset in split {
                    prop_assert!(offset > prev);
                    let word = &query[prev..offset];
                    prop_assert!(trie.has_key(word));
                    prev = offset;
                }
            }
        }
    }
}
