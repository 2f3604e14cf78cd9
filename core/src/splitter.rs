//! Frequency-cost word segmentation.
//!
//! The splitter is built from a vocabulary ordered by descending frequency.
//! Each word costs `ln((rank + 1) * ln(N))`, so rarer words cost more and the
//! cheapest segmentation favours common words.

use std::collections::{BTreeSet, HashMap, HashSet};

use ahash::RandomState;

/// Added to the cost of leaving a single character unmatched.
const UNMATCHED_COST: f32 = 9e9;

pub type CostMap = HashMap<String, f32, RandomState>;

#[derive(Debug, Clone, Default)]
pub struct Splitter {
    words: HashSet<String, RandomState>,
    cost_map: CostMap,
    max_word_len: usize,
}

struct SplitCheck {
    splits_at: Vec<bool>,
    split_indices: Vec<isize>,
}

/// A whole string that reads as one finite decimal number ("12", "-1.5",
/// "1e3"). Named values such as "inf" and "nan" do not count.
fn is_number(s: &str) -> bool {
    let s = s.trim();
    !s.chars()
        .any(|c| c.is_ascii_alphabetic() && !c.eq_ignore_ascii_case(&'e'))
        && s.parse::<f64>().is_ok_and(f64::is_finite)
}

impl Splitter {
    pub fn new<S: AsRef<str>>(words_by_frequency: &[S]) -> Self {
        let log_size = (words_by_frequency.len() as f32).ln();
        let mut splitter = Splitter::default();

        for (rank, word) in words_by_frequency.iter().enumerate() {
            let word = word.as_ref();
            splitter.words.insert(word.to_string());
            splitter
                .cost_map
                .entry(word.to_string())
                .or_insert(((rank + 1) as f32 * log_size).ln());
            splitter.max_word_len = splitter.max_word_len.max(word.chars().count());
        }

        splitter
    }

    pub fn cost_map(&self) -> &CostMap {
        &self.cost_map
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    /// Greedy reachability scan: index `i` is a split point when some
    /// vocabulary word spans from an earlier split point to `i`.
    fn check_splittable(&self, chars: &[char], invalid: &BTreeSet<usize>) -> SplitCheck {
        let mut splits_at = vec![false; chars.len() + 1];
        let mut split_indices: Vec<isize> = vec![-1];

        for i in 0..chars.len() {
            if invalid.contains(&i) {
                continue;
            }

            for j in (0..split_indices.len()).rev() {
                let from = (split_indices[j] + 1) as usize;
                let candidate: String = chars[from..=i].iter().collect();
                if self.words.contains(&candidate) {
                    splits_at[i] = true;
                    split_indices.push(i as isize);
                    break;
                }
            }
        }

        SplitCheck {
            splits_at,
            split_indices,
        }
    }

    /// True if `input` can be fully partitioned into vocabulary words.
    /// The empty string is trivially splittable.
    pub fn can_split(&self, input: &str) -> bool {
        if input.is_empty() {
            return true;
        }

        let chars: Vec<char> = input.chars().collect();
        let check = self.check_splittable(&chars, &BTreeSet::new());
        check.splits_at[chars.len() - 1]
    }

    /// Length of the longest prefix of `input` covered by vocabulary words,
    /// never ending a word at one of `invalid_indices`.
    pub fn max_split_size(&self, input: &str, invalid_indices: &BTreeSet<usize>) -> usize {
        if input.is_empty() {
            return 0;
        }

        let chars: Vec<char> = input.chars().collect();
        let check = self.check_splittable(&chars, invalid_indices);
        check
            .split_indices
            .last()
            .map(|&i| (i + 1) as usize)
            .unwrap_or(0)
    }

    /// Minimum-cost segmentation of `input`.
    ///
    /// Characters that cannot be covered by a word become single-character
    /// segments. A numeric segment is merged into the following one when
    /// the combination still reads as a number.
    pub fn split(&self, input: &str) -> Vec<String> {
        let chars: Vec<char> = input.chars().collect();
        let len = chars.len();
        let mut result: Vec<String> = Vec::new();
        if len == 0 {
            return result;
        }

        let mut cost: Vec<(f32, usize)> = Vec::with_capacity(len + 1);
        cost.push((0.0, 0));

        for i in 1..=len {
            let mut min_cost = cost[i - 1].0 + UNMATCHED_COST;
            let mut min_idx = i - 1;

            for j in i.saturating_sub(self.max_word_len)..i {
                let chunk: String = chars[j..i].iter().collect();
                let Some(word_cost) = self.cost_map.get(&chunk) else {
                    continue;
                };
                let total = cost[j].0 + word_cost;
                if total < min_cost {
                    min_cost = total;
                    min_idx = j;
                }
            }

            cost.push((min_cost, min_idx));
        }

        let mut n = len;
        while n > 0 {
            let prev = cost[n].1;
            let piece: String = chars[prev..n].iter().collect();

            match result.first_mut() {
                Some(first) if is_number(&format!("{piece}{first}")) => {
                    first.insert_str(0, &piece);
                }
                _ => result.insert(0, piece),
            }

            n = prev;
        }

        result
    }
}
