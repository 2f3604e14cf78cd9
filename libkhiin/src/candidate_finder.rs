//! Candidate search.
//!
//! Two families of lookups live here. The buffer based ones
//! (`multi_match`, `continuous_single_match`, `continuous_multi_match`)
//! return ready-made `Buffer`s and drive composition. The chunk based ones
//! (`find_candidates`, `find_primary_candidate`) return plain
//! `CandidateChunk` lists for callers that only want to inspect matches.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};

use khiin_core::unicode::{char_len, prefix, slice, suffix};
use khiin_core::{Punctuation, TaiToken};

use crate::buffer::Buffer;
use crate::buffer_element::BufferElement;
use crate::dictionary::Dictionary;
use crate::keyconfig::KeyConfig;
use crate::parser::SyllableParser;
use crate::segmenter::{longest_segment_from_start, segment_text, SegmentType};

/// A span of raw input and the dictionary token chosen for it, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateChunk {
    pub raw: String,
    pub token: Option<TaiToken>,
}

impl CandidateChunk {
    pub fn new<S: Into<String>>(raw: S, token: Option<TaiToken>) -> Self {
        Self {
            raw: raw.into(),
            token,
        }
    }

    /// The token output, or the raw text when nothing matched.
    pub fn output(&self) -> &str {
        self.token.as_ref().map_or(&self.raw, |t| &t.output)
    }
}

/// One full reading of an input, chunk by chunk.
pub type Candidate = Vec<CandidateChunk>;

/// Frequency order: lower input id first, then higher weight.
fn by_frequency(a: &TaiToken, b: &TaiToken) -> Ordering {
    if a.input_id == b.input_id {
        b.weight.cmp(&a.weight)
    } else {
        a.input_id.cmp(&b.input_id)
    }
}

/// Learned counts first, then frequency.
fn by_ngrams(a: &TaiToken, b: &TaiToken) -> Ordering {
    b.bigram_count
        .cmp(&a.bigram_count)
        .then(b.unigram_count.cmp(&a.unigram_count))
        .then_with(|| by_frequency(a, b))
}

/// Longest match first, then learned counts, then frequency.
fn by_length_first(a: &TaiToken, b: &TaiToken) -> Ordering {
    b.input_size
        .cmp(&a.input_size)
        .then(b.bigram_count.cmp(&a.bigram_count))
        .then(b.unigram_count.cmp(&a.unigram_count))
        .then(b.weight.cmp(&a.weight))
        .then(a.input_id.cmp(&b.input_id))
}

/// Sizes a match may not have: those that would leave a tone key dangling
/// at the start of the rest of the query.
fn invalid_split_sizes(kc: &KeyConfig, query: &str) -> BTreeSet<usize> {
    query
        .chars()
        .enumerate()
        .skip(1)
        .filter(|&(_, c)| kc.is_tone_key(c))
        .map(|(i, _)| i)
        .collect()
}

pub struct CandidateFinder<'a, 'p> {
    dictionary: &'a mut Dictionary,
    parser: SyllableParser<'p>,
    continuous_candidates: usize,
}

impl<'a, 'p> CandidateFinder<'a, 'p> {
    pub fn new(
        dictionary: &'a mut Dictionary,
        parser: SyllableParser<'p>,
        continuous_candidates: usize,
    ) -> Self {
        Self {
            dictionary,
            parser,
            continuous_candidates: continuous_candidates.max(1),
        }
    }

    fn keyconfig(&self) -> &'p KeyConfig {
        self.parser.keyconfig()
    }

    fn lgram_output(lgram: Option<&TaiToken>) -> Option<&str> {
        lgram.map(|t| t.output.as_str())
    }

    fn best_match_ngram(
        &self,
        lgram: Option<&TaiToken>,
        mut options: Vec<TaiToken>,
    ) -> Option<TaiToken> {
        if options.is_empty() {
            return None;
        }
        self.dictionary
            .add_ngrams_data(Self::lgram_output(lgram), &mut options);
        options.sort_by(by_ngrams);
        options.into_iter().next()
    }

    fn best_autocomplete(&mut self, lgram: Option<&TaiToken>, query: &str) -> Option<TaiToken> {
        let options = self.dictionary.autocomplete(&query.to_lowercase());
        self.best_match_ngram(lgram, options)
    }

    fn best_single_token_match(
        &mut self,
        lgram: Option<&TaiToken>,
        input: &str,
    ) -> Option<TaiToken> {
        let options = self.dictionary.word_search(&input.to_lowercase());
        self.best_match_ngram(lgram, options)
    }

    fn dedupe_and_sort(&self, lgram: Option<&TaiToken>, query: &str, options: &mut Vec<TaiToken>) {
        let invalid = invalid_split_sizes(self.keyconfig(), query);
        let mut seen = HashSet::new();
        options.retain(|t| !invalid.contains(&t.input_size) && seen.insert(t.output.clone()));
        self.dictionary
            .add_ngrams_data(Self::lgram_output(lgram), options);
        options.sort_by(by_length_first);
    }

    fn tokens_to_buffers(&self, options: &[TaiToken], query: &str) -> Vec<Buffer> {
        options
            .iter()
            .map(|token| {
                let input = prefix(query, token.input_size);
                BufferElement::build(Some(&self.parser), input, Some(token), true)
                    .with_converted(true)
                    .into()
            })
            .collect()
    }

    fn all_words_from_start(&mut self, lgram: Option<&TaiToken>, query: &str) -> Vec<Buffer> {
        let mut options = self.dictionary.all_words_from_start(&query.to_lowercase());
        self.dedupe_and_sort(lgram, query, &mut options);
        self.tokens_to_buffers(&options, query)
    }

    fn words_to_buffer(&mut self, lgram: Option<&TaiToken>, words: &[String]) -> Buffer {
        let mut ret = Buffer::new();
        let mut prev = lgram.cloned();
        for word in words {
            let best = self.best_single_token_match(prev.as_ref(), word);
            ret.push(
                BufferElement::build(Some(&self.parser), word, best.as_ref(), true)
                    .with_converted(true),
            );
            prev = best;
        }
        ret
    }

    fn one_punctuation(&self, query: &str) -> Punctuation {
        self.dictionary
            .search_punctuation(query)
            .into_iter()
            .next()
            .unwrap_or_else(|| Punctuation {
                id: 0,
                input: query.to_string(),
                output: query.to_string(),
                annotation: String::new(),
            })
    }

    fn all_punctuation(&self, query: &str) -> Vec<Buffer> {
        self.dictionary
            .search_punctuation(query)
            .into_iter()
            .map(|p| BufferElement::punctuation(p).with_converted(true).into())
            .collect()
    }

    fn one_splittable(&mut self, lgram: Option<&TaiToken>, query: &str) -> Buffer {
        match self.dictionary.segment(query, 1).into_iter().next() {
            Some(words) => self.words_to_buffer(lgram, &words),
            None => Buffer::new(),
        }
    }

    fn all_splittables(&mut self, lgram: Option<&TaiToken>, query: &str) -> Vec<Buffer> {
        let segmentations = self.dictionary.segment(query, self.continuous_candidates);
        let mut seen = HashSet::new();
        let mut ret = Vec::new();

        for words in &segmentations {
            let buf = self.words_to_buffer(lgram, words);
            if seen.insert(buf.text()) {
                ret.push(buf);
            }
        }

        for buf in self.multi_match(lgram, query) {
            if seen.insert(buf.text()) {
                ret.push(buf);
            }
        }

        ret
    }

    fn one_user_item(&self, lgram: Option<&TaiToken>, query: &str) -> Buffer {
        let mut options = self
            .dictionary
            .user_dictionary()
            .map(|u| u.search_exact(query))
            .unwrap_or_default();

        if !options.is_empty() {
            self.dedupe_and_sort(lgram, query, &mut options);
            options.truncate(1);
            if let Some(buf) = self.tokens_to_buffers(&options, query).into_iter().next() {
                return buf;
            }
        }

        BufferElement::plaintext(query).into()
    }

    fn all_user_items(&self, lgram: Option<&TaiToken>, query: &str) -> Vec<Buffer> {
        let mut options = self
            .dictionary
            .user_dictionary()
            .map(|u| u.search(query))
            .unwrap_or_default();

        if options.is_empty() {
            return Vec::new();
        }
        self.dedupe_and_sort(lgram, query, &mut options);
        self.tokens_to_buffers(&options, query)
    }

    fn syllable_element(&self, raw: &str) -> BufferElement {
        BufferElement::build(Some(&self.parser), raw, None, false)
    }

    /// Every candidate for the longest segment at the start of `query`.
    pub fn multi_match(&mut self, lgram: Option<&TaiToken>, query: &str) -> Vec<Buffer> {
        if query.is_empty() {
            return Vec::new();
        }

        let segment = longest_segment_from_start(self.dictionary, self.keyconfig(), query);
        match segment.kind {
            SegmentType::Punct => self.all_punctuation(query),
            SegmentType::Splittable => self.all_words_from_start(lgram, query),
            SegmentType::UserItem => self.all_user_items(lgram, query),
            SegmentType::SyllablePrefix => {
                vec![self.syllable_element(query).with_converted(true).into()]
            }
            _ => vec![BufferElement::plaintext(query).with_converted(true).into()],
        }
    }

    /// Element for one non-leading segment of a continuous match.
    fn single_segment(
        &mut self,
        lgram: Option<&TaiToken>,
        kind: SegmentType,
        raw: &str,
    ) -> Buffer {
        match kind {
            SegmentType::Splittable => self.one_splittable(lgram, raw),
            SegmentType::Punct => BufferElement::punctuation(self.one_punctuation(raw)).into(),
            SegmentType::UserItem => self.one_user_item(lgram, raw),
            SegmentType::SyllablePrefix => self.syllable_element(raw).into(),
            SegmentType::WordPrefix => {
                let best = self.best_autocomplete(None, raw);
                BufferElement::build(Some(&self.parser), raw, best.as_ref(), false).into()
            }
            SegmentType::Hyphens | SegmentType::None => BufferElement::plaintext(raw).into(),
        }
    }

    /// The best reading of the whole of `query`.
    pub fn continuous_single_match(&mut self, lgram: Option<&TaiToken>, query: &str) -> Buffer {
        let segments = segment_text(self.dictionary, self.keyconfig(), query);
        let mut ret = Buffer::new();

        for seg in segments {
            let raw = slice(query, seg.start, seg.start + seg.size);
            let left = ret.last().and_then(|e| e.candidate()).cloned();
            let left = if ret.is_empty() { lgram.cloned() } else { left };
            let buf = self.single_segment(left.as_ref(), seg.kind, raw);
            ret.append(buf);
        }

        ret
    }

    /// Candidates for the whole of `query`. The first one reads all of it;
    /// when the input starts with a word, punctuation or user item, the
    /// alternatives for that leading segment follow.
    pub fn continuous_multi_match(&mut self, lgram: Option<&TaiToken>, query: &str) -> Vec<Buffer> {
        let segments = segment_text(self.dictionary, self.keyconfig(), query);
        let mut candidates = vec![Buffer::new()];

        for (i, seg) in segments.iter().enumerate() {
            let raw = slice(query, seg.start, seg.start + seg.size);
            let left = match candidates.first() {
                Some(first) if !first.is_empty() => first.last().and_then(|e| e.candidate()).cloned(),
                _ => lgram.cloned(),
            };
            let left = left.as_ref();

            let alternatives = match (i, seg.kind) {
                (0, SegmentType::Splittable) => Some(self.all_splittables(left, raw)),
                (0, SegmentType::Punct) => Some(self.all_punctuation(raw)),
                (0, SegmentType::UserItem) => Some(self.all_user_items(left, raw)),
                _ => None,
            };

            match alternatives {
                Some(alts) if !alts.is_empty() => candidates = alts,
                _ => {
                    let buf = self.single_segment(left, seg.kind, raw);
                    if let Some(first) = candidates.first_mut() {
                        first.append(buf);
                    }
                }
            }
        }

        if let Some(first) = candidates.first_mut() {
            first.set_converted(true);
        }
        tracing::trace!("{} candidates for '{}'", candidates.len(), query);
        candidates
    }

    /// Syllables only, with no dictionary conversion. Hyphen runs and
    /// anything that does not start a syllable stay plain text.
    pub fn syllables_only(&self, query: &str) -> Buffer {
        let kc = self.keyconfig();
        let chars: Vec<char> = query.chars().collect();
        let mut ret = Buffer::new();
        let mut plain = String::new();
        let mut i = 0;

        while i < chars.len() {
            let hyphens = chars[i..].iter().take_while(|&&c| kc.is_hyphen(c)).count();
            let size = if hyphens > 0 {
                0
            } else {
                let mut head = String::new();
                chars[i..]
                    .iter()
                    .take_while(|&&c| {
                        head.push(c.to_ascii_lowercase());
                        self.dictionary.is_syllable_prefix(kc, &head)
                    })
                    .count()
            };

            if size == 0 && hyphens == 0 {
                plain.push(chars[i]);
                i += 1;
                continue;
            }
            if !plain.is_empty() {
                ret.push(BufferElement::plaintext(std::mem::take(&mut plain)));
            }

            if hyphens > 0 {
                let run: String = chars[i..i + hyphens].iter().collect();
                ret.push(BufferElement::plaintext(run));
                i += hyphens;
            } else {
                let raw: String = chars[i..i + size].iter().collect();
                ret.push(self.syllable_element(&raw));
                i += size;
            }
        }

        if !plain.is_empty() {
            ret.push(BufferElement::plaintext(plain));
        }
        ret
    }

    /// Whether `query` reads as dictionary words from end to end.
    pub fn has_exact_match(&self, query: &str) -> bool {
        self.dictionary.word_splitter().can_split(query)
    }

    /// Every dictionary word typed at the start of `raw`, one candidate
    /// per token.
    ///
    /// With a known left context the tokens are ordered by how often they
    /// followed it, relative to how often the context itself was seen.
    pub fn find_candidates(&mut self, raw: &str, lgram: &str, fuzzy: bool) -> Vec<Candidate> {
        let lower = raw.to_lowercase();
        let mut tokens = Vec::new();
        for key in self.dictionary.prefix_keys(&lower, fuzzy) {
            tokens.extend(self.dictionary.word_search(&key));
        }

        let left_count = if lgram.is_empty() {
            0
        } else {
            self.dictionary.database().unigram_count(lgram)
        };

        if left_count > 0 {
            self.dictionary.add_ngrams_data(Some(lgram), &mut tokens);
            tokens.sort_by(|a, b| {
                let wa = f64::from(a.bigram_count) / f64::from(left_count);
                let wb = f64::from(b.bigram_count) / f64::from(left_count);
                wb.partial_cmp(&wa).unwrap_or(Ordering::Equal)
            });
        }

        tokens
            .into_iter()
            .map(|token| {
                let span = prefix(raw, token.input_size).to_string();
                vec![CandidateChunk::new(span, Some(token))]
            })
            .collect()
    }

    /// Greedy left to right reading of `raw`. The raw spans of the result
    /// concatenate back to `raw`.
    pub fn find_primary_candidate(&mut self, raw: &str, lgram: &str, fuzzy: bool) -> Candidate {
        let kc = self.keyconfig();
        let len = char_len(raw);
        let mut chunks: Candidate = Vec::new();
        let mut left = lgram.to_string();
        let mut i = 0;

        while i < len {
            let rest = suffix(raw, i);
            let lower = rest.to_lowercase();

            // A run of three or more keeps its leading hyphens literal and
            // uses the last two as the khin marker, as autokhin does.
            let hyphens = rest.chars().take_while(|&c| kc.is_hyphen(c)).count();
            if hyphens > 2 {
                chunks.push(CandidateChunk::new(prefix(rest, hyphens - 2), None));
                chunks.push(CandidateChunk::new(slice(rest, hyphens - 2, hyphens), None));
                i += hyphens;
                continue;
            }
            if hyphens > 0 {
                chunks.push(CandidateChunk::new(prefix(rest, hyphens), None));
                i += hyphens;
                continue;
            }

            let keys = self.dictionary.prefix_keys(&lower, fuzzy);
            if keys.is_empty() {
                let run = self.unmatched_run(rest, fuzzy);
                let text = prefix(rest, run);
                let merge = self.dictionary.is_syllable_prefix(kc, &text.to_lowercase())
                    && chunks.last().is_some_and(|c| !is_bare_khin(kc, c));
                match chunks.last_mut() {
                    Some(prev) if merge => prev.raw.push_str(text),
                    _ => chunks.push(CandidateChunk::new(text, None)),
                }
                i += run;
                continue;
            }

            let key = self.choose_key(&keys, &lower, &left);
            let size = char_len(&key);
            let tokens = self.dictionary.word_search(&key);
            let lgram_token = (!left.is_empty()).then(|| TaiToken {
                output: left.clone(),
                ..TaiToken::default()
            });
            let best = self.best_match_ngram(lgram_token.as_ref(), tokens);
            let span = prefix(rest, size);

            match chunks.last_mut() {
                Some(prev) if is_bare_khin(kc, prev) => {
                    prev.raw.push_str(span);
                    prev.token = best.clone();
                }
                _ => chunks.push(CandidateChunk::new(span, best.clone())),
            }

            if let Some(best) = best {
                left = best.output;
            }
            i += size;
        }

        chunks
    }

    /// Length of the run at the start of `rest` that no dictionary key
    /// starts, stopping before hyphens.
    fn unmatched_run(&self, rest: &str, fuzzy: bool) -> usize {
        let kc = self.keyconfig();
        let len = char_len(rest);
        let mut run = 1;
        while run < len {
            let tail = suffix(rest, run);
            let starts_hyphen = tail.chars().next().is_some_and(|c| kc.is_hyphen(c));
            if starts_hyphen || !self.dictionary.prefix_keys(&tail.to_lowercase(), fuzzy).is_empty() {
                break;
            }
            run += 1;
        }
        run
    }

    /// Pick among the dictionary keys that start `query`.
    ///
    /// Without left context, the key agreeing with the splitter's cheapest
    /// segmentation wins. With left context, the key leaving the fewest
    /// characters the splitter cannot cover wins, then the one whose best
    /// token most often followed the context, then the longer one.
    fn choose_key(&mut self, keys: &[String], query: &str, lgram: &str) -> String {
        let longest = keys.last().cloned().unwrap_or_default();

        if lgram.is_empty() {
            let first_word = self
                .dictionary
                .word_splitter()
                .split(query)
                .into_iter()
                .next();
            return match first_word {
                Some(word) if keys.contains(&word) => word,
                _ => longest,
            };
        }

        let query_len = char_len(query);
        let mut best: Option<(usize, u32, usize, String)> = None;
        for key in keys {
            let key_len = char_len(key);
            let rest = suffix(query, key_len);
            let covered = self
                .dictionary
                .word_splitter()
                .max_split_size(rest, &invalid_split_sizes(self.keyconfig(), rest));
            let leftover = query_len - key_len - covered;

            let mut tokens = self.dictionary.word_search(key);
            self.dictionary.add_ngrams_data(Some(lgram), &mut tokens);
            let bigram = tokens.iter().map(|t| t.bigram_count).max().unwrap_or(0);

            let better = match &best {
                None => true,
                Some((l, b, k, _)) => {
                    (leftover, std::cmp::Reverse(bigram), std::cmp::Reverse(key_len))
                        < (*l, std::cmp::Reverse(*b), std::cmp::Reverse(*k))
                }
            };
            if better {
                best = Some((leftover, bigram, key_len, key.clone()));
            }
        }

        best.map_or(longest, |(_, _, _, key)| key)
    }
}

/// A run of hyphens still waiting for the syllable it marks.
fn is_bare_khin(kc: &KeyConfig, chunk: &CandidateChunk) -> bool {
    chunk.token.is_none() && char_len(&chunk.raw) >= 2 && chunk.raw.chars().all(|c| kc.is_hyphen(c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use khiin_core::{DictionaryStore, Lexicon, UserDictionary};

    fn dictionary(kc: &KeyConfig) -> Dictionary {
        let parser = SyllableParser::new(kc, true);
        let store = DictionaryStore::in_memory(Lexicon::load_demo());
        Dictionary::new(Box::new(store), &parser, &khiin_core::Config::default())
    }

    fn texts(bufs: &[Buffer]) -> Vec<String> {
        bufs.iter().map(|b| b.text()).collect()
    }

    #[test]
    fn test_multi_match_words_from_start() {
        let kc = KeyConfig::new();
        let mut dict = dictionary(&kc);
        let mut finder = CandidateFinder::new(&mut dict, SyllableParser::new(&kc, true), 5);

        let cands = finder.multi_match(None, "ho2");
        assert_eq!(texts(&cands), vec!["好", "號"]);
        assert!(cands.iter().all(|b| b.raw_text() == "ho2"));

        // "tai" leaves "7chi" after it, which starts with a tone key
        let cands = finder.multi_match(None, "tai7chi");
        assert_eq!(texts(&cands), vec!["代誌"]);
    }

    #[test]
    fn test_multi_match_punctuation_and_plaintext() {
        let kc = KeyConfig::new();
        let mut dict = dictionary(&kc);
        let mut finder = CandidateFinder::new(&mut dict, SyllableParser::new(&kc, true), 5);

        assert_eq!(texts(&finder.multi_match(None, ".")), vec!["。"]);
        let cands = finder.multi_match(None, "xyz");
        assert_eq!(texts(&cands), vec!["xyz"]);
        assert!(finder.multi_match(None, "").is_empty());
    }

    #[test]
    fn test_continuous_multi_match_reads_everything() {
        let kc = KeyConfig::new();
        let mut dict = dictionary(&kc);
        let mut finder = CandidateFinder::new(&mut dict, SyllableParser::new(&kc, true), 5);

        let cands = finder.continuous_multi_match(None, "hobo");
        assert_eq!(cands[0].text(), "好無");
        assert_eq!(cands[0].raw_text(), "hobo");
        assert!(cands.iter().all(|b| !b.is_empty()));

        let cands = finder.continuous_multi_match(None, "ho2--a");
        assert_eq!(cands[0].raw_text(), "ho2--a");
    }

    #[test]
    fn test_continuous_single_match_keeps_raw() {
        let kc = KeyConfig::new();
        let mut dict = dictionary(&kc);
        let mut finder = CandidateFinder::new(&mut dict, SyllableParser::new(&kc, true), 5);

        let buf = finder.continuous_single_match(None, "xxho.");
        assert_eq!(buf.raw_text(), "xxho.");
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn test_user_items_are_candidates() {
        let kc = KeyConfig::new();
        let mut dict = dictionary(&kc);
        dict.set_user_dictionary(Some(UserDictionary::parse("ktv 卡拉OK\n")));
        let mut finder = CandidateFinder::new(&mut dict, SyllableParser::new(&kc, true), 5);

        let cands = finder.continuous_multi_match(None, "ktv");
        assert_eq!(texts(&cands), vec!["卡拉OK"]);
        assert!(finder.has_exact_match("hobo"));
        assert!(!finder.has_exact_match("ktv"));
    }

    #[test]
    fn test_find_candidates() {
        let kc = KeyConfig::new();
        let mut dict = dictionary(&kc);
        let mut finder = CandidateFinder::new(&mut dict, SyllableParser::new(&kc, true), 5);

        let cands = finder.find_candidates("taioan", "", true);
        let outputs: Vec<&str> = cands.iter().map(|c| c[0].output()).collect();
        assert_eq!(outputs, vec!["台", "台灣"]);
        assert_eq!(cands[0][0].raw, "tai");
        assert_eq!(cands[1][0].raw, "taioan");

        // "tai" is only a toneless fallback for "tâi"
        let cands = finder.find_candidates("taioan", "", false);
        assert_eq!(cands.len(), 1);

        assert!(finder.find_candidates("ho", "", false).is_empty());
        assert_eq!(finder.find_candidates("ho", "", true).len(), 2);
    }

    #[test]
    fn test_find_candidates_prefers_learned_bigrams() {
        let kc = KeyConfig::new();
        let mut dict = dictionary(&kc);
        dict.database()
            .record_ngrams(&["我".to_string(), "理".to_string()], &[("我".to_string(), "理".to_string())])
            .unwrap();
        let mut finder = CandidateFinder::new(&mut dict, SyllableParser::new(&kc, true), 5);

        let cands = finder.find_candidates("li2", "我", false);
        assert_eq!(cands[0][0].output(), "理");
        let cands = finder.find_candidates("li2", "", false);
        assert_eq!(cands[0][0].output(), "你");
    }

    #[test]
    fn test_find_primary_candidate() {
        let kc = KeyConfig::new();
        let mut dict = dictionary(&kc);
        let mut finder = CandidateFinder::new(&mut dict, SyllableParser::new(&kc, true), 5);

        let cand = finder.find_primary_candidate("goa2si7", "", false);
        let outputs: Vec<&str> = cand.iter().map(|c| c.output()).collect();
        assert_eq!(outputs, vec!["我", "是"]);

        let cand = finder.find_primary_candidate("ho2--a", "", false);
        let raws: Vec<&str> = cand.iter().map(|c| c.raw.as_str()).collect();
        assert_eq!(raws, vec!["ho2", "--a"]);
        assert_eq!(cand[1].output(), "仔");

        let cand = finder.find_primary_candidate("ho2---a", "", false);
        let raws: Vec<&str> = cand.iter().map(|c| c.raw.as_str()).collect();
        assert_eq!(raws, vec!["ho2", "-", "--a"]);
        assert_eq!(cand[1].token, None);
        assert_eq!(cand[2].output(), "仔");

        let cand = finder.find_primary_candidate("xqho2", "", false);
        assert_eq!(cand.iter().map(|c| c.raw.as_str()).collect::<String>(), "xqho2");
        assert_eq!(cand[0].token, None);
        assert_eq!(cand[1].output(), "好");
    }

    #[test]
    fn test_syllables_only() {
        let kc = KeyConfig::new();
        let mut dict = dictionary(&kc);
        let finder = CandidateFinder::new(&mut dict, SyllableParser::new(&kc, true), 5);

        let buf = finder.syllables_only("ho2xbo--a");
        let composed: Vec<String> = buf.iter().map(|e| e.composed()).collect();
        assert_eq!(composed, vec!["hó", "x", "bo", "--", "a"]);
        assert_eq!(buf.raw_text(), "ho2xbo--a");
        assert!(buf.iter().all(|e| e.candidate().is_none()));
    }
}
