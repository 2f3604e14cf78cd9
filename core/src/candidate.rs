//! Candidate list handed to the host.
//!
//! This module provides:
//! - `CandidateItem`: one displayable conversion with a stable id
//! - `CandidateList`: all candidates for the focused segment, the focused
//!   index, and page helpers for hosts that show a fixed-size window

use serde::{Deserialize, Serialize};
use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateItem {
    /// Position in the full list
    pub id: usize,
    pub value: String,
}

impl CandidateItem {
    pub fn new<T: Into<String>>(id: usize, value: T) -> Self {
        Self {
            id,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateList {
    pub candidates: Vec<CandidateItem>,

    /// Index of the focused candidate, if any
    pub focused: Option<usize>,

    /// Number of candidates per page
    pub page_size: usize,
}

impl Default for CandidateList {
    fn default() -> Self {
        Self {
            candidates: Vec::new(),
            focused: None,
            page_size: 9,
        }
    }
}

impl CandidateList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a list from displayable values, numbering them in order.
    pub fn from_values<I, S>(values: I, focused: Option<usize>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let candidates: Vec<CandidateItem> = values
            .into_iter()
            .enumerate()
            .map(|(id, v)| CandidateItem::new(id, v))
            .collect();
        let focused = focused.filter(|&f| f < candidates.len());
        Self {
            candidates,
            focused,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn focused_candidate(&self) -> Option<&CandidateItem> {
        self.focused.and_then(|i| self.candidates.get(i))
    }

    pub fn values(&self) -> Vec<&str> {
        self.candidates.iter().map(|c| c.value.as_str()).collect()
    }

    pub fn num_pages(&self) -> usize {
        self.candidates.len().div_ceil(self.page_size.max(1))
    }

    /// Page containing the focused candidate (0 when nothing is focused).
    pub fn current_page(&self) -> usize {
        self.focused.unwrap_or(0) / self.page_size.max(1)
    }

    /// Range of candidate indices on the current page.
    pub fn current_page_range(&self) -> Range<usize> {
        let size = self.page_size.max(1);
        let start = (self.current_page() * size).min(self.candidates.len());
        let end = (start + size).min(self.candidates.len());
        start..end
    }

    pub fn current_page_candidates(&self) -> &[CandidateItem] {
        &self.candidates[self.current_page_range()]
    }
}
