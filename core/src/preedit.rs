//! Preedit display records.
//!
//! The preedit is the text shown inline while composing. It is a run of
//! segments, each with a display status, plus the caret and the position
//! of the focused segment, both in codepoints.

use serde::{Deserialize, Serialize};

/// Overall state of the composition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditState {
    #[default]
    Empty,
    Composing,
    Converted,
    Selecting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentStatus {
    /// Raw input still being typed
    Composing,
    /// Display-only text such as separator spaces
    Unmarked,
    Converted,
    Focused,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreeditSegment {
    pub value: String,
    pub status: SegmentStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preedit {
    pub segments: Vec<PreeditSegment>,
    /// Caret position in codepoints
    pub caret: usize,
    /// Start of the focused segment in codepoints
    pub focused_caret: usize,
}

impl Preedit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `value`, merging it into the previous segment when both are
    /// composing.
    pub fn push<T: Into<String>>(&mut self, value: T, status: SegmentStatus) {
        let value = value.into();
        if value.is_empty() {
            return;
        }

        if status == SegmentStatus::Composing {
            if let Some(last) = self.segments.last_mut() {
                if last.status == SegmentStatus::Composing {
                    last.value.push_str(&value);
                    return;
                }
            }
        }

        self.segments.push(PreeditSegment { value, status });
    }

    /// The full displayed text.
    pub fn text(&self) -> String {
        self.segments.iter().map(|s| s.value.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of codepoints displayed.
    pub fn len(&self) -> usize {
        self.segments.iter().map(|s| s.value.chars().count()).sum()
    }

    pub fn has_status(&self, status: SegmentStatus) -> bool {
        self.segments.iter().any(|s| s.status == status)
    }
}
