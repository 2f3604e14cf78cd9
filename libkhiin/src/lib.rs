//! libkhiin crate root
//!
//! Taiwanese romanization (POJ) composition engine built on `khiin-core`.
//! Raw keystrokes become tone-marked syllables as they are typed, and
//! dictionary matches are offered as Han or mixed-script conversions.
//!
//! Public API exported here:
//! - `Engine` from `engine`, the object hosts talk to
//! - `KhiinConfig` / `InputMode` from `config`
//! - `KeyConfig` from `keyconfig`
//! - `SyllableParser` and `Syllable` for romanization on its own
//! - `CandidateChunk` / `Candidate` from `candidate_finder`
//!
//! # Example
//!
//! ```rust
//! use khiin_core::Lexicon;
//! use libkhiin::{Engine, KhiinConfig};
//!
//! let mut engine = Engine::in_memory(Lexicon::load_demo(), KhiinConfig::default()).unwrap();
//! for ch in "ho2".chars() {
//!     engine.insert(ch);
//! }
//! assert_eq!(engine.build_preedit().text(), "hó");
//! assert_eq!(engine.get_candidates().values()[0], "好");
//! ```

pub mod buffer;
pub mod buffer_element;
pub mod buffer_mgr;
pub mod candidate_finder;
pub mod config;
pub mod dictionary;
pub mod engine;
pub mod error;
pub mod keyconfig;
pub mod khin_handler;
pub mod lomaji;
pub mod parser;
pub mod segmenter;
pub mod syllable;
pub mod tai_text;

// Convenience re-exports for common types used by callers.
pub use candidate_finder::{Candidate, CandidateChunk};
pub use config::{InputMode, KhiinConfig};
pub use engine::Engine;
pub use error::{Error, Result};
pub use keyconfig::KeyConfig;
pub use lomaji::{CursorDirection, Tone};
pub use parser::SyllableParser;
pub use syllable::Syllable;

// Display records come from core.
pub use khiin_core::{CandidateItem, CandidateList, EditState, Preedit, PreeditSegment, SegmentStatus};
