//! Taiwanese-specific configuration that extends the base `Config` from core.
//!
//! This configuration includes:
//! - All generic options from `khiin_core::Config` (flattened via serde)
//! - Input mode and khin display options
//! - Telex tone keys
//! - Keys used for the nasal, dot-above-right and dots-below letters
//!
//! # Example
//!
//! ```rust
//! use libkhiin::{InputMode, KhiinConfig};
//!
//! let config = KhiinConfig::from_toml_str("input_mode = \"basic\"\nnasal = \"v\"\n").unwrap();
//! assert_eq!(config.input_mode, InputMode::Basic);
//! assert_eq!(config.base.continuous_candidates, 5);
//! ```
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::keyconfig::KeyConfig;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    /// Re-segment and convert the whole composition on every keystroke
    #[default]
    Continuous,
    /// Convert only the longest leading match
    Basic,
    /// Compose syllables without dictionary conversion
    Manual,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct KhiinConfig {
    /// Base configuration fields (cache size, candidate counts)
    #[serde(flatten)]
    pub base: khiin_core::Config,

    pub input_mode: InputMode,

    /// Render khin as a middle dot; otherwise as a double hyphen
    pub dotted_khin: bool,

    /// Carry khin onto every syllable after a "--" trigger
    pub autokhin: bool,

    /// Accept letter tone keys at the end of a syllable
    pub telex: bool,
    pub telex_t2: char,
    pub telex_t3: char,
    pub telex_t5: char,
    pub telex_t7: char,
    pub telex_t8: char,
    pub telex_t9: char,
    pub telex_khin: char,

    /// Extra key that behaves like '-'
    pub alt_hyphen: Option<char>,

    /// One key for a standalone nasal, or "n" plus a key (default "nn")
    pub nasal: String,

    /// One key for a standalone o͘, or "o" plus a key (default "ou")
    pub dot_above_right: String,

    /// Key typed after "o" or "u" for o̤ / ṳ
    pub dots_below: char,

    /// Produce ᴺ instead of ⁿ after an uppercase syllable
    pub uppercase_nasal: bool,
}

impl Default for KhiinConfig {
    fn default() -> Self {
        Self {
            base: khiin_core::Config::default(),
            input_mode: InputMode::Continuous,
            dotted_khin: true,
            autokhin: true,
            telex: false,
            telex_t2: 's',
            telex_t3: 'f',
            telex_t5: 'l',
            telex_t7: 'j',
            telex_t8: 'x',
            telex_t9: 'w',
            telex_khin: 'q',
            alt_hyphen: None,
            nasal: "nn".to_string(),
            dot_above_right: "ou".to_string(),
            dots_below: 'r',
            uppercase_nasal: true,
        }
    }
}

impl KhiinConfig {
    /// Convert this config into the base config
    pub fn into_base(self) -> khiin_core::Config {
        self.base
    }

    /// Get a reference to the base config
    pub fn base(&self) -> &khiin_core::Config {
        &self.base
    }

    /// Get a mutable reference to the base config
    pub fn base_mut(&mut self) -> &mut khiin_core::Config {
        &mut self.base
    }

    /// Load configuration from a TOML file.
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Core(khiin_core::Error::Io {
                path: path.to_path_buf(),
                source: e,
            })
        })?;
        Self::from_toml_str(&content)
    }

    /// Save configuration to a TOML file.
    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = self.to_toml_string()?;
        std::fs::write(path, content).map_err(|e| {
            Error::Core(khiin_core::Error::Io {
                path: path.to_path_buf(),
                source: e,
            })
        })
    }

    /// Load configuration from TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Serialize configuration to TOML string.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check the base settings and that every configured key can be used.
    pub fn validate(&self) -> Result<()> {
        self.base.validate()?;
        KeyConfig::from_config(self).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = KhiinConfig::default();
        assert_eq!(cfg.input_mode, InputMode::Continuous);
        assert!(cfg.dotted_khin);
        assert!(cfg.autokhin);
        assert!(!cfg.telex);
        assert_eq!(cfg.nasal, "nn");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_toml_roundtrip_keeps_flattened_base() {
        let mut cfg = KhiinConfig::default();
        cfg.base.max_cache_size = 12;
        cfg.input_mode = InputMode::Manual;
        cfg.alt_hyphen = Some('v');

        let text = cfg.to_toml_string().unwrap();
        assert!(text.contains("max_cache_size = 12"));
        assert!(text.contains("input_mode = \"manual\""));

        let back = KhiinConfig::from_toml_str(&text).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("khiin.toml");
        let cfg = KhiinConfig {
            dotted_khin: false,
            ..KhiinConfig::default()
        };
        cfg.save_toml(&path).unwrap();
        assert_eq!(KhiinConfig::load_toml(&path).unwrap(), cfg);
    }

    #[test]
    fn test_validate_rejects_unusable_keys() {
        let cfg = KhiinConfig {
            dots_below: 'a',
            ..KhiinConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(Error::InvalidKey { .. })));

        let cfg = KhiinConfig {
            base: khiin_core::Config {
                continuous_candidates: 0,
                ..khiin_core::Config::default()
            },
            ..KhiinConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(Error::Core(_))));
    }

    #[test]
    fn test_bad_toml_is_an_error() {
        assert!(KhiinConfig::from_toml_str("input_mode = \"sideways\"").is_err());
    }
}
