//! Errors raised while configuring or loading the engine.
//!
//! Keystroke handling never fails; an unusable key is simply not consumed.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] khiin_core::Error),

    #[error("'{key}' cannot be used as the {role} key")]
    InvalidKey { key: char, role: &'static str },

    #[error("key '{key}' is assigned to both {first} and {second}")]
    KeyConflict {
        key: char,
        first: &'static str,
        second: &'static str,
    },
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Core(e.into())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(e: toml::ser::Error) -> Self {
        Error::Core(e.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
