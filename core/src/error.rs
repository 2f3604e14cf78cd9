//! Error type shared by the storage and configuration layers of khiin-core.
//!
//! Composition itself never fails: missing dictionary data is an empty result
//! and unusable keystrokes are reported as "not consumed". Errors only come
//! from loading or persisting data.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlDecode(#[from] toml::de::Error),

    #[error("failed to write TOML: {0}")]
    TomlEncode(#[from] toml::ser::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bincode error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("n-gram store error: {0}")]
    Storage(#[from] redb::Error),

    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

macro_rules! storage_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Error {
                fn from(e: $ty) -> Self {
                    Error::Storage(e.into())
                }
            }
        )*
    };
}

storage_from!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

pub type Result<T> = std::result::Result<T, Error>;
