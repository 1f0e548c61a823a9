//! Per-set resolution state: which stored artifacts are known to be
//! high resolution.
//!
//! Each set directory carries a small JSON document mapping artifact keys to
//! a boolean. The document is read when a set starts, updated in memory as
//! cards are fetched, and written back whole when the set finishes, aborts,
//! or is interrupted.

mod store;

pub use store::{ResolutionMap, StateStore};

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::fs;

use crate::fs_util::write_atomic;

/// File name of the state document inside a set directory.
pub const STATE_FILE_NAME: &str = ".states.json";

#[derive(Debug, Error)]
pub enum StateError {
    /// The persisted document is not a key to boolean mapping.
    #[error("Resolution state at {location} is unreadable: {source}")]
    Corrupt {
        location: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Resolution state I/O failed for {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },
}

/// Backing storage for one set's state document.
#[async_trait]
pub trait StateStorage: Send + Sync {
    /// Human-readable location, used in errors and logs.
    fn location(&self) -> String;

    /// The persisted document, or `None` if nothing was ever written.
    async fn load(&self) -> Result<Option<String>, StateError>;

    /// Replace the persisted document.
    async fn save(&self, contents: &str) -> Result<(), StateError>;
}

/// State document stored as a file.
#[derive(Debug, Clone)]
pub struct FileStateStorage {
    path: PathBuf,
}

impl FileStateStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Storage for the set directory `set_dir`.
    pub fn for_set_dir(set_dir: &Path) -> Self {
        Self::new(set_dir.join(STATE_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl StateStorage for FileStateStorage {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    async fn load(&self) -> Result<Option<String>, StateError> {
        match fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StateError::Io {
                location: self.location(),
                source,
            }),
        }
    }

    async fn save(&self, contents: &str) -> Result<(), StateError> {
        write_atomic(&self.path, contents.as_bytes())
            .await
            .map_err(|source| StateError::Io {
                location: self.location(),
                source,
            })
    }
}
