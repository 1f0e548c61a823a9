use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::debug;

use super::{FileStateStorage, StateError, StateStorage};

/// Artifact key to "is high resolution". Ordered so the serialized document
/// is stable between runs.
pub type ResolutionMap = BTreeMap<String, bool>;

/// In-memory resolution state of one set, backed by a [`StateStorage`].
pub struct StateStore<S: StateStorage = FileStateStorage> {
    storage: S,
    states: ResolutionMap,
    persisted: bool,
}

impl StateStore<FileStateStorage> {
    /// Open the state file at `path`, defaulting to an empty mapping.
    pub async fn open_file(path: impl Into<PathBuf>) -> Result<Self, StateError> {
        Self::open(FileStateStorage::new(path)).await
    }
}

impl<S: StateStorage> StateStore<S> {
    /// Load the persisted mapping, or start empty if there is none.
    pub async fn open(storage: S) -> Result<Self, StateError> {
        let loaded = storage.load().await?;
        let persisted = loaded.is_some();
        let states = match loaded {
            Some(contents) => parse(&storage, &contents)?,
            None => ResolutionMap::new(),
        };

        debug!(
            "Opened resolution state {} ({} entries)",
            storage.location(),
            states.len()
        );

        Ok(Self {
            storage,
            states,
            persisted,
        })
    }

    /// The mapping as currently persisted, empty when absent.
    pub async fn read(&self) -> Result<ResolutionMap, StateError> {
        match self.storage.load().await? {
            Some(contents) => parse(&self.storage, &contents),
            None => Ok(ResolutionMap::new()),
        }
    }

    /// Persist the in-memory mapping if it is non-empty and differs from what
    /// is stored. Returns whether a write happened.
    pub async fn write(&mut self) -> Result<bool, StateError> {
        if self.states.is_empty() || self.states == self.read().await? {
            return Ok(false);
        }

        let contents = serde_json::to_string(&self.states).map_err(|source| StateError::Corrupt {
            location: self.storage.location(),
            source,
        })?;
        self.storage.save(&contents).await?;
        self.persisted = true;

        debug!(
            "Wrote resolution state {} ({} entries)",
            self.storage.location(),
            self.states.len()
        );
        Ok(true)
    }

    pub fn get(&self, key: &str) -> Option<bool> {
        self.states.get(key).copied()
    }

    pub fn put(&mut self, key: impl Into<String>, high_res: bool) {
        self.states.insert(key.into(), high_res);
    }

    /// Every recorded artifact is high resolution. Vacuously true when empty,
    /// so callers deciding whether a set is complete must check
    /// [`is_empty`](Self::is_empty) as well.
    pub fn all_high_res(&self) -> bool {
        self.states.values().all(|&high_res| high_res)
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// A state document existed when the store was opened or has since been written.
    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    pub fn states(&self) -> &ResolutionMap {
        &self.states
    }

    pub fn location(&self) -> String {
        self.storage.location()
    }
}

fn parse<S: StateStorage>(storage: &S, contents: &str) -> Result<ResolutionMap, StateError> {
    serde_json::from_str(contents).map_err(|source| StateError::Corrupt {
        location: storage.location(),
        source,
    })
}
