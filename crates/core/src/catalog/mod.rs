//! Bulk card catalog: raw document records, the typed card/set model built
//! from them, and the local snapshot files they are loaded from.

mod entry;
mod snapshot;
mod types;

pub use entry::{
    CardEntry, CardEntryBuilder, CatalogPolicy, Face, LayoutKind, SetEntry, ARTIFACT_EXTENSION,
    ARTIFACT_KEY_DELIMITER, TOKEN_DIR,
};
pub use snapshot::{CatalogSnapshot, SnapshotKind};
pub use types::*;

use std::path::PathBuf;
use thiserror::Error;

/// Structural problems with the catalog. None of these are retried.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A record lacks a field the catalog model requires.
    #[error("Catalog record is missing required field '{field}': {card}")]
    MissingField { field: &'static str, card: String },

    /// A document could not be parsed.
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A snapshot file could not be read or written.
    #[error("Catalog I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CatalogError {
    fn missing(field: &'static str, raw: &RawCard) -> Self {
        let card = match (&raw.uuid, raw.name.is_empty()) {
            (Some(uuid), _) => format!("{} ({})", uuid, raw.name),
            (None, false) => raw.name.clone(),
            (None, true) => "<unnamed>".to_string(),
        };
        Self::MissingField { field, card }
    }
}
