//! Local copies of the bulk catalog and its metadata document.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};

use super::types::{BulkDocument, MetaDocument, RunMetadata};
use super::CatalogError;
use crate::fs_util::write_atomic;

/// The two documents that make up a catalog snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotKind {
    Bulk,
    Meta,
}

impl SnapshotKind {
    /// Document name used both remotely and on disk.
    pub fn document_name(&self) -> &'static str {
        match self {
            SnapshotKind::Bulk => "AllPrintings",
            SnapshotKind::Meta => "Meta",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.json", self.document_name())
    }
}

/// Snapshot files under `<data_dir>/.json/`.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    dir: PathBuf,
}

impl CatalogSnapshot {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            dir: data_dir.join(".json"),
        }
    }

    pub fn path(&self, kind: SnapshotKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    /// Both documents are present locally.
    pub fn exists(&self) -> bool {
        self.path(SnapshotKind::Bulk).exists() && self.path(SnapshotKind::Meta).exists()
    }

    pub async fn read_meta(&self) -> Result<RunMetadata, CatalogError> {
        let path = self.path(SnapshotKind::Meta);
        let bytes = read(&path).await?;
        let doc: MetaDocument =
            serde_json::from_slice(&bytes).map_err(|source| CatalogError::Parse { path, source })?;
        Ok(doc.meta)
    }

    pub async fn read_bulk(&self) -> Result<BulkDocument, CatalogError> {
        let path = self.path(SnapshotKind::Bulk);
        let bytes = read(&path).await?;
        debug!("Parsing bulk catalog ({} bytes)", bytes.len());
        serde_json::from_slice(&bytes).map_err(|source| CatalogError::Parse { path, source })
    }

    /// Replace both documents. Callers pass fully downloaded payloads; each file
    /// is swapped in with a rename so readers never observe a partial write.
    pub async fn replace(&self, bulk: &[u8], meta: &[u8]) -> Result<(), CatalogError> {
        for (kind, bytes) in [(SnapshotKind::Bulk, bulk), (SnapshotKind::Meta, meta)] {
            let path = self.path(kind);
            write_atomic(&path, bytes)
                .await
                .map_err(|source| CatalogError::Io {
                    path: path.clone(),
                    source,
                })?;
            info!("Stored {} ({} bytes)", path.display(), bytes.len());
        }
        Ok(())
    }
}

async fn read(path: &Path) -> Result<Vec<u8>, CatalogError> {
    fs::read(path).await.map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })
}
