//! Mock catalog publisher for testing.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::fixtures;
use crate::catalog::{RunMetadata, SnapshotKind};
use crate::gateway::{CatalogSource, GatewayError};

/// Mock implementation of the CatalogSource trait.
///
/// Serves a configurable metadata record and bulk document. The metadata
/// snapshot is derived from the configured record so both always agree.
#[derive(Debug, Clone)]
pub struct MockCatalogSource {
    meta: Arc<RwLock<RunMetadata>>,
    bulk: Arc<RwLock<Bytes>>,
    meta_calls: Arc<RwLock<usize>>,
    snapshot_calls: Arc<RwLock<Vec<SnapshotKind>>>,
    asset_calls: Arc<RwLock<Vec<String>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<GatewayError>>>,
}

impl Default for MockCatalogSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCatalogSource {
    /// A source publishing an empty catalog at version 5.2.1.
    pub fn new() -> Self {
        let meta = fixtures::meta("5.2.1", "2024-01-01");
        let bulk = fixtures::bulk_json(&meta, &[]);
        Self {
            meta: Arc::new(RwLock::new(meta)),
            bulk: Arc::new(RwLock::new(Bytes::from(bulk))),
            meta_calls: Arc::new(RwLock::new(0)),
            snapshot_calls: Arc::new(RwLock::new(Vec::new())),
            asset_calls: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn set_meta(&self, meta: RunMetadata) {
        *self.meta.write().await = meta;
    }

    pub async fn set_bulk(&self, bulk: impl Into<Bytes>) {
        *self.bulk.write().await = bulk.into();
    }

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: GatewayError) {
        *self.next_error.write().await = Some(error);
    }

    pub async fn meta_calls(&self) -> usize {
        *self.meta_calls.read().await
    }

    pub async fn snapshot_calls(&self) -> Vec<SnapshotKind> {
        self.snapshot_calls.read().await.clone()
    }

    pub async fn asset_calls(&self) -> Vec<String> {
        self.asset_calls.read().await.clone()
    }

    async fn take_error(&self) -> Option<GatewayError> {
        self.next_error.write().await.take()
    }
}

#[async_trait]
impl CatalogSource for MockCatalogSource {
    async fn fetch_meta(&self) -> Result<RunMetadata, GatewayError> {
        *self.meta_calls.write().await += 1;
        if let Some(error) = self.take_error().await {
            return Err(error);
        }
        Ok(self.meta.read().await.clone())
    }

    async fn fetch_snapshot(&self, kind: SnapshotKind) -> Result<Bytes, GatewayError> {
        self.snapshot_calls.write().await.push(kind);
        if let Some(error) = self.take_error().await {
            return Err(error);
        }
        match kind {
            SnapshotKind::Bulk => Ok(self.bulk.read().await.clone()),
            SnapshotKind::Meta => Ok(Bytes::from(fixtures::meta_json(
                &*self.meta.read().await,
            ))),
        }
    }

    async fn fetch_asset(&self, url: &str) -> Result<Bytes, GatewayError> {
        self.asset_calls.write().await.push(url.to_string());
        if let Some(error) = self.take_error().await {
            return Err(error);
        }
        Ok(Bytes::from(format!("asset:{}", url)))
    }
}
