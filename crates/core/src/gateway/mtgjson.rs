//! Catalog publisher client.

use std::io::Read;

use async_trait::async_trait;
use bytes::Bytes;
use flate2::read::GzDecoder;
use tracing::{debug, info};

use super::retry::HttpFetcher;
use super::{CatalogSource, GatewayError};
use crate::catalog::{MetaDocument, RunMetadata, SnapshotKind};
use crate::config::GatewayConfig;

/// Catalog publisher client.
pub struct MtgjsonSource {
    http: HttpFetcher,
    base_url: String,
}

impl MtgjsonSource {
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        Ok(Self {
            http: HttpFetcher::new(config)?,
            base_url: config.catalog_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl CatalogSource for MtgjsonSource {
    async fn fetch_meta(&self) -> Result<RunMetadata, GatewayError> {
        let url = format!("{}/Meta.json", self.base_url);
        let body = self.http.get_bytes(&url, &[]).await?;

        let doc: MetaDocument = serde_json::from_slice(&body)
            .map_err(|e| GatewayError::malformed(&url, format!("invalid metadata: {}", e)))?;

        debug!("Remote catalog: {} ({})", doc.meta.version, doc.meta.date);
        Ok(doc.meta)
    }

    async fn fetch_snapshot(&self, kind: SnapshotKind) -> Result<Bytes, GatewayError> {
        let url = format!("{}/{}.json.gz", self.base_url, kind.document_name());
        info!("Downloading {}", url);

        let compressed = self.http.get_bytes(&url, &[]).await?;
        let json = gunzip(&compressed)
            .map_err(|e| GatewayError::malformed(&url, format!("gzip decode failed: {}", e)))?;

        debug!(
            "Decompressed {} ({} -> {} bytes)",
            kind.document_name(),
            compressed.len(),
            json.len()
        );
        Ok(Bytes::from(json))
    }

    async fn fetch_asset(&self, url: &str) -> Result<Bytes, GatewayError> {
        self.http.get_bytes(url, &[]).await
    }
}

fn gunzip(compressed: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(compressed);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}
