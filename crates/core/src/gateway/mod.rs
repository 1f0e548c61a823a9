//! Remote endpoints: the image provider (status lookup and image download)
//! and the catalog publisher (metadata, bulk snapshots, static assets).
//!
//! Both clients share one request discipline: a pacing wait before every
//! request, bounded retries with a linearly growing delay on transient
//! failures, and immediate failure on malformed payloads.

mod mtgjson;
mod retry;
mod scryfall;
mod types;

pub use mtgjson::MtgjsonSource;
pub use retry::{Pacer, RetryPolicy};
pub use scryfall::ScryfallGateway;
pub use types::{ImageStatus, RemoteCardStatus, UnavailableReason};

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::catalog::{Face, RunMetadata, SnapshotKind};

/// Errors returned by remote calls. Every variant is unrecoverable for the
/// current run; transient failures are retried before one of these surfaces.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Every attempt failed with a transient error.
    #[error("Request to {url} failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        last_error: String,
    },

    /// The response arrived but its payload is unusable.
    #[error("Malformed response from {url}: {message}")]
    Malformed { url: String, message: String },
}

impl GatewayError {
    pub(crate) fn malformed(url: &str, message: impl Into<String>) -> Self {
        Self::Malformed {
            url: url.to_string(),
            message: message.into(),
        }
    }
}

/// The image provider.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Current image status of a card.
    async fn resolve_status(&self, lookup_key: &str) -> Result<RemoteCardStatus, GatewayError>;

    /// Image bytes of a card, or of one face of a two-sided card.
    async fn fetch_bytes(&self, lookup_key: &str, face: Option<Face>)
        -> Result<Bytes, GatewayError>;
}

/// The catalog publisher.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Version and date of the published catalog.
    async fn fetch_meta(&self) -> Result<RunMetadata, GatewayError>;

    /// Full, decompressed snapshot document.
    async fn fetch_snapshot(&self, kind: SnapshotKind) -> Result<Bytes, GatewayError>;

    /// A static file by absolute URL.
    async fn fetch_asset(&self, url: &str) -> Result<Bytes, GatewayError>;
}
