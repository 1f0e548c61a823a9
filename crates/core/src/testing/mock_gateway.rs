//! Mock image provider for testing.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::catalog::Face;
use crate::gateway::{GatewayError, RemoteCardStatus, RemoteGateway};

/// Mock implementation of the RemoteGateway trait.
///
/// - Unknown keys resolve as high resolution.
/// - Image bytes default to `image:{key}`.
/// - Failures are one-shot per key.
#[derive(Debug, Clone, Default)]
pub struct MockGateway {
    statuses: Arc<RwLock<HashMap<String, RemoteCardStatus>>>,
    images: Arc<RwLock<HashMap<String, Bytes>>>,
    resolve_failures: Arc<RwLock<HashMap<String, GatewayError>>>,
    fetch_failures: Arc<RwLock<HashMap<String, GatewayError>>>,
    resolve_calls: Arc<RwLock<Vec<String>>>,
    fetch_calls: Arc<RwLock<Vec<(String, Option<Face>)>>>,
    cancel_after: Arc<RwLock<HashMap<String, CancellationToken>>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_status(&self, lookup_key: &str, status: RemoteCardStatus) {
        self.statuses
            .write()
            .await
            .insert(lookup_key.to_string(), status);
    }

    pub async fn set_image(&self, lookup_key: &str, bytes: impl Into<Bytes>) {
        self.images
            .write()
            .await
            .insert(lookup_key.to_string(), bytes.into());
    }

    /// Fail the next status lookup for `lookup_key`.
    pub async fn fail_resolve(&self, lookup_key: &str, error: GatewayError) {
        self.resolve_failures
            .write()
            .await
            .insert(lookup_key.to_string(), error);
    }

    /// Fail the next image download for `lookup_key`.
    pub async fn fail_fetch(&self, lookup_key: &str, error: GatewayError) {
        self.fetch_failures
            .write()
            .await
            .insert(lookup_key.to_string(), error);
    }

    /// Cancel `token` once the image for `lookup_key` has been served.
    pub async fn cancel_after_fetch(&self, lookup_key: &str, token: CancellationToken) {
        self.cancel_after
            .write()
            .await
            .insert(lookup_key.to_string(), token);
    }

    /// Keys passed to `resolve_status`, in call order.
    pub async fn resolve_calls(&self) -> Vec<String> {
        self.resolve_calls.read().await.clone()
    }

    /// Keys passed to `fetch_bytes`, in call order.
    pub async fn fetch_calls(&self) -> Vec<String> {
        self.fetch_calls
            .read()
            .await
            .iter()
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Faces passed to `fetch_bytes`, in call order.
    pub async fn fetch_faces(&self) -> Vec<Option<Face>> {
        self.fetch_calls
            .read()
            .await
            .iter()
            .map(|(_, face)| *face)
            .collect()
    }

    pub async fn clear_recorded(&self) {
        self.resolve_calls.write().await.clear();
        self.fetch_calls.write().await.clear();
    }
}

#[async_trait]
impl RemoteGateway for MockGateway {
    async fn resolve_status(&self, lookup_key: &str) -> Result<RemoteCardStatus, GatewayError> {
        self.resolve_calls
            .write()
            .await
            .push(lookup_key.to_string());

        if let Some(error) = self.resolve_failures.write().await.remove(lookup_key) {
            return Err(error);
        }

        Ok(self
            .statuses
            .read()
            .await
            .get(lookup_key)
            .cloned()
            .unwrap_or_else(RemoteCardStatus::high_res))
    }

    async fn fetch_bytes(
        &self,
        lookup_key: &str,
        face: Option<Face>,
    ) -> Result<Bytes, GatewayError> {
        self.fetch_calls
            .write()
            .await
            .push((lookup_key.to_string(), face));

        if let Some(error) = self.fetch_failures.write().await.remove(lookup_key) {
            return Err(error);
        }

        let bytes = self
            .images
            .read()
            .await
            .get(lookup_key)
            .cloned()
            .unwrap_or_else(|| Bytes::from(format!("image:{}", lookup_key)));

        if let Some(token) = self.cancel_after.write().await.remove(lookup_key) {
            token.cancel();
        }

        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::ImageStatus;

    #[tokio::test]
    async fn test_defaults_and_recording() {
        let gateway = MockGateway::new();
        gateway.set_status("k1", RemoteCardStatus::low_res()).await;

        let status = gateway.resolve_status("k1").await.unwrap();
        assert_eq!(status.image, ImageStatus::LowRes);
        let status = gateway.resolve_status("k2").await.unwrap();
        assert_eq!(status.image, ImageStatus::HighRes);

        let bytes = gateway.fetch_bytes("k1", Some(Face::Back)).await.unwrap();
        assert_eq!(&bytes[..], b"image:k1");

        assert_eq!(gateway.resolve_calls().await, vec!["k1", "k2"]);
        assert_eq!(gateway.fetch_faces().await, vec![Some(Face::Back)]);
    }

    #[tokio::test]
    async fn test_failures_are_one_shot() {
        let gateway = MockGateway::new();
        gateway
            .fail_fetch("k1", GatewayError::malformed("https://x", "empty image body"))
            .await;

        assert!(gateway.fetch_bytes("k1", None).await.is_err());
        assert!(gateway.fetch_bytes("k1", None).await.is_ok());
    }

    #[tokio::test]
    async fn test_cancel_after_fetch() {
        let gateway = MockGateway::new();
        let token = CancellationToken::new();
        gateway.cancel_after_fetch("k2", token.clone()).await;

        gateway.fetch_bytes("k1", None).await.unwrap();
        assert!(!token.is_cancelled());
        gateway.fetch_bytes("k2", None).await.unwrap();
        assert!(token.is_cancelled());
    }
}
