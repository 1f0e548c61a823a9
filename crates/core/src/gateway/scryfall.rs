//! Image provider client.
//!
//! The provider asks clients to keep request rates low (a few requests per
//! second at most) and to send a descriptive User-Agent.

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use super::retry::HttpFetcher;
use super::types::{ImageStatus, ProviderCard, RemoteCardStatus};
use super::{GatewayError, RemoteGateway};
use crate::catalog::Face;
use crate::config::GatewayConfig;

/// Image provider client.
pub struct ScryfallGateway {
    http: HttpFetcher,
    base_url: String,
}

impl ScryfallGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        Ok(Self {
            http: HttpFetcher::new(config)?,
            base_url: config.image_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn card_url(&self, lookup_key: &str) -> String {
        format!("{}/cards/{}", self.base_url, lookup_key)
    }
}

#[async_trait]
impl RemoteGateway for ScryfallGateway {
    async fn resolve_status(&self, lookup_key: &str) -> Result<RemoteCardStatus, GatewayError> {
        let url = self.card_url(lookup_key);
        debug!("Resolving image status: {}", lookup_key);

        let body = self.http.get_bytes(&url, &[("format", "json")]).await?;

        let card: ProviderCard = serde_json::from_slice(&body)
            .map_err(|e| GatewayError::malformed(&url, format!("invalid card JSON: {}", e)))?;

        let image_status = card
            .image_status
            .ok_or_else(|| GatewayError::malformed(&url, "card has no image_status"))?;

        Ok(RemoteCardStatus {
            image: ImageStatus::from_provider(&image_status),
            language: card.lang,
            reprint: card.reprint,
        })
    }

    async fn fetch_bytes(
        &self,
        lookup_key: &str,
        face: Option<Face>,
    ) -> Result<Bytes, GatewayError> {
        let url = self.card_url(lookup_key);
        debug!("Fetching image: {} (face: {:?})", lookup_key, face);

        let mut query = vec![("format", "image")];
        if let Some(face) = face {
            query.push(("face", face.as_str()));
        }

        let body = self.http.get_bytes(&url, &query).await?;
        if body.is_empty() {
            return Err(GatewayError::malformed(&url, "empty image body"));
        }

        Ok(body)
    }
}
