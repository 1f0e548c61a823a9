use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::SyncError;
use crate::catalog::ARTIFACT_EXTENSION;
use crate::fs_util::write_atomic;
use crate::gateway::CatalogSource;

/// Generic card-back images, numbered from 1 in this order.
pub const CARDBACK_URLS: [&str; 3] = [
    "https://i.imgur.com/xiYusFq.jpg",
    "https://i.imgur.com/m8SkBeQ.jpg",
    "https://i.imgur.com/FLa7Gth.jpg",
];

pub const CARDBACK_DIR: &str = ".cardbacks";

pub fn cardback_path(data_dir: &Path, number: usize) -> PathBuf {
    data_dir
        .join(CARDBACK_DIR)
        .join(format!("cardback-{}.{}", number, ARTIFACT_EXTENSION))
}

/// Download the card backs that are not on disk yet. Returns how many were written.
pub async fn pull_cardbacks(
    source: &dyn CatalogSource,
    data_dir: &Path,
    urls: &[&str],
) -> Result<usize, SyncError> {
    let mut written = 0;

    for (index, url) in urls.iter().enumerate() {
        let path = cardback_path(data_dir, index + 1);
        if path.exists() {
            debug!("Card back present: {}", path.display());
            continue;
        }

        let bytes = source.fetch_asset(url).await?;
        write_atomic(&path, &bytes)
            .await
            .map_err(|source| SyncError::Artifact {
                path: path.clone(),
                source,
            })?;
        written += 1;
    }

    if written > 0 {
        info!("Pulled {} card backs", written);
    }
    Ok(written)
}
