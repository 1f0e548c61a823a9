use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::catalog::RunMetadata;
use crate::sync::VersionGate;

/// Answers version-drift prompts with a fixed reply and counts them.
#[derive(Debug, Clone)]
pub struct MockVersionGate {
    answer: bool,
    prompts: Arc<RwLock<Vec<String>>>,
}

impl MockVersionGate {
    pub fn new(answer: bool) -> Self {
        Self {
            answer,
            prompts: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn prompt_count(&self) -> usize {
        self.prompts.read().await.len()
    }

    /// Remote versions the gate was asked about.
    pub async fn prompted_versions(&self) -> Vec<String> {
        self.prompts.read().await.clone()
    }
}

#[async_trait]
impl VersionGate for MockVersionGate {
    async fn confirm_version_drift(&self, remote: &RunMetadata, _supported: &str) -> bool {
        self.prompts.write().await.push(remote.version.clone());
        self.answer
    }
}
