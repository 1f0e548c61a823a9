use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::state::{StateError, StateStorage};

/// In-memory state document. Clones share the same document.
#[derive(Debug, Clone, Default)]
pub struct MockStateStorage {
    contents: Arc<RwLock<Option<String>>>,
    writes: Arc<RwLock<usize>>,
}

impl MockStateStorage {
    /// Storage with nothing persisted.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(contents: &str) -> Self {
        Self {
            contents: Arc::new(RwLock::new(Some(contents.to_string()))),
            writes: Arc::new(RwLock::new(0)),
        }
    }

    pub async fn contents(&self) -> Option<String> {
        self.contents.read().await.clone()
    }

    /// Number of `save` calls so far.
    pub async fn write_count(&self) -> usize {
        *self.writes.read().await
    }
}

#[async_trait]
impl StateStorage for MockStateStorage {
    fn location(&self) -> String {
        "memory".to_string()
    }

    async fn load(&self) -> Result<Option<String>, StateError> {
        Ok(self.contents.read().await.clone())
    }

    async fn save(&self, contents: &str) -> Result<(), StateError> {
        *self.contents.write().await = Some(contents.to_string());
        *self.writes.write().await += 1;
        Ok(())
    }
}
