//! Runs one set: load its state, walk its cards, flush the state.
//!
//! The state is flushed on every exit path once loaded: normal completion,
//! a fatal remote failure, and cancellation.

use std::collections::HashSet;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::decision::{decide, precheck, Decision, DecisionPolicy, FetchKind, LocalView};
use super::types::{Progress, SetReport, SyncError};
use crate::catalog::{CardEntry, SetEntry};
use crate::config::{PolicyConfig, SyncConfig};
use crate::fs_util::write_atomic;
use crate::gateway::RemoteGateway;
use crate::state::{StateStorage, StateStore};

pub struct SetRunner {
    gateway: Arc<dyn RemoteGateway>,
    policy: DecisionPolicy,
    continuous_sets: HashSet<String>,
    cancel: CancellationToken,
}

impl SetRunner {
    pub fn new(
        gateway: Arc<dyn RemoteGateway>,
        policy: &PolicyConfig,
        sync: &SyncConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            gateway,
            policy: DecisionPolicy::new(policy),
            continuous_sets: sync.continuous_sets.iter().cloned().collect(),
            cancel,
        }
    }

    /// Process a set against its on-disk state file.
    pub async fn run(&self, set: &SetEntry, progress: Progress) -> Result<SetReport, SyncError> {
        let mut state = StateStore::open_file(set.state_path()).await?;
        self.run_with_state(set, &mut state, progress).await
    }

    /// Process a set against an already opened state.
    pub async fn run_with_state<S: StateStorage>(
        &self,
        set: &SetEntry,
        state: &mut StateStore<S>,
        progress: Progress,
    ) -> Result<SetReport, SyncError> {
        let mut report = SetReport::new(&set.code);

        if self.is_complete(set, state) {
            info!(progress = %progress, "SKIP SET {}: all images high resolution", set.code);
            report.skipped_complete = true;
            return Ok(report);
        }

        info!(progress = %progress, "LOAD SET {}", set.code);

        match self.walk(set, state, &mut report).await {
            Ok(()) => {
                report.state_written = state.write().await?;
                debug!(
                    "Set {} done: {} new, {} upgraded, {} unchanged",
                    set.code, report.fetched_new, report.upgraded, report.unchanged
                );
                Ok(report)
            }
            Err(err) => {
                if let Err(flush_err) = state.write().await {
                    error!(
                        "Failed to flush state for {} after abort: {}",
                        set.code, flush_err
                    );
                }
                Err(err)
            }
        }
    }

    /// A set can be skipped whole once every eligible card is recorded and
    /// every recorded image is high resolution, unless it keeps growing.
    fn is_complete<S: StateStorage>(&self, set: &SetEntry, state: &StateStore<S>) -> bool {
        !state.is_empty()
            && state.all_high_res()
            && !self.continuous_sets.contains(&set.code)
            && !set.partial_preview
            && set
                .entries
                .iter()
                .filter(|card| !card.excluded)
                .all(|card| state.get(&card.artifact_key).is_some())
    }

    async fn walk<S: StateStorage>(
        &self,
        set: &SetEntry,
        state: &mut StateStore<S>,
        report: &mut SetReport,
    ) -> Result<(), SyncError> {
        let total = set.entries.len();

        for (index, card) in set.entries.iter().enumerate() {
            if self.cancel.is_cancelled() {
                info!("Interrupted in {} before {}", set.code, card);
                return Err(SyncError::Cancelled {
                    set_code: set.code.clone(),
                });
            }

            let decision = self.process_card(card, state).await?;
            report.record(&decision);

            if let Decision::Fetch { kind, .. } = decision {
                let progress = Progress::new(index + 1, total);
                match kind {
                    FetchKind::New => info!(progress = %progress, "NEW CARD {}", card),
                    FetchKind::Upgrade => info!(progress = %progress, "ENHANCED {}", card),
                }
            }
        }

        Ok(())
    }

    async fn process_card<S: StateStorage>(
        &self,
        card: &CardEntry,
        state: &mut StateStore<S>,
    ) -> Result<Decision, SyncError> {
        let path = card.artifact_path();
        let local = LocalView::new(state.get(&card.artifact_key), path.exists());

        if let Some(decision) = precheck(card, &local) {
            return Ok(decision);
        }

        let remote = self
            .gateway
            .resolve_status(&card.lookup_key)
            .await
            .map_err(|e| SyncError::gateway(card, e))?;

        let decision = decide(card, &local, &remote, &self.policy);
        match decision {
            Decision::Fetch { high_res, .. } => {
                let bytes = self
                    .gateway
                    .fetch_bytes(&card.lookup_key, card.face)
                    .await
                    .map_err(|e| SyncError::gateway(card, e))?;

                write_atomic(&path, &bytes)
                    .await
                    .map_err(|source| SyncError::Artifact {
                        path: path.clone(),
                        source,
                    })?;

                state.put(card.artifact_key.clone(), high_res);
            }
            Decision::SkipUnavailable(reason) => {
                debug!("Unavailable upstream ({:?}): {}", reason, card);
            }
            _ => {}
        }

        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogPolicy;
    use crate::gateway::{GatewayError, RemoteCardStatus};
    use crate::testing::fixtures::{raw_card, raw_set};
    use crate::testing::{MockGateway, MockStateStorage};
    use tempfile::TempDir;

    fn runner(gateway: &MockGateway, cancel: CancellationToken) -> SetRunner {
        SetRunner::new(
            Arc::new(gateway.clone()),
            &PolicyConfig::default(),
            &SyncConfig::default(),
            cancel,
        )
    }

    fn two_card_set(data_dir: &std::path::Path) -> SetEntry {
        let set = raw_set(
            "TST",
            vec![
                raw_card("A1", "Alpha", "normal"),
                raw_card("B1", "Beta", "normal"),
            ],
            vec![],
        );
        SetEntry::from_raw(&set, &CatalogPolicy::default(), data_dir).unwrap()
    }

    #[tokio::test]
    async fn test_fetches_new_cards_and_flushes_state() {
        let dir = TempDir::new().unwrap();
        let set = two_card_set(dir.path());
        let gateway = MockGateway::new();
        gateway.set_status("scry-A1", RemoteCardStatus::high_res()).await;
        gateway.set_status("scry-B1", RemoteCardStatus::low_res()).await;

        let storage = MockStateStorage::new();
        let mut state = StateStore::open(storage.clone()).await.unwrap();

        let report = runner(&gateway, CancellationToken::new())
            .run_with_state(&set, &mut state, Progress::new(1, 1))
            .await
            .unwrap();

        assert_eq!(report.fetched_new, 2);
        assert!(report.state_written);
        assert!(dir.path().join("TST").join("A1.jpg").exists());
        assert!(dir.path().join("TST").join("B1.jpg").exists());
        assert_eq!(
            storage.contents().await.as_deref(),
            Some(r#"{"A1":true,"B1":false}"#)
        );
    }

    #[tokio::test]
    async fn test_complete_set_is_skipped_without_remote_calls() {
        let dir = TempDir::new().unwrap();
        let set = two_card_set(dir.path());
        let gateway = MockGateway::new();

        let storage = MockStateStorage::with_contents(r#"{"A1":true,"B1":true}"#);
        let mut state = StateStore::open(storage.clone()).await.unwrap();

        let report = runner(&gateway, CancellationToken::new())
            .run_with_state(&set, &mut state, Progress::new(1, 1))
            .await
            .unwrap();

        assert!(report.skipped_complete);
        assert_eq!(gateway.resolve_calls().await.len(), 0);
        assert_eq!(storage.write_count().await, 0);
    }

    #[tokio::test]
    async fn test_partially_recorded_set_is_walked() {
        let dir = TempDir::new().unwrap();
        let set = two_card_set(dir.path());
        std::fs::create_dir_all(&set.set_dir).unwrap();
        std::fs::write(set.set_dir.join("A1.jpg"), b"old").unwrap();

        let gateway = MockGateway::new();
        let storage = MockStateStorage::with_contents(r#"{"A1":true}"#);
        let mut state = StateStore::open(storage.clone()).await.unwrap();

        let report = runner(&gateway, CancellationToken::new())
            .run_with_state(&set, &mut state, Progress::new(1, 1))
            .await
            .unwrap();

        assert!(!report.skipped_complete);
        assert_eq!(report.satisfied, 1);
        assert_eq!(report.fetched_new, 1);
        assert_eq!(gateway.resolve_calls().await, vec!["scry-B1"]);
        assert_eq!(
            storage.contents().await.as_deref(),
            Some(r#"{"A1":true,"B1":true}"#)
        );
    }

    #[tokio::test]
    async fn test_empty_state_is_not_complete() {
        let dir = TempDir::new().unwrap();
        let set = two_card_set(dir.path());
        let gateway = MockGateway::new();
        let mut state = StateStore::open(MockStateStorage::with_contents("{}"))
            .await
            .unwrap();

        let report = runner(&gateway, CancellationToken::new())
            .run_with_state(&set, &mut state, Progress::new(1, 1))
            .await
            .unwrap();

        assert!(!report.skipped_complete);
        assert_eq!(gateway.resolve_calls().await.len(), 2);
    }

    #[tokio::test]
    async fn test_continuous_set_is_walked_even_when_complete() {
        let dir = TempDir::new().unwrap();
        let raw = raw_set("SLD", vec![raw_card("A1", "Alpha", "normal")], vec![]);
        let set = SetEntry::from_raw(&raw, &CatalogPolicy::default(), dir.path()).unwrap();
        std::fs::create_dir_all(&set.set_dir).unwrap();
        std::fs::write(set.set_dir.join("A1.jpg"), b"old").unwrap();

        let gateway = MockGateway::new();
        let storage = MockStateStorage::with_contents(r#"{"A1":true}"#);
        let mut state = StateStore::open(storage).await.unwrap();

        let report = runner(&gateway, CancellationToken::new())
            .run_with_state(&set, &mut state, Progress::new(1, 1))
            .await
            .unwrap();

        assert!(!report.skipped_complete);
        assert_eq!(report.satisfied, 1);
        assert_eq!(gateway.resolve_calls().await.len(), 0);
    }

    #[tokio::test]
    async fn test_fatal_error_flushes_progress() {
        let dir = TempDir::new().unwrap();
        let set = two_card_set(dir.path());
        let gateway = MockGateway::new();
        gateway.set_status("scry-A1", RemoteCardStatus::high_res()).await;
        gateway
            .fail_resolve(
                "scry-B1",
                GatewayError::RetriesExhausted {
                    url: "https://provider.test/cards/scry-B1".into(),
                    attempts: 5,
                    last_error: "HTTP status code 503".into(),
                },
            )
            .await;

        let storage = MockStateStorage::new();
        let mut state = StateStore::open(storage.clone()).await.unwrap();

        let err = runner(&gateway, CancellationToken::new())
            .run_with_state(&set, &mut state, Progress::new(1, 1))
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Gateway { ref set_code, .. } if set_code == "TST"));
        assert_eq!(storage.contents().await.as_deref(), Some(r#"{"A1":true}"#));
    }

    #[tokio::test]
    async fn test_cancellation_stops_at_card_boundary() {
        let dir = TempDir::new().unwrap();
        let set = two_card_set(dir.path());
        let gateway = MockGateway::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let storage = MockStateStorage::new();
        let mut state = StateStore::open(storage.clone()).await.unwrap();

        let err = runner(&gateway, cancel)
            .run_with_state(&set, &mut state, Progress::new(1, 1))
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Cancelled { .. }));
        assert_eq!(gateway.resolve_calls().await.len(), 0);
        // Nothing recorded, so nothing to persist.
        assert_eq!(storage.write_count().await, 0);
    }

    #[tokio::test]
    async fn test_cancellation_mid_set_flushes_progress() {
        let dir = TempDir::new().unwrap();
        let set = two_card_set(dir.path());
        let gateway = MockGateway::new();
        let cancel = CancellationToken::new();
        gateway.cancel_after_fetch("scry-A1", cancel.clone()).await;

        let storage = MockStateStorage::new();
        let mut state = StateStore::open(storage.clone()).await.unwrap();

        let err = runner(&gateway, cancel)
            .run_with_state(&set, &mut state, Progress::new(1, 1))
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Cancelled { ref set_code } if set_code == "TST"));
        assert_eq!(gateway.resolve_calls().await, vec!["scry-A1"]);
        assert_eq!(storage.write_count().await, 1);
        assert_eq!(storage.contents().await.as_deref(), Some(r#"{"A1":true}"#));
    }

    #[tokio::test]
    async fn test_failed_download_flushes_progress() {
        let dir = TempDir::new().unwrap();
        let set = two_card_set(dir.path());
        let gateway = MockGateway::new();
        gateway
            .fail_fetch(
                "scry-B1",
                GatewayError::RetriesExhausted {
                    url: "https://provider.test/images/scry-B1.jpg".into(),
                    attempts: 5,
                    last_error: "HTTP status code 503".into(),
                },
            )
            .await;

        let storage = MockStateStorage::new();
        let mut state = StateStore::open(storage.clone()).await.unwrap();

        let err = runner(&gateway, CancellationToken::new())
            .run_with_state(&set, &mut state, Progress::new(1, 1))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SyncError::Gateway {
                ref set_code,
                source: GatewayError::RetriesExhausted { attempts: 5, .. },
                ..
            } if set_code == "TST"
        ));
        assert_eq!(gateway.fetch_calls().await, vec!["scry-A1", "scry-B1"]);
        assert!(!dir.path().join("TST").join("B1.jpg").exists());
        assert_eq!(storage.contents().await.as_deref(), Some(r#"{"A1":true}"#));
    }

    #[tokio::test]
    async fn test_unavailable_card_is_not_recorded() {
        let dir = TempDir::new().unwrap();
        let set = two_card_set(dir.path());
        let gateway = MockGateway::new();
        gateway.set_status("scry-A1", RemoteCardStatus::high_res()).await;
        gateway
            .set_status(
                "scry-B1",
                RemoteCardStatus::new(crate::gateway::ImageStatus::Unavailable(
                    crate::gateway::UnavailableReason::Placeholder,
                )),
            )
            .await;

        let storage = MockStateStorage::new();
        let mut state = StateStore::open(storage.clone()).await.unwrap();

        let report = runner(&gateway, CancellationToken::new())
            .run_with_state(&set, &mut state, Progress::new(1, 1))
            .await
            .unwrap();

        assert_eq!(report.unavailable, 1);
        assert_eq!(gateway.fetch_calls().await, vec!["scry-A1".to_string()]);
        assert_eq!(storage.contents().await.as_deref(), Some(r#"{"A1":true}"#));
    }
}
