//! Run-level driver: refresh the catalog snapshot when outdated, then run
//! every set of the catalog in order.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::cardbacks::{pull_cardbacks, CARDBACK_URLS};
use super::set_runner::SetRunner;
use super::types::{Progress, RunOutcome, RunReport, SyncError};
use crate::catalog::{
    CatalogPolicy, CatalogSnapshot, RawSet, RunMetadata, SetEntry, SnapshotKind,
};
use crate::config::Config;
use crate::gateway::{CatalogSource, RemoteGateway};
use crate::state::{FileStateStorage, StateStore};

/// Catalog release line the classification rules were written against.
pub const SUPPORTED_CATALOG_VERSION: &str = "5.2.1";

/// Asks the operator whether to proceed with an unsupported catalog version.
#[async_trait]
pub trait VersionGate: Send + Sync {
    async fn confirm_version_drift(&self, remote: &RunMetadata, supported: &str) -> bool;
}

/// Always answers the same way. Used for unattended runs.
#[derive(Debug, Clone, Copy)]
pub struct FixedVersionGate(pub bool);

#[async_trait]
impl VersionGate for FixedVersionGate {
    async fn confirm_version_drift(&self, _remote: &RunMetadata, _supported: &str) -> bool {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Same publication date and no forced walk.
    UpToDate,
    /// Same publication date, but sets are walked anyway.
    Current,
    /// Missing or older than the remote publication.
    Outdated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreshnessCheck {
    pub freshness: Freshness,
    pub local: Option<RunMetadata>,
    pub remote: RunMetadata,
}

pub struct SyncOrchestrator {
    config: Config,
    data_dir: PathBuf,
    gateway: Arc<dyn RemoteGateway>,
    source: Arc<dyn CatalogSource>,
    gate: Arc<dyn VersionGate>,
    cancel: CancellationToken,
}

impl SyncOrchestrator {
    pub fn new(
        config: Config,
        data_dir: impl Into<PathBuf>,
        gateway: Arc<dyn RemoteGateway>,
        source: Arc<dyn CatalogSource>,
        gate: Arc<dyn VersionGate>,
    ) -> Self {
        Self {
            config,
            data_dir: data_dir.into(),
            gateway,
            source,
            gate,
            cancel: CancellationToken::new(),
        }
    }

    /// Stop at the next card or set boundary when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn snapshot(&self) -> CatalogSnapshot {
        CatalogSnapshot::new(&self.data_dir)
    }

    /// Compare the local snapshot with the remote publication.
    pub async fn check_freshness(&self) -> Result<FreshnessCheck, SyncError> {
        let remote = self.source.fetch_meta().await?;
        let snapshot = self.snapshot();

        if !snapshot.exists() {
            debug!("No local catalog snapshot");
            return Ok(FreshnessCheck {
                freshness: Freshness::Outdated,
                local: None,
                remote,
            });
        }

        let local = snapshot.read_meta().await?;
        let freshness = if local.date != remote.date {
            Freshness::Outdated
        } else if self.config.sync.always_pull {
            Freshness::Current
        } else {
            Freshness::UpToDate
        };

        Ok(FreshnessCheck {
            freshness,
            local: Some(local),
            remote,
        })
    }

    pub async fn run(&self) -> Result<RunReport, SyncError> {
        let check = self.check_freshness().await?;

        if check.freshness == Freshness::UpToDate {
            info!("Catalog up to date ({}), nothing to do", check.remote.date);
            let mut report = RunReport::new(RunOutcome::UpToDate);
            report.catalog_date = Some(check.remote.date);
            return Ok(report);
        }

        if check.freshness == Freshness::Outdated && !self.version_accepted(&check.remote).await {
            info!("Declined catalog version {}", check.remote.version);
            return Ok(RunReport::new(RunOutcome::Declined));
        }

        let mut report = RunReport::new(RunOutcome::Finished);
        report.catalog_date = Some(check.remote.date);

        if self.cancel.is_cancelled() {
            report.outcome = RunOutcome::Interrupted;
            return Ok(report);
        }

        if check.freshness == Freshness::Outdated {
            self.refresh_snapshot(&check.remote).await?;
            report.catalog_refreshed = true;
        }

        if self.config.sync.pull_cardbacks {
            pull_cardbacks(self.source.as_ref(), &self.data_dir, &CARDBACK_URLS).await?;
        }

        let bulk = self.snapshot().read_bulk().await?;
        report.sets_total = bulk.data.len();
        self.run_sets(&bulk.data, &mut report).await?;

        if report.outcome == RunOutcome::Finished {
            info!("Finished successfully");
            report.low_res_sets = self.remaining_low_res(&bulk.data).await?;
            if !report.low_res_sets.is_empty() {
                info!(
                    "Remaining sets with low res scans: {}",
                    report.low_res_sets.join(", ")
                );
            }
        }

        Ok(report)
    }

    async fn version_accepted(&self, remote: &RunMetadata) -> bool {
        let supported_major = SUPPORTED_CATALOG_VERSION
            .split('.')
            .next()
            .unwrap_or_default();
        if remote.major() == supported_major {
            return true;
        }

        warn!(
            "Catalog version {} differs from supported version {}",
            remote.version, SUPPORTED_CATALOG_VERSION
        );
        self.gate
            .confirm_version_drift(remote, SUPPORTED_CATALOG_VERSION)
            .await
    }

    /// Download both documents before replacing either local file.
    async fn refresh_snapshot(&self, remote: &RunMetadata) -> Result<(), SyncError> {
        info!("Refreshing catalog snapshot to {}", remote.date);
        let bulk = self.source.fetch_snapshot(SnapshotKind::Bulk).await?;
        let meta = self.source.fetch_snapshot(SnapshotKind::Meta).await?;
        self.snapshot().replace(&bulk, &meta).await?;
        Ok(())
    }

    async fn run_sets(&self, sets: &[RawSet], report: &mut RunReport) -> Result<(), SyncError> {
        let policy = CatalogPolicy::new(&self.config.policy);
        let runner = SetRunner::new(
            self.gateway.clone(),
            &self.config.policy,
            &self.config.sync,
            self.cancel.clone(),
        );
        let total = sets.len();

        for (index, raw) in sets.iter().enumerate() {
            if self.cancel.is_cancelled() {
                info!("Interrupted before set {}", raw.code);
                report.outcome = RunOutcome::Interrupted;
                return Ok(());
            }

            let set = SetEntry::from_raw(raw, &policy, &self.data_dir)?;
            if set.omitted {
                debug!("Omitting set {} ({})", set.code, set.set_type);
                report.sets_omitted += 1;
                continue;
            }

            match runner.run(&set, Progress::new(index + 1, total)).await {
                Ok(set_report) => report.absorb(&set_report),
                Err(SyncError::Cancelled { set_code }) => {
                    info!("Interrupted during set {}, state flushed", set_code);
                    report.outcome = RunOutcome::Interrupted;
                    return Ok(());
                }
                Err(err) => {
                    error!("Run aborted: {}", err);
                    return Err(err);
                }
            }
        }

        Ok(())
    }

    /// Sets whose persisted state still holds a low resolution image.
    pub async fn remaining_low_res(&self, sets: &[RawSet]) -> Result<Vec<String>, SyncError> {
        let mut remaining = Vec::new();

        for raw in sets {
            let storage = FileStateStorage::for_set_dir(&self.data_dir.join(&raw.code));
            if !storage.path().exists() {
                continue;
            }
            let store = StateStore::open(storage).await?;
            if !store.all_high_res() {
                remaining.push(raw.code.clone());
            }
        }

        Ok(remaining)
    }
}
