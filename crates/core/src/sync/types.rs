use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

use crate::catalog::{CardEntry, CatalogError};
use crate::gateway::GatewayError;
use crate::state::StateError;

use super::decision::{Decision, FetchKind};

/// Errors that end a run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Corrupt or incompatible catalog snapshot.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Unreadable or unwritable resolution state.
    #[error("state error: {0}")]
    State(#[from] StateError),

    /// A remote call for a card failed for good; the set was flushed and abandoned.
    #[error("set {set_code} aborted at card {card}: {source}")]
    Gateway {
        set_code: String,
        card: String,
        #[source]
        source: GatewayError,
    },

    /// A remote call outside of set processing failed for good.
    #[error("remote error: {0}")]
    Remote(#[from] GatewayError),

    /// A downloaded image could not be stored.
    #[error("failed to store {path}: {source}")]
    Artifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Processing stopped at an operator's request after flushing state.
    #[error("set {set_code} interrupted")]
    Cancelled { set_code: String },
}

impl SyncError {
    pub(crate) fn gateway(card: &CardEntry, source: GatewayError) -> Self {
        Self::Gateway {
            set_code: card.set_code.clone(),
            card: card.to_string(),
            source,
        }
    }

    /// Corrupt catalog or state data, as opposed to a remote failure.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Catalog(_) | Self::State(_))
    }
}

/// Position within a sequence, rendered as a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
}

impl Progress {
    pub fn new(current: usize, total: usize) -> Self {
        Self { current, total }
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.current >= self.total {
            return f.write_str(" (100%)");
        }
        let percent = self.current as f64 / self.total as f64 * 100.0;
        write!(f, "({:>5.1}%)", percent)
    }
}

/// What happened to one set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetReport {
    pub set_code: String,
    /// Skipped without opening any card: every recorded image is high resolution.
    pub skipped_complete: bool,
    pub fetched_new: usize,
    pub upgraded: usize,
    pub unchanged: usize,
    pub satisfied: usize,
    pub unavailable: usize,
    pub excluded: usize,
    /// The state file was rewritten at the end of the set.
    pub state_written: bool,
}

impl SetReport {
    pub fn new(set_code: impl Into<String>) -> Self {
        Self {
            set_code: set_code.into(),
            ..Default::default()
        }
    }

    pub fn fetched(&self) -> usize {
        self.fetched_new + self.upgraded
    }

    pub(crate) fn record(&mut self, decision: &Decision) {
        match decision {
            Decision::SkipExcluded => self.excluded += 1,
            Decision::SkipSatisfied => self.satisfied += 1,
            Decision::SkipUnavailable(_) => self.unavailable += 1,
            Decision::SkipUnchanged => self.unchanged += 1,
            Decision::Fetch {
                kind: FetchKind::New,
                ..
            } => self.fetched_new += 1,
            Decision::Fetch {
                kind: FetchKind::Upgrade,
                ..
            } => self.upgraded += 1,
        }
    }
}

/// How a run ended, when it ended without an unrecoverable error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every eligible set was processed.
    Finished,
    /// The local catalog is current and no forced refresh is configured.
    UpToDate,
    /// The operator declined to continue with an unsupported catalog version.
    Declined,
    /// The operator interrupted the run; the active set's state was flushed.
    Interrupted,
}

/// Summary of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub catalog_date: Option<NaiveDate>,
    pub catalog_refreshed: bool,
    pub sets_total: usize,
    pub sets_processed: usize,
    pub sets_skipped_complete: usize,
    pub sets_omitted: usize,
    pub cards_new: usize,
    pub cards_upgraded: usize,
    /// Sets whose persisted state still records low resolution images.
    pub low_res_sets: Vec<String>,
}

impl RunReport {
    pub(crate) fn new(outcome: RunOutcome) -> Self {
        Self {
            outcome,
            catalog_date: None,
            catalog_refreshed: false,
            sets_total: 0,
            sets_processed: 0,
            sets_skipped_complete: 0,
            sets_omitted: 0,
            cards_new: 0,
            cards_upgraded: 0,
            low_res_sets: Vec::new(),
        }
    }

    pub(crate) fn absorb(&mut self, set: &SetReport) {
        if set.skipped_complete {
            self.sets_skipped_complete += 1;
        } else {
            self.sets_processed += 1;
        }
        self.cards_new += set.fetched_new;
        self.cards_upgraded += set.upgraded;
    }
}
