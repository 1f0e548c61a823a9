//! Incremental image synchronization.
//!
//! - [`SyncOrchestrator`] refreshes the catalog snapshot and drives the run.
//! - [`SetRunner`] processes one set and owns its resolution state.
//! - [`decide`] is the pure per-card fetch decision.

mod cardbacks;
mod decision;
mod orchestrator;
mod set_runner;
mod types;

pub use cardbacks::{cardback_path, pull_cardbacks, CARDBACK_DIR, CARDBACK_URLS};
pub use decision::{decide, precheck, Decision, DecisionPolicy, FetchKind, LocalView};
pub use orchestrator::{
    FixedVersionGate, Freshness, FreshnessCheck, SyncOrchestrator, VersionGate,
    SUPPORTED_CATALOG_VERSION,
};
pub use set_runner::SetRunner;
pub use types::{Progress, RunOutcome, RunReport, SetReport, SyncError};
