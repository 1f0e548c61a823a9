//! Per-card fetch decision.
//!
//! A card is fetched when the provider has an image and the local copy is
//! missing or has a different resolution than the provider's. The checks
//! that need no network access live in [`precheck`] so the runner can skip
//! the remote lookup entirely for them.

use crate::catalog::CardEntry;
use crate::config::{ForeignReprintPolicy, Language, PolicyConfig};
use crate::gateway::{ImageStatus, RemoteCardStatus, UnavailableReason};

/// What the local side knows about a card's artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalView {
    /// The resolution flag in the set's state, if any.
    pub recorded: Option<bool>,
    /// Whether the artifact file is present on disk.
    pub file_exists: bool,
}

impl LocalView {
    pub fn new(recorded: Option<bool>, file_exists: bool) -> Self {
        Self {
            recorded,
            file_exists,
        }
    }

    /// An unrecorded artifact counts as low resolution.
    pub fn recorded_high_res(&self) -> bool {
        self.recorded.unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// No local file yet.
    New,
    /// A local file exists with a different resolution.
    Upgrade,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    SkipExcluded,
    /// Already recorded as high resolution and present on disk.
    SkipSatisfied,
    SkipUnavailable(UnavailableReason),
    /// Present locally with the resolution the provider offers.
    SkipUnchanged,
    Fetch { kind: FetchKind, high_res: bool },
}

impl Decision {
    pub fn is_fetch(&self) -> bool {
        matches!(self, Decision::Fetch { .. })
    }
}

/// Inputs of the decision that come from configuration.
#[derive(Debug, Clone)]
pub struct DecisionPolicy {
    pub language: Option<Language>,
    pub foreign_reprints: ForeignReprintPolicy,
}

impl DecisionPolicy {
    pub fn new(config: &PolicyConfig) -> Self {
        Self {
            language: config.language(),
            foreign_reprints: config.foreign_reprints,
        }
    }

    fn is_foreign_reprint(&self, remote: &RemoteCardStatus) -> bool {
        if !remote.reprint {
            return false;
        }
        let Some(code) = remote.language.as_deref() else {
            return false;
        };
        if Language::PHYREXIAN.matches_code(code) {
            return false;
        }
        match self.language {
            Some(language) => !language.matches_code(code),
            None => false,
        }
    }
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self::new(&PolicyConfig::default())
    }
}

/// Decide without the provider's answer, or `None` when it is needed.
pub fn precheck(card: &CardEntry, local: &LocalView) -> Option<Decision> {
    if card.excluded {
        return Some(Decision::SkipExcluded);
    }
    if local.recorded == Some(true) && local.file_exists {
        return Some(Decision::SkipSatisfied);
    }
    None
}

pub fn decide(
    card: &CardEntry,
    local: &LocalView,
    remote: &RemoteCardStatus,
    policy: &DecisionPolicy,
) -> Decision {
    if let Some(decision) = precheck(card, local) {
        return decision;
    }

    let high_res = match remote.image {
        ImageStatus::HighRes => true,
        ImageStatus::LowRes => false,
        ImageStatus::Unavailable(reason) => return Decision::SkipUnavailable(reason),
    };

    if policy.is_foreign_reprint(remote) {
        match policy.foreign_reprints {
            ForeignReprintPolicy::Skip => {
                return Decision::SkipUnavailable(UnavailableReason::ForeignReprint)
            }
            ForeignReprintPolicy::FetchMissing if local.file_exists => {
                return Decision::SkipUnchanged
            }
            ForeignReprintPolicy::FetchMissing | ForeignReprintPolicy::Allow => {}
        }
    }

    if local.file_exists && local.recorded_high_res() == high_res {
        return Decision::SkipUnchanged;
    }

    let kind = if local.file_exists {
        FetchKind::Upgrade
    } else {
        FetchKind::New
    };
    Decision::Fetch { kind, high_res }
}
