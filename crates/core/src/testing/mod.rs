//! Testing utilities and mock implementations.
//!
//! Every remote seam of the synchronizer has a mock here, so a full run can be
//! exercised against a temporary directory without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use planar_core::testing::{fixtures, MockCatalogSource, MockGateway};
//!
//! let gateway = MockGateway::new();
//! gateway.set_status("scry-A1", RemoteCardStatus::high_res()).await;
//!
//! let source = MockCatalogSource::new();
//! source.set_bulk(fixtures::bulk_json(&meta, &[set])).await;
//! ```

mod mock_catalog_source;
mod mock_gateway;
mod mock_state_storage;
mod mock_version_gate;

pub use mock_catalog_source::MockCatalogSource;
pub use mock_gateway::MockGateway;
pub use mock_state_storage::MockStateStorage;
pub use mock_version_gate::MockVersionGate;

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::NaiveDate;

    use crate::catalog::{MetaDocument, RawCard, RawIdentifiers, RawSet, RunMetadata};

    /// An English card of set `TST` whose provider key is `scry-{id}`.
    pub fn raw_card(id: &str, name: &str, layout: &str) -> RawCard {
        RawCard {
            uuid: Some(id.to_string()),
            name: name.to_string(),
            layout: Some(layout.to_string()),
            set_code: Some("TST".to_string()),
            language: Some("English".to_string()),
            identifiers: RawIdentifiers {
                scryfall_id: Some(format!("scry-{}", id)),
            },
            ..Default::default()
        }
    }

    /// Both halves of a combined card, each naming the other.
    pub fn combined_pair(first: &str, second: &str, layout: &str) -> [RawCard; 2] {
        let mut a = raw_card(first, &format!("{} // {}", first, second), layout);
        a.other_face_ids = Some(vec![second.to_string()]);
        let mut b = raw_card(second, &format!("{} // {}", first, second), layout);
        b.other_face_ids = Some(vec![first.to_string()]);
        b.side = Some("b".to_string());
        [a, b]
    }

    /// An expansion set.
    pub fn raw_set(code: &str, cards: Vec<RawCard>, tokens: Vec<RawCard>) -> RawSet {
        RawSet {
            code: code.to_string(),
            set_type: "expansion".to_string(),
            cards,
            tokens,
            ..Default::default()
        }
    }

    /// Catalog metadata; an unparsable date falls back to the epoch.
    pub fn meta(version: &str, date: &str) -> RunMetadata {
        RunMetadata {
            version: version.to_string(),
            date: date.parse::<NaiveDate>().unwrap_or_default(),
        }
    }

    pub fn meta_json(meta: &RunMetadata) -> String {
        serde_json::to_string(&MetaDocument { meta: meta.clone() }).unwrap_or_default()
    }

    /// A bulk catalog document listing `sets` in the given order.
    pub fn bulk_json(meta: &RunMetadata, sets: &[RawSet]) -> String {
        let meta = serde_json::to_string(meta).unwrap_or_default();
        let data = sets
            .iter()
            .map(|set| {
                format!(
                    "{:?}: {}",
                    set.code,
                    serde_json::to_string(set).unwrap_or_default()
                )
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!(r#"{{"meta": {}, "data": {{{}}}}}"#, meta, data)
    }
}
