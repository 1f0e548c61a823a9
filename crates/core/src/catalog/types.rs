//! Raw records as they appear in the bulk catalog and metadata documents.
//!
//! Only the fields the synchronizer reads are modelled; everything else in
//! the documents is ignored by serde. Fields the catalog model requires are
//! kept optional here so the entry builder can report which one is missing.

use std::fmt;

use chrono::NaiveDate;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};

/// One card (or token) record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCard {
    pub uuid: Option<String>,
    #[serde(default)]
    pub name: String,
    pub layout: Option<String>,
    pub set_code: Option<String>,
    pub language: Option<String>,
    #[serde(default)]
    pub identifiers: RawIdentifiers,
    pub side: Option<String>,
    #[serde(default)]
    pub promo_types: Vec<String>,
    pub other_face_ids: Option<Vec<String>>,
    #[serde(default)]
    pub is_reprint: bool,
    #[serde(default)]
    pub is_online_only: bool,
    #[serde(default)]
    pub is_funny: bool,
}

/// External identifiers attached to a card record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawIdentifiers {
    #[serde(rename = "scryfallId")]
    pub scryfall_id: Option<String>,
}

/// One set record with its cards and tokens.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSet {
    pub code: String,
    #[serde(rename = "type", default)]
    pub set_type: String,
    #[serde(default)]
    pub is_foreign_only: bool,
    #[serde(default)]
    pub is_online_only: bool,
    #[serde(default)]
    pub is_partial_preview: bool,
    #[serde(default)]
    pub cards: Vec<RawCard>,
    #[serde(default)]
    pub tokens: Vec<RawCard>,
}

/// The bulk catalog: every set, in document order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BulkDocument {
    #[serde(default)]
    pub meta: Option<RunMetadata>,
    #[serde(deserialize_with = "ordered_sets")]
    pub data: Vec<RawSet>,
}

/// The metadata document published next to the bulk catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaDocument {
    pub meta: RunMetadata,
}

/// Catalog version and publication date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub version: String,
    pub date: NaiveDate,
}

impl RunMetadata {
    /// Version without its `+build` date suffix.
    pub fn release(&self) -> &str {
        self.version
            .split_once('+')
            .map_or(self.version.as_str(), |(release, _)| release)
    }

    /// Leading component of the release version.
    pub fn major(&self) -> &str {
        self.release().split('.').next().unwrap_or_default()
    }
}

/// Deserialize a `code -> set` map into a list that keeps document order.
fn ordered_sets<'de, D>(deserializer: D) -> Result<Vec<RawSet>, D::Error>
where
    D: Deserializer<'de>,
{
    struct OrderedSets;

    impl<'de> Visitor<'de> for OrderedSets {
        type Value = Vec<RawSet>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of set code to set record")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut sets = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((_code, set)) = map.next_entry::<String, RawSet>()? {
                sets.push(set);
            }
            Ok(sets)
        }
    }

    deserializer.deserialize_map(OrderedSets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bulk_document_keeps_set_order() {
        let json = r#"{
            "meta": {"date": "2024-05-01", "version": "5.2.1+20240501"},
            "data": {
                "ZZZ": {"code": "ZZZ", "type": "core", "cards": [], "tokens": []},
                "AAA": {"code": "AAA", "type": "expansion", "cards": [], "tokens": []},
                "MMM": {"code": "MMM", "type": "masters"}
            }
        }"#;
        let bulk: BulkDocument = serde_json::from_str(json).unwrap();
        let codes: Vec<&str> = bulk.data.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, vec!["ZZZ", "AAA", "MMM"]);
        assert_eq!(bulk.data[1].set_type, "expansion");
        assert!(bulk.data[2].cards.is_empty());
    }

    #[test]
    fn test_raw_card_camel_case_fields() {
        let json = r#"{
            "uuid": "u1",
            "name": "Fire // Ice",
            "layout": "split",
            "setCode": "MH2",
            "language": "English",
            "identifiers": {"scryfallId": "s1", "mtgoId": "123"},
            "promoTypes": ["prerelease"],
            "otherFaceIds": ["u2"],
            "isReprint": true,
            "colors": ["R", "U"]
        }"#;
        let card: RawCard = serde_json::from_str(json).unwrap();
        assert_eq!(card.uuid.as_deref(), Some("u1"));
        assert_eq!(card.identifiers.scryfall_id.as_deref(), Some("s1"));
        assert_eq!(card.other_face_ids, Some(vec!["u2".to_string()]));
        assert!(card.is_reprint);
        assert!(!card.is_funny);
    }

    #[test]
    fn test_run_metadata_version_parts() {
        let meta = RunMetadata {
            version: "5.2.1+20240501".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        };
        assert_eq!(meta.release(), "5.2.1");
        assert_eq!(meta.major(), "5");

        let plain = RunMetadata {
            version: "6.0.0".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        };
        assert_eq!(plain.release(), "6.0.0");
        assert_eq!(plain.major(), "6");
    }

    #[test]
    fn test_meta_document_parses() {
        let json = r#"{"meta": {"date": "2024-05-01", "version": "5.2.1+20240501"}, "data": {}}"#;
        let doc: MetaDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.meta.release(), "5.2.1");
    }
}
