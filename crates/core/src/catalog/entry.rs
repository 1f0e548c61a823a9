//! Typed, immutable views over raw catalog records.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::{Language, PolicyConfig};
use crate::state::STATE_FILE_NAME;

use super::types::{RawCard, RawSet};
use super::CatalogError;

/// Extension of every stored artifact.
pub const ARTIFACT_EXTENSION: &str = "jpg";

/// Joins identifiers of a combined layout into one artifact key.
pub const ARTIFACT_KEY_DELIMITER: &str = "_";

/// Subdirectory of a set directory holding token artifacts.
pub const TOKEN_DIR: &str = "tokens";

/// Names of substitute cards printed in place of real ones.
const SUBSTITUTE_NAMES: [&str; 2] = ["Checklist", "Double-Faced"];

const COMBINED_LAYOUTS: [&str; 4] = ["adventure", "aftermath", "flip", "split"];
const TWO_SIDED_LAYOUTS: [&str; 3] = ["modal_dfc", "reversible_card", "transform"];
const TOKEN_LAYOUTS: [&str; 2] = ["token", "double_faced_token"];

/// Face and printing structure of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutKind {
    Ordinary,
    /// Several faces printed on one image.
    Combined,
    /// Front and back stored as separate images.
    TwoSided,
    Token,
    /// Never fetched.
    Excluded,
}

impl LayoutKind {
    pub fn classify(layout: &str, excluded_layouts: &HashSet<String>) -> Self {
        if excluded_layouts.contains(layout) {
            Self::Excluded
        } else if COMBINED_LAYOUTS.contains(&layout) {
            Self::Combined
        } else if TWO_SIDED_LAYOUTS.contains(&layout) {
            Self::TwoSided
        } else if TOKEN_LAYOUTS.contains(&layout) {
            Self::Token
        } else {
            Self::Ordinary
        }
    }
}

/// Which side of a two-sided card an image shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Face {
    Front,
    Back,
}

impl Face {
    pub fn as_str(&self) -> &'static str {
        match self {
            Face::Front => "front",
            Face::Back => "back",
        }
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Eligibility rules, prepared once per run from [`PolicyConfig`].
#[derive(Debug, Clone)]
pub struct CatalogPolicy {
    language: String,
    pull_reprints: bool,
    pardoned_sets: HashSet<String>,
    exempt_sets: HashSet<String>,
    exempt_promos: HashSet<String>,
    exempt_types: HashSet<String>,
    exempt_layouts: HashSet<String>,
}

impl CatalogPolicy {
    pub fn new(config: &PolicyConfig) -> Self {
        let language = config
            .language()
            .map(|l| l.name.to_string())
            .unwrap_or_else(|| config.card_lang.clone());

        Self {
            language,
            pull_reprints: config.pull_reprints,
            pardoned_sets: config.pardoned_sets.iter().cloned().collect(),
            exempt_sets: config.exempt_sets.iter().cloned().collect(),
            exempt_promos: config.exempt_promos.iter().cloned().collect(),
            exempt_types: config.exempt_types.iter().cloned().collect(),
            exempt_layouts: config.exempt_layouts.iter().cloned().collect(),
        }
    }

    fn is_card_excluded(&self, raw: &RawCard, layout: LayoutKind) -> bool {
        let wrong_language = match raw.language.as_deref() {
            Some(language) => language != self.language && language != Language::PHYREXIAN.name,
            None => true,
        };

        wrong_language
            || raw.is_online_only
            || raw.is_funny
            || layout == LayoutKind::Excluded
            || raw.promo_types.iter().any(|p| self.exempt_promos.contains(p))
            || (raw.is_reprint && !self.pull_reprints)
            || SUBSTITUTE_NAMES.contains(&raw.name.as_str())
    }

    fn is_set_omitted(&self, raw: &RawSet) -> bool {
        let omitted = self.exempt_types.contains(&raw.set_type)
            || self.exempt_sets.contains(&raw.code)
            || raw.is_foreign_only
            || raw.is_online_only;

        omitted && !self.pardoned_sets.contains(&raw.code)
    }
}

impl Default for CatalogPolicy {
    fn default() -> Self {
        Self::new(&PolicyConfig::default())
    }
}

/// One card of the catalog, classified and located.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardEntry {
    pub id: String,
    pub name: String,
    pub set_code: String,
    pub layout: LayoutKind,
    /// Key the image provider knows the card by.
    pub lookup_key: String,
    /// Only set for two-sided layouts.
    pub face: Option<Face>,
    pub excluded: bool,
    /// File stem of the stored image, also the resolution-state key.
    pub artifact_key: String,
    pub target_dir: PathBuf,
}

impl CardEntry {
    pub fn builder(raw: &RawCard) -> CardEntryBuilder<'_> {
        CardEntryBuilder {
            raw,
            set_code: None,
            set_dir: None,
        }
    }

    /// Full path of the stored image.
    pub fn artifact_path(&self) -> PathBuf {
        self.target_dir
            .join(format!("{}.{}", self.artifact_key, ARTIFACT_EXTENSION))
    }
}

impl fmt::Display for CardEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {}", self.id, self.name)
    }
}

/// Builds a [`CardEntry`] from a raw record in one pass.
pub struct CardEntryBuilder<'a> {
    raw: &'a RawCard,
    set_code: Option<&'a str>,
    set_dir: Option<&'a Path>,
}

impl<'a> CardEntryBuilder<'a> {
    /// Owning set; its directory receives the artifact.
    pub fn in_set(mut self, set_code: &'a str, set_dir: &'a Path) -> Self {
        self.set_code = Some(set_code);
        self.set_dir = Some(set_dir);
        self
    }

    pub fn build(self, policy: &CatalogPolicy) -> Result<CardEntry, CatalogError> {
        let raw = self.raw;

        let id = raw
            .uuid
            .clone()
            .ok_or_else(|| CatalogError::missing("uuid", raw))?;
        let layout_name = raw
            .layout
            .as_deref()
            .ok_or_else(|| CatalogError::missing("layout", raw))?;
        let lookup_key = raw
            .identifiers
            .scryfall_id
            .clone()
            .ok_or_else(|| CatalogError::missing("identifiers.scryfallId", raw))?;

        let layout = LayoutKind::classify(layout_name, &policy.exempt_layouts);
        let excluded = policy.is_card_excluded(raw, layout);

        let face = (layout == LayoutKind::TwoSided).then(|| match raw.side.as_deref() {
            Some("b") => Face::Back,
            _ => Face::Front,
        });

        let artifact_key = match (&raw.other_face_ids, layout) {
            (Some(others), LayoutKind::Combined) => combined_key(&id, others),
            _ => id.clone(),
        };

        let set_code = self
            .set_code
            .map(str::to_string)
            .or_else(|| raw.set_code.clone())
            .unwrap_or_default();

        let set_dir = self.set_dir.map(Path::to_path_buf).unwrap_or_default();
        let target_dir = if layout == LayoutKind::Token {
            set_dir.join(TOKEN_DIR)
        } else {
            set_dir
        };

        Ok(CardEntry {
            id,
            name: raw.name.clone(),
            set_code,
            layout,
            lookup_key,
            face,
            excluded,
            artifact_key,
            target_dir,
        })
    }
}

/// Sorted, de-duplicated identifiers of every face joined into one key.
fn combined_key(id: &str, others: &[String]) -> String {
    let mut ids: Vec<&str> = others.iter().map(String::as_str).collect();
    ids.push(id);
    ids.sort_unstable();
    ids.dedup();
    ids.join(ARTIFACT_KEY_DELIMITER)
}

/// One set of the catalog with its classified entries.
#[derive(Debug, Clone)]
pub struct SetEntry {
    pub code: String,
    pub set_type: String,
    /// Skipped entirely by policy.
    pub omitted: bool,
    pub partial_preview: bool,
    pub set_dir: PathBuf,
    /// Cards followed by tokens, in document order. Empty for omitted sets.
    pub entries: Vec<CardEntry>,
}

impl SetEntry {
    pub fn from_raw(
        raw: &RawSet,
        policy: &CatalogPolicy,
        data_dir: &Path,
    ) -> Result<Self, CatalogError> {
        let set_dir = data_dir.join(&raw.code);
        let omitted = policy.is_set_omitted(raw);

        let entries = if omitted {
            Vec::new()
        } else {
            raw.cards
                .iter()
                .chain(raw.tokens.iter())
                .map(|card| {
                    CardEntry::builder(card)
                        .in_set(&raw.code, &set_dir)
                        .build(policy)
                })
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(Self {
            code: raw.code.clone(),
            set_type: raw.set_type.clone(),
            omitted,
            partial_preview: raw.is_partial_preview,
            set_dir,
            entries,
        })
    }

    /// Location of this set's resolution-state file.
    pub fn state_path(&self) -> PathBuf {
        self.set_dir.join(STATE_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    fn build(raw: &RawCard) -> CardEntry {
        CardEntry::builder(raw)
            .in_set("TST", Path::new("/data/TST"))
            .build(&CatalogPolicy::default())
            .unwrap()
    }

    #[test]
    fn test_ordinary_card() {
        let entry = build(&fixtures::raw_card("A1", "Lightning Bolt", "normal"));
        assert_eq!(entry.layout, LayoutKind::Ordinary);
        assert_eq!(entry.artifact_key, "A1");
        assert_eq!(entry.lookup_key, "scry-A1");
        assert!(entry.face.is_none());
        assert!(!entry.excluded);
        assert_eq!(entry.artifact_path(), PathBuf::from("/data/TST/A1.jpg"));
    }

    #[test]
    fn test_combined_key_is_order_independent() {
        let mut first = fixtures::raw_card("B2", "Fire // Ice", "split");
        first.other_face_ids = Some(vec!["C3".into(), "A1".into(), "C3".into()]);
        let mut second = first.clone();
        second.other_face_ids = Some(vec!["A1".into(), "C3".into()]);

        let key = build(&first).artifact_key;
        assert_eq!(key, "A1_B2_C3");
        assert_eq!(build(&second).artifact_key, key);
    }

    #[test]
    fn test_combined_without_other_faces_uses_own_id() {
        let entry = build(&fixtures::raw_card("A1", "Odd Split", "split"));
        assert_eq!(entry.layout, LayoutKind::Combined);
        assert_eq!(entry.artifact_key, "A1");
    }

    #[test]
    fn test_other_faces_ignored_outside_combined_layouts() {
        let mut raw = fixtures::raw_card("A1", "Delver of Secrets", "transform");
        raw.other_face_ids = Some(vec!["A2".into()]);
        raw.side = Some("b".into());
        let entry = build(&raw);
        assert_eq!(entry.artifact_key, "A1");
        assert_eq!(entry.face, Some(Face::Back));

        raw.side = None;
        assert_eq!(build(&raw).face, Some(Face::Front));
    }

    #[test]
    fn test_token_goes_to_token_dir() {
        let entry = build(&fixtures::raw_card("T1", "Goblin", "token"));
        assert_eq!(entry.layout, LayoutKind::Token);
        assert_eq!(entry.artifact_path(), PathBuf::from("/data/TST/tokens/T1.jpg"));
    }

    #[test]
    fn test_exclusion_rules() {
        let policy = CatalogPolicy::default();
        let excluded = |raw: RawCard| {
            CardEntry::builder(&raw)
                .in_set("TST", Path::new("/d"))
                .build(&policy)
                .unwrap()
                .excluded
        };

        let mut raw = fixtures::raw_card("A1", "Card", "normal");
        raw.language = Some("German".into());
        assert!(excluded(raw));

        let mut raw = fixtures::raw_card("A1", "Card", "normal");
        raw.language = Some("Phyrexian".into());
        assert!(!excluded(raw));

        let mut raw = fixtures::raw_card("A1", "Card", "normal");
        raw.language = None;
        assert!(excluded(raw));

        let mut raw = fixtures::raw_card("A1", "Card", "normal");
        raw.promo_types = vec!["boosterfun".into(), "prerelease".into()];
        assert!(excluded(raw));

        let mut raw = fixtures::raw_card("A1", "Card", "normal");
        raw.is_reprint = true;
        assert!(excluded(raw));

        let mut raw = fixtures::raw_card("A1", "Card", "normal");
        raw.is_funny = true;
        assert!(excluded(raw));

        let mut raw = fixtures::raw_card("A1", "Card", "normal");
        raw.is_online_only = true;
        assert!(excluded(raw));

        assert!(excluded(fixtures::raw_card("A1", "Checklist", "normal")));
        assert!(excluded(fixtures::raw_card("A1", "Card", "art_series")));
        assert!(!excluded(fixtures::raw_card("A1", "Checklist Keeper", "normal")));
    }

    #[test]
    fn test_reprints_kept_when_configured() {
        let config = PolicyConfig {
            pull_reprints: true,
            ..Default::default()
        };
        let mut raw = fixtures::raw_card("A1", "Card", "normal");
        raw.is_reprint = true;
        let entry = CardEntry::builder(&raw).build(&CatalogPolicy::new(&config)).unwrap();
        assert!(!entry.excluded);
    }

    #[test]
    fn test_language_configured_by_name_or_code() {
        let mut raw = fixtures::raw_card("A1", "Karte", "normal");
        raw.language = Some("German".into());

        for lang in ["de", "German"] {
            let config = PolicyConfig {
                card_lang: lang.to_string(),
                ..Default::default()
            };
            let entry = CardEntry::builder(&raw).build(&CatalogPolicy::new(&config)).unwrap();
            assert!(!entry.excluded, "language {lang} should match German");
        }
    }

    #[test]
    fn test_build_is_deterministic() {
        let mut raw = fixtures::raw_card("Z9", "Wear // Tear", "split");
        raw.other_face_ids = Some(vec!["M5".into()]);
        raw.is_reprint = true;
        let first = build(&raw);
        let second = build(&raw);
        assert_eq!(first, second);
        // Input record is not mutated
        assert_eq!(raw.other_face_ids, Some(vec!["M5".to_string()]));
    }

    #[test]
    fn test_missing_required_fields() {
        let mut raw = fixtures::raw_card("A1", "Card", "normal");
        raw.identifiers.scryfall_id = None;
        let err = CardEntry::builder(&raw).build(&CatalogPolicy::default()).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::MissingField { field: "identifiers.scryfallId", .. }
        ));

        let mut raw = fixtures::raw_card("A1", "Card", "normal");
        raw.layout = None;
        let err = CardEntry::builder(&raw).build(&CatalogPolicy::default()).unwrap_err();
        assert!(matches!(err, CatalogError::MissingField { field: "layout", .. }));

        let mut raw = fixtures::raw_card("A1", "Card", "normal");
        raw.uuid = None;
        let err = CardEntry::builder(&raw).build(&CatalogPolicy::default()).unwrap_err();
        assert!(matches!(err, CatalogError::MissingField { field: "uuid", .. }));
    }

    #[test]
    fn test_set_entry_orders_cards_then_tokens() {
        let raw = fixtures::raw_set(
            "TST",
            vec![fixtures::raw_card("A1", "One", "normal"), fixtures::raw_card("A2", "Two", "normal")],
            vec![fixtures::raw_card("T1", "Token", "token")],
        );
        let set = SetEntry::from_raw(&raw, &CatalogPolicy::default(), Path::new("/data")).unwrap();
        let ids: Vec<&str> = set.entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["A1", "A2", "T1"]);
        assert!(!set.omitted);
        assert_eq!(set.state_path(), PathBuf::from("/data/TST/.states.json"));
    }

    #[test]
    fn test_set_omission_and_pardon() {
        let policy = CatalogPolicy::default();
        let data = Path::new("/data");

        let mut raw = fixtures::raw_set("PLIST", vec![fixtures::raw_card("A1", "One", "normal")], vec![]);
        let set = SetEntry::from_raw(&raw, &policy, data).unwrap();
        assert!(set.omitted);
        assert!(set.entries.is_empty());

        raw.code = "ALC".into();
        raw.set_type = "alchemy".into();
        assert!(SetEntry::from_raw(&raw, &policy, data).unwrap().omitted);

        raw.code = "XYZ".into();
        raw.set_type = "expansion".into();
        raw.is_foreign_only = true;
        assert!(SetEntry::from_raw(&raw, &policy, data).unwrap().omitted);

        // Pardoned sets override every omission rule
        raw.code = "30A".into();
        raw.is_online_only = true;
        let set = SetEntry::from_raw(&raw, &policy, data).unwrap();
        assert!(!set.omitted);
        assert_eq!(set.entries.len(), 1);
    }

    #[test]
    fn test_omitted_set_skips_card_validation() {
        let mut broken = fixtures::raw_card("A1", "One", "normal");
        broken.layout = None;
        let raw = fixtures::raw_set("MB1", vec![broken], vec![]);
        let set = SetEntry::from_raw(&raw, &CatalogPolicy::default(), Path::new("/d")).unwrap();
        assert!(set.omitted);
    }
}
