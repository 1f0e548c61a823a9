use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Where images, state files and catalog snapshots live.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Root data directory. Resolved by the binary when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

/// Card and set eligibility policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PolicyConfig {
    /// Target card language, either a code ("en") or a full name ("English").
    #[serde(default = "default_card_lang")]
    pub card_lang: String,
    /// Keep cards flagged as reprints in the catalog.
    #[serde(default)]
    pub pull_reprints: bool,
    /// What to do when the provider reports a foreign-language reprint.
    #[serde(default)]
    pub foreign_reprints: ForeignReprintPolicy,
    /// Sets processed even if another rule would omit them.
    #[serde(default = "default_pardoned_sets")]
    pub pardoned_sets: Vec<String>,
    /// Sets omitted by code.
    #[serde(default = "default_exempt_sets")]
    pub exempt_sets: Vec<String>,
    /// Promo types that exclude a card.
    #[serde(default = "default_exempt_promos")]
    pub exempt_promos: Vec<String>,
    /// Set types that omit a whole set.
    #[serde(default = "default_exempt_types")]
    pub exempt_types: Vec<String>,
    /// Card layouts that are never fetched.
    #[serde(default = "default_exempt_layouts")]
    pub exempt_layouts: Vec<String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            card_lang: default_card_lang(),
            pull_reprints: false,
            foreign_reprints: ForeignReprintPolicy::default(),
            pardoned_sets: default_pardoned_sets(),
            exempt_sets: default_exempt_sets(),
            exempt_promos: default_exempt_promos(),
            exempt_types: default_exempt_types(),
            exempt_layouts: default_exempt_layouts(),
        }
    }
}

impl PolicyConfig {
    /// The configured language, resolved against the known language table.
    pub fn language(&self) -> Option<Language> {
        Language::resolve(&self.card_lang)
    }
}

fn default_card_lang() -> String {
    "en".to_string()
}

fn default_pardoned_sets() -> Vec<String> {
    strings(&["30A"])
}

fn default_exempt_sets() -> Vec<String> {
    strings(&["MB1", "PDRC", "PLIST", "PURL", "UPLIST"])
}

fn default_exempt_promos() -> Vec<String> {
    strings(&[
        "datestamped",
        "draftweekend",
        "gameday",
        "intropack",
        "jpwalker",
        "mediainsert",
        "planeswalkerstamped",
        "playerrewards",
        "premiereshop",
        "prerelease",
        "promopack",
        "release",
        "setpromo",
        "stamped",
        "themepack",
        "thick",
        "tourney",
        "wizardsplaynetwork",
    ])
}

fn default_exempt_types() -> Vec<String> {
    strings(&["alchemy", "funny", "memorabilia", "token"])
}

fn default_exempt_layouts() -> Vec<String> {
    strings(&["art_series", "augment", "host"])
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Handling of cards the provider reports as reprints in another language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ForeignReprintPolicy {
    /// Treat the card as unavailable upstream.
    #[default]
    Skip,
    /// Fetch it once when no local image exists, never upgrade it.
    FetchMissing,
    /// No special handling.
    Allow,
}

/// Run-level synchronization settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncConfig {
    /// Walk every set even when the local catalog snapshot is current.
    #[serde(default = "default_true")]
    pub always_pull: bool,
    /// Download the generic card-back images.
    #[serde(default)]
    pub pull_cardbacks: bool,
    /// Sets re-verified on every run regardless of cached completeness.
    #[serde(default = "default_continuous_sets")]
    pub continuous_sets: Vec<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            always_pull: true,
            pull_cardbacks: false,
            continuous_sets: default_continuous_sets(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_continuous_sets() -> Vec<String> {
    strings(&["SLD", "SLU", "SLX"])
}

/// Remote endpoint settings shared by the image and catalog clients.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayConfig {
    /// Minimum spacing between two requests, in milliseconds.
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
    /// Retries after the first failed attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Retry `n` waits `n * retry_base_delay_ms`.
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_image_base_url")]
    pub image_base_url: String,
    #[serde(default = "default_catalog_base_url")]
    pub catalog_base_url: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            pacing_ms: default_pacing_ms(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            image_base_url: default_image_base_url(),
            catalog_base_url: default_catalog_base_url(),
        }
    }
}

impl GatewayConfig {
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_pacing_ms() -> u64 {
    200
}

fn default_max_retries() -> u32 {
    4
}

fn default_retry_base_delay_ms() -> u64 {
    30_000
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("PlanarBridge/{}", env!("CARGO_PKG_VERSION"))
}

fn default_image_base_url() -> String {
    "https://api.scryfall.com".to_string()
}

fn default_catalog_base_url() -> String {
    "https://mtgjson.com/api/v5".to_string()
}

/// A card language as named by the catalog and coded by the image provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    pub code: &'static str,
    pub name: &'static str,
}

const LANGUAGES: &[(&str, &str)] = &[
    ("en", "English"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("de", "German"),
    ("it", "Italian"),
    ("pt", "Portuguese (Brazil)"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("ru", "Russian"),
    ("zhs", "Chinese Simplified"),
    ("zht", "Chinese Traditional"),
    ("he", "Hebrew"),
    ("la", "Latin"),
    ("grc", "Ancient Greek"),
    ("ar", "Arabic"),
    ("sa", "Sanskrit"),
    ("ph", "Phyrexian"),
];

impl Language {
    pub const PHYREXIAN: Language = Language {
        code: "ph",
        name: "Phyrexian",
    };

    /// Resolve a language code or full name (case-insensitive).
    pub fn resolve(value: &str) -> Option<Language> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("px") {
            return Some(Self::PHYREXIAN);
        }
        LANGUAGES
            .iter()
            .find(|(code, name)| code.eq_ignore_ascii_case(value) || name.eq_ignore_ascii_case(value))
            .map(|&(code, name)| Language { code, name })
    }

    /// Whether a provider language code denotes this language.
    pub fn matches_code(&self, code: &str) -> bool {
        self.code.eq_ignore_ascii_case(code)
    }
}
