use serde::Deserialize;

/// Why an image is not available upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableReason {
    /// The provider only has a placeholder image.
    Placeholder,
    /// The provider has no image at all.
    Missing,
    /// The provider's printing is a reprint in another language and policy skips those.
    ForeignReprint,
}

/// Image quality the provider reports for a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageStatus {
    HighRes,
    LowRes,
    Unavailable(UnavailableReason),
}

impl ImageStatus {
    /// Map the provider's `image_status` value.
    pub fn from_provider(value: &str) -> Self {
        match value {
            "highres_scan" => Self::HighRes,
            "placeholder" => Self::Unavailable(UnavailableReason::Placeholder),
            "missing" => Self::Unavailable(UnavailableReason::Missing),
            _ => Self::LowRes,
        }
    }

    /// The resolution flag to record, `None` when there is nothing to fetch.
    pub fn high_res(&self) -> Option<bool> {
        match self {
            Self::HighRes => Some(true),
            Self::LowRes => Some(false),
            Self::Unavailable(_) => None,
        }
    }
}

/// The parts of the provider's card answer the synchronizer reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCardStatus {
    pub image: ImageStatus,
    /// Provider language code of the printing, e.g. `en`.
    pub language: Option<String>,
    pub reprint: bool,
}

impl RemoteCardStatus {
    pub fn new(image: ImageStatus) -> Self {
        Self {
            image,
            language: None,
            reprint: false,
        }
    }

    pub fn high_res() -> Self {
        Self::new(ImageStatus::HighRes)
    }

    pub fn low_res() -> Self {
        Self::new(ImageStatus::LowRes)
    }

    pub fn with_language(mut self, language: impl Into<String>, reprint: bool) -> Self {
        self.language = Some(language.into());
        self.reprint = reprint;
        self
    }
}

/// Card answer as sent by the provider (private wire shape).
#[derive(Debug, Deserialize)]
pub(super) struct ProviderCard {
    pub image_status: Option<String>,
    pub lang: Option<String>,
    #[serde(default)]
    pub reprint: bool,
}
