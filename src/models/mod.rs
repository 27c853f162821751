use serde::Deserialize;

pub mod book;
pub mod choice;

pub use book::Book;
pub use choice::{Action, ChoiceEvent, SavedChoice, SessionState, Summary, SUMMARY_RECENT};

/// Prefix applied to ids of books sourced from Google Books
pub const GOOGLE_ID_PREFIX: &str = "gb_";
pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";
pub const DEFAULT_GENRE: &str = "General";
pub const DEFAULT_DESCRIPTION: &str = "No description available.";
pub const DEFAULT_RATING: f64 = 4.0;
pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/128x192?text=No+Cover";

// ============================================================================
// Google Books API Types
// ============================================================================

/// Response from GET /volumes
#[derive(Debug, Clone, Deserialize, Default)]
pub struct GoogleVolumes {
    #[serde(default)]
    pub items: Option<Vec<GoogleVolume>>,
}

/// A single volume search result
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleVolume {
    pub id: String,
    #[serde(default)]
    pub volume_info: VolumeInfo,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct VolumeInfo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub image_links: Option<ImageLinks>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ImageLinks {
    #[serde(default)]
    pub small_thumbnail: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub small: Option<String>,
    #[serde(default)]
    pub medium: Option<String>,
}

impl ImageLinks {
    /// Best cover link for a catalog card
    pub fn card_image(&self) -> Option<&str> {
        self.thumbnail
            .as_deref()
            .or(self.small_thumbnail.as_deref())
    }

    /// Cover link used for backfilling, accepts the larger sizes too
    pub fn any_image(&self) -> Option<&str> {
        self.card_image()
            .or(self.medium.as_deref())
            .or(self.small.as_deref())
    }
}

impl From<GoogleVolume> for Book {
    fn from(volume: GoogleVolume) -> Self {
        let info = volume.volume_info;

        let image = info
            .image_links
            .as_ref()
            .and_then(ImageLinks::card_image)
            .unwrap_or(PLACEHOLDER_IMAGE)
            .to_string();

        Book {
            // Namespaced so remote ids never collide with bundled ones
            id: format!("{}{}", GOOGLE_ID_PREFIX, volume.id),
            title: info.title.unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            author: info
                .authors
                .into_iter()
                .next()
                .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
            genre: info
                .categories
                .into_iter()
                .next()
                .unwrap_or_else(|| DEFAULT_GENRE.to_string()),
            rating: info.average_rating.unwrap_or(DEFAULT_RATING),
            description: info
                .description
                .or(info.subtitle)
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            image: Some(image),
        }
    }
}
