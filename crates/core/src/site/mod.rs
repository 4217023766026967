//! Admin-editable site configuration document.
//!
//! A single document drives every marketing section of the storefront: the
//! scrolling top banner, hero, category strip, contact block, footer,
//! promotional banners, videos and blog articles.
//!
//! The document is always replaced wholesale. Field names on the wire are
//! camelCase to match the admin editor.

mod defaults;
mod validate;

use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::types::{ArticleId, PromoId, VideoId};

pub use validate::{CATEGORY_LIMIT_MIN, SiteConfigError};

/// The full site configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfiguration {
    pub top_banner: TopBanner,
    #[serde(default)]
    pub header: HeaderSettings,
    pub hero: Hero,
    pub categories: CategorySettings,
    pub contact: Contact,
    pub footer: Footer,
    #[serde(default)]
    pub promos: Vec<Promo>,
    #[serde(default)]
    pub videos: Vec<Video>,
    pub blog: Blog,
}

/// Scrolling announcement strip above the header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopBanner {
    pub text: String,
    pub enabled: bool,
    /// Duration of one scroll cycle, in seconds. Kept as written.
    pub speed: Number,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
}

/// Hero banner with its background image descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hero {
    pub title: String,
    pub subtitle: String,
    pub button_text: String,
    pub image_url: String,
    pub link: String,
    /// CSS object-fit keyword (`cover`, `contain`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_fit: Option<String>,
    /// CSS object-position value (`center`, `top`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_position: Option<String>,
    /// Darkening overlay, 0.0 (none) to 1.0 (black).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay_opacity: Option<Number>,
    /// Banner height in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<Number>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySettings {
    /// Number of categories shown on the home page.
    pub limit: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub email: String,
    pub phone: String,
    pub address: String,
    pub map_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Footer {
    pub description: String,
    pub socials: Socials,
    pub copyright: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Socials {
    pub facebook: String,
    pub twitter: String,
    pub instagram: String,
    pub youtube: String,
}

/// Promotional banner shown between the header and the page body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Promo {
    #[serde(default)]
    pub id: PromoId,
    pub title: String,
    pub image_url: String,
    pub link: String,
    pub active: bool,
}

impl Promo {
    /// Create a promo with a freshly generated id.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        image_url: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        Self {
            id: PromoId::generate(),
            title: title.into(),
            image_url: image_url.into(),
            link: link.into(),
            active: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    #[serde(default)]
    pub id: VideoId,
    pub title: String,
    pub youtube_url: String,
}

impl Video {
    /// Create a video reference with a freshly generated id.
    #[must_use]
    pub fn new(title: impl Into<String>, youtube_url: impl Into<String>) -> Self {
        Self {
            id: VideoId::generate(),
            title: title.into(),
            youtube_url: youtube_url.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
    pub enabled: bool,
    pub title: String,
    pub subtitle: String,
    #[serde(default)]
    pub articles: Vec<Article>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(default)]
    pub id: ArticleId,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub image_url: String,
    /// Publication date as entered in the editor (ISO 8601 date).
    pub date: String,
    /// External link, when the article lives elsewhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl Article {
    /// Create an article dated today with a freshly generated id.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        excerpt: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: ArticleId::generate(),
            title: title.into(),
            excerpt: excerpt.into(),
            content: content.into(),
            image_url: String::new(),
            date: chrono::Utc::now().date_naive().to_string(),
            link: None,
        }
    }
}

impl SiteConfiguration {
    /// Active promos in display order.
    pub fn active_promos(&self) -> impl Iterator<Item = &Promo> {
        self.promos.iter().filter(|promo| promo.active)
    }

    /// Find an article by id.
    #[must_use]
    pub fn article(&self, id: &ArticleId) -> Option<&Article> {
        self.blog.articles.iter().find(|article| &article.id == id)
    }
}
