//! Write-time validation and list item id normalization.

use std::collections::HashSet;

use super::SiteConfiguration;
use crate::types::{ArticleId, PromoId, VideoId};

/// Smallest accepted `categories.limit`.
pub const CATEGORY_LIMIT_MIN: u32 = 1;

/// Reasons a configuration document is rejected.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SiteConfigError {
    #[error("categories.limit must be at least {CATEGORY_LIMIT_MIN} (got {0})")]
    CategoryLimit(u32),

    #[error("duplicate {list} id: {id}")]
    DuplicateId { list: &'static str, id: String },
}

impl SiteConfiguration {
    /// Check the document's invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), SiteConfigError> {
        if self.categories.limit < CATEGORY_LIMIT_MIN {
            return Err(SiteConfigError::CategoryLimit(self.categories.limit));
        }

        ensure_unique("promos", self.promos.iter().map(|p| p.id.as_str()))?;
        ensure_unique("videos", self.videos.iter().map(|v| v.id.as_str()))?;
        ensure_unique(
            "blog.articles",
            self.blog.articles.iter().map(|a| a.id.as_str()),
        )?;

        Ok(())
    }

    /// Give every list item without an id a freshly generated one.
    ///
    /// Returns the number of ids assigned.
    pub fn assign_missing_ids(&mut self) -> usize {
        let mut assigned = 0;

        for promo in self.promos.iter_mut().filter(|p| p.id.is_blank()) {
            promo.id = PromoId::generate();
            assigned += 1;
        }
        for video in self.videos.iter_mut().filter(|v| v.id.is_blank()) {
            video.id = VideoId::generate();
            assigned += 1;
        }
        for article in self.blog.articles.iter_mut().filter(|a| a.id.is_blank()) {
            article.id = ArticleId::generate();
            assigned += 1;
        }

        assigned
    }

    /// Normalize ids then validate. Run on every write.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn prepare_for_write(&mut self) -> Result<(), SiteConfigError> {
        self.assign_missing_ids();
        self.validate()
    }
}

fn ensure_unique<'a>(
    list: &'static str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<(), SiteConfigError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(SiteConfigError::DuplicateId {
                list,
                id: id.to_owned(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::site::{Promo, Video};

    #[test]
    fn test_rejects_zero_category_limit() {
        let mut config = SiteConfiguration::bundled_default();
        config.categories.limit = 0;
        assert_eq!(config.validate(), Err(SiteConfigError::CategoryLimit(0)));
    }

    #[test]
    fn test_presentation_values_are_not_bounded() {
        let mut config = SiteConfiguration::bundled_default();
        config.top_banner.speed = serde_json::Number::from(0);
        config.hero.height = Some(serde_json::Number::from(1400));
        config.hero.overlay_opacity = serde_json::Number::from_f64(12.5);

        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_assigns_ids_to_new_items() {
        let mut config = SiteConfiguration::empty_shell();
        let mut first = Promo::new("Un", "", "");
        let mut second = Promo::new("Deux", "", "");
        first.id = PromoId::default();
        second.id = PromoId::default();
        config.promos = vec![first, second];

        config.prepare_for_write().unwrap();

        let ids: Vec<_> = config.promos.iter().map(|p| p.id.clone()).collect();
        assert!(ids.iter().all(|id| !id.is_blank()));
        assert_ne!(ids.first(), ids.get(1));
    }

    #[test]
    fn test_keeps_existing_ids() {
        let mut config = SiteConfiguration::empty_shell();
        config.videos = vec![Video {
            id: VideoId::new("v-1"),
            title: String::new(),
            youtube_url: String::new(),
        }];

        assert_eq!(config.assign_missing_ids(), 0);
        assert_eq!(config.videos.first().unwrap().id.as_str(), "v-1");
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let mut config = SiteConfiguration::empty_shell();
        let promo = Promo::new("A", "", "");
        config.promos = vec![promo.clone(), promo];

        assert!(matches!(
            config.prepare_for_write(),
            Err(SiteConfigError::DuplicateId { list: "promos", .. })
        ));
    }
}
