//! Bundled default documents.

use serde_json::Number;

use super::{
    Article, Blog, CategorySettings, Contact, Footer, HeaderSettings, Hero, Promo,
    SiteConfiguration, Socials, TopBanner, Video,
};

use crate::types::{ArticleId, PromoId, VideoId};

impl SiteConfiguration {
    /// The document a fresh store is seeded with.
    ///
    /// Item ids are fixed so that repeated seeding yields identical
    /// documents.
    #[must_use]
    pub fn bundled_default() -> Self {
        Self {
            top_banner: TopBanner {
                text: "Livraison offerte dès 50 € d'achat".to_owned(),
                enabled: true,
                speed: Number::from(20),
            },
            header: HeaderSettings::default(),
            hero: Hero {
                title: "Saveurs des Trois Frontières".to_owned(),
                subtitle: "Produits frais et exotiques".to_owned(),
                button_text: "Découvrir la boutique".to_owned(),
                image_url: "https://images.unsplash.com/photo-1542838132-92c53300491e?w=1600"
                    .to_owned(),
                link: "/shop".to_owned(),
                image_fit: Some("cover".to_owned()),
                image_position: Some("center".to_owned()),
                overlay_opacity: Number::from_f64(0.4),
                height: Some(Number::from(400)),
            },
            categories: CategorySettings { limit: 6 },
            contact: Contact {
                email: "contact@frontieres.shop".to_owned(),
                phone: "+33 1 23 45 67 89".to_owned(),
                address: "12 rue du Marché, 75011 Paris".to_owned(),
                map_url: String::new(),
            },
            footer: Footer {
                description: "Épicerie exotique en ligne : fruits, épices et produits du monde."
                    .to_owned(),
                socials: Socials::default(),
                copyright: "© Frontières. Tous droits réservés.".to_owned(),
            },
            promos: vec![Promo {
                id: PromoId::new("promo-welcome"),
                title: "Bienvenue".to_owned(),
                image_url: "https://images.unsplash.com/photo-1610832958506-aa56368176cf?w=1200"
                    .to_owned(),
                link: "/shop".to_owned(),
                active: true,
            }],
            videos: vec![Video {
                id: VideoId::new("video-presentation"),
                title: "Notre boutique".to_owned(),
                youtube_url: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_owned(),
            }],
            blog: Blog {
                enabled: true,
                title: "Le blog".to_owned(),
                subtitle: "Recettes et nouveautés".to_owned(),
                articles: vec![Article {
                    id: ArticleId::new("article-bienvenue"),
                    title: "Bienvenue sur notre boutique".to_owned(),
                    excerpt: "Découvrez notre sélection de produits.".to_owned(),
                    content: "Nous sommes heureux de vous accueillir.".to_owned(),
                    image_url: String::new(),
                    date: "2025-01-01".to_owned(),
                    link: None,
                }],
            },
        }
    }

    /// Minimal document used by renderers when no configuration can be read.
    #[must_use]
    pub fn empty_shell() -> Self {
        Self {
            top_banner: TopBanner {
                text: String::new(),
                enabled: false,
                speed: Number::from(20),
            },
            header: HeaderSettings::default(),
            hero: Hero {
                title: String::new(),
                subtitle: String::new(),
                button_text: String::new(),
                image_url: String::new(),
                link: "/".to_owned(),
                image_fit: None,
                image_position: None,
                overlay_opacity: None,
                height: None,
            },
            categories: CategorySettings { limit: 6 },
            contact: Contact::default(),
            footer: Footer::default(),
            promos: Vec::new(),
            videos: Vec::new(),
            blog: Blog {
                enabled: false,
                title: String::new(),
                subtitle: String::new(),
                articles: Vec::new(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_default_is_deterministic() {
        assert_eq!(
            SiteConfiguration::bundled_default(),
            SiteConfiguration::bundled_default()
        );
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(SiteConfiguration::bundled_default().validate().is_ok());
        assert!(SiteConfiguration::empty_shell().validate().is_ok());
    }

    #[test]
    fn test_empty_shell_has_no_sections() {
        let shell = SiteConfiguration::empty_shell();
        assert!(shell.promos.is_empty());
        assert!(!shell.blog.enabled);
        assert!(!shell.top_banner.enabled);
    }
}
