//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types.
//!
//! Identifiers are opaque strings: some are issued by the commerce backend
//! (carts, line items, products), others are generated locally when an admin
//! creates a list item in the site configuration (UUID v4).

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `Default`
/// - Conversion methods: `new()`, `generate()`, `as_str()`, `is_blank()`
/// - `From<String>`, `From<&str>` and `Into<String>` implementations
///
/// # Example
///
/// ```rust
/// # use frontieres_core::define_id;
/// define_id!(BannerId);
/// define_id!(SlideId);
///
/// let banner = BannerId::new("promo-1");
/// let slide = SlideId::generate();
///
/// assert_eq!(banner.as_str(), "promo-1");
/// assert!(!slide.is_blank());
/// // These are different types, so this won't compile:
/// // let _: BannerId = slide;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            Default,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create an ID from an existing value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Generate a fresh random identifier (UUID v4).
            #[must_use]
            pub fn generate() -> Self {
                Self(::uuid::Uuid::new_v4().to_string())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Whether the identifier is empty or whitespace only.
            #[must_use]
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Site configuration list items (generated locally)
define_id!(PromoId);
define_id!(VideoId);
define_id!(ArticleId);

// Commerce backend entities (issued remotely)
define_id!(CartId);
define_id!(LineItemId);
define_id!(ProductId);
define_id!(CollectionId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = PromoId::generate();
        let b = PromoId::generate();
        assert_ne!(a, b);
        assert!(!a.is_blank());
    }

    #[test]
    fn test_blank_detection() {
        assert!(VideoId::default().is_blank());
        assert!(VideoId::new("   ").is_blank());
        assert!(!VideoId::new("v1").is_blank());
    }

    #[test]
    fn test_serde_transparent() {
        let id = LineItemId::new("line-42");
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, "\"line-42\"");
    }

    #[test]
    fn test_display() {
        assert_eq!(CartId::new("cart-7").to_string(), "cart-7");
    }
}
