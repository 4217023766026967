//! Commerce backend wire types and their conversion into storefront types.
//!
//! The backend's REST payloads are loosely typed: most fields are optional
//! and ids may arrive as `id` or `_id`. Conversions here are the only place
//! that deals with that; everything past this module uses the strict types
//! from `frontieres_core` or the catalog types below.

use std::collections::BTreeMap;
use std::str::FromStr;

use frontieres_core::{
    Cart, CartId, CatalogReference, CollectionId, LineItem, LineItemId, Price, ProductId,
    Quantity,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::CommerceError;

/// Currency assumed when the backend omits one.
const FALLBACK_CURRENCY: &str = "EUR";

const WIX_IMAGE_PREFIX: &str = "wix:image://v1/";
const WIX_MEDIA_BASE: &str = "https://static.wixstatic.com/media/";

/// Turn a backend media URI into a fetchable URL.
///
/// `wix:image://v1/<id>/<name>#<meta>` becomes the public media URL for
/// `<id>`. Absolute URLs and relative paths pass through unchanged. Blank
/// input yields `None`.
#[must_use]
pub fn normalize_image_url(uri: &str) -> Option<String> {
    let uri = uri.trim();
    if uri.is_empty() {
        return None;
    }

    let Some(rest) = uri.strip_prefix(WIX_IMAGE_PREFIX) else {
        return Some(uri.to_owned());
    };

    let image_id = rest
        .split(['/', '#'])
        .next()
        .filter(|id| !id.is_empty())?;
    Some(format!("{WIX_MEDIA_BASE}{image_id}"))
}

// =============================================================================
// Catalog types (served by the storefront API)
// =============================================================================

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    /// HTML description as authored in the backend.
    pub description: Option<String>,
    pub ribbon: Option<String>,
    pub price: Option<ProductPrice>,
    pub image_url: Option<String>,
    pub collection_ids: Vec<CollectionId>,
}

/// Product pricing as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPrice {
    pub amount: Price,
    pub discounted: Option<Price>,
    pub formatted: Option<String>,
    pub formatted_discounted: Option<String>,
}

impl ProductPrice {
    /// Whether a discount applies.
    #[must_use]
    pub fn is_discounted(&self) -> bool {
        self.discounted
            .as_ref()
            .is_some_and(|discounted| discounted.amount < self.amount.amount)
    }
}

/// A catalog collection (category).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: CollectionId,
    pub name: String,
    pub slug: Option<String>,
    pub image_url: Option<String>,
}

// =============================================================================
// Cart wire types
// =============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct CartEnvelope {
    pub cart: WireCart,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireCart {
    #[serde(default, alias = "_id")]
    id: String,
    #[serde(default)]
    line_items: Vec<WireLineItem>,
    currency: Option<String>,
    subtotal: Option<WireMoney>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireLineItem {
    #[serde(default, alias = "_id")]
    id: String,
    quantity: Option<i64>,
    catalog_reference: Option<WireCatalogReference>,
    product_name: Option<WireProductName>,
    price: Option<WireMoney>,
    image: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCatalogReference {
    #[serde(default)]
    catalog_item_id: String,
    options: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct WireProductName {
    original: Option<String>,
    translated: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMoney {
    amount: Option<String>,
    formatted_amount: Option<String>,
}

/// Flatten backend catalog options into name/value pairs.
///
/// Options arrive either flat or nested under an `options` key, next to
/// non-option fields such as `variantId`.
fn flatten_options(value: Option<serde_json::Value>) -> BTreeMap<String, String> {
    let Some(serde_json::Value::Object(mut map)) = value else {
        return BTreeMap::new();
    };

    if let Some(serde_json::Value::Object(nested)) = map.remove("options") {
        map = nested;
    }

    map.into_iter()
        .filter_map(|(name, value)| match value {
            serde_json::Value::String(value) => Some((name, value)),
            _ => None,
        })
        .collect()
}

impl WireCart {
    pub(crate) fn into_cart(self) -> Result<Cart, CommerceError> {
        if self.id.trim().is_empty() {
            return Err(CommerceError::InvalidResponse(
                "cart without id".to_owned(),
            ));
        }

        let currency = self
            .currency
            .filter(|currency| !currency.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_CURRENCY.to_owned());

        let line_items = self
            .line_items
            .into_iter()
            .map(|line| line.into_line_item(&currency))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Cart {
            id: CartId::new(self.id),
            line_items,
            currency,
            formatted_subtotal: self.subtotal.and_then(|money| money.formatted_amount),
        })
    }
}

impl WireLineItem {
    fn into_line_item(self, currency: &str) -> Result<LineItem, CommerceError> {
        if self.id.trim().is_empty() {
            return Err(CommerceError::InvalidResponse(
                "line item without id".to_owned(),
            ));
        }

        let (amount, formatted_price) = self
            .price
            .map_or((None, None), |money| (money.amount, money.formatted_amount));
        let price = Price::parse(amount.as_deref().unwrap_or("0"), currency)
            .map_err(|e| CommerceError::InvalidResponse(format!("line {}: {e}", self.id)))?;

        let product = self.catalog_reference.map_or_else(
            || CatalogReference::new(ProductId::default()),
            |reference| CatalogReference {
                product_id: ProductId::new(reference.catalog_item_id),
                options: flatten_options(reference.options),
            },
        );

        let name = self
            .product_name
            .and_then(|name| name.translated.or(name.original))
            .unwrap_or_default();

        Ok(LineItem {
            id: LineItemId::new(self.id),
            product,
            quantity: Quantity::clamped(self.quantity.unwrap_or(1)),
            price,
            formatted_price,
            name,
            image_url: self.image.as_deref().and_then(normalize_image_url),
        })
    }
}

// =============================================================================
// Checkout wire types
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RedirectSessionEnvelope {
    pub redirect_session: Option<WireRedirectSession>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireRedirectSession {
    pub full_url: Option<String>,
}

// =============================================================================
// Catalog wire types
// =============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct ProductsEnvelope {
    #[serde(default)]
    pub products: Vec<WireProduct>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CollectionsEnvelope {
    #[serde(default)]
    pub collections: Vec<WireCollection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireProduct {
    #[serde(default, alias = "_id")]
    id: String,
    name: Option<String>,
    slug: Option<String>,
    description: Option<String>,
    ribbon: Option<String>,
    price_data: Option<WireProductPrice>,
    price: Option<WireProductPrice>,
    media: Option<WireMedia>,
    #[serde(default)]
    collection_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireProductPrice {
    currency: Option<String>,
    price: Option<serde_json::Number>,
    discounted_price: Option<serde_json::Number>,
    formatted: Option<WireFormattedPrice>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireFormattedPrice {
    price: Option<String>,
    discounted_price: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMedia {
    main_media: Option<WireMediaItem>,
}

#[derive(Debug, Deserialize)]
struct WireMediaItem {
    image: Option<WireImage>,
}

#[derive(Debug, Deserialize)]
struct WireImage {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireCollection {
    #[serde(default, alias = "_id")]
    id: String,
    name: Option<String>,
    slug: Option<String>,
    media: Option<WireMedia>,
}

fn number_price(number: &serde_json::Number, currency: &str) -> Option<Price> {
    let amount = Decimal::from_str(&number.to_string())
        .or_else(|_| Decimal::from_scientific(&number.to_string()))
        .ok()?;
    Price::parse(&amount.to_string(), currency).ok()
}

fn main_image(media: Option<WireMedia>) -> Option<String> {
    media
        .and_then(|media| media.main_media)
        .and_then(|item| item.image)
        .and_then(|image| image.url)
        .as_deref()
        .and_then(normalize_image_url)
}

impl WireProductPrice {
    fn into_price(self) -> Option<ProductPrice> {
        let currency = self
            .currency
            .unwrap_or_else(|| FALLBACK_CURRENCY.to_owned());
        let amount = number_price(self.price.as_ref()?, &currency)?;
        let discounted = self
            .discounted_price
            .as_ref()
            .and_then(|number| number_price(number, &currency));
        let (formatted, formatted_discounted) = self
            .formatted
            .map_or((None, None), |f| (f.price, f.discounted_price));

        Some(ProductPrice {
            amount,
            discounted,
            formatted,
            formatted_discounted,
        })
    }
}

impl WireProduct {
    /// Convert, dropping products without an id.
    pub(crate) fn into_product(self) -> Option<Product> {
        if self.id.trim().is_empty() {
            return None;
        }

        let slug = self.slug.unwrap_or_else(|| self.id.clone());
        Some(Product {
            id: ProductId::new(self.id),
            name: self.name.unwrap_or_default(),
            slug,
            description: self.description.filter(|d| !d.trim().is_empty()),
            ribbon: self.ribbon.filter(|r| !r.trim().is_empty()),
            price: self
                .price_data
                .or(self.price)
                .and_then(WireProductPrice::into_price),
            image_url: main_image(self.media),
            collection_ids: self
                .collection_ids
                .into_iter()
                .map(CollectionId::new)
                .collect(),
        })
    }
}

impl WireCollection {
    pub(crate) fn into_collection(self) -> Option<Collection> {
        if self.id.trim().is_empty() {
            return None;
        }

        Some(Collection {
            id: CollectionId::new(self.id),
            name: self.name.unwrap_or_default(),
            slug: self.slug,
            image_url: main_image(self.media),
        })
    }
}
