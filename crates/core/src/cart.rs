//! Backend-authoritative cart snapshots.
//!
//! Every field here is reported by the commerce backend: line ids, prices,
//! currency and formatted strings. Nothing is computed locally except the
//! fallback display subtotal.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{CartId, LineItemId, Price, ProductId, Quantity};

/// Reference to a catalog item, as sent when adding to the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogReference {
    /// Product identifier in the catalog.
    pub product_id: ProductId,
    /// Chosen product options (e.g., `{"Taille": "1 kg"}`).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,
}

impl CatalogReference {
    #[must_use]
    pub fn new(product_id: impl Into<ProductId>) -> Self {
        Self {
            product_id: product_id.into(),
            options: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(name.into(), value.into());
        self
    }
}

/// One cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Backend-issued line id.
    pub id: LineItemId,
    pub product: CatalogReference,
    pub quantity: Quantity,
    /// Unit price.
    pub price: Price,
    /// Unit price as formatted by the backend.
    pub formatted_price: Option<String>,
    pub name: String,
    pub image_url: Option<String>,
}

impl LineItem {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity.get())
    }
}

/// A cart snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: CartId,
    pub line_items: Vec<LineItem>,
    /// ISO 4217 currency code of the cart.
    pub currency: String,
    /// Subtotal as formatted by the backend, when provided.
    pub formatted_subtotal: Option<String>,
}

impl Cart {
    /// Whether the cart exists but has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.line_items.is_empty()
    }

    /// Total number of units across lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.line_items
            .iter()
            .map(|line| line.quantity.get())
            .fold(0, u32::saturating_add)
    }

    /// Find a line by id.
    #[must_use]
    pub fn line(&self, id: &LineItemId) -> Option<&LineItem> {
        self.line_items.iter().find(|line| &line.id == id)
    }

    /// Sum of line totals, for display when the backend sent no subtotal.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        let amount = self
            .line_items
            .iter()
            .map(|line| line.line_total().amount)
            .fold(Decimal::ZERO, |acc, amount| acc + amount);
        Price::new(amount, self.currency.clone())
    }

    /// Backend-formatted subtotal, else the computed one.
    #[must_use]
    pub fn display_subtotal(&self) -> String {
        self.formatted_subtotal
            .clone()
            .unwrap_or_else(|| self.subtotal().display())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(id: &str, amount: &str, quantity: i64) -> LineItem {
        LineItem {
            id: LineItemId::new(id),
            product: CatalogReference::new("prod-1"),
            quantity: Quantity::clamped(quantity),
            price: Price::parse(amount, "EUR").unwrap(),
            formatted_price: None,
            name: "Mangue".to_owned(),
            image_url: None,
        }
    }

    fn cart(lines: Vec<LineItem>) -> Cart {
        Cart {
            id: CartId::new("cart-1"),
            line_items: lines,
            currency: "EUR".to_owned(),
            formatted_subtotal: None,
        }
    }

    #[test]
    fn test_item_count_and_subtotal() {
        let cart = cart(vec![line("a", "2.50", 2), line("b", "1.00", 3)]);
        assert_eq!(cart.item_count(), 5);
        assert_eq!(cart.subtotal().amount, Decimal::new(800, 2));
        assert_eq!(cart.display_subtotal(), "8.00 EUR");
    }

    #[test]
    fn test_formatted_subtotal_preferred() {
        let mut cart = cart(vec![line("a", "2.50", 1)]);
        cart.formatted_subtotal = Some("2,50 €".to_owned());
        assert_eq!(cart.display_subtotal(), "2,50 €");
    }

    #[test]
    fn test_empty_cart() {
        let cart = cart(Vec::new());
        assert!(cart.is_empty());
        assert_eq!(cart.item_count(), 0);
        assert_eq!(cart.subtotal().amount, Decimal::ZERO);
    }

    #[test]
    fn test_line_lookup() {
        let cart = cart(vec![line("a", "1", 1)]);
        assert!(cart.line(&LineItemId::new("a")).is_some());
        assert!(cart.line(&LineItemId::new("z")).is_none());
    }

    #[test]
    fn test_catalog_reference_options() {
        let reference = CatalogReference::new("prod-9").with_option("Taille", "1 kg");
        let json = serde_json::to_value(&reference).unwrap();
        assert_eq!(json["productId"], "prod-9");
        assert_eq!(json["options"]["Taille"], "1 kg");
    }
}
