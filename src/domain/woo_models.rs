//! Raw record types for the WooCommerce-style provider REST API.
//!
//! These models mirror the provider's loosely-typed JSON. Every field the
//! core does not strictly need carries a `#[serde(default)]` so one
//! malformed or missing field never rejects the whole record - tolerance
//! happens once here, at the boundary.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lifecycle status of a provider product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Publish,
    Draft,
    Pending,
    /// Anything the provider adds later (e.g. "private").
    #[serde(other)]
    Other,
}

impl Default for ProductStatus {
    fn default() -> Self {
        ProductStatus::Other
    }
}

/// Provider stock status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StockStatus {
    Instock,
    Outofstock,
    Onbackorder,
    #[serde(other)]
    Other,
}

impl Default for StockStatus {
    fn default() -> Self {
        StockStatus::Outofstock
    }
}

/// A taxonomy assignment on a product (category or tag).
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct TaxonomyRef {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
}

/// A product attribute (name plus option strings).
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct AttributeEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub options: Vec<String>,
}

/// A metadata entry. Values are arbitrary JSON on the wire; the extractor
/// only consumes the ones that read back as plain strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct MetaEntry {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

impl MetaEntry {
    /// The value as a plain string, if it is one.
    pub fn value_str(&self) -> Option<&str> {
        self.value.as_str()
    }
}

/// An image reference on a product.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ImageRef {
    #[serde(default)]
    pub src: String,
    #[serde(default)]
    pub alt: String,
}

/// One product record as received from the provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RawProduct {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: ProductStatus,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub categories: Vec<TaxonomyRef>,
    #[serde(default)]
    pub tags: Vec<TaxonomyRef>,
    #[serde(default)]
    pub attributes: Vec<AttributeEntry>,
    #[serde(default)]
    pub meta_data: Vec<MetaEntry>,
    #[serde(default)]
    pub images: Vec<ImageRef>,
    /// Prices arrive as decimal strings; empty when unset.
    #[serde(default)]
    pub regular_price: String,
    #[serde(default)]
    pub sale_price: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub stock_status: StockStatus,
    #[serde(default)]
    pub stock_quantity: Option<i64>,
}

impl RawProduct {
    /// Effective numeric price: sale price when set, then the provider's
    /// computed price, then the regular price. A missing or malformed
    /// price yields `0.0` rather than an error.
    pub fn effective_price(&self) -> f64 {
        for candidate in [&self.sale_price, &self.price, &self.regular_price] {
            if let Ok(p) = candidate.trim().parse::<f64>() {
                return p;
            }
        }
        0.0
    }

    /// Lowercased name + description, the haystack every classification
    /// keyword and extraction regex runs against.
    pub fn search_text(&self) -> String {
        let mut text = String::with_capacity(
            self.name.len() + self.description.len() + self.short_description.len() + 2,
        );
        text.push_str(&self.name);
        text.push(' ');
        text.push_str(&self.description);
        text.push(' ');
        text.push_str(&self.short_description);
        text.to_lowercase()
    }

    pub fn is_published(&self) -> bool {
        self.status == ProductStatus::Publish
    }
}

/// One entry of the provider's category taxonomy.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CategoryEntry {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    /// Provider uses `0` for root categories.
    #[serde(default)]
    pub parent: i64,
    #[serde(default)]
    pub count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_tolerates_missing_fields() {
        let record: RawProduct = serde_json::from_value(json!({ "id": 42 })).unwrap();
        assert_eq!(record.id, 42);
        assert_eq!(record.name, "");
        assert_eq!(record.status, ProductStatus::Other);
        assert!(record.categories.is_empty());
        assert_eq!(record.effective_price(), 0.0);
    }

    #[test]
    fn test_unknown_status_maps_to_other() {
        let record: RawProduct =
            serde_json::from_value(json!({ "id": 1, "status": "private" })).unwrap();
        assert_eq!(record.status, ProductStatus::Other);
        assert!(!record.is_published());
    }

    #[test]
    fn test_effective_price_prefers_sale_price() {
        let record: RawProduct = serde_json::from_value(json!({
            "id": 1,
            "regular_price": "199.99",
            "sale_price": "149.99"
        }))
        .unwrap();
        assert_eq!(record.effective_price(), 149.99);
    }

    #[test]
    fn test_effective_price_malformed_falls_through() {
        let record: RawProduct = serde_json::from_value(json!({
            "id": 1,
            "sale_price": "n/a",
            "regular_price": "89.50"
        }))
        .unwrap();
        assert_eq!(record.effective_price(), 89.50);
    }

    #[test]
    fn test_meta_value_str_skips_non_strings() {
        let meta: MetaEntry =
            serde_json::from_value(json!({ "key": "_views", "value": 17 })).unwrap();
        assert!(meta.value_str().is_none());
    }
}
