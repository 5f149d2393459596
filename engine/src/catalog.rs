//! Catalog types: products and their variants.

use crate::{error::Result, Error, Price, ProductId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A purchasable option of a product, with its own stock count.
///
/// Stock is only ever changed through the atomic adjust primitive of the
/// inventory store, never by overwriting this value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    /// Variant name, unique within its product
    pub name: String,
    /// Units in stock. Non-negative at rest; may dip below zero transiently
    /// while a lost race is being compensated.
    pub quantity: i64,
}

impl Variant {
    /// Create a new variant.
    pub fn new(name: impl Into<String>, quantity: i64) -> Self {
        Self {
            name: name.into(),
            quantity,
        }
    }

    /// Check whether any unit is left.
    pub fn in_stock(&self) -> bool {
        self.quantity > 0
    }
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Stable identifier
    pub id: ProductId,
    /// Display name
    pub name: String,
    /// Unit price in the smallest currency unit
    pub price: Price,
    /// Catalog category
    pub category: String,
    /// Variants, in display order
    pub flavors: Vec<Variant>,
}

impl Product {
    /// Create a new product.
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        price: Price,
        category: impl Into<String>,
        flavors: Vec<Variant>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            category: category.into(),
            flavors,
        }
    }

    /// Look up a variant by name.
    pub fn variant(&self, name: &str) -> Option<&Variant> {
        self.flavors.iter().find(|v| v.name == name)
    }

    /// Sum of stock across all variants.
    pub fn total_stock(&self) -> i64 {
        self.flavors.iter().map(|v| v.quantity.max(0)).sum()
    }

    /// Variants with at least one unit left.
    pub fn available_flavors(&self) -> impl Iterator<Item = &Variant> {
        self.flavors.iter().filter(|v| v.in_stock())
    }

    /// Validate the product before it is written to the catalog.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::InvalidCatalog("product id is empty".into()));
        }
        if self.name.trim().is_empty() {
            return Err(Error::InvalidCatalog(format!(
                "product {} has no name",
                self.id
            )));
        }

        let mut seen = HashSet::new();
        for variant in &self.flavors {
            if variant.name.trim().is_empty() {
                return Err(Error::InvalidCatalog(format!(
                    "product {} has a variant without a name",
                    self.id
                )));
            }
            if !seen.insert(variant.name.as_str()) {
                return Err(Error::InvalidCatalog(format!(
                    "product {} has duplicate variant '{}'",
                    self.id, variant.name
                )));
            }
            if variant.quantity < 0 {
                return Err(Error::InvalidCatalog(format!(
                    "variant '{}' of product {} has negative stock",
                    variant.name, self.id
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pod() -> Product {
        Product::new(
            "pod-1",
            "Pod",
            1500,
            "pods",
            vec![Variant::new("Mint", 2), Variant::new("Menthol", 0)],
        )
    }

    #[test]
    fn variant_lookup() {
        let product = pod();
        assert_eq!(product.variant("Mint").map(|v| v.quantity), Some(2));
        assert!(product.variant("Grape").is_none());
    }

    #[test]
    fn available_flavors_skip_empty() {
        let product = pod();
        let names: Vec<_> = product.available_flavors().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["Mint"]);
        assert_eq!(product.total_stock(), 2);
    }

    #[test]
    fn validate_accepts_well_formed_product() {
        assert!(pod().validate().is_ok());
    }

    #[test]
    fn validate_rejects_duplicate_variants() {
        let mut product = pod();
        product.flavors.push(Variant::new("Mint", 5));
        assert!(matches!(product.validate(), Err(Error::InvalidCatalog(_))));
    }

    #[test]
    fn validate_rejects_negative_stock() {
        let mut product = pod();
        product.flavors[1].quantity = -1;
        assert!(matches!(product.validate(), Err(Error::InvalidCatalog(_))));
    }

    #[test]
    fn validate_rejects_blank_id() {
        let mut product = pod();
        product.id = "  ".into();
        assert!(product.validate().is_err());
    }

    #[test]
    fn serialization_format() {
        let json = serde_json::to_value(pod()).unwrap();
        assert_eq!(json["flavors"][0]["name"], "Mint");
        assert_eq!(json["flavors"][0]["quantity"], 2);
        assert_eq!(json["category"], "pods");
    }
}
