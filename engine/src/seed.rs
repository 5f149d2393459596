//! Catalog seed documents.
//!
//! A seed is a JSON file listing the products a fresh shop starts with. It is
//! validated as a whole before anything is written, so a bad file leaves the
//! catalog untouched.

use crate::error::Result;
use crate::store::InventoryStore;
use crate::{AdminGrant, Error, Product};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Version of the seed format this build understands.
pub const SEED_FORMAT_VERSION: u32 = 1;

/// A catalog seed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSeed {
    /// Seed format version
    pub format_version: u32,
    /// Products to upsert, in file order
    pub products: Vec<Product>,
}

impl CatalogSeed {
    /// Create a seed in the current format.
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            format_version: SEED_FORMAT_VERSION,
            products,
        }
    }

    /// Parse a seed from JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let seed: Self =
            serde_json::from_str(json).map_err(|e| Error::InvalidCatalog(e.to_string()))?;
        seed.validate()?;
        Ok(seed)
    }

    /// Serialize to pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::InvalidCatalog(e.to_string()))
    }

    /// Check the version, product id uniqueness and every product.
    pub fn validate(&self) -> Result<()> {
        if self.format_version == 0 || self.format_version > SEED_FORMAT_VERSION {
            return Err(Error::InvalidCatalog(format!(
                "unsupported seed format version: {} (max supported: {})",
                self.format_version, SEED_FORMAT_VERSION
            )));
        }

        let mut seen = HashSet::new();
        for product in &self.products {
            if !seen.insert(product.id.as_str()) {
                return Err(Error::InvalidCatalog(format!(
                    "duplicate product id '{}'",
                    product.id
                )));
            }
            product.validate()?;
        }

        Ok(())
    }

    /// Validate, then upsert every product. Returns how many were written.
    ///
    /// Stock of variants already in the store is kept; see
    /// [`InventoryStore::upsert_product`]. Startup tooling passes
    /// [`AdminGate::trusted`](crate::AdminGate::trusted).
    pub async fn apply<S>(&self, _grant: &AdminGrant, store: &S) -> Result<usize>
    where
        S: InventoryStore + ?Sized,
    {
        self.validate()?;
        for product in &self.products {
            store.upsert_product(product).await?;
        }
        tracing::info!(products = self.products.len(), "Applied catalog seed");
        Ok(self.products.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AdminGate, MemoryStore, Variant};

    fn pod(id: &str) -> Product {
        Product::new(id, "Pod", 1500, "pods", vec![Variant::new("Mint", 3)])
    }

    #[test]
    fn parses_documented_layout() {
        let json = r#"{
            "formatVersion": 1,
            "products": [
                {
                    "id": "pod-1",
                    "name": "Pod",
                    "price": 1500,
                    "category": "pods",
                    "flavors": [{ "name": "Mint", "quantity": 3 }]
                }
            ]
        }"#;

        let seed = CatalogSeed::from_json(json).unwrap();
        assert_eq!(seed.products, vec![pod("pod-1")]);
    }

    #[test]
    fn rejects_future_version() {
        let mut seed = CatalogSeed::new(vec![pod("pod-1")]);
        seed.format_version = SEED_FORMAT_VERSION + 1;
        assert!(matches!(seed.validate(), Err(Error::InvalidCatalog(_))));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let seed = CatalogSeed::new(vec![pod("pod-1"), pod("pod-1")]);
        assert!(matches!(
            seed.validate(),
            Err(Error::InvalidCatalog(msg)) if msg.contains("pod-1")
        ));
    }

    #[test]
    fn rejects_invalid_product() {
        let mut bad = pod("pod-2");
        bad.flavors.push(Variant::new("Mint", 1));
        let seed = CatalogSeed::new(vec![pod("pod-1"), bad]);
        assert!(seed.validate().is_err());
    }

    #[test]
    fn malformed_json() {
        assert!(matches!(
            CatalogSeed::from_json("{ not json"),
            Err(Error::InvalidCatalog(_))
        ));
    }

    #[tokio::test]
    async fn apply_writes_nothing_when_invalid() {
        let store = MemoryStore::new();
        let seed = CatalogSeed::new(vec![pod("pod-1"), pod("pod-1")]);

        let grant = AdminGate::trusted(0);

        assert!(seed.apply(&grant, &store).await.is_err());
        assert!(store.products().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn apply_keeps_existing_stock() {
        let store = MemoryStore::new();
        let grant = AdminGate::trusted(0);
        CatalogSeed::new(vec![pod("pod-1")])
            .apply(&grant, &store)
            .await
            .unwrap();
        store.adjust_stock("pod-1", "Mint", -2).await.unwrap();

        let written = CatalogSeed::new(vec![pod("pod-1"), pod("pod-2")])
            .apply(&grant, &store)
            .await
            .unwrap();

        assert_eq!(written, 2);
        assert_eq!(store.variant_stock("pod-1", "Mint").await.unwrap(), Some(1));
        assert_eq!(store.variant_stock("pod-2", "Mint").await.unwrap(), Some(3));
    }
}
