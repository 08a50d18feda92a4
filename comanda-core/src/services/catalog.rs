//! Catalog lookup contract
//!
//! The core only ever reads the catalog: price and availability at order
//! time, recipe components at payment time. Menu CRUD lives outside.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One ingredient requirement of a catalog item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecipeComponent {
    pub component_id: String,
    /// Amount consumed per unit of the catalog item
    pub quantity: f64,
}

/// Catalog item as seen by the core
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub available: bool,
    /// Empty when no recipe is recorded for the item
    #[serde(default)]
    pub recipe: Vec<RecipeComponent>,
}

/// Read-only catalog lookup seam
pub trait CatalogProvider: Send + Sync {
    fn get_item(&self, item_id: &str) -> Option<CatalogItem>;
}

/// In-memory catalog for tests and single-process deployments
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    items: DashMap<String, CatalogItem>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, item: CatalogItem) {
        self.items.insert(item.id.clone(), item);
    }

    /// Toggle availability; returns the updated item when it exists
    pub fn set_availability(&self, item_id: &str, available: bool) -> Option<CatalogItem> {
        self.items.get_mut(item_id).map(|mut entry| {
            entry.available = available;
            entry.clone()
        })
    }
}

impl CatalogProvider for MemoryCatalog {
    fn get_item(&self, item_id: &str) -> Option<CatalogItem> {
        self.items.get(item_id).map(|entry| entry.clone())
    }
}

impl CatalogProvider for Arc<MemoryCatalog> {
    fn get_item(&self, item_id: &str) -> Option<CatalogItem> {
        self.as_ref().get_item(item_id)
    }
}
