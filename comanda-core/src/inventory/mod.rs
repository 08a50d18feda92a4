//! Inventory ledger - best-effort stock deduction on payment
//!
//! Deduction never blocks or rolls back the payment transition that triggered
//! it. A missing recipe or a stock level driven negative is logged and
//! surfaced as a `StockWarning` on the command result; a component at or
//! below its threshold raises a low-stock alert for management.

use crate::services::catalog::CatalogProvider;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use shared::Order;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Non-fatal trouble encountered during a deduction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockWarning {
    /// The catalog item has no recorded recipe (or vanished from the catalog)
    MissingRecipe { item_id: String },
    /// The stock store does not know this component
    UnknownComponent { component_id: String },
    /// The decrement drove the level negative; it is NOT rolled back
    NegativeStock {
        component_id: String,
        name: String,
        quantity: f64,
    },
}

/// Low-stock alert raised when a component reaches its threshold
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LowStockAlert {
    pub component_id: String,
    pub name: String,
    pub quantity: f64,
    pub threshold: f64,
}

/// Result of one order deduction
#[derive(Debug, Clone, Default)]
pub struct DeductionReport {
    pub warnings: Vec<StockWarning>,
    pub alerts: Vec<LowStockAlert>,
}

/// Stock store contract
///
/// `decrement` must be an atomic subtract-from-current primitive, not a read
/// followed by a write: orders paid concurrently may hit the same component.
pub trait StockStore: Send + Sync {
    /// Atomically subtract `amount`; returns the new quantity, or `None` for
    /// an unknown component
    fn decrement(&self, component_id: &str, amount: f64) -> Option<f64>;

    /// Configured low-stock threshold for the component
    fn threshold(&self, component_id: &str) -> Option<f64>;

    /// Display name for alerts
    fn name(&self, component_id: &str) -> Option<String>;
}

#[derive(Debug, Clone)]
struct ComponentStock {
    name: String,
    quantity: f64,
    threshold: f64,
}

/// In-memory stock store
///
/// Decrements mutate the entry under its shard lock, so concurrent
/// deductions against the same component cannot lose updates.
#[derive(Debug, Default)]
pub struct MemoryStockStore {
    components: DashMap<String, ComponentStock>,
}

impl MemoryStockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_component(
        &self,
        component_id: impl Into<String>,
        name: impl Into<String>,
        quantity: f64,
        threshold: f64,
    ) {
        self.components.insert(
            component_id.into(),
            ComponentStock {
                name: name.into(),
                quantity,
                threshold,
            },
        );
    }

    pub fn quantity(&self, component_id: &str) -> Option<f64> {
        self.components.get(component_id).map(|c| c.quantity)
    }
}

impl StockStore for MemoryStockStore {
    fn decrement(&self, component_id: &str, amount: f64) -> Option<f64> {
        self.components.get_mut(component_id).map(|mut entry| {
            entry.quantity -= amount;
            entry.quantity
        })
    }

    fn threshold(&self, component_id: &str) -> Option<f64> {
        self.components.get(component_id).map(|c| c.threshold)
    }

    fn name(&self, component_id: &str) -> Option<String> {
        self.components.get(component_id).map(|c| c.name.clone())
    }
}

/// Conditional stock deduction driven by order lines and catalog recipes
#[derive(Clone)]
pub struct StockLedger {
    store: Arc<dyn StockStore>,
}

impl StockLedger {
    pub fn new(store: Arc<dyn StockStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn StockStore> {
        &self.store
    }

    /// Deduct the stock an order consumed
    ///
    /// Requirements are aggregated per component first (recipe quantity x
    /// line quantity, summed across lines sharing a component), then applied
    /// as one atomic decrement each.
    pub fn deduct(&self, order: &Order, catalog: &dyn CatalogProvider) -> DeductionReport {
        let mut report = DeductionReport::default();

        // component_id -> total required amount
        let mut required: BTreeMap<String, f64> = BTreeMap::new();
        for line in &order.lines {
            let recipe = catalog
                .get_item(&line.item_id)
                .map(|item| item.recipe)
                .unwrap_or_default();
            if recipe.is_empty() {
                tracing::warn!(
                    order_id = %order.id,
                    item_id = %line.item_id,
                    "No recipe recorded for item, skipping deduction"
                );
                report.warnings.push(StockWarning::MissingRecipe {
                    item_id: line.item_id.clone(),
                });
                continue;
            }
            for component in recipe {
                *required.entry(component.component_id).or_insert(0.0) +=
                    component.quantity * line.quantity as f64;
            }
        }

        for (component_id, amount) in required {
            let Some(new_quantity) = self.store.decrement(&component_id, amount) else {
                tracing::warn!(
                    order_id = %order.id,
                    component_id = %component_id,
                    "Unknown stock component, deduction skipped"
                );
                report.warnings.push(StockWarning::UnknownComponent {
                    component_id: component_id.clone(),
                });
                continue;
            };

            let name = self
                .store
                .name(&component_id)
                .unwrap_or_else(|| component_id.clone());

            if new_quantity < 0.0 {
                tracing::warn!(
                    order_id = %order.id,
                    component_id = %component_id,
                    quantity = new_quantity,
                    "Stock went negative after deduction"
                );
                report.warnings.push(StockWarning::NegativeStock {
                    component_id: component_id.clone(),
                    name: name.clone(),
                    quantity: new_quantity,
                });
            }

            if let Some(threshold) = self.store.threshold(&component_id)
                && new_quantity <= threshold
            {
                report.alerts.push(LowStockAlert {
                    component_id,
                    name,
                    quantity: new_quantity,
                    threshold,
                });
            }
        }

        report
    }
}
