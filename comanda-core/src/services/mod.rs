//! Collaborator contracts the core depends on but does not own

pub mod catalog;

pub use catalog::{CatalogItem, CatalogProvider, MemoryCatalog, RecipeComponent};
