//! Order lifecycle and notification-fanout core
//!
//! This crate implements the order management engine for a restaurant with
//! room service:
//!
//! - **orders**: the order aggregate (state machine, line edits, payment
//!   transitions), redb-backed persistence, and the duplicate suppression
//!   guard that makes creation safe under client retries
//! - **billing**: the room bill consolidator sitting above multiple orders
//! - **inventory**: best-effort stock deduction on payment, with low-stock
//!   alerts
//! - **fanout**: the routing table deciding what each staff role sees on
//!   every mutation, plus the fire-and-forget dispatcher
//! - **services**: the catalog contract the order engine validates against,
//!   with an in-memory implementation
//!
//! # Command Flow
//!
//! ```text
//! command (plain data)
//!     ├─ 1. Validate input against the catalog
//!     ├─ 2. Begin write transaction (serializes same-order commands)
//!     ├─ 3. Duplicate guard (creation only, inside the transaction)
//!     ├─ 4. Apply mutation, recompute totals
//!     ├─ 5. Commit
//!     ├─ 6. Stock deduction on non-paid → paid edges (best-effort)
//!     └─ 7. Fanout dispatch (after commit, never blocks the caller)
//! ```

pub mod billing;
pub mod common;
pub mod core;
pub mod fanout;
pub mod inventory;
pub mod orders;
pub mod services;

// Re-exports
pub use billing::{BillManager, BillOutcome};
pub use common::error::{CoreError, CoreResult};
pub use crate::core::config::Config;
pub use fanout::{DomainEvent, FanoutEngine, PublishSink};
pub use inventory::{LowStockAlert, MemoryStockStore, StockLedger, StockStore, StockWarning};
pub use orders::manager::{CreateOutcome, OrderManager, StatusOutcome};
pub use orders::storage::OrderStorage;
pub use services::catalog::{CatalogItem, CatalogProvider, MemoryCatalog, RecipeComponent};

// Re-export shared types for convenience
pub use shared::{
    BillStatus, CreateOrderInput, FanoutMessage, FanoutPayload, LineInput, Order, OrderLine,
    OrderStatus, PaymentMethod, RoomBill, StatusChangeInput, Topic,
};
