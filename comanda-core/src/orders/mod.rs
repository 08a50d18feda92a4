//! Order aggregate: validation, persistence, duplicate guard, and the
//! command surface

pub mod duplicate;
pub mod manager;
pub mod money;
pub mod storage;

pub use manager::{CreateOutcome, OrderManager, StatusOutcome};
pub use storage::OrderStorage;
