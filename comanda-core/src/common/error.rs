//! Error taxonomy for the core
//!
//! Every failure is scoped to a single command; nothing here is fatal to the
//! process. Stock trouble during payment is deliberately NOT an error - it is
//! surfaced as `StockWarning` data on the successful result. Publish failures
//! are logged inside the fanout engine and never reach callers.

use crate::orders::storage::StorageError;
use shared::{BillStatus, OrderStatus};
use thiserror::Error;

/// Core errors
#[derive(Debug, Error)]
pub enum CoreError {
    /// Rejected before any persistence (missing identifier, unknown or
    /// unavailable catalog item, non-positive quantity, bad amounts)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Status change not permitted from the current state; state untouched
    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Bill status change not permitted from the current state
    #[error("invalid bill transition: {from} -> {to}")]
    InvalidBillTransition { from: BillStatus, to: BillStatus },

    /// Terminal orders accept no further direct mutation
    #[error("order {0} is terminal ({1}): changes go through the room bill or are rejected")]
    OrderTerminal(String, OrderStatus),

    #[error("order not found: {0}")]
    OrderNotFound(String),

    #[error("bill not found: {0}")]
    BillNotFound(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type CoreResult<T> = Result<T, CoreError>;
