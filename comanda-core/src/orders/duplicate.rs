//! Duplicate suppression guard for order creation
//!
//! A flaky client may submit the same create command twice on a retried
//! call. A candidate counts as a duplicate only when creator, identifier,
//! and the exact (item_id, quantity) multiset all match; the check runs
//! inside the creation transaction so it cannot race the insert it guards.

use crate::orders::storage::{OrderStorage, StorageResult};
use redb::WriteTransaction;
use shared::order::{LineInput, OrderLine};
use shared::{CreateOrderInput, Order};

/// Exact multiset equality on (item_id, quantity) pairs
///
/// Notes and preparation flags are ignored; a retry never carries different
/// quantities.
pub fn lines_match(existing: &[OrderLine], requested: &[LineInput]) -> bool {
    if existing.len() != requested.len() {
        return false;
    }
    let mut a: Vec<(&str, i32)> = existing
        .iter()
        .map(|l| (l.item_id.as_str(), l.quantity))
        .collect();
    let mut b: Vec<(&str, i32)> = requested
        .iter()
        .map(|l| (l.item_id.as_str(), l.quantity))
        .collect();
    a.sort_unstable();
    b.sort_unstable();
    a == b
}

/// Find an order that makes `input` a duplicate submission
///
/// Scans orders created by `created_by` within the trailing window and
/// returns the most recent full match, if any.
pub fn find_duplicate(
    storage: &OrderStorage,
    txn: &WriteTransaction,
    created_by: &str,
    input: &CreateOrderInput,
    now_millis: i64,
    window_ms: i64,
) -> StorageResult<Option<Order>> {
    let since = now_millis.saturating_sub(window_ms);
    let candidates = storage.recent_creations_txn(txn, created_by, since)?;

    // Candidates arrive oldest first; keep the last match
    let duplicate = candidates
        .into_iter()
        .filter(|candidate| {
            candidate.identifier_matches(input.room_number, input.client_tag.as_deref())
                && lines_match(&candidate.lines, &input.lines)
        })
        .next_back();
    Ok(duplicate)
}
