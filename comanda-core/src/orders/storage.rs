//! redb-based storage for orders and room bills
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `orders` | `order_id` | `Order` | Current order state |
//! | `bills` | `bill_id` | `RoomBill` | Current bill state |
//! | `created_index` | `(created_by, created_at, order_id)` | `()` | Creation index for the duplicate guard |
//!
//! Values are JSON-serialized. redb allows a single write transaction at a
//! time, which is what serializes concurrent commands against the same order;
//! reads run on their own snapshots and never block.

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use shared::{Order, RoomBill};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Current order state: key = order_id, value = JSON-serialized Order
const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

/// Current bill state: key = bill_id, value = JSON-serialized RoomBill
const BILLS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("bills");

/// Creation index for the duplicate guard: key = (created_by, created_at, order_id)
const CREATED_INDEX: TableDefinition<(&str, i64, &str), ()> = TableDefinition::new("created_index");

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Order and bill storage backed by redb
#[derive(Clone)]
pub struct OrderStorage {
    db: Arc<Database>,
}

impl OrderStorage {
    /// Open or create the database at the given path
    ///
    /// redb commits are durable as soon as `commit()` returns (copy-on-write
    /// with atomic pointer swap), so a crash mid-command leaves the previous
    /// consistent state.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (tests and ephemeral deployments)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(BILLS_TABLE)?;
            let _ = write_txn.open_table(CREATED_INDEX)?;
        }
        write_txn.commit()?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Orders ==========

    /// Store (insert or replace) an order within a transaction
    pub fn store_order(&self, txn: &WriteTransaction, order: &Order) -> StorageResult<()> {
        let mut table = txn.open_table(ORDERS_TABLE)?;
        let value = serde_json::to_vec(order)?;
        table.insert(order.id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Record an order in the creation index (creation only, same transaction
    /// as the insert it guards)
    pub fn index_creation(&self, txn: &WriteTransaction, order: &Order) -> StorageResult<()> {
        let mut table = txn.open_table(CREATED_INDEX)?;
        table.insert(
            (order.created_by.as_str(), order.created_at, order.id.as_str()),
            (),
        )?;
        Ok(())
    }

    /// Get an order by ID (read-only)
    pub fn get_order(&self, order_id: &str) -> StorageResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get an order by ID within a write transaction
    pub fn get_order_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Option<Order>> {
        let table = txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// All orders for a room, in creation order
    pub fn orders_for_room(&self, room_number: i32) -> StorageResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;

        let mut orders = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let order: Order = serde_json::from_slice(value.value())?;
            if order.room_number == Some(room_number) {
                orders.push(order);
            }
        }
        orders.sort_by_key(|o| o.created_at);
        Ok(orders)
    }

    /// Orders created by one actor at or after `since_millis`, oldest first
    ///
    /// Runs inside the caller's write transaction so the duplicate guard sees
    /// creations the current serialization boundary already committed.
    pub fn recent_creations_txn(
        &self,
        txn: &WriteTransaction,
        created_by: &str,
        since_millis: i64,
    ) -> StorageResult<Vec<Order>> {
        let index = txn.open_table(CREATED_INDEX)?;
        let orders_table = txn.open_table(ORDERS_TABLE)?;

        let mut orders = Vec::new();
        for result in index.range((created_by, since_millis, "")..)? {
            let (key, _) = result?;
            let (creator, _created_at, order_id) = key.value();
            if creator != created_by {
                break;
            }
            if let Some(value) = orders_table.get(order_id)? {
                orders.push(serde_json::from_slice(value.value())?);
            }
        }
        Ok(orders)
    }

    // ========== Bills ==========

    /// Store (insert or replace) a bill within a transaction
    pub fn store_bill(&self, txn: &WriteTransaction, bill: &RoomBill) -> StorageResult<()> {
        let mut table = txn.open_table(BILLS_TABLE)?;
        let value = serde_json::to_vec(bill)?;
        table.insert(bill.id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Get a bill by ID (read-only)
    pub fn get_bill(&self, bill_id: &str) -> StorageResult<Option<RoomBill>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(BILLS_TABLE)?;
        match table.get(bill_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get a bill by ID within a write transaction
    pub fn get_bill_txn(
        &self,
        txn: &WriteTransaction,
        bill_id: &str,
    ) -> StorageResult<Option<RoomBill>> {
        let table = txn.open_table(BILLS_TABLE)?;
        match table.get(bill_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::order::OrderLine;
    use shared::{BillStatus, OrderStatus};

    fn order(id: &str, created_by: &str, created_at: i64) -> Order {
        Order {
            id: id.to_string(),
            room_number: Some(4),
            client_tag: None,
            status: OrderStatus::Pending,
            lines: vec![OrderLine {
                item_id: "empanada".into(),
                name: "Empanada".into(),
                unit_price: 2500.0,
                quantity: 1,
                note: None,
                is_prepared: false,
            }],
            tip_amount: 0.0,
            total_amount: 2500.0,
            payment_method: None,
            payment_reference: None,
            created_by: created_by.to_string(),
            created_at,
            paid_at: None,
            updated_at: created_at,
        }
    }

    #[test]
    fn order_round_trip() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let order = order("order-1", "staff-1", 1_000);

        let txn = storage.begin_write().unwrap();
        storage.store_order(&txn, &order).unwrap();
        txn.commit().unwrap();

        let loaded = storage.get_order("order-1").unwrap().unwrap();
        assert_eq!(loaded, order);
        assert!(storage.get_order("missing").unwrap().is_none());
    }

    #[test]
    fn orders_for_room_filters_and_sorts() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let mut other_room = order("order-b", "staff-1", 500);
        other_room.room_number = Some(9);

        let txn = storage.begin_write().unwrap();
        storage.store_order(&txn, &order("order-c", "staff-1", 2_000)).unwrap();
        storage.store_order(&txn, &order("order-a", "staff-1", 1_000)).unwrap();
        storage.store_order(&txn, &other_room).unwrap();
        txn.commit().unwrap();

        let orders = storage.orders_for_room(4).unwrap();
        let ids: Vec<&str> = orders.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["order-a", "order-c"]);
    }

    #[test]
    fn creation_index_scopes_by_creator_and_time() {
        let storage = OrderStorage::open_in_memory().unwrap();

        let txn = storage.begin_write().unwrap();
        for (id, creator, at) in [
            ("old", "staff-1", 1_000i64),
            ("recent-1", "staff-1", 5_000),
            ("recent-2", "staff-1", 6_000),
            ("other-staff", "staff-2", 6_000),
        ] {
            let o = order(id, creator, at);
            storage.store_order(&txn, &o).unwrap();
            storage.index_creation(&txn, &o).unwrap();
        }
        txn.commit().unwrap();

        let txn = storage.begin_write().unwrap();
        let recent = storage.recent_creations_txn(&txn, "staff-1", 5_000).unwrap();
        let ids: Vec<&str> = recent.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["recent-1", "recent-2"]);
    }

    #[test]
    fn recent_creations_sees_uncommitted_writes() {
        let storage = OrderStorage::open_in_memory().unwrap();

        let txn = storage.begin_write().unwrap();
        let o = order("order-1", "staff-1", 2_000);
        storage.store_order(&txn, &o).unwrap();
        storage.index_creation(&txn, &o).unwrap();

        // Visible inside the same transaction before commit
        let recent = storage.recent_creations_txn(&txn, "staff-1", 0).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, "order-1");
    }

    #[test]
    fn bill_round_trip() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let bill = RoomBill {
            id: "bill-1".into(),
            room_number: 4,
            guest_name: Some("Herrera".into()),
            order_ids: vec!["order-1".into()],
            status: BillStatus::Draft,
            tip_amount: 0.0,
            total_amount: 2500.0,
            payment_method: None,
            created_at: 1_000,
            paid_at: None,
            updated_at: 1_000,
        };

        let txn = storage.begin_write().unwrap();
        storage.store_bill(&txn, &bill).unwrap();
        txn.commit().unwrap();

        assert_eq!(storage.get_bill("bill-1").unwrap().unwrap(), bill);
        assert!(storage.get_bill("missing").unwrap().is_none());
    }
}
