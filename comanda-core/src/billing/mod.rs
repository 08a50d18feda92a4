//! Room bill consolidator
//!
//! A bill groups a room's unpaid orders into a single payable unit. Paying
//! the bill is the one place allowed to bypass the order transition table:
//! every member is forced to `Paid` with the bill's payment details.

use crate::common::error::{CoreError, CoreResult};
use crate::fanout::{DomainEvent, FanoutEngine};
use crate::inventory::{StockLedger, StockWarning};
use crate::orders::money;
use crate::orders::storage::{OrderStorage, StorageError};
use crate::services::catalog::CatalogProvider;
use rust_decimal::Decimal;
use shared::util::{new_id, now_millis};
use shared::{BillStatus, Order, OrderStatus, PaymentMethod, RoomBill};
use std::sync::Arc;

/// Result of a bill transition
#[derive(Debug, Clone)]
pub struct BillOutcome {
    pub bill: RoomBill,
    /// Non-fatal stock trouble from deductions forced member payments ran
    pub stock_warnings: Vec<StockWarning>,
}

pub struct BillManager {
    storage: OrderStorage,
    catalog: Arc<dyn CatalogProvider>,
    ledger: StockLedger,
    fanout: FanoutEngine,
}

impl BillManager {
    pub fn new(
        storage: OrderStorage,
        catalog: Arc<dyn CatalogProvider>,
        ledger: StockLedger,
        fanout: FanoutEngine,
    ) -> Self {
        Self {
            storage,
            catalog,
            ledger,
            fanout,
        }
    }

    /// Consolidate unpaid orders of one room into a draft bill
    ///
    /// Every referenced order must exist, belong to `room_number`, and still
    /// be payable (not `Paid`, not `Cancelled`). Repeated ids are collapsed.
    pub fn create_bill(
        &self,
        room_number: i32,
        order_ids: Vec<String>,
        tip_amount: f64,
        guest_name: Option<String>,
    ) -> CoreResult<RoomBill> {
        money::validate_tip(tip_amount)?;
        let mut member_ids: Vec<String> = Vec::with_capacity(order_ids.len());
        for id in order_ids {
            if !member_ids.contains(&id) {
                member_ids.push(id);
            }
        }
        if member_ids.is_empty() {
            return Err(CoreError::InvalidInput("bill has no member orders".into()));
        }

        let txn = self.storage.begin_write()?;
        let mut members_total = Decimal::ZERO;
        for id in &member_ids {
            let order = self.storage.get_order_txn(&txn, id)?.ok_or_else(|| {
                CoreError::InvalidInput(format!("referenced order does not exist: {}", id))
            })?;
            if matches!(order.status, OrderStatus::Paid | OrderStatus::Cancelled) {
                return Err(CoreError::InvalidInput(format!(
                    "order {} is not unpaid (status {})",
                    id, order.status
                )));
            }
            if order.room_number != Some(room_number) {
                return Err(CoreError::InvalidInput(format!(
                    "order {} does not belong to room {}",
                    id, room_number
                )));
            }
            members_total += money::to_decimal(order.total_amount);
        }

        let now = now_millis();
        let bill = RoomBill {
            id: new_id(),
            room_number,
            guest_name,
            order_ids: member_ids,
            status: BillStatus::Draft,
            tip_amount,
            total_amount: money::to_f64(members_total + money::to_decimal(tip_amount)),
            payment_method: None,
            created_at: now,
            paid_at: None,
            updated_at: now,
        };
        self.storage.store_bill(&txn, &bill)?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(
            bill_id = %bill.id,
            room = room_number,
            members = bill.order_ids.len(),
            total = bill.total_amount,
            "Room bill created"
        );
        Ok(bill)
    }

    /// Advance a bill through its state machine
    ///
    /// First transition to `Paid` settles every member order in the same
    /// transaction: status forced to `Paid`, `paid_at` and payment method
    /// taken from the bill. Members that were individually paid after the
    /// bill was drafted are left alone, which also keeps their stock
    /// deduction from running twice.
    pub fn advance(
        &self,
        bill_id: &str,
        new_status: BillStatus,
        payment_method: Option<PaymentMethod>,
    ) -> CoreResult<BillOutcome> {
        let txn = self.storage.begin_write()?;
        let mut bill = self
            .storage
            .get_bill_txn(&txn, bill_id)?
            .ok_or_else(|| CoreError::BillNotFound(bill_id.to_string()))?;
        if !bill.status.can_transition_to(new_status) {
            return Err(CoreError::InvalidBillTransition {
                from: bill.status,
                to: new_status,
            });
        }

        let now = now_millis();
        let previous_bill_status = bill.status;
        bill.status = new_status;
        bill.updated_at = now;

        let mut forced: Vec<(Order, OrderStatus)> = Vec::new();
        if new_status == BillStatus::Paid {
            if let Some(method) = payment_method {
                bill.payment_method = Some(method);
            }
            if bill.paid_at.is_none() {
                bill.paid_at = Some(now);
            }
            for id in &bill.order_ids {
                let Some(mut order) = self.storage.get_order_txn(&txn, id)? else {
                    tracing::warn!(bill_id = %bill.id, order_id = %id, "Bill member vanished, skipping");
                    continue;
                };
                if order.status == OrderStatus::Paid {
                    continue;
                }
                let previous = order.status;
                order.status = OrderStatus::Paid;
                order.paid_at = bill.paid_at;
                if bill.payment_method.is_some() {
                    order.payment_method = bill.payment_method;
                }
                order.updated_at = now;
                self.storage.store_order(&txn, &order)?;
                forced.push((order, previous));
            }
        }
        self.storage.store_bill(&txn, &bill)?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(
            bill_id = %bill.id,
            from = %previous_bill_status,
            to = %new_status,
            forced_members = forced.len(),
            "Room bill advanced"
        );

        let mut stock_warnings = Vec::new();
        for (order, previous) in forced {
            let report = self.ledger.deduct(&order, self.catalog.as_ref());
            stock_warnings.extend(report.warnings);
            self.fanout.dispatch(&DomainEvent::OrderStatusChanged {
                order,
                previous,
            });
            for alert in report.alerts {
                self.fanout.dispatch(&DomainEvent::LowStock(alert));
            }
        }

        Ok(BillOutcome {
            bill,
            stock_warnings,
        })
    }

    pub fn get_bill(&self, bill_id: &str) -> CoreResult<RoomBill> {
        self.storage
            .get_bill(bill_id)?
            .ok_or_else(|| CoreError::BillNotFound(bill_id.to_string()))
    }
}
