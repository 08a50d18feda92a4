//! Order command surface
//!
//! One write transaction per command. Validation happens before the
//! transaction, the duplicate guard inside it, fanout and stock deduction
//! after the commit.

use crate::common::error::{CoreError, CoreResult};
use crate::core::config::DEFAULT_DUPLICATE_WINDOW_MS;
use crate::fanout::{DomainEvent, FanoutEngine};
use crate::inventory::{StockLedger, StockWarning};
use crate::orders::duplicate;
use crate::orders::money;
use crate::orders::storage::{OrderStorage, StorageError};
use crate::services::catalog::CatalogProvider;
use shared::order::{LineInput, OrderLine};
use shared::util::{new_id, now_millis};
use shared::{CreateOrderInput, Order, OrderStatus, StatusChangeInput};
use std::sync::Arc;

#[cfg(test)]
mod tests;

/// Result of a create command
#[derive(Debug, Clone)]
pub struct CreateOutcome {
    pub order: Order,
    /// True when an identical submission within the window was found and
    /// `order` is the previously persisted one
    pub is_duplicate: bool,
}

/// Result of a status-change command
#[derive(Debug, Clone)]
pub struct StatusOutcome {
    pub order: Order,
    /// Non-fatal stock trouble from the deduction a payment triggered
    pub stock_warnings: Vec<StockWarning>,
}

pub struct OrderManager {
    storage: OrderStorage,
    catalog: Arc<dyn CatalogProvider>,
    ledger: StockLedger,
    fanout: FanoutEngine,
    duplicate_window_ms: i64,
}

impl OrderManager {
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
            duplicate_window_ms: DEFAULT_DUPLICATE_WINDOW_MS,
        }
    }

    pub fn with_duplicate_window(mut self, window_ms: i64) -> Self {
        self.duplicate_window_ms = window_ms;
        self
    }

    pub fn fanout(&self) -> &FanoutEngine {
        &self.fanout
    }

    // ========== Commands ==========

    /// Create an order, suppressing duplicate submissions
    pub fn create_order(
        &self,
        created_by: &str,
        input: CreateOrderInput,
    ) -> CoreResult<CreateOutcome> {
        if input.room_number.is_none()
            && input
                .client_tag
                .as_deref()
                .is_none_or(|tag| tag.trim().is_empty())
        {
            return Err(CoreError::InvalidInput(
                "order needs a room number or a client tag".into(),
            ));
        }
        if input.lines.is_empty() {
            return Err(CoreError::InvalidInput("order has no lines".into()));
        }
        let tip_amount = input.tip_amount.unwrap_or(0.0);
        money::validate_tip(tip_amount)?;

        let lines = self.capture_lines(&input.lines)?;
        let now = now_millis();

        let txn = self.storage.begin_write()?;
        if let Some(existing) = duplicate::find_duplicate(
            &self.storage,
            &txn,
            created_by,
            &input,
            now,
            self.duplicate_window_ms,
        )? {
            // Nothing written; the transaction is dropped without commit
            tracing::info!(
                order_id = %existing.id,
                created_by = %created_by,
                "Duplicate submission suppressed, returning existing order"
            );
            return Ok(CreateOutcome {
                order: existing,
                is_duplicate: true,
            });
        }

        let total_amount = money::recompute_total(&lines, tip_amount);
        let order = Order {
            id: new_id(),
            room_number: input.room_number,
            client_tag: input.client_tag,
            status: OrderStatus::Pending,
            lines,
            tip_amount,
            total_amount,
            payment_method: None,
            payment_reference: None,
            created_by: created_by.to_string(),
            created_at: now,
            paid_at: None,
            updated_at: now,
        };
        self.storage.store_order(&txn, &order)?;
        self.storage.index_creation(&txn, &order)?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(
            order_id = %order.id,
            created_by = %created_by,
            total = order.total_amount,
            "Order created"
        );
        self.fanout.dispatch(&DomainEvent::OrderCreated(order.clone()));

        Ok(CreateOutcome {
            order,
            is_duplicate: false,
        })
    }

    /// Replace an order's lines as a set
    ///
    /// Each requested line is matched to an existing line with the same
    /// item id (first unmatched wins); matches keep the captured name and
    /// price, everything else is created fresh. An order edited while
    /// `Ready` drops back to `Preparing` with its matched lines marked
    /// prepared.
    pub fn replace_lines(&self, order_id: &str, requested: Vec<LineInput>) -> CoreResult<Order> {
        if requested.is_empty() {
            return Err(CoreError::InvalidInput("order has no lines".into()));
        }

        let txn = self.storage.begin_write()?;
        let mut order = self
            .storage
            .get_order_txn(&txn, order_id)?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;
        if order.status.is_terminal() {
            return Err(CoreError::OrderTerminal(order.id, order.status));
        }

        let was_ready = order.status == OrderStatus::Ready;
        let mut remaining: Vec<Option<OrderLine>> =
            order.lines.iter().cloned().map(Some).collect();
        let mut lines = Vec::with_capacity(requested.len());
        for request in &requested {
            money::validate_quantity(request.quantity)?;
            let matched = remaining
                .iter_mut()
                .find(|slot| {
                    slot.as_ref()
                        .is_some_and(|line| line.item_id == request.item_id)
                })
                .and_then(Option::take);
            let line = match matched {
                Some(existing) => OrderLine {
                    quantity: request.quantity,
                    note: request.note.clone(),
                    is_prepared: existing.is_prepared || was_ready,
                    ..existing
                },
                None => self.capture_line(request)?,
            };
            lines.push(line);
        }

        if was_ready {
            order.status = OrderStatus::Preparing;
        }
        order.lines = lines;
        order.total_amount = money::recompute_total(&order.lines, order.tip_amount);
        order.updated_at = now_millis();

        self.storage.store_order(&txn, &order)?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(
            order_id = %order.id,
            status = %order.status,
            total = order.total_amount,
            "Order lines replaced"
        );
        self.fanout
            .dispatch(&DomainEvent::OrderLinesReplaced(order.clone()));
        Ok(order)
    }

    /// Apply a status transition
    ///
    /// Payment fields are only touched on entry into a paid-like status. A
    /// supplied tip replaces the stored one and forces a total recompute
    /// from the stored line prices; an omitted tip leaves both untouched.
    pub fn set_status(&self, order_id: &str, input: StatusChangeInput) -> CoreResult<StatusOutcome> {
        let next = input.status;
        let txn = self.storage.begin_write()?;
        let mut order = self
            .storage
            .get_order_txn(&txn, order_id)?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;

        if !order.status.can_transition_to(next) {
            if order.status.is_terminal() {
                return Err(CoreError::OrderTerminal(order.id, order.status));
            }
            return Err(CoreError::InvalidTransition {
                from: order.status,
                to: next,
            });
        }

        let previous = order.status;
        let now = now_millis();
        order.status = next;
        if next.is_paid_like() {
            if let Some(method) = input.payment_method {
                order.payment_method = Some(method);
            }
            if let Some(reference) = input.payment_reference {
                order.payment_reference = Some(reference);
            }
            if let Some(tip) = input.tip_amount {
                money::validate_tip(tip)?;
                order.tip_amount = tip;
                order.total_amount = money::recompute_total(&order.lines, tip);
            }
            if order.paid_at.is_none() {
                order.paid_at = Some(now);
            }
        }
        order.updated_at = now;

        self.storage.store_order(&txn, &order)?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(
            order_id = %order.id,
            from = %previous,
            to = %next,
            "Order status changed"
        );

        // Deduction fires exactly once, on the non-paid -> paid edge
        let mut stock_warnings = Vec::new();
        let mut alerts = Vec::new();
        if next == OrderStatus::Paid {
            let report = self.ledger.deduct(&order, self.catalog.as_ref());
            stock_warnings = report.warnings;
            alerts = report.alerts;
        }

        self.fanout.dispatch(&DomainEvent::OrderStatusChanged {
            order: order.clone(),
            previous,
        });
        for alert in alerts {
            self.fanout.dispatch(&DomainEvent::LowStock(alert));
        }

        Ok(StatusOutcome {
            order,
            stock_warnings,
        })
    }

    /// Relay a menu item's current availability through the fanout engine
    ///
    /// The catalog itself is toggled by its owner; the core only announces
    /// the change.
    pub fn notify_availability(&self, item_id: &str) -> CoreResult<()> {
        let item = self.catalog.get_item(item_id).ok_or_else(|| {
            CoreError::InvalidInput(format!("unknown catalog item: {}", item_id))
        })?;
        self.fanout.dispatch(&DomainEvent::MenuItemAvailability {
            item_id: item.id,
            name: item.name,
            available: item.available,
        });
        Ok(())
    }

    // ========== Queries ==========

    pub fn get_order(&self, order_id: &str) -> CoreResult<Order> {
        self.storage
            .get_order(order_id)?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))
    }

    pub fn orders_for_room(&self, room_number: i32) -> CoreResult<Vec<Order>> {
        Ok(self.storage.orders_for_room(room_number)?)
    }

    /// Orders for a room that are still payable (not settled, not cancelled)
    pub fn unpaid_orders_for_room(&self, room_number: i32) -> CoreResult<Vec<Order>> {
        let orders = self.storage.orders_for_room(room_number)?;
        Ok(orders
            .into_iter()
            .filter(|o| !matches!(o.status, OrderStatus::Paid | OrderStatus::Cancelled))
            .collect())
    }

    // ========== Helpers ==========

    fn capture_lines(&self, requested: &[LineInput]) -> CoreResult<Vec<OrderLine>> {
        requested
            .iter()
            .map(|request| self.capture_line(request))
            .collect()
    }

    /// Build a line from the catalog, capturing name and price at order time
    fn capture_line(&self, request: &LineInput) -> CoreResult<OrderLine> {
        money::validate_quantity(request.quantity)?;
        let item = self.catalog.get_item(&request.item_id).ok_or_else(|| {
            CoreError::InvalidInput(format!("unknown catalog item: {}", request.item_id))
        })?;
        if !item.available {
            return Err(CoreError::InvalidInput(format!(
                "catalog item is unavailable: {}",
                request.item_id
            )));
        }
        money::validate_price(item.price)?;
        Ok(OrderLine {
            item_id: item.id,
            name: item.name,
            unit_price: item.price,
            quantity: request.quantity,
            note: request.note.clone(),
            is_prepared: false,
        })
    }
}
