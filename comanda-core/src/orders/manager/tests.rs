use super::*;
use crate::inventory::MemoryStockStore;
use crate::services::catalog::{CatalogItem, MemoryCatalog, RecipeComponent};
use shared::{FanoutMessage, FanoutPayload, PaymentMethod, Topic};
use tokio::sync::broadcast;

fn catalog_item(id: &str, price: f64, available: bool, flour: f64) -> CatalogItem {
    CatalogItem {
        id: id.to_string(),
        name: format!("Item {}", id),
        price,
        available,
        recipe: if flour > 0.0 {
            vec![RecipeComponent {
                component_id: "flour".into(),
                quantity: flour,
            }]
        } else {
            vec![]
        },
    }
}

fn setup() -> (OrderManager, Arc<MemoryCatalog>, Arc<MemoryStockStore>) {
    let catalog = Arc::new(MemoryCatalog::new());
    catalog.insert(catalog_item("item-a", 1000.0, true, 2.0));
    catalog.insert(catalog_item("item-b", 500.0, true, 1.0));
    catalog.insert(catalog_item("item-off", 800.0, false, 0.0));

    let store = Arc::new(MemoryStockStore::new());
    store.set_component("flour", "Flour", 100.0, 5.0);

    let storage = OrderStorage::open_in_memory().unwrap();
    let manager = OrderManager::new(
        storage,
        catalog.clone(),
        StockLedger::new(store.clone()),
        FanoutEngine::new(64),
    );
    (manager, catalog, store)
}

fn standard_input() -> CreateOrderInput {
    CreateOrderInput {
        room_number: Some(12),
        client_tag: None,
        lines: vec![LineInput::new("item-a", 2), LineInput::new("item-b", 1)],
        tip_amount: Some(300.0),
    }
}

fn advance(manager: &OrderManager, order_id: &str, status: OrderStatus) -> StatusOutcome {
    manager
        .set_status(order_id, StatusChangeInput::to(status))
        .unwrap()
}

fn drain(rx: &mut broadcast::Receiver<FanoutMessage>) -> Vec<FanoutMessage> {
    let mut messages = Vec::new();
    while let Ok(message) = rx.try_recv() {
        messages.push(message);
    }
    messages
}

// ========== Creation ==========

#[test]
fn create_captures_prices_and_computes_total() {
    let (manager, _, _) = setup();

    let outcome = manager.create_order("staff-1", standard_input()).unwrap();
    assert!(!outcome.is_duplicate);

    let order = outcome.order;
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total_amount, 2800.0);
    assert_eq!(order.lines.len(), 2);
    assert_eq!(order.lines[0].unit_price, 1000.0);
    assert_eq!(order.lines[0].name, "Item item-a");
    assert!(order.lines.iter().all(|l| !l.is_prepared));
    assert!(order.paid_at.is_none());
    assert_eq!(order.created_by, "staff-1");
}

#[test]
fn create_requires_an_identifier() {
    let (manager, _, _) = setup();
    let input = CreateOrderInput {
        room_number: None,
        client_tag: Some("   ".into()),
        lines: vec![LineInput::new("item-a", 1)],
        tip_amount: None,
    };
    assert!(matches!(
        manager.create_order("staff-1", input),
        Err(CoreError::InvalidInput(_))
    ));

    // A non-blank tag alone is enough
    let input = CreateOrderInput {
        room_number: None,
        client_tag: Some("terrace 3".into()),
        lines: vec![LineInput::new("item-a", 1)],
        tip_amount: None,
    };
    assert!(manager.create_order("staff-1", input).is_ok());
}

#[test]
fn create_rejects_bad_lines() {
    let (manager, _, _) = setup();

    for (lines, label) in [
        (vec![], "empty"),
        (vec![LineInput::new("nope", 1)], "unknown item"),
        (vec![LineInput::new("item-off", 1)], "unavailable item"),
        (vec![LineInput::new("item-a", 0)], "zero quantity"),
        (vec![LineInput::new("item-a", -2)], "negative quantity"),
    ] {
        let input = CreateOrderInput {
            room_number: Some(1),
            client_tag: None,
            lines,
            tip_amount: None,
        };
        assert!(
            matches!(
                manager.create_order("staff-1", input),
                Err(CoreError::InvalidInput(_))
            ),
            "{} should be rejected",
            label
        );
    }
}

#[test]
fn create_fans_out_to_kitchen_service_and_management() {
    let (manager, _, _) = setup();
    let mut rx = manager.fanout().subscribe();

    let order = manager.create_order("staff-1", standard_input()).unwrap().order;

    let messages = drain(&mut rx);
    let topics: Vec<Topic> = messages.iter().map(|m| m.topic).collect();
    assert_eq!(
        topics,
        vec![Topic::Kitchen, Topic::ServiceStaff, Topic::Management]
    );
    assert!(messages
        .iter()
        .all(|m| m.payload == FanoutPayload::OrderCreated { order: order.clone() }));
}

// ========== Duplicate suppression ==========

#[test]
fn identical_resubmission_within_window_is_suppressed() {
    let (manager, _, _) = setup();

    let first = manager.create_order("staff-1", standard_input()).unwrap();
    // Same lines, different note and order; still a duplicate
    let mut retry = standard_input();
    retry.lines = vec![
        LineInput::new("item-b", 1).with_note("no onion"),
        LineInput::new("item-a", 2),
    ];
    let second = manager.create_order("staff-1", retry).unwrap();

    assert!(second.is_duplicate);
    assert_eq!(second.order.id, first.order.id);
    assert_eq!(manager.orders_for_room(12).unwrap().len(), 1);
}

#[test]
fn different_lines_creator_or_identifier_are_not_duplicates() {
    let (manager, _, _) = setup();
    manager.create_order("staff-1", standard_input()).unwrap();

    let mut other_lines = standard_input();
    other_lines.lines = vec![LineInput::new("item-a", 3), LineInput::new("item-b", 1)];
    assert!(!manager.create_order("staff-1", other_lines).unwrap().is_duplicate);

    assert!(
        !manager
            .create_order("staff-2", standard_input())
            .unwrap()
            .is_duplicate
    );

    let mut other_room = standard_input();
    other_room.room_number = Some(13);
    assert!(!manager.create_order("staff-1", other_room).unwrap().is_duplicate);
}

#[test]
fn resubmission_outside_window_creates_a_new_order() {
    let (manager, catalog, store) = setup();
    let manager = OrderManager::new(
        OrderStorage::open_in_memory().unwrap(),
        catalog,
        StockLedger::new(store),
        manager.fanout().clone(),
    )
    .with_duplicate_window(1);

    let first = manager.create_order("staff-1", standard_input()).unwrap();
    std::thread::sleep(std::time::Duration::from_millis(10));
    let second = manager.create_order("staff-1", standard_input()).unwrap();

    assert!(!second.is_duplicate);
    assert_ne!(second.order.id, first.order.id);
}

// ========== Status transitions ==========

#[test]
fn legal_path_succeeds_and_illegal_jumps_are_rejected() {
    let (manager, _, _) = setup();
    let order = manager.create_order("staff-1", standard_input()).unwrap().order;

    // Jumps from Pending are rejected before the order has moved
    for to in [OrderStatus::Ready, OrderStatus::Served, OrderStatus::Paid] {
        assert!(matches!(
            manager.set_status(&order.id, StatusChangeInput::to(to)),
            Err(CoreError::InvalidTransition {
                from: OrderStatus::Pending,
                ..
            })
        ));
    }

    for to in [
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Served,
        OrderStatus::Paid,
    ] {
        let outcome = advance(&manager, &order.id, to);
        assert_eq!(outcome.order.status, to);
    }

    // Terminal: nothing further is accepted
    for to in OrderStatus::ALL {
        assert!(matches!(
            manager.set_status(&order.id, StatusChangeInput::to(to)),
            Err(CoreError::OrderTerminal(_, OrderStatus::Paid))
        ));
    }
}

#[test]
fn cancel_is_allowed_from_any_non_terminal_status() {
    let (manager, _, _) = setup();

    for steps in 0..4usize {
        // Distinct quantities keep the creations out of the duplicate window
        let mut input = standard_input();
        input.lines = vec![LineInput::new("item-a", steps as i32 + 1)];
        let order = manager.create_order("staff-1", input).unwrap().order;
        let path = [
            OrderStatus::Preparing,
            OrderStatus::Ready,
            OrderStatus::Served,
        ];
        for to in &path[..steps] {
            advance(&manager, &order.id, *to);
        }
        let outcome = advance(&manager, &order.id, OrderStatus::Cancelled);
        assert_eq!(outcome.order.status, OrderStatus::Cancelled);
        assert!(outcome.order.paid_at.is_none());
    }
}

#[test]
fn paying_records_payment_fields_and_paid_at() {
    let (manager, _, _) = setup();
    let order = manager.create_order("staff-1", standard_input()).unwrap().order;
    for to in [OrderStatus::Preparing, OrderStatus::Ready, OrderStatus::Served] {
        advance(&manager, &order.id, to);
    }

    let outcome = manager
        .set_status(
            &order.id,
            StatusChangeInput::to(OrderStatus::Paid)
                .with_payment(PaymentMethod::Card)
                .with_reference("POS-778"),
        )
        .unwrap();

    let paid = outcome.order;
    assert_eq!(paid.payment_method, Some(PaymentMethod::Card));
    assert_eq!(paid.payment_reference.as_deref(), Some("POS-778"));
    assert!(paid.paid_at.is_some());
    // Tip omitted: stored tip and total stand unchanged
    assert_eq!(paid.tip_amount, 300.0);
    assert_eq!(paid.total_amount, 2800.0);
}

#[test]
fn supplied_tip_on_payment_replaces_stored_tip_and_recomputes() {
    let (manager, _, _) = setup();
    let order = manager.create_order("staff-1", standard_input()).unwrap().order;
    for to in [OrderStatus::Preparing, OrderStatus::Ready, OrderStatus::Served] {
        advance(&manager, &order.id, to);
    }

    let outcome = manager
        .set_status(
            &order.id,
            StatusChangeInput::to(OrderStatus::Paid).with_tip(500.0),
        )
        .unwrap();

    assert_eq!(outcome.order.tip_amount, 500.0);
    assert_eq!(outcome.order.total_amount, 3000.0);
}

#[test]
fn charging_to_room_goes_to_front_desk_and_skips_deduction() {
    let (manager, _, store) = setup();
    let order = manager.create_order("staff-1", standard_input()).unwrap().order;
    for to in [OrderStatus::Preparing, OrderStatus::Ready, OrderStatus::Served] {
        advance(&manager, &order.id, to);
    }
    let mut rx = manager.fanout().subscribe();

    let outcome = advance(&manager, &order.id, OrderStatus::ChargedToRoom);
    assert!(outcome.order.paid_at.is_some());
    assert!(outcome.stock_warnings.is_empty());
    // No deduction until the order actually reaches Paid
    assert_eq!(store.quantity("flour"), Some(100.0));

    let messages = drain(&mut rx);
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].topic, Topic::FrontDesk);
    assert!(matches!(
        messages[0].payload,
        FanoutPayload::OrderChargedToRoom { .. }
    ));
}

// ========== Stock deduction ==========

#[test]
fn paying_deducts_stock_once() {
    let (manager, _, store) = setup();
    let order = manager.create_order("staff-1", standard_input()).unwrap().order;
    for to in [OrderStatus::Preparing, OrderStatus::Ready, OrderStatus::Served] {
        advance(&manager, &order.id, to);
    }

    let outcome = advance(&manager, &order.id, OrderStatus::Paid);
    assert!(outcome.stock_warnings.is_empty());
    // item-a: 2 flour x 2 qty, item-b: 1 flour x 1 qty
    assert_eq!(store.quantity("flour"), Some(95.0));

    // Already paid: rejected, no second deduction
    assert!(manager
        .set_status(&order.id, StatusChangeInput::to(OrderStatus::Paid))
        .is_err());
    assert_eq!(store.quantity("flour"), Some(95.0));
}

#[test]
fn low_stock_on_payment_alerts_management() {
    let (manager, _, store) = setup();
    store.set_component("flour", "Flour", 8.0, 5.0);

    let order = manager.create_order("staff-1", standard_input()).unwrap().order;
    for to in [OrderStatus::Preparing, OrderStatus::Ready, OrderStatus::Served] {
        advance(&manager, &order.id, to);
    }
    let mut rx = manager.fanout().subscribe();

    advance(&manager, &order.id, OrderStatus::Paid);

    // 8 - 5 = 3, below threshold 5
    let messages = drain(&mut rx);
    let alert = messages
        .iter()
        .find(|m| matches!(m.payload, FanoutPayload::LowStockAlert { .. }))
        .expect("low-stock alert published");
    assert_eq!(alert.topic, Topic::Management);
    assert_eq!(
        alert.payload,
        FanoutPayload::LowStockAlert {
            component_id: "flour".into(),
            name: "Flour".into(),
            quantity: 3.0,
            threshold: 5.0,
        }
    );
}

// ========== Line edits ==========

#[test]
fn edit_while_ready_reverts_to_preparing_and_marks_matched_lines() {
    let (manager, _, _) = setup();
    let order = manager.create_order("staff-1", standard_input()).unwrap().order;
    advance(&manager, &order.id, OrderStatus::Preparing);
    advance(&manager, &order.id, OrderStatus::Ready);

    let edited = manager
        .replace_lines(
            &order.id,
            vec![
                LineInput::new("item-a", 3),
                LineInput::new("item-b", 1),
                LineInput::new("item-a", 1).with_note("extra plate"),
            ],
        )
        .unwrap();

    assert_eq!(edited.status, OrderStatus::Preparing);
    // 3*1000 + 1*500 + 1*1000 + tip 300
    assert_eq!(edited.total_amount, 4800.0);
    // First two requests matched existing lines; the third item-a had no
    // line left to match and starts unprepared
    assert!(edited.lines[0].is_prepared);
    assert!(edited.lines[1].is_prepared);
    assert!(!edited.lines[2].is_prepared);
    assert_eq!(edited.lines[2].note.as_deref(), Some("extra plate"));
}

#[test]
fn edit_is_rejected_on_terminal_and_missing_orders() {
    let (manager, _, _) = setup();
    let order = manager.create_order("staff-1", standard_input()).unwrap().order;
    advance(&manager, &order.id, OrderStatus::Cancelled);

    assert!(matches!(
        manager.replace_lines(&order.id, vec![LineInput::new("item-a", 1)]),
        Err(CoreError::OrderTerminal(_, OrderStatus::Cancelled))
    ));
    assert!(matches!(
        manager.replace_lines("missing", vec![LineInput::new("item-a", 1)]),
        Err(CoreError::OrderNotFound(_))
    ));
}

// ========== Full service scenario ==========

#[test]
fn full_lifecycle_scenario() {
    let (manager, _, _) = setup();

    let order = manager.create_order("staff-1", standard_input()).unwrap().order;
    assert_eq!(order.total_amount, 2800.0);

    advance(&manager, &order.id, OrderStatus::Preparing);
    advance(&manager, &order.id, OrderStatus::Ready);

    let edited = manager
        .replace_lines(
            &order.id,
            vec![LineInput::new("item-a", 3), LineInput::new("item-b", 1)],
        )
        .unwrap();
    assert_eq!(edited.status, OrderStatus::Preparing);
    assert_eq!(edited.total_amount, 3800.0);
    assert!(edited.lines.iter().all(|l| l.is_prepared));

    advance(&manager, &order.id, OrderStatus::Ready);
    advance(&manager, &order.id, OrderStatus::Served);
    let paid = manager
        .set_status(
            &order.id,
            StatusChangeInput::to(OrderStatus::Paid).with_tip(500.0),
        )
        .unwrap();
    assert_eq!(paid.order.total_amount, 4000.0);
}

// ========== Availability relay and queries ==========

#[test]
fn availability_relay_announces_current_state() {
    let (manager, catalog, _) = setup();
    let mut rx = manager.fanout().subscribe();

    catalog.set_availability("item-a", false).unwrap();
    manager.notify_availability("item-a").unwrap();

    let messages = drain(&mut rx);
    let topics: Vec<Topic> = messages.iter().map(|m| m.topic).collect();
    assert_eq!(topics, vec![Topic::ServiceStaff, Topic::Management]);
    assert_eq!(
        messages[0].payload,
        FanoutPayload::MenuItemAvailability {
            item_id: "item-a".into(),
            name: "Item item-a".into(),
            available: false,
        }
    );

    assert!(matches!(
        manager.notify_availability("missing"),
        Err(CoreError::InvalidInput(_))
    ));
}

#[test]
fn unpaid_orders_exclude_paid_and_cancelled() {
    let (manager, _, _) = setup();

    let paid = manager.create_order("staff-1", standard_input()).unwrap().order;
    for to in [
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Served,
        OrderStatus::Paid,
    ] {
        advance(&manager, &paid.id, to);
    }

    let mut second = standard_input();
    second.lines = vec![LineInput::new("item-b", 2)];
    let cancelled = manager.create_order("staff-1", second).unwrap().order;
    advance(&manager, &cancelled.id, OrderStatus::Cancelled);

    let mut third = standard_input();
    third.lines = vec![LineInput::new("item-a", 1)];
    let charged = manager.create_order("staff-1", third).unwrap().order;
    for to in [
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Served,
        OrderStatus::ChargedToRoom,
    ] {
        advance(&manager, &charged.id, to);
    }

    let unpaid = manager.unpaid_orders_for_room(12).unwrap();
    let ids: Vec<&str> = unpaid.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(ids, vec![charged.id.as_str()]);
}
