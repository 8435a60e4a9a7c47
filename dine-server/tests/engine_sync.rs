//! End-to-end engine behavior over the public state
//!
//! Exercises the seeded demo dataset: tables 1-5 and the four-item menu
//! (Margherita Pizza 350, Caesar Salad 250, Chocolate Lava Cake 180,
//! Coca-Cola 80).

use std::collections::HashSet;

use dine_server::{ChannelConnection, Config, ErrorCode, ServerState};
use rust_decimal::Decimal;
use shared::message::{BusMessage, EventName, EventPayload, EventType};
use shared::models::{CartLine, ItemStatus, OrderStatus, TableStatus};
use tokio::sync::mpsc;

fn scratch_state() -> (ServerState, tempfile::TempDir) {
    let dir = tempfile::TempDir::new().expect("temp dir");
    let config = Config::with_overrides(dir.path().to_string_lossy().to_string(), 0, 0);
    let state = ServerState::initialize(&config).expect("initialize state");
    (state, dir)
}

fn attach_session(state: &ServerState, id: &str) -> mpsc::UnboundedReceiver<BusMessage> {
    let (conn, rx) = ChannelConnection::new(id);
    state.sessions().register(conn);
    rx
}

fn line(item_id: i64, quantity: u32) -> CartLine {
    CartLine {
        item_id,
        quantity,
        note: None,
    }
}

fn drain_events(rx: &mut mpsc::UnboundedReceiver<BusMessage>) -> Vec<EventName> {
    let mut events = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        assert_eq!(msg.event_type, EventType::Event);
        events.push(msg.parse_payload::<EventPayload>().unwrap().event);
    }
    events
}

#[tokio::test]
async fn test_cart_scenario_totals_880() {
    let (state, _dir) = scratch_state();

    // Table number 4, pizza x2 + lava cake x1
    let table = state
        .store()
        .list_tables()
        .unwrap()
        .into_iter()
        .find(|t| t.number == 4)
        .unwrap();
    let order = state
        .orders()
        .place(table.id, &[line(1, 2), line(3, 1)])
        .await
        .unwrap();

    assert_eq!(order.total_price, Decimal::new(880, 0));
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.items.len(), 2);
    assert!(order.items.iter().all(|i| i.status == ItemStatus::Pending));
}

#[tokio::test]
async fn test_total_price_immutable_under_item_mutations() {
    let (state, _dir) = scratch_state();
    let order = state.orders().place(1, &[line(1, 2)]).await.unwrap();

    for item in &order.items {
        state
            .orders()
            .update_item_status(order.id, item.id, ItemStatus::Ready, None)
            .await
            .unwrap();
    }

    let reloaded = state.orders().get(order.id).unwrap();
    assert_eq!(reloaded.total_price, Decimal::new(700, 0));
    // All-ready items move neither the order nor the table
    assert_eq!(reloaded.status, OrderStatus::Pending);
    assert_eq!(
        state.store().get_table(1).unwrap().unwrap().status,
        TableStatus::Free
    );
}

#[tokio::test]
async fn test_exactly_one_broadcast_per_mutation() {
    let (state, _dir) = scratch_state();
    let mut rx = attach_session(&state, "observer");

    let order = state.orders().place(2, &[line(2, 1)]).await.unwrap();
    state
        .orders()
        .update_status(order.id, OrderStatus::Confirmed, None)
        .await
        .unwrap();
    state
        .orders()
        .update_item_status(order.id, order.items[0].id, ItemStatus::InProgress, None)
        .await
        .unwrap();
    state
        .tables()
        .update_status(2, TableStatus::Occupied, None)
        .await
        .unwrap();
    state.orders().delete(order.id).await.unwrap();

    assert_eq!(
        drain_events(&mut rx),
        vec![
            EventName::NewOrder,
            EventName::OrderStatusUpdated,
            EventName::OrderItemStatusUpdated,
            EventName::TableStatusUpdated,
            EventName::OrderDeleted,
        ]
    );
}

#[tokio::test]
async fn test_failed_mutations_broadcast_nothing() {
    let (state, _dir) = scratch_state();
    let mut rx = attach_session(&state, "observer");

    let err = state
        .tables()
        .update_status(99, TableStatus::Billed, None)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::TableNotFound);

    let err = state.orders().place(1, &[line(999, 1)]).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidReference);

    let order = state.orders().place(1, &[line(1, 1)]).await.unwrap();
    let _ = drain_events(&mut rx);
    let err = state
        .orders()
        .update_status(order.id, OrderStatus::Completed, None)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidTransition);

    assert!(drain_events(&mut rx).is_empty());
}

#[tokio::test]
async fn test_stale_version_conflicts_without_broadcast() {
    let (state, _dir) = scratch_state();

    state
        .tables()
        .update_status(3, TableStatus::Occupied, Some(0))
        .await
        .unwrap();

    let mut rx = attach_session(&state, "observer");
    let err = state
        .tables()
        .update_status(3, TableStatus::Billed, Some(0))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::VersionConflict);
    assert!(drain_events(&mut rx).is_empty());

    // Correct version proceeds
    state
        .tables()
        .update_status(3, TableStatus::Billed, Some(1))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_concurrent_placements_get_disjoint_ids() {
    let (state, _dir) = scratch_state();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let state = state.clone();
        handles.push(tokio::spawn(async move {
            state.orders().place(5, &[line(4, 1), line(2, 1)]).await
        }));
    }

    let mut order_ids = HashSet::new();
    let mut item_ids = HashSet::new();
    for handle in handles {
        let order = handle.await.unwrap().unwrap();
        assert!(order_ids.insert(order.id), "duplicate order id");
        for item in &order.items {
            assert!(item_ids.insert(item.id), "duplicate item id");
        }
    }
    assert_eq!(order_ids.len(), 8);
    assert_eq!(item_ids.len(), 16);
}

#[tokio::test]
async fn test_unknown_table_status_string_rejected() {
    let err = "zombied".parse::<TableStatus>().unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidStatus);
}
