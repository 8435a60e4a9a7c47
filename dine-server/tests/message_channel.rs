//! Message-channel dispatch: correlated responses and event fan-out

use dine_server::{ChannelConnection, Config, ErrorCode, ServerState};
use shared::message::{
    BusMessage, EventPayload, EventType, PlaceOrderParams, RequestPayload, ResponsePayload,
    UpdateItemStatusParams,
};
use shared::models::CartLine;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

struct Client {
    state: ServerState,
    id: String,
    rx: mpsc::UnboundedReceiver<BusMessage>,
}

impl Client {
    fn connect(state: &ServerState, id: &str) -> Self {
        let (conn, rx) = ChannelConnection::new(id);
        state.sessions().register(conn);
        Self {
            state: state.clone(),
            id: id.to_string(),
            rx,
        }
    }

    fn send(&self, request: &RequestPayload) -> uuid::Uuid {
        let msg = BusMessage::request(request).with_source(&self.id);
        let request_id = msg.request_id;
        self.state.inbound_sender().send(msg).unwrap();
        request_id
    }

    async fn recv(&mut self) -> BusMessage {
        timeout(Duration::from_secs(2), self.rx.recv())
            .await
            .expect("timed out waiting for message")
            .expect("channel closed")
    }

    /// Receive until the correlated response arrives, returning it plus any
    /// events seen on the way
    async fn recv_response(&mut self, request_id: uuid::Uuid) -> (ResponsePayload, Vec<BusMessage>) {
        let mut events = Vec::new();
        loop {
            let msg = self.recv().await;
            match msg.event_type {
                EventType::Response => {
                    assert_eq!(msg.correlation_id, Some(request_id));
                    return (msg.parse_payload().unwrap(), events);
                }
                EventType::Event => events.push(msg),
                EventType::Request => panic!("server sent a request"),
            }
        }
    }
}

async fn scratch_engine() -> (ServerState, tempfile::TempDir) {
    let dir = tempfile::TempDir::new().expect("temp dir");
    // Port 0: OS-assigned, so parallel tests never collide
    let config = Config::with_overrides(dir.path().to_string_lossy().to_string(), 0, 0);
    let state = ServerState::initialize(&config).expect("initialize state");
    state.start_background_tasks().await;
    (state, dir)
}

fn place_order_request(table_id: i64, cart: Vec<CartLine>) -> RequestPayload {
    RequestPayload::place_order(PlaceOrderParams { table_id, cart })
}

fn line(item_id: i64, quantity: u32) -> CartLine {
    CartLine {
        item_id,
        quantity,
        note: None,
    }
}

#[tokio::test]
async fn test_join_table_success_and_not_found() {
    let (state, _dir) = scratch_engine().await;
    let mut client = Client::connect(&state, "terminal-1");

    let request_id = client.send(&RequestPayload::join_table(2));
    let (response, _) = client.recv_response(request_id).await;
    assert!(response.success);
    assert_eq!(state.sessions().watched_table("terminal-1"), Some(2));

    let request_id = client.send(&RequestPayload::join_table(99));
    let (response, _) = client.recv_response(request_id).await;
    assert!(!response.success);
    assert_eq!(
        response.error_code,
        Some(ErrorCode::TableNotFound.code())
    );
    // Failed join leaves the previous membership in place
    assert_eq!(state.sessions().watched_table("terminal-1"), Some(2));
}

#[tokio::test]
async fn test_place_order_responds_and_broadcasts() {
    let (state, _dir) = scratch_engine().await;
    let mut client = Client::connect(&state, "terminal-1");

    let request_id = client.send(&place_order_request(4, vec![line(1, 2), line(3, 1)]));
    let (response, events) = client.recv_response(request_id).await;

    assert!(response.success, "{}", response.message);
    let order = response.data.unwrap();
    assert_eq!(order["total_price"], "880");
    assert_eq!(order["status"], "pending");

    // The newOrder event reaches the requesting session too, ahead of the
    // correlated response
    assert_eq!(events.len(), 1);
    let payload: EventPayload = events[0].parse_payload().unwrap();
    assert_eq!(payload.event.to_string(), "newOrder");
}

#[tokio::test]
async fn test_item_status_errors_are_reported_to_caller() {
    let (state, _dir) = scratch_engine().await;
    let mut client = Client::connect(&state, "kitchen-1");

    let request_id = client.send(&place_order_request(1, vec![line(2, 1)]));
    let (response, _) = client.recv_response(request_id).await;
    let order = response.data.unwrap();
    let order_id = order["id"].as_i64().unwrap();
    let item_id = order["items"][0]["id"].as_i64().unwrap();

    // Unknown status string
    let request_id = client.send(&RequestPayload::update_item_status(UpdateItemStatusParams {
        order_id,
        item_id,
        status: "burnt".into(),
        expected_version: None,
    }));
    let (response, events) = client.recv_response(request_id).await;
    assert!(!response.success);
    assert_eq!(response.error_code, Some(ErrorCode::InvalidStatus.code()));
    assert!(events.is_empty());

    // Forward skip succeeds
    let request_id = client.send(&RequestPayload::update_item_status(UpdateItemStatusParams {
        order_id,
        item_id,
        status: "ready".into(),
        expected_version: None,
    }));
    let (response, _) = client.recv_response(request_id).await;
    assert!(response.success);

    // Backward move is an invalid transition, and no event leaks out
    let request_id = client.send(&RequestPayload::update_item_status(UpdateItemStatusParams {
        order_id,
        item_id,
        status: "in-progress".into(),
        expected_version: None,
    }));
    let (response, events) = client.recv_response(request_id).await;
    assert!(!response.success);
    assert_eq!(
        response.error_code,
        Some(ErrorCode::InvalidTransition.code())
    );
    assert!(events.is_empty());
}

#[tokio::test]
async fn test_unknown_action_rejected() {
    let (state, _dir) = scratch_engine().await;
    let mut client = Client::connect(&state, "terminal-1");

    let request_id = client.send(&RequestPayload::new("table.explode", None));
    let (response, _) = client.recv_response(request_id).await;
    assert!(!response.success);
    assert_eq!(
        response.error_code,
        Some(ErrorCode::InvalidRequest.code())
    );
}

#[tokio::test]
async fn test_events_reach_every_session() {
    let (state, _dir) = scratch_engine().await;
    let mut customer = Client::connect(&state, "terminal-1");
    let mut kitchen = Client::connect(&state, "kitchen-1");

    let request_id = customer.send(&place_order_request(2, vec![line(4, 3)]));
    let (response, _) = customer.recv_response(request_id).await;
    assert!(response.success);

    // The kitchen never asked for anything but still gets the event
    let msg = kitchen.recv().await;
    assert_eq!(msg.event_type, EventType::Event);
    let payload: EventPayload = msg.parse_payload().unwrap();
    assert_eq!(payload.event.to_string(), "newOrder");
}
