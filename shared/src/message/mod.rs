//! Message-channel types
//!
//! These types are shared between the server and its clients, for both
//! in-process (memory) and network (TCP) communication.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use uuid::Uuid;

pub mod payload;
pub use payload::*;

/// Frame-format version, reported to clients in the connection greeting
pub const PROTOCOL_VERSION: u16 = 1;

/// Message-channel event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// Client request (one core operation per message)
    Request = 0,
    /// Correlated response to a request
    Response = 1,
    /// Server-published state-change event
    Event = 2,
}

impl TryFrom<u8> for EventType {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(EventType::Request),
            1 => Ok(EventType::Response),
            2 => Ok(EventType::Event),
            _ => Err(()),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventType::Request => write!(f, "request"),
            EventType::Response => write!(f, "response"),
            EventType::Event => write!(f, "event"),
        }
    }
}

/// Message-channel frame body
///
/// `source` is filled in by the transport with the originating connection
/// id; `correlation_id` links a [`EventType::Response`] to its request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusMessage {
    pub request_id: Uuid,
    pub event_type: EventType,
    pub source: Option<String>,
    pub correlation_id: Option<Uuid>,
    pub payload: Vec<u8>,
}

impl BusMessage {
    pub fn new(event_type: EventType, payload: Vec<u8>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            event_type,
            source: None,
            correlation_id: None,
            payload,
        }
    }

    /// Set the originating connection id
    pub fn with_source(mut self, source: &str) -> Self {
        self.source = Some(source.to_string());
        self
    }

    /// Set the correlation id (links a response to its request)
    pub fn with_correlation_id(mut self, id: Uuid) -> Self {
        self.correlation_id = Some(id);
        self
    }

    /// Create a request message
    pub fn request(payload: &RequestPayload) -> Self {
        Self::new(
            EventType::Request,
            serde_json::to_vec(payload).expect("Failed to serialize request payload"),
        )
    }

    /// Create a response message
    pub fn response(payload: &ResponsePayload) -> Self {
        Self::new(
            EventType::Response,
            serde_json::to_vec(payload).expect("Failed to serialize response payload"),
        )
    }

    /// Create a broadcast event message
    pub fn event(payload: &EventPayload) -> Self {
        Self::new(
            EventType::Event,
            serde_json::to_vec(payload).expect("Failed to serialize event payload"),
        )
    }

    /// Parse the payload as the given type
    pub fn parse_payload<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CartLine;

    #[test]
    fn test_event_type_roundtrip() {
        for t in [EventType::Request, EventType::Response, EventType::Event] {
            assert_eq!(EventType::try_from(t as u8), Ok(t));
        }
        assert!(EventType::try_from(9).is_err());
    }

    #[test]
    fn test_request_message() {
        let payload = RequestPayload::place_order(PlaceOrderParams {
            table_id: 4,
            cart: vec![CartLine {
                item_id: 1,
                quantity: 2,
                note: None,
            }],
        });
        let msg = BusMessage::request(&payload);
        assert_eq!(msg.event_type, EventType::Request);
        assert!(!msg.request_id.is_nil());

        let parsed: RequestPayload = msg.parse_payload().unwrap();
        assert_eq!(parsed.action, actions::PLACE_ORDER);
    }

    #[test]
    fn test_response_correlation() {
        let req = BusMessage::request(&RequestPayload::join_table(7));
        let resp = BusMessage::response(&ResponsePayload::success("joined", None))
            .with_correlation_id(req.request_id);
        assert_eq!(resp.correlation_id, Some(req.request_id));
    }

    #[test]
    fn test_event_payload_wire_names() {
        let payload = EventPayload::new(EventName::NewOrder, serde_json::json!({"id": 1}));
        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("\"newOrder\""));
    }
}
