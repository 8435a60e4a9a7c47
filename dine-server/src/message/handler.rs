//! Server-side message handler
//!
//! Drains the inbound channel, dispatches each request to the matching
//! lifecycle operation, and sends a correlated response back to the source
//! session. A failed operation answers with an error response carrying the
//! domain error code; it never goes unanswered.

use std::sync::Arc;

use shared::error::{AppError, AppResult};
use shared::message::{
    actions, BusMessage, EventType, JoinTableParams, PlaceOrderParams, RequestPayload,
    ResponsePayload, UpdateItemStatusParams,
};
use shared::models::ItemStatus;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::registry::SessionRegistry;
use crate::orders::OrderLifecycle;
use crate::tables::TableLifecycle;

pub struct MessageHandler {
    receiver: mpsc::UnboundedReceiver<BusMessage>,
    sessions: Arc<SessionRegistry>,
    orders: Arc<OrderLifecycle>,
    tables: Arc<TableLifecycle>,
    shutdown_token: CancellationToken,
}

impl MessageHandler {
    pub fn new(
        receiver: mpsc::UnboundedReceiver<BusMessage>,
        sessions: Arc<SessionRegistry>,
        orders: Arc<OrderLifecycle>,
        tables: Arc<TableLifecycle>,
        shutdown_token: CancellationToken,
    ) -> Self {
        Self {
            receiver,
            sessions,
            orders,
            tables,
            shutdown_token,
        }
    }

    /// Long-running dispatch loop; spawn in the background
    pub async fn run(mut self) {
        tracing::info!("message handler started");

        loop {
            tokio::select! {
                _ = self.shutdown_token.cancelled() => {
                    tracing::info!("message handler shutting down");
                    break;
                }

                msg = self.receiver.recv() => {
                    match msg {
                        Some(msg) => self.handle_message(msg).await,
                        None => {
                            tracing::info!("inbound channel closed");
                            break;
                        }
                    }
                }
            }
        }

        tracing::info!("message handler stopped");
    }

    async fn handle_message(&self, msg: BusMessage) {
        if msg.event_type != EventType::Request {
            tracing::warn!(event_type = %msg.event_type, "dropping non-request message");
            return;
        }
        let source = match msg.source.as_deref() {
            Some(source) => source,
            None => {
                tracing::warn!("dropping request without source session");
                return;
            }
        };

        let payload = match self.dispatch(&msg).await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(source = %source, error = %e, code = ?e.code, "request failed");
                ResponsePayload::error(&e)
            }
        };

        let response = BusMessage::response(&payload).with_correlation_id(msg.request_id);
        if !self.sessions.send_to(source, &response).await {
            tracing::warn!(source = %source, "response undeliverable");
        }
    }

    async fn dispatch(&self, msg: &BusMessage) -> AppResult<ResponsePayload> {
        let request: RequestPayload = msg
            .parse_payload()
            .map_err(|e| AppError::invalid_request(format!("malformed request payload: {}", e)))?;
        // Presence already checked in handle_message
        let source = msg.source.as_deref().unwrap_or_default();

        match request.action.as_str() {
            actions::JOIN_TABLE => {
                let params: JoinTableParams = parse_params(request.params)?;
                let table = self.tables.get(params.table_id)?;
                self.sessions.join_table(source, table.id);
                Ok(ResponsePayload::success(
                    format!("joined table {}", table.number),
                    Some(serde_json::to_value(&table).map_err(internal)?),
                ))
            }

            actions::PLACE_ORDER => {
                let params: PlaceOrderParams = parse_params(request.params)?;
                let order = self.orders.place(params.table_id, &params.cart).await?;
                Ok(ResponsePayload::success(
                    format!("order {} placed", order.id),
                    Some(serde_json::to_value(&order).map_err(internal)?),
                ))
            }

            actions::UPDATE_ITEM_STATUS => {
                let params: UpdateItemStatusParams = parse_params(request.params)?;
                let status: ItemStatus = params.status.parse()?;
                let item = self
                    .orders
                    .update_item_status(
                        params.order_id,
                        params.item_id,
                        status,
                        params.expected_version,
                    )
                    .await?;
                Ok(ResponsePayload::success(
                    format!("item {} now {}", item.id, item.status),
                    Some(serde_json::to_value(&item).map_err(internal)?),
                ))
            }

            other => Err(AppError::invalid_request(format!(
                "unknown action: {}",
                other
            ))),
        }
    }
}

fn parse_params<T: serde::de::DeserializeOwned>(params: Option<serde_json::Value>) -> AppResult<T> {
    let value = params.unwrap_or(serde_json::Value::Null);
    serde_json::from_value(value)
        .map_err(|e| AppError::invalid_request(format!("invalid params: {}", e)))
}

fn internal(e: serde_json::Error) -> AppError {
    AppError::internal(format!("response serialization failed: {}", e))
}
