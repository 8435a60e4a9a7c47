//! Binary frame codec and the TCP-backed session connection
//!
//! # Frame layout
//!
//! ```text
//! [ type: 1 ][ request_id: 16 ][ correlation_id: 16 ][ len: 4 LE ][ payload: len ]
//! ```
//!
//! A nil correlation uuid on the wire means "none". The payload is JSON.

use std::sync::Arc;

use async_trait::async_trait;
use shared::error::{AppError, AppResult};
use shared::message::{BusMessage, EventType};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::registry::Connection;

/// Upper bound on a single frame payload; anything larger is a protocol
/// violation, not a legitimate request.
pub const MAX_PAYLOAD_LEN: usize = 1024 * 1024;

/// Map a read failure; EOF anywhere in a frame is a normal disconnect
fn read_err(context: &str, e: std::io::Error) -> AppError {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        AppError::client_disconnected()
    } else {
        AppError::internal(format!("{} failed: {}", context, e))
    }
}

/// Read one frame from an async stream
pub async fn read_frame<R: AsyncReadExt + Unpin>(reader: &mut R) -> AppResult<BusMessage> {
    let mut type_buf = [0u8; 1];
    reader
        .read_exact(&mut type_buf)
        .await
        .map_err(|e| read_err("read frame type", e))?;
    let event_type = EventType::try_from(type_buf[0])
        .map_err(|_| AppError::invalid_request(format!("unknown frame type {}", type_buf[0])))?;

    let mut uuid_buf = [0u8; 16];
    reader
        .read_exact(&mut uuid_buf)
        .await
        .map_err(|e| read_err("read request id", e))?;
    let request_id = Uuid::from_bytes(uuid_buf);

    let mut correlation_buf = [0u8; 16];
    reader
        .read_exact(&mut correlation_buf)
        .await
        .map_err(|e| read_err("read correlation id", e))?;
    let correlation_raw = Uuid::from_bytes(correlation_buf);
    let correlation_id = if correlation_raw.is_nil() {
        None
    } else {
        Some(correlation_raw)
    };

    let mut len_buf = [0u8; 4];
    reader
        .read_exact(&mut len_buf)
        .await
        .map_err(|e| read_err("read frame length", e))?;
    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_PAYLOAD_LEN {
        return Err(AppError::invalid_request(format!(
            "frame payload of {} bytes exceeds limit",
            len
        )));
    }

    let mut payload = vec![0u8; len];
    reader
        .read_exact(&mut payload)
        .await
        .map_err(|e| read_err("read frame payload", e))?;

    Ok(BusMessage {
        request_id,
        event_type,
        source: None,
        correlation_id,
        payload,
    })
}

/// Write one frame to an async stream
pub async fn write_frame<W: AsyncWriteExt + Unpin>(
    writer: &mut W,
    msg: &BusMessage,
) -> AppResult<()> {
    let mut data = Vec::with_capacity(1 + 16 + 16 + 4 + msg.payload.len());
    data.push(msg.event_type as u8);
    data.extend_from_slice(msg.request_id.as_bytes());
    data.extend_from_slice(msg.correlation_id.unwrap_or_else(Uuid::nil).as_bytes());
    data.extend_from_slice(&(msg.payload.len() as u32).to_le_bytes());
    data.extend_from_slice(&msg.payload);

    writer
        .write_all(&data)
        .await
        .map_err(|e| AppError::internal(format!("write frame failed: {}", e)))?;
    Ok(())
}

/// Session backed by the write half of a TCP stream
///
/// The read half stays with the per-connection read loop in
/// [`super::tcp_server`]; the registry only ever writes.
#[derive(Debug)]
pub struct TcpConnection {
    id: String,
    writer: Mutex<OwnedWriteHalf>,
    addr: Option<String>,
}

impl TcpConnection {
    pub fn new(writer: OwnedWriteHalf, addr: Option<String>) -> Arc<Self> {
        Arc::new(Self {
            id: Uuid::new_v4().to_string(),
            writer: Mutex::new(writer),
            addr,
        })
    }
}

#[async_trait]
impl Connection for TcpConnection {
    fn id(&self) -> &str {
        &self.id
    }

    async fn send(&self, msg: &BusMessage) -> AppResult<()> {
        let mut writer = self.writer.lock().await;
        write_frame(&mut *writer, msg).await
    }

    async fn close(&self) -> AppResult<()> {
        let mut writer = self.writer.lock().await;
        writer
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("TCP close failed: {}", e)))?;
        Ok(())
    }

    fn peer_addr(&self) -> Option<String> {
        self.addr.clone()
    }
}
