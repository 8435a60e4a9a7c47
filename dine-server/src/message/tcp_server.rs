//! TCP session server
//!
//! Accepts plain TCP connections, registers each as a session, and pumps
//! its request frames into the inbound channel. The write direction runs
//! through the [`SessionRegistry`], so broadcasts and correlated responses
//! share one code path with in-process sessions.

use std::net::SocketAddr;
use std::sync::Arc;

use shared::error::{AppError, AppResult, ErrorCode};
use shared::message::{BusMessage, EventType, ResponsePayload, PROTOCOL_VERSION};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::registry::{Connection, SessionRegistry};
use super::transport::{read_frame, TcpConnection};

/// Run the session server until the token is cancelled
pub async fn run(
    listen_addr: &str,
    sessions: Arc<SessionRegistry>,
    inbound_tx: mpsc::UnboundedSender<BusMessage>,
    shutdown_token: CancellationToken,
) -> AppResult<()> {
    let listener = bind(listen_addr).await?;
    serve(listener, sessions, inbound_tx, shutdown_token).await
}

/// Bind the session listener
///
/// Split from [`serve`] so callers binding port 0 can read the assigned
/// address back from the listener.
pub async fn bind(listen_addr: &str) -> AppResult<TcpListener> {
    TcpListener::bind(listen_addr)
        .await
        .map_err(|e| AppError::internal(format!("failed to bind {}: {}", listen_addr, e)))
}

/// Accept sessions on an already-bound listener until the token is cancelled
pub async fn serve(
    listener: TcpListener,
    sessions: Arc<SessionRegistry>,
    inbound_tx: mpsc::UnboundedSender<BusMessage>,
    shutdown_token: CancellationToken,
) -> AppResult<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("message channel listening on {}", addr);
    }

    loop {
        tokio::select! {
            _ = shutdown_token.cancelled() => {
                tracing::info!("message channel shutting down");
                break;
            }

            result = listener.accept() => {
                match result {
                    Ok((stream, addr)) => {
                        tracing::debug!("session connected: {}", addr);
                        spawn_session(
                            stream,
                            addr,
                            sessions.clone(),
                            inbound_tx.clone(),
                            shutdown_token.clone(),
                        );
                    }
                    Err(e) => {
                        tracing::error!("failed to accept connection: {}", e);
                    }
                }
            }
        }
    }

    Ok(())
}

fn spawn_session(
    stream: TcpStream,
    addr: SocketAddr,
    sessions: Arc<SessionRegistry>,
    inbound_tx: mpsc::UnboundedSender<BusMessage>,
    shutdown_token: CancellationToken,
) {
    tokio::spawn(async move {
        if let Err(e) = handle_session(stream, addr, sessions, inbound_tx, shutdown_token).await {
            tracing::debug!("session {} finished: {}", addr, e);
        }
    });
}

async fn handle_session(
    stream: TcpStream,
    addr: SocketAddr,
    sessions: Arc<SessionRegistry>,
    inbound_tx: mpsc::UnboundedSender<BusMessage>,
    shutdown_token: CancellationToken,
) -> AppResult<()> {
    let peer_addr = stream.peer_addr().ok().map(|a| a.to_string());
    let (mut reader, writer) = stream.into_split();
    let conn = TcpConnection::new(writer, peer_addr);
    let session_id = conn.id().to_string();

    sessions.register(conn.clone());

    // Greeting tells the client its session id and the frame version
    let greeting = BusMessage::response(&ResponsePayload::success(
        format!("connected as session {}", session_id),
        Some(serde_json::json!({
            "session_id": session_id,
            "protocol_version": PROTOCOL_VERSION,
        })),
    ));
    if let Err(e) = conn.send(&greeting).await {
        tracing::warn!(session_id = %session_id, "failed to send greeting: {}", e);
    }

    loop {
        tokio::select! {
            _ = shutdown_token.cancelled() => {
                break;
            }

            read_result = read_frame(&mut reader) => {
                match read_result {
                    Ok(mut msg) => {
                        if msg.event_type != EventType::Request {
                            tracing::warn!(
                                session_id = %session_id,
                                event_type = %msg.event_type,
                                "dropping non-request frame from client"
                            );
                            continue;
                        }
                        // Source tracking: responses route back by this id
                        msg.source = Some(session_id.clone());
                        if inbound_tx.send(msg).is_err() {
                            tracing::warn!("inbound channel closed, dropping session");
                            break;
                        }
                    }
                    Err(e) => {
                        if e.code == ErrorCode::ClientDisconnected {
                            tracing::debug!(session_id = %session_id, "session {} disconnected", addr);
                        } else {
                            tracing::debug!(session_id = %session_id, "session {} read error: {}", addr, e);
                        }
                        break;
                    }
                }
            }
        }
    }

    let _ = conn.close().await;
    sessions.unregister(&session_id);

    Ok(())
}
