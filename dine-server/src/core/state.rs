use std::sync::Arc;

use shared::error::{AppError, AppResult};
use shared::message::BusMessage;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::core::Config;
use crate::message::{EventBroadcaster, MessageHandler, SessionRegistry};
use crate::orders::OrderLifecycle;
use crate::store::StateStore;
use crate::tables::TableLifecycle;

/// Shared server state
///
/// Holds every service behind an `Arc`, so handlers clone it cheaply.
///
/// | Field | Purpose |
/// |-------|---------|
/// | `config` | Immutable configuration |
/// | `store` | redb state store |
/// | `sessions` | Live session registry + rooms |
/// | `broadcaster` | Event fan-out |
/// | `orders` / `tables` | Lifecycle services |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    store: Arc<StateStore>,
    sessions: Arc<SessionRegistry>,
    broadcaster: Arc<EventBroadcaster>,
    orders: Arc<OrderLifecycle>,
    tables: Arc<TableLifecycle>,
    /// Inbound request channel feeding the message handler
    inbound_tx: mpsc::UnboundedSender<BusMessage>,
    /// Receiver parked here until `start_background_tasks` claims it
    inbound_rx: Arc<Mutex<Option<mpsc::UnboundedReceiver<BusMessage>>>>,
    shutdown_token: CancellationToken,
}

impl ServerState {
    /// Initialize all services
    ///
    /// Opens (or creates) the database under `work_dir` and seeds the demo
    /// dataset when the store is empty and seeding is enabled.
    pub fn initialize(config: &Config) -> AppResult<Self> {
        config
            .ensure_work_dir()
            .map_err(|e| AppError::internal(format!("failed to create work dir: {}", e)))?;

        let store = Arc::new(StateStore::open(config.db_path())?);
        if config.seed_demo_data && store.is_empty()? {
            store.seed_demo_data()?;
        }

        let sessions = Arc::new(SessionRegistry::new());
        let broadcaster = Arc::new(EventBroadcaster::new(
            sessions.clone(),
            config.channel_capacity,
        ));
        let orders = Arc::new(OrderLifecycle::new(store.clone(), broadcaster.clone()));
        let tables = Arc::new(TableLifecycle::new(store.clone(), broadcaster.clone()));
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        Ok(Self {
            config: config.clone(),
            store,
            sessions,
            broadcaster,
            orders,
            tables,
            inbound_tx,
            inbound_rx: Arc::new(Mutex::new(Some(inbound_rx))),
            shutdown_token: CancellationToken::new(),
        })
    }

    /// Spawn the message handler and the TCP session server
    ///
    /// Call once, before serving HTTP. A second call finds the receiver
    /// already claimed and only logs.
    pub async fn start_background_tasks(&self) {
        let receiver = self.inbound_rx.lock().await.take();
        let receiver = match receiver {
            Some(rx) => rx,
            None => {
                tracing::warn!("background tasks already started");
                return;
            }
        };

        let handler = MessageHandler::new(
            receiver,
            self.sessions.clone(),
            self.orders.clone(),
            self.tables.clone(),
            self.shutdown_token.clone(),
        );
        tokio::spawn(handler.run());

        let listen_addr = format!("0.0.0.0:{}", self.config.message_tcp_port);
        let sessions = self.sessions.clone();
        let inbound_tx = self.inbound_tx.clone();
        let shutdown_token = self.shutdown_token.clone();
        tokio::spawn(async move {
            if let Err(e) =
                crate::message::tcp_server::run(&listen_addr, sessions, inbound_tx, shutdown_token)
                    .await
            {
                tracing::error!("message channel server failed: {}", e);
            }
        });
    }

    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    pub fn broadcaster(&self) -> &Arc<EventBroadcaster> {
        &self.broadcaster
    }

    pub fn orders(&self) -> &Arc<OrderLifecycle> {
        &self.orders
    }

    pub fn tables(&self) -> &Arc<TableLifecycle> {
        &self.tables
    }

    /// Sender feeding the message handler; in-process clients push parsed
    /// request frames here with their session id as `source`
    pub fn inbound_sender(&self) -> mpsc::UnboundedSender<BusMessage> {
        self.inbound_tx.clone()
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown_token
    }

    /// Cancel all background tasks
    pub fn shutdown(&self) {
        tracing::info!("shutting down server state");
        self.shutdown_token.cancel();
        self.broadcaster.shutdown();
    }
}
