//! HTTP server startup and graceful shutdown

use shared::error::{AppError, AppResult};

use crate::api;
use crate::core::{Config, ServerState};

pub struct Server {
    config: Config,
    state: Option<ServerState>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Create a server around existing state (tests, embedding)
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    /// Run until ctrl-c
    pub async fn run(&self) -> AppResult<()> {
        let state = match &self.state {
            Some(s) => s.clone(),
            None => ServerState::initialize(&self.config)?,
        };

        state.start_background_tasks().await;

        let app = api::build_app(state.clone());
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        tracing::info!("QuickDine engine listening on {}", addr);
        tracing::info!(
            "message channel on tcp://0.0.0.0:{}",
            self.config.message_tcp_port
        );

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| AppError::internal(format!("failed to bind {}: {}", addr, e)))?;

        let shutdown_state = state.clone();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("shutting down...");
                shutdown_state.shutdown();
            })
            .await
            .map_err(|e| AppError::internal(format!("server error: {}", e)))?;

        Ok(())
    }
}
