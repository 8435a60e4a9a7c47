//! Core module: configuration, state, HTTP server
//!
//! - [`Config`] — environment-driven configuration
//! - [`ServerState`] — shared services behind `Arc`s
//! - [`Server`] — HTTP server with graceful shutdown

pub mod config;
pub mod server;
pub mod state;

pub use config::Config;
pub use server::Server;
pub use state::ServerState;

/// Load `.env` and initialize logging
pub fn setup_environment() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenv::dotenv();
    crate::utils::logger::init_logger();
    Ok(())
}
