//! QuickDine Engine - real-time restaurant order and table synchronization
//!
//! Single-restaurant, single-instance server keeping customer terminals,
//! kitchen displays, and admin dashboards consistent. Mutations flow
//! through the HTTP API or the TCP message channel; every successful
//! mutation commits to the embedded store and then broadcasts exactly one
//! event to all connected sessions.
//!
//! # Module structure
//!
//! ```text
//! dine-server/src/
//! ├── core/      # configuration, shared state, HTTP server
//! ├── store/     # redb state store (tables, menu, orders)
//! ├── orders.rs  # order lifecycle (transitions + broadcasts)
//! ├── tables.rs  # table lifecycle
//! ├── message/   # session registry, broadcaster, handler, TCP transport
//! ├── api/       # axum routes and handlers
//! ├── auth.rs    # bearer-token guard for privileged routes
//! └── utils/     # logging
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod message;
pub mod orders;
pub mod store;
pub mod tables;
pub mod utils;

pub use crate::core::{setup_environment, Config, Server, ServerState};
pub use message::{ChannelConnection, Connection, EventBroadcaster, MessageHandler, SessionRegistry};
pub use orders::OrderLifecycle;
pub use store::StateStore;
pub use tables::TableLifecycle;

// Re-export the wire/error types clients need
pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use shared::message::{BusMessage, EventName, EventType};

pub use utils::logger::{init_logger, init_logger_with_file};

pub fn print_banner() {
    println!(
        r#"
   ____        _      __   ____  _
  / __ \__  __(_)____/ /__/ __ \(_)___  ___
 / / / / / / / / ___/ //_/ / / / / __ \/ _ \
/ /_/ / /_/ / / /__/ ,< / /_/ / / / / /  __/
\___\_\__,_/_/\___/_/|_/_____/_/_/ /_/\___/
    "#
    );
}
