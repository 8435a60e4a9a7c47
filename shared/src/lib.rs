//! Shared types for the QuickDine engine
//!
//! Domain models, the unified error system, and the wire message
//! contract used by the server and its clients.

pub mod error;
pub mod message;
pub mod models;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use message::{BusMessage, EventName, EventType};
