//! Unified error system for the QuickDine engine
//!
//! - [`ErrorCode`]: standardized error codes for all failure kinds
//! - [`ErrorCategory`]: classification of errors by domain
//! - [`AppError`]: rich error type with code, message, and details
//! - [`ApiResponse`]: unified API response envelope
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 4xxx: Order errors
//! - 6xxx: Menu errors
//! - 7xxx: Table errors
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode, ApiResponse};
//!
//! // Illegal status transition, with context for the caller
//! let err = AppError::invalid_transition("completed", "pending")
//!     .with_detail("order_id", 42);
//!
//! assert_eq!(err.code, ErrorCode::InvalidTransition);
//! let response = ApiResponse::<()>::error(&err);
//! ```

mod category;
mod codes;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{ApiResponse, AppError, AppResult};
