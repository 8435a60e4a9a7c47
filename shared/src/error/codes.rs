//! Unified error codes for the QuickDine engine
//!
//! Error codes are shared between the engine, its HTTP collaborators, and
//! message-channel clients. Codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 4xxx: Order errors
//! - 6xxx: Menu errors
//! - 7xxx: Table errors
//! - 9xxx: System errors

use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Status value outside the entity's enum
    InvalidStatus = 6,
    /// Reference to an entity that does not exist
    InvalidReference = 7,
    /// Status transition not allowed from the current state
    InvalidTransition = 8,
    /// Entity version does not match the expected version
    VersionConflict = 9,

    // ==================== 1xxx: Auth ====================
    /// Caller is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials
    InvalidCredentials = 1002,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order item not found
    OrderItemNotFound = 4002,
    /// Order cart is empty or malformed
    InvalidCart = 4003,

    // ==================== 6xxx: Menu ====================
    /// Menu item not found
    MenuItemNotFound = 6001,

    // ==================== 7xxx: Table ====================
    /// Table not found
    TableNotFound = 7001,
    /// Table number already in use
    TableNumberTaken = 7002,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Client disconnected
    ClientDisconnected = 9003,
}

impl ErrorCode {
    /// Get the numeric code value
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the default human-readable message for this code
    pub fn message(&self) -> &'static str {
        match self {
            Self::Success => "OK",
            Self::Unknown => "Unknown error",
            Self::ValidationFailed => "Validation failed",
            Self::NotFound => "Resource not found",
            Self::AlreadyExists => "Resource already exists",
            Self::InvalidRequest => "Invalid request",
            Self::InvalidStatus => "Invalid status value",
            Self::InvalidReference => "Referenced entity does not exist",
            Self::InvalidTransition => "Status transition not allowed",
            Self::VersionConflict => "Entity was modified concurrently",
            Self::NotAuthenticated => "Authentication required",
            Self::InvalidCredentials => "Invalid credentials",
            Self::PermissionDenied => "Permission denied",
            Self::OrderNotFound => "Order not found",
            Self::OrderItemNotFound => "Order item not found",
            Self::InvalidCart => "Cart is empty or malformed",
            Self::MenuItemNotFound => "Menu item not found",
            Self::TableNotFound => "Table not found",
            Self::TableNumberTaken => "Table number already in use",
            Self::InternalError => "Internal server error",
            Self::DatabaseError => "Database error",
            Self::ClientDisconnected => "Client disconnected",
        }
    }

    /// Get the HTTP status code for this error
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Success => StatusCode::OK,
            Self::NotFound
            | Self::OrderNotFound
            | Self::OrderItemNotFound
            | Self::MenuItemNotFound
            | Self::TableNotFound => StatusCode::NOT_FOUND,
            Self::ValidationFailed
            | Self::InvalidRequest
            | Self::InvalidStatus
            | Self::InvalidReference
            | Self::InvalidCart => StatusCode::BAD_REQUEST,
            Self::AlreadyExists
            | Self::InvalidTransition
            | Self::VersionConflict
            | Self::TableNumberTaken => StatusCode::CONFLICT,
            Self::NotAuthenticated | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::PermissionDenied => StatusCode::FORBIDDEN,
            Self::Unknown
            | Self::InternalError
            | Self::DatabaseError
            | Self::ClientDisconnected => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error returned when converting an unknown u16 into an [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Success),
            1 => Ok(Self::Unknown),
            2 => Ok(Self::ValidationFailed),
            3 => Ok(Self::NotFound),
            4 => Ok(Self::AlreadyExists),
            5 => Ok(Self::InvalidRequest),
            6 => Ok(Self::InvalidStatus),
            7 => Ok(Self::InvalidReference),
            8 => Ok(Self::InvalidTransition),
            9 => Ok(Self::VersionConflict),
            1001 => Ok(Self::NotAuthenticated),
            1002 => Ok(Self::InvalidCredentials),
            2001 => Ok(Self::PermissionDenied),
            4001 => Ok(Self::OrderNotFound),
            4002 => Ok(Self::OrderItemNotFound),
            4003 => Ok(Self::InvalidCart),
            6001 => Ok(Self::MenuItemNotFound),
            7001 => Ok(Self::TableNotFound),
            7002 => Ok(Self::TableNumberTaken),
            9001 => Ok(Self::InternalError),
            9002 => Ok(Self::DatabaseError),
            9003 => Ok(Self::ClientDisconnected),
            other => Err(InvalidErrorCode(other)),
        }
    }
}
