//! Unified error codes for the Agro Norte portal
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 4xxx: Order errors
//! - 6xxx: Inventory errors
//! - 7xxx: Fuel errors
//! - 8xxx: User, security and content errors
//! - 9xxx: System errors

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
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (username/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Account still awaits administrator activation
    AccountPending = 1005,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Admin role required
    AdminRequired = 2003,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Requested status change is not allowed from the current status
    OrderInvalidTransition = 4002,
    /// Order has no items
    OrderEmpty = 4003,
    /// Order item quantity must be positive
    OrderItemInvalidQuantity = 4004,

    // ==================== 6xxx: Inventory ====================
    /// Inventory item not found
    ProductNotFound = 6001,
    /// SKU already exists
    ProductSkuExists = 6002,
    /// Not enough stock across batches
    InsufficientStock = 6003,
    /// Batch quantity must be positive
    BatchInvalidQuantity = 6004,

    // ==================== 7xxx: Fuel ====================
    /// Fuel type has no level row
    FuelTypeNotFound = 7001,
    /// Requested quantity exceeds current level
    InsufficientFuel = 7002,
    /// Deposit would exceed tank capacity
    FuelCapacityExceeded = 7003,
    /// Fuel quantity must be positive
    FuelInvalidQuantity = 7004,

    // ==================== 8xxx: Users ====================
    /// User not found
    UserNotFound = 8001,
    /// Username already exists
    UsernameExists = 8002,
    /// Cannot delete own account
    UserCannotDeleteSelf = 8003,
    /// User is already active
    UserAlreadyActive = 8004,

    // ==================== 85xx: Security ====================
    /// Security report not found
    ReportNotFound = 8501,
    /// Status change not allowed for this report kind/status
    ReportInvalidTransition = 8502,
    /// Registered vehicle not found
    VehicleNotFound = 8503,
    /// Vehicle plate already registered
    VehicleExists = 8504,

    // ==================== 86xx: Content ====================
    /// Gallery post not found
    GalleryPostNotFound = 8601,
    /// Communication not found
    CommunicationNotFound = 8602,
    /// Notification not found
    NotificationNotFound = 8603,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9005,
    /// Too many requests from the same client
    TooManyRequests = 9006,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid username or password",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",
            ErrorCode::AccountPending => "Account is pending activation",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::AdminRequired => "Administrator role is required",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderInvalidTransition => "Order status change is not allowed",
            ErrorCode::OrderEmpty => "Order is empty",
            ErrorCode::OrderItemInvalidQuantity => "Order item quantity must be positive",

            // Inventory
            ErrorCode::ProductNotFound => "Inventory item not found",
            ErrorCode::ProductSkuExists => "SKU already exists",
            ErrorCode::InsufficientStock => "Insufficient stock",
            ErrorCode::BatchInvalidQuantity => "Batch quantity must be positive",

            // Fuel
            ErrorCode::FuelTypeNotFound => "Fuel type not found",
            ErrorCode::InsufficientFuel => "Insufficient fuel level",
            ErrorCode::FuelCapacityExceeded => "Tank capacity exceeded",
            ErrorCode::FuelInvalidQuantity => "Fuel quantity must be positive",

            // Users
            ErrorCode::UserNotFound => "User not found",
            ErrorCode::UsernameExists => "Username already exists",
            ErrorCode::UserCannotDeleteSelf => "Cannot delete own account",
            ErrorCode::UserAlreadyActive => "User is already active",

            // Security
            ErrorCode::ReportNotFound => "Security report not found",
            ErrorCode::ReportInvalidTransition => "Security report status change is not allowed",
            ErrorCode::VehicleNotFound => "Vehicle not found",
            ErrorCode::VehicleExists => "Vehicle plate already registered",

            // Content
            ErrorCode::GalleryPostNotFound => "Gallery post not found",
            ErrorCode::CommunicationNotFound => "Communication not found",
            ErrorCode::NotificationNotFound => "Notification not found",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::TooManyRequests => "Too many requests, try again later",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
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
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1005 => Ok(ErrorCode::AccountPending),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2003 => Ok(ErrorCode::AdminRequired),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::OrderInvalidTransition),
            4003 => Ok(ErrorCode::OrderEmpty),
            4004 => Ok(ErrorCode::OrderItemInvalidQuantity),

            // Inventory
            6001 => Ok(ErrorCode::ProductNotFound),
            6002 => Ok(ErrorCode::ProductSkuExists),
            6003 => Ok(ErrorCode::InsufficientStock),
            6004 => Ok(ErrorCode::BatchInvalidQuantity),

            // Fuel
            7001 => Ok(ErrorCode::FuelTypeNotFound),
            7002 => Ok(ErrorCode::InsufficientFuel),
            7003 => Ok(ErrorCode::FuelCapacityExceeded),
            7004 => Ok(ErrorCode::FuelInvalidQuantity),

            // Users
            8001 => Ok(ErrorCode::UserNotFound),
            8002 => Ok(ErrorCode::UsernameExists),
            8003 => Ok(ErrorCode::UserCannotDeleteSelf),
            8004 => Ok(ErrorCode::UserAlreadyActive),

            // Security
            8501 => Ok(ErrorCode::ReportNotFound),
            8502 => Ok(ErrorCode::ReportInvalidTransition),
            8503 => Ok(ErrorCode::VehicleNotFound),
            8504 => Ok(ErrorCode::VehicleExists),

            // Content
            8601 => Ok(ErrorCode::GalleryPostNotFound),
            8602 => Ok(ErrorCode::CommunicationNotFound),
            8603 => Ok(ErrorCode::NotificationNotFound),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9005 => Ok(ErrorCode::ConfigError),
            9006 => Ok(ErrorCode::TooManyRequests),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::NotAuthenticated.code(), 1001);
        assert_eq!(ErrorCode::PermissionDenied.code(), 2001);
        assert_eq!(ErrorCode::OrderInvalidTransition.code(), 4002);
        assert_eq!(ErrorCode::InsufficientStock.code(), 6003);
        assert_eq!(ErrorCode::InsufficientFuel.code(), 7002);
        assert_eq!(ErrorCode::ReportInvalidTransition.code(), 8502);
        assert_eq!(ErrorCode::InternalError.code(), 9001);
    }

    #[test]
    fn test_try_from_roundtrip_known_codes() {
        for code in [
            ErrorCode::Unknown,
            ErrorCode::AccountPending,
            ErrorCode::OrderEmpty,
            ErrorCode::FuelCapacityExceeded,
            ErrorCode::VehicleExists,
            ErrorCode::NotificationNotFound,
            ErrorCode::TooManyRequests,
        ] {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
    }

    #[test]
    fn test_try_from_invalid() {
        assert_eq!(ErrorCode::try_from(4999), Err(InvalidErrorCode(4999)));
        assert_eq!(ErrorCode::try_from(65535), Err(InvalidErrorCode(65535)));
    }

    #[test]
    fn test_serialize_as_number() {
        let json = serde_json::to_string(&ErrorCode::InsufficientFuel).unwrap();
        assert_eq!(json, "7002");
        let code: ErrorCode = serde_json::from_str("4001").unwrap();
        assert_eq!(code, ErrorCode::OrderNotFound);
        assert!(serde_json::from_str::<ErrorCode>("12345").is_err());
    }
}
