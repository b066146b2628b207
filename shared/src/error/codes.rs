//! Unified error codes for the catalog client
//!
//! Codes are shared with the catalog API so a failed request can be
//! classified without string matching:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Product errors
//! - 4xxx: Catalog reference errors
//! - 5xxx: Asset errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// Represented as `u16` on the wire.
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
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Session has expired
    SessionExpired = 1005,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Organization admin role required
    AdminRequired = 2003,

    // ==================== 3xxx: Product ====================
    /// Product not found
    ProductNotFound = 3001,
    /// Product has invalid price
    ProductInvalidPrice = 3002,
    /// Product SKU already exists
    ProductSkuExists = 3003,
    /// Product barcode already exists
    ProductBarcodeExists = 3004,
    /// Product was modified by someone else
    ProductVersionConflict = 3005,
    /// Product name is required
    ProductNameRequired = 3006,

    // ==================== 4xxx: Catalog references ====================
    /// Category not found
    CategoryNotFound = 4001,
    /// Family not found
    FamilyNotFound = 4101,
    /// Attribute not found
    AttributeNotFound = 4201,
    /// Attribute group not found
    AttributeGroupNotFound = 4202,
    /// Tag not found
    TagNotFound = 4301,
    /// Brand not found
    BrandNotFound = 4401,

    // ==================== 5xxx: Assets ====================
    /// Asset not found
    AssetNotFound = 5001,
    /// Asset archive could not be produced
    DownloadFailed = 5002,
    /// Asset archive exceeds the size limit
    ArchiveTooLarge = 5003,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Network error
    NetworkError = 9003,
    /// Operation timeout
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,
    /// System busy (retry later)
    SystemBusy = 9404,
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
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",
            ErrorCode::SessionExpired => "Session has expired",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::AdminRequired => "Administrator role is required",

            // Product
            ErrorCode::ProductNotFound => "Product not found",
            ErrorCode::ProductInvalidPrice => "Product has invalid price",
            ErrorCode::ProductSkuExists => "Product SKU already exists",
            ErrorCode::ProductBarcodeExists => "Product barcode already exists",
            ErrorCode::ProductVersionConflict => "Product was modified by another user",
            ErrorCode::ProductNameRequired => "Product name is required",

            // Catalog references
            ErrorCode::CategoryNotFound => "Category not found",
            ErrorCode::FamilyNotFound => "Family not found",
            ErrorCode::AttributeNotFound => "Attribute not found",
            ErrorCode::AttributeGroupNotFound => "Attribute group not found",
            ErrorCode::TagNotFound => "Tag not found",
            ErrorCode::BrandNotFound => "Brand not found",

            // Assets
            ErrorCode::AssetNotFound => "Asset not found",
            ErrorCode::DownloadFailed => "Asset download failed",
            ErrorCode::ArchiveTooLarge => "Asset archive is too large",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::SystemBusy => "System busy, please retry later",
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
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1005 => Ok(ErrorCode::SessionExpired),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2003 => Ok(ErrorCode::AdminRequired),

            // Product
            3001 => Ok(ErrorCode::ProductNotFound),
            3002 => Ok(ErrorCode::ProductInvalidPrice),
            3003 => Ok(ErrorCode::ProductSkuExists),
            3004 => Ok(ErrorCode::ProductBarcodeExists),
            3005 => Ok(ErrorCode::ProductVersionConflict),
            3006 => Ok(ErrorCode::ProductNameRequired),

            // Catalog references
            4001 => Ok(ErrorCode::CategoryNotFound),
            4101 => Ok(ErrorCode::FamilyNotFound),
            4201 => Ok(ErrorCode::AttributeNotFound),
            4202 => Ok(ErrorCode::AttributeGroupNotFound),
            4301 => Ok(ErrorCode::TagNotFound),
            4401 => Ok(ErrorCode::BrandNotFound),

            // Assets
            5001 => Ok(ErrorCode::AssetNotFound),
            5002 => Ok(ErrorCode::DownloadFailed),
            5003 => Ok(ErrorCode::ArchiveTooLarge),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::NetworkError),
            9004 => Ok(ErrorCode::TimeoutError),
            9005 => Ok(ErrorCode::ConfigError),
            9404 => Ok(ErrorCode::SystemBusy),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
