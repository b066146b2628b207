//! Unified error system for the catalog client
//!
//! This module provides:
//! - [`ErrorCode`]: Standardized error codes shared with the backend
//! - [`ErrorCategory`]: Classification of errors by domain
//! - [`AppError`]: Rich error type with codes, messages, and details
//! - [`ApiErrorBody`]: The error payload returned by the catalog API
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Product errors
//! - 4xxx: Catalog reference errors (categories, families, attributes, tags)
//! - 5xxx: Asset errors
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode};
//!
//! let err = AppError::new(ErrorCode::ProductNotFound);
//! assert_eq!(err.message, "Product not found");
//!
//! let err = AppError::validation("SKU already in use").with_field("sku");
//! assert_eq!(err.field(), Some("sku"));
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{ApiErrorBody, AppError, AppResult};
