//! Shared types for the PIM catalog client
//!
//! Wire and domain types used by the grid controller: product rows,
//! heterogeneous reference shapes and their normalization, filter state
//! and query building, and the unified error system. Nothing in here
//! performs I/O.

pub mod error;
pub mod models;
pub mod query;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use error::{ApiErrorBody, AppError, AppResult, ErrorCategory, ErrorCode};
pub use models::{
    AttributeGroup, Brand, CategoryNode, Family, NormalizedRef, Product, ProductId, ProductPatch,
    RawRef, RefKind, ReferenceIndex, Tag,
};
pub use query::{
    DEFAULT_PAGE_SIZE, FilterState, MAX_PAGE_SIZE, PageRequest, QueryParams, SortDirection,
    SortSpec, StatusFilter, build_query_params, build_query_params_with_max, filter_params,
};
