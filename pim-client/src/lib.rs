//! PIM Client - product data grid controller
//!
//! Loads, filters, edits and downloads products against a PIM REST API.
//! [`ProductGrid`] is the entry point; [`CatalogApi`] is the seam for
//! swapping the HTTP transport out.

pub mod api;
pub mod config;
pub mod edit;
pub mod error;
pub mod events;
pub mod fetcher;
pub mod grid;
pub mod logger;
pub mod mutation;
pub mod options;
pub mod pagination;
pub mod reference;
pub mod registry;
pub mod rows;
pub mod validation;

pub use api::{BulkDownloadRequest, CatalogApi, Download, NetworkCatalogApi, Page};
pub use config::{ClientConfig, Endpoints, UiCopy};
pub use edit::{ActiveEdit, EditKey, EditState, EditTarget, EditorKind, KeyAction, PendingValue, ReselectPolicy};
pub use error::{ClientError, ClientResult, GridError, GridResult};
pub use events::{EventBus, GridEvent, Notice, NoticeLevel};
pub use grid::{FetchStatus, ProductGrid};
pub use logger::init_logger;
pub use mutation::CommitOutcome;
pub use options::DerivedOptions;
pub use reference::ReferenceData;
pub use registry::{DisplayValue, EditAffordance, FieldDescriptor, FieldRegistry};

// Re-export shared types for convenience
pub use shared::{
    FilterState, PageRequest, Product, ProductId, QueryParams, SortDirection, SortSpec,
    StatusFilter,
};
