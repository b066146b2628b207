//! Data models
//!
//! Shapes returned by the catalog API. Product rows keep unknown fields
//! in a flat map so the grid can edit any column the backend exposes;
//! reference endpoints (categories, families, tags, ...) are typed.

pub mod attribute;
pub mod brand;
pub mod category;
pub mod family;
pub mod product;
pub mod reference;
pub mod tag;

// Re-exports
pub use attribute::*;
pub use brand::*;
pub use category::*;
pub use family::*;
pub use product::*;
pub use reference::*;
pub use tag::*;
