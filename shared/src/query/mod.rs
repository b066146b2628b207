//! 列表查询
//!
//! Filter state held by the product page and its translation into the
//! flat query string the `GET /products` endpoint understands.

mod filter;
mod params;

pub use filter::{FilterState, StatusFilter};
pub use params::{
    DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, PageRequest, QueryParams, SortDirection, SortSpec,
    build_query_params, build_query_params_with_max, filter_params, keys,
};
