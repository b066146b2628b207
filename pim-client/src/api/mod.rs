//! Catalog API collaborator
//!
//! The grid never talks HTTP directly; it goes through [`CatalogApi`] so the
//! backend can be swapped for an in-memory double in tests.

mod download;
mod network;

pub use download::{Download, FALLBACK_FILE_NAME, parse_content_disposition, sanitize_file_name};
pub use network::NetworkCatalogApi;

use crate::error::ClientResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::{
    AttributeGroup, Brand, CategoryNode, Family, Product, ProductId, ProductPatch, QueryParams, Tag,
};

/// Paginated envelope returned by list endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    /// Link (absolute or relative URL) or opaque token for the next page
    #[serde(default)]
    pub next: Option<String>,
    /// Total matches across all pages
    #[serde(default)]
    pub count: Option<u64>,
}

impl<T> Page<T> {
    pub fn new(results: Vec<T>) -> Self {
        Self {
            results,
            next: None,
            count: None,
        }
    }

    pub fn with_next(mut self, next: impl Into<String>) -> Self {
        self.next = Some(next.into());
        self
    }

    pub fn with_count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }
}

/// Reference endpoints answer with either a bare list or a page envelope
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListOrPage<T> {
    List(Vec<T>),
    Page(Page<T>),
}

impl<T> ListOrPage<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            ListOrPage::List(items) => items,
            ListOrPage::Page(page) => page.results,
        }
    }
}

/// Body of the bulk download request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkDownloadRequest {
    /// Assets to include; empty means every asset of the product
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub asset_ids: Vec<String>,
}

impl BulkDownloadRequest {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn assets<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            asset_ids: ids.into_iter().map(Into::into).collect(),
        }
    }
}

/// Backend operations used by the grid
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// `GET /products?<query>`
    async fn list_products(&self, params: &QueryParams) -> ClientResult<Page<Product>>;

    /// `GET /products/{id}`
    async fn get_product(&self, id: &ProductId) -> ClientResult<Product>;

    /// `PATCH /products/{id}`; `None` when the server answers without a body
    async fn patch_product(
        &self,
        id: &ProductId,
        patch: &ProductPatch,
    ) -> ClientResult<Option<Product>>;

    /// `POST /products/{id}/assets/bulk-download`
    async fn bulk_download(
        &self,
        id: &ProductId,
        request: &BulkDownloadRequest,
    ) -> ClientResult<Download>;

    async fn categories(&self) -> ClientResult<Vec<CategoryNode>>;

    async fn tags(&self) -> ClientResult<Vec<Tag>>;

    async fn families(&self) -> ClientResult<Vec<Family>>;

    async fn attribute_groups(&self) -> ClientResult<Vec<AttributeGroup>>;

    async fn brands(&self) -> ClientResult<Vec<Brand>>;
}
