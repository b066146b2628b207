// pim-client/tests/common/mod.rs
// 测试用内存 CatalogApi

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use pim_client::{
    BulkDownloadRequest, CatalogApi, ClientConfig, ClientError, ClientResult, Download, Page,
    ProductGrid,
};
use serde_json::json;
use shared::{
    AppError, AttributeGroup, Brand, CategoryNode, ErrorCode, Family, Product, ProductId, ProductPatch, QueryParams, Tag,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::oneshot;

/// In-memory backend with scripted failures
#[derive(Default)]
pub struct MockCatalogApi {
    pub products: Mutex<Vec<Product>>,
    pub categories: Mutex<Vec<CategoryNode>>,
    pub tags: Mutex<Vec<Tag>>,
    pub families: Mutex<Vec<Family>>,
    /// search term -> gate the list call waits on
    gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
    /// field id -> gate the PATCH touching it waits on
    patch_gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
    pub seen_params: Mutex<Vec<QueryParams>>,

    pub fail_list: AtomicBool,
    pub fail_patch: AtomicBool,
    pub fail_get: AtomicBool,
    pub fail_families: AtomicBool,
    /// PATCH answers with the stored row instead of 204
    pub canonical_patch: AtomicBool,
    /// Remaining transient download failures; `u32::MAX` never recovers
    pub download_failures: AtomicU32,
    pub download_missing: AtomicBool,
    /// Every download answers 500 with a coded body
    pub download_rejected: AtomicBool,

    pub list_calls: AtomicUsize,
    pub patch_calls: AtomicUsize,
    pub get_calls: AtomicUsize,
    pub download_calls: AtomicUsize,
}

impl MockCatalogApi {
    pub fn with_products(products: Vec<Product>) -> Arc<Self> {
        let api = Self::default();
        *api.products.lock() = products;
        Arc::new(api)
    }

    /// Hold list calls searching for `search` until the sender fires
    pub fn gate(&self, search: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().insert(search.to_string(), rx);
        tx
    }

    /// Hold PATCH calls touching `field_id` until the sender fires
    pub fn gate_patch(&self, field_id: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.patch_gates.lock().insert(field_id.to_string(), rx);
        tx
    }

    pub fn stored(&self, id: &str) -> Option<Product> {
        self.products
            .lock()
            .iter()
            .find(|p| p.id.as_str() == id)
            .cloned()
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogApi for MockCatalogApi {
    async fn list_products(&self, params: &QueryParams) -> ClientResult<Page<Product>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.seen_params.lock().push(params.clone());

        let gate = params
            .get("search")
            .and_then(|search| self.gates.lock().remove(search));
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        if self.fail_list.load(Ordering::SeqCst) {
            return Err(ClientError::Internal("list unavailable".into()));
        }

        let search = params.get("search").map(str::to_lowercase);
        let matching: Vec<Product> = self
            .products
            .lock()
            .iter()
            .filter(|p| {
                search.as_deref().is_none_or(|s| {
                    p.name()
                        .is_some_and(|name| name.to_lowercase().contains(s))
                })
            })
            .cloned()
            .collect();

        let page = params.page().unwrap_or(1).max(1) as usize;
        let size = params.page_size().unwrap_or(25).max(1) as usize;
        let total = matching.len();
        let results: Vec<Product> = matching.into_iter().skip((page - 1) * size).take(size).collect();

        let mut out = Page::new(results).with_count(total as u64);
        if page * size < total {
            out = out.with_next(format!(
                "http://pim.test/api/products/?page={}&page_size={size}",
                page + 1
            ));
        }
        Ok(out)
    }

    async fn get_product(&self, id: &ProductId) -> ClientResult<Product> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(ClientError::Internal("read unavailable".into()));
        }
        self.stored(id.as_str())
            .ok_or_else(|| ClientError::NotFound(format!("product {id}")))
    }

    async fn patch_product(
        &self,
        id: &ProductId,
        patch: &ProductPatch,
    ) -> ClientResult<Option<Product>> {
        self.patch_calls.fetch_add(1, Ordering::SeqCst);

        let gate = {
            let mut gates = self.patch_gates.lock();
            patch.fields().keys().find_map(|field| gates.remove(field))
        };
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        if self.fail_patch.load(Ordering::SeqCst) {
            return Err(ClientError::Validation("rejected by server".into()));
        }

        let mut products = self.products.lock();
        let slot = products
            .iter_mut()
            .find(|p| p.id == *id)
            .ok_or_else(|| ClientError::NotFound(format!("product {id}")))?;
        let mut updated = patch.apply_to(slot)?;
        updated.updated_at = Some("server-stamp".into());
        *slot = updated.clone();

        Ok(self.canonical_patch.load(Ordering::SeqCst).then_some(updated))
    }

    async fn bulk_download(
        &self,
        id: &ProductId,
        _request: &BulkDownloadRequest,
    ) -> ClientResult<Download> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        if self.download_rejected.load(Ordering::SeqCst) {
            return Err(ClientError::from_app_error(
                500,
                AppError::new(ErrorCode::DownloadFailed),
            ));
        }
        if self.download_missing.load(Ordering::SeqCst) {
            return Err(ClientError::NotFound(format!("assets for {id}")));
        }

        let remaining = self.download_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            if remaining != u32::MAX {
                self.download_failures.fetch_sub(1, Ordering::SeqCst);
            }
            return Err(ClientError::Internal("storage busy".into()));
        }
        Ok(Download::new(format!("product-{id}.zip"), b"PK\x03\x04".to_vec()))
    }

    async fn categories(&self) -> ClientResult<Vec<CategoryNode>> {
        Ok(self.categories.lock().clone())
    }

    async fn tags(&self) -> ClientResult<Vec<Tag>> {
        Ok(self.tags.lock().clone())
    }

    async fn families(&self) -> ClientResult<Vec<Family>> {
        if self.fail_families.load(Ordering::SeqCst) {
            return Err(ClientError::Internal("families unavailable".into()));
        }
        Ok(self.families.lock().clone())
    }

    async fn attribute_groups(&self) -> ClientResult<Vec<AttributeGroup>> {
        Ok(vec![])
    }

    async fn brands(&self) -> ClientResult<Vec<Brand>> {
        Ok(vec![])
    }
}

pub fn product(id: &str, name: &str) -> Product {
    Product::new(id)
        .with_field("name", name)
        .with_field("sku", format!("SKU-{id}"))
        .with_field("price", json!("10.00"))
        .with_field("is_active", true)
}

/// Three rows used by the filter scenario
pub fn scenario_rows() -> Vec<Product> {
    vec![
        Product::new("1").with_field("is_active", true).with_tags(["red", "large"]),
        Product::new("2").with_field("is_active", true).with_tags(["blue"]),
        Product::new("3").with_field("is_active", false).with_tags(["red"]),
    ]
}

pub fn test_config() -> ClientConfig {
    ClientConfig::new("http://pim.test/api").with_retry_delay(Duration::from_millis(10))
}

pub fn grid(api: Arc<MockCatalogApi>) -> ProductGrid {
    ProductGrid::new(test_config(), api)
}
