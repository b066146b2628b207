//! Paginated collection fetcher
//!
//! Every call takes a generation ticket before it suspends. When the
//! response arrives and a newer ticket has been issued in the meantime,
//! the result is reported as [`FetchOutcome::Superseded`] and the caller
//! drops it: the last request wins without cancelling anything in flight.

use crate::api::{CatalogApi, Page};
use crate::error::{GridError, GridResult};
use parking_lot::RwLock;
use shared::{FilterState, PageRequest, Product, QueryParams, build_query_params_with_max};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

struct CacheEntry {
    page: Arc<Page<Product>>,
    fetched_at: Instant,
}

/// A page that is still relevant to the caller
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Generation ticket the fetch was issued under
    pub ticket: u64,
    pub params: QueryParams,
    pub page: Arc<Page<Product>>,
    /// Served from the cache without a network call
    pub cached: bool,
}

#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Current(FetchedPage),
    /// A newer fetch was issued while this one was in flight
    Superseded,
}

/// Cached, last-request-wins reader over `GET /products`
pub struct CollectionFetcher {
    api: Arc<dyn CatalogApi>,
    /// query params -> page
    cache: RwLock<HashMap<QueryParams, CacheEntry>>,
    ttl: Duration,
    max_page_size: u32,
    generation: AtomicU64,
}

impl CollectionFetcher {
    pub fn new(api: Arc<dyn CatalogApi>, ttl: Duration, max_page_size: u32) -> Self {
        Self {
            api,
            cache: RwLock::new(HashMap::new()),
            ttl,
            max_page_size,
            generation: AtomicU64::new(0),
        }
    }

    /// Query parameters a fetch of `(filter, request)` sends
    pub fn params_for(&self, filter: &FilterState, request: &PageRequest) -> QueryParams {
        build_query_params_with_max(filter, request, self.max_page_size)
    }

    /// Fetch one page
    ///
    /// A fresh cache entry answers immediately. Failures leave the cache
    /// untouched and are not retried here.
    pub async fn fetch(
        &self,
        filter: &FilterState,
        request: &PageRequest,
    ) -> GridResult<FetchOutcome> {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let params = self.params_for(filter, request);

        if let Some(page) = self.cached(&params) {
            tracing::debug!(ticket, params = ?params, "Product page served from cache");
            return Ok(FetchOutcome::Current(FetchedPage {
                ticket,
                params,
                page,
                cached: true,
            }));
        }

        let result = self.api.list_products(&params).await;

        if !self.is_current(ticket) {
            tracing::debug!(
                ticket,
                latest = self.generation.load(Ordering::SeqCst),
                ok = result.is_ok(),
                "Discarding superseded product page"
            );
            if let Ok(page) = result {
                self.store(params, Arc::new(page));
            }
            return Ok(FetchOutcome::Superseded);
        }

        match result {
            Ok(page) => {
                let page = Arc::new(page);
                tracing::info!(
                    ticket,
                    rows = page.results.len(),
                    count = ?page.count,
                    has_next = page.next.is_some(),
                    "Product page loaded"
                );
                self.store(params.clone(), page.clone());
                Ok(FetchOutcome::Current(FetchedPage {
                    ticket,
                    params,
                    page,
                    cached: false,
                }))
            }
            Err(e) => {
                tracing::warn!(ticket, error = %e, "Product page fetch failed");
                Err(GridError::Fetch(e))
            }
        }
    }

    /// `true` while no newer fetch has been issued after `ticket`
    pub fn is_current(&self, ticket: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket
    }

    /// Drop every cached page
    pub fn invalidate(&self) {
        let mut cache = self.cache.write();
        if !cache.is_empty() {
            tracing::debug!(entries = cache.len(), "Invalidating product page cache");
            cache.clear();
        }
    }

    pub fn cached_len(&self) -> usize {
        self.cache.read().len()
    }

    fn cached(&self, params: &QueryParams) -> Option<Arc<Page<Product>>> {
        let cache = self.cache.read();
        let entry = cache.get(params)?;
        (entry.fetched_at.elapsed() < self.ttl).then(|| entry.page.clone())
    }

    /// Insert `page`, evicting every expired entry on the way
    fn store(&self, params: QueryParams, page: Arc<Page<Product>>) {
        let ttl = self.ttl;
        let mut cache = self.cache.write();
        cache.retain(|_, entry| entry.fetched_at.elapsed() < ttl);
        cache.insert(
            params,
            CacheEntry {
                page,
                fetched_at: Instant::now(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{BulkDownloadRequest, Download};
    use crate::error::{ClientError, ClientResult};
    use async_trait::async_trait;
    use shared::{AttributeGroup, Brand, CategoryNode, Family, ProductId, ProductPatch, Tag};
    use std::sync::atomic::AtomicUsize;

    /// Answers every list call with one row; counts calls
    #[derive(Default)]
    struct CountingApi {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl CatalogApi for CountingApi {
        async fn list_products(&self, params: &QueryParams) -> ClientResult<Page<Product>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ClientError::Internal("down".into()));
            }
            let id = params.get("search").unwrap_or("1").to_string();
            Ok(Page::new(vec![Product::new(id)]).with_count(1))
        }

        async fn get_product(&self, id: &ProductId) -> ClientResult<Product> {
            Ok(Product::new(id.clone()))
        }

        async fn patch_product(
            &self,
            _id: &ProductId,
            _patch: &ProductPatch,
        ) -> ClientResult<Option<Product>> {
            Ok(None)
        }

        async fn bulk_download(
            &self,
            _id: &ProductId,
            _request: &BulkDownloadRequest,
        ) -> ClientResult<Download> {
            Err(ClientError::NotFound("assets".into()))
        }

        async fn categories(&self) -> ClientResult<Vec<CategoryNode>> {
            Ok(vec![])
        }

        async fn tags(&self) -> ClientResult<Vec<Tag>> {
            Ok(vec![])
        }

        async fn families(&self) -> ClientResult<Vec<Family>> {
            Ok(vec![])
        }

        async fn attribute_groups(&self) -> ClientResult<Vec<AttributeGroup>> {
            Ok(vec![])
        }

        async fn brands(&self) -> ClientResult<Vec<Brand>> {
            Ok(vec![])
        }
    }

    fn fetcher(api: Arc<CountingApi>) -> CollectionFetcher {
        CollectionFetcher::new(api, Duration::from_secs(60), 50)
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_hit_within_ttl() {
        let api = Arc::new(CountingApi::default());
        let fetcher = fetcher(api.clone());
        let filter = FilterState::new().with_search("boots");
        let request = PageRequest::first(25);

        let first = fetcher.fetch(&filter, &request).await.unwrap();
        let second = fetcher.fetch(&filter, &request).await.unwrap();

        assert!(matches!(first, FetchOutcome::Current(ref p) if !p.cached));
        assert!(matches!(second, FetchOutcome::Current(ref p) if p.cached));
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_expires() {
        let api = Arc::new(CountingApi::default());
        let fetcher = fetcher(api.clone());
        let filter = FilterState::new();
        let request = PageRequest::first(25);

        fetcher.fetch(&filter, &request).await.unwrap();
        tokio::time::advance(Duration::from_secs(61)).await;
        fetcher.fetch(&filter, &request).await.unwrap();

        assert_eq!(api.calls.load(Ordering::SeqCst), 2);
        assert_eq!(fetcher.cached_len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_evicts_expired_keys() {
        let api = Arc::new(CountingApi::default());
        let fetcher = fetcher(api.clone());
        let request = PageRequest::first(25);

        for search in ["a", "b", "c"] {
            fetcher
                .fetch(&FilterState::new().with_search(search), &request)
                .await
                .unwrap();
        }
        assert_eq!(fetcher.cached_len(), 3);

        tokio::time::advance(Duration::from_secs(61)).await;
        fetcher
            .fetch(&FilterState::new().with_search("d"), &request)
            .await
            .unwrap();

        assert_eq!(fetcher.cached_len(), 1);
    }

    #[tokio::test]
    async fn test_sentinel_filters_share_cache_key() {
        let api = Arc::new(CountingApi::default());
        let fetcher = fetcher(api.clone());
        let request = PageRequest::first(25);

        fetcher.fetch(&FilterState::new(), &request).await.unwrap();
        fetcher
            .fetch(&FilterState::new().with_category("all"), &request)
            .await
            .unwrap();

        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_network() {
        let api = Arc::new(CountingApi::default());
        let fetcher = fetcher(api.clone());
        let request = PageRequest::first(25);

        fetcher.fetch(&FilterState::new(), &request).await.unwrap();
        fetcher.invalidate();
        fetcher.fetch(&FilterState::new(), &request).await.unwrap();

        assert_eq!(api.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failure_is_typed_and_not_cached() {
        let api = Arc::new(CountingApi {
            fail: true,
            ..Default::default()
        });
        let fetcher = fetcher(api.clone());

        let err = fetcher
            .fetch(&FilterState::new(), &PageRequest::first(25))
            .await
            .unwrap_err();

        assert!(matches!(err, GridError::Fetch(ClientError::Internal(_))));
        assert_eq!(fetcher.cached_len(), 0);
    }

    #[tokio::test]
    async fn test_page_size_clamped_in_params() {
        let fetcher = fetcher(Arc::new(CountingApi::default()));
        let params = fetcher.params_for(&FilterState::new(), &PageRequest::first(1000));
        assert_eq!(params.page_size(), Some(50));
    }
}
