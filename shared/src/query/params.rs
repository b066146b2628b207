//! Query parameter building for `GET /products`

use super::filter::{FilterState, active_tags, is_meaningful, present};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Upper bound on `page_size`, whatever the caller asks for
pub const MAX_PAGE_SIZE: u32 = 50;

/// Default page size when none is requested
pub const DEFAULT_PAGE_SIZE: u32 = 25;

/// Query parameter names understood by the product endpoint
pub mod keys {
    pub const SEARCH: &str = "search";
    pub const CATEGORY: &str = "category";
    pub const IS_ACTIVE: &str = "is_active";
    pub const MIN_PRICE: &str = "min_price";
    pub const MAX_PRICE: &str = "max_price";
    pub const TAGS: &str = "tags";
    pub const CREATED_AFTER: &str = "created_after";
    pub const CREATED_BEFORE: &str = "created_before";
    pub const UPDATED_AFTER: &str = "updated_after";
    pub const UPDATED_BEFORE: &str = "updated_before";
    pub const FAMILY: &str = "family";
    pub const BRAND: &str = "brand";
    pub const BARCODE: &str = "barcode";
    pub const SKU: &str = "sku";
    pub const NAME: &str = "name";
    pub const PAGE: &str = "page";
    pub const PAGE_SIZE: &str = "page_size";
    pub const CURSOR: &str = "cursor";
    pub const ORDERING: &str = "ordering";
}

/// Normalized query parameters
///
/// Ordered so that two equal filter states always produce the same
/// parameter list; doubles as the fetch cache key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryParams(BTreeMap<String, String>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw parameters (e.g. parsed from a deep link); not normalized
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Pairs in the shape `reqwest::RequestBuilder::query` takes
    pub fn to_pairs(&self) -> Vec<(&str, &str)> {
        self.iter().collect()
    }

    pub fn page(&self) -> Option<u32> {
        self.get(keys::PAGE).and_then(|p| p.parse().ok())
    }

    pub fn page_size(&self) -> Option<u32> {
        self.get(keys::PAGE_SIZE).and_then(|p| p.parse().ok())
    }

    pub fn cursor(&self) -> Option<&str> {
        self.get(keys::CURSOR)
    }

    /// Insert unless the value is blank or the `"all"` sentinel
    fn put(&mut self, key: &str, value: Option<&str>) {
        if let Some(v) = value.filter(|v| is_meaningful(v)) {
            self.0.insert(key.to_string(), v.to_string());
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Column sort, sent as `ordering=field` / `ordering=-field`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }

    pub fn to_ordering(&self) -> String {
        match self.direction {
            SortDirection::Asc => self.field.clone(),
            SortDirection::Desc => format!("-{}", self.field),
        }
    }

    pub fn from_ordering(ordering: &str) -> Option<Self> {
        let ordering = ordering.trim();
        match ordering.strip_prefix('-') {
            Some(field) if !field.is_empty() => Some(Self::desc(field)),
            Some(_) => None,
            None if !ordering.is_empty() => Some(Self::asc(ordering)),
            None => None,
        }
    }
}

/// Which slice of the collection to request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRequest {
    /// 1-based page number (ignored when `cursor` is set)
    pub page: u32,
    pub page_size: u32,
    /// Opaque continuation token for cursor-paginated deployments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortSpec>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first(DEFAULT_PAGE_SIZE)
    }
}

impl PageRequest {
    pub fn first(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size,
            cursor: None,
            sort: None,
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self.cursor = None;
        self
    }

    pub fn with_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    pub fn with_sort(mut self, sort: Option<SortSpec>) -> Self {
        self.sort = sort;
        self
    }

    /// Rebuild from query parameters; missing values fall back to defaults
    pub fn from_query_params(params: &QueryParams) -> Self {
        Self {
            page: params.page().unwrap_or(1),
            page_size: params.page_size().unwrap_or(DEFAULT_PAGE_SIZE),
            cursor: params.cursor().map(str::to_string),
            sort: params.get(keys::ORDERING).and_then(SortSpec::from_ordering),
        }
    }
}

/// The filter half of [`build_query_params`], without paging or ordering
///
/// Also the normalized form client-side predicates are evaluated against.
pub fn filter_params(filter: &FilterState) -> QueryParams {
    let mut params = QueryParams::new();

    params.put(keys::SEARCH, present(&filter.search));
    params.put(keys::CATEGORY, present(&filter.category));
    if let Some(active) = filter.status.as_is_active() {
        params.put(keys::IS_ACTIVE, Some(if active { "true" } else { "false" }));
    }
    params.put(keys::MIN_PRICE, present(&filter.min_price));
    params.put(keys::MAX_PRICE, present(&filter.max_price));

    let tags: Vec<&str> = active_tags(&filter.tags).collect();
    if !tags.is_empty() {
        params.put(keys::TAGS, Some(&tags.join(",")));
    }

    params.put(keys::CREATED_AFTER, present(&filter.created_after));
    params.put(keys::CREATED_BEFORE, present(&filter.created_before));
    params.put(keys::UPDATED_AFTER, present(&filter.updated_after));
    params.put(keys::UPDATED_BEFORE, present(&filter.updated_before));
    params.put(keys::FAMILY, present(&filter.family));
    params.put(keys::BRAND, present(&filter.brand));
    params.put(keys::BARCODE, present(&filter.barcode));
    params.put(keys::SKU, present(&filter.sku));
    params.put(keys::NAME, present(&filter.name));

    params
}

/// Translate filter widgets plus paging into server query parameters
///
/// Pure: never mutates its input, drops blank and `"all"` values, maps
/// the status enum onto `is_active`, joins tags with commas and clamps
/// `page_size` to [`MAX_PAGE_SIZE`]. Price bounds and dates are passed
/// through untouched.
pub fn build_query_params(filter: &FilterState, page: &PageRequest) -> QueryParams {
    build_query_params_with_max(filter, page, MAX_PAGE_SIZE)
}

/// [`build_query_params`] with a deployment-specific page size ceiling
pub fn build_query_params_with_max(
    filter: &FilterState,
    page: &PageRequest,
    max_page_size: u32,
) -> QueryParams {
    let mut params = filter_params(filter);

    match page.cursor.as_deref() {
        Some(cursor) if is_meaningful(cursor) => params.put(keys::CURSOR, Some(cursor)),
        _ => params.put(keys::PAGE, Some(&page.page.max(1).to_string())),
    }
    let page_size = page.page_size.clamp(1, max_page_size.max(1));
    params.put(keys::PAGE_SIZE, Some(&page_size.to_string()));

    if let Some(sort) = &page.sort {
        params.put(keys::ORDERING, Some(&sort.to_ordering()));
    }

    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::StatusFilter;

    fn rebuild(params: &QueryParams) -> QueryParams {
        build_query_params(
            &FilterState::from_query_params(params),
            &PageRequest::from_query_params(params),
        )
    }

    #[test]
    fn test_status_mapping() {
        let page = PageRequest::default();
        let active = build_query_params(&FilterState::new().with_status(StatusFilter::Active), &page);
        let inactive =
            build_query_params(&FilterState::new().with_status(StatusFilter::Inactive), &page);
        let all = build_query_params(&FilterState::new(), &page);

        assert_eq!(active.get("is_active"), Some("true"));
        assert_eq!(inactive.get("is_active"), Some("false"));
        assert!(!all.contains_key("is_active"));
    }

    #[test]
    fn test_tags_joined_or_omitted() {
        let page = PageRequest::default();
        let params = build_query_params(&FilterState::new().with_tags(["red", "large"]), &page);
        assert_eq!(params.get("tags"), Some("red,large"));

        let empty = build_query_params(&FilterState::new().with_tags(Vec::<String>::new()), &page);
        assert!(!empty.contains_key("tags"));
    }

    #[test]
    fn test_empty_and_sentinel_values_omitted() {
        let filter = FilterState {
            search: Some("".into()),
            category: Some("all".into()),
            brand: Some("ALL".into()),
            family: None,
            sku: Some("SKU-1".into()),
            ..Default::default()
        };
        let params = build_query_params(&filter, &PageRequest::default());

        assert_eq!(params.get("sku"), Some("SKU-1"));
        for key in ["search", "category", "brand", "family"] {
            assert!(!params.contains_key(key), "{key} should be omitted");
        }
        assert!(params.iter().all(|(_, v)| !v.is_empty() && v != "all"));
    }

    #[test]
    fn test_page_size_clamped() {
        let params = build_query_params(&FilterState::new(), &PageRequest::first(500));
        assert_eq!(params.page_size(), Some(MAX_PAGE_SIZE));

        let params = build_query_params_with_max(&FilterState::new(), &PageRequest::first(500), 20);
        assert_eq!(params.page_size(), Some(20));

        let params = build_query_params(&FilterState::new(), &PageRequest::first(10));
        assert_eq!(params.page_size(), Some(10));
    }

    #[test]
    fn test_price_and_dates_pass_through() {
        let filter = FilterState {
            min_price: Some("abc".into()),
            max_price: Some("99.5".into()),
            created_after: Some("2024-13-45".into()),
            ..Default::default()
        };
        let params = build_query_params(&filter, &PageRequest::default());

        assert_eq!(params.get("min_price"), Some("abc"));
        assert_eq!(params.get("max_price"), Some("99.5"));
        assert_eq!(params.get("created_after"), Some("2024-13-45"));
    }

    #[test]
    fn test_filter_params_has_no_paging() {
        let params = filter_params(&FilterState::new().with_search("x"));
        assert_eq!(params.get("search"), Some("x"));
        assert_eq!(params.len(), 1);
        assert!(filter_params(&FilterState::new()).is_empty());
    }

    #[test]
    fn test_input_not_mutated() {
        let filter = FilterState::new().with_tags(["", "red"]).with_search("");
        let before = filter.clone();
        let _ = build_query_params(&filter, &PageRequest::first(999));
        assert_eq!(filter, before);
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let filter = FilterState {
            search: Some("boot".into()),
            category: Some("4".into()),
            status: StatusFilter::Inactive,
            min_price: Some("10".into()),
            tags: vec!["red".into(), " ".into(), "large".into()],
            family: Some("all".into()),
            updated_before: Some("2024-06-01".into()),
            ..Default::default()
        };
        let page = PageRequest::first(80)
            .with_page(3)
            .with_sort(Some(SortSpec::desc("price")));

        let once = build_query_params(&filter, &page);
        let twice = rebuild(&once);

        assert_eq!(once, twice);
        assert_eq!(once.get("ordering"), Some("-price"));
        assert_eq!(once.get("page"), Some("3"));
        assert_eq!(once.get("tags"), Some("red,large"));
    }

    #[test]
    fn test_cursor_replaces_page() {
        let page = PageRequest::first(20).with_cursor("cD0yMDI0");
        let params = build_query_params(&FilterState::new(), &page);
        assert_eq!(params.cursor(), Some("cD0yMDI0"));
        assert!(!params.contains_key("page"));
        assert_eq!(rebuild(&params), params);
    }

    #[test]
    fn test_sort_spec_ordering() {
        assert_eq!(SortSpec::asc("name").to_ordering(), "name");
        assert_eq!(SortSpec::desc("name").to_ordering(), "-name");
        assert_eq!(SortSpec::from_ordering("-price"), Some(SortSpec::desc("price")));
        assert_eq!(SortSpec::from_ordering("sku"), Some(SortSpec::asc("sku")));
        assert_eq!(SortSpec::from_ordering("-"), None);
        assert_eq!(SortSpec::from_ordering(""), None);
    }
}
