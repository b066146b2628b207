//! Product list filter state

use super::params::{QueryParams, keys};
use serde::{Deserialize, Serialize};

/// Sentinel the filter widgets use for "no restriction"
pub(crate) const ALL: &str = "all";

/// Status dropdown value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Inactive,
}

impl StatusFilter {
    /// `is_active` value to send, `None` for [`StatusFilter::All`]
    pub fn as_is_active(&self) -> Option<bool> {
        match self {
            StatusFilter::All => None,
            StatusFilter::Active => Some(true),
            StatusFilter::Inactive => Some(false),
        }
    }
}

/// Independently-optional predicates over the product collection
///
/// Values are kept exactly as the filter widgets produced them; an empty
/// string or the `"all"` sentinel means the same as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterState {
    pub search: Option<String>,
    pub category: Option<String>,
    pub status: StatusFilter,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub tags: Vec<String>,
    pub created_after: Option<String>,
    pub created_before: Option<String>,
    pub updated_after: Option<String>,
    pub updated_before: Option<String>,
    pub family: Option<String>,
    pub brand: Option<String>,
    pub barcode: Option<String>,
    pub sku: Option<String>,
    pub name: Option<String>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.family = Some(family.into());
        self
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn with_price_range(mut self, min: Option<&str>, max: Option<&str>) -> Self {
        self.min_price = min.map(str::to_string);
        self.max_price = max.map(str::to_string);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// `true` when no predicate would restrict the collection
    pub fn is_empty(&self) -> bool {
        self.status == StatusFilter::All
            && active_tags(&self.tags).next().is_none()
            && [
                &self.search,
                &self.category,
                &self.min_price,
                &self.max_price,
                &self.created_after,
                &self.created_before,
                &self.updated_after,
                &self.updated_before,
                &self.family,
                &self.brand,
                &self.barcode,
                &self.sku,
                &self.name,
            ]
            .iter()
            .all(|v| present(v).is_none())
    }

    /// Rebuild filter state from query parameters (deep links, restored views)
    ///
    /// Inverse of the filter half of [`super::build_query_params`].
    pub fn from_query_params(params: &QueryParams) -> Self {
        let get = |key: &str| params.get(key).map(str::to_string);
        Self {
            search: get(keys::SEARCH),
            category: get(keys::CATEGORY),
            status: match params.get(keys::IS_ACTIVE) {
                Some("true") => StatusFilter::Active,
                Some("false") => StatusFilter::Inactive,
                _ => StatusFilter::All,
            },
            min_price: get(keys::MIN_PRICE),
            max_price: get(keys::MAX_PRICE),
            tags: params
                .get(keys::TAGS)
                .map(|t| t.split(',').map(str::to_string).collect())
                .unwrap_or_default(),
            created_after: get(keys::CREATED_AFTER),
            created_before: get(keys::CREATED_BEFORE),
            updated_after: get(keys::UPDATED_AFTER),
            updated_before: get(keys::UPDATED_BEFORE),
            family: get(keys::FAMILY),
            brand: get(keys::BRAND),
            barcode: get(keys::BARCODE),
            sku: get(keys::SKU),
            name: get(keys::NAME),
        }
    }
}

/// The value, unless it is blank or the `"all"` sentinel
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| is_meaningful(v))
}

pub(crate) fn is_meaningful(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty() && !trimmed.eq_ignore_ascii_case(ALL)
}

/// Tags that actually restrict (blank entries dropped)
pub(crate) fn active_tags(tags: &[String]) -> impl Iterator<Item = &str> {
    tags.iter().map(|t| t.trim()).filter(|t| is_meaningful(t))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_empty() {
        assert!(FilterState::default().is_empty());
    }

    #[test]
    fn test_sentinels_count_as_empty() {
        let filter = FilterState {
            category: Some("all".into()),
            brand: Some("".into()),
            sku: Some("   ".into()),
            tags: vec!["".into()],
            ..Default::default()
        };
        assert!(filter.is_empty());
    }

    #[test]
    fn test_status_restricts() {
        assert!(!FilterState::new().with_status(StatusFilter::Inactive).is_empty());
        assert_eq!(StatusFilter::Active.as_is_active(), Some(true));
        assert_eq!(StatusFilter::All.as_is_active(), None);
    }

    #[test]
    fn test_status_serde_lowercase() {
        let status: StatusFilter = serde_json::from_str("\"inactive\"").unwrap();
        assert_eq!(status, StatusFilter::Inactive);
        assert_eq!(serde_json::to_string(&StatusFilter::All).unwrap(), "\"all\"");
    }
}
