//! Reference data (categories, tags, families, attribute groups, brands)
//!
//! Loaded in the background after the first page. Until it arrives, rows
//! that point at a category or family by bare id display a synthesized
//! label; once [`ReferenceResolver::load`] completes, the next
//! normalization pass picks up the real names.

use crate::api::CatalogApi;
use crate::error::{ClientError, ClientResult};
use parking_lot::RwLock;
use shared::{AttributeGroup, Brand, CategoryNode, Family, ReferenceIndex, Tag};
use std::sync::Arc;

/// Organization-wide option lists
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    pub categories: Vec<CategoryNode>,
    pub tags: Vec<Tag>,
    pub families: Vec<Family>,
    pub attribute_groups: Vec<AttributeGroup>,
    pub brands: Vec<Brand>,
}

impl ReferenceData {
    pub fn tag_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tags.iter().map(|t| t.name.clone()).collect();
        names.sort_by_key(|n| n.to_lowercase());
        names.dedup();
        names
    }

    pub fn brand_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.brands.iter().map(|b| b.name.clone()).collect();
        names.sort_by_key(|n| n.to_lowercase());
        names.dedup();
        names
    }
}

pub struct ReferenceResolver {
    api: Arc<dyn CatalogApi>,
    data: RwLock<Arc<ReferenceData>>,
    index: RwLock<Arc<ReferenceIndex>>,
}

impl ReferenceResolver {
    pub fn new(api: Arc<dyn CatalogApi>) -> Self {
        Self {
            api,
            data: RwLock::new(Arc::new(ReferenceData::default())),
            index: RwLock::new(Arc::new(ReferenceIndex::new())),
        }
    }

    pub fn data(&self) -> Arc<ReferenceData> {
        self.data.read().clone()
    }

    /// Current label index; empty until the first successful load
    pub fn index(&self) -> Arc<ReferenceIndex> {
        self.index.read().clone()
    }

    pub fn is_loaded(&self) -> bool {
        !self.index.read().is_empty()
    }

    /// Fetch every reference list concurrently
    ///
    /// Lists that load are applied even when others fail; the first
    /// failure is returned after the partial update.
    pub async fn load(&self) -> ClientResult<Arc<ReferenceData>> {
        let (categories, tags, families, attribute_groups, brands) = futures::join!(
            self.api.categories(),
            self.api.tags(),
            self.api.families(),
            self.api.attribute_groups(),
            self.api.brands(),
        );

        let mut next = self.data().as_ref().clone();
        let mut first_error: Option<ClientError> = None;
        let mut keep = |name: &str, result: ClientResult<()>| {
            if let Err(e) = result {
                tracing::warn!(list = name, error = %e, "Reference list failed to load");
                first_error.get_or_insert(e);
            }
        };

        keep("categories", categories.map(|v| next.categories = v));
        keep("tags", tags.map(|v| next.tags = v));
        keep("families", families.map(|v| next.families = v));
        keep("attribute_groups", attribute_groups.map(|v| next.attribute_groups = v));
        keep("brands", brands.map(|v| next.brands = v));

        let index = ReferenceIndex::build(&next.categories, &next.families);
        tracing::info!(
            categories = next.categories.len(),
            tags = next.tags.len(),
            families = next.families.len(),
            labels = index.len(),
            "Reference data loaded"
        );

        let next = Arc::new(next);
        *self.data.write() = next.clone();
        *self.index.write() = Arc::new(index);

        match first_error {
            Some(e) => Err(e),
            None => Ok(next),
        }
    }
}
