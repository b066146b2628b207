//! Filter options derived from the loaded rows
//!
//! Pure derivation over what is already in memory; never fetches.

use parking_lot::Mutex;
use shared::{NormalizedRef, Product, RefKind, ReferenceIndex};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Distinct values present in the loaded collection, sorted for display
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DerivedOptions {
    pub categories: Vec<NormalizedRef>,
    pub tags: Vec<String>,
    pub brands: Vec<String>,
}

pub fn derive_options(rows: &[Product], index: &ReferenceIndex) -> DerivedOptions {
    // (lowercased label, id) -> ref; case-insensitive dedup and order
    let mut categories: BTreeMap<(String, Option<i64>), NormalizedRef> = BTreeMap::new();
    let mut tags: BTreeMap<String, String> = BTreeMap::new();
    let mut brands: BTreeMap<String, String> = BTreeMap::new();

    for row in rows {
        if let Some(raw) = &row.category {
            let norm = raw.normalize(RefKind::Category, index);
            categories
                .entry((norm.label.to_lowercase(), norm.id))
                .or_insert(norm);
        }
        for tag in row.tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
            tags.entry(tag.to_lowercase())
                .or_insert_with(|| tag.to_string());
        }
        if let Some(brand) = row.brand().map(str::trim).filter(|b| !b.is_empty()) {
            brands
                .entry(brand.to_lowercase())
                .or_insert_with(|| brand.to_string());
        }
    }

    DerivedOptions {
        categories: categories.into_values().collect(),
        tags: tags.into_values().collect(),
        brands: brands.into_values().collect(),
    }
}

/// Memoized [`derive_options`]
///
/// Recomputes when the row snapshot or the reference index changes;
/// snapshots are compared by pointer since the row store swaps whole
/// vectors on every write.
#[derive(Debug, Default)]
pub struct OptionIndex {
    memo: Mutex<Option<Memo>>,
}

#[derive(Debug)]
struct Memo {
    rows: Arc<Vec<Product>>,
    index: Arc<ReferenceIndex>,
    options: Arc<DerivedOptions>,
}

impl OptionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, rows: &Arc<Vec<Product>>, index: &Arc<ReferenceIndex>) -> Arc<DerivedOptions> {
        let mut memo = self.memo.lock();
        if let Some(m) = memo.as_ref()
            && Arc::ptr_eq(&m.rows, rows)
            && Arc::ptr_eq(&m.index, index)
        {
            return m.options.clone();
        }

        let options = Arc::new(derive_options(rows, index));
        *memo = Some(Memo {
            rows: rows.clone(),
            index: index.clone(),
            options: options.clone(),
        });
        options
    }
}
