//! In-memory row collection
//!
//! Readers get an `Arc<Vec<Product>>` snapshot. Writers (fetch
//! reconciliation and optimistic edits) build a new vector and swap it in
//! under the write lock, so a snapshot is never observed half-updated.

use parking_lot::RwLock;
use shared::{Product, ProductId};
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct RowStore {
    inner: Arc<RwLock<Arc<Vec<Product>>>>,
}

impl RowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current collection; cheap to clone and never changes underneath the caller
    pub fn snapshot(&self) -> Arc<Vec<Product>> {
        self.inner.read().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Product> {
        self.inner.read().get(index).cloned()
    }

    pub fn find(&self, id: &ProductId) -> Option<(usize, Product)> {
        let rows = self.inner.read();
        rows.iter()
            .position(|p| &p.id == id)
            .map(|i| (i, rows[i].clone()))
    }

    /// Replace the whole collection (first page, new filter, refresh)
    pub fn replace_all(&self, rows: Vec<Product>) {
        *self.inner.write() = Arc::new(rows);
    }

    /// Append a further page; rows already present (shifted by concurrent
    /// writes on the server) are skipped. Returns how many were added.
    pub fn append(&self, rows: Vec<Product>) -> usize {
        let mut guard = self.inner.write();
        let seen: HashSet<&ProductId> = guard.iter().map(|p| &p.id).collect();
        let fresh: Vec<Product> = rows.into_iter().filter(|p| !seen.contains(&p.id)).collect();
        let added = fresh.len();
        if added > 0 {
            let mut next = Vec::with_capacity(guard.len() + added);
            next.extend(guard.iter().cloned());
            next.extend(fresh);
            *guard = Arc::new(next);
        }
        added
    }

    /// Replace the row with `id` by `f(current)`, atomically
    pub fn update_row<F>(&self, id: &ProductId, f: F) -> Option<Product>
    where
        F: FnOnce(&Product) -> Product,
    {
        let mut guard = self.inner.write();
        let index = guard.iter().position(|p| &p.id == id)?;
        let mut next: Vec<Product> = (**guard).clone();
        let replacement = f(&next[index]);
        let previous = std::mem::replace(&mut next[index], replacement);
        *guard = Arc::new(next);
        Some(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<Product> {
        vec![
            Product::new("1").with_field("name", "A"),
            Product::new("2").with_field("name", "B"),
        ]
    }

    #[test]
    fn test_snapshot_is_isolated_from_writes() {
        let store = RowStore::new();
        store.replace_all(rows());
        let before = store.snapshot();

        store.update_row(&ProductId::new("1"), |p| p.clone().with_field("name", "Z"));

        assert_eq!(before[0].name(), Some("A"));
        assert_eq!(store.snapshot()[0].name(), Some("Z"));
    }

    #[test]
    fn test_update_row_returns_previous() {
        let store = RowStore::new();
        store.replace_all(rows());

        let prev = store.update_row(&ProductId::new("2"), |p| p.clone().with_field("name", "C"));
        assert_eq!(prev.and_then(|p| p.name().map(str::to_string)), Some("B".into()));
        assert_eq!(store.snapshot()[1].name(), Some("C"));
        assert!(store.update_row(&ProductId::new("9"), Product::clone).is_none());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_append_skips_known_ids() {
        let store = RowStore::new();
        store.replace_all(rows());

        let added = store.append(vec![Product::new("2"), Product::new("3")]);

        assert_eq!(added, 1);
        let ids: Vec<_> = store.snapshot().iter().map(|p| p.id.to_string()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_find_and_get() {
        let store = RowStore::new();
        store.replace_all(rows());

        let (index, row) = store.find(&ProductId::new("2")).unwrap();
        assert_eq!(index, 1);
        assert_eq!(row.name(), Some("B"));
        assert_eq!(store.get(0).unwrap().id.as_str(), "1");
        assert!(store.get(5).is_none());
    }
}
