//! Category / family reference shapes and their normalization
//!
//! The API is inconsistent about how a product points at its category or
//! family: a bare numeric id, a nested object, or just a display name.
//! [`RawRef`] captures all three and [`RawRef::normalize`] turns any of
//! them into one [`NormalizedRef`]. When no reference data is loaded yet
//! the label is synthesized (`"Family 12"`) and flagged provisional; the
//! same call made after [`ReferenceIndex`] is populated yields the real
//! label.

use super::category::CategoryNode;
use super::family::Family;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Reference as it arrives on a product row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawRef {
    ById(i64),
    ByObject(RefObject),
    ByName(String),
}

/// Nested reference object (`{"id": 4, "name": "Shoes"}`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefObject {
    pub id: i64,
    #[serde(default, alias = "label", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl RefObject {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: Some(name.into()),
            code: None,
        }
    }
}

/// Which reference table a [`RawRef`] points into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefKind {
    Category,
    Family,
}

impl RefKind {
    /// Generic label used until richer data is available
    pub fn fallback_label(&self, id: i64) -> String {
        match self {
            RefKind::Category => format!("Category {}", id),
            RefKind::Family => format!("Family {}", id),
        }
    }
}

/// Uniform `{id, label}` shape used for display, filtering and options
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NormalizedRef {
    /// Unknown when the row only carried a display name we could not match
    pub id: Option<i64>,
    pub label: String,
    /// `true` while the label is synthesized and awaiting reference data
    #[serde(default)]
    pub provisional: bool,
}

impl NormalizedRef {
    /// Matches a filter value given either as id or as label
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.trim();
        match needle.parse::<i64>() {
            Ok(id) => self.id == Some(id),
            Err(_) => self.label.eq_ignore_ascii_case(needle),
        }
    }
}

impl RawRef {
    /// Resolve into the canonical shape, consulting `index` for labels
    pub fn normalize(&self, kind: RefKind, index: &ReferenceIndex) -> NormalizedRef {
        match self {
            RawRef::ById(id) => by_id(*id, kind, index),
            RawRef::ByObject(obj) => match obj.name.as_deref().map(str::trim) {
                Some(name) if !name.is_empty() => NormalizedRef {
                    id: Some(obj.id),
                    label: name.to_string(),
                    provisional: false,
                },
                _ => by_id(obj.id, kind, index),
            },
            RawRef::ByName(name) => {
                // Numeric strings are ids that lost their type on the way
                if let Ok(id) = name.trim().parse::<i64>() {
                    return by_id(id, kind, index);
                }
                NormalizedRef {
                    id: index.id_for_name(kind, name),
                    label: name.clone(),
                    provisional: false,
                }
            }
        }
    }

    /// The id, if the shape carries one
    pub fn id(&self) -> Option<i64> {
        match self {
            RawRef::ById(id) => Some(*id),
            RawRef::ByObject(obj) => Some(obj.id),
            RawRef::ByName(name) => name.trim().parse().ok(),
        }
    }
}

fn by_id(id: i64, kind: RefKind, index: &ReferenceIndex) -> NormalizedRef {
    match index.label_for(kind, id) {
        Some(label) => NormalizedRef {
            id: Some(id),
            label: label.to_string(),
            provisional: false,
        },
        None => NormalizedRef {
            id: Some(id),
            label: kind.fallback_label(id),
            provisional: true,
        },
    }
}

/// Lookup tables built from the reference endpoints
#[derive(Debug, Clone, Default)]
pub struct ReferenceIndex {
    labels: HashMap<(RefKind, i64), String>,
    /// Lower-cased name -> id
    names: HashMap<(RefKind, String), i64>,
}

impl ReferenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the category tree (every depth) and the family list
    pub fn build(categories: &[CategoryNode], families: &[Family]) -> Self {
        let mut index = Self::new();
        for node in categories.iter().flat_map(CategoryNode::walk) {
            index.insert(RefKind::Category, node.id, &node.name);
        }
        for family in families {
            index.insert(RefKind::Family, family.id, family.display_name());
        }
        index
    }

    pub fn insert(&mut self, kind: RefKind, id: i64, label: &str) {
        self.labels.insert((kind, id), label.to_string());
        self.names.insert((kind, label.to_lowercase()), id);
    }

    pub fn label_for(&self, kind: RefKind, id: i64) -> Option<&str> {
        self.labels.get(&(kind, id)).map(String::as_str)
    }

    pub fn id_for_name(&self, kind: RefKind, name: &str) -> Option<i64> {
        self.names.get(&(kind, name.trim().to_lowercase())).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn index() -> ReferenceIndex {
        let mut index = ReferenceIndex::new();
        index.insert(RefKind::Family, 12, "Footwear");
        index.insert(RefKind::Category, 4, "Shoes");
        index
    }

    #[test]
    fn test_deserialize_shapes() {
        let by_id: RawRef = serde_json::from_value(json!(12)).unwrap();
        let by_obj: RawRef = serde_json::from_value(json!({"id": 12, "label": "Footwear"})).unwrap();
        let by_name: RawRef = serde_json::from_value(json!("Footwear")).unwrap();

        assert_eq!(by_id, RawRef::ById(12));
        assert_eq!(by_obj, RawRef::ByObject(RefObject::new(12, "Footwear")));
        assert_eq!(by_name, RawRef::ByName("Footwear".into()));
    }

    #[test]
    fn test_all_shapes_normalize_to_same_ref() {
        let index = index();
        let expected = NormalizedRef {
            id: Some(12),
            label: "Footwear".into(),
            provisional: false,
        };

        for raw in [
            RawRef::ById(12),
            RawRef::ByObject(RefObject::new(12, "Footwear")),
            RawRef::ByName("Footwear".into()),
            RawRef::ByName("12".into()),
        ] {
            assert_eq!(raw.normalize(RefKind::Family, &index), expected);
        }
    }

    #[test]
    fn test_fallback_label_then_upgrade() {
        let raw = RawRef::ById(12);

        let before = raw.normalize(RefKind::Family, &ReferenceIndex::new());
        assert_eq!(before.label, "Family 12");
        assert!(before.provisional);

        let after = raw.normalize(RefKind::Family, &index());
        assert_eq!(after.label, "Footwear");
        assert!(!after.provisional);
    }

    #[test]
    fn test_object_without_name_uses_index() {
        let raw: RawRef = serde_json::from_value(json!({"id": 4})).unwrap();
        assert_eq!(raw.normalize(RefKind::Category, &index()).label, "Shoes");
        assert_eq!(
            raw.normalize(RefKind::Category, &ReferenceIndex::new()).label,
            "Category 4"
        );
    }

    #[test]
    fn test_unknown_name_keeps_label_without_id() {
        let raw = RawRef::ByName("Accessories".into());
        let norm = raw.normalize(RefKind::Category, &index());
        assert_eq!(norm.id, None);
        assert_eq!(norm.label, "Accessories");
        assert!(!norm.provisional);
    }

    #[test]
    fn test_matches_id_or_label() {
        let norm = RawRef::ById(4).normalize(RefKind::Category, &index());
        assert!(norm.matches("4"));
        assert!(norm.matches("shoes"));
        assert!(!norm.matches("5"));
    }
}
