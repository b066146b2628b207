//! Attribute Group Model

use serde::{Deserialize, Serialize};

/// Attribute group entity (a named bundle of attributes used by families)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeGroup {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub sort_order: i32,
    /// Attribute codes in this group
    #[serde(default)]
    pub attributes: Vec<String>,
}
