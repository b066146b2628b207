//! Product Model

use super::reference::RawRef;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Well-known product field ids
pub mod fields {
    pub const ID: &str = "id";
    pub const NAME: &str = "name";
    pub const SKU: &str = "sku";
    pub const BARCODE: &str = "barcode";
    pub const BRAND: &str = "brand";
    pub const PRICE: &str = "price";
    pub const IS_ACTIVE: &str = "is_active";
    pub const TAGS: &str = "tags";
    pub const CATEGORY: &str = "category";
    pub const FAMILY: &str = "family";
    pub const CREATED_AT: &str = "created_at";
    pub const UPDATED_AT: &str = "updated_at";
}

/// Opaque product identifier
///
/// Some deployments hand out numeric ids and others strings; both are
/// kept in their string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<i64> for ProductId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for ProductId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Num(i64),
            Str(String),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Num(n) => Self(n.to_string()),
            Repr::Str(s) => Self(s),
        })
    }
}

/// Product row as listed by `GET /products`
///
/// Category, family and tags get dedicated slots because they arrive in
/// several shapes; every other column lives in `fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    /// Last-modified marker, only ever compared for equality
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<RawRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<RawRef>,
    /// Tag names
    #[serde(default, deserialize_with = "tag_names")]
    pub tags: Vec<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Tags arrive either as plain names or as `{id, name, ...}` objects
fn tag_names<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TagRepr {
        Name(String),
        Object { name: String },
    }

    let raw = Option::<Vec<TagRepr>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|t| match t {
            TagRepr::Name(name) | TagRepr::Object { name } => name,
        })
        .collect())
}

impl Product {
    pub fn new(id: impl Into<ProductId>) -> Self {
        Self {
            id: id.into(),
            updated_at: None,
            category: None,
            family: None,
            tags: Vec::new(),
            fields: Map::new(),
        }
    }

    /// Builder-style field setter (for fixtures and provisional rows)
    pub fn with_field(mut self, field_id: &str, value: impl Into<Value>) -> Self {
        if let Err(e) = self.set_value(field_id, value.into()) {
            tracing::warn!(field = field_id, error = %e, "Ignoring invalid field value");
        }
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

    pub fn with_category(mut self, category: RawRef) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_family(mut self, family: RawRef) -> Self {
        self.family = Some(family);
        self
    }

    /// Current value of a field as JSON (`Null` when absent)
    pub fn value(&self, field_id: &str) -> Value {
        match field_id {
            fields::ID => Value::String(self.id.to_string()),
            fields::UPDATED_AT => self
                .updated_at
                .clone()
                .map(Value::String)
                .unwrap_or(Value::Null),
            fields::TAGS => Value::Array(self.tags.iter().cloned().map(Value::String).collect()),
            fields::CATEGORY => ref_value(self.category.as_ref()),
            fields::FAMILY => ref_value(self.family.as_ref()),
            other => self.fields.get(other).cloned().unwrap_or(Value::Null),
        }
    }

    /// Overwrite a single field in place
    pub fn set_value(&mut self, field_id: &str, value: Value) -> Result<(), serde_json::Error> {
        match field_id {
            fields::ID => {
                return Err(<serde_json::Error as serde::de::Error>::custom(
                    "product id is immutable",
                ));
            }
            fields::UPDATED_AT => self.updated_at = serde_json::from_value(value)?,
            fields::TAGS => {
                self.tags = serde_json::from_value::<Option<Vec<String>>>(value)?.unwrap_or_default()
            }
            fields::CATEGORY => self.category = serde_json::from_value(value)?,
            fields::FAMILY => self.family = serde_json::from_value(value)?,
            other => {
                self.fields.insert(other.to_string(), value);
            }
        }
        Ok(())
    }

    /// Copy of this row carrying `value` at `field_id`
    pub fn with_value(&self, field_id: &str, value: Value) -> Result<Product, serde_json::Error> {
        let mut next = self.clone();
        next.set_value(field_id, value)?;
        Ok(next)
    }

    /// String value of a plain field
    pub fn text(&self, field_id: &str) -> Option<&str> {
        self.fields.get(field_id).and_then(Value::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.text(fields::NAME)
    }

    pub fn sku(&self) -> Option<&str> {
        self.text(fields::SKU)
    }

    pub fn brand(&self) -> Option<&str> {
        self.text(fields::BRAND)
    }

    /// Rows without an explicit flag are treated as active
    pub fn is_active(&self) -> bool {
        self.fields
            .get(fields::IS_ACTIVE)
            .and_then(Value::as_bool)
            .unwrap_or(true)
    }

    pub fn price(&self) -> Option<Decimal> {
        self.fields.get(fields::PRICE).and_then(decimal_from_value)
    }
}

fn ref_value(raw: Option<&RawRef>) -> Value {
    raw.and_then(|r| serde_json::to_value(r).ok())
        .unwrap_or(Value::Null)
}

/// Decimal from a JSON string (`"12.50"`) or number (`12.5`)
pub fn decimal_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        _ => None,
    }
}

/// Partial update payload for `PATCH /products/{id}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductPatch(Map<String, Value>);

impl ProductPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Patch touching exactly one field
    pub fn single(field_id: impl Into<String>, value: Value) -> Self {
        Self::new().set(field_id, value)
    }

    pub fn set(mut self, field_id: impl Into<String>, value: Value) -> Self {
        self.0.insert(field_id.into(), value);
        self
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Apply this patch to a copy of `product`
    pub fn apply_to(&self, product: &Product) -> Result<Product, serde_json::Error> {
        let mut next = product.clone();
        for (field, value) in &self.0 {
            next.set_value(field, value.clone())?;
        }
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RefObject;
    use serde_json::json;

    #[test]
    fn test_deserialize_heterogeneous_row() {
        let row: Product = serde_json::from_value(json!({
            "id": 17,
            "name": "Trail Runner",
            "sku": "TR-17",
            "price": "89.90",
            "is_active": false,
            "updated_at": "2024-05-01T10:00:00Z",
            "category": {"id": 4, "name": "Shoes"},
            "family": "Footwear",
            "tags": ["outdoor", {"id": 9, "name": "sale", "color": "#f00"}]
        }))
        .unwrap();

        assert_eq!(row.id.as_str(), "17");
        assert_eq!(row.name(), Some("Trail Runner"));
        assert!(!row.is_active());
        assert_eq!(row.price(), Some(Decimal::from_str("89.90").unwrap()));
        assert_eq!(row.tags, vec!["outdoor", "sale"]);
        assert_eq!(
            row.category,
            Some(RawRef::ByObject(RefObject::new(4, "Shoes")))
        );
        assert_eq!(row.family, Some(RawRef::ByName("Footwear".into())));
        assert!(!row.fields.contains_key("tags"));
        assert!(!row.fields.contains_key("category"));
    }

    #[test]
    fn test_null_tags_and_missing_refs() {
        let row: Product = serde_json::from_value(json!({"id": "p-1", "tags": null})).unwrap();
        assert!(row.tags.is_empty());
        assert!(row.category.is_none());
        assert!(row.family.is_none());
        assert!(row.is_active());
    }

    #[test]
    fn test_with_value_leaves_original_untouched() {
        let row = Product::new("1").with_field("name", "Old");
        let next = row.with_value("name", json!("New")).unwrap();

        assert_eq!(row.name(), Some("Old"));
        assert_eq!(next.name(), Some("New"));
    }

    #[test]
    fn test_with_value_dedicated_slots() {
        let row = Product::new("1");
        let next = row
            .with_value("tags", json!(["a", "b"]))
            .unwrap()
            .with_value("category", json!(12))
            .unwrap()
            .with_value("family", Value::Null)
            .unwrap();

        assert_eq!(next.tags, vec!["a", "b"]);
        assert_eq!(next.category, Some(RawRef::ById(12)));
        assert_eq!(next.value("tags"), json!(["a", "b"]));
        assert_eq!(next.value("category"), json!(12));
        assert_eq!(next.value("family"), Value::Null);
    }

    #[test]
    fn test_id_is_immutable() {
        let row = Product::new("1");
        assert!(row.with_value("id", json!("2")).is_err());
    }

    #[test]
    fn test_numeric_price() {
        let row = Product::new("1").with_field("price", 12.5);
        assert_eq!(row.price(), Some(Decimal::from_str("12.5").unwrap()));
        assert_eq!(decimal_from_value(&json!("abc")), None);
        assert_eq!(decimal_from_value(&json!(true)), None);
    }

    #[test]
    fn test_patch_apply() {
        let row = Product::new("1").with_field("name", "A").with_tags(["x"]);
        let patch = ProductPatch::single("name", json!("B")).set("tags", json!([]));
        let next = patch.apply_to(&row).unwrap();

        assert_eq!(next.name(), Some("B"));
        assert!(next.tags.is_empty());
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            json!({"name": "B", "tags": []})
        );
    }
}
