//! Column / field registry
//!
//! One [`FieldDescriptor`] per column: how to pull a display value out of a
//! row, how the cell is edited, and whether the column sorts and filters.
//! Filtering here is the client-side pass over already-loaded rows; the
//! server receives the same [`FilterState`] as query parameters.

use crate::edit::EditorKind;
use crate::error::{GridError, GridResult};
use rust_decimal::Decimal;
use shared::models::{decimal_from_value, fields};
use shared::query::{filter_params, keys};
use shared::{
    CategoryNode, FilterState, NormalizedRef, Product, RefKind, ReferenceIndex, SortDirection,
    SortSpec,
};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// How a cell is edited
#[derive(Debug, Clone, PartialEq)]
pub enum EditAffordance {
    /// Read-only
    None,
    Text,
    Number,
    /// Tag picker over the known tag names
    MultiSelect { options: Vec<String> },
    /// Category picker over the category tree
    TreeSelect { tree: Vec<CategoryNode> },
    Toggle,
}

impl EditAffordance {
    pub fn is_editable(&self) -> bool {
        !matches!(self, EditAffordance::None)
    }

    pub fn editor_kind(&self) -> Option<EditorKind> {
        match self {
            EditAffordance::None => None,
            EditAffordance::Text => Some(EditorKind::Text),
            EditAffordance::Number => Some(EditorKind::Number),
            EditAffordance::MultiSelect { .. } => Some(EditorKind::MultiSelect),
            EditAffordance::TreeSelect { .. } => Some(EditorKind::TreeSelect),
            EditAffordance::Toggle => Some(EditorKind::Toggle),
        }
    }
}

/// Cell value as the render layer shows it
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayValue {
    Empty,
    Text(String),
    Number(Decimal),
    Bool(bool),
    Tags(Vec<String>),
    Ref(NormalizedRef),
}

impl DisplayValue {
    pub fn is_empty(&self) -> bool {
        match self {
            DisplayValue::Empty => true,
            DisplayValue::Tags(tags) => tags.is_empty(),
            _ => false,
        }
    }

    /// Ordering used for column sorting
    fn compare(&self, other: &Self) -> Ordering {
        use DisplayValue::*;
        match (self, other) {
            (Number(a), Number(b)) => a.cmp(b),
            (Bool(a), Bool(b)) => a.cmp(b),
            (Text(a), Text(b)) => cmp_ci(a, b),
            (Ref(a), Ref(b)) => cmp_ci(&a.label, &b.label),
            (Tags(a), Tags(b)) => cmp_ci(&a.join(","), &b.join(",")),
            (a, b) => cmp_ci(&a.to_string(), &b.to_string()),
        }
    }
}

fn cmp_ci(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

impl fmt::Display for DisplayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayValue::Empty => Ok(()),
            DisplayValue::Text(s) => f.write_str(s),
            DisplayValue::Number(n) => write!(f, "{}", n),
            DisplayValue::Bool(true) => f.write_str("Active"),
            DisplayValue::Bool(false) => f.write_str("Inactive"),
            DisplayValue::Tags(tags) => f.write_str(&tags.join(", ")),
            DisplayValue::Ref(r) => f.write_str(&r.label),
        }
    }
}

/// Value a column predicate is evaluated against
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// Case-insensitive substring
    Contains(String),
    /// Case-insensitive equality
    Exact(String),
    Status(bool),
    /// Every tag must be present (AND)
    Tags(Vec<String>),
    /// Inclusive bounds; rows without a value never match
    Range {
        min: Option<Decimal>,
        max: Option<Decimal>,
    },
    /// Id or label
    Ref(String),
    /// ISO-8601 prefixes, inclusive
    DateRange {
        after: Option<String>,
        before: Option<String>,
    },
}

pub type Extractor = fn(&Product, &str, &ReferenceIndex) -> DisplayValue;
pub type FilterPredicate = fn(&DisplayValue, &FilterValue) -> bool;

/// Static metadata for one column
#[derive(Clone)]
pub struct FieldDescriptor {
    pub id: &'static str,
    pub label: String,
    pub sortable: bool,
    pub affordance: EditAffordance,
    extract: Extractor,
    predicate: Option<FilterPredicate>,
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("sortable", &self.sortable)
            .field("filterable", &self.filterable())
            .field("affordance", &self.affordance)
            .finish()
    }
}

impl FieldDescriptor {
    pub fn new(id: &'static str, label: impl Into<String>, extract: Extractor) -> Self {
        Self {
            id,
            label: label.into(),
            sortable: false,
            affordance: EditAffordance::None,
            extract,
            predicate: None,
        }
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub fn editable(mut self, affordance: EditAffordance) -> Self {
        self.affordance = affordance;
        self
    }

    pub fn filter_with(mut self, predicate: FilterPredicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    pub fn filterable(&self) -> bool {
        self.predicate.is_some()
    }

    pub fn extract(&self, row: &Product, index: &ReferenceIndex) -> DisplayValue {
        (self.extract)(row, self.id, index)
    }

    /// Client-side predicate; columns that don't filter accept every row
    pub fn matches(&self, row: &Product, value: &FilterValue, index: &ReferenceIndex) -> bool {
        match self.predicate {
            Some(predicate) => predicate(&self.extract(row, index), value),
            None => true,
        }
    }
}

// ============================================================================
// Extractors
// ============================================================================

fn extract_id(row: &Product, _field: &str, _index: &ReferenceIndex) -> DisplayValue {
    DisplayValue::Text(row.id.to_string())
}

fn extract_text(row: &Product, field: &str, _index: &ReferenceIndex) -> DisplayValue {
    match row.value(field) {
        serde_json::Value::Null => DisplayValue::Empty,
        serde_json::Value::String(s) if s.is_empty() => DisplayValue::Empty,
        serde_json::Value::String(s) => DisplayValue::Text(s),
        other => DisplayValue::Text(other.to_string()),
    }
}

fn extract_number(row: &Product, field: &str, _index: &ReferenceIndex) -> DisplayValue {
    decimal_from_value(&row.value(field))
        .map(DisplayValue::Number)
        .unwrap_or(DisplayValue::Empty)
}

fn extract_active(row: &Product, _field: &str, _index: &ReferenceIndex) -> DisplayValue {
    DisplayValue::Bool(row.is_active())
}

fn extract_tags(row: &Product, _field: &str, _index: &ReferenceIndex) -> DisplayValue {
    DisplayValue::Tags(row.tags.clone())
}

fn extract_category(row: &Product, _field: &str, index: &ReferenceIndex) -> DisplayValue {
    row.category
        .as_ref()
        .map(|r| DisplayValue::Ref(r.normalize(RefKind::Category, index)))
        .unwrap_or(DisplayValue::Empty)
}

fn extract_family(row: &Product, _field: &str, index: &ReferenceIndex) -> DisplayValue {
    row.family
        .as_ref()
        .map(|r| DisplayValue::Ref(r.normalize(RefKind::Family, index)))
        .unwrap_or(DisplayValue::Empty)
}

// ============================================================================
// Predicates
// ============================================================================

fn match_text(value: &DisplayValue, filter: &FilterValue) -> bool {
    let haystack = value.to_string().to_lowercase();
    match filter {
        FilterValue::Contains(needle) => haystack.contains(&needle.trim().to_lowercase()),
        FilterValue::Exact(needle) => haystack == needle.trim().to_lowercase(),
        _ => true,
    }
}

fn match_status(value: &DisplayValue, filter: &FilterValue) -> bool {
    match (value, filter) {
        (DisplayValue::Bool(active), FilterValue::Status(wanted)) => active == wanted,
        (_, FilterValue::Status(_)) => false,
        _ => true,
    }
}

fn match_tags(value: &DisplayValue, filter: &FilterValue) -> bool {
    let FilterValue::Tags(wanted) = filter else {
        return true;
    };
    let have: &[String] = match value {
        DisplayValue::Tags(tags) => tags,
        _ => &[],
    };
    wanted
        .iter()
        .all(|w| have.iter().any(|h| h.eq_ignore_ascii_case(w.trim())))
}

fn match_range(value: &DisplayValue, filter: &FilterValue) -> bool {
    let FilterValue::Range { min, max } = filter else {
        return true;
    };
    let DisplayValue::Number(n) = value else {
        return min.is_none() && max.is_none();
    };
    min.is_none_or(|min| *n >= min) && max.is_none_or(|max| *n <= max)
}

fn match_ref(value: &DisplayValue, filter: &FilterValue) -> bool {
    match (value, filter) {
        (DisplayValue::Ref(r), FilterValue::Ref(needle)) => r.matches(needle),
        (_, FilterValue::Ref(_)) => false,
        _ => true,
    }
}

fn match_date(value: &DisplayValue, filter: &FilterValue) -> bool {
    let FilterValue::DateRange { after, before } = filter else {
        return true;
    };
    let DisplayValue::Text(stamp) = value else {
        return after.is_none() && before.is_none();
    };
    let prefix = |bound: &str| stamp.get(..bound.len()).unwrap_or(stamp.as_str()).to_string();
    after.as_deref().is_none_or(|a| prefix(a).as_str() >= a)
        && before.as_deref().is_none_or(|b| prefix(b).as_str() <= b)
}

// ============================================================================
// Registry
// ============================================================================

/// Ordered column set of the product grid
#[derive(Debug, Clone)]
pub struct FieldRegistry {
    fields: Vec<FieldDescriptor>,
}

impl FieldRegistry {
    pub fn new(fields: Vec<FieldDescriptor>) -> Self {
        Self { fields }
    }

    /// Default product columns
    pub fn products() -> Self {
        Self::new(vec![
            FieldDescriptor::new(fields::ID, "ID", extract_id).sortable(),
            FieldDescriptor::new(fields::NAME, "Name", extract_text)
                .sortable()
                .editable(EditAffordance::Text)
                .filter_with(match_text),
            FieldDescriptor::new(fields::SKU, "SKU", extract_text)
                .sortable()
                .editable(EditAffordance::Text)
                .filter_with(match_text),
            FieldDescriptor::new(fields::BARCODE, "Barcode", extract_text)
                .editable(EditAffordance::Text)
                .filter_with(match_text),
            FieldDescriptor::new(fields::BRAND, "Brand", extract_text)
                .sortable()
                .editable(EditAffordance::Text)
                .filter_with(match_text),
            FieldDescriptor::new(fields::PRICE, "Price", extract_number)
                .sortable()
                .editable(EditAffordance::Number)
                .filter_with(match_range),
            FieldDescriptor::new(fields::IS_ACTIVE, "Status", extract_active)
                .sortable()
                .editable(EditAffordance::Toggle)
                .filter_with(match_status),
            FieldDescriptor::new(fields::TAGS, "Tags", extract_tags)
                .editable(EditAffordance::MultiSelect {
                    options: Vec::new(),
                })
                .filter_with(match_tags),
            FieldDescriptor::new(fields::CATEGORY, "Category", extract_category)
                .sortable()
                .editable(EditAffordance::TreeSelect { tree: Vec::new() })
                .filter_with(match_ref),
            FieldDescriptor::new(fields::FAMILY, "Family", extract_family)
                .sortable()
                .filter_with(match_ref),
            FieldDescriptor::new(fields::CREATED_AT, "Created", extract_text)
                .sortable()
                .filter_with(match_date),
            FieldDescriptor::new(fields::UPDATED_AT, "Updated", extract_text)
                .sortable()
                .filter_with(match_date),
        ])
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn get(&self, id: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn require(&self, id: &str) -> GridResult<&FieldDescriptor> {
        self.get(id).ok_or_else(|| GridError::UnknownField(id.to_string()))
    }

    /// Refresh picker options once reference data is known
    pub fn set_options(&mut self, tag_options: Vec<String>, category_tree: Vec<CategoryNode>) {
        for field in &mut self.fields {
            match &mut field.affordance {
                EditAffordance::MultiSelect { options } => *options = tag_options.clone(),
                EditAffordance::TreeSelect { tree } => *tree = category_tree.clone(),
                _ => {}
            }
        }
    }

    pub fn with_options(mut self, tag_options: Vec<String>, category_tree: Vec<CategoryNode>) -> Self {
        self.set_options(tag_options, category_tree);
        self
    }

    /// Reject sorting on unknown or non-sortable columns
    pub fn check_sort(&self, sort: &SortSpec) -> GridResult<()> {
        let field = self.require(&sort.field)?;
        if !field.sortable {
            return Err(GridError::validation(&sort.field, "column is not sortable"));
        }
        Ok(())
    }

    /// Per-column predicates implied by a filter state
    pub fn criteria(&self, filter: &FilterState) -> Vec<(&'static str, FilterValue)> {
        let params = filter_params(filter);
        let text = |key: &str| params.get(key).map(str::to_string);
        let mut out = Vec::new();

        if let Some(category) = text(keys::CATEGORY) {
            out.push((fields::CATEGORY, FilterValue::Ref(category)));
        }
        if let Some(active) = params.get(keys::IS_ACTIVE) {
            out.push((fields::IS_ACTIVE, FilterValue::Status(active == "true")));
        }

        // Unparsable bounds are the server's problem; locally they don't restrict
        let bound = |key: &str| params.get(key).and_then(|v| Decimal::from_str(v.trim()).ok());
        let (min, max) = (bound(keys::MIN_PRICE), bound(keys::MAX_PRICE));
        if min.is_some() || max.is_some() {
            out.push((fields::PRICE, FilterValue::Range { min, max }));
        }

        if let Some(tags) = params.get(keys::TAGS) {
            let tags = tags.split(',').map(str::to_string).collect();
            out.push((fields::TAGS, FilterValue::Tags(tags)));
        }

        let (after, before) = (text(keys::CREATED_AFTER), text(keys::CREATED_BEFORE));
        if after.is_some() || before.is_some() {
            out.push((fields::CREATED_AT, FilterValue::DateRange { after, before }));
        }
        let (after, before) = (text(keys::UPDATED_AFTER), text(keys::UPDATED_BEFORE));
        if after.is_some() || before.is_some() {
            out.push((fields::UPDATED_AT, FilterValue::DateRange { after, before }));
        }

        if let Some(family) = text(keys::FAMILY) {
            out.push((fields::FAMILY, FilterValue::Ref(family)));
        }
        if let Some(brand) = text(keys::BRAND) {
            out.push((fields::BRAND, FilterValue::Exact(brand)));
        }
        for (key, field) in [
            (keys::BARCODE, fields::BARCODE),
            (keys::SKU, fields::SKU),
            (keys::NAME, fields::NAME),
        ] {
            if let Some(value) = text(key) {
                out.push((field, FilterValue::Contains(value)));
            }
        }
        out
    }

    /// Free-text search over name, SKU and barcode
    fn matches_search(&self, row: &Product, needle: &str, index: &ReferenceIndex) -> bool {
        let needle = FilterValue::Contains(needle.to_string());
        [fields::NAME, fields::SKU, fields::BARCODE]
            .iter()
            .filter_map(|id| self.get(id))
            .any(|field| match_text(&field.extract(row, index), &needle))
    }

    /// Rows of `rows` satisfying every predicate of `filter`
    pub fn filter_rows(
        &self,
        rows: &[Product],
        filter: &FilterState,
        index: &ReferenceIndex,
    ) -> Vec<Product> {
        let criteria = self.criteria(filter);
        let search = filter_params(filter).get(keys::SEARCH).map(str::to_string);

        rows.iter()
            .filter(|row| {
                search
                    .as_deref()
                    .is_none_or(|s| self.matches_search(row, s, index))
            })
            .filter(|row| {
                criteria.iter().all(|(field, value)| {
                    self.get(field)
                        .is_none_or(|descriptor| descriptor.matches(row, value, index))
                })
            })
            .cloned()
            .collect()
    }

    /// Stable sort by the column's display value; empty cells sort last
    pub fn sort_rows(
        &self,
        rows: &mut [Product],
        sort: &SortSpec,
        index: &ReferenceIndex,
    ) -> GridResult<()> {
        self.check_sort(sort)?;
        let field = self.require(&sort.field)?;

        let mut keyed: Vec<(DisplayValue, Product)> = rows
            .iter()
            .map(|row| (field.extract(row, index), row.clone()))
            .collect();
        keyed.sort_by(|(a, _), (b, _)| match (a.is_empty(), b.is_empty()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => match sort.direction {
                SortDirection::Asc => a.compare(b),
                SortDirection::Desc => b.compare(a),
            },
        });

        for (slot, (_, row)) in rows.iter_mut().zip(keyed) {
            *slot = row;
        }
        Ok(())
    }
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::products()
    }
}
