//! Client-side checks run before a commit leaves the grid

use crate::edit::PendingValue;
use crate::error::{GridError, GridResult};
use rust_decimal::Decimal;
use serde_json::Value;
use shared::models::fields;
use shared::{Product, ProductId};
use std::str::FromStr;

/// Validate a pending value and convert it into the JSON sent in the patch
///
/// `rows` is the loaded collection, used for uniqueness checks.
pub fn validate(
    field_id: &str,
    value: &PendingValue,
    row_id: &ProductId,
    rows: &[Product],
) -> GridResult<Value> {
    match value {
        PendingValue::Text(text) => {
            let text = text.trim();
            match field_id {
                fields::NAME if text.is_empty() => {
                    Err(GridError::validation(field_id, "name is required"))
                }
                fields::SKU => {
                    if text.is_empty() {
                        return Err(GridError::validation(field_id, "SKU is required"));
                    }
                    if sku_taken(text, row_id, rows) {
                        return Err(GridError::validation(
                            field_id,
                            format!("SKU {} is already in use", text),
                        ));
                    }
                    Ok(Value::String(text.to_string()))
                }
                _ => Ok(Value::String(text.to_string())),
            }
        }
        PendingValue::Number(raw) => {
            let raw = raw.trim();
            if raw.is_empty() {
                return if field_id == fields::PRICE {
                    Err(GridError::validation(field_id, "price is required"))
                } else {
                    Ok(Value::Null)
                };
            }
            let number = Decimal::from_str(raw)
                .or_else(|_| Decimal::from_scientific(raw))
                .map_err(|_| GridError::validation(field_id, format!("{:?} is not a number", raw)))?;
            if field_id == fields::PRICE && number.is_sign_negative() && !number.is_zero() {
                return Err(GridError::validation(field_id, "price cannot be negative"));
            }
            // Sent as a decimal string
            Ok(Value::String(number.normalize().to_string()))
        }
        PendingValue::Tags(tags) => {
            let mut out: Vec<String> = Vec::with_capacity(tags.len());
            for tag in tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
                if !out.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
                    out.push(tag.to_string());
                }
            }
            Ok(Value::Array(out.into_iter().map(Value::String).collect()))
        }
        PendingValue::Category(id) => Ok(id.map(Value::from).unwrap_or(Value::Null)),
        PendingValue::Toggle(on) => Ok(Value::Bool(*on)),
    }
}

fn sku_taken(sku: &str, row_id: &ProductId, rows: &[Product]) -> bool {
    rows.iter()
        .filter(|row| &row.id != row_id)
        .filter_map(Product::sku)
        .any(|other| other.trim().eq_ignore_ascii_case(sku))
}
