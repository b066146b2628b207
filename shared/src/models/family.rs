//! Family Model

use serde::{Deserialize, Serialize};

/// Family entity: a named attribute template products can belong to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Family {
    pub id: i64,
    /// Machine code (`"footwear"`)
    #[serde(default)]
    pub code: Option<String>,
    /// Human label; older endpoints only send `code`
    #[serde(default, alias = "label")]
    pub name: Option<String>,
    /// Attribute group ids the family template is built from
    #[serde(default)]
    pub attribute_groups: Vec<i64>,
}

impl Family {
    /// Best available label: name, then code
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .or(self.code.as_deref())
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_name_falls_back_to_code() {
        let family: Family = serde_json::from_value(json!({"id": 3, "code": "footwear"})).unwrap();
        assert_eq!(family.display_name(), "footwear");

        let family: Family =
            serde_json::from_value(json!({"id": 3, "code": "footwear", "label": "Footwear"})).unwrap();
        assert_eq!(family.display_name(), "Footwear");
    }
}
