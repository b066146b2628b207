//! Brand Model

use serde::{Deserialize, Serialize};

/// Brand entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brand {
    pub id: i64,
    pub name: String,
}
