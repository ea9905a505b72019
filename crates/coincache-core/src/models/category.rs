use serde::{Deserialize, Serialize};

use super::market::CategoryEntry;

/// A classification tag from the category directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

impl From<CategoryEntry> for Category {
    fn from(entry: CategoryEntry) -> Self {
        Self {
            id: entry.category_id,
            name: entry.name,
        }
    }
}
