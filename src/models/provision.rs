use serde::{Deserialize, Serialize};

use super::category::CategoryType;

/// One category's planned and realized amounts for a period, as fed to the
/// category tree.
///
/// `id` identifies the row itself (the provision record when one exists),
/// while `category_id` is what parent references point at. Rows built
/// straight from categories use the same value for both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRow {
    pub id: String,
    pub category_id: String,
    pub name: String,
    pub category_type: CategoryType,
    pub color: Option<String>,
    pub parent_id: Option<String>,
    pub planned: f64,
    pub realized: f64,
}

impl CategoryRow {
    /// Row for a category without a separate provision record.
    pub fn new(
        category_id: impl Into<String>,
        name: impl Into<String>,
        category_type: CategoryType,
        parent_id: Option<&str>,
        planned: f64,
        realized: f64,
    ) -> Self {
        let category_id = category_id.into();
        Self {
            id: category_id.clone(),
            category_id,
            name: name.into(),
            category_type,
            color: None,
            parent_id: parent_id.map(str::to_string),
            planned,
            realized,
        }
    }
}

/// A stored planned amount for one category in one month.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provision {
    pub id: String,
    pub category_id: String,
    pub period: String,
    pub planned_cents: i64,
    pub updated_at: String,
}
