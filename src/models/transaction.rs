use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub date: String,
    pub amount_cents: i64,
    pub description: String,
    pub category_id: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionWithCategory {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub category_name: Option<String>,
    pub category_color: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub date: String,
    pub amount_cents: i64,
    pub description: String,
    pub category_id: Option<String>,
}
