pub mod categories;
pub mod financial_groups;
pub mod provisions;
pub mod transactions;
