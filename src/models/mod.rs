pub mod category;
pub mod financial_group;
pub mod provision;
pub mod transaction;

pub use category::{Category, CategoryType, NewCategory};
pub use financial_group::FinancialGroup;
pub use provision::{CategoryRow, Provision};
pub use transaction::{NewTransaction, Transaction, TransactionWithCategory};
