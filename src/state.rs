use crate::config::Config;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::filters;
use crate::models::FinancialGroup;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: DbPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    pub fn financial_group(&self) -> AppResult<Option<FinancialGroup>> {
        let conn = self.db.get()?;
        Ok(crate::db::queries::financial_groups::get_financial_group(&conn)?)
    }

    /// Format an amount with the configured currency and locale.
    pub fn money(&self, value: f64) -> String {
        filters::format_amount(value, &self.config.currency, &self.config.locale)
    }

    pub fn signed_money(&self, value: f64) -> String {
        filters::format_signed_amount(value, &self.config.currency, &self.config.locale)
    }
}
