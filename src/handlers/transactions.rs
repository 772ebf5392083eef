use askama::Template;
use axum::extract::{Path, Query, State};
use axum::response::{Html, Redirect};
use axum::Form;
use serde::Deserialize;
use tracing::{debug, info};

use crate::date_utils::{parse_date, Period};
use crate::db::queries::{categories, transactions};
use crate::error::{AppError, AppResult, RenderHtml};
use crate::filters::{cents_to_amount, parse_amount_cents};
use crate::handlers::provisions::resolve_period;
use crate::models::{Category, NewTransaction, TransactionWithCategory};
use crate::state::AppState;
use crate::VERSION;

pub struct TransactionRowView {
    pub id: String,
    pub date: String,
    pub description: String,
    pub amount: String,
    pub category_name: String,
    pub category_color: String,
}

pub(crate) fn transaction_row(state: &AppState, t: TransactionWithCategory) -> TransactionRowView {
    TransactionRowView {
        amount: state.money(cents_to_amount(t.transaction.amount_cents)),
        id: t.transaction.id,
        date: t.transaction.date,
        description: t.transaction.description,
        category_name: t
            .category_name
            .unwrap_or_else(|| "Sem categoria".to_string()),
        category_color: t
            .category_color
            .unwrap_or_else(crate::models::category::default_color),
    }
}

#[derive(Template)]
#[template(path = "pages/transactions.html")]
pub struct TransactionsTemplate {
    pub title: String,
    pub version: &'static str,
    pub period: String,
    pub period_label: String,
    pub prev_url: String,
    pub next_url: String,
    pub transactions: Vec<TransactionRowView>,
    pub categories: Vec<Category>,
    pub today: String,
}

#[derive(Debug, Deserialize)]
pub struct TransactionParams {
    pub period: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TransactionFormData {
    pub date: String,
    pub amount: String,
    pub description: String,
    #[serde(default)]
    pub category_id: Option<String>,
}

impl TransactionFormData {
    fn to_new_transaction(&self) -> Result<NewTransaction, AppError> {
        let date = parse_date(&self.date).map_err(AppError::Validation)?;
        let amount_cents = parse_amount_cents(&self.amount).map_err(AppError::Validation)?;

        let description = self.description.trim().to_string();
        if description.is_empty() {
            return Err(AppError::Validation("Informe uma descrição".into()));
        }

        Ok(NewTransaction {
            date: date.format("%Y-%m-%d").to_string(),
            amount_cents,
            description,
            category_id: self
                .category_id
                .as_ref()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
        })
    }
}

fn transactions_url(period: &Period) -> String {
    format!("/transactions?period={}", period)
}

pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<TransactionParams>,
) -> AppResult<Html<String>> {
    let period = resolve_period(params.period.as_deref())?;

    let (rows, categories) = {
        let conn = state.db.get()?;
        let filter = transactions::TransactionFilter {
            from_date: Some(period.start_date().to_string()),
            until_date: Some(period.end_date_exclusive().to_string()),
            ..Default::default()
        };
        (
            transactions::list_transactions(&conn, &filter)?,
            categories::list_categories(&conn)?,
        )
    };

    let mut categories = categories;
    categories.sort_by_cached_key(|c| crate::services::collation::collation_key(&c.name));

    let template = TransactionsTemplate {
        title: "Lançamentos".into(),
        version: VERSION,
        period: period.to_string(),
        period_label: period.label(),
        prev_url: transactions_url(&period.prev()),
        next_url: transactions_url(&period.next()),
        transactions: rows
            .into_iter()
            .map(|t| transaction_row(&state, t))
            .collect(),
        categories,
        today: chrono::Local::now().format("%Y-%m-%d").to_string(),
    };

    template.render_html()
}

pub async fn create(
    State(state): State<AppState>,
    Form(form): Form<TransactionFormData>,
) -> AppResult<Redirect> {
    debug!(description = %form.description, amount = %form.amount, "Creating transaction");
    let new_transaction = form.to_new_transaction()?;

    let conn = state.db.get()?;
    if let Some(ref category_id) = new_transaction.category_id {
        if categories::get_category(&conn, category_id)?.is_none() {
            return Err(AppError::Validation("Categoria não encontrada".into()));
        }
    }

    let id = transactions::create_transaction(&conn, &new_transaction)?;
    info!(transaction_id = %id, "Transaction created via web form");

    let period = parse_date(&new_transaction.date)
        .map(Period::containing)
        .unwrap_or_else(|_| Period::current());
    Ok(Redirect::to(&transactions_url(&period)))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Redirect> {
    info!(transaction_id = %id, "Deleting transaction");
    let conn = state.db.get()?;

    if !transactions::delete_transaction(&conn, &id)? {
        return Err(AppError::NotFound("Lançamento não encontrado".into()));
    }

    Ok(Redirect::to("/transactions"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(date: &str, amount: &str, description: &str, category: Option<&str>) -> TransactionFormData {
        TransactionFormData {
            date: date.into(),
            amount: amount.into(),
            description: description.into(),
            category_id: category.map(str::to_string),
        }
    }

    #[test]
    fn test_to_new_transaction() {
        let t = form("2024-03-05", "12,50", "  Padaria ", Some("abc"))
            .to_new_transaction()
            .unwrap();
        assert_eq!(t.date, "2024-03-05");
        assert_eq!(t.amount_cents, 1250);
        assert_eq!(t.description, "Padaria");
        assert_eq!(t.category_id.as_deref(), Some("abc"));
    }

    #[test]
    fn test_blank_category_means_uncategorized() {
        let t = form("2024-03-05", "1", "x", Some("  ")).to_new_transaction().unwrap();
        assert_eq!(t.category_id, None);
    }

    #[test]
    fn test_rejects_invalid_fields() {
        assert!(form("05/03/2024", "1", "x", None).to_new_transaction().is_err());
        assert!(form("2024-03-05", "abc", "x", None).to_new_transaction().is_err());
        assert!(form("2024-03-05", "1", "   ", None).to_new_transaction().is_err());
    }
}
