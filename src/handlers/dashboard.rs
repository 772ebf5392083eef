use askama::Template;
use axum::extract::{Query, State};
use axum::response::Html;
use serde::Deserialize;
use tracing::debug;

use crate::db::queries::transactions;
use crate::error::{AppResult, RenderHtml};
use crate::filters;
use crate::handlers::provisions::resolve_period;
use crate::handlers::transactions::{transaction_row, TransactionRowView};
use crate::models::CategoryType;
use crate::services::expansion::ExpansionState;
use crate::services::provisioning::{self, TypeTotals};
use crate::state::AppState;
use crate::VERSION;

/// One of the two summary cards.
pub struct TotalsCard {
    pub label: &'static str,
    pub planned: String,
    pub realized: String,
    pub remaining: String,
    pub remaining_class: &'static str,
    pub url: String,
}

#[derive(Template)]
#[template(path = "pages/dashboard.html")]
pub struct DashboardTemplate {
    pub title: String,
    pub version: &'static str,
    pub group_name: String,
    pub period_label: String,
    pub cards: Vec<TotalsCard>,
    pub balance: String,
    pub balance_class: &'static str,
    pub recent_transactions: Vec<TransactionRowView>,
}

#[derive(Debug, Deserialize)]
pub struct DashboardParams {
    pub period: Option<String>,
}

pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> AppResult<Html<String>> {
    debug!("Loading dashboard");
    let period = resolve_period(params.period.as_deref())?;

    let (group_name, summary, recent) = {
        let conn = state.db.get()?;
        let group = crate::db::queries::financial_groups::get_financial_group(&conn)?;
        let summary = provisioning::summarize(&conn, &period)?;
        let filter = transactions::TransactionFilter {
            limit: Some(5),
            ..Default::default()
        };
        let recent = transactions::list_transactions(&conn, &filter)?;
        (group.map(|g| g.name).unwrap_or_default(), summary, recent)
    };

    debug!(
        planned_expense = summary.expense.planned,
        realized_expense = summary.expense.realized,
        recent = recent.len(),
        "Dashboard data loaded"
    );

    let card = |category_type: CategoryType, totals: TypeTotals| TotalsCard {
        label: category_type.label(),
        planned: state.money(totals.planned),
        realized: state.money(totals.realized),
        remaining: state.signed_money(totals.remaining()),
        remaining_class: filters::remaining_class(totals.remaining()),
        url: crate::handlers::provisions::provisions_url(
            &period,
            category_type,
            &ExpansionState::new(),
        ),
    };

    let balance = summary.balance();
    let template = DashboardTemplate {
        title: "Início".into(),
        version: VERSION,
        group_name,
        period_label: period.label(),
        cards: vec![
            card(CategoryType::Expense, summary.expense),
            card(CategoryType::Income, summary.income),
        ],
        balance: state.signed_money(balance),
        balance_class: filters::remaining_class(balance),
        recent_transactions: recent
            .into_iter()
            .map(|t| transaction_row(&state, t))
            .collect(),
    };

    template.render_html()
}
