//! Planned vs. realized amounts per category, read from and written to the
//! database.

use rusqlite::Connection;
use serde::Serialize;
use tracing::debug;

use crate::date_utils::Period;
use crate::db::queries::{categories, provisions};
use crate::error::{AppError, AppResult};
use crate::models::CategoryType;
use crate::services::category_tree::{self, TreeNode};

/// The aggregated, sorted forest of every category for `period`.
pub fn load_forest(conn: &Connection, period: &Period) -> AppResult<Vec<TreeNode>> {
    let rows = provisions::list_category_rows(conn, period)?;
    Ok(category_tree::build_category_tree(&rows)?)
}

/// The roots of one type, with totals.
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionView {
    pub period: String,
    pub category_type: CategoryType,
    pub planned_total: f64,
    pub realized_total: f64,
    pub categories: Vec<TreeNode>,
}

pub fn load_view(
    conn: &Connection,
    period: &Period,
    category_type: CategoryType,
) -> AppResult<ProvisionView> {
    let forest = category_tree::filter_by_type(load_forest(conn, period)?, category_type);
    let (planned_total, realized_total) = category_tree::totals(&forest);
    Ok(ProvisionView {
        period: period.to_string(),
        category_type,
        planned_total,
        realized_total,
        categories: forest,
    })
}

/// Planned and realized totals of one type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TypeTotals {
    pub planned: f64,
    pub realized: f64,
}

impl TypeTotals {
    pub fn remaining(&self) -> f64 {
        category_tree::round_cents(self.planned - self.realized)
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct PeriodSummary {
    pub expense: TypeTotals,
    pub income: TypeTotals,
}

impl PeriodSummary {
    /// Realized income minus realized expenses.
    pub fn balance(&self) -> f64 {
        category_tree::round_cents(self.income.realized - self.expense.realized)
    }
}

pub fn summarize(conn: &Connection, period: &Period) -> AppResult<PeriodSummary> {
    let forest = load_forest(conn, period)?;
    let totals_for = |category_type: CategoryType| {
        let roots: Vec<TreeNode> = forest
            .iter()
            .filter(|root| root.category_type == category_type)
            .cloned()
            .collect();
        let (planned, realized) = category_tree::totals(&roots);
        TypeTotals { planned, realized }
    };

    Ok(PeriodSummary {
        expense: totals_for(CategoryType::Expense),
        income: totals_for(CategoryType::Income),
    })
}

/// Store the planned amount of a leaf category for `period`.
///
/// Internal categories are rejected: their planned value is always the sum
/// of their children. The caller reloads the forest afterwards.
pub fn commit_planned(
    conn: &Connection,
    category_id: &str,
    period: &Period,
    planned_cents: i64,
) -> AppResult<String> {
    if planned_cents < 0 {
        return Err(AppError::Validation(
            "O valor planejado não pode ser negativo".into(),
        ));
    }

    let category = categories::get_category(conn, category_id)?
        .ok_or_else(|| AppError::NotFound("Categoria não encontrada".into()))?;

    if categories::count_children(conn, category_id)? > 0 {
        return Err(AppError::Validation(format!(
            "'{}' tem subcategorias; o valor planejado é a soma delas",
            category.name
        )));
    }

    let id = provisions::upsert_provision(conn, category_id, period, planned_cents)?;
    debug!(category_id = %category_id, period = %period, "Committed planned amount");
    Ok(id)
}
