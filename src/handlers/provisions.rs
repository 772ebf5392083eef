use askama::Template;
use axum::extract::{Path, Query, State};
use axum::response::{Html, Redirect};
use axum::Form;
use serde::Deserialize;

use crate::date_utils::Period;
use crate::error::{AppError, AppResult, RenderHtml};
use crate::filters::{self, parse_amount_cents};
use crate::models::CategoryType;
use crate::services::category_tree::{self, VisibleRow};
use crate::services::expansion::ExpansionState;
use crate::services::provisioning;
use crate::state::AppState;
use crate::VERSION;

#[derive(Debug, Deserialize)]
pub struct ProvisionParams {
    pub period: Option<String>,
    #[serde(rename = "type")]
    pub category_type: Option<String>,
    pub expanded: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommitFormData {
    pub planned: String,
    pub period: String,
    #[serde(rename = "type")]
    pub category_type: Option<String>,
    pub expanded: Option<String>,
}

pub struct ProvisionRowView {
    pub category_id: String,
    pub name: String,
    pub color: String,
    pub indent_px: usize,
    pub planned: String,
    pub realized: String,
    pub remaining: String,
    pub remaining_class: &'static str,
    pub planned_input: String,
    pub has_children: bool,
    pub expanded: bool,
    pub toggle_url: String,
}

pub struct TypeTab {
    pub label: &'static str,
    pub url: String,
    pub active: bool,
}

#[derive(Template)]
#[template(path = "pages/provisions.html")]
pub struct ProvisionsTemplate {
    pub title: String,
    pub version: &'static str,
    pub period: String,
    pub period_label: String,
    pub category_type: String,
    pub prev_url: String,
    pub next_url: String,
    pub tabs: Vec<TypeTab>,
    pub rows: Vec<ProvisionRowView>,
    pub expanded_query: String,
    pub expand_all_url: String,
    pub collapse_all_url: String,
    pub planned_total: String,
    pub realized_total: String,
    pub remaining_total: String,
    pub remaining_class: &'static str,
}

pub(crate) fn resolve_period(value: Option<&str>) -> AppResult<Period> {
    match value.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => s.parse().map_err(AppError::Validation),
        None => Ok(Period::current()),
    }
}

pub(crate) fn resolve_type(value: Option<&str>) -> AppResult<CategoryType> {
    match value.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => CategoryType::parse(s)
            .ok_or_else(|| AppError::Validation(format!("Tipo de categoria inválido: {}", s))),
        None => Ok(CategoryType::Expense),
    }
}

/// Link back to the provisions page carrying period, type and expansion.
pub fn provisions_url(
    period: &Period,
    category_type: CategoryType,
    expansion: &ExpansionState,
) -> String {
    let mut url = format!("/provisions?period={}&type={}", period, category_type);
    if !expansion.is_empty() {
        url.push_str("&expanded=");
        url.push_str(&urlencoding::encode(&expansion.to_query()));
    }
    url
}

fn row_view(
    state: &AppState,
    row: VisibleRow,
    period: &Period,
    category_type: CategoryType,
    expansion: &ExpansionState,
) -> ProvisionRowView {
    let remaining = row.remaining();
    ProvisionRowView {
        toggle_url: provisions_url(period, category_type, &expansion.toggle(&row.category_id)),
        category_id: row.category_id,
        name: row.name,
        color: row.color.unwrap_or_else(crate::models::category::default_color),
        indent_px: row.depth * 24,
        planned: state.money(row.planned),
        realized: state.money(row.realized),
        remaining: state.signed_money(remaining),
        remaining_class: filters::remaining_class(remaining),
        planned_input: filters::format_input_amount(row.planned),
        has_children: row.has_children,
        expanded: row.expanded,
    }
}

pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<ProvisionParams>,
) -> AppResult<Html<String>> {
    let period = resolve_period(params.period.as_deref())?;
    let category_type = resolve_type(params.category_type.as_deref())?;
    let expansion = ExpansionState::from_query(params.expanded.as_deref().unwrap_or(""));

    let view = {
        let conn = state.db.get()?;
        provisioning::load_view(&conn, &period, category_type)?
    };

    let all_ids = category_tree::all_ids(&view.categories);
    let remaining_total = category_tree::round_cents(view.planned_total - view.realized_total);

    let rows = category_tree::visible_rows(&view.categories, &expansion)
        .into_iter()
        .map(|row| row_view(&state, row, &period, category_type, &expansion))
        .collect();

    let tabs = [CategoryType::Expense, CategoryType::Income]
        .into_iter()
        .map(|t| TypeTab {
            label: t.label(),
            url: provisions_url(&period, t, &ExpansionState::new()),
            active: t == category_type,
        })
        .collect();

    let template = ProvisionsTemplate {
        title: "Planejamento".into(),
        version: VERSION,
        period: period.to_string(),
        period_label: period.label(),
        category_type: category_type.to_string(),
        prev_url: provisions_url(&period.prev(), category_type, &expansion),
        next_url: provisions_url(&period.next(), category_type, &expansion),
        tabs,
        rows,
        expanded_query: expansion.to_query(),
        expand_all_url: provisions_url(&period, category_type, &expansion.expand_all(all_ids)),
        collapse_all_url: provisions_url(&period, category_type, &expansion.collapse_all()),
        planned_total: state.money(view.planned_total),
        realized_total: state.money(view.realized_total),
        remaining_total: state.signed_money(remaining_total),
        remaining_class: filters::remaining_class(remaining_total),
    };

    template.render_html()
}

pub async fn commit(
    State(state): State<AppState>,
    Path(category_id): Path<String>,
    Form(form): Form<CommitFormData>,
) -> AppResult<Redirect> {
    let period = resolve_period(Some(form.period.as_str()))?;
    let category_type = resolve_type(form.category_type.as_deref())?;
    let planned_cents = parse_amount_cents(&form.planned).map_err(AppError::Validation)?;

    {
        let conn = state.db.get()?;
        provisioning::commit_planned(&conn, &category_id, &period, planned_cents)?;
    }

    let expansion = ExpansionState::from_query(form.expanded.as_deref().unwrap_or(""));
    Ok(Redirect::to(&provisions_url(&period, category_type, &expansion)))
}
