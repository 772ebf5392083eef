use axum::extract::{Path, Query, State};
use axum::response::Json;
use serde::{Deserialize, Serialize};

use crate::db::queries::categories;
use crate::error::{AppError, AppResult};
use crate::filters::exact_amount_cents;
use crate::handlers::provisions::{resolve_period, resolve_type};
use crate::models::Category;
use crate::services::provisioning::{self, PeriodSummary, ProvisionView};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProvisionApiParams {
    pub period: Option<String>,
    #[serde(rename = "type")]
    pub category_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommitRequest {
    pub period: String,
    pub planned: f64,
}

#[derive(Debug, Deserialize)]
pub struct SummaryParams {
    pub period: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub period: String,
    #[serde(flatten)]
    pub summary: PeriodSummary,
    pub balance: f64,
}

pub async fn provisions(
    State(state): State<AppState>,
    Query(params): Query<ProvisionApiParams>,
) -> AppResult<Json<ProvisionView>> {
    let period = resolve_period(params.period.as_deref())?;
    let category_type = resolve_type(params.category_type.as_deref())?;

    let conn = state.db.get()?;
    let view = provisioning::load_view(&conn, &period, category_type)?;
    Ok(Json(view))
}

/// Save a planned amount and answer with the refreshed view of the
/// category's type for that period.
pub async fn commit_provision(
    State(state): State<AppState>,
    Path(category_id): Path<String>,
    Json(request): Json<CommitRequest>,
) -> AppResult<Json<ProvisionView>> {
    let period = resolve_period(Some(request.period.as_str()))?;
    let planned_cents = exact_amount_cents(request.planned).map_err(AppError::Validation)?;

    let conn = state.db.get()?;
    let category = categories::get_category(&conn, &category_id)?
        .ok_or_else(|| AppError::NotFound("Categoria não encontrada".into()))?;
    provisioning::commit_planned(&conn, &category_id, &period, planned_cents)?;

    let view = provisioning::load_view(&conn, &period, category.category_type)?;
    Ok(Json(view))
}

pub async fn categories(State(state): State<AppState>) -> AppResult<Json<Vec<Category>>> {
    let conn = state.db.get()?;
    Ok(Json(categories::list_categories(&conn)?))
}

pub async fn summary(
    State(state): State<AppState>,
    Query(params): Query<SummaryParams>,
) -> AppResult<Json<SummaryResponse>> {
    let period = resolve_period(params.period.as_deref())?;
    let conn = state.db.get()?;
    let summary = provisioning::summarize(&conn, &period)?;
    Ok(Json(SummaryResponse {
        period: period.to_string(),
        balance: summary.balance(),
        summary,
    }))
}
