use askama::Template;
use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::db::queries::{categories, financial_groups};
use crate::error::{AppError, AppResult, RenderHtml};
use crate::models::FinancialGroup;
use crate::services::onboarding::{self, OnboardingStep, DEFAULT_CATEGORIES};
use crate::state::AppState;
use crate::VERSION;

/// Name given to the group until the account step renames it.
pub const PLACEHOLDER_GROUP_NAME: &str = "Minha família";

/// Where a finished onboarding lands.
const HOME_AFTER_ONBOARDING: &str = "/provisions";

#[derive(Template)]
#[template(path = "pages/onboarding.html")]
pub struct OnboardingTemplate {
    pub title: String,
    pub version: &'static str,
    pub step: &'static str,
    pub step_title: &'static str,
    pub step_number: usize,
    pub total_steps: usize,
    pub can_go_back: bool,
    pub group_name: String,
    pub error: Option<String>,
    pub category_count: i64,
    pub default_roots: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
pub struct StepFormData {
    pub step: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub seed_defaults: Option<String>,
}

fn current_step(group: Option<&FinancialGroup>) -> OnboardingStep {
    group.map(|g| g.onboarding_step).unwrap_or_default()
}

fn render_step(
    step: OnboardingStep,
    group_name: String,
    category_count: i64,
    error: Option<String>,
) -> AppResult<axum::response::Html<String>> {
    let template = OnboardingTemplate {
        title: format!("Configuração: {}", step.title()),
        version: VERSION,
        step: step.as_str(),
        step_title: step.title(),
        step_number: step.number(),
        total_steps: OnboardingStep::ALL.len(),
        can_go_back: step.can_go_back(),
        group_name,
        error,
        category_count,
        default_roots: DEFAULT_CATEGORIES.iter().map(|c| c.name).collect(),
    };
    template.render_html()
}

pub async fn index(State(state): State<AppState>) -> AppResult<Response> {
    let conn = state.db.get()?;
    let group = financial_groups::get_financial_group(&conn)?;

    if group.as_ref().is_some_and(|g| g.onboarding_completed) {
        return Ok(Redirect::to(HOME_AFTER_ONBOARDING).into_response());
    }

    let step = current_step(group.as_ref());
    let group_name = group
        .map(|g| g.name)
        .filter(|name| name != PLACEHOLDER_GROUP_NAME)
        .unwrap_or_default();
    let category_count = categories::count_categories(&conn)?;

    Ok(render_step(step, group_name, category_count, None)?.into_response())
}

/// Advance one step, applying the side effect of the step being left.
///
/// The form carries the step it was rendered for; a mismatch (a stale tab,
/// a double submit) just shows the current step again.
pub async fn next(
    State(state): State<AppState>,
    Form(form): Form<StepFormData>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let group = financial_groups::get_financial_group(&conn)?;

    if group.as_ref().is_some_and(|g| g.onboarding_completed) {
        return Ok(Redirect::to(HOME_AFTER_ONBOARDING).into_response());
    }

    let step = current_step(group.as_ref());
    if OnboardingStep::parse(form.step.trim()) != Some(step) {
        warn!(posted = %form.step, current = %step, "Ignoring stale onboarding submit");
        return Ok(Redirect::to("/onboarding").into_response());
    }

    match (step, group) {
        (OnboardingStep::Welcome, None) => {
            financial_groups::create_financial_group(
                &conn,
                PLACEHOLDER_GROUP_NAME,
                OnboardingStep::Account,
            )?;
        }
        (OnboardingStep::Welcome, Some(group)) => {
            financial_groups::set_onboarding_step(&conn, &group.id, OnboardingStep::Account)?;
        }
        (OnboardingStep::Account, Some(group)) => {
            let submitted = form.name.unwrap_or_default();
            let name = match onboarding::validate_group_name(&submitted) {
                Ok(name) => name,
                Err(message) => {
                    debug!(error = %message, "Rejected financial group name");
                    let count = categories::count_categories(&conn)?;
                    let page = render_step(step, submitted, count, Some(message))?;
                    return Ok((StatusCode::BAD_REQUEST, page).into_response());
                }
            };
            financial_groups::rename_financial_group(&conn, &group.id, &name)?;
            financial_groups::set_onboarding_step(&conn, &group.id, OnboardingStep::Categories)?;
        }
        (OnboardingStep::Categories, Some(group)) => {
            if form.seed_defaults.is_some() && categories::count_categories(&conn)? == 0 {
                let created = categories::seed_default_categories(&conn, DEFAULT_CATEGORIES)?;
                info!(count = created, "Seeded default categories during onboarding");
            }
            financial_groups::set_onboarding_step(&conn, &group.id, OnboardingStep::Final)?;
        }
        (OnboardingStep::Final, Some(group)) => {
            financial_groups::complete_onboarding(&conn, &group.id)?;
            return Ok(Redirect::to(HOME_AFTER_ONBOARDING).into_response());
        }
        (step, None) => {
            return Err(AppError::Internal(format!(
                "Onboarding at step {} without a financial group",
                step
            )));
        }
    }

    Ok(Redirect::to("/onboarding").into_response())
}

pub async fn back(
    State(state): State<AppState>,
    Form(form): Form<StepFormData>,
) -> AppResult<Redirect> {
    let conn = state.db.get()?;
    let group = financial_groups::get_financial_group(&conn)?;

    if group.as_ref().is_some_and(|g| g.onboarding_completed) {
        return Ok(Redirect::to(HOME_AFTER_ONBOARDING));
    }

    let step = current_step(group.as_ref());
    if OnboardingStep::parse(form.step.trim()) != Some(step) {
        warn!(posted = %form.step, current = %step, "Ignoring stale onboarding submit");
        return Ok(Redirect::to("/onboarding"));
    }

    let previous = step.back().ok_or_else(|| {
        AppError::Validation(format!("Não é possível voltar da etapa '{}'", step.title()))
    })?;
    // Only welcome has no group, and welcome has no previous step.
    if let Some(group) = group {
        financial_groups::set_onboarding_step(&conn, &group.id, previous)?;
    }

    Ok(Redirect::to("/onboarding"))
}

fn is_exempt(path: &str) -> bool {
    path == "/onboarding"
        || path.starts_with("/onboarding/")
        || path == "/health"
        || path.starts_with("/api/")
}

/// Send every page to the wizard until the financial group has finished it.
pub async fn onboarding_gate(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if is_exempt(request.uri().path()) {
        return next.run(request).await;
    }

    match state.financial_group() {
        Ok(Some(group)) if group.onboarding_completed => next.run(request).await,
        Ok(_) => Redirect::to("/onboarding").into_response(),
        Err(e) => e.into_response(),
    }
}
