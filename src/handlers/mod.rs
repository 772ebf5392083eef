pub mod api;
pub mod categories;
pub mod dashboard;
pub mod onboarding;
pub mod provisions;
pub mod transactions;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        // Pages
        .route("/", get(dashboard::index))
        .route("/provisions", get(provisions::index))
        .route("/categories", get(categories::index))
        .route("/transactions", get(transactions::index))
        .route("/onboarding", get(onboarding::index))
        // Provisioning
        .route("/provisions/:category_id", post(provisions::commit))
        // Category management
        .route("/categories/create", post(categories::create))
        .route("/categories/:id/edit", get(categories::edit_form))
        .route("/categories/:id/update", post(categories::update))
        .route("/categories/:id/delete", post(categories::delete))
        // Transactions
        .route("/transactions/create", post(transactions::create))
        .route("/transactions/:id/delete", post(transactions::delete))
        // Onboarding
        .route("/onboarding/next", post(onboarding::next))
        .route("/onboarding/back", post(onboarding::back))
        // API (JSON)
        .route("/api/provisions", get(api::provisions))
        .route("/api/provisions/:category_id", post(api::commit_provision))
        .route("/api/categories", get(api::categories))
        .route("/api/summary", get(api::summary))
        // Health check
        .route("/health", get(health))
}

async fn health() -> &'static str {
    "OK"
}
