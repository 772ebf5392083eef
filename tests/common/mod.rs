//! Shared test utilities for integration tests.
//!
//! `TestClient` drives the full router (onboarding gate included) against a
//! private in-memory database. Methods are intentionally broad to support
//! various test scenarios across different test files.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use provisio::config::Config;
use provisio::db::queries::{categories, financial_groups};
use provisio::db::{create_in_memory_pool, migrations};
use provisio::server;
use provisio::services::onboarding::OnboardingStep;
use provisio::state::AppState;
use std::path::{Path, PathBuf};
use tower::ServiceExt;

pub struct TestClient {
    state: AppState,
}

impl TestClient {
    /// A client whose financial group has already finished onboarding.
    pub fn new() -> Self {
        let client = Self::fresh();
        {
            let conn = client.state.db.get().expect("Failed to get connection");
            let id = financial_groups::create_financial_group(
                &conn,
                "Família Teste",
                OnboardingStep::Final,
            )
            .expect("Failed to create financial group");
            financial_groups::complete_onboarding(&conn, &id)
                .expect("Failed to complete onboarding");
        }
        client
    }

    /// A client on an empty database, before onboarding.
    pub fn fresh() -> Self {
        let pool = create_in_memory_pool().expect("Failed to create in-memory pool");
        {
            let mut conn = pool.get().expect("Failed to get connection");
            migrations::run_migrations(&mut conn, Path::new("migrations"))
                .expect("Failed to run migrations");
        }

        let config = Config {
            host: "127.0.0.1".into(),
            port: 7070,
            database_path: PathBuf::from(":memory:"),
            migrations_path: PathBuf::from("migrations"),
            ..Config::default()
        };

        Self {
            state: AppState::new(pool, config),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// The production router around this client's state.
    pub fn router(&self) -> Router {
        server::router(self.state.clone())
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, String, Option<String>) {
        let response = self.router().oneshot(request).await.unwrap();

        let status = response.status();
        let location = response
            .headers()
            .get("location")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8_lossy(&body).to_string(), location)
    }

    /// Make a GET request and return status and body.
    pub async fn get(&self, uri: &str) -> (StatusCode, String) {
        let (status, body, _) = self
            .send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await;
        (status, body)
    }

    /// Make a GET request and return status and the `Location` header.
    pub async fn get_location(&self, uri: &str) -> (StatusCode, Option<String>) {
        let (status, _, location) = self
            .send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await;
        (status, location)
    }

    fn form_request(uri: &str, form_data: &[(&str, &str)]) -> Request<Body> {
        let body = form_data
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    /// Make a POST request with form data and return status and body.
    pub async fn post_form(&self, uri: &str, form_data: &[(&str, &str)]) -> (StatusCode, String) {
        let (status, body, _) = self.send(Self::form_request(uri, form_data)).await;
        (status, body)
    }

    /// POST form data and return status and the `Location` header.
    pub async fn post_form_location(
        &self,
        uri: &str,
        form_data: &[(&str, &str)],
    ) -> (StatusCode, Option<String>) {
        let (status, _, location) = self.send(Self::form_request(uri, form_data)).await;
        (status, location)
    }

    /// POST a JSON body and return status and body.
    pub async fn post_json(&self, uri: &str, json: serde_json::Value) -> (StatusCode, String) {
        let (status, body, _) = self
            .send(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("Content-Type", "application/json")
                    .body(Body::from(json.to_string()))
                    .unwrap(),
            )
            .await;
        (status, body)
    }

    /// Get JSON from an endpoint and parse it.
    pub async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        uri: &str,
    ) -> (StatusCode, Option<T>) {
        let (status, body) = self.get(uri).await;
        let parsed = serde_json::from_str(&body).ok();
        (status, parsed)
    }

    // =========================================================================
    // Helper methods for creating entities through the web forms
    // =========================================================================

    /// Create a category via POST and return its id on success.
    pub async fn create_category(
        &self,
        name: &str,
        parent_id: Option<&str>,
        category_type: Option<&str>,
    ) -> Option<String> {
        let mut form_data = vec![("name", name)];
        if let Some(parent) = parent_id {
            form_data.push(("parent_id", parent));
        }
        if let Some(t) = category_type {
            form_data.push(("type", t));
        }

        let (status, _) = self.post_form("/categories/create", &form_data).await;
        if status != StatusCode::SEE_OTHER {
            return None;
        }
        self.category_id(name)
    }

    /// Id of the most recently created category called `name`.
    pub fn category_id(&self, name: &str) -> Option<String> {
        let conn = self.state.db.get().expect("Failed to get connection");
        categories::list_categories(&conn)
            .expect("Failed to list categories")
            .into_iter()
            .rev()
            .find(|c| c.name == name)
            .map(|c| c.id)
    }

    /// Commit a planned amount via the HTML form and return the status.
    pub async fn commit_planned(&self, category_id: &str, period: &str, planned: &str) -> StatusCode {
        let (status, _) = self
            .post_form(
                &format!("/provisions/{}", category_id),
                &[("planned", planned), ("period", period), ("type", "expense")],
            )
            .await;
        status
    }

    /// Create a transaction via POST and return success status.
    pub async fn create_transaction(
        &self,
        date: &str,
        amount: &str,
        description: &str,
        category_id: Option<&str>,
    ) -> bool {
        let mut form_data = vec![
            ("date", date),
            ("amount", amount),
            ("description", description),
        ];
        if let Some(id) = category_id {
            form_data.push(("category_id", id));
        }

        let (status, _) = self.post_form("/transactions/create", &form_data).await;
        status == StatusCode::SEE_OTHER
    }
}

impl Default for TestClient {
    fn default() -> Self {
        Self::new()
    }
}
