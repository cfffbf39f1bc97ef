use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue};
use axum_test::TestServer;
use serde_json::json;

use reco_api::api::{create_router, AppState};
use reco_api::db::{create_pool, PreferenceStore, RecommendationStore};
use reco_api::error::{AppError, AppResult};
use reco_api::middleware::{request_id_middleware, REQUEST_ID_HEADER};
use reco_api::models::{ProductSuggestion, UserPreferences};
use reco_api::services::providers::RecommendationProvider;
use reco_api::services::workflow::WorkflowController;

/// Provider that always returns the same suggestion.
struct StaticProvider(ProductSuggestion);

#[async_trait::async_trait]
impl RecommendationProvider for StaticProvider {
    async fn fetch(
        &self,
        _query: &str,
        _preferences: &UserPreferences,
    ) -> AppResult<ProductSuggestion> {
        Ok(self.0.clone())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Provider that always fails with an upstream error.
struct FailingProvider {
    status: u16,
    body: &'static str,
}

#[async_trait::async_trait]
impl RecommendationProvider for FailingProvider {
    async fn fetch(
        &self,
        _query: &str,
        _preferences: &UserPreferences,
    ) -> AppResult<ProductSuggestion> {
        Err(AppError::Upstream {
            status: self.status,
            body: self.body.to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

fn sample_product() -> ProductSuggestion {
    ProductSuggestion {
        name: "Sony WH-1000XM4".to_string(),
        price: 278.00,
        summary: "Noise-cancelling over-ear".to_string(),
        image_url: "https://x/img.png".to_string(),
        affiliate_link: "https://x/buy".to_string(),
    }
}

async fn create_test_server(provider: impl RecommendationProvider + 'static) -> TestServer {
    let pool = create_pool("sqlite::memory:").await.unwrap();
    let preferences = PreferenceStore::new(pool.clone());
    let history = RecommendationStore::new(pool);
    let workflow = Arc::new(WorkflowController::new(
        preferences.clone(),
        history.clone(),
        Arc::new(provider),
    ));
    let state = AppState::new(workflow, preferences, history);

    let app = create_router(state).layer(axum::middleware::from_fn(request_id_middleware));
    TestServer::new(app).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server(StaticProvider(sample_product())).await;
    let response = server.get("/health").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_preferences_created_on_first_read() {
    let server = create_test_server(StaticProvider(sample_product())).await;

    let response = server.get("/api/v1/preferences").await;
    response.assert_status_ok();
    let prefs: serde_json::Value = response.json();
    assert_eq!(prefs["display_name"], "User");
    assert_eq!(prefs["budget_sensitivity"], 0.5);
    assert_eq!(prefs["brand_loyalty"], 0.5);
}

#[tokio::test]
async fn test_update_preferences() {
    let server = create_test_server(StaticProvider(sample_product())).await;

    let response = server
        .patch("/api/v1/preferences")
        .json(&json!({
            "budget_sensitivity": 0.3,
            "brand_loyalty": 0.8
        }))
        .await;
    response.assert_status_ok();
    let updated: serde_json::Value = response.json();
    assert_eq!(updated["budget_sensitivity"], 0.3);
    assert_eq!(updated["brand_loyalty"], 0.8);
    assert_eq!(updated["display_name"], "User");

    // The update persists across reads.
    let reread: serde_json::Value = server.get("/api/v1/preferences").await.json();
    assert_eq!(reread["budget_sensitivity"], 0.3);
}

#[tokio::test]
async fn test_recommend_flow() {
    let server = create_test_server(StaticProvider(sample_product())).await;

    server
        .patch("/api/v1/preferences")
        .json(&json!({ "budget_sensitivity": 0.3, "brand_loyalty": 0.8 }))
        .await;

    let response = server
        .post("/api/v1/recommend")
        .json(&json!({ "query": "wireless headphones" }))
        .await;
    response.assert_status_ok();
    let view: serde_json::Value = response.json();
    assert_eq!(view["is_loading"], false);
    assert_eq!(view["last_error"], serde_json::Value::Null);
    assert_eq!(view["pending_query"], "");
    assert_eq!(view["current"]["name"], "Sony WH-1000XM4");
    assert_eq!(view["current"]["price"], 278.00);
    assert_eq!(view["current"]["summary"], "Noise-cancelling over-ear");
    assert_eq!(view["current"]["image_url"], "https://x/img.png");
    assert_eq!(view["current"]["affiliate_link"], "https://x/buy");

    // The store gained exactly one record matching the current one.
    let history: Vec<serde_json::Value> = server.get("/api/v1/recommendations").await.json();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["id"], view["current"]["id"]);

    let current = server.get("/api/v1/workflow/current").await;
    current.assert_status_ok();
    let current: serde_json::Value = current.json();
    assert_eq!(current["name"], "Sony WH-1000XM4");
}

#[tokio::test]
async fn test_recommend_empty_query_changes_nothing() {
    let server = create_test_server(StaticProvider(sample_product())).await;

    let response = server
        .post("/api/v1/recommend")
        .json(&json!({ "query": "   " }))
        .await;
    response.assert_status_ok();
    let view: serde_json::Value = response.json();
    assert_eq!(view["last_error"], serde_json::Value::Null);
    assert_eq!(view["current"], serde_json::Value::Null);

    let history: Vec<serde_json::Value> = server.get("/api/v1/recommendations").await.json();
    assert!(history.is_empty());
}

#[tokio::test]
async fn test_iterate_without_current_reports_error() {
    let server = create_test_server(StaticProvider(sample_product())).await;

    let response = server
        .post("/api/v1/iterate")
        .json(&json!({ "extra_text": "cheaper" }))
        .await;
    response.assert_status_ok();
    let view: serde_json::Value = response.json();
    assert_eq!(view["last_error"], "No recommendation to iterate on.");

    let history: Vec<serde_json::Value> = server.get("/api/v1/recommendations").await.json();
    assert!(history.is_empty());
}

#[tokio::test]
async fn test_iterate_replaces_current_and_keeps_history() {
    let server = create_test_server(StaticProvider(sample_product())).await;

    server
        .post("/api/v1/recommend")
        .json(&json!({ "query": "wireless headphones" }))
        .await;

    let response = server
        .post("/api/v1/iterate")
        .json(&json!({ "extra_text": "cheaper" }))
        .await;
    response.assert_status_ok();
    let view: serde_json::Value = response.json();
    assert_eq!(view["last_error"], serde_json::Value::Null);
    assert_eq!(view["current"]["name"], "Sony WH-1000XM4");

    let history: Vec<serde_json::Value> = server.get("/api/v1/recommendations").await.json();
    assert_eq!(history.len(), 2);
}

#[tokio::test]
async fn test_upstream_failure_surfaces_as_last_error() {
    let server = create_test_server(FailingProvider {
        status: 500,
        body: "internal error",
    })
    .await;

    let response = server
        .post("/api/v1/recommend")
        .json(&json!({ "query": "wireless headphones" }))
        .await;
    response.assert_status_ok();
    let view: serde_json::Value = response.json();
    let message = view["last_error"].as_str().unwrap();
    assert!(message.contains("500"));
    assert!(message.contains("internal error"));
    assert_eq!(view["current"], serde_json::Value::Null);

    let current = server.get("/api/v1/workflow/current").await;
    current.assert_status_not_found();
}

#[tokio::test]
async fn test_clear_current_keeps_history() {
    let server = create_test_server(StaticProvider(sample_product())).await;

    server
        .post("/api/v1/recommend")
        .json(&json!({ "query": "wireless headphones" }))
        .await;

    let response = server.delete("/api/v1/workflow/current").await;
    response.assert_status_ok();
    let view: serde_json::Value = response.json();
    assert_eq!(view["current"], serde_json::Value::Null);

    let history: Vec<serde_json::Value> = server.get("/api/v1/recommendations").await.json();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn test_delete_recommendation() {
    let server = create_test_server(StaticProvider(sample_product())).await;

    server
        .post("/api/v1/recommend")
        .json(&json!({ "query": "wireless headphones" }))
        .await;

    let history: Vec<serde_json::Value> = server.get("/api/v1/recommendations").await.json();
    let id = history[0]["id"].as_str().unwrap();

    let response = server
        .delete(&format!("/api/v1/recommendations/{}", id))
        .await;
    response.assert_status(axum::http::StatusCode::NO_CONTENT);

    let history: Vec<serde_json::Value> = server.get("/api/v1/recommendations").await.json();
    assert!(history.is_empty());

    // Deleting an unknown id is a no-op, not an error.
    let response = server
        .delete(&format!("/api/v1/recommendations/{}", uuid::Uuid::new_v4()))
        .await;
    response.assert_status(axum::http::StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_clear_history() {
    let server = create_test_server(StaticProvider(sample_product())).await;

    server
        .post("/api/v1/recommend")
        .json(&json!({ "query": "wireless headphones" }))
        .await;
    server
        .post("/api/v1/iterate")
        .json(&json!({ "extra_text": "cheaper" }))
        .await;

    let response = server.delete("/api/v1/recommendations").await;
    response.assert_status(axum::http::StatusCode::NO_CONTENT);

    let history: Vec<serde_json::Value> = server.get("/api/v1/recommendations").await.json();
    assert!(history.is_empty());
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = create_test_server(StaticProvider(sample_product())).await;

    let response = server.get("/health").await;
    assert!(response.headers().get(REQUEST_ID_HEADER).is_some());

    let id = uuid::Uuid::new_v4().to_string();
    let response = server
        .get("/health")
        .add_header(
            HeaderName::from_static(REQUEST_ID_HEADER),
            HeaderValue::from_str(&id).unwrap(),
        )
        .await;
    assert_eq!(
        response.headers().get(REQUEST_ID_HEADER).unwrap(),
        &HeaderValue::from_str(&id).unwrap()
    );
}
