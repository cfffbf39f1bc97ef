use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{PreferenceUpdate, Recommendation, UserPreferences};
use crate::services::workflow::WorkflowSnapshot;

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct IterateRequest {
    #[serde(default)]
    pub extra_text: String,
}

/// Workflow view returned by the workflow endpoints: the state snapshot plus
/// the resolved current recommendation. Failures reach the caller only as
/// `last_error` and `is_loading`.
#[derive(Debug, Serialize)]
pub struct WorkflowResponse {
    pub pending_query: String,
    pub is_loading: bool,
    pub last_error: Option<String>,
    pub current: Option<Recommendation>,
}

impl WorkflowResponse {
    fn new(snapshot: WorkflowSnapshot, current: Option<Recommendation>) -> Self {
        Self {
            pending_query: snapshot.pending_query,
            is_loading: snapshot.is_loading,
            last_error: snapshot.last_error,
            current,
        }
    }
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Get the user preferences, creating defaults on first read
pub async fn get_preferences(State(state): State<AppState>) -> Json<UserPreferences> {
    Json(state.preferences.get_or_create().await)
}

/// Apply a partial preference update
pub async fn update_preferences(
    State(state): State<AppState>,
    Json(update): Json<PreferenceUpdate>,
) -> Json<UserPreferences> {
    Json(state.preferences.update(update).await)
}

/// Fetch a new recommendation for a query
pub async fn recommend(
    State(state): State<AppState>,
    Json(request): Json<RecommendRequest>,
) -> AppResult<Json<WorkflowResponse>> {
    let snapshot = state.workflow.get_recommendation(&request.query).await;
    workflow_response(&state, snapshot).await
}

/// Refine the current recommendation
pub async fn iterate(
    State(state): State<AppState>,
    Json(request): Json<IterateRequest>,
) -> AppResult<Json<WorkflowResponse>> {
    let snapshot = state
        .workflow
        .iterate_recommendation(&request.extra_text)
        .await;
    workflow_response(&state, snapshot).await
}

/// Current workflow state
pub async fn workflow_state(State(state): State<AppState>) -> AppResult<Json<WorkflowResponse>> {
    let snapshot = state.workflow.snapshot();
    workflow_response(&state, snapshot).await
}

/// Resolve the current recommendation
pub async fn current_recommendation(
    State(state): State<AppState>,
) -> AppResult<Json<Recommendation>> {
    state
        .workflow
        .current_recommendation()
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("No current recommendation".to_string()))
}

/// Drop the current pointer; history is untouched
pub async fn clear_recommendation(
    State(state): State<AppState>,
) -> AppResult<Json<WorkflowResponse>> {
    let snapshot = state.workflow.clear_recommendation();
    workflow_response(&state, snapshot).await
}

/// Full recommendation history, newest first
pub async fn list_recommendations(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Recommendation>>> {
    Ok(Json(state.history.list().await?))
}

/// Delete one recommendation; unknown ids are a no-op
pub async fn delete_recommendation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.history.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Clear the whole history
pub async fn clear_history(State(state): State<AppState>) -> AppResult<StatusCode> {
    state.history.clear().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn workflow_response(
    state: &AppState,
    snapshot: WorkflowSnapshot,
) -> AppResult<Json<WorkflowResponse>> {
    let current = state.workflow.current_recommendation().await?;
    Ok(Json(WorkflowResponse::new(snapshot, current)))
}
