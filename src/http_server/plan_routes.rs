//! Plan HTTP Routes
//!
//! CRUD over plan trees plus a single-field search over the projection.
//! Every response that carries a plan or a write outcome sets `ETag`.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::errors::{ApiError, ApiResult};
use crate::coordinator::{PlanCoordinator, WriteOutcome};
use crate::errors::{PlanError, PlanResult};
use crate::fingerprint::{etag, fingerprint, token_matches};
use crate::model::{Plan, PlanPatch};
use crate::search::{SearchFacade, SearchHit};

// ==================
// Shared State
// ==================

pub struct PlanState {
    pub coordinator: Arc<PlanCoordinator>,
    pub search: Arc<dyn SearchFacade>,
    pub index_name: String,
}

// ==================
// Request/Response Types
// ==================

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub field: Option<String>,
    pub value: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub hits: Vec<SearchHit>,
    pub total: usize,
}

pub fn plan_routes(state: Arc<PlanState>) -> Router {
    Router::new()
        .route("/plan", post(create_plan))
        .route(
            "/plan/{object_id}",
            get(get_plan)
                .patch(patch_plan)
                .put(replace_plan)
                .delete(delete_plan),
        )
        .route("/plans", get(list_plans))
        .route("/search", get(search_plans))
        .with_state(state)
}

// ==================
// Handlers
// ==================

async fn create_plan(State(state): State<Arc<PlanState>>, body: Bytes) -> ApiResult<Response> {
    let plan: Plan = parse_body(&body)?;
    let id = plan.object_id.clone();
    let outcome = run_blocking(&state, move |coordinator| coordinator.create(plan)).await?;
    Ok(write_response(&outcome, &id))
}

async fn get_plan(
    State(state): State<Arc<PlanState>>,
    Path(object_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let record = {
        let id = object_id.clone();
        run_blocking(&state, move |coordinator| coordinator.get_any(&id)).await?
    };
    let current = fingerprint(&record).map_err(PlanError::from)?;

    if let Some(client) = if_none_match(&headers) {
        if token_matches(client, &current) {
            return Ok(not_modified(&current));
        }
    }
    Ok(with_etag((StatusCode::OK, Json(record)).into_response(), &current))
}

async fn list_plans(State(state): State<Arc<PlanState>>) -> ApiResult<Json<Vec<Plan>>> {
    let plans = run_blocking(&state, |coordinator| coordinator.list()).await?;
    Ok(Json(plans))
}

async fn patch_plan(
    State(state): State<Arc<PlanState>>,
    Path(object_id): Path<String>,
    body: Bytes,
) -> ApiResult<Response> {
    let patch: PlanPatch = parse_body(&body)?;
    let outcome = {
        let id = object_id.clone();
        run_blocking(&state, move |coordinator| coordinator.patch(&id, patch)).await?
    };
    Ok(write_response(&outcome, &object_id))
}

async fn replace_plan(
    State(state): State<Arc<PlanState>>,
    Path(object_id): Path<String>,
    body: Bytes,
) -> ApiResult<Response> {
    let plan: Plan = parse_body(&body)?;
    let outcome = {
        let id = object_id.clone();
        run_blocking(&state, move |coordinator| coordinator.replace(&id, plan)).await?
    };
    Ok(write_response(&outcome, &object_id))
}

async fn delete_plan(
    State(state): State<Arc<PlanState>>,
    Path(object_id): Path<String>,
) -> ApiResult<StatusCode> {
    run_blocking(&state, move |coordinator| coordinator.delete(&object_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn search_plans(
    State(state): State<Arc<PlanState>>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<SearchResponse>> {
    let field = params
        .field
        .filter(|f| !f.is_empty())
        .ok_or_else(|| ApiError::BadRequest("query parameter 'field' is required".to_string()))?;
    let value = params
        .value
        .ok_or_else(|| ApiError::BadRequest("query parameter 'value' is required".to_string()))?;

    let hits = state.search.query(&state.index_name, &field, &value)?;
    let total = hits.len();
    Ok(Json(SearchResponse { hits, total }))
}

// ==================
// Helpers
// ==================

/// Runs a coordinator call on the blocking pool; store calls may fsync.
async fn run_blocking<T, F>(state: &PlanState, call: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&PlanCoordinator) -> PlanResult<T> + Send + 'static,
{
    let coordinator = Arc::clone(&state.coordinator);
    let result = tokio::task::spawn_blocking(move || call(&coordinator))
        .await
        .map_err(|e| PlanError::Dependency(format!("Coordinator task failed: {}", e)))?;
    Ok(result?)
}

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> ApiResult<T> {
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(e.to_string()))
}

fn if_none_match(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok())
}

fn with_etag(mut response: Response, fingerprint: &str) -> Response {
    if let Ok(value) = HeaderValue::from_str(&etag(fingerprint)) {
        response.headers_mut().insert(header::ETAG, value);
    }
    response
}

fn not_modified(fingerprint: &str) -> Response {
    with_etag(StatusCode::NOT_MODIFIED.into_response(), fingerprint)
}

fn write_response(outcome: &WriteOutcome, object_id: &str) -> Response {
    let (status, message) = match outcome {
        WriteOutcome::Created { .. } => (StatusCode::CREATED, "Plan created successfully"),
        WriteOutcome::Updated { .. } => (StatusCode::OK, "Plan updated successfully"),
        WriteOutcome::Unchanged { .. } => return not_modified(outcome.fingerprint()),
    };
    let body = Json(json!({ "message": message, "objectId": object_id }));
    with_etag((status, body).into_response(), outcome.fingerprint())
}
