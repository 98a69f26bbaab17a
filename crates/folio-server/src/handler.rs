use std::str::FromStr;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use folio_sdk::{
    BranchId, CommitId, DiffResponse, DiffStrategy, Folio, ListCommitsResponse, RollbackResponse,
    SdkError, SdkResult,
};
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;

/// Header naming the acting user. Authentication happens upstream.
pub const ACTOR_HEADER: &str = "x-actor-id";

pub type AppState = Arc<Folio>;

/// Health check handler.
pub async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Info handler.
pub async fn info_handler(State(folio): State<AppState>) -> Json<serde_json::Value> {
    let pagination = folio.pagination();
    Json(json!({
        "name": "folio-server",
        "version": env!("CARGO_PKG_VERSION"),
        "diffStrategies": [DiffStrategy::Computed],
        "pagination": {
            "defaultLimit": pagination.default_limit,
            "maxLimit": pagination.max_limit,
        },
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListCommitsParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

pub async fn list_commits_handler(
    State(folio): State<AppState>,
    Path(branch_id): Path<String>,
    Query(params): Query<ListCommitsParams>,
) -> Result<Json<ListCommitsResponse>, ApiError> {
    let branch_id: BranchId = parse_field("branchId", &branch_id)?;
    let limit = params
        .limit
        .as_deref()
        .map(|v| parse_field::<usize>("limit", v))
        .transpose()?;
    let offset = params
        .offset
        .as_deref()
        .map(|v| parse_field::<usize>("offset", v))
        .transpose()?;
    let page = blocking(folio, move |f| f.list_commits(&branch_id, limit, offset)).await?;
    Ok(Json(page))
}

#[derive(Debug, Default, Deserialize)]
pub struct DiffParams {
    pub from: Option<String>,
    pub to: Option<String>,
    pub strategy: Option<String>,
}

pub async fn diff_handler(
    State(folio): State<AppState>,
    Path(branch_id): Path<String>,
    Query(params): Query<DiffParams>,
) -> Result<Json<DiffResponse>, ApiError> {
    let strategy = params
        .strategy
        .as_deref()
        .map(DiffStrategy::from_str)
        .transpose()?
        .unwrap_or_default();
    if strategy == DiffStrategy::Stored {
        return Err(SdkError::NotImplemented(
            "stored diffs are not available; use strategy=computed".into(),
        )
        .into());
    }

    let branch_id: BranchId = parse_field("branchId", &branch_id)?;
    let from: CommitId = parse_field("from", required("from", params.from.as_deref())?)?;
    let to: CommitId = parse_field("to", required("to", params.to.as_deref())?)?;
    let diff = blocking(folio, move |f| f.diff(&branch_id, &from, &to, strategy)).await?;
    Ok(Json(diff))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollbackRequest {
    pub target_commit_id: String,
    pub message: Option<String>,
}

pub async fn rollback_handler(
    State(folio): State<AppState>,
    Path(branch_id): Path<String>,
    headers: HeaderMap,
    body: Result<Json<RollbackRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RollbackResponse>), ApiError> {
    let actor_id = actor_id(&headers)?;
    let Json(request) = body.map_err(|e| ApiError::invalid_request(e.body_text()))?;
    let branch_id: BranchId = parse_field("branchId", &branch_id)?;
    let target: CommitId = parse_field("targetCommitId", &request.target_commit_id)?;

    let response = blocking(folio, move |f| {
        f.rollback(&branch_id, &target, request.message.as_deref(), &actor_id)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Store operations hold a lock for their whole transaction, so they run on
/// the blocking pool rather than an async worker.
async fn blocking<T, F>(folio: AppState, op: F) -> Result<T, ApiError>
where
    F: FnOnce(&Folio) -> SdkResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || op(&folio))
        .await
        .map_err(|e| ApiError(SdkError::StorageUnavailable(format!("storage task failed: {e}"))))?
        .map_err(ApiError::from)
}

fn actor_id(headers: &HeaderMap) -> Result<String, ApiError> {
    headers
        .get(ACTOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::invalid_request(format!("missing {ACTOR_HEADER} header")))
}

fn required<'a>(name: &str, value: Option<&'a str>) -> Result<&'a str, ApiError> {
    value.ok_or_else(|| ApiError::invalid_request(format!("missing query parameter {name}")))
}

fn parse_field<T: FromStr>(name: &str, value: &str) -> Result<T, ApiError> {
    value
        .parse()
        .map_err(|_| ApiError::invalid_request(format!("invalid {name}: {value:?}")))
}
