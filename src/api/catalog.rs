//! Catalog ingestion and search endpoints

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use super::ApiState;
use crate::catalog::{CatalogEntry, ScoredEntry, sync::sync_once};

const DEFAULT_SEARCH_K: usize = 5;

/// Build catalog router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/entries", post(upsert_entries))
        .route("/sync", post(trigger_sync))
        .route("/search", get(search))
        .with_state(state)
}

/// Response for bulk ingestion
#[derive(Debug, Serialize)]
pub struct IndexedResponse {
    pub indexed: usize,
}

/// Bulk-upsert catalog entries, idempotent by id
async fn upsert_entries(
    State(state): State<Arc<ApiState>>,
    Json(entries): Json<Vec<CatalogEntry>>,
) -> Result<Json<IndexedResponse>, CatalogError> {
    let indexed = state
        .index
        .upsert(&entries)
        .await
        .map_err(|e| CatalogError::IndexFailed(e.to_string()))?;
    Ok(Json(IndexedResponse { indexed }))
}

/// Response for a triggered sync
#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub synced: usize,
}

/// Pull the upstream catalog and re-index it now
async fn trigger_sync(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<SyncResponse>, CatalogError> {
    let source = state
        .source
        .as_ref()
        .ok_or(CatalogError::NotConfigured("no upstream catalog configured"))?;

    let synced = sync_once(source, state.index.as_ref())
        .await
        .map_err(|e| CatalogError::SyncFailed(e.to_string()))?;
    Ok(Json(SyncResponse { synced }))
}

/// Search query parameters
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    q: String,
    k: Option<usize>,
}

/// Rank catalog entries against free text
async fn search(
    State(state): State<Arc<ApiState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<ScoredEntry>>, CatalogError> {
    if params.q.trim().is_empty() {
        return Err(CatalogError::BadRequest("query must not be empty"));
    }

    let results = state
        .index
        .search(&params.q, params.k.unwrap_or(DEFAULT_SEARCH_K))
        .await
        .map_err(|e| CatalogError::IndexFailed(e.to_string()))?;
    Ok(Json(results))
}

/// Catalog endpoint errors
#[derive(Debug)]
pub enum CatalogError {
    NotConfigured(&'static str),
    BadRequest(&'static str),
    IndexFailed(String),
    SyncFailed(String),
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: ErrorBody,
        }

        #[derive(Serialize)]
        struct ErrorBody {
            code: &'static str,
            message: String,
        }

        let (status, code, message) = match self {
            Self::NotConfigured(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "not_configured",
                msg.to_string(),
            ),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.to_string()),
            Self::IndexFailed(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "index_failed", msg),
            Self::SyncFailed(msg) => (StatusCode::BAD_GATEWAY, "sync_failed", msg),
        };

        (
            status,
            Json(ErrorResponse {
                error: ErrorBody { code, message },
            }),
        )
            .into_response()
    }
}
