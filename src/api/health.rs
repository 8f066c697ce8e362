//! Liveness and readiness probes

use std::sync::Arc;

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde::Serialize;

use super::ApiState;

/// Liveness body: the process is up and knows its version
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Readiness body: aggregate verdict plus one entry per dependency
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    pub checks: DependencyChecks,
}

/// The dependencies every order crosses: `SQLite` and the catalog index
#[derive(Serialize)]
pub struct DependencyChecks {
    pub database: CheckResult,
    pub catalog: CheckResult,
}

/// Verdict for a single dependency probe
#[derive(Serialize)]
pub struct CheckResult {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CheckResult {
    const fn ok() -> Self {
        Self {
            status: "ok",
            message: None,
        }
    }

    fn fail(message: impl Into<String>) -> Self {
        Self {
            status: "fail",
            message: Some(message.into()),
        }
    }

    fn passed(&self) -> bool {
        self.status == "ok"
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn ready(State(state): State<Arc<ApiState>>) -> (StatusCode, Json<ReadinessResponse>) {
    let database = check_database(&state);
    let catalog = check_catalog(&state).await;

    let (status, code) = if database.passed() && catalog.passed() {
        ("ok", StatusCode::OK)
    } else {
        ("degraded", StatusCode::SERVICE_UNAVAILABLE)
    };

    (
        code,
        Json(ReadinessResponse {
            status,
            checks: DependencyChecks { database, catalog },
        }),
    )
}

/// Round-trip a trivial query so a wedged pool shows up here, not mid-order
fn check_database(state: &ApiState) -> CheckResult {
    let conn = match state.db.get() {
        Ok(conn) => conn,
        Err(e) => return CheckResult::fail(format!("cannot check out a connection: {e}")),
    };
    match conn.query_row("SELECT 1", [], |_| Ok(())) {
        Ok(()) => CheckResult::ok(),
        Err(e) => CheckResult::fail(format!("probe query failed: {e}")),
    }
}

/// Ask the catalog index for its row count
///
/// An empty catalog is still "ok": the pipeline runs, every mention just
/// resolves to unmatched until the first sync lands.
async fn check_catalog(state: &ApiState) -> CheckResult {
    match state.index.count().await {
        Ok(_) => CheckResult::ok(),
        Err(e) => CheckResult::fail(format!("index query failed: {e}")),
    }
}

/// Stateless liveness router
pub fn router() -> Router {
    Router::new().route("/health", get(health))
}

/// Readiness router, stateful so the probes can reach their targets
pub fn ready_router(state: Arc<ApiState>) -> Router {
    Router::new().route("/ready", get(ready)).with_state(state)
}
