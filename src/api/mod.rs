//! HTTP API server for ordervox

pub mod catalog;
pub mod health;
pub mod orders;

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::Result;
use crate::catalog::{CatalogIndex, CatalogSource, DbPool};
use crate::pipeline::OrderPipeline;

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub db: DbPool,
    pub pipeline: Arc<OrderPipeline>,
    pub index: Arc<dyn CatalogIndex>,
    /// Upstream catalog endpoint; absent when sync is not configured
    pub source: Option<CatalogSource>,
    /// Accepted audio filename extensions, lowercase, without dots
    pub audio_formats: Vec<String>,
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
}

impl ApiServer {
    #[must_use]
    pub fn new(state: ApiState, port: u16) -> Self {
        Self {
            state: Arc::new(state),
            port,
        }
    }

    /// Assemble the full route tree
    fn router(&self) -> Router {
        let router = Router::new()
            .nest("/api/orders", orders::router(self.state.clone()))
            .nest("/api/catalog", catalog::router(self.state.clone()))
            .merge(health::router())
            .merge(health::ready_router(self.state.clone()));

        // The storefront calls from another origin; stay permissive
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        router.layer(cors).layer(TraceLayer::new_for_http())
    }

    /// Bind and serve until the task is aborted
    ///
    /// # Errors
    ///
    /// Returns error if the port cannot be bound or the server exits
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("cannot bind {addr}: {e}")))?;

        tracing::info!(%addr, "http server listening");

        axum::serve(listener, self.router())
            .await
            .map_err(|e| crate::Error::Config(format!("http server exited: {e}")))?;

        Ok(())
    }

    /// Serve on a background task, returning its handle
    #[must_use]
    pub fn spawn(self) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run().await })
    }
}
