//! Daemon - the main ordervox service
//!
//! Wires the pipeline stages, the catalog index, and the periodic sync task
//! together, then serves HTTP until interrupted.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::api::{ApiServer, ApiState};
use crate::catalog::{self, CatalogIndex, CatalogSource, DbPool, Embedder, VecCatalogIndex};
use crate::extractor::Extractor;
use crate::pipeline::OrderPipeline;
use crate::resolver::ProductResolver;
use crate::transcriber::Transcriber;
use crate::{Config, Result};

/// The ordervox daemon
pub struct Daemon {
    config: Config,
    db: DbPool,
}

impl Daemon {
    /// Create a new daemon instance
    ///
    /// # Errors
    ///
    /// Returns error if the catalog database cannot be initialized
    pub fn new(config: Config) -> Result<Self> {
        let db_path = config.db_path();
        let db = catalog::init(&db_path)?;

        tracing::info!(path = %db_path.display(), "catalog database ready");

        Ok(Self { config, db })
    }

    /// Run the daemon until interrupted
    ///
    /// # Errors
    ///
    /// Returns error if a component fails to initialize or the server dies
    pub async fn run(self) -> Result<()> {
        let api_key = self.config.require_api_key()?;
        let openai = &self.config.openai;

        let transcriber = Transcriber::new(
            api_key.clone(),
            openai.stt_model.clone(),
            openai.base_url.clone(),
            openai.timeout,
        )?;
        let extractor = Extractor::new(
            api_key.clone(),
            openai.llm_model.clone(),
            openai.base_url.clone(),
            openai.timeout,
        )?;
        let embedder = Embedder::new(&api_key, &openai.embed_model, &openai.base_url, openai.timeout)?;

        let index: Arc<dyn CatalogIndex> =
            Arc::new(VecCatalogIndex::new(self.db.clone(), embedder));
        let resolver = ProductResolver::new(
            Arc::clone(&index),
            self.config.matching.threshold,
            self.config.matching.top_k,
        );
        let pipeline = Arc::new(OrderPipeline::new(transcriber, extractor, resolver));

        tracing::info!(
            stt_model = %openai.stt_model,
            llm_model = %openai.llm_model,
            embed_model = %openai.embed_model,
            threshold = self.config.matching.threshold,
            "pipeline ready"
        );

        // Spawn periodic catalog sync if configured
        let (source, sync_task) = if let Some(ref sync) = self.config.sync {
            let source = CatalogSource::new(&sync.catalog_url, openai.timeout)?;
            tracing::info!(
                url = %sync.catalog_url,
                interval_secs = sync.interval_secs,
                "catalog sync enabled"
            );
            let task = catalog::sync::spawn_periodic(
                source.clone(),
                Arc::clone(&index),
                sync.interval_secs,
            );
            (Some(source), Some(task))
        } else {
            tracing::info!("catalog sync disabled - index fed via seed command or ingestion endpoint");
            (None, None)
        };

        // Set up shutdown signal
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = shutdown_tx.send(()).await;
            }
        });

        let state = ApiState {
            db: self.db.clone(),
            pipeline,
            index,
            source,
            audio_formats: self.config.audio_formats.clone(),
        };
        let server = ApiServer::new(state, self.config.port).spawn();

        shutdown_rx.recv().await;
        tracing::info!("shutdown requested");

        if let Some(task) = sync_task {
            task.abort();
        }
        server.abort();

        tracing::info!("daemon stopped");
        Ok(())
    }
}
