//! Pull-based catalog synchronization
//!
//! Fetches the full catalog from the upstream commerce backend and re-indexes
//! it. Runs once at startup and then on a fixed interval. Entries that vanish
//! upstream stay in the index until the next overwrite; sync never deletes.

use std::sync::Arc;
use std::time::Duration;

use super::{CatalogEntry, CatalogIndex};
use crate::{Error, Result};

/// HTTP client for the upstream catalog endpoint
///
/// The endpoint serves the full product list as a JSON array of entries.
#[derive(Clone)]
pub struct CatalogSource {
    url: String,
    client: reqwest::Client,
}

impl CatalogSource {
    /// Create a new catalog source
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.to_string(),
            client,
        })
    }

    /// Fetch the full catalog from upstream
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the body is not a catalog array
    pub async fn fetch(&self) -> Result<Vec<CatalogEntry>> {
        let response = self.client.get(&self.url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Sync(format!("catalog API error {status}: {body}")));
        }

        let entries: Vec<CatalogEntry> = response.json().await?;
        Ok(entries)
    }
}

/// Fetch the catalog once and upsert it into the index
///
/// An empty upstream catalog is treated as a no-op so a misbehaving backend
/// cannot hollow out a working index.
///
/// # Errors
///
/// Returns error if the fetch or the index write fails
pub async fn sync_once(source: &CatalogSource, index: &dyn CatalogIndex) -> Result<usize> {
    let entries = source.fetch().await?;
    if entries.is_empty() {
        tracing::warn!("upstream catalog returned no entries, keeping current index");
        return Ok(0);
    }
    let written = index.upsert(&entries).await?;
    tracing::info!(entries = written, "catalog sync complete");
    Ok(written)
}

/// Spawn the periodic sync task
///
/// The first sync runs immediately; afterwards one sync per interval.
/// Failures are logged and retried on the next tick. The returned handle
/// is aborted at shutdown.
pub fn spawn_periodic(
    source: CatalogSource,
    index: Arc<dyn CatalogIndex>,
    interval_secs: u64,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        loop {
            interval.tick().await;
            if let Err(e) = sync_once(&source, index.as_ref()).await {
                tracing::warn!(error = %e, "catalog sync failed");
            }
        }
    })
}
