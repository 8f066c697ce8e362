//! Product resolution: spoken mention to catalog product
//!
//! Wraps the catalog index with the confidence gate. A nearest neighbor only
//! counts as a match when its cosine distance is at or below the configured
//! threshold; everything else, including index failures, resolves to
//! `Unmatched` so one bad mention never sinks the order.

use std::sync::Arc;

use crate::catalog::CatalogIndex;
use crate::order::{Resolution, ResolvedProduct};

pub struct ProductResolver {
    index: Arc<dyn CatalogIndex>,
    threshold: f64,
    top_k: usize,
}

impl ProductResolver {
    #[must_use]
    pub fn new(index: Arc<dyn CatalogIndex>, threshold: f64, top_k: usize) -> Self {
        Self {
            index,
            threshold,
            top_k: top_k.max(1),
        }
    }

    /// Resolve a spoken product mention against the catalog
    pub async fn resolve(&self, mention: &str) -> Resolution {
        let candidates = match self.index.search(mention, self.top_k).await {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::warn!(mention = %mention, error = %e, "catalog search failed");
                return Resolution::Unmatched {
                    reason: "catalog temporarily unavailable".to_string(),
                };
            }
        };

        let Some(best) = candidates.into_iter().next() else {
            return Resolution::Unmatched {
                reason: "no similar product in catalog".to_string(),
            };
        };

        if best.distance > self.threshold {
            tracing::debug!(
                mention = %mention,
                closest = %best.entry.name,
                distance = best.distance,
                threshold = self.threshold,
                "closest candidate above threshold"
            );
            return Resolution::Unmatched {
                reason: format!(
                    "no confident match (closest: {}, distance {:.3})",
                    best.entry.name, best.distance
                ),
            };
        }

        tracing::debug!(
            mention = %mention,
            product = %best.entry.name,
            distance = best.distance,
            "mention resolved"
        );
        Resolution::Matched(ResolvedProduct {
            id: best.entry.id,
            name: best.entry.name,
            price: best.entry.price,
            unit: best.entry.unit,
            image_url: best.entry.image_url,
            distance: best.distance,
        })
    }
}
