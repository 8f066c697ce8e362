//! Vector index over the product catalog
//!
//! `CatalogIndex` is the seam the resolver and the HTTP layer depend on;
//! `VecCatalogIndex` is the sqlite-vec implementation. Tests substitute
//! their own fakes.

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::params;
use rust_decimal::Decimal;

use super::embedder::Embedder;
use super::{CatalogEntry, DbPool, ScoredEntry};
use crate::{Error, Result};

/// Read/write surface of the catalog index
#[async_trait]
pub trait CatalogIndex: Send + Sync {
    /// Insert or overwrite entries keyed by id, re-embedding their names
    ///
    /// Returns the number of entries written.
    async fn upsert(&self, entries: &[CatalogEntry]) -> Result<usize>;

    /// Nearest catalog entries for a free-text mention, closest first
    async fn search(&self, text: &str, top_k: usize) -> Result<Vec<ScoredEntry>>;

    /// Number of indexed entries
    async fn count(&self) -> Result<usize>;
}

/// sqlite-vec backed catalog index
pub struct VecCatalogIndex {
    pool: DbPool,
    embedder: Embedder,
}

impl VecCatalogIndex {
    #[must_use]
    pub fn new(pool: DbPool, embedder: Embedder) -> Self {
        Self { pool, embedder }
    }
}

#[async_trait]
impl CatalogIndex for VecCatalogIndex {
    async fn upsert(&self, entries: &[CatalogEntry]) -> Result<usize> {
        if entries.is_empty() {
            return Ok(0);
        }

        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        let embeddings = self.embedder.embed_batch(&names).await?;

        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        let indexed_at = Utc::now().to_rfc3339();
        for (entry, embedding) in entries.iter().zip(embeddings.iter()) {
            tx.execute(
                r"INSERT INTO products (id, name, price, unit, image_url, sku, indexed_at)
                  VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                  ON CONFLICT(id) DO UPDATE SET
                      name = excluded.name,
                      price = excluded.price,
                      unit = excluded.unit,
                      image_url = excluded.image_url,
                      sku = excluded.sku,
                      indexed_at = excluded.indexed_at",
                params![
                    entry.id,
                    entry.name,
                    entry.price.to_string(),
                    entry.unit,
                    entry.image_url,
                    entry.sku,
                    indexed_at
                ],
            )?;

            // vec0 has no upsert; replace the embedding row
            tx.execute(
                "DELETE FROM products_vec WHERE product_id = ?1",
                params![entry.id],
            )?;
            tx.execute(
                "INSERT INTO products_vec (product_id, embedding) VALUES (?1, ?2)",
                params![entry.id, Embedder::to_bytes(embedding)],
            )?;
        }
        tx.commit()?;

        tracing::info!(count = entries.len(), "catalog entries indexed");
        Ok(entries.len())
    }

    async fn search(&self, text: &str, top_k: usize) -> Result<Vec<ScoredEntry>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let embedding = self.embedder.embed(text).await?;
        let embedding_bytes = Embedder::to_bytes(&embedding);
        let limit = i64::try_from(top_k).unwrap_or(i64::MAX);

        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            r"SELECT p.id, p.name, p.price, p.unit, p.image_url, p.sku, v.distance
              FROM products p
              INNER JOIN (
                  SELECT product_id, distance
                  FROM products_vec
                  WHERE embedding MATCH ?1
                  ORDER BY distance
                  LIMIT ?2
              ) v ON p.id = v.product_id
              ORDER BY v.distance",
        )?;

        let rows = stmt.query_map(params![embedding_bytes, limit], |row| {
            let price_text: String = row.get(2)?;
            let price = price_text.parse::<Decimal>().map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    2,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;
            Ok(ScoredEntry {
                entry: CatalogEntry {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    price,
                    unit: row.get(3)?,
                    image_url: row.get(4)?,
                    sku: row.get(5)?,
                },
                distance: row.get(6)?,
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    async fn count(&self) -> Result<usize> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::super::{EMBEDDING_DIM, init_memory};
    use super::*;

    fn entry(id: &str, name: &str, price: i64, unit: &str) -> CatalogEntry {
        CatalogEntry {
            id: id.to_string(),
            name: name.to_string(),
            price: Decimal::from(price),
            unit: unit.to_string(),
            image_url: None,
            sku: None,
        }
    }

    /// Embedding with all weight on one dimension
    fn unit_embedding(hot: usize) -> Vec<f32> {
        let mut v = vec![0.0_f32; EMBEDDING_DIM];
        v[hot] = 1.0;
        v
    }

    /// Embedding close to dimension 0, far from dimension 1
    fn near_zero_embedding() -> Vec<f32> {
        let mut v = vec![0.0_f32; EMBEDDING_DIM];
        v[0] = 0.9;
        v[1] = 0.1;
        v
    }

    fn test_index(base_url: &str) -> VecCatalogIndex {
        let pool = init_memory().unwrap();
        let embedder = Embedder::new(
            "test-key",
            "text-embedding-3-small",
            base_url,
            Duration::from_secs(5),
        )
        .unwrap();
        VecCatalogIndex::new(pool, embedder)
    }

    #[tokio::test]
    async fn test_upsert_and_search_ranks_by_distance() {
        let server = httpmock::MockServer::start();
        server.mock(|when, then| {
            when.method(httpmock::Method::POST)
                .path("/v1/embeddings")
                .json_body(serde_json::json!({
                    "model": "text-embedding-3-small",
                    "input": ["Premium bagged cement", "Steel rebar 12mm"]
                }));
            then.status(200).json_body(serde_json::json!({
                "data": [
                    { "embedding": unit_embedding(0), "index": 0 },
                    { "embedding": unit_embedding(1), "index": 1 }
                ]
            }));
        });
        server.mock(|when, then| {
            when.method(httpmock::Method::POST)
                .path("/v1/embeddings")
                .json_body(serde_json::json!({
                    "model": "text-embedding-3-small",
                    "input": ["cement bags"]
                }));
            then.status(200).json_body(serde_json::json!({
                "data": [{ "embedding": near_zero_embedding(), "index": 0 }]
            }));
        });

        let index = test_index(&server.base_url());
        let written = index
            .upsert(&[
                entry("10", "Premium bagged cement", 88_000, "bag"),
                entry("11", "Steel rebar 12mm", 125_000, "length"),
            ])
            .await
            .unwrap();
        assert_eq!(written, 2);
        assert_eq!(index.count().await.unwrap(), 2);

        let results = index.search("cement bags", 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].entry.id, "10");
        assert!(results[0].distance < 0.1);
        assert_eq!(results[1].entry.id, "11");
        assert!(results[1].distance > 0.5);
    }

    #[tokio::test]
    async fn test_upsert_overwrites_by_id() {
        let server = httpmock::MockServer::start();
        server.mock(|when, then| {
            when.method(httpmock::Method::POST)
                .path("/v1/embeddings")
                .json_body(serde_json::json!({
                    "model": "text-embedding-3-small",
                    "input": ["Premium bagged cement"]
                }));
            then.status(200).json_body(serde_json::json!({
                "data": [{ "embedding": unit_embedding(0), "index": 0 }]
            }));
        });
        server.mock(|when, then| {
            when.method(httpmock::Method::POST)
                .path("/v1/embeddings")
                .json_body(serde_json::json!({
                    "model": "text-embedding-3-small",
                    "input": ["cement bags"]
                }));
            then.status(200).json_body(serde_json::json!({
                "data": [{ "embedding": near_zero_embedding(), "index": 0 }]
            }));
        });

        let index = test_index(&server.base_url());
        index
            .upsert(&[entry("10", "Premium bagged cement", 88_000, "bag")])
            .await
            .unwrap();
        index
            .upsert(&[entry("10", "Premium bagged cement", 90_000, "bag")])
            .await
            .unwrap();

        assert_eq!(index.count().await.unwrap(), 1);
        let results = index.search("cement bags", 1).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].entry.price, Decimal::from(90_000));
    }

    #[tokio::test]
    async fn test_search_empty_index() {
        let server = httpmock::MockServer::start();
        server.mock(|when, then| {
            when.method(httpmock::Method::POST).path("/v1/embeddings");
            then.status(200).json_body(serde_json::json!({
                "data": [{ "embedding": unit_embedding(0), "index": 0 }]
            }));
        });

        let index = test_index(&server.base_url());
        let results = index.search("anything", 1).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_search_zero_k_skips_embedding() {
        // Dead endpoint; an embedding call would fail the test
        let index = test_index("http://127.0.0.1:1");
        let results = index.search("anything", 0).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_empty_upsert() {
        let index = test_index("http://127.0.0.1:1");
        assert_eq!(index.upsert(&[]).await.unwrap(), 0);
        assert_eq!(index.count().await.unwrap(), 0);
    }
}
