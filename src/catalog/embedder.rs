//! Embedding generation for catalog entries and spoken mentions

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Width of a text-embedding-3-small vector
pub const EMBEDDING_DIM: usize = 1536;

/// OpenAI-compatible embedding client
pub struct Embedder {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

impl Embedder {
    /// Create a new embedder
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty or the HTTP client cannot be built
    pub fn new(api_key: &str, model: &str, base_url: &str, timeout: Duration) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "OpenAI API key is required for embeddings".to_string(),
            ));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    /// Generate an embedding for a single text
    ///
    /// # Errors
    ///
    /// Returns error if the API call fails
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("no embedding returned".to_string()))
    }

    /// Generate embeddings for multiple texts in one API call
    ///
    /// Results come back in input order regardless of the order the API
    /// reports them in.
    ///
    /// # Errors
    ///
    /// Returns error if the API call fails or returns the wrong count
    pub async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };

        let url = format!("{}/v1/embeddings", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Embedding(format!(
                "embedding API error {status}: {body}"
            )));
        }

        let mut result: EmbeddingResponse = response.json().await?;
        if result.data.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                result.data.len()
            )));
        }
        result.data.sort_by_key(|d| d.index);
        Ok(result.data.into_iter().map(|d| d.embedding).collect())
    }

    /// Serialize an embedding to bytes for sqlite-vec storage
    #[must_use]
    pub fn to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize bytes back to an embedding
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_embedder(base_url: &str) -> Embedder {
        Embedder::new(
            "test-key",
            "text-embedding-3-small",
            base_url,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_le_byte_roundtrip() {
        let embedding = vec![0.5_f32, -0.25, 1.0, 0.0];
        let bytes = Embedder::to_bytes(&embedding);
        assert_eq!(bytes.len(), 16);
        assert_eq!(Embedder::from_bytes(&bytes), embedding);
    }

    #[test]
    fn test_blank_api_key_rejected() {
        let result = Embedder::new(
            "",
            "text-embedding-3-small",
            "https://api.openai.com",
            Duration::from_secs(5),
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_empty_batch_skips_api() {
        // No server behind this URL; an API call would error out
        let embedder = test_embedder("http://127.0.0.1:1");
        let result = embedder.embed_batch(&[]).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_batch_restores_input_order() {
        let server = httpmock::MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(httpmock::Method::POST).path("/v1/embeddings");
            then.status(200).json_body(serde_json::json!({
                "data": [
                    { "embedding": [2.0, 0.0], "index": 1 },
                    { "embedding": [1.0, 0.0], "index": 0 }
                ]
            }));
        });

        let embedder = test_embedder(&server.base_url());
        let result = embedder.embed_batch(&["first", "second"]).await.unwrap();

        mock.assert();
        assert_eq!(result, vec![vec![1.0, 0.0], vec![2.0, 0.0]]);
    }

    #[tokio::test]
    async fn test_count_mismatch_rejected() {
        let server = httpmock::MockServer::start();
        server.mock(|when, then| {
            when.method(httpmock::Method::POST).path("/v1/embeddings");
            then.status(200).json_body(serde_json::json!({
                "data": [{ "embedding": [1.0, 0.0], "index": 0 }]
            }));
        });

        let embedder = test_embedder(&server.base_url());
        let result = embedder.embed_batch(&["first", "second"]).await;
        assert!(matches!(result, Err(Error::Embedding(_))));
    }
}
