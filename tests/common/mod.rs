//! Shared test utilities

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use httpmock::{Method::POST, Mock, MockServer};
use ordervox::catalog::{self, CatalogEntry, CatalogIndex, ScoredEntry};
use ordervox::{DbPool, Extractor, OrderPipeline, ProductResolver, Result, Transcriber};
use rust_decimal::Decimal;

/// Set up an in-memory test database
#[must_use]
pub fn setup_test_db() -> DbPool {
    catalog::init_memory().expect("failed to init test db")
}

/// The catalog entry most tests revolve around
#[must_use]
pub fn cement_entry() -> CatalogEntry {
    CatalogEntry {
        id: "10".to_string(),
        name: "Premium bagged cement".to_string(),
        price: Decimal::from(88_000),
        unit: "bag".to_string(),
        image_url: Some("https://cdn.example.com/cement.jpg".to_string()),
        sku: Some("CEM-88".to_string()),
    }
}

/// In-memory fake catalog index
///
/// Scores by word overlap so close names rank like embeddings would:
/// distance 0.2 when the query shares a word with the entry name, 0.95
/// otherwise.
#[derive(Default)]
pub struct FakeIndex {
    entries: tokio::sync::Mutex<Vec<CatalogEntry>>,
}

impl FakeIndex {
    #[must_use]
    pub fn with_entries(entries: Vec<CatalogEntry>) -> Self {
        Self {
            entries: tokio::sync::Mutex::new(entries),
        }
    }
}

#[async_trait]
impl CatalogIndex for FakeIndex {
    async fn upsert(&self, new_entries: &[CatalogEntry]) -> Result<usize> {
        let mut entries = self.entries.lock().await;
        for entry in new_entries {
            entries.retain(|e| e.id != entry.id);
            entries.push(entry.clone());
        }
        Ok(new_entries.len())
    }

    async fn search(&self, text: &str, top_k: usize) -> Result<Vec<ScoredEntry>> {
        let entries = self.entries.lock().await;
        let query = text.to_lowercase();
        let mut scored: Vec<ScoredEntry> = entries
            .iter()
            .map(|entry| {
                let overlap = entry
                    .name
                    .to_lowercase()
                    .split_whitespace()
                    .any(|word| query.contains(word));
                ScoredEntry {
                    entry: entry.clone(),
                    distance: if overlap { 0.2 } else { 0.95 },
                }
            })
            .collect();
        scored.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.entries.lock().await.len())
    }
}

/// Build a pipeline whose OpenAI calls go to a mock server
#[must_use]
pub fn test_pipeline(base_url: &str, index: Arc<dyn CatalogIndex>) -> OrderPipeline {
    let timeout = Duration::from_secs(5);
    let transcriber = Transcriber::new(
        "test-key".to_string(),
        "whisper-1".to_string(),
        base_url.to_string(),
        timeout,
    )
    .expect("transcriber");
    let extractor = Extractor::new(
        "test-key".to_string(),
        "gpt-4o-mini".to_string(),
        base_url.to_string(),
        timeout,
    )
    .expect("extractor");
    let resolver = ProductResolver::new(index, 0.65, 1);
    OrderPipeline::new(transcriber, extractor, resolver)
}

/// Mock the speech-to-text endpoint to return a fixed transcript
pub fn mock_transcription<'a>(server: &'a MockServer, text: &str) -> Mock<'a> {
    let body = serde_json::json!({ "text": text });
    server.mock(move |when, then| {
        when.method(POST).path("/v1/audio/transcriptions");
        then.status(200).json_body(body);
    })
}

/// Mock the chat-completions endpoint to return a model reply
pub fn mock_extraction<'a>(server: &'a MockServer, draft: &serde_json::Value) -> Mock<'a> {
    let body = serde_json::json!({
        "choices": [{ "message": { "content": draft.to_string() } }]
    });
    server.mock(move |when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(200).json_body(body);
    })
}

/// Build a multipart body carrying one audio file field
#[must_use]
pub fn multipart_audio_body(boundary: &str, filename: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}
