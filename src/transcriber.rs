//! Speech-to-text transcription

use std::time::Duration;

use crate::audio::AudioClip;
use crate::{Error, Result};

/// Response from the transcription API
#[derive(serde::Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Transcribes uploaded audio clips to text
///
/// Talks to an `OpenAI`-compatible `v1/audio/transcriptions` endpoint. The
/// clip is staged in a temporary file for the duration of the call; the file
/// is removed on every exit path.
pub struct Transcriber {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl Transcriber {
    /// Create a new transcriber
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty or the HTTP client cannot be built
    pub fn new(
        api_key: String,
        model: String,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "OpenAI API key required for transcription".to_string(),
            ));
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        })
    }

    /// Transcribe an audio clip to trimmed text
    ///
    /// An empty result means the service heard nothing usable; callers decide
    /// what that implies.
    ///
    /// # Errors
    ///
    /// Returns error if staging, the API call, or response parsing fails
    pub async fn transcribe(&self, clip: &AudioClip) -> Result<String> {
        let extension = clip.extension().unwrap_or_else(|| "mp3".to_string());
        tracing::debug!(
            audio_bytes = clip.bytes.len(),
            extension = %extension,
            "starting transcription"
        );

        // Staging file lives exactly as long as this call
        let staged = tempfile::Builder::new()
            .prefix("ordervox-clip-")
            .suffix(&format!(".{extension}"))
            .tempfile()?;
        tokio::fs::write(staged.path(), &clip.bytes).await?;
        let staged_bytes = tokio::fs::read(staged.path()).await?;

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(staged_bytes)
                    .file_name(format!("audio.{extension}"))
                    .mime_str(clip.mime_type())
                    .map_err(|e| Error::Stt(e.to_string()))?,
            )
            .text("model", self.model.clone());

        let response = self
            .client
            .post(format!("{}/v1/audio/transcriptions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "transcription request failed");
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "transcription API error");
            return Err(Error::Stt(format!(
                "transcription API error {status}: {body}"
            )));
        }

        let result: TranscriptionResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse transcription response");
            e
        })?;

        let transcript = result.text.trim().to_string();
        tracing::info!(transcript = %transcript, "transcription complete");
        Ok(transcript)
    }
}
