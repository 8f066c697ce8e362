//! Configuration management for ordervox
//!
//! Layering, highest first: environment variable, TOML config file,
//! built-in default.

pub mod file;

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{Error, Result};

/// ordervox runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// `OpenAI`-compatible API settings (STT, extraction, embeddings)
    pub openai: OpenAiConfig,

    /// Product matching settings
    pub matching: MatchingConfig,

    /// Accepted audio filename extensions, lowercased
    pub audio_formats: Vec<String>,

    /// Data directory (catalog database lives here)
    pub data_dir: PathBuf,

    /// HTTP port to listen on
    pub port: u16,

    /// Upstream catalog sync (opt-in via `ORDERVOX_CATALOG_URL`)
    pub sync: Option<SyncConfig>,
}

/// `OpenAI`-compatible API settings
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API key; required for serving, checked at daemon startup
    pub api_key: Option<String>,

    /// API base URL, no trailing slash
    pub base_url: String,

    /// Transcription model
    pub stt_model: String,

    /// Extraction model
    pub llm_model: String,

    /// Embedding model
    pub embed_model: String,

    /// Per-request timeout
    pub timeout: Duration,
}

/// Product matching settings
#[derive(Debug, Clone)]
pub struct MatchingConfig {
    /// Max cosine distance accepted as a confident match
    pub threshold: f64,

    /// Nearest neighbors fetched per mention
    pub top_k: usize,
}

/// Upstream catalog sync settings
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// URL serving the catalog as a JSON entry list
    pub catalog_url: String,

    /// Re-sync period in seconds
    pub interval_secs: u64,
}

impl Config {
    /// Load configuration from the environment and the standard config file
    ///
    /// # Errors
    ///
    /// Returns error if a configured value fails validation
    pub fn load() -> Result<Self> {
        Self::load_with_options(None)
    }

    /// Load configuration with an explicit config file path
    ///
    /// # Errors
    ///
    /// Returns error if a configured value fails validation
    pub fn load_with_options(config_path: Option<&Path>) -> Result<Self> {
        let fc = file::load_config_file(config_path);

        // OpenAI-compatible API (env > toml > default)
        let openai = OpenAiConfig {
            api_key: std::env::var("OPENAI_API_KEY").ok().or(fc.openai.api_key),
            base_url: std::env::var("ORDERVOX_OPENAI_BASE_URL")
                .ok()
                .or(fc.openai.base_url)
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| "https://api.openai.com".to_string()),
            stt_model: std::env::var("ORDERVOX_STT_MODEL")
                .ok()
                .or(fc.openai.stt_model)
                .unwrap_or_else(|| "whisper-1".to_string()),
            llm_model: std::env::var("ORDERVOX_LLM_MODEL")
                .ok()
                .or(fc.openai.llm_model)
                .unwrap_or_else(|| "gpt-4o-mini".to_string()),
            embed_model: std::env::var("ORDERVOX_EMBED_MODEL")
                .ok()
                .or(fc.openai.embed_model)
                .unwrap_or_else(|| "text-embedding-3-small".to_string()),
            timeout: Duration::from_secs(
                std::env::var("ORDERVOX_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .or(fc.openai.timeout_secs)
                    .unwrap_or(30),
            ),
        };

        // Matching (env > toml > default)
        let matching = MatchingConfig {
            threshold: std::env::var("ORDERVOX_MATCH_THRESHOLD")
                .ok()
                .and_then(|s| s.parse().ok())
                .or(fc.matching.threshold)
                .unwrap_or(0.65),
            top_k: fc.matching.top_k.unwrap_or(1),
        };
        if !(matching.threshold.is_finite() && matching.threshold >= 0.0) {
            return Err(Error::Config(format!(
                "match threshold must be a non-negative number, got {}",
                matching.threshold
            )));
        }

        // Accepted upload extensions, normalized to bare lowercase
        let audio_formats: Vec<String> = std::env::var("ORDERVOX_AUDIO_FORMATS")
            .ok()
            .map(|s| s.split(',').map(str::to_string).collect())
            .or(fc.audio.formats)
            .unwrap_or_else(default_audio_formats)
            .into_iter()
            .map(|f| f.trim().trim_start_matches('.').to_lowercase())
            .filter(|f| !f.is_empty())
            .collect();

        // Data directory (~/.local/share/ordervox on Linux)
        let data_dir = std::env::var("ORDERVOX_DATA_DIR")
            .ok()
            .or(fc.server.data_dir)
            .map_or_else(default_data_dir, PathBuf::from);
        std::fs::create_dir_all(&data_dir).ok();

        let port = std::env::var("ORDERVOX_PORT")
            .or_else(|_| std::env::var("PORT"))
            .ok()
            .and_then(|s| s.parse().ok())
            .or(fc.server.port)
            .unwrap_or(8094);

        // Catalog sync (opt-in: configured URL enables the background task)
        let sync = std::env::var("ORDERVOX_CATALOG_URL")
            .ok()
            .or(fc.catalog.url)
            .map(|catalog_url| {
                let interval_secs = std::env::var("ORDERVOX_SYNC_INTERVAL")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .or(fc.catalog.sync_interval_secs)
                    .unwrap_or(300);
                SyncConfig {
                    catalog_url,
                    interval_secs,
                }
            });

        if let Some(sc) = &sync {
            url::Url::parse(&sc.catalog_url).map_err(|e| {
                Error::Config(format!("invalid catalog URL {}: {e}", sc.catalog_url))
            })?;
        }

        Ok(Self {
            openai,
            matching,
            audio_formats,
            data_dir,
            port,
            sync,
        })
    }

    /// Path to the catalog database file
    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("ordervox.db")
    }

    /// API key for the external services
    ///
    /// # Errors
    ///
    /// Returns error if no key is configured
    pub fn require_api_key(&self) -> Result<String> {
        self.openai.api_key.clone().ok_or_else(|| {
            Error::Config(
                "OPENAI_API_KEY is not set (env, or [openai] api_key in config.toml)".to_string(),
            )
        })
    }
}

/// Default accepted upload extensions
fn default_audio_formats() -> Vec<String> {
    ["wav", "mp3", "m4a", "ogg", "aac"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

/// Default data directory: `~/.local/share/ordervox` on Linux
fn default_data_dir() -> PathBuf {
    directories::BaseDirs::new().map_or_else(|| PathBuf::from("."), |d| d.data_dir().join("ordervox"))
}
