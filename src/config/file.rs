//! Optional TOML config file
//!
//! `~/.config/ordervox/config.toml` (or an explicit `--config` path) overlays
//! the built-in defaults; environment variables win over both. Every field is
//! optional.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Shape of `config.toml`
#[derive(Debug, Default, Deserialize)]
pub struct OrdervoxConfigFile {
    /// `OpenAI`-compatible API configuration
    #[serde(default)]
    pub openai: OpenAiFileConfig,

    /// Product matching configuration
    #[serde(default)]
    pub matching: MatchingFileConfig,

    /// Audio intake configuration
    #[serde(default)]
    pub audio: AudioFileConfig,

    /// Port and data directory
    #[serde(default)]
    pub server: ServerFileConfig,

    /// Upstream catalog sync configuration
    #[serde(default)]
    pub catalog: CatalogFileConfig,
}

/// `OpenAI`-compatible API configuration
#[derive(Debug, Default, Deserialize)]
pub struct OpenAiFileConfig {
    /// API key (env `OPENAI_API_KEY` takes precedence)
    pub api_key: Option<String>,

    /// API base URL (e.g. `https://api.openai.com`)
    pub base_url: Option<String>,

    /// Transcription model (e.g. "whisper-1")
    pub stt_model: Option<String>,

    /// Extraction model (e.g. "gpt-4o-mini")
    pub llm_model: Option<String>,

    /// Embedding model (e.g. "text-embedding-3-small")
    pub embed_model: Option<String>,

    /// Per-request timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// Product matching configuration
#[derive(Debug, Default, Deserialize)]
pub struct MatchingFileConfig {
    /// Max cosine distance accepted as a confident match
    pub threshold: Option<f64>,

    /// Nearest neighbors fetched per mention
    pub top_k: Option<usize>,
}

/// Audio intake configuration
#[derive(Debug, Default, Deserialize)]
pub struct AudioFileConfig {
    /// Accepted filename extensions
    pub formats: Option<Vec<String>>,
}

/// HTTP and storage settings
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// HTTP port
    pub port: Option<u16>,

    /// Data directory (SQLite database location)
    pub data_dir: Option<String>,
}

/// Upstream catalog sync configuration
#[derive(Debug, Default, Deserialize)]
pub struct CatalogFileConfig {
    /// Upstream catalog URL serving a JSON entry list
    pub url: Option<String>,

    /// Re-sync period in seconds
    pub sync_interval_secs: Option<u64>,
}

/// Read the TOML config file from an explicit path or the standard location
///
/// A missing, unreadable, or malformed file yields the all-default overlay
/// with a warning; config problems never stop startup.
pub fn load_config_file(override_path: Option<&Path>) -> OrdervoxConfigFile {
    let Some(path) = override_path.map(Path::to_path_buf).or_else(config_file_path) else {
        return OrdervoxConfigFile::default();
    };

    if !path.exists() {
        return OrdervoxConfigFile::default();
    }

    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "config file unreadable");
            return OrdervoxConfigFile::default();
        }
    };

    match toml::from_str(&content) {
        Ok(config) => {
            tracing::info!(path = %path.display(), "config file loaded");
            config
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "config file did not parse, falling back to defaults"
            );
            OrdervoxConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/ordervox/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("ordervox").join("config.toml"))
}
