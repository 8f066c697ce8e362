//! Audio payload model and format handling

/// Map an audio file extension to its MIME type
///
/// Unrecognized extensions fall back to `audio/mpeg`, which the
/// transcription API accepts for most compressed uploads.
#[must_use]
pub fn mime_for_extension(extension: &str) -> &'static str {
    match extension {
        "wav" => "audio/wav",
        "m4a" => "audio/m4a",
        "mp4" => "audio/mp4",
        "ogg" => "audio/ogg",
        "aac" => "audio/aac",
        "webm" => "audio/webm",
        "flac" => "audio/flac",
        _ => "audio/mpeg",
    }
}

/// A single uploaded audio payload: raw bytes plus the declared filename
///
/// Transient per request; dropped once transcription completes.
#[derive(Debug, Clone)]
pub struct AudioClip {
    /// Declared filename, used only for its extension
    pub filename: String,
    /// Raw audio bytes as uploaded
    pub bytes: Vec<u8>,
}

impl AudioClip {
    /// Create a clip from a declared filename and raw bytes
    #[must_use]
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    /// Lowercased filename extension, if the filename has one
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        self.filename
            .rsplit_once('.')
            .filter(|(stem, ext)| !stem.is_empty() && !ext.is_empty())
            .map(|(_, ext)| ext.to_lowercase())
    }

    /// MIME type for the upload, derived from the extension
    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        self.extension()
            .map_or("audio/mpeg", |ext| mime_for_extension(&ext))
    }

    /// Whether the extension is in the configured allow-list
    ///
    /// Comparison is case-insensitive; a missing extension never passes.
    #[must_use]
    pub fn has_supported_extension(&self, allowed: &[String]) -> bool {
        self.extension()
            .is_some_and(|ext| allowed.iter().any(|a| a.eq_ignore_ascii_case(&ext)))
    }
}
