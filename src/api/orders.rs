//! Voice order endpoint
//!
//! Accepts a multipart audio upload, gates on the declared filename
//! extension, and runs the clip through the order pipeline. Format and
//! pipeline rejections are business outcomes and come back as 200
//! envelopes with `success: false`; only transport misuse gets a 4xx.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::Serialize;

use super::ApiState;
use crate::audio::AudioClip;
use crate::order::{DraftOrder, EnrichedOrder};
use crate::pipeline::{PipelineOutcome, Rejection};

/// Whisper rejects files above 25 MB; no point accepting more
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Build orders router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/voice", post(create_voice_order))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

/// Response envelope for order processing
#[derive(Debug, Serialize)]
pub struct OrderEnvelope {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<OrderData>,
}

/// Envelope payload
///
/// A successful request carries the enriched order; a "no purchasable
/// items" rejection carries the partial draft so the caller can show what
/// was understood.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum OrderData {
    Enriched(EnrichedOrder),
    Draft(DraftOrder),
}

/// Process a spoken order
async fn create_voice_order(
    State(state): State<Arc<ApiState>>,
    multipart: Multipart,
) -> Result<Json<OrderEnvelope>, OrderError> {
    let clip = read_audio_field(multipart).await?;

    if !clip.has_supported_extension(&state.audio_formats) {
        tracing::debug!(filename = %clip.filename, "rejected unsupported audio format");
        return Ok(Json(OrderEnvelope {
            success: false,
            message: format!(
                "unsupported audio format, expected one of: {}",
                state.audio_formats.join(", ")
            ),
            data: None,
        }));
    }

    let envelope = match state.pipeline.process(clip).await {
        PipelineOutcome::Enriched(order) => OrderEnvelope {
            success: true,
            message: "order processed".to_string(),
            data: Some(OrderData::Enriched(order)),
        },
        PipelineOutcome::Rejected(Rejection::NoSpeech) => OrderEnvelope {
            success: false,
            message: "could not understand the audio".to_string(),
            data: None,
        },
        PipelineOutcome::Rejected(Rejection::NoItems { draft }) => {
            tracing::debug!(?draft, "no actionable items in transcript");
            OrderEnvelope {
                success: false,
                message: "no purchasable items recognized".to_string(),
                data: Some(OrderData::Draft(draft)),
            }
        }
    };

    Ok(Json(envelope))
}

/// Pull the audio file out of the multipart body
///
/// Accepts the field under the name `file` or `audio`.
async fn read_audio_field(mut multipart: Multipart) -> Result<AudioClip, OrderError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| OrderError::Multipart(e.to_string()))?
    {
        if !matches!(field.name(), Some("file" | "audio")) {
            continue;
        }
        let filename = field.file_name().unwrap_or("clip").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| OrderError::Multipart(e.to_string()))?;
        return Ok(AudioClip::new(filename, bytes.to_vec()));
    }
    Err(OrderError::MissingFile)
}

/// Order endpoint errors
#[derive(Debug)]
pub enum OrderError {
    MissingFile,
    Multipart(String),
}

impl IntoResponse for OrderError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: ErrorBody,
        }

        #[derive(Serialize)]
        struct ErrorBody {
            code: &'static str,
            message: String,
        }

        let (status, code, message) = match self {
            Self::MissingFile => (
                StatusCode::BAD_REQUEST,
                "missing_file",
                "request must include an audio file field".to_string(),
            ),
            Self::Multipart(msg) => (StatusCode::BAD_REQUEST, "malformed_multipart", msg),
        };

        (
            status,
            Json(ErrorResponse {
                error: ErrorBody { code, message },
            }),
        )
            .into_response()
    }
}
