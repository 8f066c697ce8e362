//! Voice-to-order pipeline
//!
//! Strictly sequential per request: audio, transcript, draft, resolved items,
//! enriched order. Silent audio and unusable drafts exit early; a failed
//! resolution degrades that item only, never the whole order.

use crate::audio::AudioClip;
use crate::extractor::Extractor;
use crate::order::{DraftOrder, EnrichedItem, EnrichedOrder};
use crate::resolver::ProductResolver;
use crate::transcriber::Transcriber;

/// Why a request terminated without an enriched order
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    /// Transcription produced no usable text
    NoSpeech,
    /// The transcript yielded no actionable order; carries the partial draft
    NoItems { draft: DraftOrder },
}

/// Terminal state of one pipeline run
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    Enriched(EnrichedOrder),
    Rejected(Rejection),
}

pub struct OrderPipeline {
    transcriber: Transcriber,
    extractor: Extractor,
    resolver: ProductResolver,
}

impl OrderPipeline {
    #[must_use]
    pub fn new(transcriber: Transcriber, extractor: Extractor, resolver: ProductResolver) -> Self {
        Self {
            transcriber,
            extractor,
            resolver,
        }
    }

    /// Run one audio clip through the full pipeline
    ///
    /// Stage failures never escape: a transcription failure reads as silent
    /// audio, an extraction failure reads as an unusable draft.
    pub async fn process(&self, clip: AudioClip) -> PipelineOutcome {
        let transcript = match self.transcriber.transcribe(&clip).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(filename = %clip.filename, error = %e, "transcription failed");
                String::new()
            }
        };
        // The clip is only needed for transcription; release it before the
        // slower downstream calls.
        drop(clip);

        if transcript.is_empty() {
            return PipelineOutcome::Rejected(Rejection::NoSpeech);
        }

        let draft = match self.extractor.extract(&transcript).await {
            Ok(draft) => draft,
            Err(e) => {
                tracing::warn!(error = %e, "extraction failed");
                DraftOrder::error()
            }
        };

        if !draft.is_actionable() {
            return PipelineOutcome::Rejected(Rejection::NoItems { draft });
        }

        let mut items = Vec::with_capacity(draft.items.len());
        for item in &draft.items {
            let resolution = self.resolver.resolve(&item.product_name).await;
            items.push(EnrichedItem::from_resolution(item, resolution));
        }

        let matched = items.iter().filter(|i| i.product_id.is_some()).count();
        tracing::info!(
            items = items.len(),
            matched,
            "order enriched"
        );

        PipelineOutcome::Enriched(EnrichedOrder::assemble(draft, items, transcript))
    }
}
