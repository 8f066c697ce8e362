//! Ordervox - voice order intake for building-materials merchants
//!
//! Turns a spoken sales request into a priced order draft:
//! - Speech-to-text transcription of the uploaded clip
//! - Schema-constrained extraction of intent, customer, and line items
//! - Semantic resolution of each spoken mention against the product catalog
//! - Price enrichment and assembly of the final order
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    HTTP ingress                      │
//! │  /api/orders/voice  │  /api/catalog/*  │  /health   │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                  Order pipeline                      │
//! │  Transcriber  →  Extractor  →  ProductResolver      │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │             Catalog index (sqlite-vec)               │
//! │   name embeddings  │  products  │  periodic sync    │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod audio;
pub mod catalog;
pub mod config;
pub mod daemon;
pub mod error;
pub mod extractor;
pub mod order;
pub mod pipeline;
pub mod resolver;
pub mod transcriber;

pub use audio::AudioClip;
pub use catalog::{
    CatalogEntry, CatalogIndex, CatalogSource, DbConn, DbPool, Embedder, ScoredEntry,
    VecCatalogIndex,
};
pub use config::Config;
pub use daemon::Daemon;
pub use error::{Error, Result};
pub use extractor::Extractor;
pub use order::{
    DraftItem, DraftOrder, EnrichedItem, EnrichedOrder, OrderIntent, PaymentMethod, Resolution,
    ResolvedProduct,
};
pub use pipeline::{OrderPipeline, PipelineOutcome, Rejection};
pub use resolver::ProductResolver;
pub use transcriber::Transcriber;
