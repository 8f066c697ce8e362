//! Order data model
//!
//! A spoken request moves through three shapes: the transcript (plain text),
//! the [`DraftOrder`] the extractor produces from it, and the
//! [`EnrichedOrder`] the pipeline assembles after each item has been
//! resolved against the catalog. Resolution outcomes are a tagged variant
//! ([`Resolution`]) rather than optional fields, so "no confident match" is
//! a first-class value.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Intent reported by the extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderIntent {
    /// The transcript describes a purchase
    CreateOrder,
    /// Extraction failed or produced nothing usable
    Error,
}

/// How the customer intends to pay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Paid up front (the default when nothing is said)
    #[default]
    Cash,
    /// On credit, settled later
    Debt,
}

impl PaymentMethod {
    /// Whether this order is taken on credit
    #[must_use]
    pub const fn is_debt(self) -> bool {
        matches!(self, Self::Debt)
    }
}

/// One line item as spoken, before catalog resolution
///
/// Invariant: `quantity >= 1`. The extractor drops items whose quantity it
/// cannot determine, so a `DraftItem` never carries a zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftItem {
    /// Product name exactly as the customer said it
    pub product_name: String,
    /// Ordered quantity
    pub quantity: u32,
    /// Unit as spoken ("bag", "truckload", "sheet")
    pub unit: String,
}

/// Structured order extracted from a transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftOrder {
    pub intent: OrderIntent,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub payment_method: PaymentMethod,
    pub is_debt: bool,
    /// Line items in spoken order
    pub items: Vec<DraftItem>,
}

impl DraftOrder {
    /// The failed-extraction outcome: error intent, nothing else filled in
    #[must_use]
    pub fn error() -> Self {
        Self {
            intent: OrderIntent::Error,
            customer_name: None,
            customer_phone: None,
            payment_method: PaymentMethod::Cash,
            is_debt: false,
            items: Vec::new(),
        }
    }

    /// Whether the draft is worth resolving: create intent and at least one item
    #[must_use]
    pub fn is_actionable(&self) -> bool {
        self.intent == OrderIntent::CreateOrder && !self.items.is_empty()
    }
}

/// Catalog entry selected for a spoken mention, with the query distance
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedProduct {
    /// Catalog id
    pub id: String,
    /// Canonical catalog name
    pub name: String,
    /// Unit price from the catalog
    pub price: Decimal,
    /// Catalog unit name
    pub unit: String,
    pub image_url: Option<String>,
    /// Cosine distance between mention and catalog name embeddings
    pub distance: f64,
}

/// Outcome of resolving one spoken mention against the catalog
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Nearest neighbor within the confidence threshold
    Matched(ResolvedProduct),
    /// No entry close enough to trust
    Unmatched {
        /// Human-readable reason, surfaced on the enriched item
        reason: String,
    },
}

/// One line item after catalog resolution
///
/// Matched items carry the canonical name and pricing; unmatched items keep
/// the spoken name, zero prices, and a non-empty `note` explaining why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedItem {
    /// Catalog id when matched
    pub product_id: Option<String>,
    /// Canonical name when matched, spoken name otherwise
    pub product_name: String,
    /// Name exactly as spoken, kept for audit
    pub spoken_name: String,
    pub quantity: u32,
    pub unit: String,
    /// Unit price; zero when unmatched
    pub price: Decimal,
    /// `quantity x price`; zero when unmatched
    pub total_price: Decimal,
    pub image_url: Option<String>,
    /// Match distance when matched, for observability
    pub distance: Option<f64>,
    /// Non-empty when the item could not be resolved
    pub note: Option<String>,
}

impl EnrichedItem {
    /// Merge a draft item with its confident catalog match
    #[must_use]
    pub fn matched(item: &DraftItem, product: ResolvedProduct) -> Self {
        let total_price = product.price * Decimal::from(item.quantity);
        Self {
            product_id: Some(product.id),
            product_name: product.name,
            spoken_name: item.product_name.clone(),
            quantity: item.quantity,
            unit: item.unit.clone(),
            price: product.price,
            total_price,
            image_url: product.image_url,
            distance: Some(product.distance),
            note: None,
        }
    }

    /// Carry a draft item through unresolved, pricing it at zero
    #[must_use]
    pub fn unmatched(item: &DraftItem, reason: impl Into<String>) -> Self {
        Self {
            product_id: None,
            product_name: item.product_name.clone(),
            spoken_name: item.product_name.clone(),
            quantity: item.quantity,
            unit: item.unit.clone(),
            price: Decimal::ZERO,
            total_price: Decimal::ZERO,
            image_url: None,
            distance: None,
            note: Some(reason.into()),
        }
    }

    /// Apply a [`Resolution`] to a draft item
    #[must_use]
    pub fn from_resolution(item: &DraftItem, resolution: Resolution) -> Self {
        match resolution {
            Resolution::Matched(product) => Self::matched(item, product),
            Resolution::Unmatched { reason } => Self::unmatched(item, reason),
        }
    }
}

/// The final order: draft header, resolved items, original transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedOrder {
    pub intent: OrderIntent,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub payment_method: PaymentMethod,
    pub is_debt: bool,
    /// Items in the same order they were spoken
    pub items: Vec<EnrichedItem>,
    /// Transcript the order was extracted from, for audit/display
    pub transcript: String,
}

impl EnrichedOrder {
    /// Assemble the final order from a draft, its resolved items, and the transcript
    #[must_use]
    pub fn assemble(draft: DraftOrder, items: Vec<EnrichedItem>, transcript: String) -> Self {
        Self {
            intent: draft.intent,
            customer_name: draft.customer_name,
            customer_phone: draft.customer_phone,
            payment_method: draft.payment_method,
            is_debt: draft.is_debt,
            items,
            transcript,
        }
    }
}
