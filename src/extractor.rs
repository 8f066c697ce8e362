//! Draft-order extraction from transcripts
//!
//! One low-temperature, JSON-mode chat completion turns a transcript into a
//! [`DraftOrder`]. The model's reply is parsed through tolerant wire structs:
//! items without a usable positive quantity are dropped during
//! normalization instead of failing the whole draft.

use serde::{Deserialize, Serialize};

use crate::order::{DraftItem, DraftOrder, OrderIntent, PaymentMethod};
use crate::{Error, Result};

const SYSTEM_PROMPT: &str = r#"You turn a building-materials sales transcript into one JSON order.

Output JSON with this structure:
{
  "intent": "create_order",
  "customer_name": null,
  "customer_phone": null,
  "payment_method": "cash",
  "is_debt": false,
  "items": [
    {"product_name": "...", "quantity": 1, "unit": "bag"}
  ]
}

Rules:
- Only include items from these categories: cement, sand, gravel, brick,
  steel, roofing, paint, piping. Silently drop any other mention (food,
  small talk, unrelated goods).
- product_name is the product exactly as the customer said it.
- quantity must be a positive integer. If no quantity was stated for an
  item, omit that item entirely.
- unit is the unit as spoken ("bag", "truckload", "sheet").
- payment_method is "debt" only when the customer says debt, credit, on
  credit, pay later, or owes; otherwise "cash". is_debt mirrors it.
- customer_name and customer_phone only when explicitly stated, else null.
- If nothing purchasable was said, return "items": []."#;

/// Line item as the model emits it
#[derive(Debug, Deserialize)]
struct DraftItemWire {
    product_name: Option<String>,
    quantity: Option<i64>,
    unit: Option<String>,
}

/// Draft order as the model emits it
#[derive(Debug, Deserialize)]
struct DraftOrderWire {
    intent: Option<String>,
    customer_name: Option<String>,
    customer_phone: Option<String>,
    payment_method: Option<String>,
    is_debt: Option<bool>,
    #[serde(default)]
    items: Vec<DraftItemWire>,
}

impl DraftOrderWire {
    /// Normalize the model's output into the domain draft
    ///
    /// Items without a positive quantity or a product name are dropped; an
    /// explicit or unrecognized intent other than `create_order` becomes
    /// [`OrderIntent::Error`].
    fn normalize(self) -> DraftOrder {
        let intent = match self.intent.as_deref() {
            None | Some("create_order") => OrderIntent::CreateOrder,
            Some(_) => OrderIntent::Error,
        };

        let debt_stated = self
            .payment_method
            .as_deref()
            .is_some_and(|m| m.eq_ignore_ascii_case("debt"));
        let payment_method = if debt_stated || self.is_debt == Some(true) {
            PaymentMethod::Debt
        } else {
            PaymentMethod::Cash
        };

        let items = self
            .items
            .into_iter()
            .filter_map(|item| {
                let product_name = item.product_name?.trim().to_string();
                if product_name.is_empty() {
                    return None;
                }
                let quantity = item
                    .quantity
                    .filter(|q| *q >= 1)
                    .and_then(|q| u32::try_from(q).ok())?;
                Some(DraftItem {
                    product_name,
                    quantity,
                    unit: item.unit.unwrap_or_default(),
                })
            })
            .collect();

        DraftOrder {
            intent,
            customer_name: self.customer_name.filter(|s| !s.trim().is_empty()),
            customer_phone: self.customer_phone.filter(|s| !s.trim().is_empty()),
            payment_method,
            is_debt: payment_method.is_debt(),
            items,
        }
    }
}

/// Extracts structured draft orders from transcripts via an LLM
pub struct Extractor {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl Extractor {
    /// Create a new extractor
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty or the HTTP client cannot be built
    pub fn new(
        api_key: String,
        model: String,
        base_url: String,
        timeout: std::time::Duration,
    ) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "OpenAI API key required for extraction".to_string(),
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

    /// Extract a draft order from non-empty transcript text
    ///
    /// Zero items with `create_order` intent is a valid outcome ("nothing
    /// purchasable was said"), distinct from the `Err` of a failed or
    /// malformed extraction.
    ///
    /// # Errors
    ///
    /// Returns error if the API call fails or the reply is not a parseable order
    #[allow(clippy::items_after_statements)]
    pub async fn extract(&self, text: &str) -> Result<DraftOrder> {
        let user_prompt = format!("Transcript:\n\n{text}");

        #[derive(Serialize)]
        struct ChatRequest<'a> {
            model: &'a str,
            messages: [ChatMessage<'a>; 2],
            temperature: f32,
            response_format: ResponseFormat,
        }

        #[derive(Serialize)]
        struct ChatMessage<'a> {
            role: &'static str,
            content: &'a str,
        }

        #[derive(Serialize)]
        struct ResponseFormat {
            #[serde(rename = "type")]
            format_type: &'static str,
        }

        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user_prompt,
                },
            ],
            temperature: 0.1,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Extract(format!(
                "extraction API error {status}: {body}"
            )));
        }

        #[derive(Deserialize)]
        struct ChatResponse {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceContent,
        }

        #[derive(Deserialize)]
        struct ChoiceContent {
            content: String,
        }

        let reply: ChatResponse = response.json().await?;

        let content = reply
            .choices
            .first()
            .map_or("{}", |c| c.message.content.as_str());

        let wire: DraftOrderWire = serde_json::from_str(content)
            .map_err(|e| Error::Extract(format!("malformed extraction output: {e}")))?;

        let draft = wire.normalize();
        tracing::debug!(
            intent = ?draft.intent,
            items = draft.items.len(),
            is_debt = draft.is_debt,
            "extracted draft order"
        );

        Ok(draft)
    }
}
