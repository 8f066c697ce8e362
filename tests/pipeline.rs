//! End-to-end pipeline tests with mocked OpenAI endpoints

use std::sync::Arc;

use httpmock::{Method::POST, MockServer};
use ordervox::{AudioClip, OrderIntent, PipelineOutcome, Rejection};
use rust_decimal::Decimal;

mod common;
use common::{FakeIndex, cement_entry, mock_extraction, mock_transcription, test_pipeline};

fn wav_clip() -> AudioClip {
    AudioClip::new("order.wav", b"fake-audio-bytes".to_vec())
}

#[tokio::test]
async fn test_spoken_order_becomes_priced_draft() {
    let server = MockServer::start();
    mock_transcription(&server, "five bags of bagged cement, on credit");
    mock_extraction(
        &server,
        &serde_json::json!({
            "intent": "create_order",
            "payment_method": "debt",
            "items": [
                { "product_name": "bagged cement", "quantity": 5, "unit": "bag" }
            ]
        }),
    );

    let index = Arc::new(FakeIndex::with_entries(vec![cement_entry()]));
    let pipeline = test_pipeline(&server.base_url(), index);

    let PipelineOutcome::Enriched(order) = pipeline.process(wav_clip()).await else {
        panic!("expected enriched order");
    };

    assert_eq!(order.intent, OrderIntent::CreateOrder);
    assert!(order.is_debt);
    assert_eq!(order.transcript, "five bags of bagged cement, on credit");
    assert_eq!(order.items.len(), 1);

    let item = &order.items[0];
    assert_eq!(item.product_id.as_deref(), Some("10"));
    assert_eq!(item.product_name, "Premium bagged cement");
    assert_eq!(item.quantity, 5);
    assert_eq!(item.price, Decimal::from(88_000));
    assert_eq!(item.total_price, Decimal::from(440_000));
    assert!(item.note.is_none());
}

#[tokio::test]
async fn test_empty_transcript_rejected_before_extraction() {
    let server = MockServer::start();
    mock_transcription(&server, "");
    let chat_mock = mock_extraction(&server, &serde_json::json!({ "intent": "create_order" }));

    let pipeline = test_pipeline(&server.base_url(), Arc::new(FakeIndex::default()));
    let outcome = pipeline.process(wav_clip()).await;

    assert_eq!(outcome, PipelineOutcome::Rejected(Rejection::NoSpeech));
    chat_mock.assert_hits(0);
}

#[tokio::test]
async fn test_transcription_failure_reads_as_silence() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/audio/transcriptions");
        then.status(500).body("stt exploded");
    });

    let pipeline = test_pipeline(&server.base_url(), Arc::new(FakeIndex::default()));
    let outcome = pipeline.process(wav_clip()).await;

    assert_eq!(outcome, PipelineOutcome::Rejected(Rejection::NoSpeech));
}

#[tokio::test]
async fn test_extraction_failure_rejects_with_error_draft() {
    let server = MockServer::start();
    mock_transcription(&server, "mumbling about the weather");
    server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(500).body("llm exploded");
    });

    let pipeline = test_pipeline(&server.base_url(), Arc::new(FakeIndex::default()));

    let PipelineOutcome::Rejected(Rejection::NoItems { draft }) =
        pipeline.process(wav_clip()).await
    else {
        panic!("expected rejection carrying the draft");
    };
    assert_eq!(draft.intent, OrderIntent::Error);
    assert!(draft.items.is_empty());
}

#[tokio::test]
async fn test_no_purchasable_items_is_a_rejection() {
    let server = MockServer::start();
    mock_transcription(&server, "do you deliver on sundays");
    mock_extraction(
        &server,
        &serde_json::json!({ "intent": "create_order", "items": [] }),
    );

    let pipeline = test_pipeline(&server.base_url(), Arc::new(FakeIndex::default()));

    let PipelineOutcome::Rejected(Rejection::NoItems { draft }) =
        pipeline.process(wav_clip()).await
    else {
        panic!("expected rejection carrying the draft");
    };
    assert_eq!(draft.intent, OrderIntent::CreateOrder);
    assert!(draft.items.is_empty());
}

#[tokio::test]
async fn test_items_keep_spoken_order_through_mixed_resolution() {
    let server = MockServer::start();
    mock_transcription(
        &server,
        "fried rice, twenty bags of bagged cement, and ten lengths of steel rebar",
    );
    mock_extraction(
        &server,
        &serde_json::json!({
            "intent": "create_order",
            "items": [
                { "product_name": "fried rice", "quantity": 2, "unit": "plate" },
                { "product_name": "bagged cement", "quantity": 20, "unit": "bag" },
                { "product_name": "steel rebar", "quantity": 10, "unit": "length" }
            ]
        }),
    );

    let rebar = ordervox::CatalogEntry {
        id: "11".to_string(),
        name: "Steel rebar 12mm".to_string(),
        price: Decimal::from(125_000),
        unit: "length".to_string(),
        image_url: None,
        sku: None,
    };
    let index = Arc::new(FakeIndex::with_entries(vec![cement_entry(), rebar]));
    let pipeline = test_pipeline(&server.base_url(), index);

    let PipelineOutcome::Enriched(order) = pipeline.process(wav_clip()).await else {
        panic!("expected enriched order");
    };

    let spoken: Vec<&str> = order.items.iter().map(|i| i.spoken_name.as_str()).collect();
    assert_eq!(spoken, ["fried rice", "bagged cement", "steel rebar"]);

    let ids: Vec<Option<&str>> = order.items.iter().map(|i| i.product_id.as_deref()).collect();
    assert_eq!(ids, [None, Some("10"), Some("11")]);

    // The unmatched item is priced at zero and carries a note; the rest are priced
    assert_eq!(order.items[0].total_price, Decimal::ZERO);
    assert!(order.items[0].note.is_some());
    assert_eq!(order.items[1].total_price, Decimal::from(1_760_000));
    assert_eq!(order.items[2].total_price, Decimal::from(1_250_000));
}
