use std::sync::Arc;

use morph::engine::RequestState;
use morph::engine::transform::TransformEngine;
use morph::error::{MorphError, NO_IMAGE_FALLBACK, ValidationError};
use morph::events::Event;
use morph::generator::mock::{MockGenerator, MockReply};
use morph::image::SourceImage;
use morph::mode::{Creativity, Mode};

fn png() -> SourceImage {
    SourceImage::from_bytes(vec![0x89, b'P', b'N', b'G', 1, 2, 3], "image/png").unwrap()
}

/// Engine with an image and instruction ready, plus a handle on the mock.
fn ready_engine(replies: Vec<MockReply>) -> (TransformEngine, Arc<MockGenerator>) {
    let mock = Arc::new(MockGenerator::new(replies));
    let mut engine = TransformEngine::new(Box::new(mock.clone()));
    engine.upload(png());
    engine.set_instruction("make the cat wave at the camera");
    (engine, mock)
}

// ── Success ───────────────────────────────────────────────────────

#[tokio::test]
async fn successful_generation_stores_image() {
    let (mut engine, mock) = ready_engine(vec![MockReply::image(&[9, 9, 9])]);

    let image = engine.submit().await.unwrap();
    assert_eq!(image.bytes, vec![9, 9, 9]);
    assert_eq!(image.mime_type, "image/png");

    assert_eq!(engine.state(), &RequestState::Succeeded);
    assert!(engine.error().is_none());
    assert_eq!(engine.generated().unwrap().bytes, vec![9, 9, 9]);
    assert_eq!(engine.generations(), 1);
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn state_passes_through_in_flight() {
    let (mut engine, _mock) = ready_engine(vec![MockReply::image(&[1])]);
    let mut rx = engine.events().subscribe();

    engine.submit().await.unwrap();

    let mut states = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let Event::StateChanged { state } = event {
            states.push(state);
        }
    }
    assert_eq!(states, vec![RequestState::InFlight, RequestState::Succeeded]);
}

#[tokio::test]
async fn instruction_sent_matches_mode() {
    let (mut engine, mock) = ready_engine(vec![MockReply::image(&[1]), MockReply::image(&[2])]);

    engine.set_creativity(Creativity::new(0.8).unwrap());
    engine.submit().await.unwrap();

    engine.set_mode(Mode::Style);
    engine.submit().await.unwrap();

    let sent = mock.instructions();
    assert!(sent[0].contains("Maintain the character/subject identity"));
    assert!(sent[0].contains("Creativity level: 80%"));
    assert!(sent[0].ends_with("User request: make the cat wave at the camera"));
    assert!(sent[1].contains("Maintain the exact art style"));
    assert!(!sent[1].contains("Creativity"));
}

#[tokio::test]
async fn resubmit_after_success_makes_a_new_call() {
    let (mut engine, mock) = ready_engine(vec![MockReply::image(&[1]), MockReply::image(&[2])]);

    engine.submit().await.unwrap();
    assert!(engine.can_submit());
    engine.submit().await.unwrap();

    assert_eq!(mock.calls(), 2);
    assert_eq!(engine.generated().unwrap().bytes, vec![2]);
}

// ── Validation ────────────────────────────────────────────────────

#[tokio::test]
async fn missing_image_never_calls_generator() {
    let mock = Arc::new(MockGenerator::new(vec![MockReply::image(&[1])]));
    let mut engine = TransformEngine::new(Box::new(mock.clone()));
    engine.set_instruction("wave");

    let err = engine.submit().await.unwrap_err();
    assert_eq!(err, MorphError::Validation(ValidationError::MissingImage));
    assert_eq!(engine.error(), Some(&err));
    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn blank_instruction_never_calls_generator() {
    let (mut engine, mock) = ready_engine(vec![MockReply::image(&[1])]);
    engine.set_instruction("   \n\t ");

    let err = engine.submit().await.unwrap_err();
    assert_eq!(err, MorphError::Validation(ValidationError::EmptyInstruction));
    assert!(!engine.can_submit());
    assert_eq!(mock.calls(), 0);
}

// ── Failures ──────────────────────────────────────────────────────

#[tokio::test]
async fn text_only_reply_is_shown_verbatim() {
    let (mut engine, _mock) =
        ready_engine(vec![MockReply::text("I cannot edit images of real people.")]);

    let err = engine.submit().await.unwrap_err();
    assert_eq!(
        err,
        MorphError::NoImage("I cannot edit images of real people.".to_string())
    );
    assert!(engine.generated().is_none());
}

#[tokio::test]
async fn empty_reply_uses_fallback_message() {
    let (mut engine, _mock) = ready_engine(vec![MockReply::empty()]);

    let err = engine.submit().await.unwrap_err();
    assert_eq!(err.to_string(), NO_IMAGE_FALLBACK);
}

#[tokio::test]
async fn forbidden_is_credential_rejected() {
    let (mut engine, _mock) =
        ready_engine(vec![MockReply::fail("Gemini request failed (403): PERMISSION_DENIED")]);

    let err = engine.submit().await.unwrap_err();
    assert_eq!(err, MorphError::CredentialRejected);
    assert!(matches!(engine.state(), RequestState::Failed(_)));
}

#[tokio::test]
async fn rate_limit_is_throttled() {
    let (mut engine, _mock) = ready_engine(vec![MockReply::fail("status 429 Too Many Requests")]);
    assert_eq!(engine.submit().await.unwrap_err(), MorphError::Throttled);
}

#[tokio::test]
async fn other_failures_keep_their_message() {
    let (mut engine, _mock) = ready_engine(vec![MockReply::fail("connection refused")]);
    assert_eq!(
        engine.submit().await.unwrap_err(),
        MorphError::Transport("connection refused".to_string())
    );
}

#[tokio::test]
async fn failure_keeps_previous_result_and_allows_retry() {
    let (mut engine, mock) = ready_engine(vec![
        MockReply::image(&[5]),
        MockReply::fail("503 unavailable"),
        MockReply::image(&[6]),
    ]);

    engine.submit().await.unwrap();
    engine.submit().await.unwrap_err();
    assert_eq!(engine.generated().unwrap().bytes, vec![5]);
    assert!(engine.can_submit());

    engine.submit().await.unwrap();
    assert!(engine.error().is_none());
    assert_eq!(engine.generated().unwrap().bytes, vec![6]);
    assert_eq!(mock.calls(), 3);
}

// ── Upload ────────────────────────────────────────────────────────

#[tokio::test]
async fn upload_clears_result_and_error() {
    let (mut engine, _mock) = ready_engine(vec![MockReply::image(&[1]), MockReply::empty()]);

    engine.submit().await.unwrap();
    engine.submit().await.unwrap_err();
    assert!(engine.error().is_some());

    let mut rx = engine.events().subscribe();
    engine.upload(SourceImage::from_bytes(vec![1, 2], "image/webp").unwrap());

    assert!(engine.generated().is_none());
    assert!(engine.error().is_none());
    assert_eq!(engine.state(), &RequestState::Idle);
    assert_eq!(engine.source().unwrap().mime_type(), "image/webp");
    // Instruction and mode survive a new upload.
    assert_eq!(engine.instruction(), "make the cat wave at the camera");

    match rx.try_recv().unwrap() {
        Event::ImageUploaded { mime_type, bytes } => {
            assert_eq!(mime_type, "image/webp");
            assert_eq!(bytes, 2);
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn swapping_generator_emits_model_change() {
    let (engine, _mock) = ready_engine(vec![]);
    let mut rx = engine.events().subscribe();

    engine
        .set_generator(Box::new(MockGenerator::new(vec![])))
        .await;

    assert!(matches!(
        rx.try_recv().unwrap(),
        Event::ModelChanged { model } if model == "mock-image"
    ));
}
