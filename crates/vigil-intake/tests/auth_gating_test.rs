//! Sign-in gating and deferred replay integration tests.

mod helpers;

use helpers::analyzer::ScriptedAnalyzer;
use helpers::fixtures::png_candidate;
use helpers::{setup_signed_out, setup_test_app, test_config, TEST_EMAIL, TEST_PASSWORD};
use vigil_core::error::ErrorMetadata;
use vigil_intake::{DeferredOperation, DeferredOutcome, IntakeError};

#[tokio::test]
async fn test_signed_out_acquisition_is_replayed_after_sign_in() {
    let app = setup_signed_out(test_config(), ScriptedAnalyzer::new(80)).await;

    let report = app
        .service
        .acquire(vec![png_candidate("a.png"), png_candidate("b.png")])
        .await;

    assert!(report.deferred);
    assert_eq!(report.outcomes.len(), 2);
    assert!(report
        .outcomes
        .iter()
        .all(|o| matches!(o.result, Err(IntakeError::Unauthenticated))));
    assert!(app.service.pending().await.is_empty());
    assert!(matches!(
        app.service.deferred_operation().await,
        Some(DeferredOperation::Acquire(ref files)) if files.len() == 2
    ));

    let outcome = app
        .service
        .sign_in(TEST_EMAIL, TEST_PASSWORD)
        .await
        .unwrap();

    assert_eq!(outcome.session.identity.email, TEST_EMAIL);
    match outcome.replayed {
        Some(DeferredOutcome::Acquired(report)) => {
            assert!(!report.deferred);
            assert_eq!(report.accepted().count(), 2);
        }
        other => panic!("expected replayed acquisition, got {:?}", other),
    }
    assert_eq!(app.service.pending().await.len(), 2);
    assert!(app.service.deferred_operation().await.is_none());
}

#[tokio::test]
async fn test_signed_out_promotion_is_replayed() {
    let app = setup_test_app(ScriptedAnalyzer::new(80)).await;
    let report = app.service.acquire(vec![png_candidate("a.png")]).await;
    let id = report.accepted().next().unwrap().id;

    app.service.sign_out().await;
    let err = app.service.promote(id).await.unwrap_err();
    assert!(matches!(err, IntakeError::Unauthenticated));
    assert!(err.is_recoverable());
    assert!(app.service.list().await.is_empty());

    let outcome = app.service.sign_in(TEST_EMAIL, TEST_PASSWORD).await.unwrap();
    match outcome.replayed {
        Some(DeferredOutcome::Promoted(Ok(record))) => assert_eq!(record.source_pending_id, id),
        other => panic!("expected replayed promotion, got {:?}", other),
    }
    assert_eq!(app.service.list().await.len(), 1);
}

#[tokio::test]
async fn test_signed_out_batch_is_replayed() {
    let app = setup_test_app(ScriptedAnalyzer::new(80)).await;
    app.service
        .acquire(vec![png_candidate("a.png"), png_candidate("b.png")])
        .await;
    app.service.sign_out().await;

    assert!(matches!(
        app.service.generate_all().await,
        Err(IntakeError::Unauthenticated)
    ));

    let outcome = app.service.sign_in(TEST_EMAIL, TEST_PASSWORD).await.unwrap();
    match outcome.replayed {
        Some(DeferredOutcome::Generated(Ok(batch))) => assert_eq!(batch.promoted().count(), 2),
        other => panic!("expected replayed batch, got {:?}", other),
    }
}

#[tokio::test]
async fn test_failed_sign_in_keeps_operation_parked() {
    let app = setup_signed_out(test_config(), ScriptedAnalyzer::new(80)).await;
    app.service.acquire(vec![png_candidate("a.png")]).await;

    let err = app
        .service
        .sign_in(TEST_EMAIL, "wrong password")
        .await
        .unwrap_err();
    assert!(matches!(err, IntakeError::Auth(_)));
    assert_eq!(err.error_code(), "AUTH_FAILED");
    assert!(app.service.deferred_operation().await.is_some());

    let outcome = app.service.sign_in(TEST_EMAIL, TEST_PASSWORD).await.unwrap();
    assert!(matches!(outcome.replayed, Some(DeferredOutcome::Acquired(_))));
    assert_eq!(app.service.pending().await.len(), 1);
}

#[tokio::test]
async fn test_sign_in_without_parked_operation() {
    let app = setup_signed_out(test_config(), ScriptedAnalyzer::new(80)).await;
    let outcome = app.service.sign_in(TEST_EMAIL, TEST_PASSWORD).await.unwrap();
    assert!(outcome.replayed.is_none());
    assert!(app.service.current_user().await.is_some());
}
