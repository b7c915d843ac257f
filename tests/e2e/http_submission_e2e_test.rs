//! End-to-end submission of the five-step event wizard over HTTP
//!
//! The wizard, the validation engine and the HTTP client are real; only the
//! event backend is mocked.

use event_wizard_core::{
    event_steps, AdvanceOutcome, SubmissionError, SubmissionPhase, Wizard, WizardError,
};
use event_wizard_e2e_tests::utils::{
    created_bodies, mount_presign, mount_upload, public_asset_url, UPLOAD_PATH,
};
use event_wizard_http::HttpEventApi;
use event_wizard_test_utils::data_generators::concert_steps;
use event_wizard_test_utils::util::init_test_logging;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn wizard(server: &MockServer) -> Wizard {
    init_test_logging();
    let api = HttpEventApi::new(&server.uri()).unwrap();
    Wizard::new(event_steps(), Arc::new(api), "user-42").unwrap()
}

async fn submit_all_steps(wizard: &Wizard) -> Result<AdvanceOutcome, WizardError> {
    let steps = concert_steps();
    let (last, rest) = steps.split_last().unwrap();
    for values in rest {
        wizard.advance(values).await?;
    }
    wizard.advance(last).await
}

#[tokio::test]
async fn test_concert_scenario_creates_exactly_one_event() {
    let server = MockServer::start().await;
    mount_presign(&server).await;
    Mock::given(method("PUT"))
        .and(path(UPLOAD_PATH))
        .and(header("content-type", "image/png"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/event/create/aws"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 99 })))
        .expect(1)
        .mount(&server)
        .await;

    let wizard = wizard(&server);
    let outcome = submit_all_steps(&wizard).await.unwrap();

    let AdvanceOutcome::Submitted(receipt) = outcome else {
        panic!("expected a submission, got {:?}", outcome);
    };
    assert_eq!(receipt.asset_url, public_asset_url(&server));
    assert_eq!(receipt.response, json!({ "id": 99 }));

    let bodies = created_bodies(&server).await;
    assert_eq!(bodies.len(), 1);
    let body = &bodies[0];
    assert_eq!(body["image"], json!(public_asset_url(&server)));
    assert!(!body["image"].as_str().unwrap().contains('?'));
    assert_eq!(body["name"], json!("Concert"));
    assert_eq!(body["address"], json!("1 Rue X"));
    assert_eq!(body["zipCode"], json!("75001"));
    assert_eq!(body["city"], json!("Paris"));
    assert_eq!(body["startingDate"], json!("2024-06-01"));
    assert_eq!(body["description"], json!("Free show"));
    assert_eq!(body["latitude"], json!("00000000.4444444"));
    assert_eq!(body["longitude"], json!("00000000.4444444"));
    assert_eq!(body["categoryId"], json!(1));
    assert_eq!(body["userId"], json!("user-42"));
}

#[tokio::test]
async fn test_rejected_upload_never_creates_event() {
    let server = MockServer::start().await;
    mount_presign(&server).await;
    mount_upload(&server, 403).await;
    Mock::given(method("POST"))
        .and(path("/api/event/create/aws"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let wizard = wizard(&server);
    let err = submit_all_steps(&wizard).await.unwrap_err();

    match err {
        WizardError::Submission(SubmissionError::Upload { status, .. }) => assert_eq!(status, 403),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(wizard.step_index(), 4);
    assert!(!wizard.is_submitting());
}

#[tokio::test]
async fn test_failed_create_can_be_retried() {
    let server = MockServer::start().await;
    mount_presign(&server).await;
    mount_upload(&server, 200).await;
    Mock::given(method("POST"))
        .and(path("/api/event/create/aws"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "error": "database unavailable" })),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/event/create/aws"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 5 })))
        .mount(&server)
        .await;

    let wizard = wizard(&server);
    let err = submit_all_steps(&wizard).await.unwrap_err();
    match err {
        WizardError::Submission(SubmissionError::Create { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, json!({ "error": "database unavailable" }));
        }
        other => panic!("unexpected error: {:?}", other),
    }

    // Retrying the terminal step runs the whole pipeline again
    let last = concert_steps().pop().unwrap();
    let outcome = wizard.advance(&last).await.unwrap();
    assert!(matches!(outcome, AdvanceOutcome::Submitted(_)));
    assert_eq!(created_bodies(&server).await.len(), 2);
}

#[tokio::test]
async fn test_presign_outage_is_reported_as_presign_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/presign"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let wizard = wizard(&server);
    let err = submit_all_steps(&wizard).await.unwrap_err();

    match err {
        WizardError::Submission(e) => assert_eq!(e.phase(), SubmissionPhase::Presign),
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(created_bodies(&server).await.is_empty());
}
