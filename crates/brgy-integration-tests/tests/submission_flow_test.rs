//! Guided forms submitting to the gateway stub over HTTP.

mod common;

use std::sync::Arc;

use serde_json::json;

use brgy_client::GENERIC_FAILURE;
use brgy_core::{DocumentKind, FileHandle, IdentityAttr};
use brgy_form::{
    EnvironmentProfile, FormPhase, GuidedForm, IdentitySource, SessionStore, SubmitOutcome, UserAgentProbe,
};
use brgy_schema::{catalog, DateBound, FieldSpec, FormSpecification};

use common::{gateway, signed_in, start_stub};

fn fill_incident(form: &mut GuidedForm) {
    form.set_field("category", "Community Disturbances").unwrap();
    form.set_field("subCategory", "Noise Complaints").unwrap();
    form.set_field("date", "2024-05-01").unwrap();
    form.set_field("time", "23:30").unwrap();
    form.set_field("description", "Videoke until three in the morning").unwrap();
    form.set_field("reporterContact", "09171234567").unwrap();
}

#[tokio::test]
async fn incident_without_evidence_is_accepted() {
    let stub = start_stub().await;
    let dir = tempfile::tempdir().unwrap();
    let session = signed_in(&dir.path().join("session.json"));
    let mut form = GuidedForm::builder(
        catalog::incident_report().unwrap(),
        session.clone(),
        gateway(&stub, &session),
    )
    .build();
    fill_incident(&mut form);

    let SubmitOutcome::Succeeded(receipt) = form.submit().await else {
        panic!("expected success");
    };
    assert_eq!(receipt.status, 201);
    assert!(receipt.id.is_some());

    let stored = stub.state.submissions_by_arrival();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].document_kind, DocumentKind::IncidentReport);
    assert_eq!(stored[0].evidence_count, 0);
    assert_eq!(stored[0].payload["evidence"], json!([]));
    assert_eq!(stored[0].payload["location"], "San Isidro");
    assert_eq!(stored[0].payload["reporterName"], "Juan Dela Cruz");

    assert_eq!(form.phase(), FormPhase::Idle);
    assert!(!form.state().contains("category"));
}

#[tokio::test]
async fn evidence_files_reach_the_gateway_in_order() {
    let stub = start_stub().await;
    let dir = tempfile::tempdir().unwrap();
    let session = signed_in(&dir.path().join("session.json"));
    let first = dir.path().join("photo.jpg");
    let second = dir.path().join("notes.txt");
    std::fs::write(&first, [0xFF, 0xD8, 0xFF]).unwrap();
    std::fs::write(&second, b"plate ABC 123").unwrap();

    let mut form = GuidedForm::builder(
        catalog::incident_report().unwrap(),
        session.clone(),
        gateway(&stub, &session),
    )
    .build();
    fill_incident(&mut form);
    form.set_field(
        "evidence",
        vec![FileHandle::from_path(&first), FileHandle::from_path(&second)],
    )
    .unwrap();

    assert!(form.submit().await.is_success());
    let stored = stub.state.submissions_by_arrival();
    let evidence = &stored[0].payload["evidence"];
    assert_eq!(evidence[0]["filename"], "photo.jpg");
    assert_eq!(evidence[0]["contentType"], "image/jpeg");
    assert_eq!(evidence[0]["data"], "/9j/");
    assert_eq!(evidence[1]["filename"], "notes.txt");
}

#[tokio::test]
async fn server_error_keeps_state_and_retry_succeeds() {
    let stub = start_stub().await;
    stub.state.fail_next(1);
    let dir = tempfile::tempdir().unwrap();
    let session = signed_in(&dir.path().join("session.json"));
    let mut form = GuidedForm::builder(
        catalog::incident_report().unwrap(),
        session.clone(),
        gateway(&stub, &session),
    )
    .build();
    fill_incident(&mut form);
    let before = form.state().clone();

    let SubmitOutcome::Failed { reason } = form.submit().await else {
        panic!("expected failure");
    };
    assert_eq!(reason, GENERIC_FAILURE);
    assert_eq!(form.phase(), FormPhase::Failed);
    assert_eq!(form.state(), &before);
    assert!(form.render().can_submit());
    assert!(stub.state.submissions().is_empty());

    assert!(form.submit().await.is_success());
    assert_eq!(stub.state.submissions().len(), 1);
    assert_eq!(form.phase(), FormPhase::Idle);
}

#[tokio::test]
async fn minimal_cedula_payload_is_tagged_and_complete() {
    let stub = start_stub().await;
    let dir = tempfile::tempdir().unwrap();
    let session = signed_in(&dir.path().join("session.json"));
    let spec = FormSpecification::builder(DocumentKind::Cedula)
        .field(FieldSpec::text("name", "Full Name").required().locked(IdentityAttr::Name))
        .field(
            FieldSpec::select("civilStatus", "Civil Status", catalog::CIVIL_STATUSES.iter().copied())
                .required(),
        )
        .field(
            FieldSpec::date("dateOfBirth", "Date of Birth")
                .required()
                .latest(DateBound::Today),
        )
        .build()
        .unwrap();

    let mut form = GuidedForm::builder(spec, session.clone(), gateway(&stub, &session)).build();
    form.set_field("civilStatus", "Married").unwrap();
    form.set_field("dateOfBirth", "1990-05-01").unwrap();

    assert!(form.submit().await.is_success());
    let stored = stub.state.submissions_by_arrival();
    assert_eq!(
        stored[0].payload,
        json!({
            "documentKind": "cedula",
            "name": "Juan Dela Cruz",
            "civilStatus": "Married",
            "dateOfBirth": "1990-05-01",
            "evidence": []
        })
    );
}

#[tokio::test]
async fn gateway_message_is_surfaced() {
    let stub = start_stub().await;
    let dir = tempfile::tempdir().unwrap();
    let session = signed_in(&dir.path().join("session.json"));
    // Valid locally, refused by the gateway: clearance without a name.
    let spec = FormSpecification::builder(DocumentKind::BarangayClearance)
        .field(FieldSpec::text("purpose", "Purpose").required())
        .build()
        .unwrap();
    let mut form = GuidedForm::builder(spec, session.clone(), gateway(&stub, &session)).build();
    form.set_field("purpose", "Employment").unwrap();

    let SubmitOutcome::Failed { reason } = form.submit().await else {
        panic!("expected failure");
    };
    assert_eq!(reason, "Full name is required");
}

#[tokio::test]
async fn logout_clears_session_and_blocks_submission() {
    let stub = start_stub().await;
    let dir = tempfile::tempdir().unwrap();
    let session = signed_in(&dir.path().join("session.json"));
    let mut form = GuidedForm::builder(
        catalog::incident_report().unwrap(),
        session.clone(),
        gateway(&stub, &session),
    )
    .build();
    fill_incident(&mut form);

    session.logout(stub.client().auth()).await.unwrap();
    assert!(!session.is_signed_in());
    assert!(stub.state.is_revoked("resident-token"));

    // Untouched defaulted fields followed the cleared identity; edits survived.
    let SubmitOutcome::Invalid(errors) = form.submit().await else {
        panic!("expected invalid");
    };
    assert!(errors.contains("reporterName"));
    assert!(errors.contains("location"));
    assert_eq!(form.state().text("subCategory"), Some("Noise Complaints"));

    form.set_field("location", "Purok 3").unwrap();
    form.set_field("reporterName", "Juan Dela Cruz").unwrap();
    let SubmitOutcome::Failed { reason } = form.submit().await else {
        panic!("expected failure");
    };
    assert_eq!(reason, "You must be signed in to submit a request.");
    assert!(stub.state.submissions().is_empty());
}

#[tokio::test]
async fn external_session_rewrite_updates_locked_fields() {
    let stub = start_stub().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let session = signed_in(&path);
    let mut form = GuidedForm::builder(
        catalog::barangay_clearance().unwrap(),
        session.clone(),
        gateway(&stub, &session),
    )
    .build();
    assert_eq!(form.state().text("name"), Some("Juan Dela Cruz"));
    let _watch = SessionStore::watch(&session).unwrap();
    let mut changes = session.subscribe();

    // Another process rewrites the session.
    let other = SessionStore::open(&path).unwrap();
    other
        .set_identity(brgy_core::Identity {
            name: Some("Maria Santos".into()),
            email: None,
            barangay: Some("Poblacion".into()),
        })
        .unwrap();
    tokio::time::timeout(std::time::Duration::from_secs(5), changes.changed())
        .await
        .expect("session rewrite was not noticed");

    let view = form.render();
    assert_eq!(
        view.field("name").unwrap().value.as_ref().and_then(|v| v.as_text()),
        Some("Maria Santos")
    );
    assert!(view.field("email").unwrap().value.is_none());
    assert!(view.field("name").unwrap().read_only);
}

#[tokio::test]
async fn chrome_profile_switches_date_input_after_probe() {
    let stub = start_stub().await;
    let dir = tempfile::tempdir().unwrap();
    let session = signed_in(&dir.path().join("session.json"));
    let probe = UserAgentProbe::new(
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    );
    let mut form = GuidedForm::builder(
        catalog::incident_report().unwrap(),
        session.clone(),
        gateway(&stub, &session),
    )
    .probe(Arc::new(probe))
    .build();

    assert_eq!(form.probe_settled().await, EnvironmentProfile::NATIVE);
    let view = form.render();
    assert_eq!(
        view.field("date").unwrap().date_input,
        Some(brgy_form::DateInputStrategy::Native)
    );
}
