//! Event endpoint integration tests.
//!
//! Run with: `cargo test -p heicflow-api --test events_test`

mod helpers;

use helpers::{object_event, TestAppBuilder, BUCKET};
use heicflow_pipeline::test_helpers::{sample_record, MemoryFileStore, MemoryStorage, StaticDecoder};
use std::time::Duration;

const SOURCE: &str = "students/abc/files/IMG_0042.heic";
const CONVERTED: &str = "students/abc/files/IMG_0042_converted.jpg";

fn storage_with_source() -> MemoryStorage {
    let storage = MemoryStorage::with_bucket(BUCKET);
    storage.insert(SOURCE, b"heic bytes".to_vec(), "image/heic");
    storage
}

#[tokio::test]
async fn test_health() {
    let app = TestAppBuilder::new().build();

    let response = app.client().get("/health").await;

    response.assert_status_ok();
    assert_eq!(response.json::<serde_json::Value>()["status"], "ok");
}

#[tokio::test]
async fn test_heic_event_is_converted_and_correlated() {
    let record = sample_record("IMG_0042.heic");
    let id = record.id;
    let app = TestAppBuilder::new()
        .storage(storage_with_source())
        .records(MemoryFileStore::with_records(vec![record]))
        .build();

    let response = app
        .client()
        .post("/events/object-finalized")
        .json(&object_event(SOURCE, "image/heic"))
        .await;

    response.assert_status_ok();
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["status"], "converted");
    assert_eq!(body["converted_path"], CONVERTED);
    assert_eq!(body["correlated"], true);

    let published = app.storage.object(CONVERTED).expect("converted object published");
    assert_eq!(published.content_type, "image/jpeg");
    assert_eq!(&published.data[..2], &[0xFF, 0xD8]);
    assert_eq!(
        published.metadata.get("originalFile").map(String::as_str),
        Some(SOURCE)
    );

    let updated = app.records.record(id).expect("record kept");
    assert_eq!(
        updated.converted_file_name.as_deref(),
        Some("IMG_0042_converted.jpg")
    );
    assert!(updated.converted_at.is_some());
}

#[tokio::test]
async fn test_root_path_accepts_events() {
    let app = TestAppBuilder::new().storage(storage_with_source()).build();

    let response = app
        .client()
        .post("/")
        .json(&object_event(SOURCE, "image/heif"))
        .await;

    response.assert_status_ok();
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["status"], "converted");
    // No matching record: the conversion still succeeds
    assert_eq!(body["correlated"], false);
}

#[tokio::test]
async fn test_non_heic_event_is_skipped() {
    let app = TestAppBuilder::new().build();

    let response = app
        .client()
        .post("/events/object-finalized")
        .json(&object_event("students/abc/files/photo.png", "image/png"))
        .await;

    response.assert_status_ok();
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["status"], "skipped");
    assert_eq!(body["reason"], "not_heic");
    assert_eq!(app.storage.download_count(), 0);
}

#[tokio::test]
async fn test_own_output_is_skipped() {
    let app = TestAppBuilder::new().build();

    let response = app
        .client()
        .post("/events/object-finalized")
        .json(&object_event(CONVERTED, "image/jpeg"))
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.json::<serde_json::Value>()["reason"],
        "already_converted"
    );
    assert_eq!(app.storage.upload_count(), 0);
}

#[tokio::test]
async fn test_event_without_content_type_is_skipped() {
    let app = TestAppBuilder::new().build();

    let response = app
        .client()
        .post("/events/object-finalized")
        .json(&serde_json::json!({ "name": SOURCE, "bucket": BUCKET }))
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.json::<serde_json::Value>()["reason"],
        "missing_path_or_content_type"
    );
}

#[tokio::test]
async fn test_decode_failure_is_not_retryable() {
    let app = TestAppBuilder::new()
        .storage(storage_with_source())
        .decoder(StaticDecoder::failing())
        .build();

    let response = app
        .client()
        .post("/events/object-finalized")
        .json(&object_event(SOURCE, "image/heic"))
        .await;

    response.assert_status(axum::http::StatusCode::UNPROCESSABLE_ENTITY);
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["status"], "failed");
    assert_eq!(body["stage"], "transcode");
    assert_eq!(app.storage.upload_count(), 0);
}

#[tokio::test]
async fn test_upload_failure_is_retryable() {
    let app = TestAppBuilder::new()
        .storage(storage_with_source().fail_uploads())
        .build();

    let response = app
        .client()
        .post("/events/object-finalized")
        .json(&object_event(SOURCE, "image/heic"))
        .await;

    response.assert_status(axum::http::StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.json::<serde_json::Value>()["stage"], "publish");
    assert!(app.storage.object(CONVERTED).is_none());
}

#[tokio::test]
async fn test_missing_source_is_not_retryable() {
    let app = TestAppBuilder::new().build();

    let response = app
        .client()
        .post("/events/object-finalized")
        .json(&object_event(SOURCE, "image/heic"))
        .await;

    response.assert_status(axum::http::StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json::<serde_json::Value>()["stage"], "fetch");
}

#[tokio::test]
async fn test_malformed_body_is_rejected() {
    let app = TestAppBuilder::new().build();

    let response = app
        .client()
        .post("/events/object-finalized")
        .content_type("application/json")
        .text("{not json")
        .await;

    response.assert_status_bad_request();
    assert_eq!(
        response.json::<serde_json::Value>()["code"],
        "INVALID_INPUT"
    );
}

#[tokio::test]
async fn test_invocation_timeout() {
    let app = TestAppBuilder::new()
        .storage(storage_with_source())
        .invocation_timeout(Duration::from_millis(200))
        .pipeline_config(|config| {
            config.retry.delay = Duration::from_secs(60);
        })
        .build();

    let response = app
        .client()
        .post("/events/object-finalized")
        .json(&object_event(SOURCE, "image/heic"))
        .await;

    response.assert_status(axum::http::StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(
        response.json::<serde_json::Value>()["code"],
        "INVOCATION_TIMEOUT"
    );
    // The abandoned invocation removes its scratch directory
    assert_eq!(
        std::fs::read_dir(app.scratch_root.path()).unwrap().count(),
        0
    );
}
