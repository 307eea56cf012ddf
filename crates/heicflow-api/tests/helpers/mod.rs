//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p heicflow-api`. The pipeline is
//! wired to in-memory storage and file records, so no database or bucket is
//! needed.

use axum_test::TestServer;
use heicflow_api::setup::routes;
use heicflow_api::state::AppState;
use heicflow_pipeline::test_helpers::{MemoryFileStore, MemoryStorage, StaticDecoder};
use heicflow_pipeline::{ConversionPipeline, PipelineConfig};
use heicflow_processing::{HeicTranscoder, JpegEncoder};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const BUCKET: &str = "interviews.appspot.com";

/// Test application: server and the fakes behind it.
pub struct TestApp {
    pub server: TestServer,
    pub storage: Arc<MemoryStorage>,
    pub records: Arc<MemoryFileStore>,
    pub scratch_root: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

pub struct TestAppBuilder {
    storage: MemoryStorage,
    records: MemoryFileStore,
    decoder: StaticDecoder,
    invocation_timeout: Duration,
    adjust: Box<dyn FnOnce(&mut PipelineConfig)>,
}

impl TestAppBuilder {
    pub fn new() -> Self {
        Self {
            storage: MemoryStorage::with_bucket(BUCKET),
            records: MemoryFileStore::default(),
            decoder: StaticDecoder::new(32, 24),
            invocation_timeout: Duration::from_secs(30),
            adjust: Box::new(|_| {}),
        }
    }

    pub fn storage(mut self, storage: MemoryStorage) -> Self {
        self.storage = storage;
        self
    }

    pub fn records(mut self, records: MemoryFileStore) -> Self {
        self.records = records;
        self
    }

    pub fn decoder(mut self, decoder: StaticDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn invocation_timeout(mut self, timeout: Duration) -> Self {
        self.invocation_timeout = timeout;
        self
    }

    pub fn pipeline_config(mut self, adjust: impl FnOnce(&mut PipelineConfig) + 'static) -> Self {
        self.adjust = Box::new(adjust);
        self
    }

    pub fn build(self) -> TestApp {
        let storage = Arc::new(self.storage);
        let records = Arc::new(self.records);
        let scratch_root = TempDir::new().expect("Failed to create scratch root");

        let mut config = PipelineConfig {
            scratch_root: scratch_root.path().to_path_buf(),
            ..PipelineConfig::default()
        };
        (self.adjust)(&mut config);

        let transcoder = Arc::new(HeicTranscoder::new(
            Arc::new(self.decoder),
            JpegEncoder::default(),
        ));
        let pipeline = ConversionPipeline::new(storage.clone(), records.clone(), transcoder, config);
        let state = Arc::new(AppState::new(pipeline, self.invocation_timeout));

        let server = TestServer::new(routes::setup_routes(state)).expect("Failed to create test server");

        TestApp {
            server,
            storage,
            records,
            scratch_root,
        }
    }
}

/// Finalize event body in the provider's object resource shape.
pub fn object_event(name: &str, content_type: &str) -> serde_json::Value {
    serde_json::json!({
        "kind": "storage#object",
        "name": name,
        "bucket": BUCKET,
        "contentType": content_type,
        "size": "4096",
    })
}
