#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use listing_service::config::{
    DescriptionConfig, InventoryConfig, ListingConfig, LlmConfig, ProviderKind, StockMatch,
    StorageBackend, StorageConfig,
};
use listing_service::services::providers::{
    FinishReason, GenerationParams, ProviderError, ProviderResponse, TextProvider,
};
use listing_service::services::BlobStore;
use listing_service::{build_router, AppState};
use service_core::config::Config as CoreConfig;
use service_core::error::AppError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt;

pub const TEST_BUCKET: &str = "inventory-bucket";
pub const TEST_KEY: &str = "inventory/vehicles.csv";

pub const INVENTORY_CSV: &str = "\
stock_number,year,make,model,Trim,drivetrain,mileage.value,transmission,price
P1001,2021,Subaru,Outback,Limited,AWD,32000,Automatic,27995
p2002,2019,Honda,Civic,EX,FWD,54000,CVT,18450
P3003,2018,Ford,F-150,XLT,4WD,78000,Automatic,29900
P4004,2020,BMW,330i,,RWD,25000,Automatic,31500
P1001,2009,Toyota,Corolla,LE,FWD,150000,Automatic,5995
";

/// In-memory blob store that counts calls and can be told to fail.
pub struct FakeBlobStore {
    contents: Option<Vec<u8>>,
    pub calls: AtomicUsize,
}

impl FakeBlobStore {
    pub fn with_csv(csv: &str) -> Self {
        Self {
            contents: Some(csv.as_bytes().to_vec()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn missing() -> Self {
        Self {
            contents: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlobStore for FakeBlobStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.contents.clone().ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!(
                "NoSuchKey: s3://{}/{} does not exist",
                bucket,
                key
            ))
        })
    }
}

/// Text provider that records prompts and replays a fixed completion.
pub struct RecordingProvider {
    completion: Option<String>,
    pub prompts: Mutex<Vec<String>>,
    pub params: Mutex<Vec<GenerationParams>>,
}

impl RecordingProvider {
    pub fn replying(completion: &str) -> Self {
        Self {
            completion: Some(completion.to_string()),
            prompts: Mutex::new(Vec::new()),
            params: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            completion: None,
            prompts: Mutex::new(Vec::new()),
            params: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextProvider for RecordingProvider {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.params.lock().unwrap().push(params.clone());

        match &self.completion {
            Some(text) => Ok(ProviderResponse {
                text: text.clone(),
                input_tokens: 100,
                output_tokens: 20,
                finish_reason: FinishReason::Complete,
            }),
            None => Err(ProviderError::RateLimited),
        }
    }
}

/// Text provider that panics on every call.
pub struct PanickingProvider;

#[async_trait]
impl TextProvider for PanickingProvider {
    fn name(&self) -> &'static str {
        "panicking"
    }

    async fn generate(
        &self,
        _prompt: &str,
        _params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        panic!("provider exploded");
    }
}

/// Shared buffer behind a test subscriber.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Route JSON log events on the current thread into a buffer until the guard drops.
pub fn capture_logs() -> (LogBuffer, tracing::subscriber::DefaultGuard) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .with_writer(move || writer.clone())
        .finish();

    (buffer, tracing::subscriber::set_default(subscriber))
}

pub fn test_config() -> ListingConfig {
    ListingConfig {
        common: CoreConfig {
            port: 0,
            log_level: "error".to_string(),
        },
        inventory: InventoryConfig {
            bucket: Some(TEST_BUCKET.to_string()),
            key: Some(TEST_KEY.to_string()),
            stock_match: StockMatch::Exact,
        },
        storage: StorageConfig {
            backend: StorageBackend::Local,
            local_path: "target/test-storage".to_string(),
        },
        llm: LlmConfig {
            provider: ProviderKind::Mock,
            model_id: "test-model".to_string(),
            temperature: 0.7,
            max_tokens: 300,
            request_timeout_secs: 5,
            openai_base_url: "http://127.0.0.1:9".to_string(),
            openai_api_key: None,
            openai_secret_name: "openai/api-key".to_string(),
        },
        description: DescriptionConfig {
            append_disclaimer: false,
        },
        otlp_endpoint: None,
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<FakeBlobStore>,
    pub provider: Arc<RecordingProvider>,
}

impl TestApp {
    pub fn new(store: FakeBlobStore, provider: RecordingProvider) -> Self {
        Self::with_config(test_config(), store, provider)
    }

    pub fn with_config(
        config: ListingConfig,
        store: FakeBlobStore,
        provider: RecordingProvider,
    ) -> Self {
        let store = Arc::new(store);
        let provider = Arc::new(provider);

        let state = AppState {
            config,
            blob_store: store.clone(),
            text_provider: provider.clone(),
        };

        Self {
            router: build_router(state),
            store,
            provider,
        }
    }

    /// Router backed by an arbitrary provider; `provider` is an idle recorder.
    pub fn with_provider(store: FakeBlobStore, text_provider: Arc<dyn TextProvider>) -> Self {
        let store = Arc::new(store);

        let state = AppState {
            config: test_config(),
            blob_store: store.clone(),
            text_provider,
        };

        Self {
            router: build_router(state),
            store,
            provider: Arc::new(RecordingProvider::failing()),
        }
    }

    pub fn with_inventory() -> Self {
        Self::new(
            FakeBlobStore::with_csv(INVENTORY_CSV),
            RecordingProvider::replying("Great car."),
        )
    }

    /// Issue a GET and return status, headers and the parsed JSON body.
    pub async fn get(&self, uri: &str) -> (StatusCode, HeaderMap, serde_json::Value) {
        let response = self
            .router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);

        (status, headers, body)
    }
}
