//! Application startup and lifecycle management.
//!
//! Client handles are created once here and injected into `AppState`. The same
//! router is served either by the Lambda runtime or by a plain TCP listener.

use crate::config::{ListingConfig, ProviderKind, StorageBackend};
use crate::handlers;
use crate::services::providers::{
    BedrockTextProvider, GenerationParams, MockTextProvider, OpenAiConfig, OpenAiTextProvider,
    TextProvider,
};
use crate::services::secrets::fetch_api_key;
use crate::services::{BlobStore, LocalBlobStore, S3BlobStore, SecretsManagerStore};
use axum::{
    http::Request,
    middleware::from_fn,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    cors_headers_middleware, metrics_middleware, request_id_middleware, REQUEST_ID_HEADER,
};
use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ListingConfig,
    pub blob_store: Arc<dyn BlobStore>,
    pub text_provider: Arc<dyn TextProvider>,
}

impl AppState {
    pub fn generation_params(&self) -> GenerationParams {
        GenerationParams {
            model: self.config.llm.model_id.clone(),
            temperature: self.config.llm.temperature,
            max_tokens: self.config.llm.max_tokens,
        }
    }

    /// Create the blob store and text provider described by the configuration.
    ///
    /// Fails when the provider credential cannot be obtained, so the process
    /// never starts serving without one.
    pub async fn from_config(config: ListingConfig) -> Result<Self, AppError> {
        let needs_aws = config.storage.backend == StorageBackend::S3
            || config.llm.provider == ProviderKind::Bedrock
            || (config.llm.provider == ProviderKind::OpenAi && config.llm.openai_api_key.is_none());

        let sdk_config = if needs_aws {
            Some(aws_config::load_from_env().await)
        } else {
            None
        };

        let blob_store: Arc<dyn BlobStore> = match (config.storage.backend, &sdk_config) {
            (StorageBackend::S3, Some(sdk)) => {
                Arc::new(S3BlobStore::new(aws_sdk_s3::Client::new(sdk)))
            }
            _ => Arc::new(LocalBlobStore::new(&config.storage.local_path)),
        };

        tracing::info!(
            backend = ?config.storage.backend,
            bucket = ?config.inventory.bucket,
            key = ?config.inventory.key,
            stock_match = ?config.inventory.stock_match,
            "Initialized inventory storage"
        );

        let text_provider: Arc<dyn TextProvider> = match (config.llm.provider, &sdk_config) {
            (ProviderKind::Bedrock, Some(sdk)) => Arc::new(BedrockTextProvider::new(
                aws_sdk_bedrockruntime::Client::new(sdk),
            )),
            (ProviderKind::OpenAi, sdk) => {
                let api_key = match (&config.llm.openai_api_key, sdk) {
                    (Some(key), _) => key.clone(),
                    (None, Some(sdk)) => {
                        let store = SecretsManagerStore::new(aws_sdk_secretsmanager::Client::new(sdk));
                        fetch_api_key(&store, &config.llm.openai_secret_name)
                            .await
                            .map_err(|e| {
                                tracing::error!(
                                    secret = %config.llm.openai_secret_name,
                                    "Failed to load OpenAI API key: {}",
                                    e
                                );
                                e
                            })?
                    }
                    (None, None) => {
                        return Err(AppError::ConfigError(anyhow::anyhow!(
                            "OpenAI API key is not configured"
                        )))
                    }
                };

                let provider = OpenAiTextProvider::new(OpenAiConfig {
                    api_key,
                    base_url: config.llm.openai_base_url.clone(),
                    timeout: Duration::from_secs(config.llm.request_timeout_secs),
                })
                .map_err(|e| AppError::ConfigError(anyhow::Error::new(e)))?;
                Arc::new(provider)
            }
            _ => Arc::new(MockTextProvider::new(true)),
        };

        tracing::info!(
            provider = text_provider.name(),
            model = %config.llm.model_id,
            "Initialized text provider"
        );

        Ok(Self {
            config,
            blob_store,
            text_provider,
        })
    }
}

/// Render a panic as the same JSON 500 every other failure produces.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    AppError::InternalError(anyhow::anyhow!("handler panicked: {}", detail)).into_response()
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .fallback(handlers::route_listing)
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(CatchPanicLayer::custom(handle_panic))
        // Outermost so the panic response carries the CORS headers as well
        .layer(from_fn(cors_headers_middleware))
        .with_state(state)
}

/// Drive the router from API Gateway events.
pub async fn run_lambda(state: AppState) -> Result<(), lambda_http::Error> {
    tracing::info!("Starting Lambda runtime");
    lambda_http::run(build_router(state)).await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// Application container for server mode.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    pub async fn build(config: ListingConfig) -> Result<Self, AppError> {
        let port = config.common.port;
        let state = AppState::from_config(config).await?;
        Self::with_state(state, port).await
    }

    /// Bind a listener for an already constructed state (port 0 = random port).
    pub async fn with_state(state: AppState, port: u16) -> Result<Self, AppError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        Ok(Self {
            port,
            listener,
            router: build_router(state),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}
