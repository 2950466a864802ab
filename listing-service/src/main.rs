use listing_service::config::ListingConfig;
use listing_service::services::init_metrics;
use listing_service::startup::{run_lambda, AppState, Application};
use service_core::config::is_lambda;
use service_core::observability::init_tracing;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let config = ListingConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    init_tracing(
        "listing-service",
        &config.common.log_level,
        config.otlp_endpoint.as_deref(),
    );

    if is_lambda() {
        let state = AppState::from_config(config).await.map_err(|e| {
            tracing::error!("Failed to initialize service: {}", e);
            std::io::Error::other(format!("Initialization error: {}", e))
        })?;

        return run_lambda(state).await.map_err(|e| {
            tracing::error!("Lambda runtime error: {}", e);
            std::io::Error::other(format!("Lambda runtime error: {}", e))
        });
    }

    // Must be installed before any metrics are recorded
    init_metrics();

    let app = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to build application: {}", e);
        std::io::Error::other(format!("Initialization error: {}", e))
    })?;

    app.run_until_stopped().await
}
