use anyhow::Context;
use fund_forecaster::api;
use fund_forecaster::catalog::FundCatalog;
use fund_forecaster::config::Config;
use fund_forecaster::genai_client::{GeminiClient, PortfolioModel};
use fund_forecaster::handlers::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the application.
///
/// This function initializes the application, including:
/// - Logging and tracing.
/// - Configuration loading.
/// - The fund catalog.
/// - The generative model client and generation service.
/// - HTTP routes and middleware (CORS, Rate Limiting).
///
/// It then starts the Axum server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fund_forecaster=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Fund catalog (NAV history is generated relative to today)
    let today = chrono::Utc::now().date_naive();
    let catalog = Arc::new(FundCatalog::load(config.fund_catalog_path.as_deref(), today)?);
    tracing::info!("Fund catalog loaded: {} funds", catalog.len());

    // Generative model client
    let model: Arc<dyn PortfolioModel> = Arc::new(
        GeminiClient::from_config(&config).context("Failed to initialize generative model client")?,
    );
    tracing::info!("✓ Gemini client initialized: {}", config.genai_model);

    // Build application state
    let app_state = Arc::new(AppState::new(config.clone(), catalog, model));
    tracing::info!(
        "Catalog fingerprint: {}",
        app_state.generator.template().fingerprint()
    );

    // Configure rate limiter: 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .context("Invalid rate limiter configuration")?,
    );

    // Rate limiting applies to /api only; health stays reachable
    let api_routes = api::routes().layer(GovernorLayer {
        config: governor_conf,
    });
    let app = api::app(app_state, api_routes);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
