use anyhow::Result;
use igv_gateway::{
    auth::SessionManager, catalog::HttpCatalogClient, config::Config, tracks::TrackAssembler, web,
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting igv gateway");

    // Load configuration from environment
    let config = Config::load()?;
    tracing::info!(
        catalog = %config.catalog.base_url(),
        token_role = ?config.catalog.token_role,
        reference = %config.reference_name,
        "Configuration loaded"
    );

    let session = SessionManager::init(&config.auth)
        .map_err(|e| anyhow::anyhow!("Failed to initialize session manager: {}", e))?;

    let catalog = HttpCatalogClient::new(&config.catalog)
        .map_err(|e| anyhow::anyhow!("Failed to initialize catalog client: {}", e))?;

    let assembler = TrackAssembler::new(
        Arc::new(catalog),
        config.datasets.clone(),
        config.catalog.token_role,
        config.reference_name.clone(),
    );

    let bind_address = config.bind_address();
    let state = Arc::new(AppState {
        config: Arc::new(config),
        session: Arc::new(session),
        assembler,
    });

    let app = web::create_router(state);

    // Bind and serve
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Gateway listening on {}", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
