mod config;
mod conversation_log;
mod error;
mod gateway;
mod handlers;
mod ollama;
mod routes;
mod state;
mod web;

use anyhow::Result;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("local_ai_gateway=debug,tower_http=debug")),
        )
        .init();

    let config = Config::load()?;
    let addr = config.listen_addr()?;

    info!("Starting {}...", handlers::SERVICE_NAME);
    info!("Model: {}", config.model_name);
    info!("Ollama: {}", config.ollama_host);
    info!("Storage: {}", config.conversations_file.display());
    info!("Endpoints:");
    info!("   - GET / - Web interface");
    info!("   - POST /generate - Generate text from prompt");
    info!("   - GET /conversations - View conversation history");
    info!("   - GET /health - Health check");

    let app_state = AppState::new(config)?;

    let app = routes::create_routes()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(app_state);

    info!("API available at: http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
