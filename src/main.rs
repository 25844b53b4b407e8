use anyhow::Context;
use nap_overflow::{build_app, AppConfig, AppState};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("nap_overflow=info,tower_http=info")),
        )
        .init();

    info!("🚀 STARTUP: Starting Nap Overflow server...");

    // Load configuration from environment
    let config = AppConfig::from_env();
    info!("✅ STARTUP: Server configuration loaded");

    // Initialize application state
    let app_state = AppState::new(config.clone())
        .await
        .context("failed to initialize application state")?;
    info!("✅ STARTUP: Application state initialized ({} store)", app_state.db.backend_name());

    let app = build_app(app_state);

    let address = config.server_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {}", address))?;

    info!("✅ STARTUP: Server running on http://{}", address);

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
