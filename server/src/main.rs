//! Tasksync Mirror - realtime tree server for Tasksync clients.

use tasksync_mirror::config::Config;
use tasksync_mirror::{serve, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tasksync_mirror=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing::info!("Starting Tasksync Mirror on {}:{}", config.host, config.port);
    match &config.data_file {
        Some(path) => tracing::info!("Persisting tree to {}", path.display()),
        None => tracing::info!("No MIRROR_DATA_FILE set, tree is memory-only"),
    }

    let addr = config.addr();
    let state = AppState::open(config).await?;

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    serve(listener, state).await?;

    Ok(())
}
