use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use panache::config::{Cli, Config};
use panache::db;
use panache::image_host::{ImageHost, ImageKitHost};
use panache::routes;
use panache::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional; real environment variables win.
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse CLI args and load config
    let cli = Cli::parse();
    let data_dir = Config::data_dir(&cli)?;
    std::fs::create_dir_all(&data_dir)?;
    tracing::info!("Data directory: {}", data_dir.display());

    let config = Config::load(&cli)?;

    // Ensure the staging directory exists before it is served
    std::fs::create_dir_all(config.uploads_path())?;
    tracing::info!("Staging uploads in {}", config.uploads_path().display());

    // Initialize database
    let db_path = config
        .db_path()
        .ok_or_else(|| anyhow::anyhow!("Database path is not configured"))?;
    let pool = db::create_pool(db_path)?;
    db::run_migrations(&pool)?;

    let host_span = tracing::info_span!("image_host");
    let image_host = ImageKitHost::from_config(&config.image_host, host_span)
        .map(|host| Arc::new(host) as Arc<dyn ImageHost>);
    match image_host {
        Some(_) => tracing::info!("Forwarding uploads to {}", config.image_host.endpoint),
        None => tracing::info!("No image host configured, serving uploads from staging"),
    }
    if !config.auth.hash_passwords {
        tracing::warn!("Password verification is disabled: login only checks the pseudo");
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let app = routes::app(AppState::new(config, pool, image_host));

    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
