use std::net::SocketAddr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use token_bank_bot::{routes, tasks, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "token_bank_bot=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Token Bank Bot...");

    // Load configuration
    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!(
        "Environment: {}, Server: {}",
        config.environment,
        config.server_address()
    );
    tracing::info!(
        "Ledger: {:?}, log: {:?}, backups: {:?}",
        config.token_file,
        config.log_file,
        config.backup_dir
    );

    tokio::fs::create_dir_all(&config.backup_dir).await?;

    let state = AppState::new(config.clone());

    tasks::spawn_backup_loop(state.clone(), config.backup_interval());
    match &config.keepalive_url {
        Some(url) => {
            tasks::spawn_keepalive_loop(url.clone(), config.keepalive_interval());
            tracing::info!("Keep-alive pings enabled for {}", url);
        }
        None => tracing::info!("APP_URL not set, keep-alive pings disabled"),
    }

    let app = routes::router(state);

    // Start server
    let addr: SocketAddr = config.server_address().parse()?;
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
