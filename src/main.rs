use epigraph::EpigraphError;
use epigraph::config::Config;
use epigraph::resolver::QuoteResolver;
use epigraph::server::router::{AppState, app_router};
use mimalloc::MiMalloc;
use std::net::SocketAddr;
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::load();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.basic.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_level(true)
                .with_target(false),
        )
        .init();

    // Startup summary: sensitive settings are reported set/not-set only.
    info!(
        listen_addr = %cfg.basic.listen_addr,
        listen_port = cfg.basic.listen_port,
        loglevel = %cfg.basic.loglevel,
        tier = %cfg.sources.environment,
        demo_mode = cfg.sources.demo_mode,
        database_url = set_or_not(cfg.basic.configured_database_url().is_some()),
        key_vault_url = set_or_not(cfg.sources.key_vault_url.is_some()),
        inline_payload = set_or_not(cfg.sources.quotes_data_base64.is_some()),
        "starting epigraph"
    );

    let resolver = QuoteResolver::new(cfg.sources.clone());
    let db = match epigraph::db::spawn(&cfg.basic, resolver).await {
        Ok(handle) => Some(handle),
        Err(EpigraphError::DatabaseNotConfigured) => {
            info!("database not configured yet; skipping schema/seed");
            None
        }
        Err(e) => {
            warn!(error = %e, "database unavailable at startup; serving without quotes");
            None
        }
    };

    let state = AppState::new(db, cfg.sources.clone());
    let app = app_router(state);

    let addr = SocketAddr::from((cfg.basic.listen_addr, cfg.basic.listen_port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server has shut down gracefully.");
    Ok(())
}

fn set_or_not(set: bool) -> &'static str {
    if set { "set" } else { "not set" }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { /* ... */ },
        _ = terminate => { /* ... */ },
    }
}
