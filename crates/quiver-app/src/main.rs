use std::sync::Arc;

use salvo::Listener;
use salvo::conn::TcpListener;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt};

use quiver_app::app::router;
use quiver_core::{config::load_config, constants::DEFAULT_CATEGORIES};
use quiver_service::{auth::AuthServices, version::VersionKeyStore};
use quiver_store::{MemoryStore, Store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (filter_layer, filter_handle) = reload::Layer::new(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    tracing::info!("Starting Quiver bookmark server");

    let config = load_config()?;

    tracing::info!(config = ?config, "Configuration loaded");

    if let Ok(filter) = EnvFilter::try_new(config.logging.level.as_str()) {
        if let Err(e) = filter_handle.modify(|current| *current = filter) {
            tracing::warn!(error = %e, "Failed to update log filter from config");
        }
    } else {
        tracing::warn!(level = %config.logging.level, "Invalid log level in config, keeping debug");
    }

    let auth = Arc::new(AuthServices::from_config(&config.auth)?);
    let versions = Arc::new(VersionKeyStore::new().with_categories(DEFAULT_CATEGORIES));
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());

    tracing::info!(
        categories = ?DEFAULT_CATEGORIES,
        "Version key store ready; tokens reset on restart"
    );

    let bind_addr = config.server.bind_addr();
    let acceptor = TcpListener::new(bind_addr.clone()).bind().await;

    let service_router = router(config, store, auth, versions);

    tracing::info!("Server listening on {bind_addr}");

    salvo::Server::new(acceptor).serve(service_router).await;

    Ok(())
}
