mod config;
mod errors;
mod persistence;
mod pricing;
mod records;
mod server;
mod session;
mod state;
mod view;

use crate::config::{AppConfig, StoreBackend};
use crate::errors::LedgerResult;
use crate::persistence::{MemoryStore, PersistenceAdapter, SqliteStore};
use crate::pricing::PricingClient;
use crate::session::{SessionHandle, SessionStore};
use crate::state::AppState;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    // Structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("bond_ledger starting");

    // Load config
    let cfg = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("config error: {e}");
            std::process::exit(1);
        }
    };

    // Open storage and restore the session
    let session = match open_session(&cfg) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("session init error: {e}");
            std::process::exit(1);
        }
    };

    let pricing = PricingClient::new(
        &cfg.pricing_base_url,
        Duration::from_secs(cfg.pricing_timeout_secs),
    );
    tracing::info!(pricing_service = %cfg.pricing_base_url, "pricing client ready");

    let port = cfg.server_port;
    let dashboard_dir = cfg.dashboard_dir.clone();
    let app_state = AppState::new(cfg, session, pricing);
    let app = server::router(app_state.clone(), &dashboard_dir);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!("server listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("bind error: {e}");
            std::process::exit(1);
        });

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(app_state))
        .await
    {
        tracing::error!("server error: {e}");
    }

    tracing::info!("bond_ledger stopped");
}

fn open_session(cfg: &AppConfig) -> LedgerResult<SessionHandle> {
    let backend: Arc<dyn PersistenceAdapter> = match cfg.store_backend {
        StoreBackend::Sqlite => Arc::new(SqliteStore::open(&cfg.data_dir)?),
        StoreBackend::Memory => {
            tracing::warn!("memory store selected, records will not survive a restart");
            Arc::new(MemoryStore::new())
        }
    };
    let store = SessionStore::load_persisted(backend)?;
    if store.is_empty() {
        tracing::info!("starting with an empty ledger");
    } else {
        tracing::info!(records = store.len(), "ledger restored");
    }
    Ok(SessionHandle::new(store))
}

async fn shutdown_signal(state: Arc<AppState>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received, discarding in-flight pricing results");
    state.session.close();
}
