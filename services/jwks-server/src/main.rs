//! JWKS server binary.

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use jwks_server::bootstrap::Bootstrapper;
use jwks_server::http::{build_router, AppState};
use jwks_server::observability::{init_tracing, TracingConfig};
use jwks_server::shutdown::{serve_with_graceful_shutdown, wait_for_signal};
use jwks_server::storage::open_store;
use jwks_server::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("invalid configuration")?;
    init_tracing(&TracingConfig::from_config(&config));

    info!(
        store = ?config.store,
        issuer = %config.jwt_issuer,
        expired_token_policy = config.expired_token_policy.as_str(),
        "Starting JWKS server"
    );

    let store = open_store(&config.store)
        .await
        .context("failed to open key store")?;

    Bootstrapper::from_config(store.clone(), &config)
        .ensure_seeded()
        .await
        .context("failed to seed key store")?;

    let router = build_router(AppState::from_config(store.clone(), &config));

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("JWKS server listening on {}", addr);

    let served = serve_with_graceful_shutdown(
        listener,
        router,
        wait_for_signal(),
        config.shutdown_timeout,
    )
    .await;

    store.close().await;
    info!("Shutdown complete");

    served.context("server error")
}
