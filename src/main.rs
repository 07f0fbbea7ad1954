use std::{net::SocketAddr, time::Duration};

use anyhow::{Context, Result};
use axum_server::tls_rustls::RustlsConfig;
use tokio::{net::TcpListener, signal};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use measure_service::{
    api::{self, AppState},
    config::Config,
    status_store::StatusStore,
    sweeper::ExpirySweeper,
};

/// How long in-flight requests get to finish once shutdown starts (TLS mode).
const TLS_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env (ignore error if file absent; env vars may be set externally)
    let _ = dotenvy::dotenv();

    // Initialise tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load config
    let config = Config::from_env()?;

    // Shared in-memory store of the latest status per device
    let store = StatusStore::new(config.cache_ttl);
    info!(ttl_secs = config.cache_ttl.as_secs(), "Status store ready");

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            shutdown.cancel();
        });
    }

    // Spawn expiry sweeper
    tokio::spawn(ExpirySweeper::new(store.clone(), config.sweep_interval, shutdown.clone()).run());

    let app = api::router(AppState::with_shutdown(store, shutdown.clone()));
    let addr = format!("{}:{}", config.server_host, config.server_port);

    match &config.tls {
        Some(tls) => {
            let tls_config = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
                .await
                .context("failed to load TLS certificate or key")?;
            let addr: SocketAddr = addr
                .parse()
                .with_context(|| format!("invalid listen address: {addr}"))?;

            let handle = axum_server::Handle::new();
            {
                let handle = handle.clone();
                let shutdown = shutdown.clone();
                tokio::spawn(async move {
                    shutdown.cancelled().await;
                    handle.graceful_shutdown(Some(TLS_DRAIN_TIMEOUT));
                });
            }

            info!(addr = %addr, "HTTPS server listening");
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            let listener = TcpListener::bind(&addr).await?;
            info!(addr = %addr, "HTTP server listening");

            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown.cancelled_owned())
                .await?;
        }
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
