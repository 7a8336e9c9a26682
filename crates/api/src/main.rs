//! Lantern - offline caching proxy
//!
//! Main entry point: installs the configured generation and serves the
//! caching reverse proxy until interrupted.

use anyhow::Context;
use lantern_domain::Config;
use lantern_lib::proxy;
use lantern_lib::utils::logging::{init_tracing, LogFormat};
use lantern_lib::AppContext;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before tracing so RUST_LOG and LANTERN_LOG_FORMAT apply
    let dotenv = dotenvy::dotenv();
    init_tracing(LogFormat::from_env());
    match dotenv {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(err) => debug!(error = %err, "no .env file loaded"),
    }

    let config = match lantern_infra::config::load() {
        Ok(config) => config,
        Err(err) => {
            warn!(error = %err, "no usable configuration found, using defaults");
            Config::default()
        }
    };

    let context =
        AppContext::new_with_config(config).context("failed to build application context")?;

    match context.host.start().await {
        Ok((installed, activated)) => info!(
            version = %installed.version,
            critical = installed.critical_cached,
            static_cached = installed.static_cached,
            static_failed = installed.static_failed,
            active = activated.is_some(),
            "generation installed"
        ),
        Err(err) => error!(
            error = %err,
            kind = err.label(),
            "install failed, requests pass through to the upstream"
        ),
    }

    let router = proxy::router(&context)?;
    let listener = TcpListener::bind(&context.config.server.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", context.config.server.bind_addr))?;
    info!(addr = %listener.local_addr()?, "lantern proxy listening");

    axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await?;

    context.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
