//! chartproxy - chart repository management over HTTP

use clap::Parser;
use miette::{IntoDiagnostic, Result, WrapErr};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use chartproxy::{AppContext, ProxyConfig, create_router};
use chartproxy_repo::HttpFetcher;

#[derive(Parser)]
#[command(name = "chartproxy")]
#[command(version)]
#[command(about = "HTTP proxy for chart repository management", long_about = None)]
struct Cli {
    /// Listen address
    #[arg(long, default_value = "127.0.0.1")]
    addr: String,

    /// Listen port
    #[arg(long, default_value_t = 18080)]
    port: u16,

    /// Proxy configuration file (optional)
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Path to the repositories file
    #[arg(long, env = "HELM_REPOSITORY_CONFIG")]
    repository_config: Option<PathBuf>,

    /// Path to the repository index cache
    #[arg(long, env = "HELM_REPOSITORY_CACHE")]
    repository_cache: Option<PathBuf>,

    /// Enable debug output
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_logging(cli.debug);

    let config = ProxyConfig::load_or_default(&cli.config)?;
    let settings = config.repo_settings(cli.repository_config, cli.repository_cache)?;
    tracing::info!(
        repository_config = %settings.repository_config.display(),
        repository_cache = %settings.repository_cache.display(),
        "repository settings"
    );

    let fetcher = Arc::new(HttpFetcher::new(settings.sync_timeout));
    let ctx = AppContext::new(settings, fetcher, cli.debug);

    for entry in &config.repositories {
        let name = entry.name.clone();
        ctx.registry
            .add(entry.clone(), false)
            .await
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to initialize repository {:?}", name))?;
        tracing::info!(repo = %name, "repository initialized");
    }

    let app = create_router(Arc::new(ctx), &config.cors_config());

    let addr: SocketAddr = format!("{}:{}", cli.addr, cli.port)
        .parse()
        .into_diagnostic()
        .wrap_err("Invalid listen address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to bind {}", addr))?;
    tracing::info!("listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .into_diagnostic()?;

    tracing::info!("server shut down");
    Ok(())
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter = if debug {
        EnvFilter::new(default_level)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutting down");
}
