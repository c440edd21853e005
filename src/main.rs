mod api;
mod cache;
mod config;
mod pagination;
mod service;
mod sorting;
mod swapi;
#[cfg(test)]
mod testing;

use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::api::{build_router, AppState};
use crate::config::{Config, LoggingConfig};
use crate::service::SwService;
use crate::sorting::SortEngine;
use crate::swapi::cached_client::CachedSwapiClient;

#[derive(Parser, Debug)]
#[command(name = "swapi-proxy")]
#[command(about = "Cached, sorted and paginated Star Wars API people and planets")]
#[command(version)]
struct Args {
  /// Path to config file (default: ./swapi-proxy.yaml or $XDG_CONFIG_HOME/swapi-proxy/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Address to listen on, e.g. 0.0.0.0:8080
  #[arg(short, long)]
  bind: Option<String>,

  /// Upstream endpoint root, e.g. https://swapi.info/api
  #[arg(short, long)]
  upstream: Option<String>,
}

/// Install the global subscriber. Logs go to stdout, or to a daily-rotated
/// file when a directory is configured. The guard must outlive the server.
fn init_tracing(logging: &LoggingConfig) -> Result<WorkerGuard> {
  let filter = EnvFilter::try_from_default_env()
    .or_else(|_| EnvFilter::try_new(&logging.filter))
    .map_err(|e| eyre!("Invalid log filter '{}': {}", logging.filter, e))?;

  let (writer, guard) = match &logging.directory {
    Some(dir) => {
      tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, "swapi-proxy.log"))
    }
    None => tracing_appender::non_blocking(std::io::stdout()),
  };

  tracing_subscriber::registry()
    .with(filter)
    .with(
      tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(logging.directory.is_none()),
    )
    .try_init()?;

  Ok(guard)
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!("Failed to listen for shutdown signal: {}", e);
    std::future::pending::<()>().await;
  }
  tracing::info!("Shutting down");
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let mut config = Config::load(args.config.as_deref())?;

  // Command line wins over the file
  if let Some(bind) = args.bind {
    config.server.bind = bind;
  }
  if let Some(upstream) = args.upstream {
    config.upstream.base_url = upstream;
  }

  let _guard = init_tracing(&config.logging)?;

  let client = CachedSwapiClient::new(&config)?;
  let service = SwService::new(client, SortEngine::default());
  let app = build_router(AppState {
    service,
    default_page_size: config.server.default_page_size,
  });

  let listener = TcpListener::bind(&config.server.bind)
    .await
    .map_err(|e| eyre!("Failed to bind to {}: {}", config.server.bind, e))?;
  tracing::info!(
    "swapi-proxy listening on {} (upstream {})",
    config.server.bind,
    config.upstream.base_url
  );

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| eyre!("Server error: {}", e))?;

  Ok(())
}
