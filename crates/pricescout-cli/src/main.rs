mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pricescout_scraper::SearchEngine;

#[derive(Debug, Parser)]
#[command(name = "pricescout")]
#[command(about = "Search product listings across the registered storefronts")]
struct Cli {
    /// Store registry to load instead of `PRICESCOUT_STORES_PATH`.
    #[arg(long, global = true)]
    stores: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search every store and print `{products, count}` as JSON.
    Search {
        query: String,
        /// City or region; `all` keeps every store.
        #[arg(long)]
        location: Option<String>,
    },
    /// List the registered stores.
    Stores,
    /// Scrape one store, unfiltered, and report what came back.
    Probe {
        store: String,
        #[arg(default_value = "laptop")]
        query: String,
    },
    /// Observe a product page's price and decide a price alert.
    Recheck {
        url: String,
        #[arg(long)]
        target: f64,
        /// The alert has already notified once.
        #[arg(long)]
        notified: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = pricescout_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let stores_path = cli.stores.unwrap_or_else(|| config.stores_path.clone());
    let registry = pricescout_core::load_stores(&stores_path)?;
    tracing::debug!(
        path = %stores_path.display(),
        stores = registry.stores.len(),
        "loaded store registry"
    );

    let engine = SearchEngine::from_app_config(&config, registry.stores)?;

    let result = tokio::select! {
        r = commands::run(&engine, cli.command) => r,
        () = shutdown_signal() => Ok(()),
    };

    engine.shutdown().await;
    result
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
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
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, closing browser session");
}
