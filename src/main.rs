mod cli;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crate::cli::app::App;
use crowdconsole::{
    Authenticator, ColumnSource, Console, ConsoleConfig, StoreLocation, open_store, server,
};
use std::fs::OpenOptions;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "crowdconsole", version, about = "Crowdfunding admin console")]
struct Cli {
    /// Document store: memory://, file:///path/db.json or http(s)://host:port
    #[arg(long, global = true, env = "CROWDCONSOLE_STORE")]
    store: Option<String>,

    /// Listing columns: first-row or schema
    #[arg(long, global = true, env = "CROWDCONSOLE_COLUMNS")]
    columns: Option<ColumnSource>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive terminal console (default)
    Console,
    /// Serve a document store over HTTP
    Serve {
        #[arg(long, default_value = "127.0.0.1:8088")]
        bind: SocketAddr,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ConsoleConfig::from_env().context("invalid CROWDCONSOLE_* configuration")?;
    if let Some(url) = &cli.store {
        config = config.store(StoreLocation::parse(url)?);
    }
    if let Some(columns) = cli.columns {
        config = config.column_source(columns);
    }

    match cli.command.unwrap_or(Command::Console) {
        Command::Console => run_console(config).await,
        Command::Serve { bind } => run_server(config, bind).await,
    }
}

async fn run_console(config: ConsoleConfig) -> Result<()> {
    init_file_tracing(&config.log_file)?;

    let store = open_store(&config)
        .await
        .with_context(|| format!("failed to open store {}", config.store))?;
    info!(store = %config.store, columns = %config.column_source, "console starting");

    let console = Console::new(store.clone()).with_column_source(config.column_source);
    let mut app = App::new(console, store, Authenticator::from_config(&config));
    app.run().await.context("terminal error")?;

    info!("console closed");
    Ok(())
}

async fn run_server(config: ConsoleConfig, bind: SocketAddr) -> Result<()> {
    init_stderr_tracing();

    let store = open_store(&config)
        .await
        .with_context(|| format!("failed to open store {}", config.store))?;

    server::serve(bind, store)
        .await
        .with_context(|| format!("server error on {bind}"))?;
    Ok(())
}

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// The terminal belongs to the UI, so console logs go to a file.
fn init_file_tracing(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    tracing_subscriber::registry()
        .with(env_filter("crowdconsole=info"))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}

fn init_stderr_tracing() {
    tracing_subscriber::registry()
        .with(env_filter("crowdconsole=info,tower_http=info"))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
