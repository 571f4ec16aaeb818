//! CLI entry and dispatch.

use anyhow::{Context, Result};
use authdeck_core::config::{Config, paths};
use authdeck_core::logging;
use clap::Parser;

#[derive(Parser)]
#[command(name = "authdeck")]
#[command(version)]
#[command(about = "Interactive console for exercising an identity backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// API key for the identity backend (overrides config)
    #[arg(long, value_name = "KEY")]
    api_key: Option<String>,

    /// Base URL of the identity backend (overrides config)
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Route all traffic to a local auth emulator (host:port)
    #[arg(long, value_name = "HOST:PORT")]
    emulator: Option<String>,

    /// Google OAuth client id for federated sign-in (overrides config)
    #[arg(long, value_name = "ID")]
    google_client_id: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Print the config file path
    Path,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::Config {
        command: ConfigCommands::Path,
    }) = cli.command
    {
        println!("{}", paths::config_path().display());
        return Ok(());
    }

    let mut config = Config::load().context("load config")?;
    if let Some(key) = cli.api_key {
        config.api_key = key;
    }
    if let Some(url) = cli.base_url {
        config.base_url = url;
    }
    if let Some(id) = cli.google_client_id {
        config.google.client_id = id;
    }
    if let Some(host) = cli.emulator.as_deref() {
        config.use_emulator(host);
    }

    // Keep the guard alive for the lifetime of the process so buffered log
    // lines are flushed on exit.
    let _log_guard = logging::init(&paths::log_dir()).context("init logging")?;
    tracing::info!(base_url = %config.base_url, "starting");

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
    rt.block_on(async move { authdeck_tui::run(&config).await })
}
