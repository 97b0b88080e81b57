//! Pennyweb main entry point

use anyhow::Context;
use clap::Parser;
use pennyweb_api::start_server;
use pennyweb_config::{Config, ConfigError};
use pennyweb_core::{open_store, Ledger, LedgerOperations};
use std::path::PathBuf;
use tokio::runtime::Runtime;

#[derive(Parser, Debug)]
#[command(name = "pennyweb")]
#[command(author = "Pennyweb Contributors")]
#[command(version = "0.1.0")]
#[command(about = "A small income and expense ledger with a web interface", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Print the default configuration and exit
    #[arg(long)]
    print_default_config: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.print_default_config {
        print!("{}", Config::generate_default());
        return Ok(());
    }

    // The logger is configured from the file, so it starts after the load
    let (config, missing) = match Config::load(&args.config) {
        Ok(config) => (config, false),
        Err(ConfigError::FileNotFound { .. }) => (Config::default(), true),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to load {}", args.config.display()))
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.logging.level))
        .init();

    if missing {
        log::warn!(
            "Config file {} not found, using defaults",
            args.config.display()
        );
    } else {
        log::info!("Config loaded from {}", args.config.display());
    }

    let store = open_store(&config.storage).context("Failed to open store")?;
    let mut ledger = Ledger::new(&config, store);
    ledger.load_from_storage();

    let summary = ledger.summary();
    log::info!(
        "Ledger loaded: {} transactions, balance {:.2}",
        summary.total_transactions,
        summary.balance
    );

    let rt = Runtime::new()?;
    rt.block_on(start_server(config, ledger))
        .context("Server error")?;

    Ok(())
}
