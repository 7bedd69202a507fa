// Entrypoint for the CLI application.
// - Parses flags, starts file logging and loads the config.
// - Hands an API client to the UI loop and stays out of the way.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tunefinder_cli::{api::ApiClient, config::TunefinderConfig, logging, ui::main_menu};

/// Upload audio clips and identify songs through the tunefinder API.
#[derive(Parser, Debug)]
#[command(name = "tunefinder", version, about)]
struct Cli {
    /// Path to a TOML config file (default: ./tunefinder_config.toml if present).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Base URL of the API gateway; overrides the config file and TUNEFINDER_API_URL.
    #[arg(long)]
    api_url: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_path = logging::init_logging()?;

    let mut cfg = TunefinderConfig::load(cli.config.as_deref()).context("Loading configuration")?;
    if let Some(url) = cli.api_url {
        cfg.api_base_url = url;
    }
    tracing::info!(api = cfg.base_url(), "starting tunefinder");
    println!("tunefinder: talking to {} (log: {})", cfg.base_url(), log_path.display());

    let api = ApiClient::from_config(&cfg)?;

    // Blocks until the user exits.
    main_menu(&api)?;
    Ok(())
}
