//! agent-cache - Verified on-disk cache for the agent image
//!
//! CLI entry point that dispatches to subcommands.

use agent_cache::cli::{self, Cli, Commands};
use agent_cache::config::{Config, ConfigManager};
use agent_cache::error::CacheResult;
use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn run() -> CacheResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let mut config = config_manager.load()?;
    cli::apply_overrides(&cli, &mut config);

    init_logging(cli.verbose, &config);

    match cli.command {
        Commands::Status(args) => cli::commands::status(args, &config),
        Commands::Fetch(args) => cli::commands::fetch(args, &config),
        Commands::Record => cli::commands::record(&config),
        Commands::Load(args) => cli::commands::load(args, &config),
        Commands::Config(args) => cli::commands::config(args, &config, &config_manager),
    }
}

/// Initialize logging: 0 = warn, 1 = info, 2+ = debug. Logs go to stderr so
/// `load` can stream the image on stdout.
fn init_logging(verbose: u8, config: &Config) {
    let filter = match verbose {
        0 => EnvFilter::new("agent_cache=warn"),
        1 => EnvFilter::new("agent_cache=info"),
        _ => EnvFilter::new("agent_cache=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if config.general.log_format == "json" {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}
