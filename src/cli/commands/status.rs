//! Status command - report cache usability

use crate::cache::Downloader;
use crate::cli::args::{OutputFormat, StatusArgs};
use crate::config::Config;
use crate::error::{CacheError, CacheResult};
use crate::fs::Filesystem;
use crate::transport::Transport;
use console::{style, Emoji};
use serde::Serialize;
use std::path::Path;

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "[MISSING] ");

#[derive(Serialize)]
struct StatusReport {
    cached: bool,
    cache_directory: String,
    agent_tarball: String,
    cache_state: String,
    desired_image: Option<String>,
    remote_tarball: String,
}

/// Execute the status command
pub fn execute(args: StatusArgs, config: &Config) -> CacheResult<()> {
    let downloader = Downloader::from_config(config);
    report(&downloader, args)
}

fn report<T: Transport, F: Filesystem>(
    downloader: &Downloader<T, F>,
    args: StatusArgs,
) -> CacheResult<()> {
    let status = build_report(downloader);

    match args.format {
        OutputFormat::Text => print_text(&status),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&status)?),
    }

    if args.check && !status.cached {
        return Err(CacheError::NotCached(
            downloader.locations().agent_tarball().to_path_buf(),
        ));
    }
    Ok(())
}

fn build_report<T: Transport, F: Filesystem>(downloader: &Downloader<T, F>) -> StatusReport {
    let loc = downloader.locations();
    let desired_image = if downloader.has_desired_agent() {
        Some(match downloader.desired_image_file() {
            Ok(path) => display(&path),
            Err(e) => format!("invalid ({e})"),
        })
    } else {
        None
    };

    StatusReport {
        cached: downloader.is_agent_cached(),
        cache_directory: display(loc.cache_directory()),
        agent_tarball: display(loc.agent_tarball()),
        cache_state: display(loc.cache_state()),
        desired_image,
        remote_tarball: loc.agent_remote_tarball().to_string(),
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

fn print_text(status: &StatusReport) {
    println!("{}", style("Agent Cache Status").bold().cyan());
    println!();
    if status.cached {
        println!("  {} {}", CHECK, style("Cached agent is usable").green());
    } else {
        println!("  {} {}", CROSS, style("No usable cached agent").yellow());
    }
    println!("  Directory: {}", status.cache_directory);
    println!("  Tarball:   {}", status.agent_tarball);
    println!("  State:     {}", status.cache_state);
    if let Some(ref desired) = status.desired_image {
        println!("  Desired:   {}", desired);
    }
    println!("  Remote:    {}", status.remote_tarball);
}
