//! Fetch command - download, verify and record the agent tarball

use crate::cache::Downloader;
use crate::cli::args::FetchArgs;
use crate::config::Config;
use crate::error::CacheResult;
use crate::fs::Filesystem;
use crate::transport::Transport;
use console::style;
use tracing::info;

/// What a fetch ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchOutcome {
    AlreadyCached,
    Downloaded,
}

/// Execute the fetch command
pub fn execute(args: FetchArgs, config: &Config) -> CacheResult<()> {
    let downloader = Downloader::from_config(config);
    let tarball = downloader.locations().agent_tarball().display().to_string();

    match ensure_cached(&downloader, args.force)? {
        FetchOutcome::AlreadyCached => {
            println!("{} {}", style("Already cached").green(), tarball);
        }
        FetchOutcome::Downloaded => {
            println!("{} {}", style("Downloaded and verified").green(), tarball);
        }
    }
    Ok(())
}

/// Download and record unless a usable copy exists.
///
/// Download and record are separate steps so a crash in between leaves the
/// cache reported as not usable.
fn ensure_cached<T: Transport, F: Filesystem>(
    downloader: &Downloader<T, F>,
    force: bool,
) -> CacheResult<FetchOutcome> {
    if !force && downloader.is_agent_cached() {
        info!("Agent already cached, skipping download");
        return Ok(FetchOutcome::AlreadyCached);
    }

    info!(
        "Downloading agent from {}",
        downloader.locations().agent_remote_tarball()
    );
    downloader.download_agent()?;
    downloader.record_cached_agent()?;
    Ok(FetchOutcome::Downloaded)
}
