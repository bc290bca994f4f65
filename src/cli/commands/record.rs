//! Record command - write the cache state marker

use crate::cache::Downloader;
use crate::config::Config;
use crate::error::CacheResult;
use console::style;

/// Execute the record command
pub fn execute(config: &Config) -> CacheResult<()> {
    let downloader = Downloader::from_config(config);
    downloader.record_cached_agent()?;
    println!(
        "{} {}",
        style("Recorded").green(),
        downloader.locations().cache_state().display()
    );
    Ok(())
}
