//! Command-line interface

pub mod args;
pub mod commands;

pub use args::{Cli, Commands};

use crate::config::Config;

/// Apply command-line overrides on top of loaded configuration
pub fn apply_overrides(cli: &Cli, config: &mut Config) {
    if let Some(ref dir) = cli.cache_dir {
        config.cache.directory = dir.clone();
    }
    if let Some(ref url) = cli.tarball_url {
        config.remote.tarball_url = url.clone();
    }
}
