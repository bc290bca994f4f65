//! CLI argument definitions using clap derive

use crate::cache::AgentSource;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// agent-cache - Verified on-disk cache for the agent image
///
/// Checks for a usable cached agent tarball, fetches and verifies a fresh
/// copy when needed, and streams the cached or pre-staged image to callers.
#[derive(Parser, Debug)]
#[command(name = "agent-cache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "AGENT_CACHE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the cache directory
    #[arg(long, global = true, env = "AGENT_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Override the remote tarball URL
    #[arg(long, global = true, env = "AGENT_CACHE_TARBALL_URL")]
    pub tarball_url: Option<String>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Report whether a usable cached agent exists
    Status(StatusArgs),

    /// Download, verify and record the agent tarball
    Fetch(FetchArgs),

    /// Write the cache state marker
    Record,

    /// Stream the cached or desired agent image
    Load(LoadArgs),

    /// Show or initialize configuration
    Config(ConfigArgs),
}

/// Arguments for the status command
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    /// Exit with an error when the cache is not usable
    #[arg(long)]
    pub check: bool,
}

/// Arguments for the fetch command
#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// Download even if a usable cached agent exists
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for the load command
#[derive(Parser, Debug)]
pub struct LoadArgs {
    /// Which image to load
    #[arg(short, long, default_value = "auto")]
    pub source: LoadSource,

    /// Write to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Image selection for the load command
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LoadSource {
    /// Desired image if a locator exists, cached tarball otherwise
    Auto,
    /// Cached tarball
    Cached,
    /// Image named by the desired-image locator
    Desired,
}

impl From<LoadSource> for AgentSource {
    fn from(source: LoadSource) -> Self {
        match source {
            LoadSource::Auto => AgentSource::Auto,
            LoadSource::Cached => AgentSource::Cached,
            LoadSource::Desired => AgentSource::Desired,
        }
    }
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Output format for status
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON output
    Json,
}
