//! agent-cache - Verified on-disk cache for the agent image
//!
//! Keeps a single agent tarball in a local cache directory. A copy is only
//! ever made visible after its digest matched the published checksum, so the
//! cache is either absent or intact.

pub mod cache;
pub mod checksum;
pub mod cli;
pub mod config;
pub mod error;
pub mod fs;
pub mod transport;

pub use cache::{AgentSource, Downloader};
pub use error::{CacheError, CacheResult};
