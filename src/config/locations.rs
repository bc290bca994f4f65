//! Location resolution: every path and URL the cache manager touches

use super::schema::Config;
use std::path::{Path, PathBuf};

/// Resolved cache paths and remote URLs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locations {
    cache_directory: PathBuf,
    cache_state: PathBuf,
    agent_tarball: PathBuf,
    desired_image_locator_file: PathBuf,
    agent_remote_tarball: String,
    agent_remote_checksum: String,
}

impl Locations {
    /// Resolve all locations from configuration
    pub fn from_config(config: &Config) -> Self {
        let dir = &config.cache.directory;
        let remote = &config.remote;
        let checksum_url = remote.checksum_url.clone().unwrap_or_else(|| {
            format!("{}.{}", remote.tarball_url, remote.checksum.extension())
        });

        Self {
            cache_directory: dir.clone(),
            cache_state: dir.join(&config.cache.state_file),
            agent_tarball: dir.join(&config.cache.tarball_file),
            desired_image_locator_file: dir.join(&config.cache.desired_image_file),
            agent_remote_tarball: remote.tarball_url.clone(),
            agent_remote_checksum: checksum_url,
        }
    }

    /// Directory owned by the cache
    pub fn cache_directory(&self) -> &Path {
        &self.cache_directory
    }

    /// Marker recording a completed fetch
    pub fn cache_state(&self) -> &Path {
        &self.cache_state
    }

    /// Verified agent tarball
    pub fn agent_tarball(&self) -> &Path {
        &self.agent_tarball
    }

    /// Pointer file naming a pre-staged image
    pub fn desired_image_locator_file(&self) -> &Path {
        &self.desired_image_locator_file
    }

    /// Remote tarball URL
    pub fn agent_remote_tarball(&self) -> &str {
        &self.agent_remote_tarball
    }

    /// Remote checksum URL
    pub fn agent_remote_checksum(&self) -> &str {
        &self.agent_remote_checksum
    }
}

impl Default for Locations {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
