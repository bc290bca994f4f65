//! Configuration schema for agent-cache
//!
//! Configuration is stored at `~/.config/agent-cache/config.toml`

use crate::checksum::ChecksumKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// On-disk cache layout
    pub cache: CacheConfig,

    /// Where the published tarball and checksum live
    pub remote: RemoteConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Cache directory and the file names inside it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory owned by the cache
    pub directory: PathBuf,

    /// Marker written once a fetch has been recorded
    pub state_file: String,

    /// Verified agent tarball
    pub tarball_file: String,

    /// Externally authored pointer to a pre-staged image
    pub desired_image_file: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("/var/cache/ecs"),
            state_file: "state".to_string(),
            tarball_file: "ecs-agent.tar".to_string(),
            desired_image_file: "desired-image".to_string(),
        }
    }
}

/// Remote source of the agent image
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// URL of the published tarball
    pub tarball_url: String,

    /// URL of the published checksum (defaults to `<tarball_url>.<checksum>`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum_url: Option<String>,

    /// Digest algorithm of the published checksum
    pub checksum: ChecksumKind,

    /// Per-request timeout in seconds (0 disables it)
    pub timeout_secs: u64,
}

impl RemoteConfig {
    /// Request timeout, `None` when disabled
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            tarball_url: "https://s3.amazonaws.com/amazon-ecs-agent/ecs-agent-latest.tar"
                .to_string(),
            checksum_url: None,
            checksum: ChecksumKind::Md5,
            timeout_secs: 300,
        }
    }
}
