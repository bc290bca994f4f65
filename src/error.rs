//! Error types for agent-cache
//!
//! All modules use `CacheResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Boxed error produced by a transport implementation
pub type TransportSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// All errors that can occur while checking, fetching or loading the cache
#[derive(Error, Debug)]
pub enum CacheError {
    // Remote errors
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: TransportSource,
    },

    #[error("unexpected response code {status} from {url}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("mismatched checksum while downloading {url} (expected {expected}, calculated {calculated})")]
    ChecksumMismatch {
        url: String,
        expected: String,
        calculated: String,
    },

    // Cache errors
    #[error("Malformed desired-image locator {path}: {reason}")]
    MalformedLocator { path: PathBuf, reason: String },

    #[error("No usable cached agent at {0}")]
    NotCached(PathBuf),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl CacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a transport error for `url`
    pub fn transport(url: impl Into<String>, source: impl Into<TransportSource>) -> Self {
        Self::Transport {
            url: url.into(),
            source: source.into(),
        }
    }

    /// Check if a later attempt could succeed.
    ///
    /// Nothing in this crate retries; the classification is for callers
    /// that own a retry policy.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } | Self::ChecksumMismatch { .. } => true,
            Self::UnexpectedStatus { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::NotCached(_) => Some("Run: agent-cache fetch"),
            Self::ChecksumMismatch { .. } => {
                Some("The download was discarded. Retry with: agent-cache fetch --force")
            }
            Self::MalformedLocator { .. } => {
                Some("The first line of the locator must name a file and end with a newline")
            }
            Self::Transport { .. } => Some("Check network access to the remote tarball URL"),
            _ => None,
        }
    }
}
