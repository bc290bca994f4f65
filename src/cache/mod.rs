//! On-disk cache of the agent image
//!
//! The cache directory holds a single verified tarball plus a state marker.
//! A download streams into a temp file next to the tarball, is hashed on the
//! way through, and only replaces the tarball via rename once the digest
//! matches the published checksum.
//!
//! # Cache States
//!
//! | Marker | Tarball | `is_agent_cached` | Meaning |
//! |--------|---------|-------------------|---------|
//! | absent | absent | false | Never fetched |
//! | absent | present | false | Fetched but not recorded (crash between steps) |
//! | present | absent | false | Tarball removed externally |
//! | present | present | true | Fetched, verified and recorded |
//!
//! Zero-length files count as absent.

pub mod downloader;

#[cfg(test)]
pub(crate) mod fakes;

pub use downloader::{AgentSource, Downloader, CACHE_DIR_MODE, CACHE_FILE_MODE};
