//! Check, fetch, verify, commit and load the cached agent tarball

use crate::checksum::ChecksumKind;
use crate::config::{Config, Locations};
use crate::error::{CacheError, CacheResult};
use crate::fs::{Filesystem, StandardFs, TempFile};
use crate::transport::{HttpTransport, Response, Transport};
use std::fmt;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Permission of the cache directory
pub const CACHE_DIR_MODE: u32 = 0o700;

/// Permission of files written by the cache
pub const CACHE_FILE_MODE: u32 = 0o600;

/// Name prefix of in-flight downloads inside the cache directory
const TEMP_FILE_PREFIX: &str = ".ecs-agent.tar-";

/// Marker content; never parsed, only its size matters
const CACHED_SENTINEL: &[u8] = b"1";

/// Which artifact to hand to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AgentSource {
    /// Desired image when a locator file exists, cached tarball otherwise
    #[default]
    Auto,
    /// The network-fetched tarball
    Cached,
    /// The file named by the desired-image locator
    Desired,
}

impl fmt::Display for AgentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Auto => "auto",
            Self::Cached => "cached",
            Self::Desired => "desired",
        };
        write!(f, "{}", name)
    }
}

/// Cache manager for the agent image
pub struct Downloader<T = HttpTransport, F = StandardFs> {
    transport: T,
    fs: F,
    locations: Locations,
    checksum: ChecksumKind,
}

impl Downloader {
    /// Create a downloader using HTTP and the local filesystem
    pub fn from_config(config: &Config) -> Self {
        Self::with_parts(
            HttpTransport::new(config.remote.timeout()),
            StandardFs,
            Locations::from_config(config),
            config.remote.checksum,
        )
    }
}

impl<T: Transport, F: Filesystem> Downloader<T, F> {
    /// Create a downloader from explicit collaborators
    pub fn with_parts(transport: T, fs: F, locations: Locations, checksum: ChecksumKind) -> Self {
        Self {
            transport,
            fs,
            locations,
            checksum,
        }
    }

    /// Resolved paths and URLs
    pub fn locations(&self) -> &Locations {
        &self.locations
    }

    /// Whether a cached copy of the agent is usable.
    ///
    /// True when both the state marker and the tarball exist and are
    /// non-empty. Contents are not validated here; the tarball was verified
    /// before it was renamed into place.
    pub fn is_agent_cached(&self) -> bool {
        self.file_not_empty(self.locations.cache_state())
            && self.file_not_empty(self.locations.agent_tarball())
    }

    fn file_not_empty(&self, path: &Path) -> bool {
        match self.fs.stat(path) {
            Ok(info) => info.size > 0,
            Err(e) => {
                debug!("stat {}: {}", path.display(), e);
                false
            }
        }
    }

    /// Download a fresh copy of the agent and verify it before committing.
    ///
    /// The tarball is streamed into a temp file inside the cache directory
    /// while being hashed, then renamed over the cached tarball if the digest
    /// matches the published checksum. On any error after the temp file is
    /// created, it is removed and the cached tarball is left untouched.
    ///
    /// Does not write the state marker; call [`Self::record_cached_agent`]
    /// afterwards.
    pub fn download_agent(&self) -> CacheResult<()> {
        let cache_dir = self.locations.cache_directory();
        self.fs
            .mkdir_all(cache_dir, CACHE_DIR_MODE)
            .map_err(|e| {
                CacheError::io(
                    format!("creating cache directory {}", cache_dir.display()),
                    e,
                )
            })?;

        self.remove_stale_temp_files(cache_dir);

        let published = self.published_checksum()?;
        let tarball = self.published_tarball()?;

        let TempFile { path, file } = self
            .fs
            .temp_file(cache_dir, TEMP_FILE_PREFIX)
            .map_err(|e| {
                CacheError::io(format!("creating temp file in {}", cache_dir.display()), e)
            })?;
        debug!("Temp file {}", path.display());
        let mut temp = TempFileGuard::new(&self.fs, path);

        let calculated = self.stream_to_temp(tarball.body, file, temp.path())?;
        debug!("Expected {}", published);
        debug!("Calculated {}", calculated);
        if published != calculated {
            return Err(CacheError::ChecksumMismatch {
                url: self.locations.agent_remote_tarball().to_string(),
                expected: published,
                calculated,
            });
        }

        let target = self.locations.agent_tarball();
        debug!(
            "Attempting to rename {} to {}",
            temp.path().display(),
            target.display()
        );
        self.fs.rename(temp.path(), target).map_err(|e| {
            CacheError::io(
                format!("renaming {} to {}", temp.path().display(), target.display()),
                e,
            )
        })?;
        temp.disarm();

        info!("Cached agent tarball at {}", target.display());
        Ok(())
    }

    /// Remove temp files left behind by an interrupted download.
    ///
    /// The cache directory has a single owner, so any temp file present
    /// before a download starts is stale. Failures are logged and ignored.
    fn remove_stale_temp_files(&self, cache_dir: &Path) {
        let entries = match self.fs.list_dir(cache_dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to list {}: {}", cache_dir.display(), e);
                return;
            }
        };

        for path in entries {
            let stale = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(TEMP_FILE_PREFIX));
            if !stale {
                continue;
            }
            debug!("Removing stale temp file {}", path.display());
            if let Err(e) = self.fs.remove(&path) {
                warn!("Failed to remove stale temp file {}: {}", path.display(), e);
            }
        }
    }

    fn published_checksum(&self) -> CacheResult<String> {
        let url = self.locations.agent_remote_checksum();
        debug!("Downloading published {} checksum from {}", self.checksum, url);
        let mut response = self.transport.get(url)?;
        expect_ok(url, &response)?;

        let body = self
            .fs
            .read_all(&mut response.body)
            .map_err(|e| CacheError::io(format!("reading checksum from {}", url), e))?;
        Ok(String::from_utf8_lossy(&body).trim().to_string())
    }

    fn published_tarball(&self) -> CacheResult<Response> {
        let url = self.locations.agent_remote_tarball();
        debug!("Downloading agent tarball from {}", url);
        let response = self.transport.get(url)?;
        expect_ok(url, &response)?;
        Ok(response)
    }

    /// Copy `body` into `file` through the digest, returning the hex digest.
    ///
    /// `body` and `file` are both closed on return.
    fn stream_to_temp(
        &self,
        body: Box<dyn Read>,
        mut file: Box<dyn Write>,
        temp_path: &Path,
    ) -> CacheResult<String> {
        let url = self.locations.agent_remote_tarball();
        let mut hasher = self.checksum.hasher();
        let written = {
            let mut tee = self.fs.tee_reader(body, &mut hasher);
            self.fs.copy(&mut file, &mut tee).map_err(|e| {
                CacheError::io(
                    format!("downloading {} to {}", url, temp_path.display()),
                    e,
                )
            })?
        };
        file.flush()
            .map_err(|e| CacheError::io(format!("flushing {}", temp_path.display()), e))?;
        debug!("Wrote {} bytes to {}", written, temp_path.display());
        Ok(hasher.finalize_hex())
    }

    /// Record that the cached tarball is complete by writing the state marker.
    ///
    /// Safe to call repeatedly; the marker is simply overwritten.
    pub fn record_cached_agent(&self) -> CacheResult<()> {
        let path = self.locations.cache_state();
        self.fs
            .write_file(path, CACHED_SENTINEL, CACHE_FILE_MODE)
            .map_err(|e| CacheError::io(format!("writing cache state {}", path.display()), e))?;
        debug!("Recorded cache state at {}", path.display());
        Ok(())
    }

    /// Open the cached tarball for reading
    pub fn load_cached_agent(&self) -> CacheResult<Box<dyn Read>> {
        let path = self.locations.agent_tarball();
        debug!("Loading cached agent from {}", path.display());
        self.fs
            .open(path)
            .map_err(|e| CacheError::io(format!("opening cached agent {}", path.display()), e))
    }

    /// Open the image named by the desired-image locator file.
    ///
    /// The first line of the locator, which must end with a newline, names a
    /// file inside the cache directory. Directory components are ignored and
    /// the rest of the locator is reserved.
    pub fn load_desired_agent(&self) -> CacheResult<Box<dyn Read>> {
        let path = self.desired_image_file()?;
        debug!("Loading desired agent from {}", path.display());
        self.fs
            .open(&path)
            .map_err(|e| CacheError::io(format!("opening desired agent {}", path.display()), e))
    }

    /// Resolve the path named by the desired-image locator
    pub fn desired_image_file(&self) -> CacheResult<PathBuf> {
        let locator = self.locations.desired_image_locator_file();
        let malformed = |reason: &str| CacheError::MalformedLocator {
            path: locator.to_path_buf(),
            reason: reason.to_string(),
        };

        let file = self
            .fs
            .open(locator)
            .map_err(|e| CacheError::io(format!("opening {}", locator.display()), e))?;
        let mut line = Vec::new();
        BufReader::new(file)
            .read_until(b'\n', &mut line)
            .map_err(|e| CacheError::io(format!("reading {}", locator.display()), e))?;

        if line.last() != Some(&b'\n') {
            return Err(malformed("first line is not terminated by a newline"));
        }
        let line = String::from_utf8(line).map_err(|_| malformed("first line is not UTF-8"))?;

        // Trailing whitespace and the newline are dropped; leading whitespace is part of the name.
        let name = self.fs.base(&line).trim_end();
        if matches!(name.trim_start(), "" | "." | ".." | "/") {
            return Err(malformed("first line does not name a file"));
        }
        Ok(self.locations.cache_directory().join(name))
    }

    /// Whether a desired-image locator file is present
    pub fn has_desired_agent(&self) -> bool {
        self.fs
            .stat(self.locations.desired_image_locator_file())
            .is_ok()
    }

    /// Pick the concrete source for `source`
    pub fn resolve_source(&self, source: AgentSource) -> AgentSource {
        match source {
            AgentSource::Auto if self.has_desired_agent() => AgentSource::Desired,
            AgentSource::Auto => AgentSource::Cached,
            other => other,
        }
    }

    /// Open the agent image from `source`
    pub fn load_agent(&self, source: AgentSource) -> CacheResult<Box<dyn Read>> {
        match self.resolve_source(source) {
            AgentSource::Desired => self.load_desired_agent(),
            _ => self.load_cached_agent(),
        }
    }
}

fn expect_ok(url: &str, response: &Response) -> CacheResult<()> {
    if response.is_ok() {
        return Ok(());
    }
    Err(CacheError::UnexpectedStatus {
        url: url.to_string(),
        status: response.status,
    })
}

/// Removes a temp file on drop unless disarmed
struct TempFileGuard<'a, F: Filesystem> {
    fs: &'a F,
    path: PathBuf,
    armed: bool,
}

impl<'a, F: Filesystem> TempFileGuard<'a, F> {
    fn new(fs: &'a F, path: PathBuf) -> Self {
        Self {
            fs,
            path,
            armed: true,
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    /// The file has been renamed away; nothing left to clean up
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl<F: Filesystem> Drop for TempFileGuard<'_, F> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        debug!("Removing temp file {}", self.path.display());
        if let Err(e) = self.fs.remove(&self.path) {
            warn!("Failed to remove temp file {}: {}", self.path.display(), e);
        }
    }
}
