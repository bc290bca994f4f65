//! Filesystem capability used by the cache manager
//!
//! The cache manager never touches `std::fs` directly. Everything goes
//! through [`Filesystem`] so tests can swap in an in-memory fake. Only the
//! primitives need implementing; stream copying, teeing, whole-stream reads
//! and basename extraction are provided methods.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

/// Size and existence information returned by [`Filesystem::stat`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileInfo {
    /// Length in bytes
    pub size: u64,
}

/// A freshly created temporary file with a unique name
pub struct TempFile {
    /// Where the file lives on disk
    pub path: PathBuf,
    /// Write handle; dropping it closes the file
    pub file: Box<dyn Write>,
}

/// Primitive file operations plus a handful of stream helpers
pub trait Filesystem {
    /// Size of the file at `path`; `NotFound` when missing
    fn stat(&self, path: &Path) -> io::Result<FileInfo>;

    /// Create `path` and its parents with `mode`; succeeds if it already exists
    fn mkdir_all(&self, path: &Path, mode: u32) -> io::Result<()>;

    /// Create a uniquely named file inside `dir` whose name starts with `prefix`
    fn temp_file(&self, dir: &Path, prefix: &str) -> io::Result<TempFile>;

    /// Atomically replace `to` with `from`
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Delete the file at `path`
    fn remove(&self, path: &Path) -> io::Result<()>;

    /// Write `data` as the whole content of `path`, creating it with `mode`
    fn write_file(&self, path: &Path, data: &[u8], mode: u32) -> io::Result<()>;

    /// Open `path` for reading
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read>>;

    /// Paths of the entries directly inside `dir`
    fn list_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;

    /// Stream `src` into `dst` with a constant-size buffer
    fn copy(&self, dst: &mut dyn Write, src: &mut dyn Read) -> io::Result<u64> {
        io::copy(src, dst)
    }

    /// Wrap `src` so every byte read is also written to `sink`
    fn tee_reader<R: Read, W: Write>(&self, src: R, sink: W) -> TeeReader<R, W>
    where
        Self: Sized,
    {
        TeeReader::new(src, sink)
    }

    /// Read `src` to the end
    fn read_all(&self, src: &mut dyn Read) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        src.read_to_end(&mut buf)?;
        Ok(buf)
    }

    /// Last `/`-separated element of `path`, ignoring trailing separators.
    ///
    /// `""` maps to `"."` and a path made only of separators maps to `"/"`.
    fn base<'a>(&self, path: &'a str) -> &'a str {
        if path.is_empty() {
            return ".";
        }
        let trimmed = path.trim_end_matches('/');
        if trimmed.is_empty() {
            return "/";
        }
        match trimmed.rfind('/') {
            Some(idx) => &trimmed[idx + 1..],
            None => trimmed,
        }
    }
}

/// Reader adapter that copies everything it reads into a sink.
///
/// A read only succeeds once the sink has accepted the same bytes, so a
/// failing sink surfaces as a read error.
pub struct TeeReader<R, W> {
    src: R,
    sink: W,
}

impl<R: Read, W: Write> TeeReader<R, W> {
    /// Create a tee over `src` feeding `sink`
    pub fn new(src: R, sink: W) -> Self {
        Self { src, sink }
    }

    /// Give back the reader and the sink
    pub fn into_inner(self) -> (R, W) {
        (self.src, self.sink)
    }
}

impl<R: Read, W: Write> Read for TeeReader<R, W> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.src.read(buf)?;
        if n > 0 {
            self.sink.write_all(&buf[..n])?;
        }
        Ok(n)
    }
}

/// Production filesystem backed by `std::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardFs;

impl Filesystem for StandardFs {
    fn stat(&self, path: &Path) -> io::Result<FileInfo> {
        let meta = fs::metadata(path)?;
        Ok(FileInfo { size: meta.len() })
    }

    fn mkdir_all(&self, path: &Path, mode: u32) -> io::Result<()> {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(mode);
        }
        #[cfg(not(unix))]
        let _ = mode;
        builder.create(path)
    }

    fn temp_file(&self, dir: &Path, prefix: &str) -> io::Result<TempFile> {
        let named = tempfile::Builder::new().prefix(prefix).tempfile_in(dir)?;
        // Removal is owned by the caller, not by tempfile's drop.
        let (file, path) = named.keep().map_err(|e| e.error)?;
        Ok(TempFile {
            path,
            file: Box::new(SyncOnFlush(file)),
        })
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn write_file(&self, path: &Path, data: &[u8], mode: u32) -> io::Result<()> {
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(mode);
        }
        #[cfg(not(unix))]
        let _ = mode;
        let mut file = options.open(path)?;
        file.write_all(data)?;
        file.flush()
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read>> {
        Ok(Box::new(File::open(path)?))
    }

    fn list_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect()
    }
}

/// File whose `flush` also syncs data and metadata to disk
struct SyncOnFlush(File);

impl Write for SyncOnFlush {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()?;
        self.0.sync_all()
    }
}
