//! Deterministic test doubles for the filesystem and transport

use crate::error::{CacheError, CacheResult};
use crate::fs::{FileInfo, Filesystem, TempFile};
use crate::transport::{Response, Transport};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::{self, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

#[derive(Default)]
struct MemoryState {
    files: BTreeMap<PathBuf, Vec<u8>>,
    modes: BTreeMap<PathBuf, u32>,
    dirs: BTreeSet<PathBuf>,
    next_temp: u32,
    fail_mkdir: bool,
    fail_rename: bool,
    fail_remove: bool,
}

/// In-memory filesystem. Clones share state.
#[derive(Clone, Default)]
pub(crate) struct MemoryFs {
    state: Rc<RefCell<MemoryState>>,
}

impl MemoryFs {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_file(self, path: impl AsRef<Path>, data: &[u8]) -> Self {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            self.insert_dir(parent);
        }
        self.state
            .borrow_mut()
            .files
            .insert(path.to_path_buf(), data.to_vec());
        self
    }

    pub(crate) fn failing_mkdir(self) -> Self {
        self.state.borrow_mut().fail_mkdir = true;
        self
    }

    pub(crate) fn failing_rename(self) -> Self {
        self.state.borrow_mut().fail_rename = true;
        self
    }

    pub(crate) fn failing_remove(self) -> Self {
        self.state.borrow_mut().fail_remove = true;
        self
    }

    pub(crate) fn file(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.state.borrow().files.get(path.as_ref()).cloned()
    }

    pub(crate) fn mode(&self, path: impl AsRef<Path>) -> Option<u32> {
        self.state.borrow().modes.get(path.as_ref()).copied()
    }

    pub(crate) fn file_paths(&self) -> Vec<PathBuf> {
        self.state.borrow().files.keys().cloned().collect()
    }

    pub(crate) fn has_dir(&self, path: impl AsRef<Path>) -> bool {
        self.state.borrow().dirs.contains(path.as_ref())
    }

    fn insert_dir(&self, path: &Path) {
        let mut state = self.state.borrow_mut();
        for ancestor in path.ancestors() {
            if ancestor.as_os_str().is_empty() {
                continue;
            }
            state.dirs.insert(ancestor.to_path_buf());
        }
    }

    fn parent_exists(&self, path: &Path) -> bool {
        match path.parent() {
            Some(parent) => self.has_dir(parent),
            None => false,
        }
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{}: no such file", path.display()),
    )
}

impl Filesystem for MemoryFs {
    fn stat(&self, path: &Path) -> io::Result<FileInfo> {
        let state = self.state.borrow();
        if let Some(data) = state.files.get(path) {
            return Ok(FileInfo {
                size: data.len() as u64,
            });
        }
        if state.dirs.contains(path) {
            return Ok(FileInfo { size: 0 });
        }
        Err(not_found(path))
    }

    fn mkdir_all(&self, path: &Path, mode: u32) -> io::Result<()> {
        if self.state.borrow().fail_mkdir {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "mkdir denied",
            ));
        }
        self.insert_dir(path);
        self.state
            .borrow_mut()
            .modes
            .insert(path.to_path_buf(), mode);
        Ok(())
    }

    fn temp_file(&self, dir: &Path, prefix: &str) -> io::Result<TempFile> {
        if !self.has_dir(dir) {
            return Err(not_found(dir));
        }
        let path = {
            let mut state = self.state.borrow_mut();
            state.next_temp += 1;
            let path = dir.join(format!("{}{}.tmp", prefix, state.next_temp));
            state.files.insert(path.clone(), Vec::new());
            path
        };
        Ok(TempFile {
            path: path.clone(),
            file: Box::new(MemoryWriter {
                state: Rc::clone(&self.state),
                path,
            }),
        })
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let mut state = self.state.borrow_mut();
        if state.fail_rename {
            return Err(io::Error::new(io::ErrorKind::Other, "rename failed"));
        }
        let data = state.files.remove(from).ok_or_else(|| not_found(from))?;
        state.files.insert(to.to_path_buf(), data);
        Ok(())
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        let mut state = self.state.borrow_mut();
        if state.fail_remove {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "remove denied",
            ));
        }
        state
            .files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| not_found(path))
    }

    fn write_file(&self, path: &Path, data: &[u8], mode: u32) -> io::Result<()> {
        if !self.parent_exists(path) {
            return Err(not_found(path));
        }
        let mut state = self.state.borrow_mut();
        state.files.insert(path.to_path_buf(), data.to_vec());
        state.modes.insert(path.to_path_buf(), mode);
        Ok(())
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read>> {
        let data = self.file(path).ok_or_else(|| not_found(path))?;
        Ok(Box::new(Cursor::new(data)))
    }

    fn list_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        if !self.has_dir(dir) {
            return Err(not_found(dir));
        }
        let state = self.state.borrow();
        Ok(state
            .files
            .keys()
            .chain(state.dirs.iter())
            .filter(|p| p.parent() == Some(dir))
            .cloned()
            .collect())
    }
}

struct MemoryWriter {
    state: Rc<RefCell<MemoryState>>,
    path: PathBuf,
}

impl Write for MemoryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state.borrow_mut();
        let file = state
            .files
            .get_mut(&self.path)
            .ok_or_else(|| not_found(&self.path))?;
        file.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Reader that yields `prefix` and then fails
struct BrokenReader {
    prefix: Cursor<Vec<u8>>,
}

impl Read for BrokenReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.prefix.read(buf)?;
        if n > 0 {
            return Ok(n);
        }
        Err(io::Error::new(
            io::ErrorKind::ConnectionReset,
            "connection reset by peer",
        ))
    }
}

#[derive(Clone)]
enum Scripted {
    Reply { status: u16, body: Vec<u8> },
    BrokenBody { prefix: Vec<u8> },
    Fail(String),
}

/// Transport that answers from a fixed URL table and records requests
#[derive(Clone, Default)]
pub(crate) struct ScriptedTransport {
    routes: HashMap<String, Scripted>,
    calls: Rc<RefCell<Vec<String>>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reply(mut self, url: &str, status: u16, body: &[u8]) -> Self {
        self.routes.insert(
            url.to_string(),
            Scripted::Reply {
                status,
                body: body.to_vec(),
            },
        );
        self
    }

    pub(crate) fn broken_body(mut self, url: &str, prefix: &[u8]) -> Self {
        self.routes.insert(
            url.to_string(),
            Scripted::BrokenBody {
                prefix: prefix.to_vec(),
            },
        );
        self
    }

    pub(crate) fn fail(mut self, url: &str, reason: &str) -> Self {
        self.routes
            .insert(url.to_string(), Scripted::Fail(reason.to_string()));
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl Transport for ScriptedTransport {
    fn get(&self, url: &str) -> CacheResult<Response> {
        self.calls.borrow_mut().push(url.to_string());
        match self.routes.get(url).cloned() {
            Some(Scripted::Reply { status, body }) => Ok(Response {
                status,
                body: Box::new(Cursor::new(body)),
            }),
            Some(Scripted::BrokenBody { prefix }) => Ok(Response {
                status: 200,
                body: Box::new(BrokenReader {
                    prefix: Cursor::new(prefix),
                }),
            }),
            Some(Scripted::Fail(reason)) => Err(CacheError::transport(url, reason)),
            None => Err(CacheError::transport(url, "no route to host")),
        }
    }
}
