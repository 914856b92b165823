//! An in-memory [`FileSystem`] for driving the pipeline without touching the disk.
//!
//! Inputs are registered up front (or as endless generators), shards are captured in memory
//! and can be read back after the run, and individual steps can be made to fail.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::{self, BufRead, BufReader, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use shardsplit_lib::SplitError;
use shardsplit_lib::cleanup::CleanupStack;
use shardsplit_lib::compression::{decorate_reader, decorate_writer};
use shardsplit_lib::errors::Result;
use shardsplit_lib::fs::{FileSystem, ShardWriter};

/// Write sink whose contents stay readable after the writer is boxed away.
#[derive(Clone, Default)]
pub struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    pub fn bytes(&self) -> Vec<u8> {
        self.0.lock().clone()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A sink that accepts `capacity` bytes and then fails every write.
struct FailingSink {
    remaining: usize,
}

impl Write for FailingSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.remaining == 0 {
            return Err(io::Error::other("device full"));
        }
        let n = buf.len().min(self.remaining);
        self.remaining -= n;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A reader producing `line\n` forever.
pub struct EndlessReader {
    line: Vec<u8>,
    offset: usize,
}

impl EndlessReader {
    pub fn new(line: &str) -> Self {
        let mut line = line.as_bytes().to_vec();
        line.push(b'\n');
        Self { line, offset: 0 }
    }
}

impl Read for EndlessReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut written = 0;
        while written < buf.len() {
            let chunk = &self.line[self.offset..];
            let n = chunk.len().min(buf.len() - written);
            buf[written..written + n].copy_from_slice(&chunk[..n]);
            written += n;
            self.offset = (self.offset + n) % self.line.len();
        }
        Ok(written)
    }
}

#[derive(Default)]
struct State {
    inputs: HashMap<String, Vec<u8>>,
    endless: HashMap<String, String>,
    shards: BTreeMap<PathBuf, SharedBuf>,
    dirs: HashSet<PathBuf>,
    readers_opened: usize,
    closed: Vec<PathBuf>,
}

/// In-memory file system with injectable failures.
#[derive(Clone, Default)]
pub struct MemoryFileSystem {
    state: Arc<Mutex<State>>,
    fail_create_at: Option<usize>,
    fail_write_after: Option<usize>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an input with the given raw (possibly compressed) content.
    pub fn with_input(self, path: &str, content: impl Into<Vec<u8>>) -> Self {
        self.state.lock().inputs.insert(path.to_string(), content.into());
        self
    }

    /// Registers an input that repeats `line` forever.
    pub fn with_endless_input(self, path: &str, line: &str) -> Self {
        self.state.lock().endless.insert(path.to_string(), line.to_string());
        self
    }

    /// Makes creation of the `index`-th shard (0-based, in creation order) fail.
    pub fn fail_create_at(mut self, index: usize) -> Self {
        self.fail_create_at = Some(index);
        self
    }

    /// Makes every shard fail once `bytes` bytes have been written to it.
    pub fn fail_write_after(mut self, bytes: usize) -> Self {
        self.fail_write_after = Some(bytes);
        self
    }

    /// Raw bytes of every shard created, keyed by path.
    pub fn shards(&self) -> BTreeMap<PathBuf, Vec<u8>> {
        self.state.lock().shards.iter().map(|(path, buf)| (path.clone(), buf.bytes())).collect()
    }

    /// Paths of the shards whose release actions ran, in the order they ran.
    pub fn closed(&self) -> Vec<PathBuf> {
        self.state.lock().closed.clone()
    }

    pub fn dirs(&self) -> HashSet<PathBuf> {
        self.state.lock().dirs.clone()
    }

    pub fn readers_opened(&self) -> usize {
        self.state.lock().readers_opened
    }
}

impl FileSystem for MemoryFileSystem {
    fn mkdir_all(&self, dir: &Path) -> io::Result<()> {
        self.state.lock().dirs.insert(dir.to_path_buf());
        Ok(())
    }

    fn create_writer(&self, path: &Path, compression: &str, level: u32) -> Result<ShardWriter> {
        let mut state = self.state.lock();
        if self.fail_create_at == Some(state.shards.len()) {
            return Err(SplitError::Resource {
                what: "shard",
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
            });
        }

        let buf = SharedBuf::default();
        state.shards.insert(path.to_path_buf(), buf.clone());
        drop(state);

        let sink = match self.fail_write_after {
            Some(remaining) => decorate_writer(compression, FailingSink { remaining }, level)?,
            None => decorate_writer(compression, buf, level)?,
        };

        let mut cleanups = CleanupStack::new();
        let state = Arc::clone(&self.state);
        let closed = path.to_path_buf();
        cleanups.add(move || {
            state.lock().closed.push(closed);
            Ok(())
        });
        Ok(ShardWriter::new(path.to_path_buf(), sink, cleanups))
    }

    fn create_reader(&self, path: &str) -> Result<Box<dyn BufRead + Send>> {
        let mut state = self.state.lock();
        state.readers_opened += 1;
        if let Some(line) = state.endless.get(path) {
            return Ok(Box::new(BufReader::new(EndlessReader::new(line))));
        }
        let Some(content) = state.inputs.get(path).cloned() else {
            return Err(SplitError::Io {
                action: "open",
                path: path.to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
            });
        };
        Ok(Box::new(BufReader::new(decorate_reader(path, Cursor::new(content)))))
    }
}
