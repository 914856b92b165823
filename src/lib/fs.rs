//! File-system access used by the pipeline.
//!
//! The pipeline never touches `std::fs` directly. It goes through a [`FileSystem`], so tests
//! can capture shard output in memory or inject failures at any acquisition step.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::cleanup::CleanupStack;
use crate::compression::{FinishWrite, decorate_reader, decorate_writer};
use crate::errors::{ErrorList, Result, SplitError};

/// Buffer size for input readers and shard writers.
pub const IO_BUFFER_SIZE: usize = 128 * 1024;

/// Returns true if `path` names standard input (`-` or `/dev/stdin`).
///
/// # Example
/// ```
/// use shardsplit_lib::fs::is_stdin_path;
///
/// assert!(is_stdin_path("-"));
/// assert!(is_stdin_path("/dev/stdin"));
/// assert!(!is_stdin_path("input.txt"));
/// ```
pub fn is_stdin_path<P: AsRef<Path>>(path: P) -> bool {
    let path_str = path.as_ref().to_string_lossy();
    path_str == "-" || path_str == "/dev/stdin"
}

/// Output path of shard `index`: `<prefix><index:03><extension>`.
///
/// # Example
/// ```
/// use shardsplit_lib::fs::shard_path;
///
/// assert_eq!(shard_path("out/file-", 7, ".gz").to_str(), Some("out/file-007.gz"));
/// assert_eq!(shard_path("out-", 1234, "").to_str(), Some("out-1234"));
/// ```
#[must_use]
pub fn shard_path(prefix: &str, index: usize, extension: &str) -> PathBuf {
    PathBuf::from(format!("{prefix}{index:03}{extension}"))
}

/// The directory a shard lives in, `.` when the prefix has no directory component.
#[must_use]
pub fn shard_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// One open output shard: a (possibly compressing) writer plus the release actions of the
/// resources underneath it.
pub struct ShardWriter {
    path: PathBuf,
    sink: Box<dyn FinishWrite>,
    cleanups: CleanupStack,
}

impl ShardWriter {
    /// Wraps an already decorated sink.
    ///
    /// `cleanups` runs after the sink has been finished, newest action first.
    #[must_use]
    pub fn new(path: PathBuf, sink: Box<dyn FinishWrite>, cleanups: CleanupStack) -> Self {
        Self { path, sink, cleanups }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes one line followed by a single `\n`.
    pub fn write_line(&mut self, line: &[u8]) -> io::Result<()> {
        self.sink.write_all(line)?;
        self.sink.write_all(b"\n")
    }

    /// Finishes the stream and releases the underlying resources.
    ///
    /// Every step runs even if an earlier one fails; all failures are reported.
    pub fn close(self) -> Result<()> {
        let Self { path, sink, mut cleanups } = self;
        let mut errors = ErrorList::new();
        if let Err(e) = sink.finish() {
            errors.push(SplitError::io("finish", path.display().to_string(), e));
        }
        errors.record(cleanups.run());
        errors.into_result()
    }
}

impl std::fmt::Debug for ShardWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardWriter").field("path", &self.path).finish_non_exhaustive()
    }
}

/// The file-system operations the pipeline depends on.
pub trait FileSystem: Send + Sync {
    /// Creates `dir` and all missing parents.
    fn mkdir_all(&self, dir: &Path) -> io::Result<()>;

    /// Creates (truncating) the shard at `path`, compressed according to `compression`.
    fn create_writer(&self, path: &Path, compression: &str, level: u32) -> Result<ShardWriter>;

    /// Opens an input for line-oriented reading, decoding it according to its suffix.
    fn create_reader(&self, path: &str) -> Result<Box<dyn BufRead + Send>>;
}

/// [`FileSystem`] backed by the local disk and the process's standard input.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
    fn mkdir_all(&self, dir: &Path) -> io::Result<()> {
        fs::create_dir_all(dir)
    }

    fn create_writer(&self, path: &Path, compression: &str, level: u32) -> Result<ShardWriter> {
        let mut cleanups = CleanupStack::new();

        let file = File::create(path).map_err(|source| SplitError::Resource {
            what: "shard",
            path: path.to_path_buf(),
            source,
        })?;
        let handle = file.try_clone().map_err(|source| SplitError::Resource {
            what: "shard handle",
            path: path.to_path_buf(),
            source,
        })?;
        let display = path.display().to_string();
        cleanups.add(move || handle.sync_all().map_err(|e| SplitError::io("sync", display, e)));

        // On failure `cleanups` is dropped here, which releases the file.
        let sink =
            decorate_writer(compression, BufWriter::with_capacity(IO_BUFFER_SIZE, file), level)?;

        Ok(ShardWriter::new(path.to_path_buf(), sink, cleanups))
    }

    fn create_reader(&self, path: &str) -> Result<Box<dyn BufRead + Send>> {
        if is_stdin_path(path) {
            let decoded = decorate_reader(path, io::stdin());
            return Ok(Box::new(BufReader::with_capacity(IO_BUFFER_SIZE, decoded)));
        }

        let file = File::open(path).map_err(|e| SplitError::io("open", path, e))?;
        let decoded = decorate_reader(path, file);
        Ok(Box::new(BufReader::with_capacity(IO_BUFFER_SIZE, decoded)))
    }
}
