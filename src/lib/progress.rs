//! Verbose per-file diagnostics.
//!
//! Diagnostics are byte-exact lines written to a sink (stderr by default), not log records:
//!
//! ```text
//! in/file0
//! in/file0, line=10,000
//! in/file0, total=12,345
//! ```
//!
//! A disabled [`Diagnostics`] discards everything, so callers never need to check the
//! verbose flag themselves.

use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::logging::format_count;

/// Number of lines between two progress lines for one input.
pub const PROGRESS_INTERVAL: u64 = 10_000;

type Sink = Arc<Mutex<Box<dyn Write + Send>>>;

/// Shared, thread-safe diagnostics sink.
///
/// Each message is written with a single `write_all` under the lock, so lines from
/// concurrent workers never interleave.
#[derive(Clone, Default)]
pub struct Diagnostics {
    sink: Option<Sink>,
}

impl Diagnostics {
    /// Diagnostics that go nowhere.
    #[must_use]
    pub fn disabled() -> Self {
        Self { sink: None }
    }

    /// Diagnostics written to standard error.
    #[must_use]
    pub fn stderr() -> Self {
        Self::to_writer(io::stderr())
    }

    /// Diagnostics written to an arbitrary sink.
    #[must_use]
    pub fn to_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self { sink: Some(Arc::new(Mutex::new(Box::new(writer)))) }
    }

    /// Returns these diagnostics if `verbose`, otherwise disabled ones.
    #[must_use]
    pub fn when(self, verbose: bool) -> Self {
        if verbose { self } else { Self::disabled() }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// Writes `message` followed by a newline.
    ///
    /// Diagnostics are best-effort: a failing sink is logged and otherwise ignored.
    pub fn emit(&self, message: &str) {
        let Some(sink) = &self.sink else { return };
        let mut line = String::with_capacity(message.len() + 1);
        line.push_str(message);
        line.push('\n');
        let mut guard = sink.lock();
        if let Err(e) = guard.write_all(line.as_bytes()).and_then(|()| guard.flush()) {
            log::warn!("Failed to write diagnostics: {e}");
        }
    }
}

impl std::fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Diagnostics").field("enabled", &self.is_enabled()).finish()
    }
}

/// Line counter for one input, emitting a progress line every [`PROGRESS_INTERVAL`] lines.
///
/// # Example
/// ```
/// use shardsplit_lib::progress::{Diagnostics, LineProgress};
///
/// let mut progress = LineProgress::new("in.txt", Diagnostics::disabled());
/// for _ in 0..25_000 {
///     progress.record_line(); // emits at 10,000 and 20,000
/// }
/// assert_eq!(progress.finish(), 25_000); // emits the total
/// ```
#[derive(Debug)]
pub struct LineProgress {
    path: String,
    count: u64,
    diagnostics: Diagnostics,
}

impl LineProgress {
    #[must_use]
    pub fn new(path: impl Into<String>, diagnostics: Diagnostics) -> Self {
        Self { path: path.into(), count: 0, diagnostics }
    }

    /// Counts one line; emits a progress line every [`PROGRESS_INTERVAL`] lines.
    pub fn record_line(&mut self) {
        self.count += 1;
        if self.count.is_multiple_of(PROGRESS_INTERVAL) {
            self.diagnostics.emit(&format!("{}, line={}", self.path, format_count(self.count)));
        }
    }

    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Emits the total for this input and returns it.
    pub fn finish(self) -> u64 {
        self.diagnostics.emit(&format!("{}, total={}", self.path, format_count(self.count)));
        self.count
    }
}
