//! The line splitter pipeline.
//!
//! Three stages connected by bounded channels:
//!
//! ```text
//! inputs --> [file feeder] --ReadTarget--> [scan pool] --Line--> [write pool] --> shards
//! ```
//!
//! The feeder publishes input paths, `parallelism` scan workers turn each input into lines,
//! and one write worker per shard drains the line queue into its own output file. A line
//! goes to whichever write worker receives it first.
//!
//! Every stage observes one cancellation token. A failing worker cancels it, which unblocks
//! the workers of every stage at their next channel operation; the orchestrator still joins
//! all stages and reports their errors together.

mod config;
mod feeder;
mod scan;
mod write;

use std::sync::Arc;

use crossbeam_channel::bounded;

use crate::cancel::{CancelReason, CancellationToken};
use crate::errors::{ErrorList, Result, SplitError};
use crate::fs::{FileSystem, LocalFileSystem, is_stdin_path};
use crate::progress::Diagnostics;
use crate::stage::StageHandle;

pub use config::{DEFAULT_MAX_LINE_LENGTH, SplitConfig};

/// One input line without its terminator.
///
/// Lines are raw bytes; no encoding is assumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line(Vec<u8>);

impl Line {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for Line {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&str> for Line {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

/// An input waiting to be scanned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadTarget {
    path: String,
}

impl ReadTarget {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// True if this target reads standard input.
    #[must_use]
    pub fn is_stdin(&self) -> bool {
        is_stdin_path(&self.path)
    }
}

/// Counts reported by a successful run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SplitSummary {
    /// Inputs published by the feeder.
    pub files: u64,
    /// Lines read from all inputs.
    pub lines_scanned: u64,
    /// Lines written across all shards.
    pub lines_written: u64,
}

/// The cancellation error a worker returns once it observes `token`.
pub(crate) fn cancelled(token: &CancellationToken) -> SplitError {
    SplitError::Cancelled(token.reason().unwrap_or(CancelReason::Failure))
}

/// Runs split jobs against a [`FileSystem`].
///
/// # Example
/// ```no_run
/// use shardsplit_lib::cancel::CancellationToken;
/// use shardsplit_lib::splitter::{SplitConfig, Splitter};
///
/// let config = SplitConfig { shards: 4, compression: "gzip".to_string(), ..SplitConfig::default() };
/// let inputs = vec!["in/file0".to_string(), "in/file1.bz2".to_string()];
/// let summary = Splitter::new().run(&inputs, &config, &CancellationToken::new()).unwrap();
/// assert_eq!(summary.lines_scanned, summary.lines_written);
/// ```
#[derive(Clone)]
pub struct Splitter {
    fs: Arc<dyn FileSystem>,
    diagnostics: Diagnostics,
}

impl Splitter {
    /// A splitter on the local file system, with diagnostics on standard error.
    #[must_use]
    pub fn new() -> Self {
        Self { fs: Arc::new(LocalFileSystem), diagnostics: Diagnostics::stderr() }
    }

    /// Replaces the file system.
    #[must_use]
    pub fn with_file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    /// Replaces the sink verbose diagnostics go to.
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Splits the lines of `inputs` across `config.shards` output files.
    ///
    /// Stages start in reverse data-flow order (write, scan, feeder) and are joined in
    /// data-flow order; each queue is closed only after its producer stage has been joined.
    /// Cancelling `cancel` (or letting a deadline armed on it pass) stops the run; failures
    /// inside the run never cancel `cancel` itself.
    ///
    /// # Errors
    ///
    /// Configuration errors are returned before any file is touched. A shard that cannot be
    /// created aborts the run before any input is read. Otherwise the error combines the
    /// errors of every stage, each tagged with its stage name; cancellations caused by
    /// another failure are left out.
    pub fn run(
        &self,
        inputs: &[String],
        config: &SplitConfig,
        cancel: &CancellationToken,
    ) -> Result<SplitSummary> {
        let compression = config.validate()?;
        SplitConfig::validate_inputs(inputs)?;

        let token = cancel.child_token();
        let _guard = token.clone().drop_guard();
        let diagnostics = self.diagnostics.clone().when(config.verbose);

        let (line_tx, line_rx) = bounded::<Line>(config.parallelism);
        let write_stage =
            write::start_write_stage(self.fs.as_ref(), config, compression, token.clone(), line_rx)
                .map_err(|e| e.in_stage("write"))?;
        log::debug!("Started {} write workers", write_stage.len());

        let mut errors = ErrorList::new();
        let (target_tx, target_rx) = bounded::<ReadTarget>(config.parallelism);
        let scan_stage = errors.record(
            scan::start_scan_stage(
                Arc::clone(&self.fs),
                config,
                diagnostics.clone(),
                token.clone(),
                target_rx,
                line_tx.clone(),
            )
            .map_err(|e| e.in_stage("scan")),
        );
        let file_stage = if scan_stage.is_some() {
            errors.record(
                feeder::start_file_stage(
                    inputs.to_vec(),
                    diagnostics,
                    token.clone(),
                    target_tx.clone(),
                )
                .map_err(|e| e.in_stage("file")),
            )
        } else {
            None
        };

        let files = join_stage(file_stage, &mut errors);
        drop(target_tx);
        let lines_scanned = join_stage(scan_stage, &mut errors);
        drop(line_tx);
        let lines_written = join_stage(Some(write_stage), &mut errors);

        log::debug!(
            "Pipeline finished: files={files} scanned={lines_scanned} written={lines_written}"
        );
        errors.drop_secondary_cancellations();
        errors.into_result()?;
        Ok(SplitSummary { files, lines_scanned, lines_written })
    }
}

impl Default for Splitter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Splitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Splitter").field("diagnostics", &self.diagnostics).finish_non_exhaustive()
    }
}

/// Waits for a stage (if it started) and records its error under the stage's name.
fn join_stage(stage: Option<StageHandle<u64>>, errors: &mut ErrorList) -> u64 {
    let Some(stage) = stage else { return 0 };
    let name = stage.name();
    let result = stage.get();
    if let Some(e) = result.error {
        errors.push(e.in_stage(name));
    }
    result.value
}
