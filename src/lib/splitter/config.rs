//! Run configuration.

use crate::compression::{Compression, DEFAULT_COMPRESSION_LEVEL};
use crate::errors::{Result, SplitError};
use crate::validation::{validate_at_least, validate_compression_level};

/// Default maximum line length in bytes.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 64 * 1024;

/// Parameters of one split run. Built once by the caller and never mutated by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitConfig {
    /// Write per-file diagnostics to the diagnostics sink.
    pub verbose: bool,
    /// Number of output shards (and write workers).
    pub shards: usize,
    /// Number of inputs read concurrently (and scan workers); also the capacity of both
    /// inter-stage queues.
    pub parallelism: usize,
    /// Prefix of every shard path; may contain directories.
    pub prefix: String,
    /// Compression mode name for shards (`none`, `gzip`, ...).
    pub compression: String,
    /// Gzip level for compressed shards (1-9).
    pub compression_level: u32,
    /// Longest accepted input line in bytes, excluding its terminator.
    pub max_line_length: usize,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            shards: 8,
            parallelism: 4,
            prefix: "out-".to_string(),
            compression: "none".to_string(),
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}

impl SplitConfig {
    /// Checks every parameter and resolves the compression mode.
    ///
    /// # Errors
    ///
    /// Returns [`SplitError::UnknownCompression`] or [`SplitError::InvalidParameter`].
    pub fn validate(&self) -> Result<Compression> {
        validate_at_least(self.shards, 1, "split")?;
        validate_at_least(self.parallelism, 1, "parallelism")?;
        validate_at_least(self.max_line_length, 1, "max-line-length")?;
        let compression: Compression = self.compression.parse()?;
        if compression == Compression::Gzip {
            validate_compression_level(self.compression_level)?;
        }
        Ok(compression)
    }

    /// Rejects an empty input list.
    pub(crate) fn validate_inputs(inputs: &[String]) -> Result<()> {
        if inputs.is_empty() {
            return Err(SplitError::InvalidParameter {
                parameter: "input".to_string(),
                reason: "One or more input files must be specified".to_string(),
            });
        }
        Ok(())
    }
}
