//! Error types for shardsplit operations.
//!
//! Every failure inside the pipeline is a [`SplitError`]. Stages and the cleanup stack
//! collect the errors of many workers or release actions into an [`ErrorList`], which is
//! itself carried by [`SplitError::Multiple`] so a run always reports one combined error.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::cancel::CancelReason;

/// Result type alias for shardsplit operations
pub type Result<T> = std::result::Result<T, SplitError>;

/// Error type for shardsplit operations
#[derive(Error, Debug)]
pub enum SplitError {
    /// Compression mode name not recognised by the writer decorator
    #[error("unknown compression type: `{0}`")]
    UnknownCompression(String),

    /// Invalid parameter value provided
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// The parameter name
        parameter: String,
        /// Explanation of why it's invalid
        reason: String,
    },

    /// A directory, shard file or worker thread could not be created
    #[error("failed to create {what} '{path}': {source}")]
    Resource {
        /// What was being created (e.g. "directory", "shard")
        what: &'static str,
        /// Path of the resource
        path: PathBuf,
        /// Underlying cause
        #[source]
        source: io::Error,
    },

    /// Reading, decoding, writing or finishing a stream failed
    #[error("{action} '{path}': {source}")]
    Io {
        /// The operation that failed (e.g. "read", "write")
        action: &'static str,
        /// The file the operation was applied to
        path: String,
        /// Underlying cause
        #[source]
        source: io::Error,
    },

    /// An input line is longer than the configured maximum
    #[error("line {line} of '{path}' exceeds the maximum line length of {max} bytes")]
    LineTooLong {
        /// The input path
        path: String,
        /// 1-based line number of the offending line
        line: u64,
        /// Configured maximum line length in bytes
        max: usize,
    },

    /// The worker observed the shared cancellation signal
    #[error("operation cancelled: {0}")]
    Cancelled(CancelReason),

    /// A worker thread panicked
    #[error("worker thread '{thread}' panicked: {message}")]
    WorkerPanicked {
        /// Name of the panicked thread
        thread: String,
        /// Panic payload, when it was a string
        message: String,
    },

    /// An error attributed to one pipeline stage
    #[error("{stage}: {source}")]
    Stage {
        /// Stage name ("file", "scan" or "write")
        stage: &'static str,
        /// The stage's own error
        #[source]
        source: Box<SplitError>,
    },

    /// Several independent errors
    #[error(transparent)]
    Multiple(ErrorList),
}

impl SplitError {
    /// Attributes this error to a pipeline stage.
    #[must_use]
    pub fn in_stage(self, stage: &'static str) -> Self {
        Self::Stage { stage, source: Box::new(self) }
    }

    /// Returns true if this error only records that a worker observed cancellation.
    ///
    /// Stage wrappers and lists made up solely of cancellations count as cancellations.
    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        match self {
            Self::Cancelled(_) => true,
            Self::Stage { source, .. } => source.is_cancellation(),
            Self::Multiple(list) => !list.is_empty() && list.iter().all(Self::is_cancellation),
            _ => false,
        }
    }

    /// Returns the cancellation reason if this error is a cancellation.
    #[must_use]
    pub fn cancel_reason(&self) -> Option<CancelReason> {
        match self {
            Self::Cancelled(reason) => Some(*reason),
            Self::Stage { source, .. } => source.cancel_reason(),
            Self::Multiple(list) if self.is_cancellation() => {
                list.iter().find_map(Self::cancel_reason)
            }
            _ => None,
        }
    }

    /// Shorthand for an [`SplitError::Io`] error.
    pub(crate) fn io(action: &'static str, path: impl Into<String>, source: io::Error) -> Self {
        Self::Io { action, path: path.into(), source }
    }
}

/// An ordered collection of errors, none of which is discarded in favour of another.
///
/// Displays as a count header followed by one bulleted line per error.
#[derive(Debug, Default)]
pub struct ErrorList {
    errors: Vec<SplitError>,
}

impl ErrorList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an error, flattening nested lists so the result stays one level deep.
    pub fn push(&mut self, error: SplitError) {
        match error {
            SplitError::Multiple(list) => self.errors.extend(list.errors),
            other => self.errors.push(other),
        }
    }

    /// Appends the error of a result, if any.
    pub fn record<T>(&mut self, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.push(e);
                None
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SplitError> {
        self.errors.iter()
    }

    /// Removes cancellation errors when at least one other error explains the failure.
    ///
    /// A worker that stopped because a sibling failed is not a failure of its own. When
    /// every error is a cancellation, a single one is kept.
    pub fn drop_secondary_cancellations(&mut self) {
        if self.errors.iter().any(|e| !e.is_cancellation()) {
            self.errors.retain(|e| !e.is_cancellation());
        } else {
            self.errors.truncate(1);
        }
    }

    /// Converts a list known to hold at least one error into a single error: the sole
    /// error when there is one, [`SplitError::Multiple`] otherwise.
    #[must_use]
    pub fn into_error(mut self) -> SplitError {
        if self.errors.len() == 1 { self.errors.remove(0) } else { SplitError::Multiple(self) }
    }

    /// Converts the list into a result: `Ok` when empty, the sole error when there is one,
    /// and [`SplitError::Multiple`] otherwise.
    pub fn into_result(mut self) -> Result<()> {
        match self.errors.len() {
            0 => Ok(()),
            1 => Err(self.errors.remove(0)),
            _ => Err(SplitError::Multiple(self)),
        }
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = if self.errors.len() == 1 { "error" } else { "errors" };
        write!(f, "{} {noun} occurred:", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n\t* {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorList {}

impl From<SplitError> for ErrorList {
    fn from(error: SplitError) -> Self {
        let mut list = Self::new();
        list.push(error);
        list
    }
}

impl IntoIterator for ErrorList {
    type Item = SplitError;
    type IntoIter = std::vec::IntoIter<SplitError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}
