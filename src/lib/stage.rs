//! Join handles for pipeline stages.
//!
//! A stage is a group of worker threads sharing one atomic accumulator (files fed, lines
//! scanned, lines written). [`StageHandle::get`] is the stage's join point: it waits for every
//! worker, then pairs the accumulator with the merged error of all workers.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};

use crate::cancel::{CancelReason, CancellationToken};
use crate::errors::{ErrorList, Result, SplitError};

/// Accumulator shared by the workers of one stage.
pub type Accumulator = Arc<AtomicU64>;

/// Outcome of a stage, readable only after all of its workers have finished.
#[derive(Debug)]
pub struct StageResult<T> {
    /// The stage's accumulator.
    pub value: T,
    /// Merged error of the stage's workers, `None` on success.
    pub error: Option<SplitError>,
}

impl<T> StageResult<T> {
    /// Converts into a plain result, discarding the accumulator on failure.
    pub fn into_result(self) -> Result<T> {
        match self.error {
            None => Ok(self.value),
            Some(e) => Err(e),
        }
    }
}

/// The running workers of one stage.
///
/// A worker that returns an error cancels the shared token so its siblings (and the other
/// stages) unwind at their next blocking operation.
pub struct StageHandle<T> {
    name: &'static str,
    token: CancellationToken,
    accumulator: Accumulator,
    workers: Vec<JoinHandle<Result<()>>>,
    convert: fn(u64) -> T,
}

impl<T> StageHandle<T> {
    /// Creates a handle with no workers; `convert` maps the raw accumulator to `T`.
    #[must_use]
    pub fn new(name: &'static str, token: CancellationToken, convert: fn(u64) -> T) -> Self {
        Self { name, token, accumulator: Arc::new(AtomicU64::new(0)), workers: Vec::new(), convert }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Number of workers spawned so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Spawns a worker thread named `<stage>-<index>`.
    ///
    /// # Errors
    ///
    /// Returns [`SplitError::Resource`] if the thread cannot be spawned; the token is
    /// cancelled so workers already running unwind.
    pub fn spawn<F>(&mut self, work: F) -> Result<()>
    where
        F: FnOnce(&AtomicU64) -> Result<()> + Send + 'static,
    {
        let thread_name = format!("{}-{}", self.name, self.workers.len());
        let accumulator = Arc::clone(&self.accumulator);
        let token = self.token.clone();
        let stage = self.name;

        let spawned = thread::Builder::new().name(thread_name.clone()).spawn(move || {
            let result = work(accumulator.as_ref());
            if let Err(e) = &result {
                if !e.is_cancellation() {
                    log::debug!("{stage} worker failed: {e}");
                }
                token.cancel_with(CancelReason::Failure);
            }
            result
        });

        match spawned {
            Ok(handle) => {
                self.workers.push(handle);
                Ok(())
            }
            Err(source) => {
                self.token.cancel_with(CancelReason::Failure);
                Err(SplitError::Resource { what: "worker thread", path: thread_name.into(), source })
            }
        }
    }

    /// Abandons a stage whose start failed: cancels the token, joins the workers spawned so
    /// far and merges their errors into `error`.
    #[must_use]
    pub fn abort(self, error: SplitError) -> SplitError {
        self.token.cancel_with(CancelReason::Failure);
        let mut errors = ErrorList::from(error);
        if let Some(e) = self.get().error {
            errors.push(e);
        }
        errors.drop_secondary_cancellations();
        errors.into_error()
    }

    /// Waits for every worker and merges their errors.
    ///
    /// Cancellation errors are dropped when another worker's error explains the failure; a
    /// panicked worker is reported as [`SplitError::WorkerPanicked`].
    pub fn get(self) -> StageResult<T> {
        let mut errors = ErrorList::new();
        for handle in self.workers {
            let thread = handle.thread().name().unwrap_or(self.name).to_string();
            match handle.join() {
                Ok(result) => {
                    errors.record(result);
                }
                Err(payload) => {
                    self.token.cancel_with(CancelReason::Failure);
                    errors.push(SplitError::WorkerPanicked {
                        thread,
                        message: extract_panic_message(payload),
                    });
                }
            }
        }
        errors.drop_secondary_cancellations();

        let value = (self.convert)(self.accumulator.load(Ordering::SeqCst));
        StageResult { value, error: errors.into_result().err() }
    }
}

impl<T> fmt::Debug for StageHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageHandle")
            .field("name", &self.name)
            .field("workers", &self.workers.len())
            .finish_non_exhaustive()
    }
}

/// Extract a message from a panic payload.
fn extract_panic_message(panic_info: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
