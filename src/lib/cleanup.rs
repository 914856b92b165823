//! Scoped, last-in-first-out resource release.
//!
//! When several resources are acquired in sequence (create a file, then wrap it in an
//! encoder; open shard 0, then shard 1, ...), each acquisition registers how to release it.
//! If a later acquisition fails, [`CleanupStack::run`] releases everything acquired so far,
//! newest first, exactly once, and reports every release failure rather than the first.

use std::fmt;

use crate::errors::{ErrorList, Result};

type ReleaseFn = Box<dyn FnOnce() -> Result<()> + Send>;

/// An ordered list of release actions.
///
/// Dropping a stack that was never run runs it and logs any failure, so resources are also
/// released on early returns.
///
/// # Example
/// ```
/// use shardsplit_lib::cleanup::CleanupStack;
/// use std::sync::{Arc, Mutex};
///
/// let order = Arc::new(Mutex::new(Vec::new()));
/// let mut cleanups = CleanupStack::new();
/// for name in ["file", "encoder"] {
///     let order = Arc::clone(&order);
///     cleanups.add(move || {
///         order.lock().unwrap().push(name);
///         Ok(())
///     });
/// }
/// cleanups.run().unwrap();
/// assert_eq!(*order.lock().unwrap(), vec!["encoder", "file"]);
/// ```
#[derive(Default)]
pub struct CleanupStack {
    actions: Vec<ReleaseFn>,
    done: bool,
}

impl CleanupStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a release action.
    ///
    /// Actions added after [`CleanupStack::run`] has been called are never executed by this
    /// stack's `run`, but still run when it is dropped.
    pub fn add<F>(&mut self, release: F)
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        self.actions.push(Box::new(release));
    }

    /// Number of actions that have not run yet.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Runs every registered action once, newest first.
    ///
    /// All actions run even if some fail; their errors are combined. Calling `run` again
    /// does nothing and returns `Ok`.
    pub fn run(&mut self) -> Result<()> {
        if self.done {
            return Ok(());
        }
        self.done = true;
        self.release_all()
    }

    fn release_all(&mut self) -> Result<()> {
        let mut errors = ErrorList::new();
        while let Some(release) = self.actions.pop() {
            errors.record(release());
        }
        errors.into_result()
    }
}

impl Drop for CleanupStack {
    fn drop(&mut self) {
        if self.actions.is_empty() {
            return;
        }
        if let Err(e) = self.release_all() {
            log::warn!("Releasing resources failed: {e}");
        }
    }
}

impl fmt::Debug for CleanupStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CleanupStack")
            .field("pending", &self.actions.len())
            .field("done", &self.done)
            .finish()
    }
}
