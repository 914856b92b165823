//! Cooperative cancellation shared by every pipeline stage.
//!
//! A [`CancellationToken`] is a cloneable handle to one shared signal. Workers never poll a
//! flag in a loop: each blocking channel operation is a `crossbeam_channel::select!` that also
//! waits on [`CancellationToken::done`], a channel that never carries a message and becomes
//! disconnected the moment the token is cancelled.
//!
//! ```
//! use crossbeam_channel::{bounded, select};
//! use shardsplit_lib::cancel::CancellationToken;
//!
//! let token = CancellationToken::new();
//! let (_tx, rx) = bounded::<u32>(1);
//! token.cancel();
//!
//! select! {
//!     recv(token.done()) -> _ => assert!(token.is_cancelled()),
//!     recv(rx) -> _ => unreachable!("nothing was sent"),
//! }
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, after, bounded, select};
use parking_lot::Mutex;

/// Why a token was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// An explicit [`CancellationToken::cancel`] call.
    Requested,
    /// The deadline armed by [`CancellationToken::cancel_after`] passed.
    DeadlineExceeded,
    /// A pipeline stage failed and unwound its siblings.
    Failure,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requested => write!(f, "cancellation requested"),
            Self::DeadlineExceeded => write!(f, "deadline exceeded"),
            Self::Failure => write!(f, "another stage failed"),
        }
    }
}

struct Inner {
    cancelled: AtomicBool,
    reason: Mutex<Option<CancelReason>>,
    /// Dropped on cancellation, which disconnects `done`.
    trigger: Mutex<Option<Sender<()>>>,
    done: Receiver<()>,
}

/// Shared cancellation signal.
#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        let (trigger, done) = bounded(0);
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                reason: Mutex::new(None),
                trigger: Mutex::new(Some(trigger)),
                done,
            }),
        }
    }

    /// Cancels the token with [`CancelReason::Requested`].
    pub fn cancel(&self) {
        self.cancel_with(CancelReason::Requested);
    }

    /// Cancels the token, recording `reason` if it is the first cancellation.
    ///
    /// Returns true if this call cancelled the token, false if it was already cancelled.
    pub fn cancel_with(&self, reason: CancelReason) -> bool {
        {
            let mut slot = self.inner.reason.lock();
            if slot.is_some() {
                return false;
            }
            *slot = Some(reason);
        }
        self.inner.cancelled.store(true, Ordering::SeqCst);
        drop(self.inner.trigger.lock().take());
        log::debug!("Cancellation signalled: {reason}");
        true
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// The reason of the first cancellation, if any.
    #[must_use]
    pub fn reason(&self) -> Option<CancelReason> {
        *self.inner.reason.lock()
    }

    /// A channel that becomes ready (disconnected) once the token is cancelled.
    ///
    /// Intended for use as one arm of `crossbeam_channel::select!`.
    #[must_use]
    pub fn done(&self) -> &Receiver<()> {
        &self.inner.done
    }

    /// Blocks until the token is cancelled.
    pub fn wait(&self) {
        let _ = self.inner.done.recv();
    }

    /// Blocks until the token is cancelled or `timeout` elapses; returns true if cancelled.
    #[must_use]
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let _ = self.inner.done.recv_timeout(timeout);
        self.is_cancelled()
    }

    /// Creates a token that is cancelled whenever this one is, but whose own cancellation
    /// does not reach this token.
    ///
    /// A helper thread links the two until either is cancelled, so callers should cancel the
    /// child (see [`CancellationToken::drop_guard`]) once it is no longer needed.
    #[must_use]
    pub fn child_token(&self) -> CancellationToken {
        let child = CancellationToken::new();
        if let Some(reason) = self.reason() {
            child.cancel_with(reason);
            return child;
        }

        let parent = self.clone();
        let linked = child.clone();
        let spawned = thread::Builder::new().name("cancel-link".to_string()).spawn(move || {
            select! {
                recv(parent.done()) -> _ => {
                    linked.cancel_with(parent.reason().unwrap_or(CancelReason::Requested));
                }
                recv(linked.done()) -> _ => {}
            }
        });
        if let Err(e) = spawned {
            log::warn!("Could not link child cancellation token: {e}");
            child.cancel_with(CancelReason::Failure);
        }
        child
    }

    /// Arms a deadline: the token is cancelled with [`CancelReason::DeadlineExceeded`] after
    /// `timeout` unless it was cancelled earlier.
    pub fn cancel_after(&self, timeout: Duration) {
        let token = self.clone();
        let spawned = thread::Builder::new().name("cancel-deadline".to_string()).spawn(move || {
            select! {
                recv(token.done()) -> _ => {}
                recv(after(timeout)) -> _ => {
                    token.cancel_with(CancelReason::DeadlineExceeded);
                }
            }
        });
        if let Err(e) = spawned {
            log::warn!("Could not arm cancellation deadline: {e}");
        }
    }

    /// Returns a guard that cancels this token when dropped.
    #[must_use]
    pub fn drop_guard(self) -> DropGuard {
        DropGuard { token: self }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationToken").field("reason", &self.reason()).finish()
    }
}

/// Cancels its token on drop.
#[derive(Debug)]
pub struct DropGuard {
    token: CancellationToken,
}

impl Drop for DropGuard {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
