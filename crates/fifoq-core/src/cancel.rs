//! Cooperative cancellation for blocked queue operations and actor pauses.
//!
//! A `CancelToken` is a shared flag plus the bookkeeping needed to *deliver*
//! the cancellation to threads that are parked on a condition variable:
//!
//! - a blocked `BoundedQueue::insert`/`remove` registers its queue with the
//!   token for as long as it waits; `cancel()` locks each registered queue and
//!   broadcasts its condvars so the waiter re-checks the flag;
//! - `sleep()` parks on a condvar owned by the token itself.
//!
//! The flag is always set before any waiter is woken, and every waiter checks
//! the flag while holding the same lock the canceller takes to notify, so a
//! cancellation can never slip in between "check" and "wait".

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError, Weak};
use std::time::{Duration, Instant};

use crate::error::Cancelled;

/// Something parked on a condition variable that can be told to re-check.
pub(crate) trait Interrupt: Send + Sync {
    fn interrupt(&self);
}

/// Shared stop signal. Clones observe and control the same state.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    cancelled: AtomicBool,
    waiters: Mutex<Waiters>,
    sleep_lock: Mutex<()>,
    sleep_cv: Condvar,
}

#[derive(Default)]
struct Waiters {
    next_id: u64,
    entries: Vec<(u64, Weak<dyn Interrupt>)>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    ///
    /// Every queue operation currently blocked under this token, and every
    /// `sleep` in progress, returns `Err(Cancelled)` shortly after.
    pub fn cancel(&self) {
        if self.inner.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }

        // Snapshot under the registry lock, interrupt outside it: interrupt()
        // takes the queue lock and waiters register while holding that lock.
        let targets: Vec<Arc<dyn Interrupt>> = {
            let waiters = self
                .inner
                .waiters
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            waiters
                .entries
                .iter()
                .filter_map(|(_, w)| w.upgrade())
                .collect()
        };
        for target in targets {
            target.interrupt();
        }

        let _guard = self
            .inner
            .sleep_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.inner.sleep_cv.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once `cancel()` has been called.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }

    /// Pause for `duration`, returning early with `Cancelled` if the token
    /// fires first. A zero duration only checks the flag.
    pub fn sleep(&self, duration: Duration) -> Result<(), Cancelled> {
        let deadline = Instant::now() + duration;
        let mut guard = self
            .inner
            .sleep_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        loop {
            self.check()?;
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            guard = self
                .inner
                .sleep_cv
                .wait_timeout(guard, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    /// Number of blocked operations currently registered.
    pub fn registered_waiters(&self) -> usize {
        self.inner
            .waiters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    pub(crate) fn register(&self, target: Weak<dyn Interrupt>) -> Registration<'_> {
        let mut waiters = self
            .inner
            .waiters
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let id = waiters.next_id;
        waiters.next_id += 1;
        waiters.entries.push((id, target));
        Registration { token: self, id }
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Keeps a waiter reachable from `cancel()`; unregisters on drop.
pub(crate) struct Registration<'a> {
    token: &'a CancelToken,
    id: u64,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        let mut waiters = self
            .token
            .inner
            .waiters
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        waiters.entries.retain(|(id, _)| *id != self.id);
    }
}
