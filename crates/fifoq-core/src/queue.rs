//! Bounded blocking FIFO (monitor style).
//!
//! One mutex guards the item sequence and its counters; two condition
//! variables carry "space available" and "item available". Every blocking
//! operation re-checks its predicate in a loop after each wake and every
//! mutation broadcasts the complementary condition.
//!
//! Callers share one instance through `Arc<BoundedQueue<T>>`; the queue
//! keeps its state behind an internal `Arc` as well so that a `CancelToken`
//! can reach a blocked waiter without borrowing the queue.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, Weak};

use serde::{Deserialize, Serialize};

use crate::cancel::{CancelToken, Interrupt, Registration};
use crate::error::Cancelled;

/// Counters maintained under the queue lock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    /// Items ever stored.
    pub inserted: u64,
    /// Items ever handed out.
    pub removed: u64,
    /// Largest size the queue has reached.
    pub high_water: usize,
}

struct State<T> {
    items: VecDeque<T>,
    stats: QueueStats,
}

struct Shared<T> {
    capacity: usize,
    state: Mutex<State<T>>,
    space_available: Condvar,
    item_available: Condvar,
}

impl<T> Shared<T> {
    // Every mutation is a single push_back/pop_front plus counter bumps, so a
    // panic elsewhere while the lock was held cannot leave the state torn.
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Send> Interrupt for Shared<T> {
    fn interrupt(&self) {
        let _state = self.lock();
        self.space_available.notify_all();
        self.item_available.notify_all();
    }
}

/// A fixed-capacity FIFO with blocking, cancellable insert and remove.
pub struct BoundedQueue<T> {
    shared: Arc<Shared<T>>,
}

impl<T> BoundedQueue<T> {
    /// Create a queue holding at most `cap` items (clamped to at least 1).
    pub fn with_capacity(cap: usize) -> Self {
        let capacity = cap.max(1);
        Self {
            shared: Arc::new(Shared {
                capacity,
                state: Mutex::new(State {
                    items: VecDeque::with_capacity(capacity),
                    stats: QueueStats::default(),
                }),
                space_available: Condvar::new(),
                item_available: Condvar::new(),
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    pub fn len(&self) -> usize {
        self.shared.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.lock().items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.shared.lock().items.len() >= self.shared.capacity
    }

    pub fn stats(&self) -> QueueStats {
        self.shared.lock().stats
    }

    /// Store `item` if there is room, otherwise hand it back.
    pub fn try_insert(&self, item: T) -> Result<(), T> {
        let mut state = self.shared.lock();
        if state.items.len() >= self.shared.capacity {
            return Err(item);
        }
        push(&mut state, item);
        self.shared.item_available.notify_all();
        Ok(())
    }

    /// Take the head item if there is one.
    pub fn try_remove(&self) -> Option<T> {
        let mut state = self.shared.lock();
        let item = pop(&mut state)?;
        self.shared.space_available.notify_all();
        Some(item)
    }
}

impl<T: Clone> BoundedQueue<T> {
    /// Copy of the queued items, head first.
    pub fn snapshot(&self) -> Vec<T> {
        self.shared.lock().items.iter().cloned().collect()
    }
}

impl<T: Send + 'static> BoundedQueue<T> {
    /// Append `item` at the tail, blocking while the queue is full.
    ///
    /// Returns `Err(Cancelled)` without storing the item if `cancel` fires
    /// before room appears (or had already fired on entry).
    pub fn insert(&self, item: T, cancel: &CancelToken) -> Result<(), Cancelled> {
        let shared = &*self.shared;
        let mut registration: Option<Registration<'_>> = None;
        let mut state = shared.lock();
        loop {
            cancel.check()?;
            if state.items.len() < shared.capacity {
                break;
            }
            if registration.is_none() {
                // Re-check the flag after registering: a cancel() that ran
                // before this point found nothing to wake.
                registration = Some(cancel.register(self.interrupt_handle()));
                continue;
            }
            state = shared
                .space_available
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }

        push(&mut state, item);
        shared.item_available.notify_all();
        Ok(())
    }

    /// Remove and return the head item, blocking while the queue is empty.
    ///
    /// Returns `Err(Cancelled)` without removing anything if `cancel` fires
    /// before an item appears (or had already fired on entry).
    pub fn remove(&self, cancel: &CancelToken) -> Result<T, Cancelled> {
        let shared = &*self.shared;
        let mut registration: Option<Registration<'_>> = None;
        let mut state = shared.lock();
        let item = loop {
            cancel.check()?;
            if let Some(item) = pop(&mut state) {
                break item;
            }
            if registration.is_none() {
                registration = Some(cancel.register(self.interrupt_handle()));
                continue;
            }
            state = shared
                .item_available
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        };

        shared.space_available.notify_all();
        Ok(item)
    }

    fn interrupt_handle(&self) -> Weak<dyn Interrupt> {
        let weak: Weak<Shared<T>> = Arc::downgrade(&self.shared);
        weak
    }
}

impl<T> std::fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("BoundedQueue")
            .field("capacity", &self.shared.capacity)
            .field("len", &state.items.len())
            .field("stats", &state.stats)
            .finish()
    }
}

fn push<T>(state: &mut State<T>, item: T) {
    state.items.push_back(item);
    state.stats.inserted += 1;
    state.stats.high_water = state.stats.high_water.max(state.items.len());
}

fn pop<T>(state: &mut State<T>) -> Option<T> {
    let item = state.items.pop_front()?;
    state.stats.removed += 1;
    Some(item)
}
