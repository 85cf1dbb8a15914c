use crate::{
    ring::RingSlots,
    sync::{Condvar, Mutex},
    trace_macro::buf_trace,
    BoundBufError,
};
use tracing::debug;

/// Result of [`BoundedBuffer::put`].
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PutOutcome<T> {
    /// The value was stored; `count` is the occupancy right after the write.
    Stored { count: usize },
    /// Shutdown was observed before a slot became available. The buffer is
    /// untouched and the value is handed back.
    Rejected(T),
}

/// Result of [`BoundedBuffer::take`].
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TakeOutcome<T> {
    /// `count` is the occupancy right after the read.
    Taken { value: T, count: usize },
    /// Shutdown has been triggered and every buffered item was already taken.
    Drained,
}

impl<T> TakeOutcome<T> {
    pub fn into_value(self) -> Option<T> {
        match self {
            TakeOutcome::Taken { value, .. } => Some(value),
            TakeOutcome::Drained => None,
        }
    }
}

/// Point-in-time view of the buffer, read under the lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub capacity: usize,
    pub count: usize,
    pub produced: u64,
    pub consumed: u64,
    pub shutdown: bool,
}

struct State<T> {
    slots: RingSlots<T>,
    shutdown: bool,
    produced: u64,
    consumed: u64,
}

impl<T> State<T> {
    fn is_consistent(&self) -> bool {
        self.slots.is_consistent() && self.produced - self.consumed == self.slots.len() as u64
    }
}

/// Bounded FIFO shared by one producer and any number of consumers.
///
/// Every field lives behind a single lock. `not_full` and `not_empty` are
/// separate wait-conditions: a successful put or take wakes one waiter of
/// the opposite side, while [`trigger_shutdown`](Self::trigger_shutdown)
/// wakes every waiter on both.
///
/// Shutdown stops new work without abandoning accepted work: after it, `put`
/// always fails, and `take` keeps succeeding until the buffer is empty.
pub struct BoundedBuffer<T> {
    capacity: usize,
    state: Mutex<State<T>>,
    not_full: Condvar,
    not_empty: Condvar,
}

impl<T> BoundedBuffer<T> {
    pub fn new(capacity: usize) -> Result<Self, BoundBufError> {
        let slots = RingSlots::with_capacity(capacity)?;
        Ok(BoundedBuffer {
            capacity,
            state: Mutex::new(State {
                slots,
                shutdown: false,
                produced: 0,
                consumed: 0,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Stores `value`, blocking while the buffer is full.
    pub fn put(&self, value: T) -> PutOutcome<T> {
        self.put_with(value, |_, _| {})
    }

    /// Like [`put`](Self::put), but calls `on_stored` with the stored value and
    /// the new occupancy before the lock is released.
    ///
    /// Callbacks from `put_with` and [`take_with`](Self::take_with) run in the
    /// order the buffer changed, so a value is always reported as stored
    /// before it is reported as taken. `on_stored` must not touch the buffer.
    pub fn put_with(&self, value: T, on_stored: impl FnOnce(&T, usize)) -> PutOutcome<T> {
        let mut state = self.state.lock();

        while state.slots.is_full() && !state.shutdown {
            buf_trace!(capacity = self.capacity, "put blocked on full buffer");
            state = self.not_full.wait(state);
        }

        if state.shutdown {
            buf_trace!(count = state.slots.len(), "put rejected after shutdown");
            return PutOutcome::Rejected(value);
        }

        if state.slots.push(value).is_err() {
            unreachable!("slot availability checked under the lock");
        }
        state.produced += 1;
        let count = state.slots.len();
        debug_assert!(state.is_consistent());

        buf_trace!(
            count = count,
            produced = state.produced,
            tail = state.slots.tail(),
            "put stored"
        );

        self.not_empty.notify_one();
        if let Some(stored) = state.slots.newest() {
            on_stored(stored, count);
        }
        PutOutcome::Stored { count }
    }

    /// Removes the oldest value, blocking while the buffer is empty and
    /// shutdown has not been triggered.
    pub fn take(&self) -> TakeOutcome<T> {
        self.take_with(|_, _| {})
    }

    /// Like [`take`](Self::take), but calls `on_taken` with the removed value
    /// and the new occupancy before the lock is released. Not called on
    /// [`TakeOutcome::Drained`].
    pub fn take_with(&self, on_taken: impl FnOnce(&T, usize)) -> TakeOutcome<T> {
        let mut state = self.state.lock();

        while state.slots.is_empty() && !state.shutdown {
            buf_trace!("take blocked on empty buffer");
            state = self.not_empty.wait(state);
        }

        let Some(value) = state.slots.pop() else {
            buf_trace!(consumed = state.consumed, "take drained after shutdown");
            return TakeOutcome::Drained;
        };
        state.consumed += 1;
        let count = state.slots.len();
        debug_assert!(state.is_consistent());

        buf_trace!(
            count = count,
            consumed = state.consumed,
            head = state.slots.head(),
            "take removed"
        );

        self.not_full.notify_one();
        on_taken(&value, count);
        TakeOutcome::Taken { value, count }
    }

    /// Moves the buffer into shutdown and wakes every blocked party.
    ///
    /// Safe to call from any thread, any number of times. Returns `true` only
    /// for the call that performed the transition.
    pub fn trigger_shutdown(&self) -> bool {
        self.trigger_shutdown_with(|| {})
    }

    /// Like [`trigger_shutdown`](Self::trigger_shutdown), but calls
    /// `on_shutdown` under the lock when this call performs the transition.
    pub fn trigger_shutdown_with(&self, on_shutdown: impl FnOnce()) -> bool {
        let mut state = self.state.lock();
        if state.shutdown {
            return false;
        }

        state.shutdown = true;
        debug!(
            count = state.slots.len(),
            produced = state.produced,
            consumed = state.consumed,
            "bounded buffer shutting down"
        );

        self.not_empty.notify_all();
        self.not_full.notify_all();
        on_shutdown();
        true
    }

    pub fn is_shutdown(&self) -> bool {
        self.state.lock().shutdown
    }

    pub fn snapshot(&self) -> Snapshot {
        let state = self.state.lock();
        Snapshot {
            capacity: self.capacity,
            count: state.slots.len(),
            produced: state.produced,
            consumed: state.consumed,
            shutdown: state.shutdown,
        }
    }

    #[cfg(all(test, not(feature = "loom")))]
    fn with_state<R>(&self, f: impl FnOnce(&State<T>) -> R) -> R {
        let state = self.state.lock();
        f(&*state)
    }
}
