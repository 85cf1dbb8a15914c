//! Observers for an external, level-triggered cancellation request.

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Poll period used by [`PolledFlag`] when none is given.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Read side of a cancellation request raised outside the pipeline.
///
/// Once an observer reports cancellation it must keep reporting it.
pub trait CancelObserver: Send + Sync {
    fn is_cancelled(&self) -> bool;

    /// Blocks for at most `timeout`. Returns `true` as soon as cancellation
    /// has been requested, `false` if the timeout elapsed first.
    fn wait_timeout(&self, timeout: Duration) -> bool;
}

/// Cloneable cancellation token with a blocking wait.
///
/// `cancel` may be called from any thread, including a signal-handling
/// thread; waiters are woken immediately.
#[derive(Clone, Default)]
pub struct Cancellation {
    inner: Arc<CancellationInner>,
}

#[derive(Default)]
struct CancellationInner {
    cancelled: Mutex<bool>,
    condvar: Condvar,
}

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the request. Returns `true` for the first call only.
    pub fn cancel(&self) -> bool {
        let mut cancelled = self.inner.cancelled.lock();
        if *cancelled {
            return false;
        }
        *cancelled = true;
        self.inner.condvar.notify_all();
        true
    }
}

impl CancelObserver for Cancellation {
    fn is_cancelled(&self) -> bool {
        *self.inner.cancelled.lock()
    }

    fn wait_timeout(&self, timeout: Duration) -> bool {
        let mut cancelled = self.inner.cancelled.lock();
        match Instant::now().checked_add(timeout) {
            Some(deadline) => {
                while !*cancelled {
                    if self
                        .inner
                        .condvar
                        .wait_until(&mut cancelled, deadline)
                        .timed_out()
                    {
                        break;
                    }
                }
            }
            None => {
                while !*cancelled {
                    self.inner.condvar.wait(&mut cancelled);
                }
            }
        }
        *cancelled
    }
}

/// Observer over a plain shared flag, checked every `poll` interval.
///
/// For callers that can only flip an `AtomicBool`.
#[derive(Clone)]
pub struct PolledFlag {
    flag: Arc<AtomicBool>,
    poll: Duration,
}

impl PolledFlag {
    pub fn new(flag: Arc<AtomicBool>) -> Self {
        Self::with_poll_interval(flag, DEFAULT_POLL_INTERVAL)
    }

    pub fn with_poll_interval(flag: Arc<AtomicBool>, poll: Duration) -> Self {
        PolledFlag {
            flag,
            poll: poll.max(Duration::from_millis(1)),
        }
    }
}

impl CancelObserver for PolledFlag {
    fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    fn wait_timeout(&self, timeout: Duration) -> bool {
        let start = Instant::now();
        loop {
            if self.is_cancelled() {
                return true;
            }
            let elapsed = start.elapsed();
            if elapsed >= timeout {
                return false;
            }
            thread::sleep(self.poll.min(timeout - elapsed));
        }
    }
}
