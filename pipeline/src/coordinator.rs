use boundbuf::BoundedBuffer;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::cancel::CancelObserver;
use crate::events::{Event, EventSink, Origin};
use crate::Value;

/// How often the coordinator re-checks the buffer while waiting on the observer.
pub const DEFAULT_WATCH_TICK: Duration = Duration::from_millis(100);

/// Lower bound on the watch tick; keeps the watch loop from spinning.
pub const MIN_WATCH_TICK: Duration = Duration::from_millis(1);

/// Moves `buffer` into shutdown and reports it, unless someone already did.
pub(crate) fn initiate_shutdown(
    buffer: &BoundedBuffer<Value>,
    sink: &dyn EventSink,
    origin: Origin,
) -> bool {
    buffer.trigger_shutdown_with(|| {
        info!(%origin, "shutdown initiated");
        sink.emit(Event::ShutdownInitiated { origin });
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Watch {
    /// Cancellation was observed and this coordinator performed the transition.
    Triggered,
    /// The buffer was already shut down by another party.
    Observed,
}

/// Turns an external cancellation request into exactly one shutdown of the buffer.
pub struct ShutdownCoordinator {
    buffer: Arc<BoundedBuffer<Value>>,
    observer: Arc<dyn CancelObserver>,
    sink: Arc<dyn EventSink>,
    tick: Duration,
}

impl ShutdownCoordinator {
    pub fn new(
        buffer: Arc<BoundedBuffer<Value>>,
        observer: Arc<dyn CancelObserver>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        ShutdownCoordinator {
            buffer,
            observer,
            sink,
            tick: DEFAULT_WATCH_TICK,
        }
    }

    /// Ticks shorter than [`MIN_WATCH_TICK`] are raised to it.
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick.max(MIN_WATCH_TICK);
        self
    }

    pub fn run(self) -> Watch {
        debug!(tick_ms = self.tick.as_millis() as u64, "shutdown coordinator watching");

        loop {
            if self.observer.wait_timeout(self.tick) {
                break;
            }
            if self.buffer.is_shutdown() {
                debug!("buffer shut down elsewhere, coordinator exiting");
                return Watch::Observed;
            }
        }

        if initiate_shutdown(&self.buffer, self.sink.as_ref(), Origin::Coordinator) {
            Watch::Triggered
        } else {
            Watch::Observed
        }
    }
}
