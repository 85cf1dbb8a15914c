use boundbuf::{BoundedBuffer, PutOutcome};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::cancel::CancelObserver;
use crate::coordinator::initiate_shutdown;
use crate::events::{Event, EventSink, Origin};
use crate::Value;

/// Why the producer loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProducerExit {
    /// Cancellation was observed before the next put.
    Cancelled,
    /// A put was refused because the buffer had been shut down.
    Rejected,
    /// The value sequence ran past `Value::MAX`.
    Exhausted,
}

/// Single producer. Emits an increasing sequence starting at 1, one value
/// per `interval`.
pub struct Producer {
    buffer: Arc<BoundedBuffer<Value>>,
    interval: Duration,
    observer: Arc<dyn CancelObserver>,
    sink: Arc<dyn EventSink>,
    next: Option<Value>,
}

impl Producer {
    pub fn new(
        buffer: Arc<BoundedBuffer<Value>>,
        interval: Duration,
        observer: Arc<dyn CancelObserver>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Producer {
            buffer,
            interval,
            observer,
            sink,
            next: Some(1),
        }
    }

    pub fn starting_at(mut self, first: Value) -> Self {
        self.next = Some(first);
        self
    }

    pub fn run(mut self) -> ProducerExit {
        let exit = loop {
            // Returns immediately when cancellation is already raised.
            if self.observer.wait_timeout(self.interval) {
                initiate_shutdown(&self.buffer, self.sink.as_ref(), Origin::Producer);
                break ProducerExit::Cancelled;
            }

            let Some(value) = self.next else {
                debug!("value sequence exhausted");
                initiate_shutdown(&self.buffer, self.sink.as_ref(), Origin::Producer);
                break ProducerExit::Exhausted;
            };

            let sink = self.sink.as_ref();
            let outcome = self.buffer.put_with(value, |&value, count| {
                sink.emit(Event::Produced { value, count });
            });
            match outcome {
                PutOutcome::Stored { .. } => self.next = value.checked_add(1),
                PutOutcome::Rejected(_) => break ProducerExit::Rejected,
            }
        };

        debug!(?exit, next = ?self.next, "producer stopped");
        self.sink.emit(Event::ProducerStopped);
        exit
    }
}
