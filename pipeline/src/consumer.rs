use boundbuf::{BoundedBuffer, TakeOutcome};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::debug;

use crate::events::{Event, EventSink};
use crate::{ConsumerId, Value};

/// Simulated processing time per item when none is configured.
pub const DEFAULT_WORK_DELAY: Duration = Duration::from_millis(50);

/// One of several symmetric consumers. Takes until the buffer reports
/// it is shut down and empty.
pub struct Consumer {
    id: ConsumerId,
    buffer: Arc<BoundedBuffer<Value>>,
    work_delay: Duration,
    sink: Arc<dyn EventSink>,
}

impl Consumer {
    pub fn new(id: ConsumerId, buffer: Arc<BoundedBuffer<Value>>, sink: Arc<dyn EventSink>) -> Self {
        Consumer {
            id,
            buffer,
            work_delay: DEFAULT_WORK_DELAY,
            sink,
        }
    }

    pub fn with_work_delay(mut self, work_delay: Duration) -> Self {
        self.work_delay = work_delay;
        self
    }

    pub fn id(&self) -> ConsumerId {
        self.id
    }

    /// Returns how many items this consumer took.
    pub fn run(self) -> u64 {
        let mut taken = 0;

        loop {
            let outcome = self.buffer.take_with(|&value, count| {
                self.sink.emit(Event::Consumed {
                    consumer: self.id,
                    value,
                    count,
                });
            });
            let TakeOutcome::Taken { value, .. } = outcome else {
                break;
            };
            taken += 1;
            self.process(value);
        }

        debug!(consumer = self.id, taken, "consumer stopped");
        self.sink.emit(Event::ConsumerStopped { consumer: self.id });
        taken
    }

    fn process(&self, _value: Value) {
        if !self.work_delay.is_zero() {
            thread::sleep(self.work_delay);
        }
    }
}
