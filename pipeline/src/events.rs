use serde::Serialize;
use std::fmt;

use crate::{ConsumerId, Value};

/// Party that moved the buffer into shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Coordinator,
    Producer,
    Supervisor,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Origin::Coordinator => "coordinator",
            Origin::Producer => "producer",
            Origin::Supervisor => "supervisor",
        };
        f.write_str(name)
    }
}

/// One state transition of the pipeline. `count` is always the buffer
/// occupancy right after the operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    Produced {
        value: Value,
        count: usize,
    },
    Consumed {
        consumer: ConsumerId,
        value: Value,
        count: usize,
    },
    ShutdownInitiated {
        origin: Origin,
    },
    ProducerStopped,
    ConsumerStopped {
        consumer: ConsumerId,
    },
    FinalSummary {
        produced: u64,
        consumed: u64,
        remaining: usize,
    },
}

/// Destination for pipeline events. Called from every task thread.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: Event);
}

impl<F> EventSink for F
where
    F: Fn(Event) + Send + Sync,
{
    fn emit(&self, event: Event) {
        self(event)
    }
}
