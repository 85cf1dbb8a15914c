use boundbuf::BoundBufError;
use thiserror::Error;

pub mod cancel;
pub mod consumer;
pub mod coordinator;
pub mod events;
pub mod producer;
pub mod supervisor;

pub use cancel::{CancelObserver, Cancellation, PolledFlag};
pub use consumer::Consumer;
pub use coordinator::{ShutdownCoordinator, Watch, DEFAULT_WATCH_TICK, MIN_WATCH_TICK};
pub use events::{Event, EventSink, Origin};
pub use producer::{Producer, ProducerExit};
pub use supervisor::{run, run_with, Settings, Spawn, Summary, ThreadSpawner};

/// Payload carried through the buffer.
pub type Value = u64;

/// 1-based consumer identifier.
pub type ConsumerId = usize;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("invalid {field}: {reason}")]
    InvalidSettings {
        field: &'static str,
        reason: &'static str,
    },
    #[error("Buffer error: {0}")]
    Buffer(#[from] BoundBufError),
    #[error("failed to start {task} task: {source}")]
    TaskStart {
        task: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{task} task panicked")]
    TaskPanicked { task: String },
}

pub type Result<T> = std::result::Result<T, PipelineError>;
