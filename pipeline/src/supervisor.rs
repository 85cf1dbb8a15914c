use boundbuf::BoundedBuffer;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info};

use crate::cancel::CancelObserver;
use crate::consumer::{Consumer, DEFAULT_WORK_DELAY};
use crate::coordinator::{
    initiate_shutdown, ShutdownCoordinator, Watch, DEFAULT_WATCH_TICK, MIN_WATCH_TICK,
};
use crate::events::{Event, EventSink, Origin};
use crate::producer::{Producer, ProducerExit};
use crate::{ConsumerId, PipelineError, Result, Value};

/// Starts a named task. Abstracted so that start failures can be exercised.
pub trait Spawn {
    fn spawn<F, T>(&self, name: String, task: F) -> io::Result<JoinHandle<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static;
}

/// One OS thread per task.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSpawner;

impl Spawn for ThreadSpawner {
    fn spawn<F, T>(&self, name: String, task: F) -> io::Result<JoinHandle<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        thread::Builder::new().name(name).spawn(task)
    }
}

/// Validated run parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    consumers: usize,
    capacity: usize,
    interval: Duration,
    work_delay: Duration,
    watch_tick: Duration,
}

impl Settings {
    pub fn new(consumers: usize, capacity: usize, interval: Duration) -> Result<Self> {
        if consumers == 0 {
            return Err(PipelineError::InvalidSettings {
                field: "consumer count",
                reason: "must be at least 1",
            });
        }
        if capacity == 0 {
            return Err(PipelineError::InvalidSettings {
                field: "buffer capacity",
                reason: "must be at least 1",
            });
        }

        Ok(Settings {
            consumers,
            capacity,
            interval,
            work_delay: DEFAULT_WORK_DELAY,
            watch_tick: DEFAULT_WATCH_TICK,
        })
    }

    pub fn with_work_delay(mut self, work_delay: Duration) -> Self {
        self.work_delay = work_delay;
        self
    }

    pub fn with_watch_tick(mut self, watch_tick: Duration) -> Self {
        self.watch_tick = watch_tick.max(MIN_WATCH_TICK);
        self
    }

    pub fn consumers(&self) -> usize {
        self.consumers
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn work_delay(&self) -> Duration {
        self.work_delay
    }

    pub fn watch_tick(&self) -> Duration {
        self.watch_tick
    }
}

/// Lifetime totals reported once every task has returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub produced: u64,
    pub consumed: u64,
    pub remaining: usize,
}

impl Summary {
    pub fn is_clean(&self) -> bool {
        self.remaining == 0 && self.produced == self.consumed
    }
}

/// Runs the pipeline on OS threads until `observer` reports cancellation
/// and every task has returned.
pub fn run(
    settings: &Settings,
    observer: Arc<dyn CancelObserver>,
    sink: Arc<dyn EventSink>,
) -> Result<Summary> {
    run_with(settings, observer, sink, &ThreadSpawner)
}

pub fn run_with<S: Spawn>(
    settings: &Settings,
    observer: Arc<dyn CancelObserver>,
    sink: Arc<dyn EventSink>,
    spawner: &S,
) -> Result<Summary> {
    let buffer = Arc::new(BoundedBuffer::new(settings.capacity)?);

    info!(
        consumers = settings.consumers,
        capacity = settings.capacity,
        interval_ms = settings.interval.as_millis() as u64,
        work_delay_ms = settings.work_delay.as_millis() as u64,
        "starting pipeline"
    );

    let mut tasks = Tasks::new(buffer.clone(), sink.clone());
    let started = tasks.start(spawner, settings, observer);
    let joined = tasks.join();

    let snapshot = buffer.snapshot();
    let summary = Summary {
        produced: snapshot.produced,
        consumed: snapshot.consumed,
        remaining: snapshot.count,
    };
    info!(
        produced = summary.produced,
        consumed = summary.consumed,
        remaining = summary.remaining,
        "pipeline finished"
    );
    sink.emit(Event::FinalSummary {
        produced: summary.produced,
        consumed: summary.consumed,
        remaining: summary.remaining,
    });

    started.and(joined)?;
    Ok(summary)
}

struct Tasks {
    buffer: Arc<BoundedBuffer<Value>>,
    sink: Arc<dyn EventSink>,
    coordinator: Option<JoinHandle<Watch>>,
    producer: Option<JoinHandle<ProducerExit>>,
    consumers: Vec<(ConsumerId, JoinHandle<u64>)>,
}

impl Tasks {
    fn new(buffer: Arc<BoundedBuffer<Value>>, sink: Arc<dyn EventSink>) -> Self {
        Tasks {
            buffer,
            sink,
            coordinator: None,
            producer: None,
            consumers: Vec::new(),
        }
    }

    fn start<S: Spawn>(
        &mut self,
        spawner: &S,
        settings: &Settings,
        observer: Arc<dyn CancelObserver>,
    ) -> Result<()> {
        let coordinator =
            ShutdownCoordinator::new(self.buffer.clone(), observer.clone(), self.sink.clone())
                .with_tick(settings.watch_tick);
        self.coordinator = Some(self.spawn(spawner, "shutdown-watch".to_string(), move || {
            coordinator.run()
        })?);

        let producer = Producer::new(
            self.buffer.clone(),
            settings.interval,
            observer,
            self.sink.clone(),
        );
        self.producer = Some(self.spawn(spawner, "producer".to_string(), move || producer.run())?);

        for id in 1..=settings.consumers {
            let consumer = Consumer::new(id, self.buffer.clone(), self.sink.clone())
                .with_work_delay(settings.work_delay);
            let handle = self.spawn(spawner, format!("consumer-{id}"), move || consumer.run())?;
            self.consumers.push((id, handle));
        }

        debug!(consumers = self.consumers.len(), "all tasks started");
        Ok(())
    }

    /// Spawns `task` with a guard that shuts the buffer down if it panics.
    /// A failed start shuts the buffer down too, so already running tasks unwind.
    fn spawn<S, F, T>(&self, spawner: &S, name: String, task: F) -> Result<JoinHandle<T>>
    where
        S: Spawn,
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let guard = PanicGuard {
            task: name.clone(),
            buffer: self.buffer.clone(),
            sink: self.sink.clone(),
        };

        spawner
            .spawn(name.clone(), move || {
                let _guard = guard;
                task()
            })
            .map_err(|source| {
                error!(task = %name, error = %source, "failed to start task");
                initiate_shutdown(&self.buffer, self.sink.as_ref(), Origin::Supervisor);
                PipelineError::TaskStart { task: name, source }
            })
    }

    /// Joins every started task. The first panic observed is returned after
    /// the remaining tasks have been joined.
    fn join(mut self) -> Result<()> {
        let mut result = Ok(());

        if let Some(handle) = self.producer.take() {
            match handle.join() {
                Ok(exit) => debug!(?exit, "producer joined"),
                Err(_) => result = result.and(Err(panicked("producer"))),
            }
        }

        for (id, handle) in self.consumers.drain(..) {
            match handle.join() {
                Ok(taken) => debug!(consumer = id, taken, "consumer joined"),
                Err(_) => result = result.and(Err(panicked(&format!("consumer-{id}")))),
            }
        }

        if let Some(handle) = self.coordinator.take() {
            match handle.join() {
                Ok(watch) => debug!(?watch, "shutdown coordinator joined"),
                Err(_) => result = result.and(Err(panicked("shutdown-watch"))),
            }
        }

        result
    }
}

fn panicked(task: &str) -> PipelineError {
    PipelineError::TaskPanicked {
        task: task.to_string(),
    }
}

struct PanicGuard {
    task: String,
    buffer: Arc<BoundedBuffer<Value>>,
    sink: Arc<dyn EventSink>,
}

impl Drop for PanicGuard {
    fn drop(&mut self) {
        if thread::panicking() {
            error!(task = %self.task, "task panicked, shutting down");
            initiate_shutdown(&self.buffer, self.sink.as_ref(), Origin::Supervisor);
        }
    }
}
