use eyre::{Context, Result};
use pipeline::Settings;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub buffer: BufferConfig,

    #[serde(default)]
    pub producer: ProducerConfig,

    #[serde(default)]
    pub consumer: ConsumerConfig,

    #[serde(default)]
    pub shutdown: ShutdownConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferConfig {
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducerConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerConfig {
    #[serde(default = "default_consumer_count")]
    pub count: usize,
    #[serde(default = "default_work_delay_ms")]
    pub work_delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShutdownConfig {
    #[serde(default = "default_watch_tick_ms")]
    pub watch_tick_ms: u64,
}

fn default_capacity() -> usize {
    8
}

fn default_interval_secs() -> u64 {
    1
}

fn default_consumer_count() -> usize {
    2
}

fn default_work_delay_ms() -> u64 {
    50
}

fn default_watch_tick_ms() -> u64 {
    100
}

impl Default for BufferConfig {
    fn default() -> Self {
        BufferConfig {
            capacity: default_capacity(),
        }
    }
}

impl Default for ProducerConfig {
    fn default() -> Self {
        ProducerConfig {
            interval_secs: default_interval_secs(),
        }
    }
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        ConsumerConfig {
            count: default_consumer_count(),
            work_delay_ms: default_work_delay_ms(),
        }
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        ShutdownConfig {
            watch_tick_ms: default_watch_tick_ms(),
        }
    }
}

/// Values given on the command line. Each one replaces its file counterpart.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Overrides {
    pub consumers: Option<usize>,
    pub capacity: Option<usize>,
    pub interval_secs: Option<u64>,
    pub work_delay: Option<Duration>,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config path={}", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid config path={}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(consumers) = overrides.consumers {
            self.consumer.count = consumers;
        }
        if let Some(capacity) = overrides.capacity {
            self.buffer.capacity = capacity;
        }
        if let Some(interval_secs) = overrides.interval_secs {
            self.producer.interval_secs = interval_secs;
        }
        if let Some(work_delay) = overrides.work_delay {
            self.consumer.work_delay_ms = work_delay.as_millis().try_into().unwrap_or(u64::MAX);
        }
    }

    /// Validated pipeline settings.
    pub fn settings(&self) -> pipeline::Result<Settings> {
        Ok(Settings::new(
            self.consumer.count,
            self.buffer.capacity,
            Duration::from_secs(self.producer.interval_secs),
        )?
        .with_work_delay(Duration::from_millis(self.consumer.work_delay_ms))
        .with_watch_tick(Duration::from_millis(self.shutdown.watch_tick_ms)))
    }
}
