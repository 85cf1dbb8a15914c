use clap::Parser;
use eyre::{Context, Result};
use pipeline::{CancelObserver, Cancellation};
use prodcons::config::{Config, Overrides};
use prodcons::render::{ConsoleSink, Format};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::Duration;

static LONG_VERSION: OnceLock<String> = OnceLock::new();

fn get_long_version() -> &'static str {
    LONG_VERSION.get_or_init(|| {
        format!(
            "{} (commit: {})",
            env!("CARGO_PKG_VERSION"),
            option_env!("PRODCONS_REVISION").unwrap_or("unknown"),
        )
    })
}

#[derive(Parser)]
#[command(name = "prodcons")]
#[command(about = "bounded-buffer producer/consumer pipeline with graceful shutdown")]
#[command(version = None, long_version = get_long_version())]
struct Args {
    #[arg(value_name = "CONSUMERS", help = "number of consumer threads (>= 1)")]
    consumers: Option<usize>,

    #[arg(value_name = "CAPACITY", help = "ring buffer capacity (>= 1)")]
    capacity: Option<usize>,

    #[arg(value_name = "INTERVAL", help = "seconds between produced values (>= 0)")]
    interval: Option<u64>,

    #[arg(short, long, help = "configuration file path (toml format)")]
    config: Option<PathBuf>,

    #[arg(
        short,
        long,
        value_parser = humantime::parse_duration,
        help = "cancel automatically after this long (e.g. 10s, 5m)"
    )]
    duration: Option<Duration>,

    #[arg(
        short,
        long,
        value_parser = humantime::parse_duration,
        help = "simulated processing time per consumed value (e.g. 50ms)"
    )]
    work_delay: Option<Duration>,

    #[arg(short, long, value_enum, default_value_t = Format::Text, help = "event output format")]
    format: Format,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            consumers: self.consumers,
            capacity: self.capacity,
            interval_secs: self.interval,
            work_delay: self.work_delay,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    config.apply(&args.overrides());
    let settings = config.settings().wrap_err("invalid settings")?;

    let cancellation = Cancellation::new();
    {
        let cancellation = cancellation.clone();
        ctrlc::set_handler(move || {
            if cancellation.cancel() {
                tracing::info!("received ctrl+c, shutting down gracefully...");
            }
        })?;
    }

    if let Some(duration) = args.duration {
        let cancellation = cancellation.clone();
        thread::Builder::new()
            .name("deadline".to_string())
            .spawn(move || {
                if !cancellation.wait_timeout(duration) {
                    tracing::info!(?duration, "duration elapsed, shutting down");
                    cancellation.cancel();
                }
            })
            .wrap_err("failed to start deadline thread")?;
    }

    let sink = Arc::new(ConsoleSink::new(io::stdout(), args.format));
    let summary = pipeline::run(&settings, Arc::new(cancellation), sink)
        .wrap_err("pipeline failed")?;

    if summary.remaining != 0 {
        eyre::bail!(
            "{} values left in the buffer after shutdown",
            summary.remaining
        );
    }

    tracing::info!(
        produced = summary.produced,
        consumed = summary.consumed,
        "pipeline complete"
    );
    Ok(())
}
