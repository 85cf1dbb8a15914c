use clap::ValueEnum;
use parking_lot::Mutex;
use pipeline::{Event, EventSink};
use std::io::{self, Write};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Human readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Writes every event to `W` as soon as it is emitted.
pub struct ConsoleSink<W: Write + Send> {
    format: Format,
    out: Mutex<W>,
}

impl<W: Write + Send> ConsoleSink<W> {
    pub fn new(out: W, format: Format) -> Self {
        ConsoleSink {
            format,
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn write_event(&self, out: &mut W, event: &Event) -> io::Result<()> {
        match self.format {
            Format::Json => {
                serde_json::to_writer(&mut *out, event)?;
                writeln!(out)?;
            }
            Format::Text => write_text(out, event)?,
        }
        out.flush()
    }
}

fn write_text(out: &mut impl Write, event: &Event) -> io::Result<()> {
    match event {
        Event::Produced { value, count } => writeln!(out, "[producer] +{value} (count={count})"),
        Event::Consumed {
            consumer,
            value,
            count,
        } => writeln!(out, "  [consumer {consumer}] -{value} (count={count})"),
        Event::ShutdownInitiated { origin } => {
            writeln!(out, "[shutdown] initiated by {origin}, draining")
        }
        Event::ProducerStopped => writeln!(out, "[producer] stopped"),
        Event::ConsumerStopped { consumer } => writeln!(out, "  [consumer {consumer}] stopped"),
        Event::FinalSummary {
            produced,
            consumed,
            remaining,
        } => {
            writeln!(out, "\n=== summary ===")?;
            writeln!(out, "produced: {produced}")?;
            writeln!(out, "consumed: {consumed}")?;
            writeln!(out, "remaining: {remaining}")
        }
    }
}

impl<W: Write + Send> EventSink for ConsoleSink<W> {
    fn emit(&self, event: Event) {
        let mut out = self.out.lock();
        if let Err(e) = self.write_event(&mut *out, &event) {
            tracing::warn!(error = %e, ?event, "failed to write event");
        }
    }
}
