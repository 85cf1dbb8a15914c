/// Per-operation trace events under the `boundbuf::ops` target.
///
/// Expands to nothing unless the `trace` feature is enabled, so arguments are
/// never evaluated on the hot path of a default build.
macro_rules! buf_trace {
    ($($arg:tt)+) => {
        #[cfg(feature = "trace")]
        ::tracing::trace!(target: "boundbuf::ops", $($arg)+);
    };
}

pub(crate) use buf_trace;
