//! Diagnostics for the runtime's own bookkeeping.
//!
//! Context creation, callout correlation and event delivery report through
//! the `log_*` macros below. Built with the `logging` feature they expand to
//! `tracing` events; built without it they expand to nothing, so a plugin
//! binary carries no tracing code unless it opts in.
//!
//! With the `host-log` feature, [`HostLogLayer`] routes tracing events to the
//! host's log call so they show up in the proxy's own log stream.
//!
//! # Example
//!
//! ```rust,ignore
//! use crate::logging::{debug, trace};
//!
//! debug!(context_id, root_id, "created http context");
//! trace!(callout_id, "registered callout");
//! ```

/// Emit a trace-level log (very detailed internal operations).
#[cfg(feature = "logging")]
macro_rules! log_trace {
    ($($arg:tt)*) => { tracing::trace!($($arg)*) }
}

#[cfg(not(feature = "logging"))]
macro_rules! log_trace {
    ($($arg:tt)*) => {};
}

/// Emit a debug-level log (operation details useful for debugging).
#[cfg(feature = "logging")]
macro_rules! log_debug {
    ($($arg:tt)*) => { tracing::debug!($($arg)*) }
}

#[cfg(not(feature = "logging"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

/// Emit a warn-level log (unexpected but handled situations).
#[cfg(feature = "logging")]
macro_rules! log_warn {
    ($($arg:tt)*) => { tracing::warn!($($arg)*) }
}

#[cfg(not(feature = "logging"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {};
}

/// Emit an error-level log (failures that will propagate as errors).
#[cfg(feature = "logging")]
macro_rules! log_error {
    ($($arg:tt)*) => { tracing::error!($($arg)*) }
}

#[cfg(not(feature = "logging"))]
macro_rules! log_error {
    ($($arg:tt)*) => {};
}

pub(crate) use log_debug as debug;
pub(crate) use log_error as error;
pub(crate) use log_trace as trace;
pub(crate) use log_warn as warn;

#[cfg(feature = "host-log")]
pub use host_layer::HostLogLayer;

#[cfg(feature = "host-log")]
mod host_layer {
    use std::fmt::Write as _;

    use tracing::field::{Field, Visit};
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, Layer};

    use crate::host;
    use crate::types::LogLevel;

    /// A tracing layer that forwards events to the host's log call.
    ///
    /// Events raised while the host handle is already in use (for example
    /// from inside a host binding) are dropped rather than re-entering it.
    ///
    /// ```ignore
    /// use tracing_subscriber::layer::SubscriberExt;
    ///
    /// let subscriber = tracing_subscriber::registry().with(HostLogLayer::new());
    /// tracing::subscriber::set_global_default(subscriber)?;
    /// ```
    #[derive(Debug, Clone, Default)]
    pub struct HostLogLayer {
        with_target: bool,
    }

    impl HostLogLayer {
        pub fn new() -> Self {
            Self::default()
        }

        /// Prefix each message with the event's target.
        pub fn with_target(mut self, with_target: bool) -> Self {
            self.with_target = with_target;
            self
        }
    }

    impl<S: Subscriber> Layer<S> for HostLogLayer {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut visitor = MessageVisitor::default();
            event.record(&mut visitor);

            let mut line = String::new();
            if self.with_target {
                let _ = write!(line, "{}: ", event.metadata().target());
            }
            line.push_str(&visitor.message);
            line.push_str(&visitor.fields);

            let level = log_level(event.metadata().level());
            host::try_with_host(|h| {
                let _ = h.log(level, &line);
            });
        }
    }

    fn log_level(level: &Level) -> LogLevel {
        match *level {
            Level::TRACE => LogLevel::Trace,
            Level::DEBUG => LogLevel::Debug,
            Level::INFO => LogLevel::Info,
            Level::WARN => LogLevel::Warn,
            Level::ERROR => LogLevel::Error,
        }
    }

    #[derive(Default)]
    struct MessageVisitor {
        message: String,
        fields: String,
    }

    impl Visit for MessageVisitor {
        fn record_str(&mut self, field: &Field, value: &str) {
            if field.name() == "message" {
                self.message.push_str(value);
            } else {
                let _ = write!(self.fields, " {}={}", field.name(), value);
            }
        }

        fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
            if field.name() == "message" {
                let _ = write!(self.message, "{:?}", value);
            } else {
                let _ = write!(self.fields, " {}={:?}", field.name(), value);
            }
        }
    }
}
