//! Runtime logging
//!
//! The core never talks to an output device directly; the platform hands it
//! a [`LogSink`] (a serial port on bare metal, stdout in hosted demos) and
//! the runtime's subsystems emit tagged lines through it. Until a sink is
//! registered, every message is discarded, so logging is safe to leave in
//! on targets with no console at all.
//!
//! Messages carry a severity and a short subsystem tag and come out as
//! `[SCHED][INFO] registered process pid=3`.

use core::fmt;
use core::sync::atomic::{AtomicU8, Ordering};

use spin::Mutex;

/// Where formatted log lines end up
///
/// Implementations must tolerate being called from ISR context; the
/// emit path never blocks on them (see [`emit`]).
pub trait LogSink: Sync {
    /// Write one complete line; no trailing newline is included
    fn log_line(&self, line: fmt::Arguments);
}

/// The registered sink, if any
static SINK: Mutex<Option<&'static dyn LogSink>> = Mutex::new(None);

/// Route log output to `sink` from now on
pub fn set_log_sink(sink: &'static dyn LogSink) {
    *SINK.lock() = Some(sink);
}

/// Message severity, most severe first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        })
    }
}

/// Verbosity threshold; messages less severe than this are suppressed
static THRESHOLD: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

/// Raise or lower the verbosity threshold
pub fn set_log_level(level: LogLevel) {
    THRESHOLD.store(level as u8, Ordering::Relaxed);
}

/// The current verbosity threshold
pub fn log_level() -> LogLevel {
    const LEVELS: [LogLevel; 5] = [
        LogLevel::Error,
        LogLevel::Warn,
        LogLevel::Info,
        LogLevel::Debug,
        LogLevel::Trace,
    ];
    let raw = THRESHOLD.load(Ordering::Relaxed) as usize;
    LEVELS.get(raw).copied().unwrap_or(LogLevel::Info)
}

/// Whether a message at `level` would currently be emitted
#[inline]
pub fn enabled(level: LogLevel) -> bool {
    level as u8 <= THRESHOLD.load(Ordering::Relaxed)
}

/// Emit path behind the `log_*!` macros
///
/// The sink is taken with `try_lock`: if the main loop holds it when an
/// interrupt handler logs, the handler's message is dropped rather than
/// spinning on a lock whose holder cannot run again until the ISR returns.
#[doc(hidden)]
pub fn emit(level: LogLevel, subsys: &str, message: fmt::Arguments) {
    if !enabled(level) {
        return;
    }
    if let Some(slot) = SINK.try_lock() {
        if let Some(sink) = *slot {
            sink.log_line(format_args!("[{}][{}] {}", subsys, level, message));
        }
    }
}

/// Report an error to the log, tagged with a subsystem name
#[macro_export]
macro_rules! log_error {
    ($subsys:expr, $($arg:tt)*) => {
        $crate::log::emit($crate::log::LogLevel::Error, $subsys, format_args!($($arg)*))
    };
}

/// Report a condition worth attention, tagged with a subsystem name
#[macro_export]
macro_rules! log_warn {
    ($subsys:expr, $($arg:tt)*) => {
        $crate::log::emit($crate::log::LogLevel::Warn, $subsys, format_args!($($arg)*))
    };
}

/// Record a noteworthy event, tagged with a subsystem name
#[macro_export]
macro_rules! log_info {
    ($subsys:expr, $($arg:tt)*) => {
        $crate::log::emit($crate::log::LogLevel::Info, $subsys, format_args!($($arg)*))
    };
}

/// Record debugging detail, tagged with a subsystem name
#[macro_export]
macro_rules! log_debug {
    ($subsys:expr, $($arg:tt)*) => {
        $crate::log::emit($crate::log::LogLevel::Debug, $subsys, format_args!($($arg)*))
    };
}

/// Record fine-grained tracing output, tagged with a subsystem name
#[macro_export]
macro_rules! log_trace {
    ($subsys:expr, $($arg:tt)*) => {
        $crate::log::emit($crate::log::LogLevel::Trace, $subsys, format_args!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_filtering() {
        set_log_level(LogLevel::Warn);
        assert!(enabled(LogLevel::Error));
        assert!(enabled(LogLevel::Warn));
        assert!(!enabled(LogLevel::Info));
        assert!(!enabled(LogLevel::Trace));

        set_log_level(LogLevel::Trace);
        assert!(enabled(LogLevel::Trace));
        assert_eq!(log_level(), LogLevel::Trace);

        // Other tests rely on the default threshold
        set_log_level(LogLevel::Info);
    }
}
