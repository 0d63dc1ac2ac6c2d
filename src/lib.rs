//! evrun - a cooperative run-to-completion runtime for event-driven
//! embedded applications
//!
//! The runtime provides four things:
//!
//! - a round-robin RTC process scheduler with a per-process execution-delay
//!   throttle ([`Runtime::poll`] / [`Runtime::start`])
//! - per-process event queues for inter-process communication and
//!   ISR-to-task signaling ([`Runtime::post_event`] / [`Runtime::get_event`])
//! - delta-queue software timers driven by an external tick
//!   ([`Runtime::timer_tick`]), behind the `soft-timers` feature
//! - a nested critical-section gate that serializes state updates against
//!   interrupt handlers ([`enter_critical`] / [`exit_critical`])
//!
//! Everything is allocation-free: processes, handlers and queues are
//! `'static` values supplied by the application, and the runtime itself has
//! a `const` constructor so it can live in a `static`. The only platform
//! requirement is a way to mask and unmask interrupts, provided by the
//! [`port`] module per target.

#![no_std]

#[cfg(test)]
extern crate std;

pub mod config;
pub mod log;
pub mod metrics;
pub mod port;
pub mod queue;
pub mod sched;
pub mod sync;

pub use log::{set_log_level, set_log_sink, LogLevel, LogSink};
pub use metrics::{MetricsSnapshot, RuntimeMetrics};
pub use queue::{EventQueue, RawEventQueue, Ring};
pub use sched::{Process, ProcessId, Runtime, SchedError, SchedResult, PROCESS_DISABLED};
pub use sync::{enter_critical, enter_isr, exit_critical, exit_isr};

#[cfg(feature = "soft-timers")]
pub use sched::timer::{Ticks, TimeoutHandler, TimerError, TimerId, TimerResult};
