/// Configuration constants for the evrun runtime

#[cfg(feature = "soft-timers")]
use crate::sched::ProcessId;

/// Maximum number of application processes that can be registered
pub const MAX_PROCESSES: usize = 8;

/// Maximum number of software timers that can be installed at once
/// (also sizes the expired-timer queue)
#[cfg(feature = "soft-timers")]
pub const MAX_SOFT_TIMERS: usize = 8;

/// Reserved process ID for the internal timer-dispatch process
/// registered by `Runtime::init()`
#[cfg(feature = "soft-timers")]
pub const TIMER_PROCESS_PID: ProcessId = ProcessId(0);
