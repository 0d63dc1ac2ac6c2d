/// Runtime metrics collection
/// Tracks scheduler and timer statistics using atomic counters so ISR-side
/// paths can record without taking the critical section

use core::sync::atomic::{AtomicU64, Ordering};

/// Counters for one runtime instance
pub struct RuntimeMetrics {
    /// Scheduler passes (one per process visit)
    scheduler_passes: AtomicU64,

    /// Process callback invocations
    process_invocations: AtomicU64,

    /// Events accepted into a process queue
    events_posted: AtomicU64,

    /// Events rejected because the target queue was full
    events_dropped: AtomicU64,

    /// Timer ticks observed
    ticks: AtomicU64,

    /// Timers published to the expiry queue
    timers_expired: AtomicU64,

    /// Expirations lost because the expiry queue was full
    expiries_dropped: AtomicU64,

    /// Timeout handlers invoked by the dispatch process
    timer_dispatches: AtomicU64,
}

/// Point-in-time copy of all counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub scheduler_passes: u64,
    pub process_invocations: u64,
    pub events_posted: u64,
    pub events_dropped: u64,
    pub ticks: u64,
    pub timers_expired: u64,
    pub expiries_dropped: u64,
    pub timer_dispatches: u64,
}

impl RuntimeMetrics {
    /// Create a new instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            scheduler_passes: AtomicU64::new(0),
            process_invocations: AtomicU64::new(0),
            events_posted: AtomicU64::new(0),
            events_dropped: AtomicU64::new(0),
            ticks: AtomicU64::new(0),
            timers_expired: AtomicU64::new(0),
            expiries_dropped: AtomicU64::new(0),
            timer_dispatches: AtomicU64::new(0),
        }
    }

    #[inline]
    pub(crate) fn inc_scheduler_passes(&self) {
        self.scheduler_passes.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn inc_process_invocations(&self) {
        self.process_invocations.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn inc_events_posted(&self) {
        self.events_posted.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn inc_events_dropped(&self) {
        self.events_dropped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    #[cfg(feature = "soft-timers")]
    pub(crate) fn inc_ticks(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    #[cfg(feature = "soft-timers")]
    pub(crate) fn inc_timers_expired(&self) {
        self.timers_expired.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    #[cfg(feature = "soft-timers")]
    pub(crate) fn inc_expiries_dropped(&self) {
        self.expiries_dropped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    #[cfg(feature = "soft-timers")]
    pub(crate) fn inc_timer_dispatches(&self) {
        self.timer_dispatches.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            scheduler_passes: self.scheduler_passes.load(Ordering::Relaxed),
            process_invocations: self.process_invocations.load(Ordering::Relaxed),
            events_posted: self.events_posted.load(Ordering::Relaxed),
            events_dropped: self.events_dropped.load(Ordering::Relaxed),
            ticks: self.ticks.load(Ordering::Relaxed),
            timers_expired: self.timers_expired.load(Ordering::Relaxed),
            expiries_dropped: self.expiries_dropped.load(Ordering::Relaxed),
            timer_dispatches: self.timer_dispatches.load(Ordering::Relaxed),
        }
    }
}
