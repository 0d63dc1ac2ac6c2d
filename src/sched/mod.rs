//! Cooperative Process Scheduler
//!
//! This module implements the run-to-completion (RTC) scheduler at the core
//! of the runtime. Registered processes are visited round-robin in
//! registration order; a process whose skip counter has reached zero is
//! invoked and runs to completion. There is no preemption and no per-task
//! stack: the only wait primitive is returning from the callback with an
//! empty event queue, and the scheduler will come back on the next pass.
//!
//! All runtime state lives in a [`Runtime`] value. On bare metal it sits in
//! a `static` so interrupt handlers can reach it; on the host it can be a
//! local, which is what the tests do. Shared state is mutated only inside
//! the interrupt-masking critical section, making `post_event` and
//! `timer_tick` safe to call from ISRs (bracketed by `enter_isr` /
//! `exit_isr`).

pub mod process;

#[cfg(feature = "soft-timers")]
pub mod timer;

use core::mem::size_of;
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use zerocopy::{AsBytes, FromBytes};

use crate::config;
use crate::log_debug;
use crate::log_info;
use crate::metrics::RuntimeMetrics;
use crate::queue::RawEventQueue;
use crate::sync::IrqLock;

pub use process::{Process, ProcessId, SchedError, SchedResult, PROCESS_DISABLED};

use process::ProcessRecord;

#[cfg(feature = "soft-timers")]
use crate::queue::Ring;
#[cfg(feature = "soft-timers")]
use timer::{ExpiredTimer, TimerTable};

/// Process table capacity: one extra slot holds the internal timer-dispatch
/// process when timers are compiled in
#[cfg(feature = "soft-timers")]
const PROC_SLOTS: usize = config::MAX_PROCESSES + 1;
#[cfg(not(feature = "soft-timers"))]
const PROC_SLOTS: usize = config::MAX_PROCESSES;

/// Active-process cursor value meaning "no callback is running"
const NO_ACTIVE: usize = usize::MAX;

/// Process table plus the round-robin rotation cursor
struct ProcTable {
    /// Registered processes, in registration order; `None` slots are free
    records: [Option<ProcessRecord>; PROC_SLOTS],

    /// Number of registered processes
    num_processes: usize,

    /// Slot the next scheduler pass will visit
    next_slot: usize,
}

impl ProcTable {
    const fn new() -> Self {
        Self {
            records: [None; PROC_SLOTS],
            num_processes: 0,
            next_slot: 0,
        }
    }

    fn record(&self, pid: ProcessId) -> Option<&ProcessRecord> {
        self.records[..self.num_processes]
            .iter()
            .flatten()
            .find(|r| r.pid == pid)
    }

    fn record_mut(&mut self, pid: ProcessId) -> Option<&mut ProcessRecord> {
        self.records[..self.num_processes]
            .iter_mut()
            .flatten()
            .find(|r| r.pid == pid)
    }
}

/// The runtime: process table, timers, and the counters they share
///
/// `new` is const so the runtime can live in a `static`:
///
/// ```
/// use evrun::Runtime;
/// static RUNTIME: Runtime = Runtime::new();
/// ```
pub struct Runtime {
    /// Process table, mutated only inside the critical section
    sched: IrqLock<ProcTable>,

    /// Slot of the record the scheduler is currently visiting; read by
    /// `get_event` so a callback reaches its own queue without naming it
    active: AtomicUsize,

    /// Whether `init` has run
    initialized: AtomicBool,

    /// Runtime counters
    metrics: RuntimeMetrics,

    /// Software-timer table
    #[cfg(feature = "soft-timers")]
    timers: IrqLock<TimerTable>,

    /// Expired timers published by `timer_tick`, drained by the internal
    /// dispatch process
    #[cfg(feature = "soft-timers")]
    expiry: Ring<ExpiredTimer, { config::MAX_SOFT_TIMERS }>,
}

impl Runtime {
    /// Creates an empty runtime
    pub const fn new() -> Self {
        Self {
            sched: IrqLock::new(ProcTable::new()),
            active: AtomicUsize::new(NO_ACTIVE),
            initialized: AtomicBool::new(false),
            metrics: RuntimeMetrics::new(),
            #[cfg(feature = "soft-timers")]
            timers: IrqLock::new(TimerTable::new()),
            #[cfg(feature = "soft-timers")]
            expiry: Ring::new(),
        }
    }

    /// One-shot initialization
    ///
    /// When timers are compiled in, registers the internal timer-dispatch
    /// process at the reserved [`config::TIMER_PROCESS_PID`]. Without it,
    /// installed timers still expire but their handlers never run.
    ///
    /// # Errors
    /// Returns `SchedError::AlreadyInitialized` on a second call.
    pub fn init(&self) -> SchedResult<()> {
        if self.initialized.swap(true, Ordering::SeqCst) {
            return Err(SchedError::AlreadyInitialized);
        }

        #[cfg(feature = "soft-timers")]
        self.add_process(&timer::EXPIRY_DISPATCH, config::TIMER_PROCESS_PID, None)?;

        Ok(())
    }

    /// Registers a new process
    ///
    /// Appends a record to the process table; registration order defines
    /// the round-robin visit order. The execution delay starts at zero
    /// (invoke on every pass). Processes that never receive events may pass
    /// `None` for the queue.
    ///
    /// # Errors
    /// `TableFull` when no slots remain, `DuplicatePid` when the ID is
    /// already registered (including the reserved timer-dispatch ID).
    pub fn add_process(
        &self,
        process: &'static dyn Process,
        pid: ProcessId,
        event_queue: Option<&'static dyn RawEventQueue>,
    ) -> SchedResult<()> {
        {
            let mut tbl = self.sched.lock();

            if tbl.num_processes == tbl.records.len() {
                return Err(SchedError::TableFull);
            }
            if tbl.record(pid).is_some() {
                return Err(SchedError::DuplicatePid);
            }

            let slot = tbl.num_processes;
            tbl.records[slot] = Some(ProcessRecord {
                process,
                pid,
                exec_delay: 0,
                iterations_to_exec: 0,
                event_queue,
            });
            tbl.num_processes += 1;
        }

        log_info!("SCHED", "registered process pid={}", pid.0);
        Ok(())
    }

    /// Sets a process's execution delay
    ///
    /// A delay of zero means "invoke on every pass"; a positive delay N
    /// skips N passes between invocations; [`PROCESS_DISABLED`] suppresses
    /// invocation entirely until a new delay is set. The target's skip
    /// counter is reset along with the delay.
    ///
    /// # Errors
    /// `UnknownPid` when no process has this ID.
    pub fn set_exec_delay(&self, pid: ProcessId, exec_delay: i32) -> SchedResult<()> {
        {
            let mut tbl = self.sched.lock();
            let rec = tbl.record_mut(pid).ok_or(SchedError::UnknownPid)?;
            rec.exec_delay = exec_delay;
            rec.iterations_to_exec = exec_delay.max(0);
        }

        log_debug!("SCHED", "pid={} exec delay set to {}", pid.0, exec_delay);
        Ok(())
    }

    /// Posts an event to a process's queue
    ///
    /// Safe to call from an ISR (inside `enter_isr`/`exit_isr`). The item
    /// is copied into the queue byte-for-byte; its type must match the item
    /// type the target queue was declared with, which is checked by size.
    ///
    /// # Errors
    /// `UnknownPid`, `NoEventQueue`, `EventSizeMismatch`, or `QueueFull`.
    /// A full queue also shows up in [`metrics`](Self::metrics) as a
    /// dropped event.
    pub fn post_event<T: AsBytes>(&self, pid: ProcessId, event: &T) -> SchedResult<()> {
        let queue = {
            let tbl = self.sched.lock();
            let rec = tbl.record(pid).ok_or(SchedError::UnknownPid)?;
            rec.event_queue.ok_or(SchedError::NoEventQueue)?
        };

        if queue.item_size() != size_of::<T>() {
            return Err(SchedError::EventSizeMismatch);
        }

        if queue.push_raw(event.as_bytes()) {
            self.metrics.inc_events_posted();
            Ok(())
        } else {
            self.metrics.inc_events_dropped();
            Err(SchedError::QueueFull)
        }
    }

    /// Pops one event from the currently running process's queue
    ///
    /// Valid only from within a process callback; `None` means the queue is
    /// empty, which is the normal "nothing to do" signal, or that the
    /// requested type's size does not match the queue.
    pub fn get_event<T: AsBytes + FromBytes>(&self) -> Option<T> {
        let slot = self.active.load(Ordering::SeqCst);
        if slot == NO_ACTIVE {
            return None;
        }

        let queue = {
            let tbl = self.sched.lock();
            tbl.records.get(slot)?.as_ref()?.event_queue?
        };

        if queue.item_size() != size_of::<T>() {
            return None;
        }

        let mut event = T::new_zeroed();
        if queue.pop_raw(event.as_bytes_mut()) {
            Some(event)
        } else {
            None
        }
    }

    /// Executes one scheduler pass: visit the next record in round-robin
    /// order and invoke it if its skip counter has reached zero
    ///
    /// This is the body of [`start`](Self::start)'s loop, exposed so hosted
    /// drivers and tests can step the scheduler. Returns without doing
    /// anything when no processes are registered.
    pub fn poll(&self) {
        let invoke = {
            let mut tbl = self.sched.lock();
            if tbl.num_processes == 0 {
                return;
            }

            let slot = tbl.next_slot;
            tbl.next_slot = (slot + 1) % tbl.num_processes;

            // Publish the cursor before deciding whether to invoke, so it
            // always names the most recently visited record
            self.active.store(slot, Ordering::SeqCst);

            match tbl.records[slot].as_mut() {
                Some(rec) if rec.exec_delay == PROCESS_DISABLED => None,
                Some(rec) if rec.iterations_to_exec == 0 => {
                    rec.iterations_to_exec = rec.exec_delay;
                    Some(rec.process)
                }
                Some(rec) => {
                    rec.iterations_to_exec -= 1;
                    None
                }
                None => None,
            }
        };

        self.metrics.inc_scheduler_passes();

        if let Some(process) = invoke {
            self.metrics.inc_process_invocations();
            // The callback runs to completion outside the critical section
            process.run(self);
        }
    }

    /// Enters the scheduler loop; never returns
    ///
    /// With no registered processes the loop idles until an ISR-side
    /// registration would make progress possible.
    pub fn start(&self) -> ! {
        log_info!(
            "SCHED",
            "scheduler started with {} processes",
            self.process_count()
        );
        loop {
            self.poll();
        }
    }

    /// Number of registered processes (including the internal timer
    /// dispatcher once `init` has run)
    pub fn process_count(&self) -> usize {
        self.sched.lock().num_processes
    }

    /// Runtime counters
    pub fn metrics(&self) -> &RuntimeMetrics {
        &self.metrics
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}
