//! Process Records
//!
//! A process here is a registered run-to-completion callback with identity,
//! an execution-delay throttle, and an event queue. It is not an OS
//! process: there is no stack of its own and no preemption. Once invoked,
//! a callback runs to completion before anything else runs.

use crate::queue::RawEventQueue;
use crate::sched::Runtime;

/// Process identifier
///
/// Identifiers are chosen by the application and must be unique;
/// registration rejects duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessId(pub u8);

/// Execution-delay value that disables a process entirely
///
/// A disabled process is never invoked until a new delay is set: the
/// scheduler checks for this sentinel before it looks at the skip counter.
/// Setting it resets the skip counter to zero, like any other delay change,
/// so re-enabling with a delay of zero resumes on the very next visit.
pub const PROCESS_DISABLED: i32 = -1;

/// A run-to-completion process callback
///
/// Implementors carry their own state; the scheduler only sees the trait
/// object. The callback receives the runtime so it can read its event
/// queue, post to other processes, and manage timers:
///
/// ```
/// use evrun::{Process, ProcessId, Runtime};
///
/// struct Echo {
///     peer: ProcessId,
/// }
///
/// impl Process for Echo {
///     fn run(&self, rt: &Runtime) {
///         while let Some(byte) = rt.get_event::<u8>() {
///             let _ = rt.post_event(self.peer, &byte);
///         }
///     }
/// }
/// ```
///
/// `run` must return in bounded time; a callback that loops forever halts
/// the whole system.
pub trait Process: Sync {
    fn run(&self, rt: &Runtime);
}

/// Scheduler error types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedError {
    /// Process table is full (maximum processes reached)
    TableFull,
    /// A process with this ID is already registered
    DuplicatePid,
    /// No process with this ID is registered
    UnknownPid,
    /// The target process has no event queue
    NoEventQueue,
    /// Posted item size does not match the queue's item size
    EventSizeMismatch,
    /// Target event queue is full
    QueueFull,
    /// `init` was already called
    AlreadyInitialized,
}

/// Result type for scheduler operations
pub type SchedResult<T> = Result<T, SchedError>;

/// One registered process
#[derive(Clone, Copy)]
pub(crate) struct ProcessRecord {
    /// The callback object
    pub process: &'static dyn Process,

    /// Process ID
    pub pid: ProcessId,

    /// Scheduler passes to skip between invocations; 0 means every pass,
    /// `PROCESS_DISABLED` suppresses invocation entirely
    pub exec_delay: i32,

    /// Passes remaining until the next invocation
    pub iterations_to_exec: i32,

    /// The process's event queue, if it has one
    pub event_queue: Option<&'static dyn RawEventQueue>,
}
