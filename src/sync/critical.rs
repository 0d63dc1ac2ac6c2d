//! Critical-Section Gate
//!
//! A nestable critical section that serializes the main loop against
//! interrupt handlers. Entering the gate masks interrupts and increments a
//! process-wide nesting counter; only the outermost exit unmasks them.
//! This gate is the sole means of mutual exclusion in the runtime: every
//! mutation of process-table, timer-table and queue state happens inside it.
//!
//! The model is a single CPU whose ISRs cannot be preempted by themselves,
//! so masking interrupts is sufficient exclusion; there is no spinning.

use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicUsize, Ordering};

use crate::port;

/// Critical-section nesting level. Interrupts are masked iff this is > 0.
static NESTING: AtomicUsize = AtomicUsize::new(0);

/// Enter a critical section, masking interrupts
///
/// Nestable: each `enter_critical` must be balanced by one `exit_critical`.
pub fn enter_critical() {
    port::lock_interrupts();
    NESTING.fetch_add(1, Ordering::SeqCst);
}

/// Exit a critical section, unmasking interrupts on the outermost exit
///
/// Calling this without a matching `enter_critical` is a caller bug; the
/// runtime performs no recovery.
pub fn exit_critical() {
    let level = NESTING.fetch_sub(1, Ordering::SeqCst);
    debug_assert!(level != 0, "unbalanced exit_critical");
    if level == 1 {
        port::unlock_interrupts();
    }
}

/// ISR entry bracket
///
/// Any runtime API call issued from an interrupt handler must be bracketed
/// by `enter_isr`/`exit_isr`, which count as one extra nesting level.
#[inline]
pub fn enter_isr() {
    enter_critical();
}

/// ISR exit bracket
#[inline]
pub fn exit_isr() {
    exit_critical();
}

/// RAII handle for a critical section
///
/// Enters the gate on construction and exits it on drop, so early returns
/// cannot leave interrupts masked.
pub struct CriticalGuard {
    _not_send: core::marker::PhantomData<*mut ()>,
}

impl CriticalGuard {
    pub fn new() -> Self {
        enter_critical();
        CriticalGuard {
            _not_send: core::marker::PhantomData,
        }
    }
}

impl Default for CriticalGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CriticalGuard {
    fn drop(&mut self) {
        exit_critical();
    }
}

/// A typed lock that wraps interrupt masking around its data
///
/// `lock()` enters the critical section and returns a guard with mutable
/// access; dropping the guard exits the section. This is the structured
/// form of the gate used for the process and timer tables.
///
/// # Safety
/// Exclusion relies on the single-core model: while interrupts are masked
/// nothing else can run, so the mutable access cannot alias. Holders must
/// not call back into code that takes the same lock while a guard is alive.
pub struct IrqLock<T> {
    data: UnsafeCell<T>,
}

/// A guard that provides mutable access to data protected by an IrqLock
pub struct IrqLockGuard<'a, T> {
    lock: &'a IrqLock<T>,
    _crit: CriticalGuard,
}

// Safety: access only happens through lock(), inside the critical section,
// on the single CPU this runtime targets.
unsafe impl<T: Send> Sync for IrqLock<T> {}
unsafe impl<T: Send> Send for IrqLock<T> {}

impl<T> IrqLock<T> {
    /// Creates a new lock wrapping the supplied data
    pub const fn new(data: T) -> Self {
        IrqLock {
            data: UnsafeCell::new(data),
        }
    }

    /// Acquires the lock, masking interrupts until the guard is dropped
    pub fn lock(&self) -> IrqLockGuard<'_, T> {
        let crit = CriticalGuard::new();
        IrqLockGuard {
            lock: self,
            _crit: crit,
        }
    }

    /// Consumes the lock and returns the underlying data
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

impl<T> Deref for IrqLockGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> DerefMut for IrqLockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.lock.data.get() }
    }
}
