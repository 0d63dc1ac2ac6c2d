//! Hosted interrupt-mask bookkeeping
//!
//! There are no interrupts to mask on a hosted target; this port records
//! what the gate asked for so tests can observe the mask window.

use core::sync::atomic::{AtomicBool, Ordering};

static MASKED: AtomicBool = AtomicBool::new(false);

#[inline]
pub(super) fn lock_interrupts() {
    MASKED.store(true, Ordering::SeqCst);
}

#[inline]
pub(super) fn unlock_interrupts() {
    MASKED.store(false, Ordering::SeqCst);
}

/// Whether the gate currently has interrupts masked
pub fn interrupts_masked() -> bool {
    MASKED.load(Ordering::SeqCst)
}
