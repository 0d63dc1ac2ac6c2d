//! x86_64 bare-metal interrupt masking

#[inline]
pub(super) fn lock_interrupts() {
    ::x86_64::instructions::interrupts::disable();
}

#[inline]
pub(super) fn unlock_interrupts() {
    ::x86_64::instructions::interrupts::enable();
}
