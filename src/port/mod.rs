//! Platform Port Layer
//!
//! The runtime core is platform-neutral apart from two operations it needs
//! the platform to supply: masking and unmasking interrupts. This module
//! selects an implementation per target:
//!
//! - x86_64 bare metal: `cli`/`sti` through the `x86_64` crate
//! - hosted targets (tests, demos): bookkeeping only, with the mask state
//!   observable so tests can check the critical-section gate
//!
//! Porting to another bare-metal target means adding a branch here with the
//! target's interrupt lock/unlock instructions.

cfg_if::cfg_if! {
    if #[cfg(all(target_arch = "x86_64", target_os = "none"))] {
        mod x86_64;
        use self::x86_64 as imp;
    } else if #[cfg(not(target_os = "none"))] {
        pub mod hosted;
        use self::hosted as imp;
    } else {
        compile_error!("no interrupt port for this target; add one to src/port/");
    }
}

/// Mask interrupts. Masking when already masked is a no-op.
#[inline]
pub(crate) fn lock_interrupts() {
    imp::lock_interrupts();
}

/// Unmask interrupts.
#[inline]
pub(crate) fn unlock_interrupts() {
    imp::unlock_interrupts();
}
