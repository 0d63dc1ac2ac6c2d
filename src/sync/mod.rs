/// Synchronization primitives for the runtime core
/// The only exclusion mechanism is the interrupt-masking critical-section
/// gate; everything that mutates shared state goes through it.

mod critical;

pub use critical::{
    enter_critical, enter_isr, exit_critical, exit_isr, CriticalGuard, IrqLock, IrqLockGuard,
};
