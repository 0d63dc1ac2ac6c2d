//! Delta-Queue Software Timers
//!
//! Software timers are kept in an array whose active tail is sorted by
//! absolute expiration but stored as relative deltas: slot k holds the
//! number of ticks between slot k-1's expiration and its own. The tick
//! routine then does constant work per tick in the common case: decrement
//! the head delta, and publish the head (plus any zero-delta run behind it)
//! when it reaches zero.
//!
//! Published timers are moved to the expiry queue by advancing
//! `active_index`; the array entries stay behind as an "expired" region
//! until `delete_timer` compacts them, so a handler can still refresh its
//! own timer after it fired. Handlers run in the cooperative scheduler's
//! context, inside an internal dispatch process registered by
//! `Runtime::init` at the reserved timer pid, never in the ISR.
//!
//! Install and delete are O(N) block-shifts, which is acceptable for the
//! small fixed capacities this runtime targets.

use crate::config;
use crate::log_debug;
use crate::sched::Runtime;
use crate::sched::process::Process;

/// Timer identifier
///
/// Chosen by the application; unique among installed timers, which
/// installation enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerId(pub u8);

/// Tick count, relative to "now" at the call site
pub type Ticks = u32;

/// A timeout callback
///
/// Implementors carry their own state. The handler receives the runtime so
/// it can re-arm itself; a handler that calls
/// [`refresh_timer`](Runtime::refresh_timer) on its own ID becomes
/// periodic.
pub trait TimeoutHandler: Sync {
    fn on_timeout(&self, rt: &Runtime, timer: TimerId);
}

/// Timer error types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerError {
    /// Timer table is full (maximum timers installed)
    TableFull,
    /// A timer with this ID is already installed
    DuplicateTimerId,
    /// No timer with this ID is installed
    UnknownTimer,
    /// A timeout of zero ticks is not representable
    ZeroTicks,
}

/// Result type for timer operations
pub type TimerResult<T> = Result<T, TimerError>;

/// One installed software timer
#[derive(Clone, Copy)]
struct SwTimer {
    /// The timeout callback object
    handler: &'static dyn TimeoutHandler,

    /// Timer ID
    id: TimerId,

    /// Ticks after the previous active timer's expiration (or after "now"
    /// for the head pending timer)
    ticks: Ticks,
}

/// A timer published to the expiry queue
///
/// A copy of the record at publish time; deleting the timer afterwards does
/// not retract it.
#[derive(Clone, Copy)]
pub(crate) struct ExpiredTimer {
    pub handler: &'static dyn TimeoutHandler,
    pub id: TimerId,
}

/// Timer array plus the expired/pending boundary
pub(crate) struct TimerTable {
    /// Installed timers; the pending region `[active_index, num_timers)`
    /// is sorted by absolute expiration, ties in insertion order
    timers: [Option<SwTimer>; config::MAX_SOFT_TIMERS],

    /// Number of installed timers, expired region included
    num_timers: usize,

    /// Boundary between published entries (below) and pending ones
    active_index: usize,
}

impl TimerTable {
    pub(crate) const fn new() -> Self {
        Self {
            timers: [None; config::MAX_SOFT_TIMERS],
            num_timers: 0,
            active_index: 0,
        }
    }

    fn find(&self, id: TimerId) -> Option<usize> {
        (0..self.num_timers).find(|&n| matches!(&self.timers[n], Some(t) if t.id == id))
    }
}

/// Internal process that drains the expiry queue and invokes handlers
///
/// Registered by `Runtime::init` at [`config::TIMER_PROCESS_PID`]; being an
/// ordinary process, dispatch happens in round-robin turn with everything
/// else.
pub(crate) struct ExpiryDispatch;

pub(crate) static EXPIRY_DISPATCH: ExpiryDispatch = ExpiryDispatch;

impl Process for ExpiryDispatch {
    fn run(&self, rt: &Runtime) {
        while let Some(expired) = rt.expiry.pop() {
            rt.metrics.inc_timer_dispatches();
            expired.handler.on_timeout(rt, expired.id);
        }
    }
}

impl Runtime {
    /// Installs a timeout handler to fire after `ticks` ticks
    ///
    /// The timer is placed in the pending region so that absolute
    /// expirations stay ascending; a timer expiring at the same tick as an
    /// existing one fires after it.
    ///
    /// # Errors
    /// `TableFull`, `DuplicateTimerId`, or `ZeroTicks`.
    pub fn install_timeout_handler(
        &self,
        handler: &'static dyn TimeoutHandler,
        timer_id: TimerId,
        ticks: Ticks,
    ) -> TimerResult<()> {
        if ticks == 0 {
            return Err(TimerError::ZeroTicks);
        }

        {
            let mut guard = self.timers.lock();
            let tbl = &mut *guard;

            if tbl.num_timers == tbl.timers.len() {
                return Err(TimerError::TableFull);
            }
            if tbl.find(timer_id).is_some() {
                return Err(TimerError::DuplicateTimerId);
            }

            // Walk the pending region accumulating deltas; the new timer
            // goes in front of the first timer whose cumulative expiration
            // exceeds `ticks`, or after the last pending one. When the
            // pending region is empty this appends after the expired
            // region, leaving published entries untouched.
            let mut insert = tbl.num_timers;
            let mut sum_before: Ticks = 0;
            for n in tbl.active_index..tbl.num_timers {
                let delta = match &tbl.timers[n] {
                    Some(t) => t.ticks,
                    None => break,
                };
                if sum_before.saturating_add(delta) > ticks {
                    insert = n;
                    break;
                }
                sum_before += delta;
            }

            // Shift entries at and after the insertion point one slot up
            let mut n = tbl.num_timers;
            while n > insert {
                tbl.timers[n] = tbl.timers[n - 1];
                n -= 1;
            }

            // The new delta is relative to everything expiring before the
            // new timer; the successor gives up that much to keep its own
            // absolute expiration unchanged
            let new_delta = ticks - sum_before;
            tbl.timers[insert] = Some(SwTimer {
                handler,
                id: timer_id,
                ticks: new_delta,
            });
            tbl.num_timers += 1;

            if insert + 1 < tbl.num_timers {
                if let Some(next) = tbl.timers[insert + 1].as_mut() {
                    next.ticks -= new_delta;
                }
            }
        }

        log_debug!("TIMER", "installed timer id={} for {} ticks", timer_id.0, ticks);
        Ok(())
    }

    /// Re-arms an installed timer for `ticks` from now
    ///
    /// Equivalent to deleting and re-installing it; the handler associated
    /// with the ID is preserved.
    ///
    /// # Errors
    /// `UnknownTimer` or `ZeroTicks`.
    pub fn refresh_timer(&self, timer_id: TimerId, ticks: Ticks) -> TimerResult<()> {
        if ticks == 0 {
            return Err(TimerError::ZeroTicks);
        }

        let handler = {
            let guard = self.timers.lock();
            let tbl = &*guard;
            match tbl.find(timer_id).and_then(|n| tbl.timers[n].as_ref()) {
                Some(timer) => timer.handler,
                None => return Err(TimerError::UnknownTimer),
            }
        };

        self.delete_timer(timer_id)?;
        self.install_timeout_handler(handler, timer_id, ticks)
    }

    /// Deletes an installed timer
    ///
    /// A pending successor absorbs the deleted timer's delta so its own
    /// absolute expiration is unchanged; entries behind the deleted slot
    /// shift down one. Deleting an already-published timer adjusts the
    /// expired/pending boundary but does not retract the queued expiry.
    ///
    /// # Errors
    /// `UnknownTimer`.
    pub fn delete_timer(&self, timer_id: TimerId) -> TimerResult<()> {
        {
            let mut guard = self.timers.lock();
            let tbl = &mut *guard;

            if tbl.num_timers == 0 {
                return Err(TimerError::UnknownTimer);
            }
            let n = tbl.find(timer_id).ok_or(TimerError::UnknownTimer)?;

            if n + 1 == tbl.num_timers {
                // Last installed slot: nothing after it to adjust
                tbl.timers[n] = None;
                tbl.num_timers -= 1;
            } else {
                let deleted_ticks = match &tbl.timers[n] {
                    Some(t) => t.ticks,
                    None => 0,
                };
                if let Some(next) = tbl.timers[n + 1].as_mut() {
                    next.ticks += deleted_ticks;
                }
                tbl.num_timers -= 1;
                for i in n..tbl.num_timers {
                    tbl.timers[i] = tbl.timers[i + 1];
                }
                tbl.timers[tbl.num_timers] = None;
            }

            if n < tbl.active_index {
                tbl.active_index -= 1;
            }
        }

        log_debug!("TIMER", "deleted timer id={}", timer_id.0);
        Ok(())
    }

    /// Advances the timer subsystem by one tick
    ///
    /// Call once per host tick, from the timer ISR (inside
    /// `enter_isr`/`exit_isr`). Decrements the head pending timer's delta;
    /// when it reaches zero, the head and every zero-delta timer behind it
    /// (same expiration) are published to the expiry queue for the dispatch
    /// process to drain. If the expiry queue is full the expiration is
    /// dropped and counted in the metrics.
    pub fn timer_tick(&self) {
        self.metrics.inc_ticks();

        let mut guard = self.timers.lock();
        let tbl = &mut *guard;

        // Every installed timer has already been published
        if tbl.active_index == tbl.num_timers {
            return;
        }

        match tbl.timers[tbl.active_index].as_mut() {
            Some(head) => {
                head.ticks -= 1;
                if head.ticks != 0 {
                    return;
                }
            }
            None => return,
        }

        while tbl.active_index < tbl.num_timers {
            let timer = match &tbl.timers[tbl.active_index] {
                Some(t) => *t,
                None => break,
            };
            if timer.ticks != 0 {
                break;
            }
            tbl.active_index += 1;
            if self.expiry.push(ExpiredTimer {
                handler: timer.handler,
                id: timer.id,
            }) {
                self.metrics.inc_timers_expired();
            } else {
                self.metrics.inc_expiries_dropped();
            }
        }
    }

    /// Absolute ticks until the given timer expires
    ///
    /// The sum of pending deltas up to and including the timer's slot;
    /// `Some(0)` for a timer that has been published but not yet deleted,
    /// `None` for an unknown ID.
    pub fn remaining_ticks(&self, timer_id: TimerId) -> Option<Ticks> {
        let guard = self.timers.lock();
        let tbl = &*guard;
        let n = tbl.find(timer_id)?;
        if n < tbl.active_index {
            return Some(0);
        }
        let mut sum: Ticks = 0;
        for i in tbl.active_index..=n {
            if let Some(timer) = &tbl.timers[i] {
                sum = sum.saturating_add(timer.ticks);
            }
        }
        Some(sum)
    }

    /// Number of installed timers, including published-but-not-deleted ones
    pub fn installed_timers(&self) -> usize {
        self.timers.lock().num_timers
    }

    /// Number of timers still waiting to expire
    pub fn pending_timers(&self) -> usize {
        let tbl = self.timers.lock();
        tbl.num_timers - tbl.active_index
    }
}
