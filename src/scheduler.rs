//! Fixed-rate tick scheduler.
//!
//! Drives the sync loop at a fixed period.  The scheduler notifies a
//! [`TickDelegate`] when a tick is due; the main loop implements the
//! delegate to run one `SyncService::tick`.
//!
//! ```text
//!  t=0     t=P     t=2P    t=3P    t=4P
//!   │───────│───────│───────│───────│
//!   tick    tick    ╰─ long tick ───╯ tick
//!                   (3P slot skipped, counted as overrun)
//! ```
//!
//! Ticks never overlap and never queue up: when a tick runs past one or
//! more slots, those slots are dropped and the next tick lands on the
//! following slot boundary.

use log::{debug, warn};

use crate::app::ports::{Clock, TickDelegate};

pub struct TickScheduler {
    period_ms: u32,
    /// Next slot boundary; `None` until the first poll.
    next_due_ms: Option<u64>,
    ticks: u64,
    overruns: u64,
}

impl TickScheduler {
    /// A zero period is treated as 1 ms.
    pub fn new(period_ms: u32) -> Self {
        Self {
            period_ms: period_ms.max(1),
            next_due_ms: None,
            ticks: 0,
            overruns: 0,
        }
    }

    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }

    /// Ticks executed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Slots dropped because a tick ran late.
    pub fn overruns(&self) -> u64 {
        self.overruns
    }

    /// Milliseconds until the next tick is due (`0` if due now).
    pub fn time_until_due(&self, now_ms: u64) -> u64 {
        self.next_due_ms.map_or(0, |due| due.saturating_sub(now_ms))
    }

    /// Run the delegate if a tick is due at `now_ms`.  Returns whether it ran.
    pub fn poll(&mut self, now_ms: u64, delegate: &mut dyn TickDelegate) -> bool {
        let due = *self.next_due_ms.get_or_insert(now_ms);
        if now_ms < due {
            return false;
        }

        let period = self.period_ms as u64;
        let missed = (now_ms - due) / period;
        if missed > 0 {
            self.overruns += missed;
            warn!("Scheduler: {} slot(s) skipped ({} ms late)", missed, now_ms - due);
        }
        self.next_due_ms = Some(due + (missed + 1) * period);

        delegate.on_tick(now_ms);
        self.ticks += 1;
        true
    }

    /// Run until `count` more ticks have executed, sleeping between slots.
    pub fn run_for(&mut self, clock: &mut impl Clock, delegate: &mut dyn TickDelegate, count: u64) {
        let target = self.ticks + count;
        while self.ticks < target {
            self.step(clock, delegate);
        }
    }

    /// Run forever.
    pub fn run(&mut self, clock: &mut impl Clock, delegate: &mut dyn TickDelegate) -> ! {
        debug!("Scheduler: running every {} ms", self.period_ms);
        loop {
            self.step(clock, delegate);
        }
    }

    fn step(&mut self, clock: &mut impl Clock, delegate: &mut dyn TickDelegate) {
        let now = clock.now_ms();
        if !self.poll(now, delegate) {
            let wait = self.time_until_due(now).min(u32::MAX as u64) as u32;
            clock.sleep_ms(wait);
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
