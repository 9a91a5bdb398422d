use log::{debug, warn};
use std::time::{Duration, Instant};

/// Proof of a particular arming of an [`IntervalTimer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle {
    generation: u64,
}

impl TimerHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, Copy)]
struct Armed {
    handle: TimerHandle,
    next_due: Instant,
}

/// Periodic timer with a single slot.
///
/// Polled with explicit instants instead of sleeping, so the event loop stays
/// in control of time and tests can step it deterministically.
#[derive(Debug)]
pub struct IntervalTimer {
    period: Duration,
    slot: Option<Armed>,
    next_generation: u64,
}

impl IntervalTimer {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            slot: None,
            next_generation: 0,
        }
    }

    /// Change the period; applies from the next `arm`
    pub fn set_period(&mut self, period: Duration) {
        self.period = period;
    }

    pub fn is_armed(&self) -> bool {
        self.slot.is_some()
    }

    /// Handle of the live arming, if any
    pub fn handle(&self) -> Option<TimerHandle> {
        self.slot.map(|a| a.handle)
    }

    /// Start firing every period, first at `now + period`.
    /// Replaces any previous arming.
    pub fn arm(&mut self, now: Instant) -> TimerHandle {
        if let Some(old) = self.slot.take() {
            warn!(
                "timer re-armed while generation {} was live; replacing it",
                old.handle.generation
            );
        }
        let handle = TimerHandle {
            generation: self.next_generation,
        };
        self.next_generation += 1;
        self.slot = Some(Armed {
            handle,
            next_due: now + self.period,
        });
        debug!("timer armed (generation {}, period {:?})", handle.generation, self.period);
        handle
    }

    /// Disarm, returning the handle that was live
    pub fn cancel(&mut self) -> Option<TimerHandle> {
        let old = self.slot.take().map(|a| a.handle);
        if let Some(h) = old {
            debug!("timer cancelled (generation {})", h.generation);
        }
        old
    }

    /// Fire at most once if a deadline has passed.
    ///
    /// Missed periods are skipped: the next deadline is the first one after
    /// `now`.
    pub fn poll(&mut self, now: Instant) -> Option<TimerHandle> {
        let period = self.period;
        let armed = self.slot.as_mut()?;
        if now < armed.next_due {
            return None;
        }
        armed.next_due += period;
        if armed.next_due <= now {
            armed.next_due = now + period;
        }
        Some(armed.handle)
    }

    /// Time left before the next fire, zero if overdue
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.slot.map(|a| a.next_due.saturating_duration_since(now))
    }
}
