//! Injected clock and deadline-based timers.
//!
//! All time-dependent behavior in this crate (the 1-second elapsed-time tick,
//! the 2-second typing cooldown) is driven by a [`Clock`] supplied by the
//! host. Timers are deadlines checked on poll, not scheduled callbacks, so a
//! test or a session replay can drive them with a [`ManualClock`] and no
//! wall-clock delay.

use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex};

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Shared clock handle passed to every time-dependent component.
pub type SharedClock = Arc<dyn Clock>;

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Create a shared system clock.
pub fn system_clock() -> SharedClock {
    Arc::new(SystemClock)
}

/// A clock advanced explicitly by the caller.
///
/// Used by session replay (event timestamps drive the clock) and by tests.
/// Never moves backwards: [`ManualClock::advance_to`] ignores earlier
/// timestamps so out-of-order input cannot produce negative deltas.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Move the clock forward by `delta`.
    pub fn advance(&self, delta: Duration) {
        let mut now = self.now.lock().expect("clock lock poisoned");
        *now += delta;
    }

    /// Move the clock forward to `instant`, ignoring earlier timestamps.
    pub fn advance_to(&self, instant: DateTime<Utc>) {
        let mut now = self.now.lock().expect("clock lock poisoned");
        if instant > *now {
            *now = instant;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock poisoned")
    }
}

/// A recurring deadline with a fixed period.
///
/// Fires when polled at or past its next deadline, then advances the deadline
/// past the poll instant (always re-anchored, so a late poll does not cause a
/// burst of catch-up fires). Cancelling an already-cancelled ticker is a no-op.
#[derive(Debug)]
pub struct Ticker {
    period: Duration,
    next_fire: Option<DateTime<Utc>>,
}

impl Ticker {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next_fire: None,
        }
    }

    /// Arm the ticker. No-op if already running.
    pub fn start(&mut self, now: DateTime<Utc>) {
        if self.next_fire.is_none() {
            self.next_fire = Some(now + self.period);
        }
    }

    /// Disarm the ticker. Idempotent.
    pub fn cancel(&mut self) {
        self.next_fire = None;
    }

    pub fn is_running(&self) -> bool {
        self.next_fire.is_some()
    }

    /// Returns true if the ticker fired at `now`.
    pub fn poll(&mut self, now: DateTime<Utc>) -> bool {
        match self.next_fire {
            Some(deadline) if now >= deadline => {
                let mut next = deadline + self.period;
                while next <= now {
                    next += self.period;
                }
                self.next_fire = Some(next);
                true
            }
            _ => false,
        }
    }
}

/// A one-shot deadline.
///
/// Arms with a duration, expires lazily when polled past the deadline.
/// Cancelling when not armed is a no-op.
#[derive(Debug, Default)]
pub struct Countdown {
    deadline: Option<DateTime<Utc>>,
}

impl Countdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the countdown to expire after `duration`. Re-arming replaces the
    /// previous deadline.
    pub fn arm(&mut self, now: DateTime<Utc>, duration: Duration) {
        self.deadline = Some(now + duration);
    }

    /// Disarm the countdown. Idempotent.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Whether the countdown is armed and its deadline has not yet passed.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        matches!(self.deadline, Some(deadline) if now < deadline)
    }

    /// Returns true exactly once when polled at or past the deadline, and
    /// clears it.
    pub fn poll(&mut self, now: DateTime<Utc>) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        "2025-03-01T12:00:00Z".parse().expect("valid timestamp")
    }

    #[test]
    fn test_manual_clock_never_goes_backwards() {
        let clock = ManualClock::new(t0());
        clock.advance_to(t0() + Duration::seconds(5));
        clock.advance_to(t0() + Duration::seconds(2));
        assert_eq!(clock.now(), t0() + Duration::seconds(5));
    }

    #[test]
    fn test_ticker_fires_once_per_period() {
        let mut ticker = Ticker::new(Duration::seconds(1));
        ticker.start(t0());

        assert!(!ticker.poll(t0() + Duration::milliseconds(500)));
        assert!(ticker.poll(t0() + Duration::seconds(1)));
        assert!(!ticker.poll(t0() + Duration::milliseconds(1500)));
        assert!(ticker.poll(t0() + Duration::seconds(2)));
    }

    #[test]
    fn test_ticker_late_poll_fires_once() {
        let mut ticker = Ticker::new(Duration::seconds(1));
        ticker.start(t0());

        // 5 seconds late: one fire, deadline re-anchored past now
        assert!(ticker.poll(t0() + Duration::seconds(5)));
        assert!(!ticker.poll(t0() + Duration::milliseconds(5500)));
        assert!(ticker.poll(t0() + Duration::seconds(6)));
    }

    #[test]
    fn test_ticker_cancel_idempotent() {
        let mut ticker = Ticker::new(Duration::seconds(1));
        ticker.start(t0());
        ticker.cancel();
        ticker.cancel();
        assert!(!ticker.is_running());
        assert!(!ticker.poll(t0() + Duration::seconds(10)));
    }

    #[test]
    fn test_countdown_expires_once() {
        let mut countdown = Countdown::new();
        countdown.arm(t0(), Duration::seconds(2));

        assert!(countdown.is_active(t0() + Duration::seconds(1)));
        assert!(!countdown.poll(t0() + Duration::seconds(1)));
        assert!(countdown.poll(t0() + Duration::seconds(2)));
        assert!(!countdown.poll(t0() + Duration::seconds(3)));
        assert!(!countdown.is_active(t0() + Duration::seconds(3)));
    }

    #[test]
    fn test_countdown_cancel_idempotent() {
        let mut countdown = Countdown::new();
        countdown.cancel();
        countdown.arm(t0(), Duration::seconds(2));
        countdown.cancel();
        countdown.cancel();
        assert!(!countdown.is_active(t0() + Duration::seconds(1)));
    }
}
