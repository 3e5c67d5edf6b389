//! Real-time rate guard for the composition surface.
//!
//! The one enforcing component: paste never inserts text (handled upstream by
//! the controller), and bursts of inhumanly fast insertions trip a hard
//! cooldown. Three consecutive growing edits each under 80 ms apart targets
//! scripted key-event injection while leaving fast human bursts alone - a
//! single quick pair of characters is common, three in a row under 80 ms each
//! is not.

use crate::clock::{Countdown, SharedClock};
use chrono::{DateTime, Duration, Utc};

/// An insertion faster than this counts toward the fast-keystroke strike.
pub const FAST_KEYSTROKE_THRESHOLD_MS: i64 = 80;
/// Consecutive fast insertions that trigger a cooldown.
pub const FAST_KEYSTROKE_LIMIT: u32 = 3;
/// Length of the hard cooldown.
pub const COOLDOWN_SECS: i64 = 2;

/// Outcome of offering one content edit to the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditVerdict {
    /// Edit may be applied to the draft.
    Accepted,
    /// This edit tripped the fast-typing limit: it is dropped and a cooldown
    /// has begun.
    CooldownTriggered,
    /// A cooldown is in progress; the edit is dropped.
    CooldownActive,
}

impl EditVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, EditVerdict::Accepted)
    }
}

/// Session-scoped guard state. Private counters; the outside world only sees
/// verdicts and the cooldown flag.
pub struct RateGuard {
    clock: SharedClock,
    consecutive_fast: u32,
    last_edit_at: Option<DateTime<Utc>>,
    /// Length of the last accepted content, for insertion-vs-deletion checks.
    accepted_len: usize,
    cooldown: Countdown,
}

impl RateGuard {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            clock,
            consecutive_fast: 0,
            last_edit_at: None,
            accepted_len: 0,
            cooldown: Countdown::new(),
        }
    }

    /// Offer a content edit with the proposed new length.
    ///
    /// Keystroke ordering matters: the delta heuristic only means anything if
    /// edits arrive in input order, which the host guarantees.
    pub fn on_edit(&mut self, proposed_len: usize) -> EditVerdict {
        let now = self.clock.now();
        self.cooldown.poll(now);

        if self.cooldown.is_active(now) {
            // Hard block: every edit is rejected until the timer fires. The
            // timestamp still advances so the delta heuristic stays honest.
            self.last_edit_at = Some(now);
            return EditVerdict::CooldownActive;
        }

        let delta_ms = self
            .last_edit_at
            .map(|at| (now - at).num_milliseconds())
            .unwrap_or(i64::MAX);
        self.last_edit_at = Some(now);

        let grew = proposed_len > self.accepted_len;
        if delta_ms < FAST_KEYSTROKE_THRESHOLD_MS && grew {
            self.consecutive_fast += 1;
            if self.consecutive_fast >= FAST_KEYSTROKE_LIMIT {
                self.consecutive_fast = 0;
                self.cooldown.arm(now, Duration::seconds(COOLDOWN_SECS));
                return EditVerdict::CooldownTriggered;
            }
        } else {
            self.consecutive_fast = 0;
        }

        self.accepted_len = proposed_len;
        EditVerdict::Accepted
    }

    /// Whether a cooldown is currently in force.
    pub fn is_cooldown_active(&self) -> bool {
        self.cooldown.is_active(self.clock.now())
    }

    /// Clear all guard state, including any pending cooldown. Idempotent.
    pub fn reset(&mut self) {
        self.consecutive_fast = 0;
        self.last_edit_at = None;
        self.accepted_len = 0;
        self.cooldown.cancel();
    }
}
