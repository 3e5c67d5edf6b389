//! Metrics accumulation for one composition session.
//!
//! The collector owns the `WritingMetadata` accumulator exclusively. It
//! starts lazily on the first keystroke (idle time before typing is never
//! counted) and derives elapsed time on a 1-second tick by recomputing from
//! the absolute start anchor, so timer delay never compounds into drift.

use crate::clock::{SharedClock, Ticker};
use crate::core::metadata::WritingMetadata;
use crate::events::KeyClass;
use chrono::{DateTime, Duration, Utc};

/// Period of the elapsed-time tick.
const TICK_PERIOD_SECS: i64 = 1;

/// Accumulates behavioral metrics between the first keystroke and finalize.
pub struct MetricsCollector {
    clock: SharedClock,
    metrics: WritingMetadata,
    started_at: Option<DateTime<Utc>>,
    tracking: bool,
    /// Set while the page is hidden during tracking; a later show completes
    /// one session break.
    hidden_since: Option<DateTime<Utc>>,
    ticker: Ticker,
}

impl MetricsCollector {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            clock,
            metrics: WritingMetadata::default(),
            started_at: None,
            tracking: false,
            hidden_since: None,
            ticker: Ticker::new(Duration::seconds(TICK_PERIOD_SECS)),
        }
    }

    /// Begin tracking. Idempotent: a second call while tracking is a no-op.
    pub fn start_tracking(&mut self) {
        if self.tracking {
            return;
        }
        let now = self.clock.now();
        self.started_at = Some(now);
        self.tracking = true;
        self.metrics.started_at = Some(now.to_rfc3339());
        self.ticker.start(now);
    }

    /// Record a key-down. Starts tracking implicitly on the first one.
    pub fn on_key_down(&mut self, key: KeyClass) {
        if !self.tracking {
            self.start_tracking();
        }
        self.metrics.total_keystrokes += 1;
        if key.is_backspace() {
            self.metrics.backspace_count += 1;
        }
    }

    /// Record an intercepted paste attempt. This is a record of attempts, not
    /// insertions - it fires whether or not the paste was blocked upstream.
    pub fn on_paste(&mut self, char_count: usize) {
        self.metrics.paste_attempts += 1;
        self.metrics.paste_character_count += char_count as u64;
    }

    /// Record a visibility transition. Only meaningful while tracking; a
    /// hide-then-hide or a show without a prior hide is a no-op.
    pub fn on_visibility_change(&mut self, hidden: bool) {
        if !self.tracking {
            return;
        }
        if hidden {
            if self.hidden_since.is_none() {
                self.hidden_since = Some(self.clock.now());
            }
        } else if self.hidden_since.take().is_some() {
            self.metrics.session_breaks += 1;
        }
    }

    /// Drive the elapsed-time tick. Hosts call this from their own scheduler
    /// (the editor once a second, replay after every event).
    pub fn poll(&mut self) {
        let now = self.clock.now();
        if self.tracking && self.ticker.poll(now) {
            self.metrics.time_spent_seconds = self.elapsed_seconds(now);
        }
    }

    /// Finalize the session: stop the tick, stamp completion, and compute
    /// words-per-minute from the caller-supplied word count.
    ///
    /// Counters are NOT reset - the caller inspects the snapshot first and
    /// resets explicitly.
    pub fn stop_tracking(&mut self, word_count: usize) -> WritingMetadata {
        let now = self.clock.now();
        self.tracking = false;
        self.ticker.cancel();

        if self.started_at.is_some() {
            self.metrics.time_spent_seconds = self.elapsed_seconds(now);
        }
        self.metrics.completed_at = Some(now.to_rfc3339());

        if self.metrics.time_spent_seconds > 0 && word_count > 0 {
            let minutes = f64::from(self.metrics.time_spent_seconds) / 60.0;
            self.metrics.avg_words_per_minute = (word_count as f64 / minutes).round() as u32;
        }

        self.metrics.clone()
    }

    /// Resume accumulation after a failed submission hand-off. The start
    /// anchor and all counters are preserved, so elapsed time keeps counting
    /// as if the submission never paused it.
    pub fn resume(&mut self) {
        if self.tracking || self.started_at.is_none() {
            return;
        }
        self.tracking = true;
        self.metrics.completed_at = None;
        self.ticker.start(self.clock.now());
    }

    /// Zero all counters and tear down timers. Safe to call at any point,
    /// whether or not the session was finalized, and idempotent.
    pub fn reset(&mut self) {
        self.metrics = WritingMetadata::default();
        self.started_at = None;
        self.tracking = false;
        self.hidden_since = None;
        self.ticker.cancel();
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    /// Live view of the accumulator (for the editor footer).
    pub fn metrics(&self) -> &WritingMetadata {
        &self.metrics
    }

    fn elapsed_seconds(&self, now: DateTime<Utc>) -> u32 {
        match self.started_at {
            Some(start) => ((now - start).num_milliseconds() / 1000).max(0) as u32,
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::sync::Arc;

    fn t0() -> DateTime<Utc> {
        "2025-03-01T12:00:00Z".parse().expect("valid timestamp")
    }

    fn collector() -> (Arc<ManualClock>, MetricsCollector) {
        let clock = Arc::new(ManualClock::new(t0()));
        let collector = MetricsCollector::new(clock.clone());
        (clock, collector)
    }

    #[test]
    fn test_lazy_start_on_first_keystroke() {
        let (clock, mut collector) = collector();

        // Idle time before typing never counts
        clock.advance(Duration::seconds(30));
        assert!(!collector.is_tracking());

        collector.on_key_down(KeyClass::Other);
        assert!(collector.is_tracking());
        assert_eq!(
            collector.metrics().started_at.as_deref(),
            Some("2025-03-01T12:00:30+00:00")
        );

        clock.advance(Duration::seconds(5));
        collector.poll();
        assert_eq!(collector.metrics().time_spent_seconds, 5);
    }

    #[test]
    fn test_start_tracking_idempotent() {
        let (clock, mut collector) = collector();
        collector.start_tracking();
        let anchor = collector.metrics().started_at.clone();

        clock.advance(Duration::seconds(10));
        collector.start_tracking();
        assert_eq!(collector.metrics().started_at, anchor);
    }

    #[test]
    fn test_backspace_subset_of_keystrokes() {
        let (_clock, mut collector) = collector();
        for i in 0..50u32 {
            let key = if i % 5 == 0 {
                KeyClass::Backspace
            } else {
                KeyClass::Other
            };
            collector.on_key_down(key);
        }
        let metrics = collector.metrics();
        assert_eq!(metrics.total_keystrokes, 50);
        assert_eq!(metrics.backspace_count, 10);
        assert!(metrics.backspace_count <= metrics.total_keystrokes);
    }

    #[test]
    fn test_paste_attempt_counting() {
        let (_clock, mut collector) = collector();
        collector.on_paste(500);
        assert_eq!(collector.metrics().paste_attempts, 1);
        assert_eq!(collector.metrics().paste_character_count, 500);

        collector.on_paste(120);
        assert_eq!(collector.metrics().paste_attempts, 2);
        assert_eq!(collector.metrics().paste_character_count, 620);
    }

    #[test]
    fn test_session_breaks_require_full_cycle() {
        let (clock, mut collector) = collector();

        // Not tracking yet: ignored
        collector.on_visibility_change(true);
        collector.on_visibility_change(false);
        assert_eq!(collector.metrics().session_breaks, 0);

        collector.on_key_down(KeyClass::Other);

        // Show without prior hide: no-op
        collector.on_visibility_change(false);
        assert_eq!(collector.metrics().session_breaks, 0);

        collector.on_visibility_change(true);
        clock.advance(Duration::seconds(3));
        // Hide-then-hide keeps the original pending timestamp
        collector.on_visibility_change(true);
        collector.on_visibility_change(false);
        assert_eq!(collector.metrics().session_breaks, 1);

        collector.on_visibility_change(true);
        collector.on_visibility_change(false);
        assert_eq!(collector.metrics().session_breaks, 2);
    }

    #[test]
    fn test_stop_computes_wpm_and_keeps_counters() {
        let (clock, mut collector) = collector();
        collector.on_key_down(KeyClass::Other);
        clock.advance(Duration::seconds(120));
        collector.poll();

        let metrics = collector.stop_tracking(70);
        assert_eq!(metrics.time_spent_seconds, 120);
        assert_eq!(metrics.avg_words_per_minute, 35);
        assert!(metrics.completed_at.is_some());
        assert!(!collector.is_tracking());

        // Snapshot survives until explicit reset
        assert_eq!(collector.metrics().total_keystrokes, 1);
    }

    #[test]
    fn test_stop_without_elapsed_time_skips_wpm() {
        let (_clock, mut collector) = collector();
        collector.on_key_down(KeyClass::Other);
        let metrics = collector.stop_tracking(100);
        assert_eq!(metrics.time_spent_seconds, 0);
        assert_eq!(metrics.avg_words_per_minute, 0);
    }

    #[test]
    fn test_stop_cancels_tick() {
        let (clock, mut collector) = collector();
        collector.on_key_down(KeyClass::Other);
        clock.advance(Duration::seconds(10));
        collector.poll();
        collector.stop_tracking(0);

        // A stale tick must not mutate the finalized snapshot
        clock.advance(Duration::seconds(60));
        collector.poll();
        assert_eq!(collector.metrics().time_spent_seconds, 10);
    }

    #[test]
    fn test_resume_preserves_anchor() {
        let (clock, mut collector) = collector();
        collector.on_key_down(KeyClass::Other);
        clock.advance(Duration::seconds(60));
        collector.poll();
        collector.stop_tracking(10);

        collector.resume();
        assert!(collector.is_tracking());
        clock.advance(Duration::seconds(30));
        collector.poll();
        // Elapsed time continues from the original anchor
        assert_eq!(collector.metrics().time_spent_seconds, 90);
    }

    #[test]
    fn test_reset_idempotent() {
        let (clock, mut collector) = collector();
        collector.on_key_down(KeyClass::Backspace);
        collector.on_paste(200);
        clock.advance(Duration::seconds(5));
        collector.poll();

        collector.reset();
        let once = collector.metrics().clone();
        collector.reset();
        assert_eq!(collector.metrics(), &once);
        assert_eq!(once, WritingMetadata::default());
        assert!(!collector.is_tracking());
    }
}
