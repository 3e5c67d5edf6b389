//! Trust classification derived from a writing-metrics snapshot.
//!
//! Pure and deterministic: four independent signals scored additively, the
//! sum mapped to a three-tier classification. The thresholds are moderation
//! policy constants; changing them changes what moderators see, so they are
//! not configurable.

use crate::core::metadata::WritingMetadata;
use serde::{Deserialize, Serialize};

/// Minimum total score for a `high` classification.
const HIGH_SCORE_THRESHOLD: u8 = 8;
/// Minimum total score for a `medium` classification.
const MEDIUM_SCORE_THRESHOLD: u8 = 4;

/// Three-tier trust classification shown to moderators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustLevel {
    High,
    Medium,
    Low,
}

impl TrustLevel {
    /// Badge label used in the review UI.
    pub fn badge(&self) -> &'static str {
        match self {
            TrustLevel::High => "HIGH TRUST",
            TrustLevel::Medium => "MEDIUM",
            TrustLevel::Low => "LOW TRUST",
        }
    }
}

impl std::fmt::Display for TrustLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrustLevel::High => write!(f, "high"),
            TrustLevel::Medium => write!(f, "medium"),
            TrustLevel::Low => write!(f, "low"),
        }
    }
}

/// Per-signal point breakdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustSignals {
    /// Composition time: 3 points at >= 5 min, 2 at >= 2, 1 at >= 1.
    pub time: u8,
    /// Paste-to-keystroke ratio: 3 points below 0.10, 2 below 0.30, 1 below 0.50.
    pub paste: u8,
    /// Backspace ratio: 2 points strictly inside (0.05, 0.30), 1 above 0.01.
    pub backspace: u8,
    /// Typing speed: 2 points in [20, 60] wpm, 1 elsewhere inside (0, 100).
    pub speed: u8,
}

impl TrustSignals {
    pub fn total(&self) -> u8 {
        self.time + self.paste + self.backspace + self.speed
    }
}

/// Full scoring result: classification plus the evidence behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustReport {
    pub level: TrustLevel,
    pub score: u8,
    pub signals: TrustSignals,
}

/// Score a metrics snapshot.
///
/// Never panics and never divides by zero: ratio denominators are floored
/// at one keystroke. A snapshot with no keystrokes scores `low`.
pub fn evaluate(metrics: &WritingMetadata) -> TrustReport {
    let keystrokes = metrics.total_keystrokes.max(1) as f64;

    let minutes = f64::from(metrics.time_spent_seconds) / 60.0;
    let time = if minutes >= 5.0 {
        3
    } else if minutes >= 2.0 {
        2
    } else if minutes >= 1.0 {
        1
    } else {
        0
    };

    let paste_ratio = metrics.paste_character_count as f64 / keystrokes;
    let paste = if paste_ratio < 0.1 {
        3
    } else if paste_ratio < 0.3 {
        2
    } else if paste_ratio < 0.5 {
        1
    } else {
        0
    };

    // Some editing is expected of genuine writing: zero backspaces earns
    // nothing, healthy revision earns the most.
    let backspace_ratio = metrics.backspace_count as f64 / keystrokes;
    let backspace = if backspace_ratio > 0.05 && backspace_ratio < 0.3 {
        2
    } else if backspace_ratio > 0.01 {
        1
    } else {
        0
    };

    let wpm = metrics.avg_words_per_minute;
    let speed = if (20..=60).contains(&wpm) {
        2
    } else if wpm > 0 && wpm < 100 {
        1
    } else {
        0
    };

    let signals = TrustSignals {
        time,
        paste,
        backspace,
        speed,
    };
    let score = signals.total();
    let level = if score >= HIGH_SCORE_THRESHOLD {
        TrustLevel::High
    } else if score >= MEDIUM_SCORE_THRESHOLD {
        TrustLevel::Medium
    } else {
        TrustLevel::Low
    };

    TrustReport {
        level,
        score,
        signals,
    }
}

/// Classification only, for callers that do not need the breakdown.
pub fn trust_level(metrics: &WritingMetadata) -> TrustLevel {
    evaluate(metrics).level
}
