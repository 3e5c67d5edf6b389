//! Review material for the moderation queue.
//!
//! Builds a human-readable analysis of a stored metrics record. The trust
//! classification is recomputed here on every build - it is never cached or
//! persisted, so a policy change reclassifies historical submissions too.

use crate::core::metadata::{format_time, WritingMetadata};
use crate::core::trust::{evaluate, TrustReport};
use serde::Serialize;

/// Paste attempts above this count get called out prominently.
const PASTE_ATTENTION_THRESHOLD: u32 = 2;

/// Flags a moderator should look at before deciding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReviewWarning {
    /// Any intercepted pastes; `prominent` when attempts exceed the
    /// attention threshold.
    PasteAttempts {
        attempts: u32,
        characters: u64,
        prominent: bool,
    },
    /// No measurable composition time - the record may predate tracking.
    NoTimingData,
}

/// Everything the moderation screen shows for one submission.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewCard {
    pub trust: TrustReport,
    pub time_display: String,
    pub total_keystrokes: u64,
    pub paste_attempts: u32,
    pub paste_character_count: u64,
    pub avg_words_per_minute: u32,
    pub session_breaks: u32,
    pub warnings: Vec<ReviewWarning>,
}

impl ReviewCard {
    /// Build a review card from a stored metrics record.
    pub fn from_metadata(metrics: &WritingMetadata) -> Self {
        let trust = evaluate(metrics);

        let mut warnings = Vec::new();
        if metrics.paste_attempts > 0 {
            warnings.push(ReviewWarning::PasteAttempts {
                attempts: metrics.paste_attempts,
                characters: metrics.paste_character_count,
                prominent: metrics.paste_attempts > PASTE_ATTENTION_THRESHOLD,
            });
        }
        if metrics.time_spent_seconds == 0 && metrics.total_keystrokes == 0 {
            warnings.push(ReviewWarning::NoTimingData);
        }

        Self {
            trust,
            time_display: format_time(metrics.time_spent_seconds),
            total_keystrokes: metrics.total_keystrokes,
            paste_attempts: metrics.paste_attempts,
            paste_character_count: metrics.paste_character_count,
            avg_words_per_minute: metrics.avg_words_per_minute,
            session_breaks: metrics.session_breaks,
            warnings,
        }
    }

    /// Plain-text rendering for the CLI review command.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str("Writing Analysis\n");
        out.push_str(&format!(
            "  Trust: {} (score {}/10)\n",
            self.trust.level.badge(),
            self.trust.score
        ));
        out.push_str(&format!(
            "  Signals: time {} | paste {} | backspace {} | speed {}\n",
            self.trust.signals.time,
            self.trust.signals.paste,
            self.trust.signals.backspace,
            self.trust.signals.speed
        ));
        out.push_str(&format!("  Time: {}\n", self.time_display));
        out.push_str(&format!("  Keystrokes: {}\n", self.total_keystrokes));
        out.push_str(&format!("  Paste attempts: {}\n", self.paste_attempts));
        let wpm = if self.avg_words_per_minute > 0 {
            self.avg_words_per_minute.to_string()
        } else {
            "-".to_string()
        };
        out.push_str(&format!("  WPM: {wpm}\n"));
        out.push_str(&format!("  Session breaks: {}\n", self.session_breaks));

        for warning in &self.warnings {
            match warning {
                ReviewWarning::PasteAttempts {
                    characters,
                    prominent,
                    ..
                } => {
                    let marker = if *prominent { "!!" } else { "!" };
                    out.push_str(&format!(
                        "  {marker} {characters} characters were attempted to be pasted\n"
                    ));
                }
                ReviewWarning::NoTimingData => {
                    out.push_str("  ! No timing data recorded for this submission\n");
                }
            }
        }
        out
    }
}
