//! The persisted writing-metrics record and small text helpers.
//!
//! `WritingMetadata` is stored as an open-ended structured record attached to
//! a chapter. Historical rows may predate newer fields, so every field
//! defaults when missing and unknown keys are ignored on read.

use serde::{Deserialize, Serialize};

/// Behavioral fingerprint of how a chapter was authored.
///
/// Accumulated by the metrics collector during composition, frozen at
/// finalize, and attached to the chapter submission. Contains counters and
/// timestamps only - never the authored text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WritingMetadata {
    /// Seconds of active composition, derived from the session start anchor.
    #[serde(default)]
    pub time_spent_seconds: u32,
    /// Completed hide-then-show visibility cycles while tracking.
    #[serde(default)]
    pub session_breaks: u32,
    /// Intercepted paste attempts (none are ever inserted).
    #[serde(default)]
    pub paste_attempts: u32,
    /// Total characters across all intercepted pastes.
    #[serde(default)]
    pub paste_character_count: u64,
    /// Key-downs observed in the composition surface.
    #[serde(default)]
    pub total_keystrokes: u64,
    /// Subset of keystrokes that were backspace.
    #[serde(default)]
    pub backspace_count: u64,
    /// Words per minute computed at finalize from elapsed time and word count.
    #[serde(default)]
    pub avg_words_per_minute: u32,
    /// Reserved for edit-pass tracking; not accumulated by this subsystem.
    #[serde(default)]
    pub revision_count: u32,
    /// RFC3339 timestamp of the first keystroke.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    /// RFC3339 timestamp of session finalization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

/// Count words the way the editor does: whitespace-separated, non-empty.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Count sentences for the editor footer: split on terminal punctuation,
/// non-blank segments only.
pub fn sentence_count(text: &str) -> usize {
    text.split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .count()
}

/// Format a duration for display: `"45s"`, `"3m 25s"`.
pub fn format_time(seconds: u32) -> String {
    let mins = seconds / 60;
    let secs = seconds % 60;
    if mins == 0 {
        format!("{secs}s")
    } else {
        format!("{mins}m {secs}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_for_missing_fields() {
        // Historical record predating most fields
        let metadata: WritingMetadata =
            serde_json::from_str(r#"{"time_spent_seconds": 42}"#).expect("deserialize");
        assert_eq!(metadata.time_spent_seconds, 42);
        assert_eq!(metadata.total_keystrokes, 0);
        assert_eq!(metadata.paste_attempts, 0);
        assert!(metadata.started_at.is_none());
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let metadata: WritingMetadata =
            serde_json::from_str(r#"{"total_keystrokes": 10, "future_field": true}"#)
                .expect("deserialize");
        assert_eq!(metadata.total_keystrokes, 10);
    }

    #[test]
    fn test_empty_record_is_all_zero() {
        let metadata: WritingMetadata = serde_json::from_str("{}").expect("deserialize");
        assert_eq!(metadata, WritingMetadata::default());
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("   "), 0);
        assert_eq!(word_count("one two  three\nfour"), 4);
    }

    #[test]
    fn test_sentence_count() {
        assert_eq!(sentence_count(""), 0);
        assert_eq!(sentence_count("One. Two! Three?"), 3);
        assert_eq!(sentence_count("Trailing dots..."), 1);
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(45), "45s");
        assert_eq!(format_time(60), "1m 0s");
        assert_eq!(format_time(205), "3m 25s");
    }
}
