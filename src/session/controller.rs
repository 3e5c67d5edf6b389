//! The composition session controller.
//!
//! Sequences collector, guard, and scorer across one writing session:
//! idle -> composing on the first keystroke, composing -> submitting on a
//! validated submit, then back to idle (accepted) or composing (hand-off
//! failed). Validation runs before metrics finalization so a rejected submit
//! never disturbs the in-progress session.

use crate::audit::SharedAuditLog;
use crate::clock::SharedClock;
use crate::core::collector::MetricsCollector;
use crate::core::guard::{EditVerdict, RateGuard};
use crate::core::metadata::{sentence_count, word_count, WritingMetadata};
use crate::events::EditorEvent;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Story category, fixed by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Good,
    Bad,
    Ugly,
}

/// Where the chapter is going: a brand-new story or an existing ongoing one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SubmissionTarget {
    NewStory {
        title: String,
        summary: String,
        category: Category,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        thumbnail_url: Option<String>,
    },
    ExistingStory {
        story_id: Uuid,
    },
}

/// Chapter-level form fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterFields {
    pub title: String,
    pub summary: String,
}

/// A validated chapter submission handed to the external pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterSubmission {
    #[serde(flatten)]
    pub target: SubmissionTarget,
    pub chapter_title: String,
    pub chapter_summary: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub writing_metadata: Option<WritingMetadata>,
}

/// Local validation failures. Synchronous and non-destructive: the session
/// keeps accumulating after any of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    FieldEmpty { field: &'static str },
    ContentTooShort { min_chars: usize, chars: usize },
    AlreadySubmitting,
}

impl std::fmt::Display for SubmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmitError::FieldEmpty { field } => write!(f, "Required field is empty: {field}"),
            SubmitError::ContentTooShort { min_chars, chars } => {
                write!(f, "Chapter content too short: {chars} of {min_chars} characters")
            }
            SubmitError::AlreadySubmitting => write!(f, "A submission is already in progress"),
        }
    }
}

impl std::error::Error for SubmitError {}

/// Validation policy for submissions.
#[derive(Debug, Clone, Copy)]
pub struct SubmissionPolicy {
    /// Minimum chapter length in characters (after trimming).
    pub min_content_chars: usize,
}

impl Default for SubmissionPolicy {
    fn default() -> Self {
        Self {
            min_content_chars: 1,
        }
    }
}

/// Lifecycle state of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Composing,
    Submitting,
}

/// What happened to one applied event, including the warning copy the editor
/// surfaces to the writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Applied,
    /// The edit tripped the fast-typing limit and was dropped.
    TypingTooFast,
    /// An earlier trip is still cooling down; the edit was dropped.
    CooldownActive,
    /// The paste was intercepted and counted, content untouched.
    PasteBlocked { char_count: usize },
}

impl EventOutcome {
    /// Warning to show the writer, if any.
    pub fn warning(&self) -> Option<&'static str> {
        match self {
            EventOutcome::Applied => None,
            EventOutcome::TypingTooFast => {
                Some("You are typing entirely too fast. Are you a robot?")
            }
            EventOutcome::CooldownActive => Some("Slow down. Cooling off for 2 seconds..."),
            EventOutcome::PasteBlocked { .. } => Some("PASTE DISABLED: Write line-by-line."),
        }
    }
}

/// Orchestrates one composition session end to end.
pub struct CompositionController {
    state: SessionState,
    collector: MetricsCollector,
    guard: RateGuard,
    content: String,
    policy: SubmissionPolicy,
    audit: Option<SharedAuditLog>,
}

impl CompositionController {
    pub fn new(clock: SharedClock, policy: SubmissionPolicy) -> Self {
        Self {
            state: SessionState::Idle,
            collector: MetricsCollector::new(clock.clone()),
            guard: RateGuard::new(clock),
            content: String::new(),
            policy,
            audit: None,
        }
    }

    /// Attach a shared audit log; counters are bumped as events flow through.
    pub fn with_audit(mut self, audit: SharedAuditLog) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Feed one editor event through the collector and the guard.
    ///
    /// Events must arrive in input order; the guard's fast-keystroke
    /// heuristic depends on it.
    pub fn apply(&mut self, event: EditorEvent) -> EventOutcome {
        match event {
            EditorEvent::KeyDown { key } => {
                self.collector.on_key_down(key);
                if self.state == SessionState::Idle {
                    self.state = SessionState::Composing;
                }
                if let Some(audit) = &self.audit {
                    audit.record_keystroke();
                }
                EventOutcome::Applied
            }
            EditorEvent::Edit { text } => match self.guard.on_edit(text.chars().count()) {
                EditVerdict::Accepted => {
                    self.content = text;
                    EventOutcome::Applied
                }
                EditVerdict::CooldownTriggered => {
                    if let Some(audit) = &self.audit {
                        audit.record_cooldown();
                    }
                    EventOutcome::TypingTooFast
                }
                EditVerdict::CooldownActive => EventOutcome::CooldownActive,
            },
            EditorEvent::Paste { char_count } => {
                // The paste is rejected unconditionally; the collector still
                // records the attempt. Counting belongs to the collector
                // alone - the guard never touches paste counters.
                self.collector.on_paste(char_count);
                if let Some(audit) = &self.audit {
                    audit.record_paste_blocked();
                }
                EventOutcome::PasteBlocked { char_count }
            }
            EditorEvent::Visibility { hidden } => {
                self.collector.on_visibility_change(hidden);
                EventOutcome::Applied
            }
        }
    }

    /// Drive the elapsed-time tick; hosts call this about once a second.
    pub fn poll(&mut self) {
        self.collector.poll();
    }

    /// Validate and finalize the session into a submission.
    ///
    /// Validation happens before `stop_tracking` so a failed submit leaves
    /// metrics accumulating as if nothing happened.
    pub fn submit(
        &mut self,
        target: SubmissionTarget,
        chapter: ChapterFields,
    ) -> Result<ChapterSubmission, SubmitError> {
        if self.state == SessionState::Submitting {
            return Err(SubmitError::AlreadySubmitting);
        }

        let content = self.content.trim();
        Self::require(&chapter.title, "chapter_title")?;
        Self::require(&chapter.summary, "chapter_summary")?;
        if let SubmissionTarget::NewStory { title, summary, .. } = &target {
            Self::require(title, "title")?;
            Self::require(summary, "summary")?;
        }
        if content.is_empty() {
            return Err(SubmitError::FieldEmpty { field: "content" });
        }
        let chars = content.chars().count();
        if chars < self.policy.min_content_chars {
            return Err(SubmitError::ContentTooShort {
                min_chars: self.policy.min_content_chars,
                chars,
            });
        }

        let metrics = self.collector.stop_tracking(word_count(content));
        self.state = SessionState::Submitting;
        if let Some(audit) = &self.audit {
            audit.record_session_finalized();
        }

        Ok(ChapterSubmission {
            target,
            chapter_title: chapter.title.trim().to_string(),
            chapter_summary: chapter.summary.trim().to_string(),
            content: content.to_string(),
            writing_metadata: Some(metrics),
        })
    }

    /// The external pipeline accepted the submission: destroy the session.
    pub fn submission_succeeded(&mut self) {
        self.reset();
    }

    /// The external pipeline rejected the hand-off: return to composing with
    /// the session intact and time still accumulating.
    pub fn submission_failed(&mut self) {
        if self.state == SessionState::Submitting {
            self.collector.resume();
            self.state = SessionState::Composing;
        }
    }

    /// Abandon the session: zero counters, clear the draft, cancel timers.
    /// Idempotent.
    pub fn reset(&mut self) {
        self.collector.reset();
        self.guard.reset();
        self.content.clear();
        self.state = SessionState::Idle;
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Current draft content (accepted edits only).
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Sentence count for the editor footer.
    pub fn sentence_count(&self) -> usize {
        sentence_count(&self.content)
    }

    /// Live metrics for the editor footer.
    pub fn live_metrics(&self) -> &WritingMetadata {
        self.collector.metrics()
    }

    pub fn is_cooldown_active(&self) -> bool {
        self.guard.is_cooldown_active()
    }

    fn require(value: &str, field: &'static str) -> Result<(), SubmitError> {
        if value.trim().is_empty() {
            Err(SubmitError::FieldEmpty { field })
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::events::KeyClass;
    use chrono::{DateTime, Duration, Utc};
    use std::sync::Arc;

    fn t0() -> DateTime<Utc> {
        "2025-03-01T12:00:00Z".parse().expect("valid timestamp")
    }

    fn controller() -> (Arc<ManualClock>, CompositionController) {
        let clock = Arc::new(ManualClock::new(t0()));
        let controller = CompositionController::new(clock.clone(), SubmissionPolicy::default());
        (clock, controller)
    }

    fn target() -> SubmissionTarget {
        SubmissionTarget::NewStory {
            title: "The Rumor".into(),
            summary: "A stranger rides in.".into(),
            category: Category::Good,
            thumbnail_url: None,
        }
    }

    fn chapter() -> ChapterFields {
        ChapterFields {
            title: "Chapter One".into(),
            summary: "It begins.".into(),
        }
    }

    fn type_text(clock: &ManualClock, controller: &mut CompositionController, text: &str) {
        let mut typed = String::new();
        for c in text.chars() {
            clock.advance(Duration::milliseconds(200));
            controller.apply(EditorEvent::KeyDown {
                key: KeyClass::Other,
            });
            typed.push(c);
            controller.apply(EditorEvent::Edit {
                text: typed.clone(),
            });
            controller.poll();
        }
    }

    #[test]
    fn test_first_keystroke_starts_composing() {
        let (_clock, mut controller) = controller();
        assert_eq!(controller.state(), SessionState::Idle);
        controller.apply(EditorEvent::KeyDown {
            key: KeyClass::Other,
        });
        assert_eq!(controller.state(), SessionState::Composing);
    }

    #[test]
    fn test_paste_counted_but_never_inserted() {
        let (clock, mut controller) = controller();
        type_text(&clock, &mut controller, "He rode in at dusk.");
        let before = controller.content().to_string();

        let outcome = controller.apply(EditorEvent::Paste { char_count: 500 });
        assert_eq!(outcome, EventOutcome::PasteBlocked { char_count: 500 });
        assert!(outcome.warning().is_some());
        assert_eq!(controller.content(), before);
        assert_eq!(controller.live_metrics().paste_attempts, 1);
        assert_eq!(controller.live_metrics().paste_character_count, 500);
    }

    #[test]
    fn test_cooldown_drops_edits_and_keeps_content() {
        let (clock, mut controller) = controller();
        type_text(&clock, &mut controller, "slow start");
        let before = controller.content().to_string();

        // Burst of fast insertions
        let mut burst = before.clone();
        for i in 0..3 {
            clock.advance(Duration::milliseconds(30));
            burst.push('x');
            let outcome = controller.apply(EditorEvent::Edit { text: burst.clone() });
            if i < 2 {
                assert_eq!(outcome, EventOutcome::Applied);
            } else {
                assert_eq!(outcome, EventOutcome::TypingTooFast);
            }
        }
        // Third edit was dropped
        assert_eq!(controller.content().len(), before.len() + 2);

        // Edits during cooldown are hard-blocked
        clock.advance(Duration::milliseconds(100));
        let during = controller.apply(EditorEvent::Edit {
            text: "replacement".into(),
        });
        assert_eq!(during, EventOutcome::CooldownActive);
        assert_eq!(controller.content().len(), before.len() + 2);
    }

    #[test]
    fn test_submit_validation_fails_fast_without_finalizing() {
        let (clock, mut controller) = controller();
        type_text(&clock, &mut controller, "Some content");

        let err = controller
            .submit(
                target(),
                ChapterFields {
                    title: "  ".into(),
                    summary: "ok".into(),
                },
            )
            .expect_err("blank chapter title");
        assert_eq!(
            err,
            SubmitError::FieldEmpty {
                field: "chapter_title"
            }
        );

        // Session untouched: still composing, metrics still accumulating
        assert_eq!(controller.state(), SessionState::Composing);
        assert!(controller.live_metrics().completed_at.is_none());
        clock.advance(Duration::seconds(10));
        controller.poll();
        let before = controller.live_metrics().time_spent_seconds;
        clock.advance(Duration::seconds(5));
        controller.poll();
        assert!(controller.live_metrics().time_spent_seconds > before);
    }

    #[test]
    fn test_submit_finalizes_and_success_resets() {
        let (clock, mut controller) = controller();
        type_text(&clock, &mut controller, "He rode in at dusk. Nobody spoke.");
        clock.advance(Duration::seconds(90));
        controller.poll();

        let submission = controller
            .submit(target(), chapter())
            .expect("valid submission");
        assert_eq!(controller.state(), SessionState::Submitting);
        let metrics = submission.writing_metadata.expect("metrics attached");
        assert!(metrics.total_keystrokes > 0);
        assert!(metrics.completed_at.is_some());
        assert!(metrics.avg_words_per_minute > 0);

        controller.submission_succeeded();
        assert_eq!(controller.state(), SessionState::Idle);
        assert_eq!(controller.content(), "");
        assert_eq!(controller.live_metrics().total_keystrokes, 0);
    }

    #[test]
    fn test_failed_handoff_returns_to_composing() {
        let (clock, mut controller) = controller();
        type_text(&clock, &mut controller, "Draft text here");
        clock.advance(Duration::seconds(61));
        controller.poll();

        controller
            .submit(target(), chapter())
            .expect("valid submission");
        controller.submission_failed();
        assert_eq!(controller.state(), SessionState::Composing);

        // Time keeps accumulating from the original anchor
        let before = {
            controller.poll();
            controller.live_metrics().time_spent_seconds
        };
        clock.advance(Duration::seconds(30));
        controller.poll();
        assert!(controller.live_metrics().time_spent_seconds >= before + 30);
    }

    #[test]
    fn test_sentence_count_follows_accepted_content() {
        let (clock, mut controller) = controller();
        type_text(&clock, &mut controller, "One. Two! Three?");
        assert_eq!(controller.sentence_count(), 3);
    }

    #[test]
    fn test_empty_content_rejected() {
        let (_clock, mut controller) = controller();
        let err = controller
            .submit(target(), chapter())
            .expect_err("no content typed");
        assert_eq!(err, SubmitError::FieldEmpty { field: "content" });
    }
}
