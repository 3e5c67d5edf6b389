//! Replay of recorded composition sessions.
//!
//! The web editor records the event stream during composition and ships it
//! with the draft. Replaying feeds the events through a real controller with
//! a manual clock driven by the recorded timestamps, so metrics, guard
//! verdicts, and the trust classification come out exactly as they would have
//! live - no wall-clock time passes.

use crate::audit::SharedAuditLog;
use crate::clock::{Clock, ManualClock};
use crate::core::trust::{evaluate, TrustReport};
use crate::events::EditorEvent;
use crate::session::controller::{
    ChapterFields, ChapterSubmission, CompositionController, EventOutcome, SubmissionPolicy,
    SubmissionTarget, SubmitError,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::sync::Arc;
use uuid::Uuid;

/// One timestamped event from the editor's recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedEvent {
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub event: EditorEvent,
}

/// A complete recorded session: the draft plus everything the writer did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedSession {
    pub session_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    pub target: SubmissionTarget,
    pub chapter: ChapterFields,
    pub events: Vec<RecordedEvent>,
}

/// Inter-keystroke cadence summary, computed over key-down deltas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CadenceSummary {
    /// Number of inter-key intervals measured.
    pub samples: usize,
    pub mean_ms: f64,
    pub std_dev_ms: f64,
}

/// Result of replaying a session to completion.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayOutcome {
    pub submission: ChapterSubmission,
    pub trust: TrustReport,
    /// Edits dropped by the rate guard (trip + cooldown rejections).
    pub dropped_edits: u32,
    pub pastes_blocked: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cadence: Option<CadenceSummary>,
}

#[derive(Debug)]
pub enum ReplayError {
    /// The recording contains no events.
    EmptySession,
    /// The replayed draft failed submission validation.
    Submit(SubmitError),
}

impl std::fmt::Display for ReplayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReplayError::EmptySession => write!(f, "Recorded session contains no events"),
            ReplayError::Submit(e) => write!(f, "Submission validation failed: {e}"),
        }
    }
}

impl std::error::Error for ReplayError {}

impl From<SubmitError> for ReplayError {
    fn from(e: SubmitError) -> Self {
        ReplayError::Submit(e)
    }
}

/// Replays recorded sessions through the full controller pipeline.
pub struct SessionReplayer {
    policy: SubmissionPolicy,
    audit: Option<SharedAuditLog>,
}

impl SessionReplayer {
    pub fn new() -> Self {
        Self {
            policy: SubmissionPolicy::default(),
            audit: None,
        }
    }

    pub fn with_policy(mut self, policy: SubmissionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_audit(mut self, audit: SharedAuditLog) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Replay a session and finalize it into a scored submission.
    ///
    /// Events are processed strictly in recorded order; a timestamp that
    /// steps backwards is clamped to the previous instant rather than
    /// rewinding the clock.
    pub fn replay(&self, session: &RecordedSession) -> Result<ReplayOutcome, ReplayError> {
        let first = session.events.first().ok_or(ReplayError::EmptySession)?;
        let clock = Arc::new(ManualClock::new(first.at));

        let mut controller = CompositionController::new(clock.clone(), self.policy);
        if let Some(audit) = &self.audit {
            controller = controller.with_audit(audit.clone());
        }

        let mut dropped_edits = 0u32;
        let mut pastes_blocked = 0u32;
        let mut key_times: Vec<DateTime<Utc>> = Vec::new();

        for recorded in &session.events {
            clock.advance_to(recorded.at);
            controller.poll();

            if matches!(recorded.event, EditorEvent::KeyDown { .. }) {
                key_times.push(clock.now());
            }
            match controller.apply(recorded.event.clone()) {
                EventOutcome::TypingTooFast | EventOutcome::CooldownActive => dropped_edits += 1,
                EventOutcome::PasteBlocked { .. } => pastes_blocked += 1,
                EventOutcome::Applied => {}
            }
        }
        controller.poll();

        let submission = controller.submit(session.target.clone(), session.chapter.clone())?;
        let trust = submission
            .writing_metadata
            .as_ref()
            .map(evaluate)
            .unwrap_or_else(|| evaluate(&Default::default()));
        controller.submission_succeeded();

        Ok(ReplayOutcome {
            submission,
            trust,
            dropped_edits,
            pastes_blocked,
            cadence: cadence_summary(&key_times),
        })
    }
}

impl Default for SessionReplayer {
    fn default() -> Self {
        Self::new()
    }
}

/// Summarize inter-key intervals. Needs at least two key-downs.
fn cadence_summary(key_times: &[DateTime<Utc>]) -> Option<CadenceSummary> {
    if key_times.len() < 2 {
        return None;
    }
    let deltas: Vec<f64> = key_times
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).num_milliseconds() as f64)
        .collect();

    let mean_ms = deltas.iter().copied().mean();
    let std_dev_ms = if deltas.len() < 2 {
        0.0
    } else {
        deltas.iter().copied().std_dev()
    };

    Some(CadenceSummary {
        samples: deltas.len(),
        mean_ms,
        std_dev_ms,
    })
}
