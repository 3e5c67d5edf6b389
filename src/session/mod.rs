//! Session orchestration: the live composition controller and offline replay
//! of recorded sessions.

pub mod controller;
pub mod replay;

pub use controller::{
    Category, ChapterFields, ChapterSubmission, CompositionController, EventOutcome, SessionState,
    SubmissionPolicy, SubmissionTarget, SubmitError,
};
pub use replay::{
    CadenceSummary, RecordedEvent, RecordedSession, ReplayError, ReplayOutcome, SessionReplayer,
};
