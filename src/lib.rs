//! Writing Integrity Agent - composition scoring for story submissions.
//!
//! This library measures how a chapter was written - not what it says - and
//! turns that into a trust classification moderators can lean on when
//! reviewing submissions.
//!
//! # Privacy Guarantees
//!
//! - **No key content**: keystrokes are counted by class (backspace or not),
//!   never by identity
//! - **No text in metrics**: the metrics record carries counters and timing
//!   only, never the authored text
//! - **Transparency**: guard and collector activity is logged and auditable
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Writing Integrity Agent                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │  Collector  │──▶│  Controller │──▶│   Trust     │       │
//! │  │ (metrics)   │   │ (sessions)  │   │  (scoring)  │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! │         │                 │                  │              │
//! │         ▼                 ▼                  ▼              │
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │    Audit    │   │  RateGuard  │   │ Moderation  │       │
//! │  │    Log      │   │ (cooldowns) │   │   Review    │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use writing_integrity_agent::clock::system_clock;
//! use writing_integrity_agent::events::{EditorEvent, KeyClass};
//! use writing_integrity_agent::session::{CompositionController, SubmissionPolicy};
//!
//! let mut controller = CompositionController::new(system_clock(), SubmissionPolicy::default());
//! controller.apply(EditorEvent::KeyDown { key: KeyClass::Other });
//! controller.apply(EditorEvent::Edit { text: "H".to_string() });
//! ```

pub mod audit;
pub mod backend;
pub mod clock;
pub mod config;
pub mod core;
pub mod events;
pub mod moderation;
pub mod session;

#[cfg(feature = "server")]
pub mod server;

// Re-export key types at crate root for convenience
pub use audit::{create_shared_log, AuditStats, IntegrityAuditLog, SharedAuditLog};
pub use clock::{system_clock, Clock, ManualClock, SharedClock, SystemClock};
pub use config::Config;
pub use crate::core::{
    evaluate, MetricsCollector, RateGuard, TrustLevel, TrustReport, WritingMetadata,
};
pub use events::{EditorEvent, KeyClass};
pub use moderation::{ReviewCard, ReviewWarning};
pub use session::{
    CompositionController, RecordedSession, ReplayOutcome, SessionReplayer, SessionState,
};

// Backend re-exports (when enabled)
#[cfg(feature = "submit")]
pub use backend::{BackendClient, BlockingBackendClient};
pub use backend::{BackendConfig, BackendError, BackendResponse};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Collection notice that can be displayed to writers.
pub const COLLECTION_NOTICE: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║        WRITING INTEGRITY AGENT - COLLECTION NOTICE               ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  This agent measures how a chapter was written, for review.      ║
║                                                                  ║
║  ✓ WHAT WE RECORD:                                               ║
║    • How long you spend composing (timing only)                  ║
║    • How many keys you press, and how many are backspaces        ║
║    • Paste attempts and how many characters they carried         ║
║    • When you leave and return to the editor                     ║
║                                                                  ║
║  ✗ WHAT WE NEVER RECORD IN METRICS:                              ║
║    • Which keys you press                                        ║
║    • The text you write (it travels only as your submission)     ║
║    • Anything outside the editor                                 ║
║                                                                  ║
║  Metrics travel with your submission and are shown to the        ║
║  moderators who review it. Nothing else is retained.             ║
║                                                                  ║
║  You can view aggregate statistics anytime with:                 ║
║    writing-integrity status                                      ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;
