//! Core scoring primitives for the writing-integrity subsystem.
//!
//! This module contains:
//! - The metrics collector accumulating a behavioral fingerprint per session
//! - The pure trust scorer mapping a snapshot to a classification
//! - The rate guard enforcing paste/fast-typing policy in real time

pub mod collector;
pub mod guard;
pub mod metadata;
pub mod trust;

// Re-export commonly used types
pub use collector::MetricsCollector;
pub use guard::{EditVerdict, RateGuard};
pub use metadata::{format_time, sentence_count, word_count, WritingMetadata};
pub use trust::{evaluate, trust_level, TrustLevel, TrustReport, TrustSignals};
