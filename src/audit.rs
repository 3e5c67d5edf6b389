//! Aggregate audit counters for the integrity subsystem.
//!
//! Tracks how much the guard and collector have done across sessions without
//! retaining anything about individual writers: event counts only, optionally
//! persisted as JSON so totals survive restarts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Audit counters for the current process.
#[derive(Debug)]
pub struct IntegrityAuditLog {
    /// Keystrokes observed across all sessions
    keystrokes_observed: AtomicU64,
    /// Paste attempts intercepted
    pastes_blocked: AtomicU64,
    /// Fast-typing cooldowns triggered
    cooldowns_triggered: AtomicU64,
    /// Sessions finalized into submissions
    sessions_finalized: AtomicU64,
    /// Process start time
    started: DateTime<Utc>,
    /// Path for persisting totals
    persist_path: Option<PathBuf>,
}

impl IntegrityAuditLog {
    pub fn new() -> Self {
        Self {
            keystrokes_observed: AtomicU64::new(0),
            pastes_blocked: AtomicU64::new(0),
            cooldowns_triggered: AtomicU64::new(0),
            sessions_finalized: AtomicU64::new(0),
            started: Utc::now(),
            persist_path: None,
        }
    }

    /// Create an audit log that persists totals to `path`.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        if let Err(e) = log.load() {
            eprintln!("Note: Could not load previous audit totals: {e}");
        }

        log
    }

    pub fn record_keystroke(&self) {
        self.keystrokes_observed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_paste_blocked(&self) {
        self.pastes_blocked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cooldown(&self) {
        self.cooldowns_triggered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_session_finalized(&self) {
        self.sessions_finalized.fetch_add(1, Ordering::Relaxed);
    }

    /// Current totals.
    pub fn stats(&self) -> AuditStats {
        AuditStats {
            keystrokes_observed: self.keystrokes_observed.load(Ordering::Relaxed),
            pastes_blocked: self.pastes_blocked.load(Ordering::Relaxed),
            cooldowns_triggered: self.cooldowns_triggered.load(Ordering::Relaxed),
            sessions_finalized: self.sessions_finalized.load(Ordering::Relaxed),
            started: self.started,
            uptime_secs: (Utc::now() - self.started).num_seconds().max(0) as u64,
        }
    }

    /// Summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Integrity Statistics:\n\
             - Keystrokes observed: {}\n\
             - Paste attempts blocked: {}\n\
             - Typing cooldowns triggered: {}\n\
             - Sessions finalized: {}\n\
             - Uptime: {} seconds\n\
             \n\
             Retention:\n\
             - Counters only; no keystroke content\n\
             - No per-writer records",
            stats.keystrokes_observed,
            stats.pastes_blocked,
            stats.cooldowns_triggered,
            stats.sessions_finalized,
            stats.uptime_secs
        )
    }

    /// Save totals to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedTotals {
                keystrokes_observed: stats.keystrokes_observed,
                pastes_blocked: stats.pastes_blocked,
                cooldowns_triggered: stats.cooldowns_triggered,
                sessions_finalized: stats.sessions_finalized,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;
            std::fs::write(path, json)?;
        }
        Ok(())
    }

    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedTotals =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.keystrokes_observed
                    .store(persisted.keystrokes_observed, Ordering::Relaxed);
                self.pastes_blocked
                    .store(persisted.pastes_blocked, Ordering::Relaxed);
                self.cooldowns_triggered
                    .store(persisted.cooldowns_triggered, Ordering::Relaxed);
                self.sessions_finalized
                    .store(persisted.sessions_finalized, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.keystrokes_observed.store(0, Ordering::Relaxed);
        self.pastes_blocked.store(0, Ordering::Relaxed);
        self.cooldowns_triggered.store(0, Ordering::Relaxed);
        self.sessions_finalized.store(0, Ordering::Relaxed);
    }
}

impl Default for IntegrityAuditLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of audit totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditStats {
    pub keystrokes_observed: u64,
    pub pastes_blocked: u64,
    pub cooldowns_triggered: u64,
    pub sessions_finalized: u64,
    pub started: DateTime<Utc>,
    pub uptime_secs: u64,
}

/// Totals format for persistence.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedTotals {
    keystrokes_observed: u64,
    pastes_blocked: u64,
    cooldowns_triggered: u64,
    sessions_finalized: u64,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared audit log.
pub type SharedAuditLog = Arc<IntegrityAuditLog>;

/// Create a new shared audit log.
pub fn create_shared_log() -> SharedAuditLog {
    Arc::new(IntegrityAuditLog::new())
}

/// Create a new shared audit log with persistence.
pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedAuditLog {
    Arc::new(IntegrityAuditLog::with_persistence(path))
}
