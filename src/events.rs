//! Editor input events consumed by the scoring subsystem.
//!
//! Events carry the minimum the subsystem needs: a key-down is only
//! classified (backspace or not), a paste carries only its character count.
//! The one exception is [`EditorEvent::Edit`], which carries the proposed
//! content so the session controller can hold the draft for submission; the
//! metrics snapshot itself never stores authored text.

use serde::{Deserialize, Serialize};

/// Classification of a pressed key.
///
/// The collector only distinguishes backspace from everything else; which
/// character was typed is never recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyClass {
    Backspace,
    Other,
}

impl KeyClass {
    pub fn is_backspace(&self) -> bool {
        matches!(self, KeyClass::Backspace)
    }
}

/// A single input event from the composition surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EditorEvent {
    /// Key pressed in the chapter textarea.
    KeyDown { key: KeyClass },
    /// Content-changing edit with the proposed new text. Subject to the rate
    /// guard; only accepted edits update the draft.
    Edit { text: String },
    /// Paste intercepted on any field. Never inserted; counted as an attempt.
    Paste { char_count: usize },
    /// The page gained or lost visibility (tab switch). Optional capability;
    /// headless hosts simply never send it.
    Visibility { hidden: bool },
}
