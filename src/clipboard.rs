//! Named clipboard slots
//!
//! Sticky-copy commands capture the system clipboard into a numbered slot
//! so the content survives later copies. Slots persist as a flat JSON map
//! next to the config file.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Error type for slot and system-clipboard operations
#[derive(Debug, Clone)]
pub struct ClipboardError(pub String);

impl fmt::Display for ClipboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "clipboard error: {}", self.0)
    }
}

impl std::error::Error for ClipboardError {}

/// JSON-backed slot store
pub struct ClipboardSlots {
    path: PathBuf,
    slots: HashMap<String, String>,
}

impl ClipboardSlots {
    /// Load the store; a missing file is an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let slots = fs::read_to_string(&path)
            .ok()
            .and_then(|text| serde_json::from_str(&text).ok())
            .unwrap_or_default();
        Self { path, slots }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, slot: u32) -> Option<&str> {
        self.slots.get(&slot.to_string()).map(String::as_str)
    }

    /// Store text in a slot and persist the whole map.
    pub fn set(&mut self, slot: u32, text: String) -> Result<(), ClipboardError> {
        self.slots.insert(slot.to_string(), text);
        let json = serde_json::to_string_pretty(&self.slots)
            .map_err(|e| ClipboardError(e.to_string()))?;
        fs::write(&self.path, json)
            .map_err(|e| ClipboardError(format!("could not write {}: {}", self.path.display(), e)))
    }

    /// Capture the current system clipboard into a slot; returns the text.
    pub fn capture(&mut self, slot: u32) -> Result<String, ClipboardError> {
        let text = read_system_clipboard()?;
        self.set(slot, text.clone())?;
        Ok(text)
    }
}

/// Current system clipboard text
pub fn read_system_clipboard() -> Result<String, ClipboardError> {
    let mut clipboard = arboard::Clipboard::new()
        .map_err(|e| ClipboardError(format!("failed to open clipboard: {}", e)))?;
    clipboard
        .get_text()
        .map_err(|e| ClipboardError(format!("no clipboard text: {}", e)))
}
