use std::sync::{Arc, Mutex};

use crate::clipboard::ClipboardSource;
use crate::error::ClipboardError;

#[derive(Debug, Default)]
struct State {
    current: Option<String>,
    writes: Vec<String>,
    unavailable: bool,
}

/// In-process clipboard. Clones share the same content.
///
/// Used by the one-shot CLI commands, which never touch the system
/// clipboard, and as a stand-in for it in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    state: Arc<Mutex<State>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate another application putting `text` on the clipboard
    /// (`None` for a non-text payload).
    pub fn put(&self, text: Option<&str>) {
        self.lock().current = text.map(str::to_string);
    }

    /// Make reads and writes fail as if the clipboard were locked.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    pub fn current(&self) -> Option<String> {
        self.lock().current.clone()
    }

    /// Every payload written through [`ClipboardSource::set_text`], in order.
    pub fn writes(&self) -> Vec<String> {
        self.lock().writes.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ClipboardSource for MemoryClipboard {
    fn get_text(&mut self) -> Result<Option<String>, ClipboardError> {
        let state = self.lock();
        if state.unavailable {
            return Err(ClipboardError::Unavailable("clipboard locked".to_string()));
        }
        Ok(state.current.clone())
    }

    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let mut state = self.lock();
        if state.unavailable {
            return Err(ClipboardError::Unavailable("clipboard locked".to_string()));
        }
        state.current = Some(text.to_string());
        state.writes.push(text.to_string());
        Ok(())
    }
}
