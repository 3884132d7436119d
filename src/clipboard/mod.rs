pub mod memory;
pub mod monitor;
pub mod system;

use std::sync::{Arc, Mutex};

use sha2::{Digest, Sha256};

use crate::error::ClipboardError;

pub use memory::MemoryClipboard;
pub use monitor::ClipboardMonitor;
pub use system::SystemClipboard;

/// Notification that the clipboard content changed. Carries no payload;
/// the receiver pulls the current text itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureEvent;

/// Read/write access to a text clipboard.
pub trait ClipboardSource {
    /// Current text payload. `Ok(None)` when the clipboard holds no text.
    fn get_text(&mut self) -> Result<Option<String>, ClipboardError>;

    /// Replace the clipboard content with `text`.
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

impl<C: ClipboardSource + ?Sized> ClipboardSource for Box<C> {
    fn get_text(&mut self) -> Result<Option<String>, ClipboardError> {
        (**self).get_text()
    }

    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        (**self).set_text(text)
    }
}

/// SHA-256 of a clipboard payload, used to detect changes.
pub fn content_hash(text: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    match text {
        Some(text) => {
            hasher.update(b"text:");
            hasher.update(text.as_bytes());
        }
        None => hasher.update(b"empty"),
    }
    format!("{:x}", hasher.finalize())
}

/// Shared marker for clipboard writes made by this process.
///
/// The writer records the hash of what it is about to put on the clipboard;
/// the monitor drops the next change whose hash matches, so our own output
/// is not captured again.
#[derive(Debug, Clone, Default)]
pub struct SelfWriteGuard {
    pending: Arc<Mutex<Option<String>>>,
}

impl SelfWriteGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `text` as about to be written by us.
    pub fn mark(&self, text: &str) {
        *self.lock() = Some(content_hash(Some(text)));
    }

    /// Forget a pending mark (the write did not happen).
    pub fn cancel(&self) {
        *self.lock() = None;
    }

    /// Returns `true` and clears the mark if `hash` is our own pending write.
    pub fn take_if_matches(&self, hash: &str) -> bool {
        let mut pending = self.lock();
        if pending.as_deref() == Some(hash) {
            *pending = None;
            true
        } else {
            false
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
