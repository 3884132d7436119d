use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;

use crate::clipboard::{CaptureEvent, ClipboardSource, SelfWriteGuard, content_hash};

/// Watches a clipboard for changes by polling it.
///
/// Each change yields one payload-less [`CaptureEvent`]. Changes written by
/// this process (marked on the [`SelfWriteGuard`]) are skipped.
pub struct ClipboardMonitor<C> {
    source: C,
    interval: Duration,
    guard: Option<SelfWriteGuard>,
    last_hash: Option<String>,
}

impl<C: ClipboardSource> ClipboardMonitor<C> {
    pub fn new(source: C, interval: Duration) -> Self {
        Self {
            source,
            interval,
            guard: None,
            last_hash: None,
        }
    }

    pub fn with_self_write_guard(mut self, guard: SelfWriteGuard) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Record the current content as the baseline without emitting an event,
    /// so whatever was on the clipboard before startup is not captured.
    pub fn prime(&mut self) {
        match self.source.get_text() {
            Ok(text) => self.last_hash = Some(content_hash(text.as_deref())),
            Err(e) => tracing::debug!("clipboard: initial read failed: {e}"),
        }
    }

    /// Check the clipboard once. Returns an event if it changed since the
    /// previous poll.
    pub fn poll_once(&mut self) -> Option<CaptureEvent> {
        let text = match self.source.get_text() {
            Ok(text) => text,
            Err(e) => {
                // Locked by another application; try again next tick.
                tracing::debug!("clipboard: read failed: {e}");
                return None;
            }
        };

        let hash = content_hash(text.as_deref());
        if self.last_hash.as_deref() == Some(hash.as_str()) {
            // A self-write of unchanged content never shows up as a change.
            if let Some(guard) = &self.guard {
                guard.take_if_matches(&hash);
            }
            return None;
        }
        let own_write = self
            .guard
            .as_ref()
            .is_some_and(|guard| guard.take_if_matches(&hash));
        self.last_hash = Some(hash);

        if own_write {
            tracing::debug!("clipboard: skipping self-initiated write");
            return None;
        }
        Some(CaptureEvent)
    }

    /// Poll until `stop` is set or the receiving side hangs up. Blocks the
    /// calling thread.
    pub fn run(mut self, tx: UnboundedSender<CaptureEvent>, stop: Arc<AtomicBool>) {
        self.prime();
        tracing::info!(
            "clipboard monitor started, polling every {} ms",
            self.interval.as_millis()
        );

        while !stop.load(Ordering::Acquire) {
            std::thread::sleep(self.interval);
            if let Some(event) = self.poll_once() {
                if tx.send(event).is_err() {
                    tracing::warn!("capture event channel closed");
                    break;
                }
            }
        }

        tracing::info!("clipboard monitor stopped");
    }
}
