use std::path::PathBuf;
use std::sync::mpsc::Sender;

use tokio::sync::mpsc::UnboundedReceiver;

use crate::clipboard::{CaptureEvent, ClipboardSource};
use crate::engine::{CaptureOutcome, ClipboardHistoryEngine, HistoryView};
use crate::store::TextStore;

/// Requests from the UI to the engine task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SetMonitoring(bool),
    ToggleMonitoring,
    CopyToClipboard,
    /// Export to the given file.
    Export(PathBuf),
    Clear,
    Shutdown,
}

/// Updates sent from the engine task back to the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Full history text after a change.
    HistoryChanged(String),
    MonitoringChanged(bool),
    /// Number of history entries after a change.
    EntriesChanged(usize),
    /// One-line message for the status bar.
    Status(String),
}

/// Forwards history changes to the UI thread.
pub struct ChannelView(pub Sender<AppEvent>);

impl HistoryView for ChannelView {
    fn on_history_changed(&mut self, full_text: &str) {
        let _ = self.0.send(AppEvent::HistoryChanged(full_text.to_string()));
    }
}

/// Owns the engine and applies commands and capture events one at a time.
pub struct HistoryActor<C, S> {
    engine: ClipboardHistoryEngine<C, S>,
    commands: UnboundedReceiver<Command>,
    captures: UnboundedReceiver<CaptureEvent>,
    events: Sender<AppEvent>,
}

impl<C: ClipboardSource, S: TextStore> HistoryActor<C, S> {
    pub fn new(
        engine: ClipboardHistoryEngine<C, S>,
        commands: UnboundedReceiver<Command>,
        captures: UnboundedReceiver<CaptureEvent>,
        events: Sender<AppEvent>,
    ) -> Self {
        Self {
            engine,
            commands,
            captures,
            events,
        }
    }

    /// Run until a `Shutdown` command arrives or the UI drops its sender.
    pub async fn run(mut self) -> ClipboardHistoryEngine<C, S> {
        self.engine.load().await;
        self.publish_state().await;
        tracing::info!(
            "history engine ready (mode {}, store {})",
            self.engine.mode(),
            self.engine.store_path().display()
        );

        // Commands win over captures queued alongside them, so a Clear is
        // applied before any capture that was waiting when it arrived.
        let mut captures_open = true;
        loop {
            tokio::select! {
                biased;

                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle(command).await,
                },
                capture = self.captures.recv(), if captures_open => match capture {
                    Some(CaptureEvent) => self.capture().await,
                    None => {
                        tracing::debug!("capture channel closed");
                        captures_open = false;
                    }
                },
            }
        }

        tracing::info!("history engine stopped");
        self.engine
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::SetMonitoring(enabled) => self.set_monitoring(enabled),
            Command::ToggleMonitoring => {
                let enabled = !self.engine.is_monitoring();
                self.set_monitoring(enabled);
            }
            Command::CopyToClipboard => match self.engine.copy_to_clipboard().await {
                Ok(()) => self.status("Copied history to clipboard"),
                Err(e) => {
                    tracing::warn!("failed to set clipboard: {e}");
                    self.status("Failed to set clipboard");
                }
            },
            Command::Export(path) => match self.engine.export_to(&path).await {
                Ok(()) => self.status(format!("Exported to {}", path.display())),
                Err(e) => {
                    tracing::warn!("export failed: {e}");
                    self.status(format!("Export failed: {e}"));
                }
            },
            Command::Clear => {
                self.engine.clear().await;
                self.publish_count().await;
                self.status("History cleared");
            }
            Command::Shutdown => {}
        }
    }

    async fn capture(&mut self) {
        let outcome = self.engine.on_capture_event().await;
        if outcome == CaptureOutcome::Recorded {
            self.publish_count().await;
        } else {
            tracing::trace!("capture event ignored: {outcome:?}");
        }
    }

    fn set_monitoring(&mut self, enabled: bool) {
        self.engine.set_monitoring(enabled);
        tracing::info!("monitoring {}", if enabled { "enabled" } else { "disabled" });
        let _ = self.events.send(AppEvent::MonitoringChanged(enabled));
    }

    async fn publish_state(&mut self) {
        let text = self.engine.current_text().await;
        let _ = self.events.send(AppEvent::HistoryChanged(text));
        let _ = self
            .events
            .send(AppEvent::MonitoringChanged(self.engine.is_monitoring()));
        self.publish_count().await;
    }

    async fn publish_count(&mut self) {
        let count = self.engine.fragment_count().await;
        let _ = self.events.send(AppEvent::EntriesChanged(count));
    }

    fn status(&self, message: impl Into<String>) {
        let _ = self.events.send(AppEvent::Status(message.into()));
    }
}
