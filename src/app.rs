use std::path::PathBuf;

use chrono::Local;
use tokio::sync::mpsc::UnboundedSender;

use crate::actor::{AppEvent, Command};
use crate::config::default_export_name;
use crate::history::PersistenceMode;

/// Terminal UI state. Mirrors what the engine task reports and turns key
/// presses into [`Command`]s.
pub struct App {
    /// Full history text as last reported by the engine.
    pub history: String,
    /// Whether capture is on.
    pub monitoring: bool,
    pub mode: PersistenceMode,
    pub store_path: PathBuf,
    /// Entry count reported by the engine.
    pub entries: usize,
    /// First visible line of the history pane.
    pub scroll: u16,
    /// Rows the history pane showed at the last render.
    viewport_rows: u16,
    /// Keep the newest line in view as history grows.
    follow_tail: bool,
    /// Whether the app should quit.
    pub should_quit: bool,
    /// Status message shown temporarily.
    pub status_message: Option<String>,
    export_dir: PathBuf,
    commands: UnboundedSender<Command>,
}

impl App {
    pub fn new(
        mode: PersistenceMode,
        store_path: PathBuf,
        export_dir: PathBuf,
        commands: UnboundedSender<Command>,
    ) -> Self {
        Self {
            history: String::new(),
            monitoring: false,
            entries: 0,
            mode,
            store_path,
            scroll: 0,
            viewport_rows: 0,
            follow_tail: true,
            should_quit: false,
            status_message: None,
            export_dir,
            commands,
        }
    }

    /// Apply an update from the engine task.
    pub fn apply_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::HistoryChanged(text) => {
                self.history = text;
                self.clamp_scroll();
            }
            AppEvent::MonitoringChanged(enabled) => self.monitoring = enabled,
            AppEvent::EntriesChanged(count) => self.entries = count,
            AppEvent::Status(message) => self.status_message = Some(message),
        }
    }

    pub fn line_count(&self) -> usize {
        self.history.lines().count()
    }

    pub fn toggle_monitoring(&mut self) {
        self.send(Command::ToggleMonitoring);
    }

    pub fn copy_history(&mut self) {
        self.send(Command::CopyToClipboard);
    }

    /// Export to a timestamped file in the export directory.
    pub fn export_history(&mut self) {
        let path = self.export_dir.join(default_export_name(Local::now()));
        self.send(Command::Export(path));
    }

    pub fn clear_history(&mut self) {
        self.send(Command::Clear);
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
        self.send(Command::Shutdown);
    }

    /// Record how many history rows fit on screen. Called by the renderer.
    pub fn set_viewport_rows(&mut self, rows: u16) {
        if rows != self.viewport_rows {
            self.viewport_rows = rows;
            self.clamp_scroll();
        }
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
        self.follow_tail = self.scroll >= self.max_scroll();
    }

    pub fn scroll_down(&mut self) {
        if self.scroll < self.max_scroll() {
            self.scroll += 1;
        }
        self.follow_tail = self.scroll >= self.max_scroll();
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll = 0;
        self.follow_tail = self.max_scroll() == 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll = self.max_scroll();
        self.follow_tail = true;
    }

    /// Largest offset that still fills the pane.
    fn max_scroll(&self) -> u16 {
        let hidden = self
            .line_count()
            .saturating_sub(usize::from(self.viewport_rows.max(1)));
        u16::try_from(hidden).unwrap_or(u16::MAX)
    }

    fn clamp_scroll(&mut self) {
        if self.follow_tail {
            self.scroll = self.max_scroll();
        } else {
            self.scroll = self.scroll.min(self.max_scroll());
        }
    }

    fn send(&mut self, command: Command) {
        if self.commands.send(command).is_err() && !self.should_quit {
            tracing::warn!("history engine is not running");
            self.status_message = Some("History engine is not running".to_string());
        }
    }
}
