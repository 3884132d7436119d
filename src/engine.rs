use std::path::{Path, PathBuf};

use crate::clipboard::{ClipboardSource, SelfWriteGuard};
use crate::error::{ClipboardError, EngineError, StoreError};
use crate::history::{HistoryRecord, PersistenceMode};
use crate::store::TextStore;

/// Receives the full history text after every change.
pub trait HistoryView: Send + Sync {
    fn on_history_changed(&mut self, full_text: &str);
}

/// Result of handling one capture event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// A fragment was appended to the history.
    Recorded,
    /// Monitoring is off.
    Disabled,
    /// The clipboard could not be read or holds no text.
    Unavailable,
    /// The clipboard text was empty or whitespace only.
    Empty,
    /// The backing store rejected the fragment; history is unchanged.
    NotStored,
}

/// Clipboard history capture and persistence.
///
/// All mutating operations take `&mut self` and finish their store writes
/// before returning, so operations issued one after another complete in
/// issue order.
pub struct ClipboardHistoryEngine<C, S> {
    clipboard: C,
    store: S,
    store_path: PathBuf,
    mode: PersistenceMode,
    enabled: bool,
    history: HistoryRecord,
    view: Option<Box<dyn HistoryView>>,
    self_writes: Option<SelfWriteGuard>,
}

impl<C: ClipboardSource, S: TextStore> ClipboardHistoryEngine<C, S> {
    pub fn new(mode: PersistenceMode, clipboard: C, store: S, store_path: PathBuf) -> Self {
        Self {
            clipboard,
            store,
            store_path,
            mode,
            enabled: false,
            history: HistoryRecord::for_mode(mode),
            view: None,
            self_writes: None,
        }
    }

    pub fn with_view(mut self, view: Box<dyn HistoryView>) -> Self {
        self.view = Some(view);
        self
    }

    /// Mark our own clipboard writes so a monitor sharing `guard` skips them.
    pub fn with_self_write_guard(mut self, guard: SelfWriteGuard) -> Self {
        self.self_writes = Some(guard);
        self
    }

    pub fn with_monitoring(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn mode(&self) -> PersistenceMode {
        self.mode
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    pub fn is_monitoring(&self) -> bool {
        self.enabled
    }

    /// Restore in-memory history from the backing store.
    ///
    /// Only the mirrored and list modes keep an in-memory copy that can go
    /// stale across runs; the other modes are left untouched.
    pub async fn load(&mut self) {
        if !matches!(
            self.mode,
            PersistenceMode::FileAppendMirrored | PersistenceMode::InMemoryList
        ) {
            return;
        }
        let text = self.read_store().await;
        self.history = HistoryRecord::from_persisted(self.mode, &text);
        tracing::debug!(
            "restored {} bytes of history from {}",
            text.len(),
            self.store_path.display()
        );
    }

    pub fn set_monitoring(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Handle a clipboard change notification by pulling the current text.
    pub async fn on_capture_event(&mut self) -> CaptureOutcome {
        if !self.enabled {
            return CaptureOutcome::Disabled;
        }

        let fragment = match self.clipboard.get_text() {
            Ok(Some(text)) => text,
            Ok(None) => return CaptureOutcome::Unavailable,
            Err(e) => {
                tracing::debug!("capture skipped: {e}");
                return CaptureOutcome::Unavailable;
            }
        };
        if fragment.trim().is_empty() {
            return CaptureOutcome::Empty;
        }

        match self.mode {
            PersistenceMode::TransientBuffer => self.history.push(&fragment),
            PersistenceMode::FileAppendMirrored | PersistenceMode::FileAppendOnly => {
                if !self.append_to_store(&fragment).await {
                    return CaptureOutcome::NotStored;
                }
                if self.mode == PersistenceMode::FileAppendMirrored {
                    self.history.push(&fragment);
                }
            }
            // The list is the history; the store only mirrors it.
            PersistenceMode::InMemoryList => {
                self.history.push(&fragment);
                let joined = self.history.materialize();
                self.overwrite_store(&joined).await;
            }
        }
        tracing::debug!("captured {} bytes", fragment.len());

        self.notify_view().await;
        CaptureOutcome::Recorded
    }

    /// The fully materialized history. A missing or unreadable store reads
    /// as empty.
    pub async fn current_text(&self) -> String {
        if self.mode.reads_store() {
            self.read_store().await
        } else {
            self.history.materialize()
        }
    }

    /// Number of entries in the history: list items in list mode, lines
    /// otherwise.
    pub async fn fragment_count(&self) -> usize {
        match &self.history {
            HistoryRecord::List(list) if !self.mode.reads_store() => list.len(),
            _ => self.current_text().await.lines().count(),
        }
    }

    /// Put the whole history on the clipboard.
    pub async fn copy_to_clipboard(&mut self) -> Result<(), ClipboardError> {
        let text = self.current_text().await;
        if let Some(guard) = &self.self_writes {
            guard.mark(&text);
        }
        let result = self.clipboard.set_text(&text);
        if result.is_err() {
            if let Some(guard) = &self.self_writes {
                guard.cancel();
            }
        }
        result
    }

    /// Write the history verbatim to `path`.
    pub async fn export_to(&self, path: &Path) -> Result<(), EngineError> {
        let text = self.current_text().await;
        self.store
            .overwrite(path, &text)
            .await
            .map_err(|source| EngineError::StoreWrite {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::info!("exported {} bytes to {}", text.len(), path.display());
        Ok(())
    }

    /// Drop all history, in memory and in the backing store.
    pub async fn clear(&mut self) {
        self.history.clear();
        if self.mode.uses_store() {
            self.overwrite_store("").await;
        }
        tracing::info!("history cleared");
        self.notify_view().await;
    }

    async fn notify_view(&mut self) {
        if self.view.is_none() {
            return;
        }
        let text = self.current_text().await;
        if let Some(view) = self.view.as_mut() {
            view.on_history_changed(&text);
        }
    }

    async fn read_store(&self) -> String {
        match self.store.read_all(&self.store_path).await {
            Ok(text) => text,
            Err(StoreError::NotFound(_)) => String::new(),
            Err(e) => {
                tracing::warn!("failed to read history: {e}");
                String::new()
            }
        }
    }

    /// Returns `false` if the fragment did not reach the store.
    async fn append_to_store(&self, fragment: &str) -> bool {
        let line = format!("{fragment}\n");
        let result = match self.store.create_if_absent(&self.store_path).await {
            Ok(()) => self.store.append(&self.store_path, &line).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("failed to append clipboard entry: {e}");
                false
            }
        }
    }

    async fn overwrite_store(&self, text: &str) {
        if let Err(e) = self.store.overwrite(&self.store_path, text).await {
            tracing::warn!("failed to rewrite history: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::clipboard::{MemoryClipboard, content_hash};
    use crate::store::MemoryTextStore;

    const ALL_MODES: [PersistenceMode; 4] = [
        PersistenceMode::TransientBuffer,
        PersistenceMode::FileAppendMirrored,
        PersistenceMode::FileAppendOnly,
        PersistenceMode::InMemoryList,
    ];

    #[derive(Clone, Default)]
    struct RecordingView(Arc<Mutex<Vec<String>>>);

    impl HistoryView for RecordingView {
        fn on_history_changed(&mut self, full_text: &str) {
            self.0.lock().unwrap().push(full_text.to_string());
        }
    }

    struct Harness {
        engine: ClipboardHistoryEngine<MemoryClipboard, MemoryTextStore>,
        clipboard: MemoryClipboard,
        store: MemoryTextStore,
        view: RecordingView,
    }

    impl Harness {
        fn new(mode: PersistenceMode) -> Self {
            let clipboard = MemoryClipboard::new();
            let store = MemoryTextStore::new();
            let view = RecordingView::default();
            let engine = ClipboardHistoryEngine::new(
                mode,
                clipboard.clone(),
                store.clone(),
                PathBuf::from("clipboard.txt"),
            )
            .with_view(Box::new(view.clone()));
            Self {
                engine,
                clipboard,
                store,
                view,
            }
        }

        async fn copy(&mut self, text: &str) -> CaptureOutcome {
            self.clipboard.put(Some(text));
            self.engine.on_capture_event().await
        }

        fn persisted(&self) -> Option<String> {
            self.store.contents(Path::new("clipboard.txt"))
        }

        fn notifications(&self) -> Vec<String> {
            self.view.0.lock().unwrap().clone()
        }
    }

    fn expected(mode: PersistenceMode, fragments: &[&str]) -> String {
        if mode == PersistenceMode::InMemoryList {
            fragments.join("\n")
        } else {
            fragments.iter().map(|f| format!("{f}\n")).collect()
        }
    }

    #[tokio::test]
    async fn starts_disabled_and_ignores_captures() {
        for mode in ALL_MODES {
            let mut h = Harness::new(mode);
            assert!(!h.engine.is_monitoring());
            assert_eq!(h.copy("ignored").await, CaptureOutcome::Disabled);
            assert_eq!(h.engine.current_text().await, "");
            assert_eq!(h.persisted(), None);
            assert!(h.notifications().is_empty());
        }
    }

    #[tokio::test]
    async fn alpha_empty_beta_scenario() {
        for mode in ALL_MODES {
            let mut h = Harness::new(mode);
            h.engine.set_monitoring(true);

            assert_eq!(h.copy("alpha").await, CaptureOutcome::Recorded);
            assert_eq!(h.copy("").await, CaptureOutcome::Empty);
            assert_eq!(h.copy("beta").await, CaptureOutcome::Recorded);

            assert_eq!(
                h.engine.current_text().await,
                expected(mode, &["alpha", "beta"]),
                "mode {mode}"
            );

            h.engine.clear().await;
            assert_eq!(h.engine.current_text().await, "", "mode {mode}");
        }
    }

    #[tokio::test]
    async fn whitespace_and_non_text_are_discarded() {
        let mut h = Harness::new(PersistenceMode::FileAppendOnly);
        h.engine.set_monitoring(true);

        assert_eq!(h.copy("  \n\t ").await, CaptureOutcome::Empty);
        h.clipboard.put(None);
        assert_eq!(h.engine.on_capture_event().await, CaptureOutcome::Unavailable);
        h.clipboard.set_unavailable(true);
        assert_eq!(h.engine.on_capture_event().await, CaptureOutcome::Unavailable);

        assert_eq!(h.engine.current_text().await, "");
        assert_eq!(h.persisted(), None);
        assert!(h.notifications().is_empty());
    }

    #[tokio::test]
    async fn fragments_keep_order_and_duplicates() {
        let mut h = Harness::new(PersistenceMode::InMemoryList);
        h.engine.set_monitoring(true);
        for text in ["b", "a", "b", "b"] {
            h.copy(text).await;
        }
        assert_eq!(h.engine.current_text().await, "b\na\nb\nb");
        assert_eq!(h.engine.fragment_count().await, 4);
    }

    #[tokio::test]
    async fn toggling_gates_captures() {
        let mut h = Harness::new(PersistenceMode::TransientBuffer);
        h.engine.set_monitoring(true);
        h.copy("one").await;
        h.engine.set_monitoring(false);
        h.copy("two").await;
        h.engine.set_monitoring(true);
        h.copy("three").await;

        assert_eq!(h.engine.current_text().await, "one\nthree\n");
    }

    #[tokio::test]
    async fn storage_mechanics_per_mode() {
        let mut h = Harness::new(PersistenceMode::TransientBuffer);
        h.engine.set_monitoring(true);
        h.copy("x").await;
        assert_eq!(h.persisted(), None);

        let mut h = Harness::new(PersistenceMode::FileAppendOnly);
        h.engine.set_monitoring(true);
        h.copy("x").await;
        h.copy("y").await;
        assert_eq!(h.persisted().as_deref(), Some("x\ny\n"));

        let mut h = Harness::new(PersistenceMode::InMemoryList);
        h.engine.set_monitoring(true);
        h.copy("x").await;
        h.copy("y").await;
        assert_eq!(h.persisted().as_deref(), Some("x\ny"));
    }

    #[tokio::test]
    async fn file_modes_read_back_the_store() {
        let mut h = Harness::new(PersistenceMode::FileAppendMirrored);
        h.engine.set_monitoring(true);
        h.copy("mine").await;

        // Whatever is in the file wins over the mirror.
        h.store
            .overwrite(Path::new("clipboard.txt"), "edited\n")
            .await
            .unwrap();
        assert_eq!(h.engine.current_text().await, "edited\n");
    }

    #[tokio::test]
    async fn missing_store_reads_empty() {
        for mode in ALL_MODES {
            let h = Harness::new(mode);
            assert_eq!(h.engine.current_text().await, "");
        }
    }

    #[tokio::test]
    async fn clear_is_idempotent_and_notifies() {
        for mode in ALL_MODES {
            let mut h = Harness::new(mode);
            h.engine.set_monitoring(true);
            h.copy("alpha").await;

            h.engine.clear().await;
            let once = h.engine.current_text().await;
            h.engine.clear().await;
            let twice = h.engine.current_text().await;

            assert_eq!(once, "");
            assert_eq!(once, twice);
            if mode.uses_store() {
                assert_eq!(h.persisted().as_deref(), Some(""), "mode {mode}");
            }
            let notes = h.notifications();
            assert_eq!(notes.last().map(String::as_str), Some(""));
            assert_eq!(notes.len(), 3, "mode {mode}");
        }
    }

    #[tokio::test]
    async fn capture_after_clear_starts_fresh() {
        let mut h = Harness::new(PersistenceMode::FileAppendMirrored);
        h.engine.set_monitoring(true);
        h.copy("old").await;
        h.engine.clear().await;
        h.copy("new").await;
        assert_eq!(h.engine.current_text().await, "new\n");
    }

    #[tokio::test]
    async fn notifications_carry_full_text() {
        let mut h = Harness::new(PersistenceMode::FileAppendOnly);
        h.engine.set_monitoring(true);
        h.copy("alpha").await;
        h.copy("beta").await;
        assert_eq!(h.notifications(), vec!["alpha\n", "alpha\nbeta\n"]);
    }

    #[tokio::test]
    async fn copy_pushes_history_once() {
        for mode in ALL_MODES {
            let mut h = Harness::new(mode);
            h.engine.set_monitoring(true);
            h.copy("alpha").await;
            h.copy("beta").await;

            h.engine.copy_to_clipboard().await.unwrap();
            assert_eq!(h.clipboard.writes(), vec![expected(mode, &["alpha", "beta"])]);
        }
    }

    #[tokio::test]
    async fn copy_marks_self_write() {
        let mut h = Harness::new(PersistenceMode::TransientBuffer);
        let guard = SelfWriteGuard::new();
        h.engine = h.engine.with_self_write_guard(guard.clone());
        h.engine.set_monitoring(true);
        h.copy("alpha").await;

        h.engine.copy_to_clipboard().await.unwrap();
        assert!(guard.take_if_matches(&content_hash(Some("alpha\n"))));
    }

    #[tokio::test]
    async fn failed_copy_cancels_self_write_mark() {
        let mut h = Harness::new(PersistenceMode::TransientBuffer);
        let guard = SelfWriteGuard::new();
        h.engine = h.engine.with_self_write_guard(guard.clone());

        h.clipboard.set_unavailable(true);
        assert!(h.engine.copy_to_clipboard().await.is_err());
        assert!(!guard.take_if_matches(&content_hash(Some(""))));
    }

    #[tokio::test]
    async fn export_round_trips_through_store() {
        for mode in ALL_MODES {
            let mut h = Harness::new(mode);
            h.engine.set_monitoring(true);
            h.copy("alpha").await;
            h.copy("beta").await;

            let target = Path::new("exports/2024-01-01-00-00-00-000.txt");
            h.engine.export_to(target).await.unwrap();
            assert_eq!(
                h.store.read_all(target).await.unwrap(),
                h.engine.current_text().await
            );
        }
    }

    #[tokio::test]
    async fn export_failure_is_surfaced() {
        let h = Harness::new(PersistenceMode::TransientBuffer);
        h.store.set_fail_writes(true);
        let err = h.engine.export_to(Path::new("out.txt")).await.unwrap_err();
        match err {
            EngineError::StoreWrite { path, .. } => assert_eq!(path, PathBuf::from("out.txt")),
        }
    }

    #[tokio::test]
    async fn store_write_failures_do_not_crash() {
        let mut h = Harness::new(PersistenceMode::FileAppendMirrored);
        h.engine.set_monitoring(true);
        h.store.set_fail_writes(true);

        assert_eq!(h.copy("lost").await, CaptureOutcome::NotStored);
        assert_eq!(h.engine.current_text().await, "");
        h.engine.clear().await;
        assert_eq!(h.engine.current_text().await, "");
    }

    #[tokio::test]
    async fn failed_append_leaves_mirror_untouched() {
        for mode in [PersistenceMode::FileAppendMirrored, PersistenceMode::FileAppendOnly] {
            let mut h = Harness::new(mode);
            h.engine.set_monitoring(true);
            h.copy("kept").await;

            h.store.set_fail_writes(true);
            assert_eq!(h.copy("lost").await, CaptureOutcome::NotStored, "mode {mode}");
            h.store.set_fail_writes(false);
            h.copy("after").await;

            assert_eq!(h.engine.current_text().await, "kept\nafter\n", "mode {mode}");
            // No notification for the rejected fragment.
            assert_eq!(h.notifications(), vec!["kept\n", "kept\nafter\n"]);
        }
    }

    #[tokio::test]
    async fn load_restores_list_and_mirror() {
        let store = MemoryTextStore::new();
        let path = PathBuf::from("clipboard.txt");
        store.overwrite(&path, "a\nb\n").await.unwrap();

        let mut engine = ClipboardHistoryEngine::new(
            PersistenceMode::InMemoryList,
            MemoryClipboard::new(),
            store.clone(),
            path.clone(),
        );
        engine.load().await;
        assert_eq!(engine.current_text().await, "a\nb");
        assert_eq!(engine.fragment_count().await, 2);

        let clipboard = MemoryClipboard::new();
        let mut engine = ClipboardHistoryEngine::new(
            PersistenceMode::InMemoryList,
            clipboard.clone(),
            store.clone(),
            path.clone(),
        )
        .with_monitoring(true);
        engine.load().await;
        clipboard.put(Some("c"));
        engine.on_capture_event().await;
        assert_eq!(store.contents(&path).as_deref(), Some("a\nb\nc"));
    }
}
