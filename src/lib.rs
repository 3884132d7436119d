pub mod actor;
pub mod app;
pub mod clipboard;
pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod store;
pub mod tui;

pub use engine::{CaptureOutcome, ClipboardHistoryEngine, HistoryView};
pub use history::PersistenceMode;
