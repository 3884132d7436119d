use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Local;
use clap::Parser;
use crossterm::ExecutableCommand;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use clip_exporter::actor::{AppEvent, ChannelView, Command, HistoryActor};
use clip_exporter::app::App;
use clip_exporter::clipboard::{
    CaptureEvent, ClipboardMonitor, MemoryClipboard, SelfWriteGuard, SystemClipboard,
};
use clip_exporter::config::{Cli, CliCommand, Config, default_export_name};
use clip_exporter::engine::ClipboardHistoryEngine;
use clip_exporter::error::{AppError, Result};
use clip_exporter::history::PersistenceMode;
use clip_exporter::store::FileTextStore;
use clip_exporter::tui;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let command = cli.command.clone().unwrap_or(CliCommand::Run);

    // Logging first, so config problems are reported.
    match command {
        CliCommand::Run => init_file_logging(),
        _ => init_stderr_logging(),
    }

    let mut config = Config::load(cli.config.as_deref());
    config.apply_cli(&cli);

    match command {
        CliCommand::Run => {
            // Only write default config if no custom path was specified
            if cli.config.is_none() {
                let _ = Config::write_default_if_missing(&Config::config_path());
            }
            run_tui(config)?;
        }
        CliCommand::InitConfig => {
            let path = cli.config.clone().unwrap_or_else(Config::config_path);
            let written = Config::write_default_if_missing(&path)
                .map_err(|e| AppError::Config(format!("{}: {e}", path.display())))?;
            if written {
                println!("wrote {}", path.display());
            } else {
                println!("{} already exists", path.display());
            }
        }
        command => run_one_shot(config, command)?,
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// File-based logging; the TUI owns stdout.
fn init_file_logging() {
    let log_dir = Config::data_dir();
    let _ = std::fs::create_dir_all(&log_dir);
    let log_file = std::fs::File::create(log_dir.join("clip-exporter.log")).ok();
    if let Some(file) = log_file {
        tracing_subscriber::fmt()
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .init();
    }
}

fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();
}

// ---------------------------------------------------------------------------
// One-shot commands against the backing store
// ---------------------------------------------------------------------------

fn run_one_shot(config: Config, command: CliCommand) -> Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    rt.block_on(async {
        // The system clipboard is never touched here.
        let mut engine = ClipboardHistoryEngine::new(
            config.history.mode,
            MemoryClipboard::new(),
            FileTextStore::new(),
            config.store_path(),
        );
        engine.load().await;

        match command {
            CliCommand::Show => print!("{}", engine.current_text().await),
            CliCommand::Export { path } => {
                let path = path.unwrap_or_else(|| {
                    config.export_dir().join(default_export_name(Local::now()))
                });
                engine.export_to(&path).await?;
                println!("exported to {}", path.display());
            }
            CliCommand::Clear => {
                engine.clear().await;
                println!("{}", clear_report(engine.mode(), engine.store_path()));
            }
            CliCommand::Run | CliCommand::InitConfig => {}
        }
        Ok::<(), AppError>(())
    })
}

/// What `clear` did, for the user.
fn clear_report(mode: PersistenceMode, store_path: &Path) -> String {
    if mode.uses_store() {
        format!("cleared {}", store_path.display())
    } else {
        format!("nothing to clear: {mode} keeps no history between runs")
    }
}

// ---------------------------------------------------------------------------
// Terminal UI
// ---------------------------------------------------------------------------

fn run_tui(config: Config) -> Result<()> {
    let (cmd_tx, cmd_rx) = tokio::sync::mpsc::unbounded_channel::<Command>();
    let (capture_tx, capture_rx) = tokio::sync::mpsc::unbounded_channel::<CaptureEvent>();
    let (event_tx, event_rx) = std::sync::mpsc::channel::<AppEvent>();

    let guard = config
        .monitor
        .ignore_self_writes
        .then(SelfWriteGuard::new);
    let stop = Arc::new(AtomicBool::new(false));

    let monitor_handle =
        spawn_clipboard_monitor(capture_tx, guard.clone(), stop.clone(), config.poll_interval());
    let engine_handle = spawn_engine(&config, cmd_rx, capture_rx, event_tx, guard);

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(
        config.history.mode,
        config.store_path(),
        config.export_dir(),
        cmd_tx.clone(),
    );

    let result = event_loop(&mut terminal, &mut app, &event_rx);

    // Cleanup
    disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;
    io::stdout().execute(Clear(ClearType::All))?;

    let _ = cmd_tx.send(Command::Shutdown);
    stop.store(true, Ordering::Release);
    let _ = engine_handle.join();
    let _ = monitor_handle.join();
    tracing::info!("clip-exporter shutdown complete");
    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &std::sync::mpsc::Receiver<AppEvent>,
) -> Result<()> {
    let tick_rate = Duration::from_millis(100);

    loop {
        // Process engine updates (non-blocking)
        while let Ok(update) = events.try_recv() {
            app.apply_event(update);
        }

        terminal.draw(|frame| tui::render(frame, &mut *app))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                // Clear status message on any keypress
                app.status_message = None;

                match key.code {
                    KeyCode::Char('q') => app.quit(),
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        app.quit()
                    }
                    KeyCode::Char('m') | KeyCode::Char(' ') => app.toggle_monitoring(),
                    KeyCode::Char('c') => app.copy_history(),
                    KeyCode::Char('e') => app.export_history(),
                    KeyCode::Char('x') => app.clear_history(),
                    KeyCode::Char('j') | KeyCode::Down => app.scroll_down(),
                    KeyCode::Char('k') | KeyCode::Up => app.scroll_up(),
                    KeyCode::Char('g') => app.scroll_to_top(),
                    KeyCode::Char('G') => app.scroll_to_bottom(),
                    _ => {}
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

// ---------------------------------------------------------------------------
// Background threads
// ---------------------------------------------------------------------------

fn spawn_clipboard_monitor(
    capture_tx: UnboundedSender<CaptureEvent>,
    guard: Option<SelfWriteGuard>,
    stop: Arc<AtomicBool>,
    interval: Duration,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        let clipboard = match SystemClipboard::new() {
            Ok(c) => c,
            Err(e) => {
                tracing::error!("clipboard monitor error: {e}");
                return;
            }
        };
        let mut monitor = ClipboardMonitor::new(clipboard, interval);
        if let Some(guard) = guard {
            monitor = monitor.with_self_write_guard(guard);
        }
        monitor.run(capture_tx, stop);
    })
}

/// Run the history engine on its own single-threaded runtime. Every
/// command and capture is handled there, one at a time.
fn spawn_engine(
    config: &Config,
    commands: UnboundedReceiver<Command>,
    captures: UnboundedReceiver<CaptureEvent>,
    events: std::sync::mpsc::Sender<AppEvent>,
    guard: Option<SelfWriteGuard>,
) -> std::thread::JoinHandle<()> {
    let mode = config.history.mode;
    let store_path: PathBuf = config.store_path();
    let start_enabled = config.monitor.start_enabled;

    std::thread::spawn(move || {
        let rt = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                tracing::error!("failed to build tokio runtime: {e}");
                let _ = events.send(AppEvent::Status(format!("Engine failed to start: {e}")));
                return;
            }
        };

        let clipboard = match SystemClipboard::new() {
            Ok(c) => c,
            Err(e) => {
                tracing::error!("system clipboard unavailable: {e}");
                let _ = events.send(AppEvent::Status(format!("Clipboard unavailable: {e}")));
                return;
            }
        };

        let mut engine = ClipboardHistoryEngine::new(mode, clipboard, FileTextStore::new(), store_path)
            .with_view(Box::new(ChannelView(events.clone())))
            .with_monitoring(start_enabled);
        if let Some(guard) = guard {
            engine = engine.with_self_write_guard(guard);
        }

        let actor = HistoryActor::new(engine, commands, captures, events);
        rt.block_on(actor.run());
    })
}
