//! TUI event loop, input handling, and state management.

mod handlers;
mod render;

use anyhow::Result;
use crossterm::event::{self, Event};
use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};
use tokio::sync::mpsc;

use crate::{
    config::Config,
    events::{Phase, UiState},
    input::InputBoxState,
    normalize::NormalizedResult,
    session::{SelectedImage, Session},
    shortcuts::Shortcuts,
    toast::ToastStack,
    ui::Tui,
    worker::{self, WorkerCmd, WorkerEvent},
};

use handlers::{handle_key, is_ctrl_c};
use render::draw;

/// In-memory application state shared between input handling and
/// rendering.
pub struct App {
    /// Path to the persisted config file.
    pub cfg_path: PathBuf,
    /// Current config values in memory.
    pub cfg: Config,
    /// Screen, phase and status state.
    pub ui: UiState,
    /// Current selection and upload marker.
    pub session: Session,
    /// Last normalized analysis, when any.
    pub results: Option<NormalizedResult>,
    /// Live toast notifications.
    pub toasts: ToastStack,
    /// Command channel to the background worker.
    pub worker_tx: mpsc::Sender<WorkerCmd>,
    /// Event channel from the background worker.
    pub worker_rx: mpsc::Receiver<WorkerEvent>,

    /// Editable base URL for the settings screen.
    pub base_url_buf: String,
    /// Editable size cap (MB) for the settings screen.
    pub max_size_buf: String,

    /// Current input-box state (Some while typing).
    pub input_box: Option<InputBoxState>,

    /// Keybinding tables.
    pub shortcuts: Shortcuts,
}

/// Run the main TUI loop until the user exits.
pub async fn run_app(terminal: &mut Tui) -> Result<()> {
    let cfg_path = PathBuf::from("config.toml");
    let cfg = Config::load_or_default(&cfg_path)?;

    let shortcuts_path = PathBuf::from("shortcut.toml");
    let shortcuts = Shortcuts::load_or_default(&shortcuts_path)?;

    // Command/event channels between the UI and the worker.
    let (tx_cmd, rx_cmd) = mpsc::channel::<WorkerCmd>(64);
    let (tx_ev, rx_ev) = mpsc::channel::<WorkerEvent>(256);

    tokio::spawn(worker::run(rx_cmd, tx_ev, cfg.clone()));

    let mut app = App {
        cfg_path,
        cfg: cfg.clone(),
        ui: UiState::new(),
        session: Session::default(),
        results: None,
        toasts: ToastStack::default(),
        worker_tx: tx_cmd,
        worker_rx: rx_ev,
        base_url_buf: cfg.server.base_url.clone(),
        max_size_buf: cfg.upload.max_size_mb.to_string(),
        input_box: None,
        shortcuts,
    };

    loop {
        // Auto-dismiss toasts that have outlived their timer.
        app.toasts.expire(Instant::now());

        terminal.draw(|f| draw(f, &app))?;

        // Drain worker events before handling input.
        while let Ok(ev) = app.worker_rx.try_recv() {
            handle_worker_event(&mut app, ev);
        }

        // Short poll timeout keeps the UI responsive.
        if event::poll(Duration::from_millis(50))?
            && let Event::Key(k) = event::read()?
        {
            // Ctrl+C always exits, whatever the screen.
            if is_ctrl_c(&k) {
                break;
            }
            if handle_key(&mut app, k).await? {
                break;
            }
        }
    }
    Ok(())
}

/// Apply a worker event to the UI state.
fn handle_worker_event(app: &mut App, ev: WorkerEvent) {
    match ev {
        WorkerEvent::UploadDone { filename, message } => {
            // Mirror the worker's marker for display and skip decisions.
            app.session.uploaded_marker = Some(filename.clone());
            app.toasts
                .success(message.unwrap_or_else(|| "Image uploaded successfully.".into()));
            push_log(app, format!("uploaded {filename}"));
        }
        WorkerEvent::UploadFailed(msg) => {
            app.ui.phase = Phase::Failed;
            app.ui.error = Some(format!("Image upload failed: {msg}"));
            app.ui.status = "Upload failed".into();
            app.toasts.error("Image upload failed. Please try again.");
            push_log(app, format!("upload failed: {msg}"));
        }
        WorkerEvent::Analyzing => {
            app.ui.phase = Phase::Analyzing;
            app.ui.status = "Analyzing...".into();
        }
        WorkerEvent::AnalysisDone(result) => {
            push_log(app, format!("analysis done, plate {}", result.details.plate));
            app.results = Some(result);
            app.ui.phase = Phase::ShowingResults;
            // New results always start with the raw panel collapsed.
            app.ui.raw_expanded = false;
            app.ui.error = None;
            app.ui.status = "Analysis complete".into();
            app.toasts.success("Analysis completed successfully!");
        }
        WorkerEvent::AnalysisFailed(msg) => {
            app.ui.phase = Phase::Failed;
            app.ui.error = Some(format!("Analysis failed: {msg}"));
            app.ui.status = "Analysis failed".into();
            app.toasts.error("Analysis failed. Please try again.");
            push_log(app, format!("analysis failed: {msg}"));
        }
        WorkerEvent::Cleared { message } => {
            app.toasts
                .success(message.unwrap_or_else(|| "Cleared successfully.".into()));
            push_log(app, "server images cleared".into());
        }
        WorkerEvent::ClearFailed(msg) => {
            // The local reset already happened; only report.
            app.toasts.error("Failed to clear server images.");
            push_log(app, format!("clear failed: {msg}"));
        }
        WorkerEvent::Log(s) => {
            push_log(app, s);
        }
    }
}

/// Append a timestamped line to the activity log.
fn push_log(app: &mut App, line: String) {
    let stamped = format!("{} {}", chrono::Local::now().format("%H:%M:%S"), line);
    app.ui.log.push(stamped);
}

/// Load, validate and select an image from the given path.
pub async fn select_image(app: &mut App, path_str: &str) -> Result<()> {
    let path = Path::new(path_str.trim());
    match SelectedImage::load(path, app.cfg.max_upload_bytes()).await {
        Ok(img) => {
            push_log(app, format!("selected {} ({} bytes)", img.filename, img.size()));
            app.session.select(img);
            // New content may hide behind an old name; force re-upload.
            app.worker_tx.send(WorkerCmd::InvalidateUpload).await?;
            app.results = None;
            app.ui.phase = Phase::FileSelected;
            app.ui.error = None;
            app.ui.status = "Image ready".into();
            app.toasts
                .success("Image loaded successfully! Ready to analyze.");
        }
        Err(e) => {
            // Selection is left untouched; no upload is attempted.
            app.toasts.error(format!("{e}"));
            push_log(app, format!("rejected candidate: {e}"));
        }
    }
    Ok(())
}

/// Kick off the upload-then-analyze sequence for the current selection.
pub async fn trigger_analyze(app: &mut App) -> Result<()> {
    if app.ui.phase.busy() {
        // The sole mutual-exclusion guard: an in-flight sequence makes
        // the trigger inert, like a disabled button.
        return Ok(());
    }
    let Some(img) = app.session.current.clone() else {
        app.toasts.error("No file selected for analysis.");
        return Ok(());
    };

    app.results = None;
    app.ui.error = None;
    app.ui.phase = Phase::Uploading;
    app.ui.status = "Uploading...".into();
    push_log(app, format!("analyze requested for {}", img.filename));

    app.worker_tx
        .send(WorkerCmd::Analyze {
            filename: img.filename,
            mime: img.mime,
            bytes: img.bytes,
        })
        .await?;
    Ok(())
}

/// Clear the local session and ask the server to do the same. A server
/// failure is reported but never undoes the local reset.
pub async fn reset(app: &mut App) -> Result<()> {
    if app.ui.phase.busy() {
        return Ok(());
    }
    app.session.reset();
    app.results = None;
    app.ui.phase = Phase::Idle;
    app.ui.error = None;
    app.ui.raw_expanded = false;
    app.ui.status = "Ready".into();
    push_log(app, "session reset".into());
    app.worker_tx.send(WorkerCmd::ClearRemote).await?;
    Ok(())
}
