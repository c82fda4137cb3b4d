//! Key-input handlers.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::{
    events::Screen,
    input::{InputBoxState, InputCallbackId},
    shortcuts,
    worker::WorkerCmd,
};

use super::{App, reset, select_image, trigger_analyze};

/// Handle one key event; returns true when the app should exit.
pub async fn handle_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    // An open input box captures everything first.
    if app.input_box.is_some() {
        return handle_input_box_key(app, k).await;
    }

    match app.ui.screen {
        Screen::Main => handle_main_key(app, k).await,
        Screen::Settings => handle_settings_key(app, k).await,
    }
}

/// Whether the event is Ctrl+C.
pub fn is_ctrl_c(k: &KeyEvent) -> bool {
    k.modifiers.contains(KeyModifiers::CONTROL) && k.code == KeyCode::Char('c')
}

/// Main screen keys.
async fn handle_main_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    let sc = &app.shortcuts.main;

    if shortcuts::matches_shortcut(&k, &sc.quit) {
        return Ok(true);
    } else if shortcuts::matches_shortcut(&k, &sc.open_image) {
        // Picking a new image is allowed except mid-sequence.
        if !app.ui.phase.busy() {
            app.input_box = Some(InputBoxState::new(
                "Image path:",
                String::new(),
                InputCallbackId::ImagePath,
            ));
        }
    } else if shortcuts::matches_shortcut(&k, &sc.analyze) {
        if app.ui.phase.can_analyze() {
            trigger_analyze(app).await?;
        }
    } else if shortcuts::matches_shortcut(&k, &sc.reset) {
        reset(app).await?;
    } else if shortcuts::matches_shortcut(&k, &sc.toggle_raw) {
        // Pure UI flip; nothing is re-fetched.
        if app.results.is_some() {
            app.ui.raw_expanded = !app.ui.raw_expanded;
        }
    } else if shortcuts::matches_shortcut(&k, &sc.settings) {
        if !app.ui.phase.busy() {
            reload_settings_buffers(app);
            app.ui.screen = Screen::Settings;
            app.ui.status = "Settings".into();
        }
    } else if shortcuts::matches_shortcut(&k, &sc.dismiss_toast) {
        app.toasts.dismiss_oldest();
    }

    Ok(false)
}

/// Settings screen keys.
async fn handle_settings_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    let sc = &app.shortcuts.settings;

    if shortcuts::matches_shortcut(&k, &sc.cancel) {
        // Discard edits and return to the main screen.
        reload_settings_buffers(app);
        app.ui.screen = Screen::Main;
        app.ui.status = "Ready".into();
    } else if shortcuts::matches_shortcut(&k, &sc.save) {
        app.cfg.server.base_url = app.base_url_buf.trim().to_string();
        if let Ok(mb) = app.max_size_buf.trim().parse::<u64>() {
            app.cfg.upload.max_size_mb = mb;
        }
        app.cfg.save(&app.cfg_path)?;

        // The worker rebuilds its client from the new settings.
        app.worker_tx
            .send(WorkerCmd::SaveSettings(app.cfg.clone()))
            .await?;
        app.ui.screen = Screen::Main;
        app.ui.status = "Saved settings".into();
        app.toasts.info("Settings saved.");
    } else if shortcuts::matches_shortcut(&k, &sc.base_url) {
        app.input_box = Some(InputBoxState::new(
            "Backend base URL:",
            app.base_url_buf.clone(),
            InputCallbackId::SettingsBaseUrl,
        ));
    } else if shortcuts::matches_shortcut(&k, &sc.max_size) {
        app.input_box = Some(InputBoxState::new(
            "Max upload size (MB):",
            app.max_size_buf.clone(),
            InputCallbackId::SettingsMaxSize,
        ));
    }

    Ok(false)
}

/// Input-box keys.
async fn handle_input_box_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    let Some(input_state) = &mut app.input_box else {
        return Ok(false);
    };

    let sc = &app.shortcuts.input_box;

    if is_ctrl_c(&k) {
        return Ok(true);
    }

    if shortcuts::matches_shortcut(&k, &sc.confirm) {
        // Close the box before applying so callbacks can open a new one.
        let value = input_state.value.clone();
        let callback_id = input_state.callback_id.clone();
        app.input_box = None;
        apply_input_callback(app, callback_id, value).await?;
    } else if shortcuts::matches_shortcut(&k, &sc.cancel) {
        app.input_box = None;
    } else if shortcuts::matches_shortcut(&k, &sc.backspace) {
        input_state.backspace();
    } else if shortcuts::matches_shortcut(&k, &sc.delete) {
        input_state.delete();
    } else if shortcuts::matches_shortcut(&k, &sc.left) {
        input_state.move_left();
    } else if shortcuts::matches_shortcut(&k, &sc.right) {
        input_state.move_right();
    } else if shortcuts::matches_shortcut(&k, &sc.home) {
        input_state.move_home();
    } else if shortcuts::matches_shortcut(&k, &sc.end) {
        input_state.move_end();
    } else if shortcuts::matches_shortcut(&k, &sc.clear_line) {
        input_state.clear_line();
    } else if let KeyCode::Char(c) = k.code
        && !k.modifiers.contains(KeyModifiers::CONTROL)
    {
        input_state.insert_char(c);
    }

    Ok(false)
}

/// Apply a confirmed input-box value.
async fn apply_input_callback(
    app: &mut App,
    callback_id: InputCallbackId,
    value: String,
) -> Result<()> {
    match callback_id {
        InputCallbackId::ImagePath => {
            select_image(app, &value).await?;
        }
        InputCallbackId::SettingsBaseUrl => app.base_url_buf = value,
        InputCallbackId::SettingsMaxSize => app.max_size_buf = value,
    }
    Ok(())
}

/// Refresh the settings edit buffers from the current config.
fn reload_settings_buffers(app: &mut App) {
    app.base_url_buf = app.cfg.server.base_url.clone();
    app.max_size_buf = app.cfg.upload.max_size_mb.to_string();
}
