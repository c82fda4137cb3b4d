//! TUI drawing functions.

use ratatui::{
    Frame,
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Row, Table, Wrap},
};

use crate::{
    events::{Phase, Screen},
    input, layout,
    normalize::NormalizedResult,
    shortcuts::Shortcuts,
    toast::{Toast, ToastKind},
};

use super::App;

/// Draw the whole frame.
pub fn draw(f: &mut Frame, app: &App) {
    if app.ui.screen == Screen::Settings {
        draw_settings_screen(f, app);
    } else {
        draw_main_screen(f, app);
    }

    // Overlays go last: toasts, then an open input box on top.
    draw_toasts(f, app);
    if let Some(input_state) = &app.input_box {
        input::render_input_box(f, input_state);
    }
}

/// Main screen: source panel, results panel, help and status bars.
fn draw_main_screen(f: &mut Frame, app: &App) {
    let main_layout = layout::create_main_layout(f.area());
    let body_layout = layout::create_body_layout(main_layout.body);

    let source_panel = Paragraph::new(build_source_text(app))
        .block(Block::default().borders(Borders::ALL).title("SOURCE"))
        .wrap(Wrap { trim: true });
    f.render_widget(source_panel, body_layout.source_panel);

    draw_results(f, app, body_layout.results_panel);

    let help_bar = Paragraph::new(get_help_text(&app.ui.screen, &app.shortcuts))
        .block(Block::default().borders(Borders::ALL).title("HELP"))
        .wrap(Wrap { trim: true });
    f.render_widget(help_bar, main_layout.help_bar);

    f.render_widget(build_status_bar(app), main_layout.status_bar);
}

/// Left panel: current selection, preview excerpt, activity log.
fn build_source_text(app: &App) -> String {
    let mut lines = vec![];
    match &app.session.current {
        Some(img) => {
            lines.push(format!("File: {}", img.filename));
            lines.push(format!("Type: {}", img.mime));
            lines.push(format!("Size: {} bytes", img.size()));
            if let Some(uri) = &app.session.preview {
                // A terminal cannot show the image; show the head of the
                // data URI as proof of a successful local decode.
                let head: String = uri.chars().take(48).collect();
                lines.push(format!("Preview: {head}..."));
            }
            let uploaded = match &app.session.uploaded_marker {
                Some(name) if *name == img.filename => "yes",
                _ => "no",
            };
            lines.push(format!("Uploaded: {uploaded}"));
        }
        None => {
            lines.push("No image selected.".into());
            lines.push(String::new());
            lines.push("Press o and enter the path of a".into());
            lines.push("vehicle image (PNG, JPG, WEBP).".into());
        }
    }

    lines.push(String::new());
    lines.push("Log:".into());
    for line in app.ui.log.iter().rev().take(8).rev() {
        lines.push(line.clone());
    }
    lines.join("\n")
}

/// Right panel: placeholder, loading, retry affordance, or the summary
/// card plus the collapsible raw-response panel.
fn draw_results(f: &mut Frame, app: &App, area: Rect) {
    match (&app.ui.phase, &app.results) {
        (Phase::Uploading, _) => {
            let msg = Paragraph::new("\nUploading image...")
                .block(Block::default().borders(Borders::ALL).title("RESULTS"))
                .alignment(Alignment::Center);
            f.render_widget(msg, area);
        }
        (Phase::Analyzing, _) => {
            let msg = Paragraph::new("\nRunning OCR analysis...")
                .block(Block::default().borders(Borders::ALL).title("RESULTS"))
                .alignment(Alignment::Center);
            f.render_widget(msg, area);
        }
        (Phase::Failed, _) => {
            let err = app.ui.error.as_deref().unwrap_or("Analysis failed.");
            let text = format!("\nAnalysis Failed\n\n{err}\n\nPress Enter to try again.");
            let msg = Paragraph::new(text)
                .block(Block::default().borders(Borders::ALL).title("RESULTS"))
                .style(Style::default().fg(Color::Red))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true });
            f.render_widget(msg, area);
        }
        (_, Some(result)) => draw_summary_and_raw(f, app, area, result),
        _ => {
            // Placeholder restored by reset or shown before any run.
            let msg = Paragraph::new("\nResults will appear here.")
                .block(Block::default().borders(Borders::ALL).title("RESULTS"))
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center);
            f.render_widget(msg, area);
        }
    }
}

/// Vehicle summary table plus the raw panel underneath it.
fn draw_summary_and_raw(f: &mut Frame, app: &App, area: Rect, result: &NormalizedResult) {
    let raw_height = if app.ui.raw_expanded {
        Constraint::Percentage(50)
    } else {
        Constraint::Length(3)
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), raw_height])
        .split(area);

    let rows = result.details.rows().into_iter().map(|(label, value)| {
        Row::new(vec![label.to_string(), value]).style(Style::default().fg(Color::White))
    });
    let table = Table::new(rows, [Constraint::Length(18), Constraint::Min(10)])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("VEHICLE SUMMARY"),
        )
        .header(
            Row::new(vec!["Field", "Value"])
                .bold()
                .style(Style::default().fg(Color::Cyan)),
        );
    f.render_widget(table, chunks[0]);

    // Collapsed: just the toggle hint. Expanded: the raw payload text.
    let title = if app.ui.raw_expanded {
        "RAW RESPONSE (d to hide)"
    } else {
        "RAW RESPONSE (d to show)"
    };
    let raw_text = if app.ui.raw_expanded {
        if result.raw.is_empty() {
            "No response data.".to_string()
        } else {
            result.raw.clone()
        }
    } else {
        String::new()
    };
    let raw_panel = Paragraph::new(raw_text)
        .block(Block::default().borders(Borders::ALL).title(title))
        .style(Style::default().fg(Color::Gray))
        .wrap(Wrap { trim: false });
    f.render_widget(raw_panel, chunks[1]);
}

/// Settings screen.
fn draw_settings_screen(f: &mut Frame, app: &App) {
    let main_layout = layout::create_main_layout(f.area());

    let text = format!(
        "Settings\n\n[u] Backend base URL: {}\n[m] Max upload size:  {} MB\n\n\
         Enter saves, Esc discards.",
        app.base_url_buf, app.max_size_buf
    );
    let panel = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("SETTINGS"))
        .wrap(Wrap { trim: true });
    f.render_widget(panel, main_layout.body);

    let help_bar = Paragraph::new(get_help_text(&app.ui.screen, &app.shortcuts))
        .block(Block::default().borders(Borders::ALL).title("HELP"))
        .wrap(Wrap { trim: true });
    f.render_widget(help_bar, main_layout.help_bar);

    f.render_widget(build_status_bar(app), main_layout.status_bar);
}

/// Status bar with screen name, phase and last error.
fn build_status_bar(app: &App) -> Paragraph<'static> {
    let screen_name = match app.ui.screen {
        Screen::Main => "Main",
        Screen::Settings => "Settings",
    };

    let status_text = if let Some(err) = &app.ui.error {
        format!(
            "[{}] {} | ERROR: {}",
            screen_name,
            app.ui.phase.label(),
            err
        )
    } else {
        format!(
            "[{}] {} | {}",
            screen_name,
            app.ui.phase.label(),
            app.ui.status
        )
    };

    let mut status_bar = Paragraph::new(status_text)
        .block(Block::default().borders(Borders::ALL).title("STATUS"))
        .wrap(Wrap { trim: true });

    if app.ui.error.is_some() {
        status_bar = status_bar.style(Style::default().fg(Color::Red));
    }

    status_bar
}

/// Toast overlay stacked down the top-right corner.
fn draw_toasts(f: &mut Frame, app: &App) {
    if app.toasts.is_empty() {
        return;
    }

    let area = f.area();
    let width = 44.min(area.width.saturating_sub(2));
    for (i, toast) in app.toasts.iter().enumerate() {
        let y = 1 + (i as u16) * 3;
        if y + 3 > area.height {
            break;
        }
        let rect = Rect::new(area.width.saturating_sub(width + 1), y, width, 3);
        f.render_widget(Clear, rect);
        f.render_widget(toast_widget(toast), rect);
    }
}

fn toast_widget(toast: &Toast) -> Paragraph<'_> {
    let (color, title) = match toast.kind {
        ToastKind::Success => (Color::Green, "OK (x closes)"),
        ToastKind::Error => (Color::Red, "ERROR (x closes)"),
        ToastKind::Info => (Color::Blue, "INFO (x closes)"),
    };
    Paragraph::new(toast.message.as_str())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .style(Style::default().fg(color)),
        )
        .wrap(Wrap { trim: true })
}

/// Help line for the active screen.
fn get_help_text(screen: &Screen, shortcuts: &Shortcuts) -> String {
    match screen {
        Screen::Main => format!(
            "{}: open image | {}: analyze | {}: raw panel | {}: reset | {}: settings | {}: close toast | {}: quit",
            format_keys(&shortcuts.main.open_image),
            format_keys(&shortcuts.main.analyze),
            format_keys(&shortcuts.main.toggle_raw),
            format_keys(&shortcuts.main.reset),
            format_keys(&shortcuts.main.settings),
            format_keys(&shortcuts.main.dismiss_toast),
            format_keys(&shortcuts.main.quit),
        ),
        Screen::Settings => format!(
            "{}: base URL | {}: max size | {}: save | {}: cancel",
            format_keys(&shortcuts.settings.base_url),
            format_keys(&shortcuts.settings.max_size),
            format_keys(&shortcuts.settings.save),
            format_keys(&shortcuts.settings.cancel),
        ),
    }
}

/// Join alternate bindings for display.
fn format_keys(keys: &[String]) -> String {
    keys.join("/")
}
