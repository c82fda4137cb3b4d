//! Layout helpers for the main screen.

use ratatui::prelude::*;

/// Vertical split of the whole frame.
pub struct MainLayout {
    /// SOURCE panel + RESULTS panel.
    pub body: Rect,
    /// Help bar.
    pub help_bar: Rect,
    /// Status bar.
    pub status_bar: Rect,
}

/// Horizontal split of the body.
pub struct BodyLayout {
    /// Left: selected image and activity log.
    pub source_panel: Rect,
    /// Right: vehicle summary and raw-response panel.
    pub results_panel: Rect,
}

/// Split the frame into body, help bar and status bar.
pub fn create_main_layout(area: Rect) -> MainLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),    // body
            Constraint::Length(3), // help bar
            Constraint::Length(3), // status bar
        ])
        .split(area);

    MainLayout {
        body: chunks[0],
        help_bar: chunks[1],
        status_bar: chunks[2],
    }
}

/// Split the body into the source panel (35%) and results panel (65%).
pub fn create_body_layout(area: Rect) -> BodyLayout {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(area);

    BodyLayout {
        source_panel: chunks[0],
        results_panel: chunks[1],
    }
}
