//! Popup text-input component used for path and settings entry.

use ratatui::{
    layout::Alignment,
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph},
};

/// What to do with the value once the input is confirmed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputCallbackId {
    /// Path of the image to select for analysis.
    ImagePath,
    /// Backend base URL on the settings screen.
    SettingsBaseUrl,
    /// Upload size cap (MB) on the settings screen.
    SettingsMaxSize,
}

/// Live state of the popup input.
#[derive(Clone, Debug)]
pub struct InputBoxState {
    pub prompt: String,
    pub value: String,
    /// Cursor position in characters, not bytes.
    pub cursor: usize,
    pub callback_id: InputCallbackId,
}

impl InputBoxState {
    pub fn new(prompt: impl Into<String>, value: String, callback_id: InputCallbackId) -> Self {
        let cursor = value.chars().count();
        Self {
            prompt: prompt.into(),
            value,
            cursor,
            callback_id,
        }
    }

    /// Insert a character at the cursor.
    pub fn insert_char(&mut self, c: char) {
        let byte_idx = char_to_byte_idx(&self.value, self.cursor);
        self.value.insert(byte_idx, c);
        self.cursor += 1;
    }

    /// Delete the character before the cursor.
    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            let byte_idx = char_to_byte_idx(&self.value, self.cursor - 1);
            self.value.remove(byte_idx);
            self.cursor -= 1;
        }
    }

    /// Delete the character under the cursor.
    pub fn delete(&mut self) {
        if self.cursor < self.value.chars().count() {
            let byte_idx = char_to_byte_idx(&self.value, self.cursor);
            self.value.remove(byte_idx);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.value.chars().count() {
            self.cursor += 1;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.value.chars().count();
    }

    pub fn clear_line(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }
}

/// Byte offset of the nth character, clamped to the end of the string.
fn char_to_byte_idx(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map(|(i, _)| i).unwrap_or(s.len())
}

/// Draw the input popup over whatever is on screen.
pub fn render_input_box(f: &mut Frame, state: &InputBoxState) {
    let popup_area = centered_popup(f.area(), 70, 7);

    // Blank the area so the popup is readable over the main screen.
    f.render_widget(Clear, popup_area);
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Input")
        .style(Style::default().bg(Color::DarkGray));
    f.render_widget(block, popup_area);

    let inner_layout = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1), // prompt
            Constraint::Length(1), // input field
            Constraint::Length(1), // spacer
            Constraint::Length(1), // help
        ])
        .split(popup_area);

    let prompt_widget = Paragraph::new(state.prompt.clone()).style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );
    f.render_widget(prompt_widget, inner_layout[0]);

    // Horizontal scroll keeps the cursor visible on long paths.
    let display_width = inner_layout[1].width as usize;
    let scroll_offset = if state.cursor > display_width.saturating_sub(2) {
        state.cursor.saturating_sub(display_width - 2)
    } else {
        0
    };

    let chars: Vec<char> = state.value.chars().collect();
    let visible: Vec<char> = chars
        .iter()
        .skip(scroll_offset)
        .take(display_width)
        .copied()
        .collect();

    // Render the cursor as a bar inside the visible slice.
    let cursor_in_visible = state.cursor.saturating_sub(scroll_offset).min(visible.len());
    let before: String = visible[..cursor_in_visible].iter().collect();
    let after: String = visible[cursor_in_visible..].iter().collect();
    let input_widget =
        Paragraph::new(format!("{before}|{after}")).style(Style::default().fg(Color::Green));
    f.render_widget(input_widget, inner_layout[1]);

    let help = Paragraph::new("Enter=confirm | Esc=cancel | Ctrl+U=clear")
        .style(Style::default().fg(Color::Gray))
        .alignment(Alignment::Center);
    f.render_widget(help, inner_layout[3]);
}

/// Centered popup rect with a fixed height and percentage width.
fn centered_popup(area: Rect, width_percent: u16, height: u16) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length((area.height.saturating_sub(height)) / 2),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - width_percent) / 2),
            Constraint::Percentage(width_percent),
            Constraint::Percentage((100 - width_percent) / 2),
        ])
        .split(popup_layout[1])[1]
}
