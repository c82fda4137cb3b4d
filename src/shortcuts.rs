//! Keybinding tables loaded from `shortcut.toml`.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// All shortcut groups, one per screen plus the input box.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shortcuts {
    pub main: MainShortcuts,
    pub settings: SettingsShortcuts,
    pub input_box: InputBoxShortcuts,
}

/// Main scan/results screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MainShortcuts {
    pub quit: Vec<String>,
    pub open_image: Vec<String>,
    pub analyze: Vec<String>,
    pub reset: Vec<String>,
    pub toggle_raw: Vec<String>,
    pub settings: Vec<String>,
    pub dismiss_toast: Vec<String>,
}

/// Settings screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsShortcuts {
    pub cancel: Vec<String>,
    pub save: Vec<String>,
    pub base_url: Vec<String>,
    pub max_size: Vec<String>,
}

/// Popup input box.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputBoxShortcuts {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub backspace: Vec<String>,
    pub delete: Vec<String>,
    pub left: Vec<String>,
    pub right: Vec<String>,
    pub home: Vec<String>,
    pub end: Vec<String>,
    pub clear_line: Vec<String>,
}

impl Shortcuts {
    /// Load from TOML, or fall back to the defaults when missing.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let shortcuts: Shortcuts = toml::from_str(&content)?;
            Ok(shortcuts)
        } else {
            Ok(Self::default())
        }
    }
}

impl Default for Shortcuts {
    fn default() -> Self {
        Self {
            main: MainShortcuts {
                quit: vec!["q".into()],
                open_image: vec!["o".into()],
                analyze: vec!["Enter".into(), "a".into()],
                reset: vec!["c".into()],
                toggle_raw: vec!["d".into()],
                settings: vec!["t".into()],
                dismiss_toast: vec!["x".into()],
            },
            settings: SettingsShortcuts {
                cancel: vec!["Esc".into()],
                save: vec!["Enter".into()],
                base_url: vec!["u".into()],
                max_size: vec!["m".into()],
            },
            input_box: InputBoxShortcuts {
                confirm: vec!["Enter".into()],
                cancel: vec!["Esc".into()],
                backspace: vec!["Backspace".into()],
                delete: vec!["Delete".into()],
                left: vec!["Left".into()],
                right: vec!["Right".into()],
                home: vec!["Home".into()],
                end: vec!["End".into()],
                clear_line: vec!["Ctrl+u".into()],
            },
        }
    }
}

/// Whether a key event matches any of the given shortcut strings.
pub fn matches_shortcut(key: &KeyEvent, shortcuts: &[String]) -> bool {
    shortcuts.iter().any(|s| matches_single_shortcut(key, s))
}

/// Match one shortcut string, e.g. "a", "Enter", "Ctrl+u".
fn matches_single_shortcut(key: &KeyEvent, shortcut: &str) -> bool {
    let parts: Vec<&str> = shortcut.split('+').collect();

    let (modifiers_str, key_str) = if parts.len() > 1 {
        (&parts[0..parts.len() - 1], parts[parts.len() - 1])
    } else {
        (&[][..], parts[0])
    };

    let mut expected_modifiers = KeyModifiers::empty();
    for modifier in modifiers_str {
        match *modifier {
            "Ctrl" | "ctrl" => expected_modifiers |= KeyModifiers::CONTROL,
            "Alt" | "alt" => expected_modifiers |= KeyModifiers::ALT,
            "Shift" | "shift" => expected_modifiers |= KeyModifiers::SHIFT,
            _ => return false,
        }
    }

    if key.modifiers != expected_modifiers {
        return false;
    }

    match key_str {
        "Enter" | "enter" => key.code == KeyCode::Enter,
        "Esc" | "esc" => key.code == KeyCode::Esc,
        "Tab" | "tab" => key.code == KeyCode::Tab,
        "Backspace" | "backspace" => key.code == KeyCode::Backspace,
        "Delete" | "delete" => key.code == KeyCode::Delete,
        "Up" | "up" => key.code == KeyCode::Up,
        "Down" | "down" => key.code == KeyCode::Down,
        "Left" | "left" => key.code == KeyCode::Left,
        "Right" | "right" => key.code == KeyCode::Right,
        "Home" | "home" => key.code == KeyCode::Home,
        "End" | "end" => key.code == KeyCode::End,
        s if s.chars().count() == 1 => {
            let c = s.chars().next().unwrap();
            key.code == KeyCode::Char(c)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_plain_char() {
        let key = KeyEvent::new(KeyCode::Char('o'), KeyModifiers::empty());
        assert!(matches_shortcut(&key, &[String::from("o")]));
        assert!(!matches_shortcut(&key, &[String::from("q")]));
    }

    #[test]
    fn matches_special_key() {
        let key = KeyEvent::new(KeyCode::Enter, KeyModifiers::empty());
        assert!(matches_shortcut(&key, &[String::from("Enter")]));
        assert!(!matches_shortcut(&key, &[String::from("Esc")]));
    }

    #[test]
    fn modifier_must_match_exactly() {
        let key = KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL);
        assert!(matches_shortcut(&key, &[String::from("Ctrl+u")]));
        assert!(!matches_shortcut(&key, &[String::from("u")]));

        let plain = KeyEvent::new(KeyCode::Char('u'), KeyModifiers::empty());
        assert!(!matches_shortcut(&plain, &[String::from("Ctrl+u")]));
    }

    #[test]
    fn any_binding_in_the_list_matches() {
        let enter = KeyEvent::new(KeyCode::Enter, KeyModifiers::empty());
        let a = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::empty());
        let bindings = vec![String::from("Enter"), String::from("a")];

        assert!(matches_shortcut(&enter, &bindings));
        assert!(matches_shortcut(&a, &bindings));

        let b = KeyEvent::new(KeyCode::Char('b'), KeyModifiers::empty());
        assert!(!matches_shortcut(&b, &bindings));
    }
}
