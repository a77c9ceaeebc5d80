//! Keybinding configuration for the TUI.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::Deserialize;

use crate::tui::event::Action;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KeybindingConfig {
    pub quit: Vec<String>,
    pub move_up: Vec<String>,
    pub move_down: Vec<String>,
    pub search: Vec<String>,
    pub add_tag: Vec<String>,
    pub remove_tag: Vec<String>,
    pub clear_tags: Vec<String>,
    pub toggle_sort: Vec<String>,
    pub submit: Vec<String>,
    pub load_more: Vec<String>,
    pub refresh: Vec<String>,
    pub open_comments: Vec<String>,
    pub write_comment: Vec<String>,
    pub toggle_follow: Vec<String>,
    pub open_profile: Vec<String>,
    pub switch_feed: Vec<String>,
    pub back: Vec<String>,
    pub forward: Vec<String>,
    pub cancel: Vec<String>,
}

fn keys(list: &[&str]) -> Vec<String> {
    list.iter().map(|k| k.to_string()).collect()
}

impl Default for KeybindingConfig {
    fn default() -> Self {
        Self {
            quit: keys(&["q", "Ctrl+c"]),
            move_up: keys(&["k", "Up"]),
            move_down: keys(&["j", "Down"]),
            search: keys(&["/"]),
            add_tag: keys(&["+"]),
            remove_tag: keys(&["-"]),
            clear_tags: keys(&["X"]),
            toggle_sort: keys(&["o"]),
            submit: keys(&["s"]),
            load_more: keys(&["L"]),
            refresh: keys(&["R"]),
            open_comments: keys(&["Enter"]),
            write_comment: keys(&["c"]),
            toggle_follow: keys(&["f"]),
            open_profile: keys(&["u"]),
            switch_feed: keys(&["e"]),
            back: keys(&["[", "Backspace"]),
            forward: keys(&["]"]),
            cancel: keys(&["Esc"]),
        }
    }
}

impl KeybindingConfig {
    /// The action bound to `key`; the first matching binding wins.
    pub fn get_action(&self, key: &KeyEvent) -> Action {
        let table: [(&Vec<String>, Action); 19] = [
            (&self.quit, Action::Quit),
            (&self.move_up, Action::MoveUp),
            (&self.move_down, Action::MoveDown),
            (&self.search, Action::EditSearch),
            (&self.add_tag, Action::AddTag),
            (&self.remove_tag, Action::RemoveTag),
            (&self.clear_tags, Action::ClearTags),
            (&self.toggle_sort, Action::ToggleSort),
            (&self.submit, Action::Submit),
            (&self.load_more, Action::LoadMore),
            (&self.refresh, Action::Refresh),
            (&self.open_comments, Action::OpenComments),
            (&self.write_comment, Action::WriteComment),
            (&self.toggle_follow, Action::ToggleFollow),
            (&self.open_profile, Action::OpenProfile),
            (&self.switch_feed, Action::SwitchFeed),
            (&self.back, Action::Back),
            (&self.forward, Action::Forward),
            (&self.cancel, Action::Cancel),
        ];
        table
            .iter()
            .find(|(bindings, _)| matches_any(key, bindings))
            .map(|(_, action)| *action)
            .unwrap_or(Action::None)
    }
}

fn matches_any(key: &KeyEvent, bindings: &[String]) -> bool {
    bindings
        .iter()
        .filter_map(|b| parse_key_string(b).ok())
        .any(|b| b.matches(key))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    /// Shift is ignored for character keys: terminals report `X` and `+`
    /// with or without it.
    pub fn matches(&self, key: &KeyEvent) -> bool {
        self.code == key.code
            && (self.modifiers == key.modifiers
                || self.modifiers == key.modifiers.difference(KeyModifiers::SHIFT))
    }
}

/// Parse `"x"`, `"Enter"`, `"Ctrl+c"`, `"Ctrl+Shift+a"`, or a lone `"+"`.
pub fn parse_key_string(s: &str) -> Result<KeyBinding, String> {
    let s = s.trim();
    let (prefix, key) = match s.strip_suffix("++") {
        Some(prefix) => (Some(prefix), "+"),
        None if s == "+" => (None, "+"),
        None => match s.rsplit_once('+') {
            Some((prefix, key)) => (Some(prefix), key),
            None => (None, s),
        },
    };

    let mut modifiers = KeyModifiers::NONE;
    for part in prefix.into_iter().flat_map(|p| p.split('+')) {
        modifiers |= match part.to_lowercase().as_str() {
            "ctrl" | "control" => KeyModifiers::CONTROL,
            "shift" => KeyModifiers::SHIFT,
            "alt" => KeyModifiers::ALT,
            _ => return Err(format!("Unknown modifier: {}", part)),
        };
    }

    Ok(KeyBinding {
        code: parse_key_code(key)?,
        modifiers,
    })
}

fn parse_key_code(s: &str) -> Result<KeyCode, String> {
    let mut chars = s.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Ok(KeyCode::Char(c));
    }

    let lower = s.to_lowercase();
    if let Some(n) = lower.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
        if (1..=12).contains(&n) {
            return Ok(KeyCode::F(n));
        }
    }

    let code = match lower.as_str() {
        "enter" | "return" => KeyCode::Enter,
        "tab" => KeyCode::Tab,
        "backtab" => KeyCode::BackTab,
        "backspace" | "bs" => KeyCode::Backspace,
        "delete" | "del" => KeyCode::Delete,
        "home" => KeyCode::Home,
        "end" => KeyCode::End,
        "pageup" | "pgup" => KeyCode::PageUp,
        "pagedown" | "pgdn" => KeyCode::PageDown,
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "esc" | "escape" => KeyCode::Esc,
        "space" => KeyCode::Char(' '),
        _ => return Err(format!("Unknown key: {}", s)),
    };
    Ok(code)
}
