use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use std::time::Duration;

use crate::app::Result;

pub enum AppEvent {
    Key(KeyEvent),
    Tick,
}

pub struct EventHandler {
    tick_rate: Duration,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        Self { tick_rate }
    }

    /// Block for at most one tick waiting for a key press.
    pub fn next(&self) -> Result<AppEvent> {
        if event::poll(self.tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(AppEvent::Key(key));
                }
            }
        }
        Ok(AppEvent::Tick)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    MoveUp,
    MoveDown,
    EditSearch,
    AddTag,
    /// Drop the last tag chip and apply.
    RemoveTag,
    ClearTags,
    ToggleSort,
    /// Apply staged filter edits.
    Submit,
    LoadMore,
    /// Re-fetch the current page; doubles as "Try again".
    Refresh,
    OpenComments,
    WriteComment,
    ToggleFollow,
    OpenProfile,
    SwitchFeed,
    Back,
    Forward,
    Cancel,
    None,
}
