use std::collections::VecDeque;

use anyhow::Result;
pub use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::event::{KeyEventKind, KeyEventState};

/// Where the event loop gets its input from.
///
/// The viewer only redraws in response to input, so reads block.
pub trait EventSource {
    fn next_event(&mut self) -> Result<Event>;
}

/// Terminal input via crossterm.
pub struct TerminalEvents;

impl EventSource for TerminalEvents {
    fn next_event(&mut self) -> Result<Event> {
        Ok(crossterm::event::read()?)
    }
}

/// Replays a fixed list of events, then quits.
pub struct ScriptedEvents {
    events: VecDeque<Event>,
}

impl ScriptedEvents {
    pub fn new(events: impl IntoIterator<Item = Event>) -> Self {
        Self {
            events: events.into_iter().collect(),
        }
    }

    pub fn key_event(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::empty(),
        })
    }

    pub fn char_key(c: char) -> Event {
        Self::key_event(KeyCode::Char(c), KeyModifiers::empty())
    }

    pub fn ctrl_char_key(c: char) -> Event {
        Self::key_event(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

impl EventSource for ScriptedEvents {
    fn next_event(&mut self) -> Result<Event> {
        // Running out of script means the scenario is over.
        Ok(self
            .events
            .pop_front()
            .unwrap_or_else(|| Self::char_key('q')))
    }
}
