mod event_source;
mod keymap;

pub use event_source::{
    Event, EventSource, KeyCode, KeyEvent, KeyModifiers, ScriptedEvents, TerminalEvents,
};
pub use keymap::action_for;
