//! Key bindings

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::viewport::Action;

/// Map a terminal event to a viewer action. Unbound keys, key releases and
/// mouse or focus events map to `None`.
pub fn action_for(event: &Event) -> Option<Action> {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => key_action(key),
        Event::Resize(columns, rows) => Some(Action::Resize {
            width: u32::from(*columns),
            height: u32::from(*rows),
        }),
        _ => None,
    }
}

fn key_action(key: &KeyEvent) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Action::Quit),
            _ => None,
        };
    }

    let action = match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::PageDown | KeyCode::Char(' ') => Action::PageDown,
        KeyCode::PageUp => Action::PageUp,
        KeyCode::Down | KeyCode::Char('j') => Action::Down,
        KeyCode::Up | KeyCode::Char('k') => Action::Up,
        KeyCode::Right | KeyCode::Char('l') => Action::Right,
        KeyCode::Left | KeyCode::Char('h') => Action::Left,
        KeyCode::Home | KeyCode::Char('g') => Action::Home,
        KeyCode::End | KeyCode::Char('G') => Action::End,
        KeyCode::Char('+') | KeyCode::Char('=') => Action::ZoomIn,
        KeyCode::Char('-') => Action::ZoomOut,
        KeyCode::Char('f') => Action::FitWidth,
        KeyCode::Char('r') => Action::Redraw,
        _ => return None,
    };
    Some(action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::ScriptedEvents;
    use crossterm::event::KeyEventState;

    fn key(code: KeyCode) -> Event {
        ScriptedEvents::key_event(code, KeyModifiers::empty())
    }

    #[test]
    fn vim_keys_match_arrows() {
        for (letter, arrow) in [
            ('j', KeyCode::Down),
            ('k', KeyCode::Up),
            ('l', KeyCode::Right),
            ('h', KeyCode::Left),
        ] {
            assert_eq!(
                action_for(&ScriptedEvents::char_key(letter)),
                action_for(&key(arrow))
            );
        }
    }

    #[test]
    fn quit_bindings() {
        assert_eq!(action_for(&ScriptedEvents::char_key('q')), Some(Action::Quit));
        assert_eq!(action_for(&key(KeyCode::Esc)), Some(Action::Quit));
        assert_eq!(
            action_for(&ScriptedEvents::ctrl_char_key('c')),
            Some(Action::Quit)
        );
        assert_eq!(action_for(&ScriptedEvents::ctrl_char_key('j')), None);
    }

    #[test]
    fn shifted_g_jumps_to_end() {
        let event = ScriptedEvents::key_event(KeyCode::Char('G'), KeyModifiers::SHIFT);
        assert_eq!(action_for(&event), Some(Action::End));
        assert_eq!(action_for(&ScriptedEvents::char_key('g')), Some(Action::Home));
    }

    #[test]
    fn zoom_and_misc_keys() {
        assert_eq!(action_for(&ScriptedEvents::char_key('=')), Some(Action::ZoomIn));
        assert_eq!(action_for(&ScriptedEvents::char_key('+')), Some(Action::ZoomIn));
        assert_eq!(action_for(&ScriptedEvents::char_key('-')), Some(Action::ZoomOut));
        assert_eq!(action_for(&ScriptedEvents::char_key('f')), Some(Action::FitWidth));
        assert_eq!(action_for(&ScriptedEvents::char_key('r')), Some(Action::Redraw));
        assert_eq!(action_for(&ScriptedEvents::char_key(' ')), Some(Action::PageDown));
        assert_eq!(action_for(&ScriptedEvents::char_key('x')), None);
    }

    #[test]
    fn releases_are_ignored() {
        let release = Event::Key(KeyEvent {
            code: KeyCode::Char('j'),
            modifiers: KeyModifiers::empty(),
            kind: KeyEventKind::Release,
            state: KeyEventState::empty(),
        });
        assert_eq!(action_for(&release), None);
    }

    #[test]
    fn resize_carries_cells() {
        assert_eq!(
            action_for(&Event::Resize(120, 40)),
            Some(Action::Resize {
                width: 120,
                height: 40
            })
        );
    }
}
