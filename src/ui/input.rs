/// Terminal input collector.
///
/// Drains every pending crossterm event once per frame into:
///   - `presses`: key presses and auto-repeats, in arrival order
///   - `clicks`:  left-button mouse downs as (column, row)
///
/// Release events are dropped. Puzzle play is edge-triggered only, so
/// there is no held-key tracking.

use std::time::Duration;

use crossterm::event::{
    self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};
use tracing::warn;

pub struct InputState {
    pub presses: Vec<KeyEvent>,
    pub clicks: Vec<(u16, u16)>,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            presses: Vec::with_capacity(8),
            clicks: Vec::with_capacity(2),
        }
    }

    /// Drain all pending terminal events. Call once per frame.
    pub fn drain_events(&mut self) {
        self.presses.clear();
        self.clicks.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(Event::Key(key)) => self.push_key(key),
                Ok(Event::Mouse(m)) if m.kind == MouseEventKind::Down(MouseButton::Left) => {
                    self.clicks.push((m.column, m.row));
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("terminal read failed: {e}");
                    break;
                }
            }
        }
    }

    fn push_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Release {
            self.presses.push(key);
        }
    }

    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.presses.iter().any(|k| k.code == code && !is_chord(k))
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.presses.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }

    /// Letters typed this frame, in order. Ctrl/Alt chords are skipped.
    pub fn typed_letters(&self) -> impl Iterator<Item = char> + '_ {
        self.presses.iter().filter(|k| !is_chord(k)).filter_map(|k| match k.code {
            KeyCode::Char(c) if c.is_alphabetic() => Some(c),
            _ => None,
        })
    }
}

fn is_chord(key: &KeyEvent) -> bool {
    key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    fn state(keys: &[KeyEvent]) -> InputState {
        let mut s = InputState::new();
        for k in keys {
            s.push_key(*k);
        }
        s
    }

    #[test]
    fn typed_letters_keep_order_and_skip_chords() {
        let s = state(&[
            press(KeyCode::Char('r'), KeyModifiers::NONE),
            press(KeyCode::Char('A'), KeyModifiers::SHIFT),
            press(KeyCode::Char('c'), KeyModifiers::CONTROL),
            press(KeyCode::Char('7'), KeyModifiers::NONE),
            press(KeyCode::Char('j'), KeyModifiers::NONE),
        ]);
        assert_eq!(s.typed_letters().collect::<String>(), "rAj");
        assert!(s.ctrl_c_pressed());
    }

    #[test]
    fn releases_are_ignored() {
        let release = KeyEvent {
            code: KeyCode::Enter,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        let s = state(&[release]);
        assert!(!s.was_pressed(KeyCode::Enter));
    }

    #[test]
    fn any_pressed_matches_plain_keys() {
        let s = state(&[press(KeyCode::F(3), KeyModifiers::NONE)]);
        assert!(s.any_pressed(&[KeyCode::F(2), KeyCode::F(3)]));
        assert!(!s.any_pressed(&[KeyCode::Esc]));
    }
}
