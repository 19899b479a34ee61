/// Screen state: which view is active and what it is showing.
///
/// The active `Screen` is the only thing the router dispatches on. A
/// puzzle `Session` lives inside `Screen::Puzzle`, so leaving the screen
/// drops the attempt with it.
///
/// `View` holds presentation-only state (cursors, transient message) that
/// survives screen changes.

use crate::domain::puzzle::Attempt;

#[derive(Clone, Debug)]
pub struct Session {
    pub pack: String,
    pub level: usize,
    pub attempt: Attempt,
}

#[derive(Clone, Debug)]
pub enum Screen {
    Title,
    Packs,
    Levels { pack: String },
    Puzzle(Session),
    Reveal { pack: String, level: usize, answer: String, image: String },
    /// Catalog could not be loaded.
    Degraded { reason: String },
}

impl Screen {
    pub fn session(&self) -> Option<&Session> {
        match self {
            Screen::Puzzle(s) => Some(s),
            _ => None,
        }
    }

    pub fn session_mut(&mut self) -> Option<&mut Session> {
        match self {
            Screen::Puzzle(s) => Some(s),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Screen::Title => "title",
            Screen::Packs => "packs",
            Screen::Levels { .. } => "levels",
            Screen::Puzzle(_) => "puzzle",
            Screen::Reveal { .. } => "reveal",
            Screen::Degraded { .. } => "degraded",
        }
    }
}

/// Ticks a transient message stays up (at the 100 ms UI tick).
pub const MESSAGE_TICKS: u32 = 25;

#[derive(Clone, Debug, Default)]
pub struct View {
    pub pack_cursor: usize,
    pub level_cursor: usize,
    pub pool_cursor: usize,
    pub message: String,
    pub message_timer: u32,
    /// Ticks left on the "wrong attempt" flash.
    pub wrong_flash: u32,
    pub anim_tick: u32,
}

impl View {
    /// Show `msg` for `ticks` UI ticks; 0 keeps it until replaced.
    pub fn set_message(&mut self, msg: &str, ticks: u32) {
        self.message = msg.to_string();
        self.message_timer = ticks;
    }

    pub fn clear_message(&mut self) {
        self.message.clear();
        self.message_timer = 0;
    }

    /// Advance timers by one UI tick.
    pub fn tick(&mut self) {
        self.anim_tick = self.anim_tick.wrapping_add(1);
        self.wrong_flash = self.wrong_flash.saturating_sub(1);
        if self.message_timer > 0 {
            self.message_timer -= 1;
            if self.message_timer == 0 {
                self.message.clear();
            }
        }
    }
}
