/// Gamepad input via gilrs.
///
/// Buttons map to puzzle actions through the `[gamepad]` config section:
///   D-pad / Left Stick   →  move the cursor (edge-triggered)
///   A / Start            →  confirm (place tile, open, continue)
///   B / Select           →  back
///   X                    →  erase last letter
///   Y                    →  hint
///   L1 / R1              →  reshuffle / skip
///
/// Without the "gamepad" feature every query returns false.

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};
#[cfg(feature = "gamepad")]
use tracing::{debug, info};
use tracing::warn;

use crate::config::GamepadConfig;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.5;

const BUTTON_COUNT: usize = 10;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,
    R1,
    L2,
    R2,
    Start,
    Select,
}

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.trim().to_uppercase().as_str() {
            "A" | "SOUTH" => Some(Btn::A),
            "B" | "EAST" => Some(Btn::B),
            "X" | "WEST" => Some(Btn::X),
            "Y" | "NORTH" => Some(Btn::Y),
            "L1" | "LB" => Some(Btn::L1),
            "R1" | "RB" => Some(Btn::R1),
            "L2" | "LT" => Some(Btn::L2),
            "R2" | "RT" => Some(Btn::R2),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South => Some(Btn::A),
            Button::East => Some(Btn::B),
            Button::West => Some(Btn::X),
            Button::North => Some(Btn::Y),
            Button::LeftTrigger => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::LeftTrigger2 => Some(Btn::L2),
            Button::RightTrigger2 => Some(Btn::R2),
            Button::Start => Some(Btn::Start),
            Button::Select => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Parse configured button names, logging the ones that are not buttons.
fn parse_buttons(action: &str, names: &[String]) -> Vec<Btn> {
    names
        .iter()
        .filter_map(|name| {
            let btn = Btn::from_name(name);
            if btn.is_none() {
                warn!(action, button = %name, "unknown gamepad button in config");
            }
            btn
        })
        .collect()
}

/// Which buttons trigger which puzzle action.
#[derive(Clone, Debug, PartialEq, Eq)]
struct ActionMap {
    confirm: Vec<Btn>,
    cancel: Vec<Btn>,
    hint: Vec<Btn>,
    skip: Vec<Btn>,
    reset: Vec<Btn>,
    erase: Vec<Btn>,
}

impl ActionMap {
    /// Build from config. An action whose list parses to nothing keeps its
    /// built-in buttons.
    fn from_config(cfg: &GamepadConfig) -> Self {
        let defaults = Self::from_names(&GamepadConfig::default());
        let pick = |action: &str, names: &[String], fallback: Vec<Btn>| {
            let parsed = parse_buttons(action, names);
            if parsed.is_empty() { fallback } else { parsed }
        };
        ActionMap {
            confirm: pick("confirm", &cfg.confirm, defaults.confirm),
            cancel: pick("cancel", &cfg.cancel, defaults.cancel),
            hint: pick("hint", &cfg.hint, defaults.hint),
            skip: pick("skip", &cfg.skip, defaults.skip),
            reset: pick("reset", &cfg.reset, defaults.reset),
            erase: pick("erase", &cfg.erase, defaults.erase),
        }
    }

    fn from_names(cfg: &GamepadConfig) -> Self {
        ActionMap {
            confirm: parse_buttons("confirm", &cfg.confirm),
            cancel: parse_buttons("cancel", &cfg.cancel),
            hint: parse_buttons("hint", &cfg.hint),
            skip: parse_buttons("skip", &cfg.skip),
            reset: parse_buttons("reset", &cfg.reset),
            erase: parse_buttons("erase", &cfg.erase),
        }
    }
}

/// Edge state for one frame: was it pressed since the last `update()`?
#[derive(Clone, Copy, Debug, Default)]
struct Edge {
    held: bool,
    pressed: bool,
}

impl Edge {
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn set(&mut self, held: bool) {
        if held && !self.held {
            self.pressed = true;
        }
        self.held = held;
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    buttons: [Edge; BUTTON_COUNT],
    /// Up, down, left, right.
    dpad: [Edge; 4],
    stick: [Edge; 4],
    stick_x: f32,
    stick_y: f32,

    action_map: ActionMap,
}

impl GamepadState {
    pub fn new(cfg: &GamepadConfig) -> Self {
        #[cfg(feature = "gamepad")]
        let gilrs = match Gilrs::new() {
            Ok(g) => {
                info!(connected = g.gamepads().next().is_some(), "gamepad support ready");
                Some(g)
            }
            Err(e) => {
                warn!("gamepad support unavailable: {e}");
                None
            }
        };

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs,
            buttons: [Edge::default(); BUTTON_COUNT],
            dpad: [Edge::default(); 4],
            stick: [Edge::default(); 4],
            stick_x: 0.0,
            stick_y: 0.0,
            action_map: ActionMap::from_config(cfg),
        }
    }

    pub fn update(&mut self) {
        let all = self.buttons.iter_mut().chain(&mut self.dpad).chain(&mut self.stick);
        for edge in all {
            edge.pressed = false;
        }

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };
        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => self.on_button(btn, true),
                EventType::ButtonReleased(btn, _) => self.on_button(btn, false),
                EventType::AxisChanged(Axis::LeftStickX, v, _) => self.stick_x = v,
                EventType::AxisChanged(Axis::LeftStickY, v, _) => self.stick_y = v,
                EventType::Connected => debug!("gamepad connected"),
                EventType::Disconnected => {
                    debug!("gamepad disconnected");
                    self.release_all();
                }
                _ => {}
            }
        }

        let (x, y) = (self.stick_x, self.stick_y);
        self.stick[0].set(y > STICK_DEADZONE);
        self.stick[1].set(y < -STICK_DEADZONE);
        self.stick[2].set(x < -STICK_DEADZONE);
        self.stick[3].set(x > STICK_DEADZONE);
    }

    #[cfg(feature = "gamepad")]
    fn on_button(&mut self, btn: Button, held: bool) {
        let edge = match btn {
            Button::DPadUp => &mut self.dpad[0],
            Button::DPadDown => &mut self.dpad[1],
            Button::DPadLeft => &mut self.dpad[2],
            Button::DPadRight => &mut self.dpad[3],
            other => match Btn::from_gilrs(other) {
                Some(b) => &mut self.buttons[b as usize],
                None => return,
            },
        };
        edge.set(held);
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn release_all(&mut self) {
        self.buttons = [Edge::default(); BUTTON_COUNT];
        self.dpad = [Edge::default(); 4];
        self.stick = [Edge::default(); 4];
        self.stick_x = 0.0;
        self.stick_y = 0.0;
    }

    // ── Action queries ──

    fn any_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[b as usize].pressed)
    }

    pub fn confirm_pressed(&self) -> bool {
        self.any_pressed(&self.action_map.confirm)
    }
    pub fn cancel_pressed(&self) -> bool {
        self.any_pressed(&self.action_map.cancel)
    }
    pub fn hint_pressed(&self) -> bool {
        self.any_pressed(&self.action_map.hint)
    }
    pub fn skip_pressed(&self) -> bool {
        self.any_pressed(&self.action_map.skip)
    }
    pub fn reset_pressed(&self) -> bool {
        self.any_pressed(&self.action_map.reset)
    }
    pub fn erase_pressed(&self) -> bool {
        self.any_pressed(&self.action_map.erase)
    }

    fn direction(&self, i: usize) -> bool {
        self.dpad[i].pressed || self.stick[i].pressed
    }

    pub fn up_pressed(&self) -> bool {
        self.direction(0)
    }
    pub fn down_pressed(&self) -> bool {
        self.direction(1)
    }
    pub fn left_pressed(&self) -> bool {
        self.direction(2)
    }
    pub fn right_pressed(&self) -> bool {
        self.direction(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn button_names_are_case_insensitive_with_aliases() {
        assert_eq!(Btn::from_name("a"), Some(Btn::A));
        assert_eq!(Btn::from_name(" north "), Some(Btn::Y));
        assert_eq!(Btn::from_name("RB"), Some(Btn::R1));
        assert_eq!(Btn::from_name("back"), Some(Btn::Select));
        assert_eq!(Btn::from_name("turbo"), None);
    }

    #[test]
    fn default_config_maps_every_action() {
        let map = ActionMap::from_config(&GamepadConfig::default());
        assert_eq!(map.confirm, vec![Btn::A, Btn::Start]);
        assert_eq!(map.cancel, vec![Btn::B, Btn::Select]);
        assert_eq!(map.hint, vec![Btn::Y]);
        assert_eq!(map.skip, vec![Btn::R1]);
        assert_eq!(map.reset, vec![Btn::L1]);
        assert_eq!(map.erase, vec![Btn::X]);
    }

    #[test]
    fn unusable_list_falls_back_to_default() {
        let cfg = GamepadConfig {
            hint: names(&["nope"]),
            skip: names(&["R2", "bogus"]),
            ..GamepadConfig::default()
        };
        let map = ActionMap::from_config(&cfg);
        assert_eq!(map.hint, vec![Btn::Y]);
        assert_eq!(map.skip, vec![Btn::R2]);
    }

    #[test]
    fn edge_fires_once_per_press() {
        let mut e = Edge::default();
        e.set(true);
        assert!(e.pressed);
        e.pressed = false;
        e.set(true);
        assert!(!e.pressed);
        e.set(false);
        e.set(true);
        assert!(e.pressed);
    }
}
