/// Entry point and game loop.

mod config;
mod domain;
mod error;
mod sim;
mod ui;

use std::sync::Mutex;
use std::time::{Duration, Instant};

use crossterm::event::KeyCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use config::GameConfig;
use domain::puzzle::PuzzleEngine;
use sim::catalog::{Catalog, FsSource};
use sim::progression::Progression;
use sim::router::{Command, InputRouter};
use sim::save::{FileStore, ProgressStore};
use sim::world::Screen;
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::{HitTarget, Renderer};
use ui::sound::{self, SoundEngine};

const FRAME_SLEEP: Duration = Duration::from_millis(10);
const TICK_RATE: Duration = Duration::from_millis(100);

fn main() {
    let config = GameConfig::load();
    init_logging(&config);
    info!(version = env!("CARGO_PKG_VERSION"), data = %config.data_dir.display(), "starting");

    let store = match FileStore::open_default(config.save_dir.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            error!("cannot open progress file: {e}");
            eprintln!("Cannot open progress file: {e}");
            return;
        }
    };
    info!(path = %store.path().display(), "progress file");

    let catalog = Catalog::load(Box::new(FsSource::new(config.data_dir.clone())));
    let pack_ids: Vec<String> = catalog
        .as_ref()
        .map(|c| c.all().map(|p| p.id.clone()).collect())
        .unwrap_or_default();
    let progress = ProgressStore::open(
        Box::new(store),
        config.economy.starting_coins,
        pack_ids.iter().map(String::as_str),
    );
    let progression = Progression::new(progress, config.economy.clone());
    let mut router = InputRouter::new(catalog, progression, PuzzleEngine::new());

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();

    let result = game_loop(&mut router, &mut renderer, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        error!("game loop failed: {e}");
        eprintln!("Game error: {e}");
    }

    let record = router.record();
    println!();
    println!("Thanks for playing Marquee!");
    println!("Coins: {}   Stars: {}", record.coins, record.stars);
}

/// Log to a file: stdout belongs to the terminal UI.
/// `RUST_LOG` overrides the configured level.
fn init_logging(config: &GameConfig) {
    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
    {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: cannot open log file {}: {e}", config.log_file.display());
            return;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
}

fn game_loop(
    router: &mut InputRouter,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new(&config.gamepad);
    let mut last_tick = Instant::now();

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            break;
        }

        let mut commands = Vec::new();
        if handle_input(router, renderer, &kb, &gp, &mut commands) {
            break;
        }
        for cmd in commands {
            let events = router.dispatch(cmd);
            sound::play_events(sound, &events);
        }
        clamp_cursors(router);

        if last_tick.elapsed() >= TICK_RATE {
            router.view.tick();
            last_tick = Instant::now();
        }

        renderer.render(router)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    info!("quit");
    Ok(())
}

// ── Key Constants ──

const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Char('q'), KeyCode::Char('Q'), KeyCode::Esc];
const KEY_BACK: KeyCode = KeyCode::Esc;
const KEY_ERASE: KeyCode = KeyCode::Backspace;
const KEY_RESET: KeyCode = KeyCode::F(2);
const KEY_HINT: KeyCode = KeyCode::F(3);
const KEY_SKIP: KeyCode = KeyCode::F(4);

/// Directional input this frame: (dx, dy) with each in -1..=1.
fn direction(kb: &InputState, gp: &GamepadState) -> (i32, i32) {
    let left = kb.was_pressed(KeyCode::Left) || gp.left_pressed();
    let right = kb.was_pressed(KeyCode::Right) || gp.right_pressed();
    let up = kb.was_pressed(KeyCode::Up) || gp.up_pressed();
    let down = kb.was_pressed(KeyCode::Down) || gp.down_pressed();
    (right as i32 - left as i32, down as i32 - up as i32)
}

fn step(cursor: usize, delta: i32, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    (cursor as i64 + delta as i64).clamp(0, len as i64 - 1) as usize
}

/// Translate this frame's input into commands for the active screen.
/// Cursor movement is applied to `router.view` directly.
/// Returns true when the player asked to quit.
fn handle_input(
    router: &mut InputRouter,
    renderer: &Renderer,
    kb: &InputState,
    gp: &GamepadState,
    out: &mut Vec<Command>,
) -> bool {
    let confirm = kb.any_pressed(KEYS_CONFIRM) || gp.confirm_pressed();
    let back = kb.was_pressed(KEY_BACK) || gp.cancel_pressed();
    let (dx, dy) = direction(kb, gp);
    let clicks: Vec<HitTarget> =
        kb.clicks.iter().filter_map(|&(c, r)| renderer.hit_test(c, r)).collect();

    match router.screen().clone() {
        // ── Title ──
        Screen::Title => {
            if confirm {
                out.push(Command::ShowPacks);
            } else if kb.any_pressed(KEYS_QUIT) || gp.cancel_pressed() {
                return true;
            }
        }

        // ── Catalog failed to load ──
        Screen::Degraded { .. } => {
            if kb.any_pressed(KEYS_QUIT) || gp.cancel_pressed() {
                return true;
            }
        }

        // ── Pack list ──
        Screen::Packs => {
            let ids: Vec<String> = router
                .catalog()
                .map(|c| c.all().map(|p| p.id.clone()).collect())
                .unwrap_or_default();
            let view = &mut router.view;
            view.pack_cursor = step(view.pack_cursor, dy + dx, ids.len());

            for target in &clicks {
                if let HitTarget::Pack(i) = *target {
                    view.pack_cursor = i;
                    if let Some(id) = ids.get(i) {
                        out.push(Command::OpenPack(id.clone()));
                    }
                }
            }
            if confirm {
                if let Some(id) = ids.get(view.pack_cursor) {
                    out.push(Command::OpenPack(id.clone()));
                }
            } else if back {
                out.push(Command::Back);
            }
        }

        // ── Level grid ──
        Screen::Levels { pack } => {
            let lvls = router.catalog().and_then(|c| c.resolve(&pack)).map_or(0, |p| p.lvls);
            let cols = renderer.level_columns() as i32;
            let view = &mut router.view;
            view.level_cursor = step(view.level_cursor, dx + dy * cols, lvls);

            let mut chosen = None;
            for target in &clicks {
                if let HitTarget::Level(i) = *target {
                    view.level_cursor = i;
                    chosen = Some(i);
                }
            }
            if confirm {
                chosen = Some(view.level_cursor);
            }

            if let Some(level) = chosen {
                if router.record().is_completed(&pack, level) {
                    out.push(Command::RevealAnswer { pack, level });
                } else {
                    out.push(Command::EnterLevel { pack, level });
                }
            } else if back {
                out.push(Command::Back);
            }
        }

        // ── Puzzle ──
        Screen::Puzzle(session) => {
            let a = &session.attempt;
            router.view.pool_cursor = step(router.view.pool_cursor, dx, a.pool().len());

            if a.is_won() {
                if confirm {
                    out.push(Command::Continue);
                } else if back {
                    out.push(Command::Back);
                }
                return false;
            }

            for ch in kb.typed_letters() {
                out.push(Command::TypeLetter(ch));
            }

            for target in &clicks {
                match *target {
                    HitTarget::Tile(id) => out.push(Command::SelectLetter(id)),
                    HitTarget::Slot(i) => out.push(Command::Deselect(i)),
                    _ => {}
                }
            }

            if confirm {
                if let Some(tile) = a.pool().get(router.view.pool_cursor) {
                    if !a.is_placed(tile.id) {
                        out.push(Command::SelectLetter(tile.id));
                    }
                }
            }
            if kb.was_pressed(KEY_ERASE) || gp.erase_pressed() {
                if let Some(slot) = a.last_filled_slot() {
                    out.push(Command::Deselect(slot));
                }
            }
            if kb.was_pressed(KEY_RESET) || gp.reset_pressed() {
                out.push(Command::Reset);
            }
            if kb.was_pressed(KEY_HINT) || gp.hint_pressed() {
                out.push(Command::Hint);
            }
            if kb.was_pressed(KEY_SKIP) || gp.skip_pressed() {
                out.push(Command::Skip);
            }
            if back {
                out.push(Command::Back);
            }
        }

        // ── Answer reveal ──
        Screen::Reveal { .. } => {
            if confirm || back {
                out.push(Command::Back);
            }
        }
    }

    false
}

/// Keep cursors inside whatever the current screen shows.
fn clamp_cursors(router: &mut InputRouter) {
    let pool_len = router.screen().session().map_or(0, |s| s.attempt.pool().len());
    let view = &mut router.view;
    view.pool_cursor = view.pool_cursor.min(pool_len.saturating_sub(1));
    if let Screen::Levels { pack } = router.screen() {
        let lvls = router.catalog().and_then(|c| c.resolve(pack)).map_or(1, |p| p.lvls);
        if router.view.level_cursor >= lvls {
            warn!(cursor = router.view.level_cursor, lvls, "level cursor out of range");
            router.view.level_cursor = lvls - 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_clamps_to_range() {
        assert_eq!(step(0, -1, 5), 0);
        assert_eq!(step(4, 1, 5), 4);
        assert_eq!(step(2, 10, 5), 4);
        assert_eq!(step(3, -1, 5), 2);
        assert_eq!(step(7, 1, 0), 0);
    }
}
