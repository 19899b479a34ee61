/// Command dispatch: typed commands in, puzzle/progression calls out.
///
/// The router owns the active `Screen`, the catalog, the progression rules
/// and the puzzle engine. Input adapters turn keys, clicks and gamepad
/// buttons into `Command`s; the router decides what each one means on the
/// current screen and reports outcomes as `GameEvent`s.
///
/// ## Screen flow
///
/// ```text
///   Title ─ShowPacks→ Packs ─OpenPack→ Levels ─EnterLevel→ Puzzle ─Continue→ Puzzle (next)
///                                        │                    └─(last level)→ Levels
///                                        └─RevealAnswer→ Reveal
///   Back: Puzzle/Reveal → Levels → Packs → Title
/// ```
///
/// A command that makes no sense on the active screen is ignored.

use tracing::{debug, error, info, warn};

use crate::domain::letter::PoolId;
use crate::domain::pack::Pack;
use crate::domain::puzzle::{HintOutcome, PuzzleEngine, Verdict};
use crate::error::{GameError, GameResult};
use crate::sim::catalog::Catalog;
use crate::sim::event::GameEvent;
use crate::sim::progression::{Advance, Progression};
use crate::sim::save::ProgressRecord;
use crate::sim::world::{Screen, Session, View, MESSAGE_TICKS};

/// Ticks the "wrong attempt" flash lasts.
const WRONG_FLASH_TICKS: u32 = 6;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    SelectLetter(PoolId),
    /// Place the first free tile showing this letter.
    TypeLetter(char),
    Deselect(usize),
    Reset,
    Hint,
    Skip,
    EnterLevel { pack: String, level: usize },
    RevealAnswer { pack: String, level: usize },
    ShowPacks,
    OpenPack(String),
    /// Move on after a solved level.
    Continue,
    Back,
}

pub struct InputRouter {
    screen: Screen,
    pub view: View,
    engine: PuzzleEngine,
    progression: Progression,
    /// `None` when the catalog failed to load; only `Back` is served then.
    catalog: Option<Catalog>,
}

impl InputRouter {
    pub fn new(catalog: GameResult<Catalog>, progression: Progression, engine: PuzzleEngine) -> Self {
        let (screen, catalog) = match catalog {
            Ok(c) => (Screen::Title, Some(c)),
            Err(e) => {
                warn!("starting degraded: {e}");
                (Screen::Degraded { reason: e.to_string() }, None)
            }
        };
        InputRouter { screen, view: View::default(), engine, progression, catalog }
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn catalog(&self) -> Option<&Catalog> {
        self.catalog.as_ref()
    }

    pub fn record(&self) -> &ProgressRecord {
        self.progression.record()
    }

    pub fn progression(&self) -> &Progression {
        &self.progression
    }

    /// Run one command against the active screen.
    pub fn dispatch(&mut self, cmd: Command) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if !self.accepts(&cmd) {
            debug!(screen = self.screen.name(), ?cmd, "command ignored");
            return events;
        }

        match cmd {
            Command::ShowPacks => {
                self.view.pack_cursor = 0;
                self.screen = Screen::Packs;
            }
            Command::OpenPack(id) => self.open_pack(&id, &mut events),
            Command::EnterLevel { pack, level } => self.enter_level(&pack, level, &mut events),
            Command::RevealAnswer { pack, level } => self.reveal(&pack, level, &mut events),
            Command::SelectLetter(id) => self.select(id, &mut events),
            Command::TypeLetter(ch) => self.type_letter(ch, &mut events),
            Command::Deselect(slot) => self.deselect(slot, &mut events),
            Command::Reset => self.reset(),
            Command::Hint => self.hint(&mut events),
            Command::Skip => self.skip(&mut events),
            Command::Continue => self.continue_after_win(&mut events),
            Command::Back => self.back(),
        }
        events
    }

    fn accepts(&self, cmd: &Command) -> bool {
        match (&self.screen, cmd) {
            (_, Command::Back) => true,
            (Screen::Title, Command::ShowPacks) => true,
            (Screen::Packs, Command::OpenPack(_)) => true,
            (Screen::Levels { .. }, Command::EnterLevel { .. } | Command::RevealAnswer { .. }) => true,
            (
                Screen::Puzzle(_),
                Command::SelectLetter(_)
                | Command::TypeLetter(_)
                | Command::Deselect(_)
                | Command::Reset
                | Command::Hint
                | Command::Skip
                | Command::Continue,
            ) => true,
            _ => false,
        }
    }

    // ══════════════════════════════════════════════════════════
    // Navigation
    // ══════════════════════════════════════════════════════════

    fn open_pack(&mut self, pack_id: &str, events: &mut Vec<GameEvent>) {
        let catalog = match self.catalog.as_mut() {
            Some(c) => c,
            None => return,
        };
        let pack = match catalog.resolve(pack_id) {
            Some(p) => p.clone(),
            None => {
                debug!(pack = pack_id, "unknown pack");
                events.push(GameEvent::AccessDenied { pack: pack_id.to_string(), level: None });
                self.view.set_message("Locked", MESSAGE_TICKS);
                return;
            }
        };

        let stars = self.progression.record().stars;
        if !pack.gate_open(stars) {
            events.push(GameEvent::AccessDenied { pack: pack.id.clone(), level: None });
            let need = pack.star.unwrap_or(0);
            self.view.set_message(
                &format!("{} needs {} stars (you have {})", pack.name, need, stars),
                MESSAGE_TICKS,
            );
            return;
        }

        // Warm the word-list cache before the first level is chosen.
        if catalog.load_words(&pack.id).is_empty() {
            self.view.set_message("Word list unavailable for this pack", MESSAGE_TICKS);
        }

        let frontier = self.progression.record().frontier(&pack.id);
        self.view.level_cursor = frontier.min(pack.lvls - 1);
        self.screen = Screen::Levels { pack: pack.id };
    }

    fn enter_level(&mut self, pack_id: &str, level: usize, events: &mut Vec<GameEvent>) {
        // Completed levels are revealed, never replayed.
        if self.progression.can_replay_as_answer_reveal(pack_id, level) {
            self.reveal(pack_id, level, events);
            return;
        }

        let catalog = match self.catalog.as_mut() {
            Some(c) => c,
            None => return,
        };
        if let Err(e) = self.progression.check_entry(catalog, pack_id, level) {
            self.refuse(e, events);
            return;
        }
        let pack = match catalog.resolve(pack_id) {
            Some(p) => p.clone(),
            None => return,
        };

        let attempt = catalog
            .word_for(pack_id, level)
            .and_then(|word| self.engine.start_attempt(&word));
        match attempt {
            Ok(attempt) => {
                info!(pack = pack_id, level, "level started");
                self.screen = Screen::Puzzle(Session { pack: pack.id.clone(), level, attempt });
                self.view.pool_cursor = 0;
                self.view.wrong_flash = 0;
                self.view.set_message(&format!("{}: Level {}", pack.name, level + 1), MESSAGE_TICKS);
            }
            Err(e) => {
                warn!(pack = pack_id, level, "cannot start level: {e}");
                events.push(GameEvent::InvalidLevel { pack: pack.id.clone(), level });
                self.view.level_cursor = level;
                self.screen = Screen::Levels { pack: pack.id };
                self.view.set_message("This level is unavailable", MESSAGE_TICKS);
            }
        }
    }

    fn reveal(&mut self, pack_id: &str, level: usize, events: &mut Vec<GameEvent>) {
        if let Err(e) = self.progression.check_reveal(pack_id, level) {
            self.refuse(e, events);
            return;
        }
        let catalog = match self.catalog.as_mut() {
            Some(c) => c,
            None => return,
        };
        let image = match catalog.resolve(pack_id) {
            Some(p) => p.image_path(level),
            None => {
                self.refuse(GameError::AccessDenied { pack: pack_id.to_string(), level }, events);
                return;
            }
        };
        match catalog.word_for(pack_id, level) {
            Ok(answer) => {
                self.screen = Screen::Reveal { pack: pack_id.to_string(), level, answer, image };
            }
            Err(e) => {
                warn!(pack = pack_id, level, "cannot reveal: {e}");
                events.push(GameEvent::InvalidLevel { pack: pack_id.to_string(), level });
                self.view.set_message("This level is unavailable", MESSAGE_TICKS);
            }
        }
    }

    fn back(&mut self) {
        let next = match &self.screen {
            Screen::Title | Screen::Degraded { .. } => return,
            Screen::Packs => Screen::Title,
            Screen::Levels { .. } => Screen::Packs,
            Screen::Puzzle(s) => {
                self.view.level_cursor = s.level;
                Screen::Levels { pack: s.pack.clone() }
            }
            Screen::Reveal { pack, level, .. } => {
                self.view.level_cursor = *level;
                Screen::Levels { pack: pack.clone() }
            }
        };
        self.view.clear_message();
        self.screen = next;
    }

    // ══════════════════════════════════════════════════════════
    // Puzzle operations
    // ══════════════════════════════════════════════════════════

    fn select(&mut self, id: PoolId, events: &mut Vec<GameEvent>) {
        let session = match self.screen.session_mut() {
            Some(s) => s,
            None => return,
        };
        match session.attempt.select_letter(id) {
            Ok(placed) => {
                events.push(GameEvent::LetterPlaced { slot: placed.slot });
                self.settle(placed.verdict, events);
            }
            Err(e) => debug!("select refused: {e}"),
        }
    }

    fn type_letter(&mut self, ch: char, events: &mut Vec<GameEvent>) {
        let free = match self.screen.session() {
            Some(s) if !s.attempt.is_won() => {
                if s.attempt.slots().iter().all(Option::is_some) {
                    self.view.set_message("Every slot is full: remove a letter first", MESSAGE_TICKS);
                    return;
                }
                s.attempt.first_unplaced(ch)
            }
            _ => return,
        };
        match free {
            Some(id) => self.select(id, events),
            None => self.view.set_message(
                &format!("No '{}' left in the pool", ch.to_uppercase()),
                MESSAGE_TICKS,
            ),
        }
    }

    fn deselect(&mut self, slot: usize, events: &mut Vec<GameEvent>) {
        let session = match self.screen.session_mut() {
            Some(s) => s,
            None => return,
        };
        match session.attempt.deselect_letter(slot) {
            Ok(Some(_)) => {
                events.push(GameEvent::LetterRemoved { slot });
                self.view.wrong_flash = 0;
            }
            Ok(None) => {}
            Err(e) => debug!("deselect refused: {e}"),
        }
    }

    fn reset(&mut self) {
        let session = match self.screen.session_mut() {
            Some(s) if !s.attempt.is_won() => s,
            _ => return,
        };
        session.attempt = self.engine.reset_attempt(&session.attempt);
        self.view.pool_cursor = 0;
        self.view.wrong_flash = 0;
        self.view.set_message("Shuffled", MESSAGE_TICKS);
    }

    fn hint(&mut self, events: &mut Vec<GameEvent>) {
        match self.screen.session() {
            Some(s) if !s.attempt.is_won() => {}
            _ => return,
        }
        if let Err(e) = self.progression.spend_for_hint() {
            self.refuse(e, events);
            return;
        }

        let outcome = match self.screen.session_mut() {
            Some(s) => s.attempt.apply_hint(),
            None => return,
        };
        if let HintOutcome::Applied { slot, verdict } = outcome {
            events.push(GameEvent::HintApplied { slot });
            let cost = self.progression.economy().hint_cost;
            self.view.set_message(&format!("Hint used: -{} coins", cost), MESSAGE_TICKS);
            self.settle(verdict, events);
        }
    }

    fn skip(&mut self, events: &mut Vec<GameEvent>) {
        let (pack_id, level) = match self.screen.session() {
            Some(s) if !s.attempt.is_won() => (s.pack.clone(), s.level),
            _ => return,
        };
        let pack = match self.current_pack(&pack_id) {
            Some(p) => p,
            None => return,
        };
        match self.progression.spend_for_skip(&pack, level) {
            Ok(report) => {
                events.push(GameEvent::LevelSkipped { pack: pack.id.clone(), level, report });
                self.advance(&pack, level, events);
            }
            Err(e) => self.refuse(e, events),
        }
    }

    fn continue_after_win(&mut self, events: &mut Vec<GameEvent>) {
        let (pack_id, level) = match self.screen.session() {
            Some(s) if s.attempt.is_won() => (s.pack.clone(), s.level),
            _ => return,
        };
        // A win whose save failed is retried; the level is left only once it is recorded.
        if !self.progression.record().is_completed(&pack_id, level) {
            self.complete_level(events);
            if !self.progression.record().is_completed(&pack_id, level) {
                return;
            }
        }
        if let Some(pack) = self.current_pack(&pack_id) {
            self.advance(&pack, level, events);
        }
    }

    /// React to the verdict reached after a placement or hint.
    fn settle(&mut self, verdict: Verdict, events: &mut Vec<GameEvent>) {
        match verdict {
            Verdict::Win => self.complete_level(events),
            Verdict::Mismatch => {
                events.push(GameEvent::WrongAttempt);
                self.view.wrong_flash = WRONG_FLASH_TICKS;
                self.view.set_message("Not quite. Keep trying!", MESSAGE_TICKS);
            }
            Verdict::Incomplete => {}
        }
    }

    fn complete_level(&mut self, events: &mut Vec<GameEvent>) {
        let (pack_id, level, answer) = match self.screen.session() {
            Some(s) => (s.pack.clone(), s.level, s.attempt.raw_word().trim().to_string()),
            None => return,
        };
        let pack = match self.current_pack(&pack_id) {
            Some(p) => p,
            None => return,
        };
        match self.progression.on_win(&pack, level) {
            Ok(report) => {
                let mut msg = format!("{answer}! +{} coins", report.coins_awarded);
                if report.star_awarded {
                    msg.push_str(", +1 star");
                }
                msg.push_str("  [Enter] Continue");
                self.view.set_message(&msg, 0);
                events.push(GameEvent::LevelWon { pack: pack.id, level, report });
            }
            Err(e) => {
                error!(pack = %pack.id, level, "win not recorded: {e}");
                events.push(GameEvent::SaveFailed);
                self.view.set_message("Could not save progress  [Enter] Retry", 0);
            }
        }
    }

    fn advance(&mut self, pack: &Pack, level: usize, events: &mut Vec<GameEvent>) {
        match self.progression.advance_or_finish(pack, level) {
            Advance::NextLevel(next) => {
                self.view.clear_message();
                self.enter_level(&pack.id, next, events);
            }
            Advance::PackComplete => {
                info!(pack = %pack.id, "pack complete");
                events.push(GameEvent::PackComplete { pack: pack.id.clone() });
                self.view.level_cursor = level;
                self.screen = Screen::Levels { pack: pack.id.clone() };
                self.view.set_message(&format!("{} complete!", pack.name), MESSAGE_TICKS);
            }
        }
    }

    fn refuse(&mut self, err: GameError, events: &mut Vec<GameEvent>) {
        match err {
            GameError::AccessDenied { pack, level } => {
                debug!(%pack, level, "access denied");
                events.push(GameEvent::AccessDenied { pack, level: Some(level) });
                self.view.set_message("Locked", MESSAGE_TICKS);
            }
            GameError::InsufficientFunds { needed, available } => {
                events.push(GameEvent::InsufficientFunds { needed, available });
                self.view.set_message(
                    &format!("Need {} coins (you have {})", needed, available),
                    MESSAGE_TICKS,
                );
            }
            other => {
                error!("progress update failed: {other}");
                events.push(GameEvent::SaveFailed);
                self.view.set_message("Could not save progress", MESSAGE_TICKS);
            }
        }
    }

    fn current_pack(&self, pack_id: &str) -> Option<Pack> {
        self.catalog.as_ref()?.resolve(pack_id).cloned()
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
