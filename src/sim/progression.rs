/// Level lifecycle rules: access control, win rewards, hint/skip payments.
///
/// Every mutation runs as one `ProgressStore::update` transaction, so a
/// win's coins, star, completion flag and frontier move together or not
/// at all.

use tracing::{debug, info};

use crate::config::EconomyConfig;
use crate::domain::pack::Pack;
use crate::error::{GameError, GameResult};
use crate::sim::catalog::Catalog;
use crate::sim::save::{ProgressRecord, ProgressStore};

/// What a win changed.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct WinReport {
    pub coins_awarded: u32,
    pub star_awarded: bool,
    /// First time this level was completed.
    pub first_completion: bool,
    pub frontier_advanced: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Advance {
    NextLevel(usize),
    PackComplete,
}

pub struct Progression {
    store: ProgressStore,
    economy: EconomyConfig,
}

impl Progression {
    pub fn new(store: ProgressStore, economy: EconomyConfig) -> Self {
        Progression { store, economy }
    }

    pub fn record(&self) -> &ProgressRecord {
        self.store.record()
    }

    pub fn economy(&self) -> &EconomyConfig {
        &self.economy
    }

    // ── Access control ──

    /// Pack exists, its star gate is open, and the level is within the frontier.
    pub fn can_enter_level(&self, catalog: &Catalog, pack_id: &str, level: usize) -> bool {
        let pack = match catalog.resolve(pack_id) {
            Some(p) => p,
            None => return false,
        };
        let record = self.record();
        pack.gate_open(record.stars) && record.frontier(pack_id) >= level
    }

    /// Completed levels may be revealed, never replayed.
    pub fn can_replay_as_answer_reveal(&self, pack_id: &str, level: usize) -> bool {
        self.record().is_completed(pack_id, level)
    }

    /// `can_enter_level` with the refusal as an error.
    pub fn check_entry(&self, catalog: &Catalog, pack_id: &str, level: usize) -> GameResult<()> {
        let in_range = catalog.resolve(pack_id).is_some_and(|p| p.has_level(level));
        if in_range && self.can_enter_level(catalog, pack_id, level) {
            Ok(())
        } else {
            Err(denied(pack_id, level))
        }
    }

    pub fn check_reveal(&self, pack_id: &str, level: usize) -> GameResult<()> {
        if self.can_replay_as_answer_reveal(pack_id, level) {
            Ok(())
        } else {
            Err(denied(pack_id, level))
        }
    }

    // ── Rewards ──

    pub fn on_win(&mut self, pack: &Pack, level: usize) -> GameResult<WinReport> {
        let reward = self.economy.win_reward;
        let report = self
            .store
            .update(|r| Ok(credit_win(r, pack, level, reward, pack.is_star_eligible)))?;
        log_win(pack, level, &report, "solved");
        Ok(report)
    }

    pub fn spend_for_hint(&mut self) -> GameResult<()> {
        let cost = self.economy.hint_cost;
        self.store.update(|r| debit(r, cost))?;
        debug!(cost, coins = self.record().coins, "hint purchased");
        Ok(())
    }

    /// Pay the skip cost and complete the level, in one transaction.
    pub fn spend_for_skip(&mut self, pack: &Pack, level: usize) -> GameResult<WinReport> {
        let cost = self.economy.skip_cost;
        let reward = self.economy.win_reward;
        let star_ok = pack.is_star_eligible && self.economy.skip_awards_star;
        let report = self.store.update(|r| {
            debit(r, cost)?;
            Ok(credit_win(r, pack, level, reward, star_ok))
        })?;
        log_win(pack, level, &report, "skipped");
        Ok(report)
    }

    // ── Transitions ──

    pub fn advance_or_finish(&self, pack: &Pack, level: usize) -> Advance {
        if level + 1 < pack.lvls {
            Advance::NextLevel(level + 1)
        } else {
            Advance::PackComplete
        }
    }
}

fn denied(pack_id: &str, level: usize) -> GameError {
    GameError::AccessDenied { pack: pack_id.to_string(), level }
}

fn debit(record: &mut ProgressRecord, cost: u32) -> GameResult<()> {
    if record.coins < cost {
        return Err(GameError::InsufficientFunds { needed: cost, available: record.coins });
    }
    record.coins -= cost;
    Ok(())
}

/// Completion bookkeeping shared by solve and skip.
///
/// Star: once per level, on its first completion, in star-eligible packs.
/// Frontier: only advances when the finished level *is* the frontier.
/// Coins: paid on every call, repeat wins included.
fn credit_win(
    record: &mut ProgressRecord,
    pack: &Pack,
    level: usize,
    reward: u32,
    star_eligible: bool,
) -> WinReport {
    let first_completion = record
        .completed
        .entry(pack.id.clone())
        .or_default()
        .insert(level);

    let star_awarded = first_completion && star_eligible;
    if star_awarded {
        record.stars = record.stars.saturating_add(1);
    }

    let frontier = record.unlocked.entry(pack.id.clone()).or_insert(0);
    let frontier_advanced = *frontier == level;
    if frontier_advanced {
        *frontier = level + 1;
    }

    record.coins = record.coins.saturating_add(reward);

    WinReport { coins_awarded: reward, star_awarded, first_completion, frontier_advanced }
}

fn log_win(pack: &Pack, level: usize, report: &WinReport, how: &str) {
    if report.first_completion {
        info!(
            pack = %pack.id,
            level,
            star = report.star_awarded,
            unlocked_next = report.frontier_advanced,
            "level {how}"
        );
    } else {
        debug!(pack = %pack.id, level, coins = report.coins_awarded, "repeat win paid again");
    }
}
