/// Puzzle engine: the scramble and the slot/pool bijection for one level.
///
/// ## Model
///
///   - `target` — the normalized answer, one char per slot.
///   - `pool`   — a shuffled permutation of `target`, each letter tagged
///                with a `PoolId` that is unique for the engine's lifetime.
///   - `slots`  — one entry per answer position, `None` or the id placed there.
///
/// Invariant: a `PoolId` appears in `slots` at most once, and only ids from
/// `pool` appear at all. Every mutating operation either applies fully or
/// returns an error with the attempt untouched.
///
/// ## Lifecycle
///
/// ```text
///   Empty ─select→ PartiallyFilled ─select→ Full ─┬─ Mismatch ─deselect→ PartiallyFilled
///                                                  └─ Win (terminal)
/// ```
///
/// Once `Win` is reached the attempt refuses further edits. Reset builds a
/// brand-new attempt through the engine.

use thiserror::Error;

use super::letter::{normalize_word, PoolId, PoolLetter};
use crate::error::{GameError, GameResult};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PuzzleError {
    #[error("letter {0} is not in the pool")]
    UnknownLetter(PoolId),
    #[error("letter {0} is already placed")]
    AlreadyPlaced(PoolId),
    #[error("every slot is already filled")]
    NoEmptySlot,
    #[error("slot {index} out of range (answer has {len} slots)")]
    SlotOutOfRange { index: usize, len: usize },
    #[error("attempt is already solved")]
    AlreadyWon,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Verdict {
    /// Every slot holds the letter of the answer at that position.
    Win,
    /// Every slot is filled but the word is wrong. State is kept.
    Mismatch,
    Incomplete,
}

/// Result of a successful `select_letter`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Placement {
    pub slot: usize,
    pub verdict: Verdict,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HintOutcome {
    Applied { slot: usize, verdict: Verdict },
    NoChangeNeeded,
}

// ══════════════════════════════════════════════════════════════
// Engine: scramble + id allocation
// ══════════════════════════════════════════════════════════════

pub struct PuzzleEngine {
    rng: fastrand::Rng,
    next_id: u64,
}

impl PuzzleEngine {
    pub fn new() -> Self {
        PuzzleEngine { rng: fastrand::Rng::new(), next_id: 0 }
    }

    #[cfg(test)]
    pub fn with_seed(seed: u64) -> Self {
        PuzzleEngine { rng: fastrand::Rng::with_seed(seed), next_id: 0 }
    }

    /// Normalize `raw_word` and build a freshly shuffled attempt.
    pub fn start_attempt(&mut self, raw_word: &str) -> GameResult<Attempt> {
        let target = normalize_word(raw_word);
        if target.is_empty() {
            return Err(GameError::InvalidLevelData(format!(
                "answer {:?} is empty", raw_word
            )));
        }
        Ok(self.scramble(raw_word.to_string(), target))
    }

    /// Discard `attempt` and start over on the same answer with a new shuffle.
    pub fn reset_attempt(&mut self, attempt: &Attempt) -> Attempt {
        self.scramble(attempt.raw_word.clone(), attempt.target.clone())
    }

    fn scramble(&mut self, raw_word: String, target: Vec<char>) -> Attempt {
        let mut pool: Vec<PoolLetter> = target
            .iter()
            .map(|&ch| PoolLetter { ch, id: self.allocate_id() })
            .collect();
        // Fisher–Yates
        self.rng.shuffle(&mut pool);

        let slots = vec![None; target.len()];
        Attempt { raw_word, target, pool, slots, won: false }
    }

    fn allocate_id(&mut self) -> PoolId {
        let id = PoolId::new(self.next_id);
        self.next_id += 1;
        id
    }
}

// ══════════════════════════════════════════════════════════════
// Attempt: one play session of one level
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct Attempt {
    raw_word: String,
    target: Vec<char>,
    pool: Vec<PoolLetter>,
    slots: Vec<Option<PoolId>>,
    won: bool,
}

impl Attempt {
    // ── Queries ──

    pub fn raw_word(&self) -> &str {
        &self.raw_word
    }

    #[cfg(test)]
    pub fn target(&self) -> &[char] {
        &self.target
    }

    pub fn pool(&self) -> &[PoolLetter] {
        &self.pool
    }

    pub fn slots(&self) -> &[Option<PoolId>] {
        &self.slots
    }

    pub fn is_won(&self) -> bool {
        self.won
    }

    pub fn letter_of(&self, id: PoolId) -> Option<char> {
        self.pool.iter().find(|l| l.id == id).map(|l| l.ch)
    }

    /// Slot currently holding `id`, if any.
    pub fn slot_of(&self, id: PoolId) -> Option<usize> {
        self.slots.iter().position(|s| *s == Some(id))
    }

    pub fn is_placed(&self, id: PoolId) -> bool {
        self.slot_of(id).is_some()
    }

    /// Letters as the player sees them, slot by slot.
    pub fn slot_letters(&self) -> Vec<Option<char>> {
        self.slots
            .iter()
            .map(|s| s.and_then(|id| self.letter_of(id)))
            .collect()
    }

    pub fn is_slot_correct(&self, slot: usize) -> bool {
        match self.slots.get(slot).copied().flatten() {
            Some(id) => self.letter_of(id) == Some(self.target[slot]),
            None => false,
        }
    }

    #[cfg(test)]
    pub fn correct_count(&self) -> usize {
        (0..self.slots.len()).filter(|&i| self.is_slot_correct(i)).count()
    }

    /// First pool tile showing `ch` that is not yet placed (typing support).
    pub fn first_unplaced(&self, ch: char) -> Option<PoolId> {
        let wanted: Vec<char> = ch.to_uppercase().collect();
        if wanted.len() != 1 {
            return None;
        }
        self.pool
            .iter()
            .find(|l| l.ch == wanted[0] && !self.is_placed(l.id))
            .map(|l| l.id)
    }

    /// Right-most filled slot (backspace support).
    pub fn last_filled_slot(&self) -> Option<usize> {
        self.slots.iter().rposition(Option::is_some)
    }

    pub fn evaluate(&self) -> Verdict {
        if self.slots.iter().any(Option::is_none) {
            return Verdict::Incomplete;
        }
        let spelled = self.slot_letters();
        let matches = spelled
            .iter()
            .zip(&self.target)
            .all(|(got, want)| *got == Some(*want));
        if matches { Verdict::Win } else { Verdict::Mismatch }
    }

    // ── Mutations ──

    /// Place `id` into the first empty slot, left to right.
    pub fn select_letter(&mut self, id: PoolId) -> Result<Placement, PuzzleError> {
        if self.won {
            return Err(PuzzleError::AlreadyWon);
        }
        if self.letter_of(id).is_none() {
            return Err(PuzzleError::UnknownLetter(id));
        }
        if self.is_placed(id) {
            return Err(PuzzleError::AlreadyPlaced(id));
        }
        let slot = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(PuzzleError::NoEmptySlot)?;

        self.slots[slot] = Some(id);
        let verdict = self.settle();
        Ok(Placement { slot, verdict })
    }

    /// Empty `slot`. Returns the id that was there, if any.
    pub fn deselect_letter(&mut self, slot: usize) -> Result<Option<PoolId>, PuzzleError> {
        if self.won {
            return Err(PuzzleError::AlreadyWon);
        }
        let len = self.slots.len();
        let cell = self
            .slots
            .get_mut(slot)
            .ok_or(PuzzleError::SlotOutOfRange { index: slot, len })?;
        Ok(cell.take())
    }

    /// Put the correct letter into the left-most slot that is empty or wrong.
    ///
    /// An unplaced tile with the right character is preferred. Otherwise a
    /// placed one is pulled out of a slot where it is *not* correct; such a
    /// tile always exists because the target slot still lacks its letter.
    /// A wrong letter sitting in the target slot goes back to the pool.
    pub fn apply_hint(&mut self) -> HintOutcome {
        if self.won {
            return HintOutcome::NoChangeNeeded;
        }
        let slot = match (0..self.slots.len()).find(|&i| !self.is_slot_correct(i)) {
            Some(i) => i,
            None => return HintOutcome::NoChangeNeeded,
        };
        let wanted = self.target[slot];

        let unplaced = self
            .pool
            .iter()
            .find(|l| l.ch == wanted && !self.is_placed(l.id))
            .map(|l| l.id);
        let chosen = unplaced.or_else(|| {
            self.pool
                .iter()
                .filter(|l| l.ch == wanted)
                .find(|l| match self.slot_of(l.id) {
                    Some(at) => !self.is_slot_correct(at),
                    None => false,
                })
                .map(|l| l.id)
        });

        let id = match chosen {
            Some(id) => id,
            // Unreachable while the pool is a permutation of the target.
            None => return HintOutcome::NoChangeNeeded,
        };

        if let Some(old) = self.slot_of(id) {
            self.slots[old] = None;
        }
        self.slots[slot] = Some(id);
        let verdict = self.settle();
        HintOutcome::Applied { slot, verdict }
    }

    fn settle(&mut self) -> Verdict {
        let verdict = self.evaluate();
        if verdict == Verdict::Win {
            self.won = true;
        }
        verdict
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::{HashMap, HashSet};

    fn sorted(chars: impl IntoIterator<Item = char>) -> Vec<char> {
        let mut v: Vec<char> = chars.into_iter().collect();
        v.sort_unstable();
        v
    }

    /// Select pool tiles so that the slots spell `word` left to right.
    fn spell(attempt: &mut Attempt, word: &str) -> Verdict {
        let mut last = Verdict::Incomplete;
        for ch in word.chars() {
            let id = attempt.first_unplaced(ch).expect("letter available");
            last = attempt.select_letter(id).expect("select").verdict;
        }
        last
    }

    fn assert_bijection(a: &Attempt) {
        let placed: Vec<PoolId> = a.slots().iter().flatten().copied().collect();
        let unique: HashSet<PoolId> = placed.iter().copied().collect();
        assert_eq!(placed.len(), unique.len(), "pool id placed twice");
        for id in placed {
            assert!(a.letter_of(id).is_some(), "foreign id {id} in slots");
        }
    }

    // ── start_attempt ──

    #[test]
    fn start_normalizes_and_leaves_slots_empty() {
        let mut engine = PuzzleEngine::with_seed(1);
        let a = engine.start_attempt(" Sho lay ").unwrap();
        assert_eq!(a.target().iter().collect::<String>(), "SHOLAY");
        assert_eq!(a.slots().len(), 6);
        assert!(a.slots().iter().all(Option::is_none));
        assert_eq!(a.evaluate(), Verdict::Incomplete);
        assert_eq!(a.raw_word(), " Sho lay ");
    }

    #[test]
    fn start_rejects_blank_answer() {
        let mut engine = PuzzleEngine::with_seed(1);
        assert!(matches!(
            engine.start_attempt("   "),
            Err(GameError::InvalidLevelData(_))
        ));
    }

    #[test]
    fn duplicate_letters_get_distinct_ids() {
        let mut engine = PuzzleEngine::with_seed(3);
        let a = engine.start_attempt("AAAA").unwrap();
        let ids: HashSet<PoolId> = a.pool().iter().map(|l| l.id).collect();
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn ids_are_unique_across_attempts() {
        let mut engine = PuzzleEngine::with_seed(3);
        let a = engine.start_attempt("RAJA").unwrap();
        let b = engine.reset_attempt(&a);
        let ids_a: HashSet<PoolId> = a.pool().iter().map(|l| l.id).collect();
        assert!(b.pool().iter().all(|l| !ids_a.contains(&l.id)));
    }

    // ── select / deselect ──

    #[test]
    fn select_fills_first_empty_slot() {
        let mut engine = PuzzleEngine::with_seed(5);
        let mut a = engine.start_attempt("ABC").unwrap();
        let ids: Vec<PoolId> = a.pool().iter().map(|l| l.id).collect();

        assert_eq!(a.select_letter(ids[0]).unwrap().slot, 0);
        assert_eq!(a.select_letter(ids[1]).unwrap().slot, 1);
        a.deselect_letter(0).unwrap();
        // Hole at 0 is filled before 2
        assert_eq!(a.select_letter(ids[2]).unwrap().slot, 0);
    }

    #[test]
    fn select_then_deselect_restores_empty_state() {
        let mut engine = PuzzleEngine::with_seed(9);
        let mut a = engine.start_attempt("KAHAANI").unwrap();
        let pool_before = a.pool().to_vec();
        let id = pool_before[3].id;

        let placed = a.select_letter(id).unwrap();
        assert!(a.is_placed(id));
        assert_eq!(a.deselect_letter(placed.slot).unwrap(), Some(id));

        assert!(!a.is_placed(id));
        assert!(a.slots().iter().all(Option::is_none));
        assert_eq!(a.pool(), pool_before.as_slice());
    }

    #[test]
    fn select_rejects_placed_and_unknown_ids() {
        let mut engine = PuzzleEngine::with_seed(2);
        let mut a = engine.start_attempt("ABC").unwrap();
        let id = a.pool()[0].id;
        a.select_letter(id).unwrap();
        assert_eq!(a.select_letter(id), Err(PuzzleError::AlreadyPlaced(id)));

        let foreign = PoolId::new(9_999);
        assert_eq!(a.select_letter(foreign), Err(PuzzleError::UnknownLetter(foreign)));
        assert_eq!(a.slots().iter().flatten().count(), 1);
    }

    #[test]
    fn deselect_empty_slot_is_noop() {
        let mut engine = PuzzleEngine::with_seed(2);
        let mut a = engine.start_attempt("ABC").unwrap();
        assert_eq!(a.deselect_letter(2).unwrap(), None);
        assert_eq!(
            a.deselect_letter(3),
            Err(PuzzleError::SlotOutOfRange { index: 3, len: 3 })
        );
    }

    // ── evaluate ──

    #[test]
    fn correct_spelling_wins() {
        let mut engine = PuzzleEngine::with_seed(11);
        let mut a = engine.start_attempt("SHOLAY").unwrap();
        assert_eq!(spell(&mut a, "SHOLAY"), Verdict::Win);
        assert!(a.is_won());
    }

    #[test]
    fn wrong_spelling_is_mismatch_and_keeps_state() {
        let mut engine = PuzzleEngine::with_seed(11);
        let mut a = engine.start_attempt("SHOLAY").unwrap();
        assert_eq!(spell(&mut a, "SHOALY"), Verdict::Mismatch);
        assert!(!a.is_won());
        assert_eq!(a.slots().iter().flatten().count(), 6);

        // Player keeps editing: swap the A and L back
        a.deselect_letter(3).unwrap();
        a.deselect_letter(4).unwrap();
        assert_eq!(spell(&mut a, "LA"), Verdict::Win);
    }

    #[test]
    fn won_attempt_is_terminal() {
        let mut engine = PuzzleEngine::with_seed(6);
        let mut a = engine.start_attempt("RAJA").unwrap();
        spell(&mut a, "RAJA");
        assert_eq!(a.deselect_letter(0), Err(PuzzleError::AlreadyWon));
        assert_eq!(a.apply_hint(), HintOutcome::NoChangeNeeded);
        assert!(a.slots().iter().all(Option::is_some));
    }

    // ── hints ──

    #[test]
    fn hint_fills_first_empty_slot_with_correct_letter() {
        let mut engine = PuzzleEngine::with_seed(8);
        let mut a = engine.start_attempt("RAJA").unwrap();
        match a.apply_hint() {
            HintOutcome::Applied { slot, verdict } => {
                assert_eq!(slot, 0);
                assert_eq!(verdict, Verdict::Incomplete);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(a.slot_letters()[0], Some('R'));
    }

    #[test]
    fn hint_replaces_wrong_letter_and_returns_it_to_pool() {
        let mut engine = PuzzleEngine::with_seed(8);
        let mut a = engine.start_attempt("RAJA").unwrap();
        let j = a.first_unplaced('J').unwrap();
        a.select_letter(j).unwrap(); // J in slot 0, wrong

        a.apply_hint();
        assert_eq!(a.slot_letters()[0], Some('R'));
        assert!(!a.is_placed(j));
    }

    #[test]
    fn hint_steals_misplaced_letter_when_none_free() {
        let mut engine = PuzzleEngine::with_seed(12);
        let mut a = engine.start_attempt("AB").unwrap();
        // "BA": both wrong, nothing unplaced
        assert_eq!(spell(&mut a, "BA"), Verdict::Mismatch);

        match a.apply_hint() {
            HintOutcome::Applied { slot, .. } => assert_eq!(slot, 0),
            other => panic!("unexpected {other:?}"),
        }
        // The B that sat in slot 0 goes back to the pool
        assert_eq!(a.slot_letters(), vec![Some('A'), None]);
        assert_eq!(a.evaluate(), Verdict::Incomplete);
        assert_bijection(&a);
    }

    #[test]
    fn hint_never_steals_from_a_correct_slot() {
        let mut engine = PuzzleEngine::with_seed(13);
        let mut a = engine.start_attempt("AAB").unwrap();
        // "ABA": slot 0 correct A, slot 1 wrong B, slot 2 wrong A
        assert_eq!(spell(&mut a, "ABA"), Verdict::Mismatch);
        let before = a.correct_count();
        a.apply_hint();
        assert_eq!(a.correct_count(), before + 1);
        assert_eq!(a.slot_letters()[0], Some('A'));
        assert_eq!(a.slot_letters()[1], Some('A'));
        assert_eq!(a.slot_letters()[2], None);
        assert_bijection(&a);
    }

    #[test]
    fn repeated_hints_solve_the_puzzle() {
        let mut engine = PuzzleEngine::with_seed(21);
        let mut a = engine.start_attempt("Dil Chahta Hai").unwrap();
        let n = a.target().len();
        for _ in 0..n {
            assert!(matches!(a.apply_hint(), HintOutcome::Applied { .. }));
        }
        assert!(a.is_won());
        assert_eq!(a.apply_hint(), HintOutcome::NoChangeNeeded);
    }

    // ── Scramble fairness ──

    #[test]
    fn shuffle_is_roughly_uniform() {
        let mut engine = PuzzleEngine::with_seed(0xC0FFEE);
        let runs = 6_000;
        let mut counts: HashMap<String, usize> = HashMap::new();
        for _ in 0..runs {
            let a = engine.start_attempt("ABC").unwrap();
            let key: String = a.pool().iter().map(|l| l.ch).collect();
            *counts.entry(key).or_default() += 1;
        }
        assert_eq!(counts.len(), 6, "every permutation should appear");

        // Pearson chi-square, 5 degrees of freedom; 20.5 is p ≈ 0.001
        let expected = runs as f64 / 6.0;
        let chi2: f64 = counts
            .values()
            .map(|&c| (c as f64 - expected).powi(2) / expected)
            .sum();
        assert!(chi2 < 20.5, "chi-square too high: {chi2} ({counts:?})");
    }

    // ── Properties ──

    proptest! {
        #[test]
        fn prop_pool_is_permutation_of_target(
            word in "[A-Za-z ]{0,12}",
            seed in any::<u64>(),
        ) {
            let mut engine = PuzzleEngine::with_seed(seed);
            match engine.start_attempt(&word) {
                Ok(a) => {
                    prop_assert_eq!(
                        sorted(a.pool().iter().map(|l| l.ch)),
                        sorted(a.target().iter().copied())
                    );
                    prop_assert!(a.slots().iter().all(Option::is_none));
                }
                Err(_) => prop_assert!(word.trim().is_empty()),
            }
        }

        #[test]
        fn prop_hint_adds_exactly_one_correct_slot(
            word in "[A-D]{1,8}",
            seed in any::<u64>(),
            ops in prop::collection::vec((any::<bool>(), 0usize..8), 0..24),
        ) {
            let mut engine = PuzzleEngine::with_seed(seed);
            let mut a = engine.start_attempt(&word).unwrap();

            for (select, idx) in ops {
                if select {
                    let id = a.pool()[idx % a.pool().len()].id;
                    let _ = a.select_letter(id);
                } else {
                    let _ = a.deselect_letter(idx % a.slots().len());
                }
                assert_bijection(&a);
            }

            let before = a.correct_count();
            match a.apply_hint() {
                HintOutcome::Applied { .. } => {
                    prop_assert_eq!(a.correct_count(), before + 1);
                }
                HintOutcome::NoChangeNeeded => {
                    prop_assert_eq!(before, a.target().len());
                }
            }
            assert_bijection(&a);
        }

        #[test]
        fn prop_win_iff_spelled_exactly(
            word in "[A-C]{1,6}",
            seed in any::<u64>(),
            order_seed in any::<u64>(),
        ) {
            let mut engine = PuzzleEngine::with_seed(seed);
            let mut a = engine.start_attempt(&word).unwrap();
            let mut ids: Vec<PoolId> = a.pool().iter().map(|l| l.id).collect();
            fastrand::Rng::with_seed(order_seed).shuffle(&mut ids);

            let mut verdict = Verdict::Incomplete;
            for id in ids {
                verdict = a.select_letter(id).unwrap().verdict;
            }
            let spelled: String = a.slot_letters().into_iter().flatten().collect();
            let target: String = a.target().iter().collect();
            prop_assert_eq!(verdict == Verdict::Win, spelled == target);
        }
    }
}
