/// Letter tiles: the unit of the scrambled pool.
///
/// A tile pairs a character with a stable `PoolId`. Ids never change
/// after the attempt is created, so two identical letters stay
/// individually addressable however the pool is drawn or clicked.

use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct PoolId(u64);

impl PoolId {
    pub fn new(raw: u64) -> Self {
        PoolId(raw)
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PoolLetter {
    pub ch: char,
    pub id: PoolId,
}

/// Strip every whitespace character and upper-case the rest.
/// Punctuation and digits are kept: they are part of the answer.
pub fn normalize_word(raw: &str) -> Vec<char> {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}
