/// Pack catalog and per-pack word lists.
///
/// ## Sources
///
///   `packs.json`   — standard packs
///   `events.json`  — event packs
///
/// Each is a JSON array of records:
///
///   ```text
///   { "name": "Classic", "id": "classic", "lvls": 3,
///     "star": 2, "is_star": true, "cover": 0, "description": "..." }
///   ```
///
/// Only `name` and `lvls` are required. `id` falls back to `name`.
///
/// Word lists live next to the pack's images:
///
///   `<name>/units.json`          (standard)
///   `Events/<name>/units.json`   (event)
///
/// each a JSON array of raw answers, one per level. Word lists are
/// fetched on first use and cached for the life of the catalog.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::domain::pack::{Category, Pack};
use crate::error::{GameError, GameResult};

pub const PACKS_PATH: &str = "packs.json";
pub const EVENTS_PATH: &str = "events.json";

// ══════════════════════════════════════════════════════════════
// Data sources
// ══════════════════════════════════════════════════════════════

/// Where catalog documents come from. Paths are `/`-separated and relative.
pub trait DataSource {
    fn fetch(&self, path: &str) -> GameResult<String>;
}

/// Reads documents from a directory on disk.
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsSource { root: root.into() }
    }
}

impl DataSource for FsSource {
    fn fetch(&self, path: &str) -> GameResult<String> {
        let full = path.split('/').fold(self.root.clone(), |acc, seg| acc.join(seg));
        Ok(std::fs::read_to_string(full)?)
    }
}

// ══════════════════════════════════════════════════════════════
// Catalog
// ══════════════════════════════════════════════════════════════

#[derive(Deserialize, Debug)]
struct PackRecord {
    name: String,
    #[serde(default)]
    id: Option<String>,
    lvls: usize,
    #[serde(default)]
    star: Option<u32>,
    #[serde(default)]
    is_star: bool,
    #[serde(default)]
    cover: Option<usize>,
    #[serde(default)]
    description: Option<String>,
}

pub struct Catalog {
    packs: Vec<Pack>,
    events: Vec<Pack>,
    source: Box<dyn DataSource>,
    words: HashMap<String, Vec<String>>,
}

impl Catalog {
    /// Fetch and validate both metadata documents.
    pub fn load(source: Box<dyn DataSource>) -> GameResult<Self> {
        let packs = load_sequence(source.as_ref(), PACKS_PATH, Category::Standard)?;
        let events = load_sequence(source.as_ref(), EVENTS_PATH, Category::Event)?;
        info!(packs = packs.len(), events = events.len(), "catalog loaded");
        Ok(Catalog { packs, events, source, words: HashMap::new() })
    }

    pub fn packs(&self) -> &[Pack] {
        &self.packs
    }

    pub fn events(&self) -> &[Pack] {
        &self.events
    }

    /// Standard packs followed by events, in document order.
    pub fn all(&self) -> impl Iterator<Item = &Pack> {
        self.packs().iter().chain(self.events())
    }

    /// Look up by id: packs first, then events.
    pub fn resolve(&self, id: &str) -> Option<&Pack> {
        self.all().find(|p| p.id == id)
    }

    /// Word list of `pack_id`, fetched once and cached.
    ///
    /// Never fails: an unknown pack or a broken list is logged and yields
    /// an empty slice. Failures are not cached, so a later call retries.
    pub fn load_words(&mut self, pack_id: &str) -> &[String] {
        if !self.words.contains_key(pack_id) {
            match self.fetch_words(pack_id) {
                Ok(list) => {
                    self.words.insert(pack_id.to_string(), list);
                }
                Err(e) => {
                    warn!(pack = pack_id, "word list unavailable: {e}");
                    return &[];
                }
            }
        }
        self.words.get(pack_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Raw answer for one level.
    pub fn word_for(&mut self, pack_id: &str, level: usize) -> GameResult<String> {
        self.load_words(pack_id)
            .get(level)
            .filter(|w| !w.trim().is_empty())
            .cloned()
            .ok_or_else(|| {
                GameError::InvalidLevelData(format!("{} has no answer for level {}", pack_id, level + 1))
            })
    }

    fn fetch_words(&self, pack_id: &str) -> GameResult<Vec<String>> {
        let pack = self
            .resolve(pack_id)
            .ok_or_else(|| GameError::DataUnavailable(format!("unknown pack {pack_id}")))?;
        let path = pack.words_path();
        let text = self.source.fetch(&path)?;
        let list: Vec<String> = serde_json::from_str(&text)?;
        if list.len() != pack.lvls {
            warn!(pack = pack_id, words = list.len(), lvls = pack.lvls, "word list length mismatch");
        }
        debug!(pack = pack_id, %path, words = list.len(), "word list fetched");
        Ok(list)
    }
}

/// Fetch one metadata document and turn it into packs.
fn load_sequence(source: &dyn DataSource, path: &str, category: Category) -> GameResult<Vec<Pack>> {
    let text = source
        .fetch(path)
        .map_err(|e| GameError::DataUnavailable(format!("{path}: {e}")))?;
    parse_sequence(&text, category).map_err(|e| match e {
        GameError::DataUnavailable(msg) => GameError::DataUnavailable(format!("{path}: {msg}")),
        other => GameError::DataUnavailable(format!("{path}: {other}")),
    })
}

fn parse_sequence(text: &str, category: Category) -> GameResult<Vec<Pack>> {
    let records: Vec<PackRecord> = serde_json::from_str(text)?;
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(records.len());

    for (index, rec) in records.into_iter().enumerate() {
        let id = rec.id.unwrap_or_else(|| rec.name.clone());
        if !seen.insert(id.clone()) {
            return Err(GameError::DataUnavailable(format!("duplicate pack id {id:?}")));
        }
        if rec.lvls == 0 {
            return Err(GameError::DataUnavailable(format!("pack {id:?} has no levels")));
        }
        out.push(Pack {
            id,
            name: rec.name,
            description: rec.description,
            cover: rec.cover.unwrap_or(index),
            lvls: rec.lvls,
            star: rec.star,
            is_star_eligible: rec.is_star,
            category,
        });
    }
    Ok(out)
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
