/// Persistent progress: coins, stars, unlock frontier, completed levels.
///
/// ## Storage
///
/// Four keys in a key-value backend:
///
///   coins=<u32>
///   stars=<u32>
///   unlocked={"Classic":2,...}        JSON object, pack id → frontier
///   completed={"Classic":[0,1],...}   JSON object, pack id → level list
///
/// Read once at startup; written after every mutation. The file backend
/// stores one `key=value` line per key in `progress.dat`.
///
/// ## Transactions
///
/// `ProgressStore::update` mutates a copy of the record, persists it, and
/// only then swaps it in. A failed write leaves the in-memory record as it
/// was, so callers never see a state that is not on disk.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::GameResult;

pub const KEY_COINS: &str = "coins";
pub const KEY_STARS: &str = "stars";
pub const KEY_UNLOCKED: &str = "unlocked";
pub const KEY_COMPLETED: &str = "completed";

const SAVE_FILE: &str = "progress.dat";

// ══════════════════════════════════════════════════════════════
// Record
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgressRecord {
    pub coins: u32,
    pub stars: u32,
    /// Highest level index the player may enter, per pack.
    pub unlocked: BTreeMap<String, usize>,
    pub completed: BTreeMap<String, BTreeSet<usize>>,
}

impl ProgressRecord {
    pub fn fresh(starting_coins: u32) -> Self {
        ProgressRecord {
            coins: starting_coins,
            stars: 0,
            unlocked: BTreeMap::new(),
            completed: BTreeMap::new(),
        }
    }

    /// Unlock frontier for `pack`. Unknown packs start at level 0.
    pub fn frontier(&self, pack: &str) -> usize {
        self.unlocked.get(pack).copied().unwrap_or(0)
    }

    pub fn is_completed(&self, pack: &str, level: usize) -> bool {
        self.completed.get(pack).map_or(false, |set| set.contains(&level))
    }

    pub fn completed_count(&self, pack: &str) -> usize {
        self.completed.get(pack).map_or(0, BTreeSet::len)
    }
}

// ══════════════════════════════════════════════════════════════
// Backends
// ══════════════════════════════════════════════════════════════

/// Durable string key-value storage.
pub trait KvStore {
    fn get(&self, key: &str) -> Option<String>;

    /// Write every entry as one unit.
    fn put_all(&mut self, entries: &[(&str, String)]) -> GameResult<()>;
}

/// `key=value` lines in a single file, replaced via rename on every write.
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open `path`, reading existing entries. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> GameResult<Self> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => parse_lines(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), keys = entries.len(), "opened progress file");
        Ok(FileStore { path, entries })
    }

    /// Default location: `save_dir()/progress.dat`.
    pub fn open_default(override_dir: Option<&Path>) -> GameResult<Self> {
        let dir = match override_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                dir.to_path_buf()
            }
            None => save_dir(),
        };
        Self::open(dir.join(SAVE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn put_all(&mut self, entries: &[(&str, String)]) -> GameResult<()> {
        let mut next = self.entries.clone();
        for (key, value) in entries {
            next.insert((*key).to_string(), value.clone());
        }

        let mut out = String::with_capacity(256);
        for (key, value) in &next {
            out.push_str(&format!("{}={}\n", key, value));
        }

        let tmp = self.path.with_extension("dat.tmp");
        std::fs::write(&tmp, out)?;
        std::fs::rename(&tmp, &self.path)?;
        self.entries = next;
        Ok(())
    }
}

fn parse_lines(content: &str) -> BTreeMap<String, String> {
    content
        .lines()
        .filter_map(|line| line.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect()
}

/// In-memory backend for tests. Counts writes and can be told to fail.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
    pub entries: BTreeMap<String, String>,
    pub writes: std::rc::Rc<std::cell::Cell<usize>>,
    /// Shared so a test can break the disk after handing the store over.
    pub fail_writes: std::rc::Rc<std::cell::Cell<bool>>,
}

#[cfg(test)]
impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn put_all(&mut self, entries: &[(&str, String)]) -> GameResult<()> {
        if self.fail_writes.get() {
            return Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full").into());
        }
        for (key, value) in entries {
            self.entries.insert((*key).to_string(), value.clone());
        }
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

// ══════════════════════════════════════════════════════════════
// Store
// ══════════════════════════════════════════════════════════════

pub struct ProgressStore {
    record: ProgressRecord,
    backend: Box<dyn KvStore>,
}

impl ProgressStore {
    /// Read the four keys, falling back to first-run defaults for anything
    /// missing or unreadable, and give every known pack a frontier entry.
    pub fn open<'a>(
        backend: Box<dyn KvStore>,
        starting_coins: u32,
        known_packs: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let mut record = ProgressRecord::fresh(starting_coins);
        let mut dirty = false;

        match read_key::<u32>(backend.as_ref(), KEY_COINS) {
            Some(v) => record.coins = v,
            None => dirty = true,
        }
        match read_key::<u32>(backend.as_ref(), KEY_STARS) {
            Some(v) => record.stars = v,
            None => dirty = true,
        }
        match read_json(backend.as_ref(), KEY_UNLOCKED) {
            Some(v) => record.unlocked = v,
            None => dirty = true,
        }
        match read_json(backend.as_ref(), KEY_COMPLETED) {
            Some(v) => record.completed = v,
            None => dirty = true,
        }

        for pack in known_packs {
            if !record.unlocked.contains_key(pack) {
                record.unlocked.insert(pack.to_string(), 0);
                dirty = true;
            }
        }

        let mut store = ProgressStore { record, backend };
        if dirty {
            info!("initializing progress with defaults");
            if let Err(e) = persist(store.backend.as_mut(), &store.record) {
                warn!("could not write initial progress: {e}");
            }
        }
        store
    }

    pub fn record(&self) -> &ProgressRecord {
        &self.record
    }

    /// Apply `f` as one transaction: on any error nothing changes.
    pub fn update<T>(
        &mut self,
        f: impl FnOnce(&mut ProgressRecord) -> GameResult<T>,
    ) -> GameResult<T> {
        let mut next = self.record.clone();
        let out = f(&mut next)?;
        persist(self.backend.as_mut(), &next)?;
        self.record = next;
        Ok(out)
    }
}

fn persist(backend: &mut dyn KvStore, record: &ProgressRecord) -> GameResult<()> {
    let entries = [
        (KEY_COINS, record.coins.to_string()),
        (KEY_STARS, record.stars.to_string()),
        (KEY_UNLOCKED, serde_json::to_string(&record.unlocked)?),
        (KEY_COMPLETED, serde_json::to_string(&record.completed)?),
    ];
    backend.put_all(&entries)
}

fn read_key<T: std::str::FromStr>(backend: &dyn KvStore, key: &str) -> Option<T> {
    let raw = backend.get(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key, value = %raw, "unreadable progress value, using default");
            None
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(backend: &dyn KvStore, key: &str) -> Option<T> {
    let raw = backend.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(key, "unreadable progress value ({e}), using default");
            None
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Paths
// ══════════════════════════════════════════════════════════════

fn save_dir() -> PathBuf {
    // 1. Try exe directory (works for local/portable installs)
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            // Check if writable (system installs like /usr/games/ won't be)
            let test_path = parent.join(".write_test_marquee");
            if std::fs::write(&test_path, "").is_ok() {
                let _ = std::fs::remove_file(&test_path);
                return parent.to_path_buf();
            }
        }
    }

    // 2. XDG data home (~/.local/share/marquee) for system installs
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/marquee");
        if std::fs::create_dir_all(&xdg).is_ok() {
            return xdg;
        }
    }

    // 3. Fallback to CWD
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GameError;

    fn memory() -> Box<MemoryStore> {
        Box::new(MemoryStore::default())
    }

    #[test]
    fn first_run_uses_defaults_and_persists_them() {
        let backend = memory();
        let writes = backend.writes.clone();
        let store = ProgressStore::open(backend, 100, ["Classic", "Noir"]);

        let r = store.record();
        assert_eq!(r.coins, 100);
        assert_eq!(r.stars, 0);
        assert_eq!(r.frontier("Classic"), 0);
        assert_eq!(r.unlocked.len(), 2);
        assert!(r.completed.is_empty());
        assert_eq!(writes.get(), 1);
    }

    #[test]
    fn existing_values_are_read_back() {
        let mut backend = memory();
        backend.entries.insert(KEY_COINS.into(), "35".into());
        backend.entries.insert(KEY_STARS.into(), "2".into());
        backend.entries.insert(KEY_UNLOCKED.into(), r#"{"Classic":2}"#.into());
        backend.entries.insert(KEY_COMPLETED.into(), r#"{"Classic":[0,1]}"#.into());
        let writes = backend.writes.clone();

        let store = ProgressStore::open(backend, 100, ["Classic"]);
        let r = store.record();
        assert_eq!(r.coins, 35);
        assert_eq!(r.stars, 2);
        assert_eq!(r.frontier("Classic"), 2);
        assert!(r.is_completed("Classic", 1));
        assert!(!r.is_completed("Classic", 2));
        assert_eq!(r.completed_count("Classic"), 2);
        // nothing missing, nothing written
        assert_eq!(writes.get(), 0);
    }

    #[test]
    fn corrupt_values_fall_back_to_defaults() {
        let mut backend = memory();
        backend.entries.insert(KEY_COINS.into(), "lots".into());
        backend.entries.insert(KEY_UNLOCKED.into(), "{not json".into());
        let store = ProgressStore::open(backend, 100, ["Classic"]);
        assert_eq!(store.record().coins, 100);
        assert_eq!(store.record().frontier("Classic"), 0);
    }

    #[test]
    fn update_commits_and_persists() {
        let backend = memory();
        let writes = backend.writes.clone();
        let mut store = ProgressStore::open(backend, 100, ["Classic"]);

        store.update(|r| { r.coins += 5; Ok(()) }).unwrap();
        assert_eq!(store.record().coins, 105);
        assert_eq!(writes.get(), 2);
    }

    #[test]
    fn failed_closure_leaves_record_unchanged() {
        let mut store = ProgressStore::open(memory(), 100, ["Classic"]);
        let res: GameResult<()> = store.update(|r| {
            r.coins = 0;
            Err(GameError::InsufficientFunds { needed: 1, available: 0 })
        });
        assert!(res.is_err());
        assert_eq!(store.record().coins, 100);
    }

    #[test]
    fn failed_write_leaves_record_unchanged() {
        let mut backend = memory();
        backend.fail_writes.set(true);
        let mut store = ProgressStore::open(backend, 100, ["Classic"]);
        let res = store.update(|r| { r.stars += 1; Ok(()) });
        assert!(matches!(res, Err(GameError::Io(_))));
        assert_eq!(store.record().stars, 0);
    }

    #[test]
    fn file_store_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SAVE_FILE);

        {
            let backend = FileStore::open(&path).unwrap();
            let mut store = ProgressStore::open(Box::new(backend), 100, ["Classic"]);
            store.update(|r| {
                r.coins = 42;
                r.unlocked.insert("Classic".into(), 1);
                r.completed.entry("Classic".into()).or_default().insert(0);
                Ok(())
            }).unwrap();
        }

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("coins=42\n"));
        assert!(text.contains(r#"completed={"Classic":[0]}"#));

        let backend = FileStore::open(&path).unwrap();
        let store = ProgressStore::open(Box::new(backend), 100, ["Classic"]);
        assert_eq!(store.record().coins, 42);
        assert_eq!(store.record().frontier("Classic"), 1);
        assert!(store.record().is_completed("Classic", 0));
    }

    #[test]
    fn file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("nope.dat")).unwrap();
        assert_eq!(store.get(KEY_COINS), None);
    }

    #[test]
    fn open_default_creates_override_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("saves/marquee");
        let store = FileStore::open_default(Some(nested.as_path())).unwrap();
        assert!(nested.is_dir());
        assert_eq!(store.path(), nested.join(SAVE_FILE));
    }
}
