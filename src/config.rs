/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config.toml";

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub economy: EconomyConfig,
    pub gamepad: GamepadConfig,
    pub data_dir: PathBuf,
    pub save_dir: Option<PathBuf>,
    pub log_file: PathBuf,
    pub log_level: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EconomyConfig {
    pub starting_coins: u32,
    pub win_reward: u32,
    pub hint_cost: u32,
    pub skip_cost: u32,
    /// Does completing a level via skip earn its first-completion star?
    pub skip_awards_star: bool,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        EconomyConfig {
            starting_coins: default_starting_coins(),
            win_reward: default_win_reward(),
            hint_cost: default_hint_cost(),
            skip_cost: default_skip_cost(),
            skip_awards_star: default_skip_awards_star(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub hint: Vec<String>,
    pub skip: Vec<String>,
    pub reset: Vec<String>,
    pub erase: Vec<String>,
}

impl Default for GamepadConfig {
    fn default() -> Self {
        GamepadConfig {
            confirm: default_confirm(),
            cancel: default_cancel(),
            hint: default_hint(),
            skip: default_skip(),
            reset: default_reset(),
            erase: default_erase(),
        }
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    economy: TomlEconomy,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlEconomy {
    #[serde(default = "default_starting_coins")]
    starting_coins: u32,
    #[serde(default = "default_win_reward")]
    win_reward: u32,
    #[serde(default = "default_hint_cost")]
    hint_cost: u32,
    #[serde(default = "default_skip_cost")]
    skip_cost: u32,
    #[serde(default = "default_skip_awards_star")]
    skip_awards_star: bool,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
    #[serde(default = "default_hint")]
    hint: Vec<String>,
    #[serde(default = "default_skip")]
    skip: Vec<String>,
    #[serde(default = "default_reset")]
    reset: Vec<String>,
    #[serde(default = "default_erase")]
    erase: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_data_dir")]
    data_dir: String,
    #[serde(default)]
    save_dir: Option<String>,
    #[serde(default = "default_log_file")]
    log_file: String,
    #[serde(default = "default_log_level")]
    log_level: String,
}

// ── Defaults ──

fn default_starting_coins() -> u32 { 100 }
fn default_win_reward() -> u32 { 10 }
fn default_hint_cost() -> u32 { 20 }
fn default_skip_cost() -> u32 { 50 }
fn default_skip_awards_star() -> bool { true }

fn default_confirm() -> Vec<String> { vec!["A".into(), "Start".into()] }
fn default_cancel() -> Vec<String> { vec!["B".into(), "Select".into()] }
fn default_hint() -> Vec<String> { vec!["Y".into()] }
fn default_skip() -> Vec<String> { vec!["R1".into()] }
fn default_reset() -> Vec<String> { vec!["L1".into()] }
fn default_erase() -> Vec<String> { vec!["X".into()] }

fn default_data_dir() -> String { "data".into() }
fn default_log_file() -> String { "marquee.log".into() }
fn default_log_level() -> String { "info".into() }

impl Default for TomlEconomy {
    fn default() -> Self {
        TomlEconomy {
            starting_coins: default_starting_coins(),
            win_reward: default_win_reward(),
            hint_cost: default_hint_cost(),
            skip_cost: default_skip_cost(),
            skip_awards_star: default_skip_awards_star(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            confirm: default_confirm(),
            cancel: default_cancel(),
            hint: default_hint(),
            skip: default_skip(),
            reset: default_reset(),
            erase: default_erase(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            data_dir: default_data_dir(),
            save_dir: None,
            log_file: default_log_file(),
            log_level: default_log_level(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        Self::from_toml(toml_cfg, &search_dirs)
    }

    fn from_toml(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let general = toml_cfg.general;
        let data_dir = resolve_in(&general.data_dir, search_dirs, |p| p.is_dir());
        let log_file = resolve_in(&general.log_file, search_dirs, |p| {
            p.is_file() || p.parent().is_some_and(is_writable_dir)
        });

        GameConfig {
            economy: EconomyConfig {
                starting_coins: toml_cfg.economy.starting_coins,
                win_reward: toml_cfg.economy.win_reward,
                hint_cost: toml_cfg.economy.hint_cost,
                skip_cost: toml_cfg.economy.skip_cost,
                skip_awards_star: toml_cfg.economy.skip_awards_star,
            },
            gamepad: GamepadConfig {
                confirm: toml_cfg.gamepad.confirm,
                cancel: toml_cfg.gamepad.cancel,
                hint: toml_cfg.gamepad.hint,
                skip: toml_cfg.gamepad.skip,
                reset: toml_cfg.gamepad.reset,
                erase: toml_cfg.gamepad.erase,
            },
            data_dir,
            save_dir: general.save_dir.map(PathBuf::from),
            log_file,
            log_level: general.log_level,
        }
    }
}

/// Directories searched for `config.toml` and relative paths, in priority order:
/// the executable's directory, the CWD, then the installed data dirs that exist.
fn candidate_dirs() -> Vec<PathBuf> {
    let exe_dir = std::env::current_exe()
        .ok()
        .map(|exe| exe.canonicalize().unwrap_or(exe))
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    let installed = [
        std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".local/share/marquee")),
        Some(PathBuf::from("/usr/share/marquee")),
    ];

    let mut dirs: Vec<PathBuf> = Vec::new();
    let found = [exe_dir, std::env::current_dir().ok()]
        .into_iter()
        .flatten()
        .chain(installed.into_iter().flatten().filter(|d| d.is_dir()));
    for dir in found {
        if !dirs.contains(&dir) {
            dirs.push(dir);
        }
    }
    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }
    dirs
}

/// Absolute paths are taken as given. A relative one is joined to each
/// search dir in turn and the first candidate `accept` likes wins, else it
/// stays relative to the CWD.
fn resolve_in(raw: &str, search_dirs: &[PathBuf], accept: impl Fn(&Path) -> bool) -> PathBuf {
    let path = PathBuf::from(raw);
    if path.is_absolute() {
        return path;
    }
    search_dirs
        .iter()
        .map(|dir| dir.join(&path))
        .find(|candidate| accept(candidate))
        .unwrap_or(path)
}

fn is_writable_dir(dir: &Path) -> bool {
    std::fs::metadata(dir).is_ok_and(|m| m.is_dir() && !m.permissions().readonly())
}

/// First `config.toml` found wins; an unreadable or malformed one means defaults.
///
/// Runs before the log subscriber exists, so problems go to stderr.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    let path = match search_dirs.iter().map(|d| d.join(CONFIG_FILE)).find(|p| p.is_file()) {
        Some(p) => p,
        None => return TomlConfig::default(),
    };
    let parsed = std::fs::read_to_string(&path)
        .map_err(|e| e.to_string())
        .and_then(|text| toml::from_str::<TomlConfig>(&text).map_err(|e| e.to_string()));
    parsed.unwrap_or_else(|e| {
        eprintln!("Warning: ignoring {}: {e}", path.display());
        TomlConfig::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> GameConfig {
        let cfg: TomlConfig = toml::from_str(text).unwrap();
        GameConfig::from_toml(cfg, &[])
    }

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = parse("");
        assert_eq!(cfg.economy, EconomyConfig::default());
        assert_eq!(cfg.economy.starting_coins, 100);
        assert_eq!(cfg.economy.hint_cost, 20);
        assert_eq!(cfg.economy.skip_cost, 50);
        assert_eq!(cfg.economy.win_reward, 10);
        assert_eq!(cfg.data_dir, PathBuf::from("data"));
        assert_eq!(cfg.save_dir, None);
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = parse(
            r#"
            [economy]
            hint_cost = 5
            skip_awards_star = false

            [general]
            save_dir = "/tmp/marquee"
            "#,
        );
        assert_eq!(cfg.economy.hint_cost, 5);
        assert!(!cfg.economy.skip_awards_star);
        assert_eq!(cfg.economy.skip_cost, 50);
        assert_eq!(cfg.save_dir, Some(PathBuf::from("/tmp/marquee")));
        assert_eq!(cfg.gamepad.hint, vec!["Y".to_string()]);
    }

    #[test]
    fn absolute_data_dir_is_used_verbatim() {
        let cfg = parse("[general]\ndata_dir = \"/srv/marquee/data\"\n");
        assert_eq!(cfg.data_dir, PathBuf::from("/srv/marquee/data"));
    }

    #[test]
    fn relative_data_dir_resolves_against_search_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir(tmp.path().join("data")).unwrap();
        let cfg: TomlConfig = toml::from_str("").unwrap();
        let cfg = GameConfig::from_toml(cfg, &[tmp.path().to_path_buf()]);
        assert_eq!(cfg.data_dir, tmp.path().join("data"));
    }

    #[test]
    fn log_file_lands_in_first_writable_search_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg: TomlConfig = toml::from_str("").unwrap();
        let cfg = GameConfig::from_toml(cfg, &[tmp.path().join("missing"), tmp.path().to_path_buf()]);
        assert_eq!(cfg.log_file, tmp.path().join("marquee.log"));

        let cfg = parse("[general]\nlog_file = \"/var/log/marquee.log\"\n");
        assert_eq!(cfg.log_file, PathBuf::from("/var/log/marquee.log"));
    }

    #[test]
    fn config_file_is_read_from_search_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = [tmp.path().to_path_buf()];
        assert_eq!(load_toml(&dirs).economy.hint_cost, 20);

        std::fs::write(tmp.path().join(CONFIG_FILE), "[economy]\nhint_cost = 7\n").unwrap();
        assert_eq!(load_toml(&dirs).economy.hint_cost, 7);

        std::fs::write(tmp.path().join(CONFIG_FILE), "[economy\nhint_cost = ").unwrap();
        assert_eq!(load_toml(&dirs).economy.hint_cost, 20);
    }
}
