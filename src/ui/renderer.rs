/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into the `front` buffer (grid of Cell)
///   2. Compare each cell with the `back` buffer (previous frame)
///   3. Emit terminal commands only for cells that changed
///   4. Batch everything with `queue!`, flush once
///   5. Swap front/back
///
/// While composing, every clickable thing (pool tile, filled slot, pack
/// row, level cell) is recorded as a hit region so mouse clicks can be
/// mapped back to what was drawn there.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::config::EconomyConfig;
use crate::domain::letter::PoolId;
use crate::domain::pack::{Category, Pack};
use crate::sim::router::InputRouter;
use crate::sim::save::ProgressRecord;
use crate::sim::world::{Screen, Session, View};

// ── Palette ──

const BASE_BG: Color = Color::Rgb { r: 18, g: 16, b: 28 };
const GOLD: Color = Color::Rgb { r: 255, g: 200, b: 50 };
const HI: Color = Color::Rgb { r: 80, g: 255, b: 80 };
const CYAN: Color = Color::Rgb { r: 100, g: 200, b: 255 };
const RED: Color = Color::Rgb { r: 255, g: 80, b: 80 };
const DIM: Color = Color::DarkGrey;
const CURSOR_BG: Color = Color::Rgb { r: 30, g: 60, b: 30 };
const TILE_BG: Color = Color::Rgb { r: 120, g: 90, b: 20 };
const SLOT_BG: Color = Color::Rgb { r: 30, g: 50, b: 90 };
const EMPTY_BG: Color = Color::Rgb { r: 40, g: 40, b: 50 };
const WIN_BG: Color = Color::Rgb { r: 20, g: 110, b: 40 };
const WRONG_BG: Color = Color::Rgb { r: 130, g: 30, b: 30 };

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: BASE_BG };

    /// Differs from every real cell; forces a full repaint.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = if bg == Color::Reset { BASE_BG } else { bg };
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write `s` at (x, y), one column per char, clipped at the right edge.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn fill(&mut self, x: usize, y: usize, w: usize, bg: Color) {
        for cx in x..(x + w).min(self.width) {
            self.set(cx, y, Cell::new(' ', Color::White, bg));
        }
    }
}

// ── Hit regions ──

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HitTarget {
    Tile(PoolId),
    Slot(usize),
    Pack(usize),
    Level(usize),
}

#[derive(Clone, Copy, Debug)]
struct Hit {
    x: usize,
    y: usize,
    w: usize,
    target: HitTarget,
}

// ── Layout ──

/// Columns taken by one letter tile, gap included.
const TILE_W: usize = 4;
/// Columns taken by one level cell in the level grid.
const LEVEL_W: usize = 6;
const LEFT: usize = 4;

/// Tile origins for `n` tiles starting at `x0`, wrapping at `max_w`.
/// Returned as (column, row offset).
fn tile_positions(n: usize, x0: usize, max_w: usize) -> Vec<(usize, usize)> {
    let per_row = (max_w.saturating_sub(x0) / TILE_W).max(1);
    (0..n).map(|i| (x0 + (i % per_row) * TILE_W, i / per_row)).collect()
}

/// Level cells per row for a terminal `term_w` columns wide.
pub fn level_columns(term_w: usize) -> usize {
    (term_w.saturating_sub(LEFT * 2) / LEVEL_W).clamp(1, 10)
}

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_screen: Option<&'static str>,
    hits: Vec<Hit>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_screen: None,
            hits: Vec::new(),
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide,
            SetBackgroundColor(BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.resize(tw as usize, th as usize);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            DisableMouseCapture,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    fn resize(&mut self, w: usize, h: usize) {
        self.term_w = w;
        self.term_h = h;
        self.front.resize(w, h);
        self.back.resize(w, h);
        self.back.cells.fill(Cell::INVALID);
    }

    pub fn level_columns(&self) -> usize {
        level_columns(self.term_w)
    }

    /// What was drawn at (col, row) in the last frame, if clickable.
    pub fn hit_test(&self, col: u16, row: u16) -> Option<HitTarget> {
        let (x, y) = (col as usize, row as usize);
        self.hits
            .iter()
            .find(|h| h.y == y && x >= h.x && x < h.x + h.w)
            .map(|h| h.target)
    }

    pub fn render(&mut self, router: &InputRouter) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.resize(tw as usize, th as usize);
            queue!(self.writer, SetBackgroundColor(BASE_BG), Clear(ClearType::All))?;
        }

        // Screen change → full repaint for a clean transition
        let name = router.screen().name();
        if self.last_screen != Some(name) {
            self.back.cells.fill(Cell::INVALID);
            self.last_screen = Some(name);
        }

        self.compose(router);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose(&mut self, router: &InputRouter) {
        self.front.clear();
        self.hits.clear();

        let view = &router.view;
        let record = router.record();
        let catalog = router.catalog();
        let find = |id: &str| catalog.and_then(|c| c.resolve(id));

        match router.screen() {
            Screen::Title => self.compose_title(record),
            Screen::Packs => {
                let packs: Vec<&Pack> = catalog.map(|c| c.all().collect()).unwrap_or_default();
                self.compose_packs(&packs, record, view);
            }
            Screen::Levels { pack } => {
                if let Some(p) = find(pack.as_str()) {
                    self.compose_levels(p, record, view);
                }
            }
            Screen::Puzzle(session) => {
                let economy = router.progression().economy();
                self.compose_puzzle(session, find(session.pack.as_str()), record, view, economy);
            }
            Screen::Reveal { pack, level, answer, image } => {
                let title = find(pack.as_str()).map_or(pack.as_str(), |p| p.name.as_str());
                self.compose_reveal(title, *level, answer, image);
            }
            Screen::Degraded { reason } => self.compose_degraded(reason),
        }

        self.compose_message(view);
    }

    fn compose_wallet(&mut self, record: &ProgressRecord, row: usize) {
        let wallet = format!(" ◉ {}   ★ {} ", record.coins, record.stars);
        let x = self.front.width.saturating_sub(wallet.chars().count() + 1);
        self.front.put_str(x, row, &wallet, GOLD, Color::Reset);
    }

    fn compose_header(&mut self, title: &str, row: usize) {
        let inner = 46;
        let bar: String = "═".repeat(inner);
        self.front.put_str(2, row, &format!("╔{}╗", bar), GOLD, Color::Reset);
        self.front.put_str(2, row + 1, &format!("║ {:<w$}║", title, w = inner - 1), GOLD, Color::Reset);
        self.front.put_str(2, row + 2, &format!("╚{}╝", bar), GOLD, Color::Reset);
    }

    fn compose_title(&mut self, record: &ProgressRecord) {
        let banner = [
            r" __  __    _    ____   ___  _   _ _____ _____ ",
            r"|  \/  |  / \  |  _ \ / _ \| | | | ____| ____|",
            r"| |\/| | / _ \ | |_) | | | | | | |  _| |  _|  ",
            r"| |  | |/ ___ \|  _ <| |_| | |_| | |___| |___ ",
            r"|_|  |_/_/   \_\_| \_\\__\_\\___/|_____|_____|",
        ];
        for (i, line) in banner.iter().enumerate() {
            self.front.put_str(4, 2 + i, line, GOLD, Color::Reset);
        }

        let subtitle = "◆◆  Reel Scramble  ◆◆";
        let sx = 4 + banner[0].len().saturating_sub(subtitle.chars().count()) / 2;
        self.front.put_str(sx, 8, subtitle, CYAN, Color::Reset);

        let menu = 11;
        self.front.put_str(8, menu, "ENTER   Play", HI, Color::Reset);
        self.front.put_str(8, menu + 1, "  Q     Quit", Color::White, Color::Reset);

        let wallet = format!("◉ {} coins    ★ {} stars", record.coins, record.stars);
        self.front.put_str(8, menu + 3, &wallet, GOLD, Color::Reset);

        let help = [
            "How to play",
            "  Unscramble the movie title: type its letters, or pick",
            "  tiles with ←→ and ENTER. Click tiles and slots with the mouse.",
            "  BKSP Erase   F2 Shuffle   F3 Hint   F4 Skip   ESC Back",
        ];
        for (i, line) in help.iter().enumerate() {
            let color = if i == 0 { GOLD } else { Color::White };
            self.front.put_str(8, menu + 5 + i, line, color, Color::Reset);
        }
    }

    fn compose_packs(&mut self, packs: &[&Pack], record: &ProgressRecord, view: &View) {
        self.compose_header("PACKS", 1);
        self.compose_wallet(record, 0);

        let list_top = 5;
        let visible = self.front.height.saturating_sub(list_top + 4).max(1);
        let scroll = view.pack_cursor.saturating_sub(visible - 1);

        for (row, (idx, pack)) in packs.iter().enumerate().skip(scroll).take(visible).enumerate() {
            let y = list_top + row;
            let selected = idx == view.pack_cursor;
            let open = pack.gate_open(record.stars);
            let bg = if selected { CURSOR_BG } else { Color::Reset };
            if selected {
                self.front.fill(2, y, 62, CURSOR_BG);
                self.front.put_str(2, y, "▸", HI, bg);
            }

            let tag = if pack.category == Category::Event { "EVENT" } else { "" };
            let name_fg = if !open { DIM } else if selected { HI } else { Color::White };
            self.front.put_str(4, y, &format!("{:<26.26}", pack.name), name_fg, bg);
            self.front.put_str(31, y, tag, CYAN, bg);

            let status = if open {
                format!("{:>3}/{:<3} solved", record.completed_count(&pack.id), pack.lvls)
            } else {
                format!("★ {} to unlock", pack.star.unwrap_or(0))
            };
            let status_fg = if open { Color::White } else { RED };
            self.front.put_str(38, y, &status, status_fg, bg);

            self.hits.push(Hit { x: 2, y, w: 62, target: HitTarget::Pack(idx) });
        }

        let footer = list_top + visible + 1;
        self.front.put_str(2, footer, "  ENTER Open   ↑↓ Browse   ESC Back", DIM, Color::Reset);

        if let Some(pack) = packs.get(view.pack_cursor) {
            if let Some(desc) = pack.description.as_deref() {
                self.front.put_str(4, footer + 1, desc, CYAN, Color::Reset);
            }
            let cover = format!("▣ cover: {}", pack.image_path(pack.cover));
            self.front.put_str(4, footer + 2, &cover, DIM, Color::Reset);
        }
    }

    fn compose_levels(&mut self, pack: &Pack, record: &ProgressRecord, view: &View) {
        self.compose_header(&pack.name, 1);
        self.compose_wallet(record, 0);
        let solved = record.completed_count(&pack.id);
        self.front.put_str(4, 4, &format!("{}/{} solved", solved, pack.lvls), DIM, Color::Reset);

        let cols = level_columns(self.front.width);
        let grid_top = 6;
        let rows_visible = self.front.height.saturating_sub(grid_top + 4).max(1);
        let cursor_row = view.level_cursor / cols;
        let first_row = cursor_row.saturating_sub(rows_visible - 1);
        let frontier = record.frontier(&pack.id);

        for level in 0..pack.lvls {
            let grid_row = level / cols;
            if grid_row < first_row || grid_row >= first_row + rows_visible {
                continue;
            }
            let x = LEFT + (level % cols) * LEVEL_W;
            let y = grid_top + grid_row - first_row;

            let (mark, fg) = if record.is_completed(&pack.id, level) {
                ('✓', HI)
            } else if level <= frontier {
                ('▸', GOLD)
            } else {
                ('·', DIM)
            };
            let bg = if level == view.level_cursor { CURSOR_BG } else { Color::Reset };
            self.front.put_str(x, y, &format!("{:>3}{} ", level + 1, mark), fg, bg);
            self.hits.push(Hit { x, y, w: LEVEL_W - 1, target: HitTarget::Level(level) });
        }

        let footer = grid_top + rows_visible + 1;
        self.front.put_str(
            2,
            footer,
            "  ENTER Play (✓ shows the answer)   ←→↑↓ Move   ESC Back",
            DIM,
            Color::Reset,
        );
    }

    fn compose_puzzle(
        &mut self,
        s: &Session,
        pack: Option<&Pack>,
        record: &ProgressRecord,
        view: &View,
        economy: &EconomyConfig,
    ) {
        let a = &s.attempt;
        let width = self.front.width;

        // HUD
        let name = pack.map_or(s.pack.as_str(), |p| p.name.as_str());
        let total = pack.map_or(0, |p| p.lvls);
        self.front.put_str(1, 0, &format!(" {} · Level {}/{} ", name, s.level + 1, total), GOLD, Color::Reset);
        self.compose_wallet(record, 0);

        if let Some(p) = pack {
            let still = format!("▣ still: {}", p.image_path(s.level));
            self.front.put_str(LEFT, 2, &still, DIM, Color::Reset);
        }

        // Slots
        let slot_top = 4;
        let slot_pos = tile_positions(a.slots().len(), LEFT, width);
        let slot_rows = slot_pos.last().map_or(1, |&(_, r)| r + 1);
        let letters = a.slot_letters();
        for (i, &(x, dy)) in slot_pos.iter().enumerate() {
            let y = slot_top + dy;
            match letters[i] {
                Some(ch) => {
                    let bg = if a.is_won() {
                        WIN_BG
                    } else if view.wrong_flash > 0 {
                        WRONG_BG
                    } else {
                        SLOT_BG
                    };
                    self.front.put_str(x, y, &format!(" {} ", ch), Color::White, bg);
                    self.hits.push(Hit { x, y, w: 3, target: HitTarget::Slot(i) });
                }
                None => self.front.put_str(x, y, " _ ", DIM, EMPTY_BG),
            }
        }

        // Pool
        let pool_top = slot_top + slot_rows + 2;
        let pool_pos = tile_positions(a.pool().len(), LEFT, width);
        for (i, (tile, &(x, dy))) in a.pool().iter().zip(&pool_pos).enumerate() {
            let y = pool_top + dy * 2;
            if a.is_placed(tile.id) {
                self.front.put_str(x, y, "   ", DIM, EMPTY_BG);
            } else {
                self.front.put_str(x, y, &format!(" {} ", tile.ch), Color::Black, TILE_BG);
                self.hits.push(Hit { x, y, w: 3, target: HitTarget::Tile(tile.id) });
            }
            if i == view.pool_cursor && !a.is_won() {
                let blink = (view.anim_tick / 5) % 2 == 0;
                let marker = if blink { "▔▔▔" } else { " ▔ " };
                self.front.put_str(x, y + 1, marker, HI, Color::Reset);
            }
        }
        let pool_rows = pool_pos.last().map_or(1, |&(_, r)| r + 1);

        // Footer
        let footer = pool_top + pool_rows * 2 + 1;
        let filled = a.slots().iter().filter(|s| s.is_some()).count();
        self.front.put_str(
            LEFT,
            footer,
            &format!("{}/{} letters", filled, a.slots().len()),
            DIM,
            Color::Reset,
        );
        if a.is_won() {
            self.front.put_str(LEFT, footer + 2, "★ SOLVED ★   ENTER Continue   ESC Levels", HI, Color::Reset);
        } else {
            self.front.put_str(
                LEFT,
                footer + 2,
                "Type letters · ←→ + ENTER pick · BKSP erase · ESC back",
                DIM,
                Color::Reset,
            );
            let costs = format!(
                "F2 Shuffle   F3 Hint (◉ {})   F4 Skip (◉ {})",
                economy.hint_cost, economy.skip_cost
            );
            self.front.put_str(LEFT, footer + 3, &costs, CYAN, Color::Reset);
        }
    }

    fn compose_reveal(&mut self, pack_name: &str, level: usize, answer: &str, image: &str) {
        self.compose_header(&format!("{} · Level {}", pack_name, level + 1), 1);
        self.front.put_str(LEFT, 5, "The answer was", DIM, Color::Reset);
        let spaced: String = answer.chars().flat_map(|c| [c, ' ']).collect();
        self.front.put_str(LEFT + 2, 7, spaced.trim_end(), HI, Color::Reset);
        self.front.put_str(LEFT, 9, &format!("▣ still: {}", image), DIM, Color::Reset);
        self.front.put_str(LEFT, 11, "ENTER / ESC Back", DIM, Color::Reset);
    }

    fn compose_degraded(&mut self, reason: &str) {
        let box_art = [
            "╔════════════════════════════════╗",
            "║   ✕  CATALOG  UNAVAILABLE  ✕   ║",
            "╚════════════════════════════════╝",
        ];
        for (i, l) in box_art.iter().enumerate() {
            self.front.put_str(6, 3 + i, l, RED, Color::Reset);
        }
        self.front.put_str(8, 8, reason, Color::White, Color::Reset);
        self.front.put_str(8, 10, "Check data_dir in config.toml.", DIM, Color::Reset);
        self.front.put_str(8, 12, "▸ Q / ESC: Quit", HI, Color::Reset);
    }

    fn compose_message(&mut self, view: &View) {
        if view.message.is_empty() || self.front.height < 2 {
            return;
        }
        let row = self.front.height - 1;
        let bar = Color::Rgb { r: 200, g: 180, b: 50 };
        self.front.fill(0, row, self.front.width, bar);
        self.front.put_str(0, row, &format!(" ◈ {} ", view.message), Color::Black, bar);
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::puzzle::PuzzleEngine;
    use crate::sim::catalog::testing::sample_source;
    use crate::sim::catalog::Catalog;
    use crate::sim::progression::Progression;
    use crate::sim::router::Command;
    use crate::sim::save::{MemoryStore, ProgressStore};

    fn headless(w: usize, h: usize) -> Renderer {
        let mut r = Renderer::new();
        r.resize(w, h);
        r
    }

    fn row_text(r: &Renderer, y: usize) -> String {
        (0..r.front.width).map(|x| r.front.get(x, y).ch).collect()
    }

    fn router_in_puzzle() -> InputRouter {
        let catalog = Catalog::load(Box::new(sample_source()));
        let store = ProgressStore::open(Box::new(MemoryStore::default()), 100, ["Classic", "Noir"]);
        let progression = Progression::new(store, EconomyConfig::default());
        let mut router = InputRouter::new(catalog, progression, PuzzleEngine::with_seed(3));
        router.dispatch(Command::ShowPacks);
        router.dispatch(Command::OpenPack("Classic".into()));
        router.dispatch(Command::EnterLevel { pack: "Classic".into(), level: 0 });
        router
    }

    #[test]
    fn put_str_clips_at_right_edge() {
        let mut fb = FrameBuffer::new(5, 1);
        fb.put_str(3, 0, "abcd", Color::White, Color::Reset);
        assert_eq!(fb.get(3, 0).ch, 'a');
        assert_eq!(fb.get(4, 0).ch, 'b');
        assert_eq!(fb.get(5, 0), Cell::BLANK);
    }

    #[test]
    fn tiles_wrap_to_next_row() {
        let pos = tile_positions(5, 4, 16);
        assert_eq!(pos, vec![(4, 0), (8, 0), (12, 0), (4, 1), (8, 1)]);
        // Never fewer than one per row
        assert_eq!(tile_positions(2, 4, 5), vec![(4, 0), (4, 1)]);
    }

    #[test]
    fn level_grid_width_is_bounded() {
        assert_eq!(level_columns(10), 1);
        assert_eq!(level_columns(80), 10);
        assert_eq!(level_columns(40), 5);
    }

    #[test]
    fn puzzle_tiles_are_clickable() {
        let router = router_in_puzzle();
        let mut r = headless(80, 24);
        r.compose(&router);

        let a = &router.screen().session().unwrap().attempt;
        let tiles = r.hits.iter().filter(|h| matches!(h.target, HitTarget::Tile(_))).count();
        assert_eq!(tiles, a.pool().len());
        assert!(r.hits.iter().all(|h| !matches!(h.target, HitTarget::Slot(_))));

        let first = a.pool()[0].id;
        let hit = r.hits.iter().find(|h| h.target == HitTarget::Tile(first)).unwrap();
        assert_eq!(r.hit_test((hit.x + 1) as u16, hit.y as u16), Some(HitTarget::Tile(first)));
        assert_eq!(r.hit_test(0, 0), None);
    }

    #[test]
    fn placed_letter_moves_from_pool_to_slot() {
        let mut router = router_in_puzzle();
        let id = router.screen().session().unwrap().attempt.pool()[0].id;
        router.dispatch(Command::SelectLetter(id));

        let mut r = headless(80, 24);
        r.compose(&router);
        assert!(r.hits.iter().all(|h| h.target != HitTarget::Tile(id)));
        let slot = r.hits.iter().find(|h| h.target == HitTarget::Slot(0)).unwrap();
        assert_eq!(r.hit_test(slot.x as u16, slot.y as u16), Some(HitTarget::Slot(0)));
    }

    #[test]
    fn pack_list_marks_locked_pack() {
        let mut router = router_in_puzzle();
        router.dispatch(Command::Back);
        router.dispatch(Command::Back);
        let mut r = headless(80, 24);
        r.compose(&router);

        let rows: Vec<String> = (0..24).map(|y| row_text(&r, y)).collect();
        assert!(rows.iter().any(|l| l.contains("Classic") && l.contains("solved")));
        assert!(rows.iter().any(|l| l.contains("Noir") && l.contains("to unlock")));
        assert!(rows.iter().any(|l| l.contains("Diwali") && l.contains("EVENT")));
        assert_eq!(r.hits.len(), 3);
    }
}
