/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Compose the next frame into the `front` buffer (array of Cell)
///   2. Compare each cell with the `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. Batch everything with `queue!`, flush once at the end
///   5. Swap front/back
///
/// One grid cell is two terminal columns. The play field is seen through
/// a `Camera` that keeps player 1 (or player 2 once player 1 is out) in
/// view on grids larger than the terminal.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::{BagState, Direction, EnemyForm, PlayerId};
use crate::domain::tile::Tile;
use crate::sim::highscores::HighScores;
use crate::sim::world::{GameMode, Session};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for every "empty" terminal cell, so the
    /// terminal's own default never shows between rows.
    const BASE_BG: Color = Color::Rgb { r: 18, g: 14, b: 10 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Never produced by composing; fills `back` to force a full repaint.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = if bg == Color::Reset { Cell::BASE_BG } else { bg };
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

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }

    /// Centered horizontally.
    fn put_centered(&mut self, y: usize, s: &str, fg: Color, bg: Color) {
        let x = self.width.saturating_sub(s.chars().count()) / 2;
        self.put_str(x, y, s, fg, bg);
    }

    #[cfg(test)]
    fn row_text(&self, y: usize) -> String {
        (0..self.width).map(|x| self.get(x, y).ch).collect()
    }
}

// ── Camera ──

/// Top-left grid cell of the viewport plus its size in cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Camera {
    pub x: usize,
    pub y: usize,
    pub view_w: usize,
    pub view_h: usize,
}

impl Camera {
    /// Center on (tx, ty), clamped so the view never leaves the grid.
    pub fn follow(&mut self, tx: usize, ty: usize, world_w: usize, world_h: usize) {
        self.x = follow_axis(tx, self.view_w, world_w);
        self.y = follow_axis(ty, self.view_h, world_h);
    }

    fn world_to_view(&self, x: usize, y: usize) -> Option<(usize, usize)> {
        let vx = x.checked_sub(self.x)?;
        let vy = y.checked_sub(self.y)?;
        (vx < self.view_w && vy < self.view_h).then_some((vx, vy))
    }
}

fn follow_axis(target: usize, view: usize, world: usize) -> usize {
    if view >= world { return 0; }
    target.saturating_sub(view / 2).min(world - view)
}

// ── What to draw ──

pub enum View<'a> {
    Title {
        scores: &'a HighScores,
    },
    Play {
        session: &'a Session,
        paused: bool,
        explosions: &'a [(usize, usize)],
    },
    GameOver {
        score_p1: u32,
        score_p2: Option<u32>,
        scores: &'a HighScores,
        rank: Option<usize>,
    },
}

impl View<'_> {
    fn kind(&self) -> u8 {
        match self {
            View::Title { .. } => 0,
            View::Play { .. } => 1,
            View::GameOver { .. } => 2,
        }
    }
}

// ── Palette ──

const HUD_BG: Color = Color::Rgb { r: 30, g: 30, b: 70 };
const DIRT_FG: Color = Color::Rgb { r: 150, g: 100, b: 50 };
const DIRT_BG: Color = Color::Rgb { r: 90, g: 58, b: 28 };
const TUNNEL_BG: Color = Color::Rgb { r: 8, g: 6, b: 4 };
const EMERALD: Color = Color::Rgb { r: 60, g: 230, b: 110 };
const GOLD: Color = Color::Rgb { r: 255, g: 200, b: 40 };
const ENEMY: Color = Color::Rgb { r: 240, g: 70, b: 70 };
const HOBBIN: Color = Color::Rgb { r: 255, g: 140, b: 40 };
const ACCENT: Color = Color::Rgb { r: 255, g: 200, b: 50 };

/// Each grid cell = 2 terminal columns.
const CELL_W: usize = 2;

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    camera: Camera,
    last_view: Option<u8>,
    /// Terminal reports key Release events.
    pub key_release: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            camera: Camera::default(),
            last_view: None,
            key_release: false,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;
        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            self.key_release = true;
        }
        log::debug!("key release events: {}", self.key_release);
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.resize(tw as usize, th as usize);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.key_release {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    fn resize(&mut self, w: usize, h: usize) {
        self.front.resize(w, h);
        self.back.resize(w, h);
        self.back.cells.fill(Cell::INVALID);
    }

    pub fn render(&mut self, view: &View) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.front.width || th as usize != self.front.height {
            self.resize(tw as usize, th as usize);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Screen change: clean transition
        if self.last_view != Some(view.kind()) {
            self.back.cells.fill(Cell::INVALID);
            self.last_view = Some(view.kind());
        }

        self.compose(view);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    fn compose(&mut self, view: &View) {
        self.front.clear();
        match view {
            View::Title { scores } => self.compose_title(scores),
            View::Play { session, paused, explosions } => {
                self.compose_play(session, explosions);
                if *paused {
                    self.compose_banner("PAUSED", "Esc resume   Q quit", ACCENT);
                }
            }
            View::GameOver { score_p1, score_p2, scores, rank } => {
                self.compose_game_over(*score_p1, *score_p2, scores, *rank)
            }
        }
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        // Explicit base colors; ResetColor would fall back to the terminal's own.
        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) { continue; }

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

    // ── Play field ──

    fn compose_play(&mut self, s: &Session, explosions: &[(usize, usize)]) {
        let reserved = MAP_ROW + 3; // HUD, gap, status, help
        self.camera.view_w = (self.front.width / CELL_W).min(s.grid.width());
        self.camera.view_h = self.front.height.saturating_sub(reserved).max(1).min(s.grid.height());
        let focus = s.players.iter().find(|p| p.body.alive).or(s.players.first());
        if let Some(p) = focus {
            self.camera.follow(p.body.x, p.body.y, s.grid.width(), s.grid.height());
        }

        self.compose_hud(s);

        let cam = self.camera;
        for vy in 0..cam.view_h {
            for vx in 0..cam.view_w {
                let (c0, c1, fg, bg) = tile_glyph(s.grid.get(cam.x + vx, cam.y + vy));
                self.put_cell(vx, vy, c0, c1, fg, bg);
            }
        }

        // Entities, back to front
        for bag in s.bags.iter().filter(|b| !b.collected) {
            let (glyph, fg) = match bag.state {
                BagState::Stable => ("$$", GOLD),
                BagState::Falling => ("$$", Color::White),
                BagState::Gold => ("**", GOLD),
            };
            self.put_entity(bag.x, bag.y, glyph, fg);
        }
        for b in &s.bullets {
            self.put_entity(b.x, b.y, "()", Color::Cyan);
        }
        for e in s.enemies.iter().filter(|e| e.body.alive) {
            match e.form {
                EnemyForm::Nobbin => self.put_entity(e.body.x, e.body.y, "N~", ENEMY),
                EnemyForm::Hobbin => self.put_entity(e.body.x, e.body.y, "H~", HOBBIN),
            }
        }
        for p in s.players.iter().filter(|p| p.body.alive) {
            // Blink while invulnerable
            if p.is_invulnerable() && (s.tick / 4) % 2 == 1 { continue; }
            let arrow = match p.body.facing {
                Some(Direction::Up) => "@^",
                Some(Direction::Down) => "@v",
                Some(Direction::Left) => "<@",
                Some(Direction::Right) | None => "@>",
            };
            let fg = match p.id {
                PlayerId::P1 => Color::White,
                PlayerId::P2 => Color::Rgb { r: 120, g: 200, b: 255 },
            };
            self.put_entity(p.body.x, p.body.y, arrow, fg);
        }
        for &(x, y) in explosions {
            self.put_entity(x, y, "##", Color::Rgb { r: 255, g: 90, b: 30 });
        }

        let status_row = MAP_ROW + cam.view_h;
        match s.mode {
            GameMode::LevelComplete => {
                let msg = format!("LEVEL {} CLEAR", s.level);
                self.compose_banner(&msg, "get ready", EMERALD);
            }
            GameMode::Bonus => {
                self.front.put_str(0, status_row, &format!(" BONUS {:.1}s ", s.bonus_timer), Color::Black, GOLD);
            }
            _ => {}
        }

        let help = " P1 arrows+Space   P2 WASD+Tab   Esc pause   M mute   Q quit";
        self.front.put_str(0, status_row + 1, help, Color::DarkGrey, Color::Reset);
    }

    fn compose_hud(&mut self, s: &Session) {
        self.front.fill_row(HUD_ROW, HUD_BG);
        let mut hud = format!(" LEVEL {:<2}", s.level);
        for p in &s.players {
            let state = if p.in_play() { "" } else { " OUT" };
            hud.push_str(&format!(
                "   {} {:>7}  lives {}{}",
                p.id.to_string().to_uppercase(), p.ledger.score.points(), p.ledger.lives.count(), state,
            ));
        }
        hud.push_str(&format!("   emeralds {}", s.grid.count(Tile::Emerald)));
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);
    }

    /// Two-column cell at viewport position (vx, vy).
    fn put_cell(&mut self, vx: usize, vy: usize, c0: char, c1: char, fg: Color, bg: Color) {
        let col = vx * CELL_W;
        let row = MAP_ROW + vy;
        self.front.set(col, row, Cell::new(c0, fg, bg));
        self.front.set(col + 1, row, Cell::new(c1, fg, bg));
    }

    /// Entity glyph at grid position (x, y), over a tunnel background.
    fn put_entity(&mut self, x: usize, y: usize, glyph: &str, fg: Color) {
        let Some((vx, vy)) = self.camera.world_to_view(x, y) else { return };
        let mut chars = glyph.chars();
        let c0 = chars.next().unwrap_or(' ');
        let c1 = chars.next().unwrap_or(' ');
        self.put_cell(vx, vy, c0, c1, fg, TUNNEL_BG);
    }

    /// Boxed message in the middle of the screen.
    fn compose_banner(&mut self, title: &str, hint: &str, fg: Color) {
        let inner = title.len().max(hint.len()) + 6;
        let top = format!("╔{}╗", "═".repeat(inner));
        let mid = format!("║{:^inner$}║", title);
        let low = format!("║{:^inner$}║", hint);
        let bot = format!("╚{}╝", "═".repeat(inner));
        let bg = Color::Rgb { r: 20, g: 40, b: 20 };
        let cy = self.front.height / 2;
        self.front.put_centered(cy.saturating_sub(1), &top, fg, bg);
        self.front.put_centered(cy, &mid, fg, bg);
        self.front.put_centered(cy + 1, &low, Color::White, bg);
        self.front.put_centered(cy + 2, &bot, fg, bg);
    }

    // ── Screens ──

    fn compose_title(&mut self, scores: &HighScores) {
        let logo = [
            r" ____  _                       ",
            r"|  _ \(_) __ _  __ _  ___ _ __ ",
            r"| | | | |/ _` |/ _` |/ _ \ '__|",
            r"| |_| | | (_| | (_| |  __/ |   ",
            r"|____/|_|\__, |\__, |\___|_|   ",
            r"         |___/ |___/           ",
        ];
        for (i, line) in logo.iter().enumerate() {
            self.front.put_centered(1 + i, line, GOLD, Color::Reset);
        }

        self.front.put_centered(8, "ENTER / 1   one player", EMERALD, Color::Reset);
        self.front.put_centered(9, "      2     two players", EMERALD, Color::Reset);
        self.front.put_centered(10, "      Q     quit       ", Color::White, Color::Reset);
        self.front.put_centered(11, "      M     mute       ", Color::DarkGrey, Color::Reset);

        self.compose_score_table(13, scores, None);
    }

    fn compose_game_over(&mut self, score_p1: u32, score_p2: Option<u32>, scores: &HighScores, rank: Option<usize>) {
        self.front.put_centered(2, "G A M E   O V E R", ENEMY, Color::Reset);
        let line = match score_p2 {
            Some(p2) => format!("P1 {score_p1}    P2 {p2}"),
            None => format!("SCORE {score_p1}"),
        };
        self.front.put_centered(4, &line, Color::White, Color::Reset);
        if let Some(r) = rank {
            self.front.put_centered(5, &format!("new high score, rank {}", r + 1), GOLD, Color::Reset);
        }
        self.compose_score_table(7, scores, rank);
        let hint_row = (7 + 3 + scores.top().len()).min(self.front.height.saturating_sub(1));
        self.front.put_centered(hint_row, "ENTER title   Q quit", Color::DarkGrey, Color::Reset);
    }

    fn compose_score_table(&mut self, top: usize, scores: &HighScores, highlight: Option<usize>) {
        self.front.put_centered(top, "HIGH SCORES", ACCENT, Color::Reset);
        if scores.top().is_empty() {
            self.front.put_centered(top + 2, "no games yet", Color::DarkGrey, Color::Reset);
            return;
        }
        for (i, e) in scores.top().iter().enumerate() {
            let line = format!("{:>2}. {:<8} {:>8}  {} {}", i + 1, e.name, e.score, e.date, e.time);
            let fg = if highlight == Some(i) { GOLD } else { Color::White };
            self.front.put_centered(top + 2 + i, &line, fg, Color::Reset);
        }
    }
}

fn tile_glyph(tile: Tile) -> (char, char, Color, Color) {
    match tile {
        Tile::Dirt => ('░', '░', DIRT_FG, DIRT_BG),
        Tile::Tunnel => (' ', ' ', Color::Reset, TUNNEL_BG),
        Tile::Emerald => ('◆', ' ', EMERALD, DIRT_BG),
        Tile::GoldBag => ('$', '$', GOLD, DIRT_BG),
        Tile::Spawn => ('·', '·', ENEMY, TUNNEL_BG),
    }
}
