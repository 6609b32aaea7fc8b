/// The tile grid for one level.
///
/// Coordinates are `(x, y)` with `y` growing downward. Every access goes
/// through `in_bounds` first; `get` panics on an out-of-range cell, `kind_at`
/// is the checked variant for signed coordinates.
///
/// A fresh grid is all dirt with a fixed starting tunnel and two 2×2
/// emerald clusters. Random content is added by `sim::level` afterwards.

use super::entity::Direction;
use super::tile::Tile;

pub const GRID_WIDTH: usize = 60;
pub const GRID_HEIGHT: usize = 40;

/// Row and column span of the starting tunnel.
const START_TUNNEL_ROW: usize = 5;
const START_TUNNEL_COLS: std::ops::Range<usize> = 5..12;
/// Top-left corners of the seeded emerald clusters.
const EMERALD_CLUSTERS: [(usize, usize); 2] = [(6, 6), (18, 12)];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Vec<Tile>>,
}

impl Grid {
    /// Seeded level grid.
    pub fn new(width: usize, height: usize) -> Self {
        let mut grid = Grid::filled(width, height, Tile::Dirt);
        for x in START_TUNNEL_COLS {
            grid.set_if_inside(x, START_TUNNEL_ROW, Tile::Tunnel);
        }
        for &(cx, cy) in &EMERALD_CLUSTERS {
            for dy in 0..2 {
                for dx in 0..2 {
                    grid.set_if_inside(cx + dx, cy + dy, Tile::Emerald);
                }
            }
        }
        grid
    }

    pub fn filled(width: usize, height: usize, tile: Tile) -> Self {
        Grid { width, height, cells: vec![vec![tile; width]; height] }
    }

    /// Build from an ASCII diagram.
    ///
    /// `#` dirt, `.` tunnel, `*` emerald, `$` gold bag, `S` spawn.
    /// Any other character is tunnel.
    pub fn from_rows(rows: &[&str]) -> Self {
        let height = rows.len();
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        let mut grid = Grid::filled(width, height, Tile::Tunnel);
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                grid.cells[y][x] = match ch {
                    '#' => Tile::Dirt,
                    '*' => Tile::Emerald,
                    '$' => Tile::GoldBag,
                    'S' => Tile::Spawn,
                    _ => Tile::Tunnel,
                };
            }
        }
        grid
    }

    pub fn width(&self) -> usize { self.width }
    pub fn height(&self) -> usize { self.height }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    pub fn get(&self, x: usize, y: usize) -> Tile {
        self.cells[y][x]
    }

    /// Checked lookup for signed coordinates.
    pub fn kind_at(&self, x: i32, y: i32) -> Option<Tile> {
        if self.in_bounds(x, y) {
            Some(self.cells[y as usize][x as usize])
        } else {
            None
        }
    }

    pub fn set(&mut self, x: usize, y: usize, tile: Tile) {
        self.cells[y][x] = tile;
    }

    fn set_if_inside(&mut self, x: usize, y: usize, tile: Tile) {
        if x < self.width && y < self.height {
            self.cells[y][x] = tile;
        }
    }

    /// The in-bounds neighbor of `(x, y)` in `dir`, if any.
    pub fn neighbor(&self, x: usize, y: usize, dir: Direction) -> Option<(usize, usize)> {
        let (dx, dy) = dir.delta();
        let nx = x as i32 + dx;
        let ny = y as i32 + dy;
        if self.in_bounds(nx, ny) {
            Some((nx as usize, ny as usize))
        } else {
            None
        }
    }

    pub fn contains(&self, tile: Tile) -> bool {
        self.cells.iter().any(|row| row.contains(&tile))
    }

    pub fn count(&self, tile: Tile) -> usize {
        self.cells.iter().flatten().filter(|&&t| t == tile).count()
    }
}
