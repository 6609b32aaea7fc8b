/// Level construction: seeded grid plus random content.
///
/// ## Build order
///   1. `Grid::new`: all dirt, starting tunnel, two emerald clusters.
///   2. Enemy spawn marker at `(width - 2, 2)`.
///   3. Emeralds: rejection sampling over x∈[1, w−2], y∈[1, h−2], DIRT only.
///   4. Gold bags: x∈[2, w−3], y∈[2, h−3], DIRT with DIRT below, so every
///      bag can later fall once the cell beneath it is dug.
///
/// Sampling is bounded (`count × 10` tries for emeralds, `count × 15` for
/// bags). Running out of tries stops placement short; the returned
/// `PlacementReport` carries requested vs. placed and a shortfall is logged.

use rand::Rng;

use crate::domain::difficulty::DifficultyProfile;
use crate::domain::entity::GoldBag;
use crate::domain::grid::Grid;
use crate::domain::tile::Tile;

const EMERALD_TRIES_PER_ITEM: usize = 10;
const BAG_TRIES_PER_ITEM: usize = 15;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlacementReport {
    pub requested: usize,
    pub placed: usize,
}

impl PlacementReport {
    pub fn shortfall(&self) -> usize {
        self.requested.saturating_sub(self.placed)
    }
}

/// A freshly built level, ready to be moved into the session.
#[derive(Clone, Debug)]
pub struct LevelLayout {
    pub grid: Grid,
    pub bags: Vec<GoldBag>,
    pub spawn: (usize, usize),
    pub emeralds: PlacementReport,
    pub gold_bags: PlacementReport,
}

/// Enemy entry cell for a grid of the given size.
pub fn enemy_spawn(width: usize, height: usize) -> (usize, usize) {
    (width.saturating_sub(2), 2.min(height.saturating_sub(1)))
}

pub fn build_level<R: Rng>(profile: &DifficultyProfile, width: usize, height: usize, rng: &mut R) -> LevelLayout {
    let mut grid = Grid::new(width, height);
    let spawn = enemy_spawn(width, height);
    if grid.in_bounds(spawn.0 as i32, spawn.1 as i32) {
        grid.set(spawn.0, spawn.1, Tile::Spawn);
    }

    let emeralds = scatter_emeralds(&mut grid, profile.emeralds, rng);
    let (bags, gold_bags) = scatter_gold_bags(&mut grid, profile.gold_bags, profile.level, rng);

    for (what, report) in [("emeralds", emeralds), ("gold bags", gold_bags)] {
        if report.shortfall() > 0 {
            log::warn!(
                "level {}: placed {} of {} {what}",
                profile.level, report.placed, report.requested,
            );
        }
    }
    log::debug!(
        "level {} built: {} emeralds on grid, {} bags",
        profile.level, grid.count(Tile::Emerald), bags.len(),
    );

    LevelLayout { grid, bags, spawn, emeralds, gold_bags }
}

/// Place up to `count` emeralds on dirt cells away from the border.
pub fn scatter_emeralds<R: Rng>(grid: &mut Grid, count: usize, rng: &mut R) -> PlacementReport {
    let mut report = PlacementReport { requested: count, placed: 0 };
    let (w, h) = (grid.width(), grid.height());
    if w < 3 || h < 3 { return report; }

    let mut tries = 0;
    while report.placed < count && tries < count * EMERALD_TRIES_PER_ITEM {
        tries += 1;
        let x = rng.gen_range(1..=w - 2);
        let y = rng.gen_range(1..=h - 2);
        if grid.get(x, y) == Tile::Dirt {
            grid.set(x, y, Tile::Emerald);
            report.placed += 1;
        }
    }
    report
}

/// Place up to `count` bags on dirt cells that sit on dirt.
/// Bag ids are `g{n}_{level}`.
pub fn scatter_gold_bags<R: Rng>(
    grid: &mut Grid,
    count: usize,
    level: u32,
    rng: &mut R,
) -> (Vec<GoldBag>, PlacementReport) {
    let mut bags = Vec::with_capacity(count);
    let mut report = PlacementReport { requested: count, placed: 0 };
    let (w, h) = (grid.width(), grid.height());
    if w < 5 || h < 5 { return (bags, report); }

    let mut tries = 0;
    while report.placed < count && tries < count * BAG_TRIES_PER_ITEM {
        tries += 1;
        let x = rng.gen_range(2..=w - 3);
        let y = rng.gen_range(2..=h - 3);
        if grid.get(x, y) == Tile::Dirt && grid.get(x, y + 1) == Tile::Dirt {
            grid.set(x, y, Tile::GoldBag);
            bags.push(GoldBag::new(format!("g{}_{}", report.placed, level), x, y));
            report.placed += 1;
        }
    }
    (bags, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::{GRID_HEIGHT, GRID_WIDTH};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng(seed: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(seed)
    }

    #[test]
    fn full_size_level_meets_its_targets() {
        let profile = DifficultyProfile::for_level(1);
        let layout = build_level(&profile, GRID_WIDTH, GRID_HEIGHT, &mut rng(7));
        assert_eq!(layout.emeralds, PlacementReport { requested: 40, placed: 40 });
        assert_eq!(layout.gold_bags, PlacementReport { requested: 5, placed: 5 });
        // 8 seeded cluster emeralds plus the scattered ones
        assert_eq!(layout.grid.count(Tile::Emerald), 48);
        assert_eq!(layout.grid.count(Tile::GoldBag), 5);
        assert_eq!(layout.spawn, (58, 2));
        assert_eq!(layout.grid.get(58, 2), Tile::Spawn);
    }

    #[test]
    fn bags_sit_on_dirt_inside_the_margin() {
        let profile = DifficultyProfile::for_level(3);
        let layout = build_level(&profile, GRID_WIDTH, GRID_HEIGHT, &mut rng(99));
        for (i, bag) in layout.bags.iter().enumerate() {
            assert_eq!(bag.id, format!("g{i}_3"));
            assert!((2..=GRID_WIDTH - 3).contains(&bag.x));
            assert!((2..=GRID_HEIGHT - 3).contains(&bag.y));
            assert_eq!(layout.grid.get(bag.x, bag.y), Tile::GoldBag);
            // a later bag may have landed directly below an earlier one
            let below = layout.grid.get(bag.x, bag.y + 1);
            assert!(matches!(below, Tile::Dirt | Tile::GoldBag), "bag {} rests on {below:?}", bag.id);
        }
    }

    #[test]
    fn same_seed_same_level() {
        let profile = DifficultyProfile::for_level(2);
        let a = build_level(&profile, GRID_WIDTH, GRID_HEIGHT, &mut rng(5));
        let b = build_level(&profile, GRID_WIDTH, GRID_HEIGHT, &mut rng(5));
        assert_eq!(a.grid, b.grid);
        let pos = |l: &LevelLayout| l.bags.iter().map(|b| (b.x, b.y)).collect::<Vec<_>>();
        assert_eq!(pos(&a), pos(&b));
    }

    #[test]
    fn shortfall_is_reported_not_hidden() {
        let mut g = Grid::filled(6, 6, Tile::Tunnel);
        g.set(2, 2, Tile::Dirt);
        let report = scatter_emeralds(&mut g, 3, &mut rng(1));
        assert_eq!(report.requested, 3);
        assert!(report.placed <= 1);
        assert!(report.shortfall() >= 2);

        let mut g = Grid::filled(6, 6, Tile::Tunnel);
        let (bags, report) = scatter_gold_bags(&mut g, 2, 1, &mut rng(1));
        assert!(bags.is_empty());
        assert_eq!(report, PlacementReport { requested: 2, placed: 0 });
    }

    #[test]
    fn tiny_grids_do_not_panic() {
        let mut g = Grid::filled(2, 2, Tile::Dirt);
        assert_eq!(scatter_emeralds(&mut g, 4, &mut rng(3)).placed, 0);
        let (_, r) = scatter_gold_bags(&mut g, 4, 1, &mut rng(3));
        assert_eq!(r.placed, 0);
    }
}
