use std::collections::BTreeMap;

use crate::constants::{POWER_DOT_COUNT, SUPER_POWER_DOT_COUNT};
use crate::grid::Grid;
use crate::rng::Rng;
use crate::types::{DotTier, DotView, Vec2};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dot {
    pub position: Vec2,
    pub collected: bool,
    pub tier: DotTier,
}

/// One collectible per open cell, indexed by tile for O(log n) pickup.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DotField {
    dots: Vec<Dot>,
    lookup: BTreeMap<Vec2, usize>,
}

impl DotField {
    pub fn initialize(grid: &Grid, rng: &mut Rng) -> Self {
        let mut dots: Vec<Dot> = grid
            .open_cells()
            .into_iter()
            .map(|position| Dot {
                position,
                collected: false,
                tier: DotTier::Normal,
            })
            .collect();

        let mut candidates: Vec<usize> = (0..dots.len()).collect();
        for _ in 0..POWER_DOT_COUNT.min(dots.len()) {
            let picked = candidates.swap_remove(rng.pick_index(candidates.len()));
            dots[picked].tier = DotTier::Power;
        }
        for _ in 0..SUPER_POWER_DOT_COUNT {
            if candidates.is_empty() {
                break;
            }
            let picked = candidates.swap_remove(rng.pick_index(candidates.len()));
            dots[picked].tier = DotTier::SuperPower;
        }

        let lookup = dots
            .iter()
            .enumerate()
            .map(|(idx, dot)| (dot.position, idx))
            .collect();
        Self { dots, lookup }
    }

    /// Marks the dot at `position` collected. `None` when there is no dot or
    /// it was already taken.
    pub fn collect(&mut self, position: Vec2) -> Option<DotTier> {
        let idx = *self.lookup.get(&position)?;
        let dot = self.dots.get_mut(idx)?;
        if dot.collected {
            return None;
        }
        dot.collected = true;
        Some(dot.tier)
    }

    pub fn get(&self, position: Vec2) -> Option<&Dot> {
        self.lookup.get(&position).and_then(|idx| self.dots.get(*idx))
    }

    pub fn all_collected(&self) -> bool {
        self.dots.iter().all(|dot| dot.collected)
    }

    pub fn remaining(&self) -> usize {
        self.dots.iter().filter(|dot| !dot.collected).count()
    }

    pub fn len(&self) -> usize {
        self.dots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dots.is_empty()
    }

    pub fn count_tier(&self, tier: DotTier) -> usize {
        self.dots.iter().filter(|dot| dot.tier == tier).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Dot> {
        self.dots.iter()
    }

    pub fn views(&self) -> Vec<DotView> {
        self.dots
            .iter()
            .filter(|dot| !dot.collected)
            .map(|dot| DotView {
                x: dot.position.x,
                y: dot.position.y,
                tier: dot.tier,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Tile;
    use crate::maze::generate_maze;

    fn open_strip(len: usize) -> Grid {
        let row = format!("#{}#", ".".repeat(len));
        let wall = "#".repeat(len + 2);
        Grid::from_lines(&[wall.as_str(), row.as_str(), wall.as_str()]).expect("fixture parses")
    }

    #[test]
    fn tiers_are_exact_and_disjoint_on_generated_mazes() {
        for seed in 0..100u32 {
            let mut rng = Rng::new(seed);
            let maze = generate_maze(25, 40, &mut rng).expect("maze generates");
            let field = DotField::initialize(&maze.grid, &mut rng);

            assert_eq!(field.len(), maze.grid.open_count(), "seed={seed}");
            assert_eq!(field.count_tier(DotTier::Power), 3, "seed={seed}");
            assert_eq!(field.count_tier(DotTier::SuperPower), 1, "seed={seed}");
            assert!(field
                .iter()
                .all(|dot| maze.grid.tile(dot.position) == Some(Tile::Open)));
        }
    }

    #[test]
    fn small_fields_degrade_gracefully() {
        let mut rng = Rng::new(3);
        let field = DotField::initialize(&open_strip(2), &mut rng);
        assert_eq!(field.count_tier(DotTier::Power), 2);
        assert_eq!(field.count_tier(DotTier::SuperPower), 0);

        let field = DotField::initialize(&open_strip(3), &mut rng);
        assert_eq!(field.count_tier(DotTier::Power), 3);
        assert_eq!(field.count_tier(DotTier::SuperPower), 0);

        let field = DotField::initialize(&open_strip(4), &mut rng);
        assert_eq!(field.count_tier(DotTier::Power), 3);
        assert_eq!(field.count_tier(DotTier::SuperPower), 1);
        assert_eq!(field.count_tier(DotTier::Normal), 0);
    }

    #[test]
    fn collection_is_idempotent() {
        let mut rng = Rng::new(9);
        let mut field = DotField::initialize(&open_strip(6), &mut rng);
        let target = Vec2::new(2, 1);

        assert!(field.collect(target).is_some());
        assert_eq!(field.collect(target), None);
        assert_eq!(field.remaining(), 5);
        assert_eq!(field.collect(Vec2::new(0, 0)), None);
        assert_eq!(field.views().len(), 5);
    }

    #[test]
    fn all_collected_after_every_pickup() {
        let mut rng = Rng::new(1);
        let mut field = DotField::initialize(&open_strip(5), &mut rng);
        for x in 1..=5 {
            assert!(!field.all_collected());
            field.collect(Vec2::new(x, 1));
        }
        assert!(field.all_collected());
        assert_eq!(field.remaining(), 0);
    }

    #[test]
    fn same_seed_produces_same_field() {
        for seed in [0u32, 7, 4242] {
            let build = || {
                let mut rng = Rng::new(seed);
                let maze = generate_maze(25, 40, &mut rng).expect("maze generates");
                DotField::initialize(&maze.grid, &mut rng)
            };
            assert_eq!(build(), build());
        }
    }
}
