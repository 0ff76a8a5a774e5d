use crate::constants::{
    GHOST_BLOCKED_COOLDOWN, GHOST_PATROL_STRAIGHT_CHANCE, GHOST_REVERSAL_COOLDOWN,
};
use crate::grid::Grid;
use crate::rng::Rng;
use crate::types::{Direction, Vec2};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecisionRule {
    DirectChase,
    LookaheadChase,
    Patrol,
    Reversal,
    Blocked,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decision {
    pub direction: Option<Direction>,
    /// Cooldown the caller should install, if any.
    pub cooldown: Option<u32>,
    pub rule: DecisionRule,
}

impl Decision {
    fn go(direction: Direction, rule: DecisionRule) -> Self {
        Self {
            direction: Some(direction),
            cooldown: None,
            rule,
        }
    }
}

pub struct PolicyInput<'a> {
    pub grid: &'a Grid,
    pub tile: Vec2,
    pub facing: Direction,
    /// Directions the caller already cleared for walls and other ghosts.
    pub valid: &'a [Direction],
    /// Tiles of active players.
    pub targets: &'a [Vec2],
}

pub fn choose_direction(input: &PolicyInput<'_>, rng: &mut Rng) -> Decision {
    if input.valid.is_empty() {
        return Decision {
            direction: None,
            cooldown: Some(GHOST_BLOCKED_COOLDOWN),
            rule: DecisionRule::Blocked,
        };
    }
    if let Some(dir) = direct_chase(input) {
        return Decision::go(dir, DecisionRule::DirectChase);
    }
    if let Some(dir) = lookahead_chase(input) {
        return Decision::go(dir, DecisionRule::LookaheadChase);
    }
    patrol(input, rng)
}

fn direction_toward(from: Vec2, to: Vec2) -> Option<Direction> {
    if from == to {
        return None;
    }
    if from.x == to.x {
        return Some(if from.y > to.y {
            Direction::Up
        } else {
            Direction::Down
        });
    }
    if from.y == to.y {
        return Some(if from.x > to.x {
            Direction::Left
        } else {
            Direction::Right
        });
    }
    None
}

fn direct_chase(input: &PolicyInput<'_>) -> Option<Direction> {
    let mut nearest: Option<(i32, Vec2)> = None;
    for target in input.targets {
        if *target == input.tile || !input.grid.has_line_of_sight(input.tile, *target) {
            continue;
        }
        let distance = input.tile.manhattan(*target);
        if nearest.map_or(true, |(best, _)| distance < best) {
            nearest = Some((distance, *target));
        }
    }
    let (_, target) = nearest?;
    direction_toward(input.tile, target).filter(|dir| input.valid.contains(dir))
}

fn lookahead_chase(input: &PolicyInput<'_>) -> Option<Direction> {
    Direction::ALL
        .into_iter()
        .filter(|dir| input.valid.contains(dir))
        .find(|dir| {
            let ahead = input.tile.offset(*dir);
            input
                .targets
                .iter()
                .any(|target| input.grid.has_line_of_sight(ahead, *target))
        })
}

fn patrol(input: &PolicyInput<'_>, rng: &mut Rng) -> Decision {
    let reverse = input.facing.opposite();
    let forward: Vec<Direction> = input
        .valid
        .iter()
        .copied()
        .filter(|dir| *dir != reverse)
        .collect();

    if forward.is_empty() {
        return Decision {
            direction: Some(reverse),
            cooldown: Some(GHOST_REVERSAL_COOLDOWN),
            rule: DecisionRule::Reversal,
        };
    }

    if forward.contains(&input.facing) {
        if rng.bool(GHOST_PATROL_STRAIGHT_CHANCE) {
            return Decision::go(input.facing, DecisionRule::Patrol);
        }
        let turns: Vec<Direction> = forward
            .iter()
            .copied()
            .filter(|dir| *dir != input.facing)
            .collect();
        if turns.is_empty() {
            return Decision::go(input.facing, DecisionRule::Patrol);
        }
        return Decision::go(turns[rng.pick_index(turns.len())], DecisionRule::Patrol);
    }

    Decision::go(forward[rng.pick_index(forward.len())], DecisionRule::Patrol)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_room() -> Grid {
        Grid::from_lines(&[
            "############", //
            "#..........#", //
            "#..........#", //
            "#..........#", //
            "#..........#", //
            "#..........#", //
            "#..........#", //
            "#..........#", //
            "############",
        ])
        .expect("fixture parses")
    }

    fn decide(
        grid: &Grid,
        tile: Vec2,
        facing: Direction,
        valid: &[Direction],
        targets: &[Vec2],
        seed: u32,
    ) -> Decision {
        let input = PolicyInput {
            grid,
            tile,
            facing,
            valid,
            targets,
        };
        choose_direction(&input, &mut Rng::new(seed))
    }

    #[test]
    fn visible_player_on_same_row_is_chased() {
        let grid = open_room();
        let decision = decide(
            &grid,
            Vec2::new(5, 5),
            Direction::Up,
            &Direction::ALL,
            &[Vec2::new(9, 5)],
            1,
        );
        assert_eq!(decision.direction, Some(Direction::Right));
        assert_eq!(decision.rule, DecisionRule::DirectChase);
        assert_eq!(decision.cooldown, None);
    }

    #[test]
    fn nearest_visible_player_wins_and_ties_keep_the_first() {
        let grid = open_room();
        let decision = decide(
            &grid,
            Vec2::new(5, 4),
            Direction::Up,
            &Direction::ALL,
            &[Vec2::new(10, 4), Vec2::new(5, 2)],
            1,
        );
        assert_eq!(decision.direction, Some(Direction::Up));

        let decision = decide(
            &grid,
            Vec2::new(5, 4),
            Direction::Up,
            &Direction::ALL,
            &[Vec2::new(3, 4), Vec2::new(7, 4)],
            1,
        );
        assert_eq!(decision.direction, Some(Direction::Left));
    }

    #[test]
    fn walls_block_direct_chase() {
        let grid = Grid::from_lines(&[
            "#######", //
            "#.....#", //
            "#.###.#", //
            "#.....#", //
            "#######",
        ])
        .expect("fixture parses");
        let decision = decide(
            &grid,
            Vec2::new(3, 1),
            Direction::Right,
            &[Direction::Left, Direction::Right],
            &[Vec2::new(3, 3)],
            1,
        );
        assert_eq!(decision.rule, DecisionRule::Patrol);
    }

    #[test]
    fn lookahead_picks_the_step_that_reveals_a_player() {
        let grid = open_room();
        let decision = decide(
            &grid,
            Vec2::new(5, 5),
            Direction::Up,
            &Direction::ALL,
            &[Vec2::new(6, 2)],
            1,
        );
        assert_eq!(decision.rule, DecisionRule::LookaheadChase);
        assert_eq!(decision.direction, Some(Direction::Right));
    }

    #[test]
    fn chase_direction_must_be_valid() {
        let grid = open_room();
        let decision = decide(
            &grid,
            Vec2::new(5, 5),
            Direction::Up,
            &[Direction::Up, Direction::Left],
            &[Vec2::new(9, 5)],
            1,
        );
        assert_ne!(decision.direction, Some(Direction::Right));
    }

    #[test]
    fn player_on_the_ghost_tile_is_not_a_chase_target() {
        let grid = open_room();
        let decision = decide(
            &grid,
            Vec2::new(5, 5),
            Direction::Up,
            &Direction::ALL,
            &[Vec2::new(5, 5)],
            1,
        );
        assert_ne!(decision.rule, DecisionRule::DirectChase);
    }

    #[test]
    fn dead_end_forces_reversal_with_cooldown() {
        let grid = open_room();
        let decision = decide(
            &grid,
            Vec2::new(1, 1),
            Direction::Left,
            &[Direction::Right],
            &[],
            1,
        );
        assert_eq!(decision.direction, Some(Direction::Right));
        assert_eq!(decision.rule, DecisionRule::Reversal);
        assert_eq!(decision.cooldown, Some(GHOST_REVERSAL_COOLDOWN));
    }

    #[test]
    fn no_valid_direction_is_blocked() {
        let grid = open_room();
        let decision = decide(&grid, Vec2::new(3, 3), Direction::Up, &[], &[], 1);
        assert_eq!(decision.direction, None);
        assert_eq!(decision.rule, DecisionRule::Blocked);
        assert_eq!(decision.cooldown, Some(GHOST_BLOCKED_COOLDOWN));
    }

    #[test]
    fn patrol_never_reverses_when_forward_exists() {
        let grid = open_room();
        let mut straight = 0;
        for seed in 0..500u32 {
            let decision = decide(
                &grid,
                Vec2::new(5, 4),
                Direction::Right,
                &Direction::ALL,
                &[],
                seed,
            );
            assert_eq!(decision.rule, DecisionRule::Patrol);
            assert_ne!(decision.direction, Some(Direction::Left), "seed={seed}");
            if decision.direction == Some(Direction::Right) {
                straight += 1;
            }
        }
        assert!(straight > 300, "straight={straight}");
    }

    #[test]
    fn patrol_at_a_corner_picks_a_forward_turn() {
        let grid = open_room();
        for seed in 0..50u32 {
            let decision = decide(
                &grid,
                Vec2::new(10, 4),
                Direction::Right,
                &[Direction::Up, Direction::Down, Direction::Left],
                &[],
                seed,
            );
            assert!(matches!(
                decision.direction,
                Some(Direction::Up) | Some(Direction::Down)
            ));
        }
    }
}
