use crate::constants::{
    CENTER_BLOCK_RADIUS, CORRIDOR_SPACING, MIN_GRID_COLS, MIN_GRID_ROWS, SPAWN_BLOCK_SIZE,
    WALL_BLOCK_ATTEMPTS,
};
use crate::error::RoundError;
use crate::grid::{Grid, Tile, NEIGHBOR_STEPS};
use crate::rng::Rng;
use crate::types::Vec2;

/// Two-cell lattice steps as `(dx, dy)`.
const LATTICE_STEPS: [(i32, i32); 4] = [(2, 0), (0, 2), (-2, 0), (0, -2)];

#[derive(Clone, Debug)]
pub struct GeneratedMaze {
    pub grid: Grid,
    /// Grid right before connectivity repair; always mirror-symmetric.
    pub baseline: Grid,
    pub carved_cells: usize,
    pub repair_links: usize,
}

pub fn generate_maze(rows: i32, cols: i32, rng: &mut Rng) -> Result<GeneratedMaze, RoundError> {
    if rows < MIN_GRID_ROWS || cols < MIN_GRID_COLS {
        return Err(RoundError::InvalidDimensions { rows, cols });
    }

    let mut grid = Grid::filled(rows, cols, Tile::Wall);
    let half = cols / 2;

    let carved_cells = carve_left_half(&mut grid, half, rng);
    open_corridors(&mut grid, half);
    insert_wall_blocks(&mut grid, half, rng);
    mirror_left_half(&mut grid, half);
    open_center_column(&mut grid);
    open_middle_row(&mut grid);
    open_protected_blocks(&mut grid);
    remove_dead_ends(&mut grid, true);

    let baseline = grid.clone();
    let repair_links = connect_components(&mut grid);
    if repair_links > 0 {
        remove_dead_ends(&mut grid, false);
    }

    if grid.open_count() == 0 {
        return Err(RoundError::EmptyMaze);
    }

    Ok(GeneratedMaze {
        grid,
        baseline,
        carved_cells,
        repair_links,
    })
}

struct CarveFrame {
    cell: Vec2,
    steps: [(i32, i32); 4],
    next: usize,
}

/// Randomized depth-first carve of the left half on the odd lattice, driven by
/// an explicit frame stack. Returns how many lattice cells were opened.
fn carve_left_half(grid: &mut Grid, half: i32, rng: &mut Rng) -> usize {
    if half <= 1 {
        return 0;
    }
    let rows = grid.rows();
    let stride = (half + 1) as usize;
    let is_valid = move |cell: Vec2| cell.y >= 1 && cell.y < rows - 1 && cell.x >= 1 && cell.x < half;
    let slot = move |cell: Vec2| cell.y as usize * stride + cell.x as usize;

    let mut visited = vec![false; rows as usize * stride];
    let start = Vec2::new(1, 1);
    visited[slot(start)] = true;
    grid.set(start, Tile::Open);
    let mut carved = 1;

    let mut stack = vec![CarveFrame {
        cell: start,
        steps: shuffled_steps(rng),
        next: 0,
    }];

    while let Some(frame) = stack.last_mut() {
        let Some(&(dx, dy)) = frame.steps.get(frame.next) else {
            stack.pop();
            continue;
        };
        frame.next += 1;
        let from = frame.cell;
        let to = Vec2::new(from.x + dx, from.y + dy);
        if !is_valid(to) || visited[slot(to)] {
            continue;
        }

        grid.set(Vec2::new(from.x + dx / 2, from.y + dy / 2), Tile::Open);
        grid.set(to, Tile::Open);
        visited[slot(to)] = true;
        carved += 1;
        stack.push(CarveFrame {
            cell: to,
            steps: shuffled_steps(rng),
            next: 0,
        });
    }
    carved
}

fn shuffled_steps(rng: &mut Rng) -> [(i32, i32); 4] {
    let mut steps = LATTICE_STEPS;
    rng.shuffle(&mut steps);
    steps
}

fn open_corridors(grid: &mut Grid, half: i32) {
    let rows = grid.rows();
    for y in (1..rows - 1).step_by(CORRIDOR_SPACING) {
        for x in 1..half {
            grid.set(Vec2::new(x, y), Tile::Open);
        }
    }
    for x in (1..half).step_by(CORRIDOR_SPACING) {
        for y in 1..rows - 1 {
            grid.set(Vec2::new(x, y), Tile::Open);
        }
    }
}

/// Drops small wall blocks into the left half unless a block cell is already
/// down to a single open neighbour.
fn insert_wall_blocks(grid: &mut Grid, half: i32, rng: &mut Rng) {
    let rows = grid.rows();
    if rows - 6 <= 0 || half - 4 <= 0 {
        return;
    }

    for _ in 0..WALL_BLOCK_ATTEMPTS {
        let top = rng.int(3, rows - 4);
        let left = rng.int(2, half - 3);
        let size = rng.int(2, 3);
        let bottom = (top + size).min(rows - 2);
        let right = (left + size).min(half - 1);

        let would_strand = (top..bottom)
            .any(|y| (left..right).any(|x| grid.open_neighbor_count(Vec2::new(x, y)) <= 1));
        if would_strand {
            continue;
        }
        for y in top..bottom {
            for x in left..right {
                grid.set(Vec2::new(x, y), Tile::Wall);
            }
        }
    }
}

fn mirror_left_half(grid: &mut Grid, half: i32) {
    for y in 0..grid.rows() {
        for x in 0..half {
            if let Some(tile) = grid.tile(Vec2::new(x, y)) {
                let mirror = grid.mirror_col(x);
                grid.set(Vec2::new(mirror, y), tile);
            }
        }
    }
}

fn open_center_column(grid: &mut Grid) {
    if grid.cols() % 2 == 0 {
        return;
    }
    let x = grid.cols() / 2;
    let rows = grid.rows();
    for y in 0..rows {
        let tile = if y == 0 || y == rows - 1 {
            Tile::Wall
        } else {
            Tile::Open
        };
        grid.set(Vec2::new(x, y), tile);
    }
}

fn open_middle_row(grid: &mut Grid) {
    let y = grid.middle_row();
    for x in 0..grid.cols() {
        grid.set(Vec2::new(x, y), Tile::Open);
    }
}

fn open_protected_blocks(grid: &mut Grid) {
    for y in 1..1 + SPAWN_BLOCK_SIZE {
        for x in 1..1 + SPAWN_BLOCK_SIZE {
            grid.set(Vec2::new(x, y), Tile::Open);
            let mirror = grid.mirror_col(x);
            grid.set(Vec2::new(mirror, y), Tile::Open);
        }
    }

    // on even widths the block sits one column right of the mirror axis, so
    // its reflection is opened as well
    let center = grid.center();
    for y in (center.y - CENTER_BLOCK_RADIUS)..=(center.y + CENTER_BLOCK_RADIUS) {
        for x in (center.x - CENTER_BLOCK_RADIUS)..=(center.x + CENTER_BLOCK_RADIUS) {
            grid.set(Vec2::new(x, y), Tile::Open);
            let mirror = grid.mirror_col(x);
            grid.set(Vec2::new(mirror, y), Tile::Open);
        }
    }
}

/// Extends unprotected dead ends into an adjacent wall until a full scan finds
/// none. With `mirror` set every opening is copied to the reflected column.
/// Returns the number of cells opened.
fn remove_dead_ends(grid: &mut Grid, mirror: bool) -> usize {
    let mut opened = 0;
    loop {
        let mut removed = false;
        for y in 1..grid.rows() - 1 {
            for x in 1..grid.cols() - 1 {
                let pos = Vec2::new(x, y);
                if !grid.is_open(pos)
                    || grid.open_neighbor_count(pos) != 1
                    || grid.is_protected(pos)
                {
                    continue;
                }

                for (dx, dy) in NEIGHBOR_STEPS {
                    let next = Vec2::new(pos.x + dx, pos.y + dy);
                    if !grid.is_interior(next) || grid.is_open(next) {
                        continue;
                    }
                    if !grid.is_interior(Vec2::new(next.x + dx, next.y + dy)) {
                        continue;
                    }

                    grid.set(next, Tile::Open);
                    opened += 1;
                    removed = true;
                    if mirror {
                        let mirror_x = grid.mirror_col(next.x);
                        if mirror_x != next.x {
                            grid.set(Vec2::new(mirror_x, next.y), Tile::Open);
                        }
                    }
                    break;
                }
            }
        }
        if !removed {
            return opened;
        }
    }
}

/// Links every secondary component to the largest one with an L-shaped carve
/// between their closest cells. Returns the number of links carved.
fn connect_components(grid: &mut Grid) -> usize {
    let mut components = grid.components();
    if components.len() <= 1 {
        return 0;
    }
    components.sort_by(|a, b| b.len().cmp(&a.len()));

    let Some((main, rest)) = components.split_first() else {
        return 0;
    };
    let mut links = 0;
    for component in rest {
        let mut best: Option<(i32, Vec2, Vec2)> = None;
        for &a in main {
            for &b in component {
                let distance = a.manhattan(b);
                if best.map_or(true, |(best_distance, _, _)| distance < best_distance) {
                    best = Some((distance, a, b));
                }
            }
        }
        if let Some((_, from, to)) = best {
            carve_l_path(grid, from, to);
            links += 1;
        }
    }
    links
}

fn carve_l_path(grid: &mut Grid, from: Vec2, to: Vec2) {
    for x in from.x.min(to.x)..=from.x.max(to.x) {
        grid.set(Vec2::new(x, from.y), Tile::Open);
    }
    for y in from.y.min(to.y)..=from.y.max(to.y) {
        grid.set(Vec2::new(to.x, y), Tile::Open);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{GRID_COLS, GRID_ROWS};

    fn lattice_cell_count(rows: i32, cols: i32) -> usize {
        let half = cols / 2;
        let lattice_rows = (1..rows - 1).step_by(2).count();
        let lattice_cols = (1..half).step_by(2).count();
        lattice_rows * lattice_cols
    }

    #[test]
    fn generated_mazes_are_connected() {
        for seed in 0..200u32 {
            let maze = generate_maze(GRID_ROWS, GRID_COLS, &mut Rng::new(seed)).expect("maze");
            assert!(maze.grid.is_connected(), "disconnected maze: seed={seed}");
        }
    }

    #[test]
    fn generated_mazes_have_no_unprotected_dead_ends() {
        for seed in 0..200u32 {
            let maze = generate_maze(GRID_ROWS, GRID_COLS, &mut Rng::new(seed)).expect("maze");
            let dead_ends = maze.grid.dead_ends();
            assert!(dead_ends.is_empty(), "dead ends: seed={seed}, cells={dead_ends:?}");
        }
    }

    #[test]
    fn baseline_is_mirror_symmetric() {
        for seed in 0..200u32 {
            let maze = generate_maze(GRID_ROWS, GRID_COLS, &mut Rng::new(seed)).expect("maze");
            assert!(maze.baseline.is_mirror_symmetric(), "asymmetric baseline: seed={seed}");
            if maze.repair_links == 0 {
                assert_eq!(maze.baseline, maze.grid);
            }
        }
    }

    #[test]
    fn protected_zones_are_open() {
        for seed in 0..50u32 {
            let grid = generate_maze(GRID_ROWS, GRID_COLS, &mut Rng::new(seed))
                .expect("maze")
                .grid;
            let mid = grid.middle_row();
            for x in 0..grid.cols() {
                assert!(grid.is_open(Vec2::new(x, mid)));
            }
            for y in 1..4 {
                for x in 1..4 {
                    assert!(grid.is_open(Vec2::new(x, y)));
                    assert!(grid.is_open(Vec2::new(grid.cols() - 1 - x, y)));
                }
            }
            let center = grid.center();
            for y in center.y - 2..=center.y + 2 {
                for x in center.x - 2..=center.x + 2 {
                    assert!(grid.is_open(Vec2::new(x, y)));
                }
            }
        }
    }

    #[test]
    fn same_seed_produces_same_grid() {
        let a = generate_maze(GRID_ROWS, GRID_COLS, &mut Rng::new(4_242)).expect("maze");
        let b = generate_maze(GRID_ROWS, GRID_COLS, &mut Rng::new(4_242)).expect("maze");
        assert_eq!(a.grid, b.grid);
        assert_eq!(a.carved_cells, b.carved_cells);
    }

    #[test]
    fn carve_visits_every_lattice_cell_in_left_half() {
        for seed in 0..20u32 {
            let mut grid = Grid::filled(GRID_ROWS, GRID_COLS, Tile::Wall);
            let carved = carve_left_half(&mut grid, GRID_COLS / 2, &mut Rng::new(seed));
            assert_eq!(carved, lattice_cell_count(GRID_ROWS, GRID_COLS));
            for y in 0..GRID_ROWS {
                for x in GRID_COLS / 2..GRID_COLS {
                    assert!(!grid.is_open(Vec2::new(x, y)));
                }
            }
        }
    }

    #[test]
    fn odd_width_opens_center_column_except_borders() {
        let grid = generate_maze(21, 31, &mut Rng::new(9)).expect("maze").grid;
        let x = 15;
        assert!(!grid.is_open(Vec2::new(x, 0)));
        assert!(!grid.is_open(Vec2::new(x, 20)));
        for y in 1..20 {
            assert!(grid.is_open(Vec2::new(x, y)));
        }
    }

    #[test]
    fn tiny_dimensions_are_rejected() {
        assert_eq!(
            generate_maze(5, 40, &mut Rng::new(1)).err(),
            Some(RoundError::InvalidDimensions { rows: 5, cols: 40 })
        );
        assert_eq!(
            generate_maze(25, 8, &mut Rng::new(1)).err(),
            Some(RoundError::InvalidDimensions { rows: 25, cols: 8 })
        );
    }

    #[test]
    fn repair_links_isolated_pockets_to_the_main_region() {
        let mut grid = Grid::from_lines(&[
            "#########", //
            "#...#...#", //
            "#...#...#", //
            "#########",
        ])
        .expect("fixture parses");
        assert_eq!(connect_components(&mut grid), 1);
        assert!(grid.is_connected());
        assert!(grid.is_open(Vec2::new(4, 1)) || grid.is_open(Vec2::new(4, 2)));
    }

    #[test]
    fn unmirrored_sweep_extends_dead_end_without_touching_reflection() {
        let mut grid = Grid::filled(9, 11, Tile::Wall);
        for x in 1..10 {
            grid.set(Vec2::new(x, 4), Tile::Open);
        }
        // stub off the tunnel row; (2,6) is a dead end outside every protected zone
        grid.set(Vec2::new(2, 5), Tile::Open);
        grid.set(Vec2::new(2, 6), Tile::Open);
        let opened = remove_dead_ends(&mut grid, false);
        assert!(opened > 0);
        assert!(!grid.dead_ends().contains(&Vec2::new(2, 6)));
        assert!(!grid.is_open(Vec2::new(8, 6)));
        assert!(!grid.is_open(Vec2::new(7, 6)));
    }

    mod proptests {
        use super::*;
        use crate::rng::Rng;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn generated_mazes_hold_for_any_seed_and_size(
                seed in any::<u32>(),
                rows in MIN_GRID_ROWS..32,
                cols in MIN_GRID_COLS..48,
            ) {
                let maze = generate_maze(rows, cols, &mut Rng::new(seed)).expect("maze");
                prop_assert!(maze.grid.is_connected());
                prop_assert!(maze.grid.dead_ends().is_empty(), "dead ends {:?}", maze.grid.dead_ends());
                prop_assert!(maze.baseline.is_mirror_symmetric());
                prop_assert!(maze.grid.open_count() > 0);
            }
        }
    }
}
