use serde::Serialize;
use std::collections::VecDeque;

use crate::constants::{CENTER_BLOCK_RADIUS, SPAWN_BLOCK_SIZE};
use crate::error::RoundError;
use crate::types::{Direction, Vec2};

/// Flood-fill neighbour order: right, down, left, up.
pub(crate) const NEIGHBOR_STEPS: [(i32, i32); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tile {
    Open,
    Wall,
}

/// Row-major walkability map. `x` is the column and `y` the row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    rows: i32,
    cols: i32,
    cells: Vec<Tile>,
}

impl Grid {
    pub fn filled(rows: i32, cols: i32, tile: Tile) -> Self {
        let len = (rows.max(0) * cols.max(0)) as usize;
        Self {
            rows: rows.max(0),
            cols: cols.max(0),
            cells: vec![tile; len],
        }
    }

    /// Parses `#` (wall) and `.` (open) rows; every row must have the same width.
    pub fn from_lines(lines: &[&str]) -> Result<Self, RoundError> {
        let Some(first) = lines.first() else {
            return Err(RoundError::MalformedGrid { line: 0 });
        };
        let cols = first.chars().count();
        let mut cells = Vec::with_capacity(cols * lines.len());
        for (line_no, line) in lines.iter().enumerate() {
            if line.chars().count() != cols || cols == 0 {
                return Err(RoundError::MalformedGrid { line: line_no });
            }
            for c in line.chars() {
                cells.push(match c {
                    '#' => Tile::Wall,
                    '.' => Tile::Open,
                    _ => return Err(RoundError::MalformedGrid { line: line_no }),
                });
            }
        }
        Ok(Self {
            rows: lines.len() as i32,
            cols: cols as i32,
            cells,
        })
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    pub fn cols(&self) -> i32 {
        self.cols
    }

    pub fn in_bounds(&self, pos: Vec2) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.cols && pos.y < self.rows
    }

    /// True for cells that are not on the outer border.
    pub fn is_interior(&self, pos: Vec2) -> bool {
        pos.x >= 1 && pos.y >= 1 && pos.x < self.cols - 1 && pos.y < self.rows - 1
    }

    fn index(&self, pos: Vec2) -> Option<usize> {
        if !self.in_bounds(pos) {
            return None;
        }
        Some((pos.y * self.cols + pos.x) as usize)
    }

    pub fn tile(&self, pos: Vec2) -> Option<Tile> {
        self.index(pos).and_then(|idx| self.cells.get(idx).copied())
    }

    pub fn is_open(&self, pos: Vec2) -> bool {
        self.tile(pos) == Some(Tile::Open)
    }

    pub fn is_wall(&self, pos: Vec2) -> bool {
        self.tile(pos) == Some(Tile::Wall)
    }

    pub fn set(&mut self, pos: Vec2, tile: Tile) {
        if let Some(idx) = self.index(pos) {
            self.cells[idx] = tile;
        }
    }

    pub fn open_neighbor_count(&self, pos: Vec2) -> usize {
        NEIGHBOR_STEPS
            .iter()
            .filter(|(dx, dy)| self.is_open(Vec2::new(pos.x + dx, pos.y + dy)))
            .count()
    }

    pub fn middle_row(&self) -> i32 {
        self.rows / 2
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.cols / 2, self.rows / 2)
    }

    pub fn mirror_col(&self, col: i32) -> i32 {
        self.cols - 1 - col
    }

    pub fn is_spawn_zone(&self, pos: Vec2) -> bool {
        let in_rows = pos.y >= 1 && pos.y < 1 + SPAWN_BLOCK_SIZE;
        let left = pos.x >= 1 && pos.x < 1 + SPAWN_BLOCK_SIZE;
        let right = pos.x >= self.cols - 1 - SPAWN_BLOCK_SIZE && pos.x < self.cols - 1;
        in_rows && (left || right)
    }

    pub fn is_center_zone(&self, pos: Vec2) -> bool {
        let center = self.center();
        (pos.y - center.y).abs() <= CENTER_BLOCK_RADIUS
            && (pos.x - center.x).abs() <= CENTER_BLOCK_RADIUS
    }

    /// Spawn corners, the center block and the middle tunnel row.
    pub fn is_protected(&self, pos: Vec2) -> bool {
        self.is_spawn_zone(pos) || self.is_center_zone(pos) || pos.y == self.middle_row()
    }

    pub fn open_cells(&self) -> Vec<Vec2> {
        let mut out = Vec::new();
        for y in 0..self.rows {
            for x in 0..self.cols {
                let pos = Vec2::new(x, y);
                if self.is_open(pos) {
                    out.push(pos);
                }
            }
        }
        out
    }

    pub fn open_count(&self) -> usize {
        self.cells.iter().filter(|tile| **tile == Tile::Open).count()
    }

    /// Connected open regions, discovered in row-major scan order.
    pub fn components(&self) -> Vec<Vec<Vec2>> {
        let mut visited = vec![false; self.cells.len()];
        let mut components = Vec::new();

        for y in 0..self.rows {
            for x in 0..self.cols {
                let start = Vec2::new(x, y);
                let Some(start_idx) = self.index(start) else {
                    continue;
                };
                if visited[start_idx] || !self.is_open(start) {
                    continue;
                }

                let mut component = Vec::new();
                let mut stack = vec![start];
                while let Some(pos) = stack.pop() {
                    let Some(idx) = self.index(pos) else {
                        continue;
                    };
                    if visited[idx] || !self.is_open(pos) {
                        continue;
                    }
                    visited[idx] = true;
                    component.push(pos);
                    for (dx, dy) in NEIGHBOR_STEPS {
                        stack.push(Vec2::new(pos.x + dx, pos.y + dy));
                    }
                }
                components.push(component);
            }
        }
        components
    }

    pub fn is_connected(&self) -> bool {
        self.components().len() <= 1
    }

    pub fn is_mirror_symmetric(&self) -> bool {
        (0..self.rows).all(|y| {
            (0..self.cols / 2).all(|x| {
                self.tile(Vec2::new(x, y)) == self.tile(Vec2::new(self.mirror_col(x), y))
            })
        })
    }

    /// Unprotected open cells with fewer than two open neighbours.
    pub fn dead_ends(&self) -> Vec<Vec2> {
        self.open_cells()
            .into_iter()
            .filter(|pos| !self.is_protected(*pos) && self.open_neighbor_count(*pos) < 2)
            .collect()
    }

    /// Same row or column with no wall strictly between the two tiles.
    pub fn has_line_of_sight(&self, from: Vec2, to: Vec2) -> bool {
        if from.y == to.y {
            let (start, end) = (from.x.min(to.x), from.x.max(to.x));
            return ((start + 1)..end).all(|x| self.is_open(Vec2::new(x, from.y)));
        }
        if from.x == to.x {
            let (start, end) = (from.y.min(to.y), from.y.max(to.y));
            return ((start + 1)..end).all(|y| self.is_open(Vec2::new(from.x, y)));
        }
        false
    }

    /// First step of a shortest in-bounds path from `from` to the nearest
    /// open tile. Ties resolve in `Direction::ALL` order; `None` when `from`
    /// is open already or no open tile is reachable.
    pub fn step_toward_open(&self, from: Vec2) -> Option<Direction> {
        let start_idx = self.index(from)?;
        if self.is_open(from) {
            return None;
        }
        let mut visited = vec![false; self.cells.len()];
        visited[start_idx] = true;
        let mut queue = VecDeque::new();
        for dir in Direction::ALL {
            let next = from.offset(dir);
            if let Some(idx) = self.index(next) {
                visited[idx] = true;
                queue.push_back((next, dir));
            }
        }
        while let Some((pos, first)) = queue.pop_front() {
            if self.is_open(pos) {
                return Some(first);
            }
            for dir in Direction::ALL {
                let next = pos.offset(dir);
                let Some(idx) = self.index(next) else {
                    continue;
                };
                if !visited[idx] {
                    visited[idx] = true;
                    queue.push_back((next, first));
                }
            }
        }
        None
    }

    pub fn to_lines(&self) -> Vec<String> {
        (0..self.rows)
            .map(|y| {
                (0..self.cols)
                    .map(|x| if self.is_open(Vec2::new(x, y)) { '.' } else { '#' })
                    .collect()
            })
            .collect()
    }
}
