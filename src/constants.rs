use crate::types::DotTier;

pub const TICK_RATE: u32 = 60;
pub const TICK_MS: u64 = 1000 / TICK_RATE as u64;

pub const GRID_COLS: i32 = 40;
pub const GRID_ROWS: i32 = 25;
pub const MIN_GRID_COLS: i32 = 9;
pub const MIN_GRID_ROWS: i32 = 7;
pub const TILE_SIZE: f32 = 20.0;

pub const CORRIDOR_SPACING: usize = 6;
pub const WALL_BLOCK_ATTEMPTS: usize = 8;
pub const SPAWN_BLOCK_SIZE: i32 = 3;
pub const CENTER_BLOCK_RADIUS: i32 = 2;

pub const POWER_DOT_COUNT: usize = 3;
pub const SUPER_POWER_DOT_COUNT: usize = 1;

pub const STARTING_LIVES: u32 = 3;
pub const PLAYER_BASE_SPEED: f32 = 2.0;
pub const SUPER_POWER_SPEED_MULTIPLIER: f32 = 1.25;
pub const POWER_DURATION_TICKS: u32 = 300;
pub const SUPER_POWER_DURATION_TICKS: u32 = 600;
pub const MOUTH_CYCLE_FRAMES: u8 = 10;

pub const GHOST_BASE_SPEED: f32 = 1.5;
pub const GHOST_PATROL_STRAIGHT_CHANCE: f32 = 0.8;
pub const GHOST_REVERSAL_COOLDOWN: u32 = 5;
pub const GHOST_BLOCKED_COOLDOWN: u32 = 5;
pub const GHOST_ABORT_COOLDOWN: u32 = 3;
pub const GHOST_RESPAWN_COOLDOWN: u32 = 30;

pub const GHOST_EAT_SCORE: u32 = 300;
pub const FIRST_ELIMINATION_PENALTY: u32 = 1_000;

pub fn dot_score(tier: DotTier) -> u32 {
    match tier {
        DotTier::Normal => 10,
        DotTier::Power => 50,
        DotTier::SuperPower => 100,
    }
}
