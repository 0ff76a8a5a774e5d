use crate::constants::{
    dot_score, FIRST_ELIMINATION_PENALTY, GHOST_ABORT_COOLDOWN, GHOST_BASE_SPEED,
    GHOST_EAT_SCORE, GHOST_RESPAWN_COOLDOWN, GRID_COLS, GRID_ROWS, MOUTH_CYCLE_FRAMES,
    PLAYER_BASE_SPEED, POWER_DURATION_TICKS, STARTING_LIVES, SUPER_POWER_DURATION_TICKS,
    SUPER_POWER_SPEED_MULTIPLIER,
};
use crate::dots::DotField;
use crate::error::RoundError;
use crate::grid::Grid;
use crate::maze::generate_maze;
use crate::rng::Rng;
use crate::types::{
    Direction, DotTier, GhostColor, GhostView, HudLine, PlayerId, PlayerInput, PlayerView,
    RoundEvent, RoundOutcome, RoundSnapshot, Vec2,
};

pub mod ghost_policy;
pub mod motion;
mod spawn_system;

use self::ghost_policy::{choose_direction, PolicyInput};
use self::motion::{advance_actor, can_enter, Actor};

#[derive(Clone, Debug)]
pub struct RoundOptions {
    pub rows: i32,
    pub cols: i32,
    pub seed: u32,
    pub starting_lives: u32,
}

impl Default for RoundOptions {
    fn default() -> Self {
        Self {
            rows: GRID_ROWS,
            cols: GRID_COLS,
            seed: 0,
            starting_lives: STARTING_LIVES,
        }
    }
}

/// Countdown flag used for power and super-power mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ModeTimer {
    active: bool,
    remaining: u32,
}

impl ModeTimer {
    /// Starts the timer, or refreshes a running one to the full duration.
    pub fn start(&mut self, duration: u32) {
        self.active = duration > 0;
        self.remaining = duration;
    }

    pub fn tick(&mut self) {
        if !self.active {
            return;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.active = false;
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }
}

#[derive(Clone, Debug)]
pub struct Player {
    id: PlayerId,
    actor: Actor,
    spawn: Vec2,
    spawn_facing: Direction,
    buffered: Option<Direction>,
    lives: u32,
    score: u32,
    active: bool,
    power: ModeTimer,
    super_power: ModeTimer,
    mouth_frame: u8,
}

impl Player {
    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn tile(&self) -> Vec2 {
        self.actor.tile
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn power(&self) -> ModeTimer {
        self.power
    }

    pub fn super_power(&self) -> ModeTimer {
        self.super_power
    }

    /// Either mode lets the player eat ghosts.
    pub fn can_eat_ghosts(&self) -> bool {
        self.power.is_active() || self.super_power.is_active()
    }

    pub fn mouth_open(&self) -> bool {
        self.mouth_frame < MOUTH_CYCLE_FRAMES / 2
    }

    fn speed(&self) -> f32 {
        if self.super_power.is_active() {
            PLAYER_BASE_SPEED * SUPER_POWER_SPEED_MULTIPLIER
        } else {
            PLAYER_BASE_SPEED
        }
    }

    fn view(&self) -> PlayerView {
        PlayerView {
            id: self.id,
            x: self.actor.tile.x,
            y: self.actor.tile.y,
            pixel_x: self.actor.pixel.x,
            pixel_y: self.actor.pixel.y,
            dir: self.actor.facing,
            active: self.active,
            power_mode: self.power.is_active(),
            super_power_mode: self.super_power.is_active(),
            mouth_open: self.mouth_open(),
            score: self.score,
            lives: self.lives,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Ghost {
    color: GhostColor,
    actor: Actor,
    last_direction: Option<Direction>,
    direction_cooldown: u32,
}

impl Ghost {
    pub fn color(&self) -> GhostColor {
        self.color
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn tile(&self) -> Vec2 {
        self.actor.tile
    }

    pub fn last_direction(&self) -> Option<Direction> {
        self.last_direction
    }

    pub fn direction_cooldown(&self) -> u32 {
        self.direction_cooldown
    }

    fn view(&self) -> GhostView {
        GhostView {
            color: self.color,
            x: self.actor.tile.x,
            y: self.actor.tile.y,
            pixel_x: self.actor.pixel.x,
            pixel_y: self.actor.pixel.y,
            dir: self.actor.facing,
        }
    }
}

/// One round of play: the maze, its dots, both players and the four ghosts.
#[derive(Clone, Debug)]
pub struct RoundState {
    options: RoundOptions,
    grid: Grid,
    dots: DotField,
    players: Vec<Player>,
    ghosts: Vec<Ghost>,
    rng: Rng,
    tick_counter: u64,
    first_player_eliminated: bool,
    game_ending: bool,
    running: bool,
    outcome: Option<RoundOutcome>,
    events: Vec<RoundEvent>,
}

pub fn generate_round(rows: i32, cols: i32, seed: u32) -> Result<RoundState, RoundError> {
    RoundState::new(RoundOptions {
        rows,
        cols,
        seed,
        ..RoundOptions::default()
    })
}

impl RoundState {
    pub fn new(options: RoundOptions) -> Result<Self, RoundError> {
        let mut rng = Rng::new(options.seed);
        let maze = generate_maze(options.rows, options.cols, &mut rng)?;
        let dots = DotField::initialize(&maze.grid, &mut rng);

        let mut round = Self {
            options,
            grid: maze.grid,
            dots,
            players: Vec::new(),
            ghosts: Vec::new(),
            rng,
            tick_counter: 0,
            first_player_eliminated: false,
            game_ending: false,
            running: true,
            outcome: None,
            events: Vec::new(),
        };
        round.spawn_players();
        round.spawn_ghosts();
        Ok(round)
    }

    /// Regenerates the maze from the continuing RNG stream and resets every
    /// actor, score and flag.
    pub fn restart(&mut self) -> Result<(), RoundError> {
        let maze = generate_maze(self.options.rows, self.options.cols, &mut self.rng)?;
        self.dots = DotField::initialize(&maze.grid, &mut self.rng);
        self.grid = maze.grid;
        self.tick_counter = 0;
        self.first_player_eliminated = false;
        self.game_ending = false;
        self.running = true;
        self.outcome = None;
        self.events.clear();
        self.spawn_players();
        self.spawn_ghosts();
        Ok(())
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn dots(&self) -> &DotField {
        &self.dots
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn ghosts(&self) -> &[Ghost] {
        &self.ghosts
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_ended(&self) -> bool {
        !self.running
    }

    pub fn outcome(&self) -> Option<RoundOutcome> {
        self.outcome
    }

    /// Player with the strictly higher score, `None` on a tie.
    pub fn leader(&self) -> Option<PlayerId> {
        let [first, second] = self.players.as_slice() else {
            return None;
        };
        match first.score.cmp(&second.score) {
            std::cmp::Ordering::Greater => Some(first.id),
            std::cmp::Ordering::Less => Some(second.id),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn hud(&self) -> Vec<HudLine> {
        self.players
            .iter()
            .map(|player| HudLine {
                player: player.id,
                score: player.score,
                lives: player.lives,
            })
            .collect()
    }

    pub fn snapshot(&self) -> RoundSnapshot {
        RoundSnapshot {
            tick: self.tick_counter,
            running: self.running,
            outcome: self.outcome,
            players: self.players.iter().map(Player::view).collect(),
            ghosts: self.ghosts.iter().map(Ghost::view).collect(),
            dots: self.dots.views(),
        }
    }

    /// Buffers a direction for an active player; applied at its next idle
    /// decision point.
    pub fn queue_input(&mut self, input: PlayerInput) {
        if let Some(player) = self.players.get_mut(input.player.index()) {
            if player.active {
                player.buffered = Some(input.direction);
            }
        }
    }

    pub fn tick(&mut self, inputs: &[PlayerInput]) -> Result<Vec<RoundEvent>, RoundError> {
        if !self.running {
            return Err(RoundError::RoundEnded);
        }
        self.tick_counter += 1;

        for input in inputs {
            self.queue_input(*input);
        }
        self.update_players();
        self.update_ghosts();
        self.resolve_collisions();
        self.check_round_end();

        Ok(std::mem::take(&mut self.events))
    }

    fn update_players(&mut self) {
        for idx in 0..self.players.len() {
            if self.players[idx].active {
                self.update_player(idx);
            }
        }
    }

    fn update_player(&mut self, idx: usize) {
        let grid = &self.grid;
        let player = &mut self.players[idx];

        let phasing = player.super_power.is_active();
        let tile = player.actor.tile;
        // Stranded in a wall once phasing ends: open tiles only, plus the
        // first step out when no neighbour is open.
        let escape = if phasing {
            None
        } else {
            grid.step_toward_open(tile)
        };
        let exit = escape
            .filter(|_| grid.open_neighbor_count(tile) == 0)
            .map(|dir| tile.offset(dir));
        let walkable = |pos: Vec2| {
            grid.in_bounds(pos) && (grid.is_open(pos) || phasing || exit == Some(pos))
        };

        let requested = if player.actor.moving {
            None
        } else {
            resolve_player_direction(player, &walkable).or(escape)
        };
        let speed = player.speed();
        let step = advance_actor(&mut player.actor, requested, speed, &walkable);
        if step.started {
            self.events.push(RoundEvent::PlayerMoved {
                player: player.id,
                direction: player.actor.facing,
            });
        }

        player.mouth_frame = (player.mouth_frame + 1) % MOUTH_CYCLE_FRAMES;
        player.power.tick();
        player.super_power.tick();

        let tile = player.actor.tile;
        let Some(tier) = self.dots.collect(tile) else {
            return;
        };
        player.score += dot_score(tier);
        match tier {
            DotTier::Normal => {}
            DotTier::Power => player.power.start(POWER_DURATION_TICKS),
            DotTier::SuperPower => player.super_power.start(SUPER_POWER_DURATION_TICKS),
        }
        self.events.push(RoundEvent::DotCollected {
            player: player.id,
            tier,
            x: tile.x,
            y: tile.y,
        });
    }

    fn update_ghosts(&mut self) {
        let targets: Vec<Vec2> = self
            .players
            .iter()
            .filter(|player| player.active)
            .map(|player| player.actor.tile)
            .collect();

        for idx in 0..self.ghosts.len() {
            self.update_ghost(idx, &targets);
        }
    }

    fn update_ghost(&mut self, idx: usize, targets: &[Vec2]) {
        self.ghosts[idx].direction_cooldown = self.ghosts[idx].direction_cooldown.saturating_sub(1);

        let claimed = self.claimed_by_other_ghosts(idx);
        let grid = &self.grid;
        let walkable = |pos: Vec2| grid.is_open(pos) && !claimed.contains(&pos);

        let ghost = &mut self.ghosts[idx];
        let mut requested = None;
        if !ghost.actor.moving {
            let valid = ghost_valid_directions(ghost, &walkable);
            let input = PolicyInput {
                grid,
                tile: ghost.actor.tile,
                facing: ghost.actor.facing,
                valid: &valid,
                targets,
            };
            let decision = choose_direction(&input, &mut self.rng);
            if let Some(cooldown) = decision.cooldown {
                ghost.direction_cooldown = cooldown;
            }
            requested = decision.direction;
        }

        let previous = ghost.actor.facing;
        let step = advance_actor(&mut ghost.actor, requested, GHOST_BASE_SPEED, &walkable);
        if step.started {
            ghost.last_direction = Some(previous);
            self.events.push(RoundEvent::GhostMoved {
                ghost: ghost.color,
                direction: ghost.actor.facing,
            });
        }
        if step.aborted {
            ghost.direction_cooldown = GHOST_ABORT_COOLDOWN;
        }
    }

    fn resolve_collisions(&mut self) {
        for ghost_idx in 0..self.ghosts.len() {
            for player_idx in 0..self.players.len() {
                let player = &self.players[player_idx];
                if !player.active || player.actor.tile != self.ghosts[ghost_idx].actor.tile {
                    continue;
                }
                if player.can_eat_ghosts() {
                    self.eat_ghost(ghost_idx, player_idx);
                } else {
                    self.hurt_player(player_idx);
                }
            }
        }
    }

    fn eat_ghost(&mut self, ghost_idx: usize, player_idx: usize) {
        let player = &mut self.players[player_idx];
        player.score += GHOST_EAT_SCORE;
        let by = player.id;
        self.respawn_ghost(ghost_idx);
        self.events.push(RoundEvent::GhostEaten {
            ghost: self.ghosts[ghost_idx].color,
            by,
        });
    }

    fn hurt_player(&mut self, player_idx: usize) {
        let player = &mut self.players[player_idx];
        player.lives = player.lives.saturating_sub(1);
        let id = player.id;
        self.events.push(RoundEvent::PlayerHurt { player: id });

        if player.lives > 0 {
            self.reset_player_position(player_idx);
            return;
        }

        player.active = false;
        if !self.first_player_eliminated {
            self.first_player_eliminated = true;
            player.score = player.score.saturating_sub(FIRST_ELIMINATION_PENALTY);
        }
        self.events.push(RoundEvent::PlayerEliminated { player: id });
    }

    fn check_round_end(&mut self) {
        if self.game_ending {
            return;
        }
        let outcome = if self.players.iter().all(|player| !player.active) {
            RoundOutcome::Lost
        } else if self.dots.all_collected() {
            RoundOutcome::Won
        } else {
            return;
        };

        self.game_ending = true;
        self.running = false;
        self.outcome = Some(outcome);
        self.events.push(match outcome {
            RoundOutcome::Won => RoundEvent::RoundWon,
            RoundOutcome::Lost => RoundEvent::RoundLost,
        });
    }
}

/// Buffered input first, then the current heading, then the last committed
/// direction. Committing the buffer clears it.
fn resolve_player_direction(
    player: &mut Player,
    walkable: &impl Fn(Vec2) -> bool,
) -> Option<Direction> {
    if let Some(dir) = player.buffered {
        if can_enter(&player.actor, dir, walkable) {
            player.buffered = None;
            player.actor.desired = Some(dir);
            return Some(dir);
        }
    }
    let facing = player.actor.facing;
    if can_enter(&player.actor, facing, walkable) {
        return Some(facing);
    }
    player
        .actor
        .desired
        .filter(|dir| can_enter(&player.actor, *dir, walkable))
}

/// Open, unclaimed neighbours. While the cooldown runs the reverse of the
/// current facing is dropped unless it is the only way out.
fn ghost_valid_directions(ghost: &Ghost, walkable: &impl Fn(Vec2) -> bool) -> Vec<Direction> {
    let open: Vec<Direction> = Direction::ALL
        .into_iter()
        .filter(|dir| can_enter(&ghost.actor, *dir, walkable))
        .collect();
    let reverse = ghost.actor.facing.opposite();
    if ghost.direction_cooldown > 0 && open.iter().any(|dir| *dir != reverse) {
        return open.into_iter().filter(|dir| *dir != reverse).collect();
    }
    open
}
