use crate::constants::TILE_SIZE;
use crate::types::{Direction, Vec2};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PixelPos {
    pub x: f32,
    pub y: f32,
}

impl PixelPos {
    pub fn of_tile(tile: Vec2) -> Self {
        Self {
            x: tile.x as f32 * TILE_SIZE,
            y: tile.y as f32 * TILE_SIZE,
        }
    }
}

/// Movement state shared by players and ghosts. `tile` is the departed tile
/// until the actor arrives; `pixel` equals the tile origin whenever idle.
#[derive(Clone, Debug, PartialEq)]
pub struct Actor {
    pub tile: Vec2,
    pub pixel: PixelPos,
    pub facing: Direction,
    pub desired: Option<Direction>,
    pub moving: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MotionStep {
    pub started: bool,
    pub arrived: bool,
    pub aborted: bool,
}

impl Actor {
    pub fn new(tile: Vec2, facing: Direction) -> Self {
        Self {
            tile,
            pixel: PixelPos::of_tile(tile),
            facing,
            desired: None,
            moving: false,
        }
    }

    pub fn snap_to_tile(&mut self) {
        self.pixel = PixelPos::of_tile(self.tile);
    }

    /// Places the actor on `tile` at rest.
    pub fn teleport(&mut self, tile: Vec2, facing: Direction) {
        self.tile = tile;
        self.facing = facing;
        self.moving = false;
        self.snap_to_tile();
    }

    /// Tile the actor is heading into, while moving.
    pub fn target(&self) -> Option<Vec2> {
        self.moving.then(|| self.tile.offset(self.facing))
    }

    fn reached(&self, target: Vec2) -> bool {
        let goal = PixelPos::of_tile(target);
        match self.facing {
            Direction::Up => self.pixel.y <= goal.y,
            Direction::Down => self.pixel.y >= goal.y,
            Direction::Left => self.pixel.x <= goal.x,
            Direction::Right => self.pixel.x >= goal.x,
        }
    }
}

pub fn can_enter(actor: &Actor, dir: Direction, walkable: impl Fn(Vec2) -> bool) -> bool {
    walkable(actor.tile.offset(dir))
}

/// Advances one tick. An idle actor starts toward `requested` when that tile is
/// walkable; a moving actor ignores `requested` and re-checks its target, so a
/// target that became blocked aborts the step and snaps back.
pub fn advance_actor(
    actor: &mut Actor,
    requested: Option<Direction>,
    speed: f32,
    walkable: impl Fn(Vec2) -> bool,
) -> MotionStep {
    let mut step = MotionStep::default();

    if !actor.moving {
        let Some(dir) = requested else {
            return step;
        };
        if !can_enter(actor, dir, &walkable) {
            return step;
        }
        actor.facing = dir;
        actor.moving = true;
        step.started = true;
    }

    let target = actor.tile.offset(actor.facing);
    if !walkable(target) {
        actor.moving = false;
        actor.snap_to_tile();
        step.aborted = true;
        return step;
    }

    let (dx, dy) = actor.facing.delta();
    actor.pixel.x += dx as f32 * speed;
    actor.pixel.y += dy as f32 * speed;
    if actor.reached(target) {
        actor.tile = target;
        actor.moving = false;
        actor.snap_to_tile();
        step.arrived = true;
    }
    step
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_everywhere(_: Vec2) -> bool {
        true
    }

    fn ticks_to_arrive(speed: f32) -> usize {
        let mut actor = Actor::new(Vec2::new(3, 3), Direction::Right);
        let mut ticks = 0;
        loop {
            ticks += 1;
            let step = advance_actor(&mut actor, Some(Direction::Right), speed, open_everywhere);
            if step.arrived {
                return ticks;
            }
            assert!(ticks < 100, "actor never arrived");
        }
    }

    #[test]
    fn arrival_tick_count_follows_speed() {
        assert_eq!(ticks_to_arrive(2.0), 10);
        assert_eq!(ticks_to_arrive(2.5), 8);
        assert_eq!(ticks_to_arrive(1.5), 14);
    }

    #[test]
    fn idle_actor_without_walkable_request_stays_put() {
        let mut actor = Actor::new(Vec2::new(2, 2), Direction::Left);
        let step = advance_actor(&mut actor, None, 2.0, open_everywhere);
        assert_eq!(step, MotionStep::default());

        let step = advance_actor(&mut actor, Some(Direction::Up), 2.0, |_| false);
        assert_eq!(step, MotionStep::default());
        assert!(!actor.moving);
        assert_eq!(actor.facing, Direction::Left);
        assert_eq!(actor.pixel, PixelPos::of_tile(Vec2::new(2, 2)));
    }

    #[test]
    fn moving_actor_ignores_new_requests() {
        let mut actor = Actor::new(Vec2::new(2, 2), Direction::Left);
        advance_actor(&mut actor, Some(Direction::Down), 2.0, open_everywhere);
        advance_actor(&mut actor, Some(Direction::Up), 2.0, open_everywhere);
        assert_eq!(actor.facing, Direction::Down);
        assert_eq!(actor.target(), Some(Vec2::new(2, 3)));
        assert_eq!(actor.pixel.y, 2.0 * TILE_SIZE + 4.0);
    }

    #[test]
    fn blocked_target_aborts_and_snaps_back() {
        let mut actor = Actor::new(Vec2::new(4, 4), Direction::Up);
        let step = advance_actor(&mut actor, Some(Direction::Up), 1.5, open_everywhere);
        assert!(step.started);
        assert!(actor.pixel.y < 4.0 * TILE_SIZE);

        let blocked = Vec2::new(4, 3);
        let step = advance_actor(&mut actor, None, 1.5, |pos| pos != blocked);
        assert!(step.aborted);
        assert!(!actor.moving);
        assert_eq!(actor.tile, Vec2::new(4, 4));
        assert_eq!(actor.pixel, PixelPos::of_tile(Vec2::new(4, 4)));
    }

    #[test]
    fn teleport_resets_motion() {
        let mut actor = Actor::new(Vec2::new(1, 1), Direction::Right);
        advance_actor(&mut actor, Some(Direction::Right), 2.0, open_everywhere);
        actor.teleport(Vec2::new(10, 8), Direction::Up);
        assert!(!actor.moving);
        assert_eq!(actor.target(), None);
        assert_eq!(actor.pixel, PixelPos::of_tile(Vec2::new(10, 8)));
    }
}
