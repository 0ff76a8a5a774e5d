use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Fixed enumeration order used wherever directions are scanned.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Vec2 {
    pub x: i32,
    pub y: i32,
}

impl Vec2 {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dir: Direction) -> Self {
        let (dx, dy) = dir.delta();
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub fn manhattan(self, other: Vec2) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum PlayerId {
    #[serde(rename = "p1")]
    One,
    #[serde(rename = "p2")]
    Two,
}

impl PlayerId {
    pub const ALL: [PlayerId; 2] = [PlayerId::One, PlayerId::Two];

    pub fn index(self) -> usize {
        match self {
            Self::One => 0,
            Self::Two => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostColor {
    Red,
    Pink,
    Cyan,
    Orange,
}

impl GhostColor {
    /// Ghost evaluation order within a tick.
    pub const ALL: [GhostColor; 4] = [
        GhostColor::Red,
        GhostColor::Pink,
        GhostColor::Cyan,
        GhostColor::Orange,
    ];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DotTier {
    Normal,
    Power,
    SuperPower,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundOutcome {
    Won,
    Lost,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayerInput {
    pub player: PlayerId,
    pub direction: Direction,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoundEvent {
    DotCollected {
        player: PlayerId,
        tier: DotTier,
        x: i32,
        y: i32,
    },
    PlayerMoved {
        player: PlayerId,
        direction: Direction,
    },
    GhostMoved {
        ghost: GhostColor,
        direction: Direction,
    },
    PlayerHurt {
        player: PlayerId,
    },
    PlayerEliminated {
        player: PlayerId,
    },
    GhostEaten {
        ghost: GhostColor,
        by: PlayerId,
    },
    RoundWon,
    RoundLost,
}

#[derive(Clone, Debug, Serialize)]
pub struct HudLine {
    pub player: PlayerId,
    pub score: u32,
    pub lives: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub x: i32,
    pub y: i32,
    #[serde(rename = "pixelX")]
    pub pixel_x: f32,
    #[serde(rename = "pixelY")]
    pub pixel_y: f32,
    pub dir: Direction,
    pub active: bool,
    #[serde(rename = "powerMode")]
    pub power_mode: bool,
    #[serde(rename = "superPowerMode")]
    pub super_power_mode: bool,
    #[serde(rename = "mouthOpen")]
    pub mouth_open: bool,
    pub score: u32,
    pub lives: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct GhostView {
    pub color: GhostColor,
    pub x: i32,
    pub y: i32,
    #[serde(rename = "pixelX")]
    pub pixel_x: f32,
    #[serde(rename = "pixelY")]
    pub pixel_y: f32,
    pub dir: Direction,
}

#[derive(Clone, Debug, Serialize)]
pub struct DotView {
    pub x: i32,
    pub y: i32,
    pub tier: DotTier,
}

#[derive(Clone, Debug, Serialize)]
pub struct RoundSnapshot {
    pub tick: u64,
    pub running: bool,
    pub outcome: Option<RoundOutcome>,
    pub players: Vec<PlayerView>,
    pub ghosts: Vec<GhostView>,
    pub dots: Vec<DotView>,
}
