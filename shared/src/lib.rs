//! Wire protocol and board model shared by the snake server and client.
//!
//! The transport carries UTF-8 JSON text frames, internally tagged by a
//! `type` field. Everything the client renders comes out of [`Snapshot`],
//! which the server emits once per simulation tick.

use serde::{Deserialize, Serialize};

/// Board width in pixels. All positions are multiples of [`SQUARE_SIZE`].
pub const BOARD_WIDTH: i32 = 800;
/// Board height in pixels.
pub const BOARD_HEIGHT: i32 = 600;
/// Grid cell size; snake heads advance one cell per move.
pub const SQUARE_SIZE: i32 = 20;

/// Authoritative simulation ticks per second.
pub const TICK_RATE: u32 = 8;
/// Every bonus effect runs for seven seconds of ticks.
pub const EFFECT_DURATION_TICKS: u32 = TICK_RATE * 7;
/// Per-tick probability of spawning a bonus.
pub const BONUS_SPAWN_CHANCE: f64 = 0.02;
/// Maximum number of simultaneous bonuses on the board.
pub const MAX_BONUSES: usize = 3;

/// RGB color triple, serialized as a JSON array `[r, g, b]`.
pub type Color = (u8, u8, u8);

pub const FOOD_COLOR: Color = (255, 0, 0);
/// Fixed snake colors, slot order 1 then 2.
pub const SNAKE_COLORS: [Color; 2] = [(0, 200, 0), (0, 0, 200)];

/// Canonical direction tokens carried in input messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// Parses one of the four canonical wire tokens.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "LEFT" => Some(Direction::Left),
            "RIGHT" => Some(Direction::Right),
            "UP" => Some(Direction::Up),
            "DOWN" => Some(Direction::Down),
            _ => None,
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            Direction::Left => "LEFT",
            Direction::Right => "RIGHT",
            Direction::Up => "UP",
            Direction::Down => "DOWN",
        }
    }

    /// The opposite direction, used while REVERSE is active.
    pub fn inverted(self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }

    /// Velocity in pixels per move for this heading.
    pub fn velocity(self) -> (i32, i32) {
        match self {
            Direction::Left => (-SQUARE_SIZE, 0),
            Direction::Right => (SQUARE_SIZE, 0),
            Direction::Up => (0, -SQUARE_SIZE),
            Direction::Down => (0, SQUARE_SIZE),
        }
    }
}

/// The seven bonus effect kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BonusKind {
    Turtle,
    Turbo,
    Reverse,
    Ghost,
    Mirror,
    Grow,
    Shrink,
}

impl BonusKind {
    pub const ALL: [BonusKind; 7] = [
        BonusKind::Turtle,
        BonusKind::Turbo,
        BonusKind::Reverse,
        BonusKind::Ghost,
        BonusKind::Mirror,
        BonusKind::Grow,
        BonusKind::Shrink,
    ];

    /// Fixed palette, one color per kind.
    pub fn color(self) -> Color {
        match self {
            BonusKind::Turtle => (0, 200, 0),
            BonusKind::Turbo => (255, 215, 0),
            BonusKind::Reverse => (255, 0, 255),
            BonusKind::Ghost => (255, 255, 255),
            BonusKind::Mirror => (0, 255, 255),
            BonusKind::Grow => (255, 165, 0),
            BonusKind::Shrink => (150, 0, 255),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BonusKind::Turtle => "TURTLE",
            BonusKind::Turbo => "TURBO",
            BonusKind::Reverse => "REVERSE",
            BonusKind::Ghost => "GHOST",
            BonusKind::Mirror => "MIRROR",
            BonusKind::Grow => "GROW",
            BonusKind::Shrink => "SHRINK",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodView {
    pub x: i32,
    pub y: i32,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusView {
    pub x: i32,
    pub y: i32,
    #[serde(rename = "type")]
    pub kind: BonusKind,
    pub color: Color,
}

/// Per-snake slice of a snapshot. `timer` counts remaining effect ticks;
/// `speed` is the TURBO move multiplier the HUD displays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnakeView {
    pub x: i32,
    pub y: i32,
    pub tail: Vec<(i32, i32)>,
    pub color: Color,
    pub bonus: Option<BonusKind>,
    pub timer: u32,
    pub speed: u32,
    pub ghost: bool,
    pub mirror: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardMeta {
    pub width: i32,
    pub height: i32,
    pub square: i32,
}

/// Fully-serialized visible state of a round, broadcast once per tick.
/// `snakes` always holds two entries in slot order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub running: bool,
    pub food: FoodView,
    pub bonuses: Vec<BonusView>,
    pub snakes: Vec<SnakeView>,
    pub meta: BoardMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputEvent {
    pub key: String,
}

/// Messages the server sends to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    /// Both slots taken; the connection is closed right after this.
    Full,
    /// Slot assignment, sent once on acceptance.
    Welcome { player: u8 },
    /// Per-tick state snapshot.
    State { data: Snapshot },
}

/// Messages a client sends to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    Input { data: InputEvent },
    Reset,
}
