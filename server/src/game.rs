//! Authoritative snake simulation: grid movement, pickups, bonus effects,
//! and collision/elimination rules, advanced one fixed tick at a time.

use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{
    BoardMeta, BonusKind, BonusView, Color, Direction, FoodView, Snapshot, SnakeView,
    BOARD_HEIGHT, BOARD_WIDTH, BONUS_SPAWN_CHANCE, EFFECT_DURATION_TICKS, FOOD_COLOR, MAX_BONUSES,
    SNAKE_COLORS, SQUARE_SIZE,
};

/// Number of player slots in a round.
pub const SLOT_COUNT: usize = 2;

/// A bonus effect currently applied to a snake. Snakes carry at most one;
/// picking up a new bonus replaces it and restarts the timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveEffect {
    pub kind: BonusKind,
    pub ticks_left: u32,
}

#[derive(Debug, Clone)]
pub struct Snake {
    pub x: i32,
    pub y: i32,
    pub dx: i32,
    pub dy: i32,
    /// Past head cells, most recent first, truncated to `length`.
    pub tail: Vec<(i32, i32)>,
    pub length: usize,
    pub color: Color,
    pub effect: Option<ActiveEffect>,
}

impl Snake {
    fn new(x: i32, y: i32, color: Color) -> Self {
        Self {
            x,
            y,
            dx: 0,
            dy: 0,
            tail: Vec::new(),
            length: 1,
            color,
            effect: None,
        }
    }

    pub fn head(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    /// Sub-moves this snake makes on the given tick: TURBO doubles,
    /// TURTLE moves only on even ticks.
    pub fn moves_per_tick(&self, tick: u64) -> u32 {
        match self.effect {
            Some(ActiveEffect {
                kind: BonusKind::Turbo,
                ..
            }) => 2,
            Some(ActiveEffect {
                kind: BonusKind::Turtle,
                ..
            }) => {
                if tick % 2 == 0 {
                    1
                } else {
                    0
                }
            }
            _ => 1,
        }
    }

    pub fn is_ghost(&self) -> bool {
        matches!(
            self.effect,
            Some(ActiveEffect {
                kind: BonusKind::Ghost,
                ..
            })
        )
    }

    pub fn is_mirrored(&self) -> bool {
        matches!(
            self.effect,
            Some(ActiveEffect {
                kind: BonusKind::Mirror,
                ..
            })
        )
    }

    pub fn input_reversed(&self) -> bool {
        matches!(
            self.effect,
            Some(ActiveEffect {
                kind: BonusKind::Reverse,
                ..
            })
        )
    }

    /// Applies a bonus: instantaneous length changes happen immediately,
    /// and the shared effect timer restarts at the full duration.
    pub fn apply_effect(&mut self, kind: BonusKind) {
        match kind {
            BonusKind::Grow => self.length += 3,
            BonusKind::Shrink => self.length = self.length.saturating_sub(3).max(1),
            _ => {}
        }
        self.effect = Some(ActiveEffect {
            kind,
            ticks_left: EFFECT_DURATION_TICKS,
        });
    }

    /// One sub-move: record the head in the trail, then advance with
    /// toroidal wraparound on each axis.
    fn advance(&mut self) {
        self.tail.insert(0, (self.x, self.y));
        self.tail.truncate(self.length);
        self.x = (self.x + self.dx).rem_euclid(BOARD_WIDTH);
        self.y = (self.y + self.dy).rem_euclid(BOARD_HEIGHT);
    }

    fn view(&self) -> SnakeView {
        let (bonus, timer) = match &self.effect {
            Some(effect) => (Some(effect.kind), effect.ticks_left),
            None => (None, 0),
        };
        SnakeView {
            x: self.x,
            y: self.y,
            tail: self.tail.clone(),
            color: self.color,
            bonus,
            timer,
            speed: if matches!(bonus, Some(BonusKind::Turbo)) {
                2
            } else {
                1
            },
            ghost: self.is_ghost(),
            mirror: self.is_mirrored(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Bonus {
    pub x: i32,
    pub y: i32,
    pub kind: BonusKind,
}

/// One round of the game: two snakes, one food, up to three bonuses, and a
/// sticky `running` flag. The round owns its RNG so tests can seed it.
#[derive(Debug)]
pub struct Round {
    pub tick: u64,
    pub running: bool,
    pub snakes: [Snake; SLOT_COUNT],
    pub food: (i32, i32),
    pub bonuses: Vec<Bonus>,
    rng: StdRng,
}

impl Round {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic round for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        let snakes = [
            Snake::new(BOARD_WIDTH / 2, BOARD_HEIGHT / 2, SNAKE_COLORS[0]),
            Snake::new(BOARD_WIDTH / 4, BOARD_HEIGHT / 2, SNAKE_COLORS[1]),
        ];
        let mut round = Self {
            tick: 0,
            running: true,
            snakes,
            // Off-board sentinel until the free-cell sampler places it.
            food: (-SQUARE_SIZE, -SQUARE_SIZE),
            bonuses: Vec::new(),
            rng,
        };
        round.food = round.random_free_cell();
        round
    }

    /// Applies a queued direction token to one snake's heading. Unknown
    /// tokens are ignored; a turn is only honored onto the axis whose
    /// velocity component is currently zero, which both rejects 180-degree
    /// reversals and accepts any direction before the first move.
    pub fn apply_input(&mut self, slot: usize, token: &str) {
        let Some(direction) = direction_for_slot(slot, token) else {
            return;
        };
        let snake = &mut self.snakes[slot];
        let direction = if snake.input_reversed() {
            direction.inverted()
        } else {
            direction
        };
        match direction {
            Direction::Left | Direction::Right if snake.dx == 0 => {
                (snake.dx, snake.dy) = direction.velocity();
            }
            Direction::Up | Direction::Down if snake.dy == 0 => {
                (snake.dx, snake.dy) = direction.velocity();
            }
            _ => {}
        }
    }

    /// Advances the round by one tick. The phase order is load-bearing:
    /// movement, food pickup, bonus pickup, effect expiry, collision,
    /// bonus spawn. A round that is no longer running never advances.
    pub fn step(&mut self) {
        if !self.running {
            return;
        }
        self.tick += 1;

        for slot in 0..SLOT_COUNT {
            let moves = self.snakes[slot].moves_per_tick(self.tick);
            for _ in 0..moves {
                self.snakes[slot].advance();
            }
        }

        for slot in 0..SLOT_COUNT {
            if self.snakes[slot].head() == self.food {
                self.snakes[slot].length += 1;
                self.food = self.random_free_cell();
            }
        }

        // Snake-major, bonus-minor: a contested bonus goes to the lower slot.
        for slot in 0..SLOT_COUNT {
            let head = self.snakes[slot].head();
            if let Some(index) = self.bonuses.iter().position(|b| (b.x, b.y) == head) {
                let bonus = self.bonuses.remove(index);
                info!("player {} picked up {}", slot + 1, bonus.kind.name());
                self.snakes[slot].apply_effect(bonus.kind);
            }
        }

        for snake in &mut self.snakes {
            if let Some(effect) = &mut snake.effect {
                effect.ticks_left -= 1;
                if effect.ticks_left == 0 {
                    snake.effect = None;
                }
            }
        }

        if self.detect_collision() {
            self.running = false;
            info!("collision at tick {}, round over", self.tick);
        }

        self.spawn_bonus();
    }

    /// Trail and head-on checks against post-movement positions. GHOST
    /// snakes skip their own checks; a head-on collision only counts when
    /// neither snake is GHOST.
    fn detect_collision(&self) -> bool {
        for slot in 0..SLOT_COUNT {
            let snake = &self.snakes[slot];
            if snake.is_ghost() {
                continue;
            }
            let head = snake.head();
            // The just-pushed entry is the cell the head left this tick.
            let own_hit = snake.tail.iter().skip(1).any(|&cell| cell == head);
            let other = &self.snakes[SLOT_COUNT - 1 - slot];
            let cross_hit = other.tail.iter().any(|&cell| cell == head);
            if own_hit || cross_hit {
                return true;
            }
        }

        self.snakes[0].head() == self.snakes[1].head()
            && !self.snakes[0].is_ghost()
            && !self.snakes[1].is_ghost()
    }

    fn spawn_bonus(&mut self) {
        if self.rng.gen_bool(BONUS_SPAWN_CHANCE) && self.bonuses.len() < MAX_BONUSES {
            let (x, y) = self.random_free_cell();
            let kind = BonusKind::ALL[self.rng.gen_range(0..BonusKind::ALL.len())];
            self.bonuses.push(Bonus { x, y, kind });
        }
    }

    /// Uniformly samples a grid cell not covered by a snake, the food, or
    /// an existing bonus. Falls back to the last sample if the board is
    /// pathologically full.
    fn random_free_cell(&mut self) -> (i32, i32) {
        let cols = BOARD_WIDTH / SQUARE_SIZE;
        let rows = BOARD_HEIGHT / SQUARE_SIZE;
        let mut cell = (0, 0);
        for _ in 0..1024 {
            cell = (
                self.rng.gen_range(0..cols) * SQUARE_SIZE,
                self.rng.gen_range(0..rows) * SQUARE_SIZE,
            );
            if !self.is_occupied(cell) {
                return cell;
            }
        }
        cell
    }

    fn is_occupied(&self, cell: (i32, i32)) -> bool {
        self.snakes
            .iter()
            .any(|s| s.head() == cell || s.tail.contains(&cell))
            || self.food == cell
            || self.bonuses.iter().any(|b| (b.x, b.y) == cell)
    }

    /// Serializes the full visible state for broadcast.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            running: self.running,
            food: FoodView {
                x: self.food.0,
                y: self.food.1,
                color: FOOD_COLOR,
            },
            bonuses: self
                .bonuses
                .iter()
                .map(|b| BonusView {
                    x: b.x,
                    y: b.y,
                    kind: b.kind,
                    color: b.kind.color(),
                })
                .collect(),
            snakes: self.snakes.iter().map(Snake::view).collect(),
            meta: BoardMeta {
                width: BOARD_WIDTH,
                height: BOARD_HEIGHT,
                square: SQUARE_SIZE,
            },
        }
    }
}

impl Default for Round {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves a wire token to a direction for the given slot. Slot 2 accepts
/// the legacy A/D/W/S key set through a fixed remap; canonical tokens pass
/// through unchanged on both slots.
fn direction_for_slot(slot: usize, token: &str) -> Option<Direction> {
    if slot == 1 {
        match token {
            "A" => Some(Direction::Left),
            "D" => Some(Direction::Right),
            "W" => Some(Direction::Up),
            "S" => Some(Direction::Down),
            _ => Direction::from_token(token),
        }
    } else {
        Direction::from_token(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_round() -> Round {
        Round::with_seed(7)
    }

    #[test]
    fn round_starts_stationary_at_fixed_positions() {
        let round = test_round();
        assert!(round.running);
        assert_eq!(round.tick, 0);
        assert_eq!(round.snakes[0].head(), (400, 300));
        assert_eq!(round.snakes[1].head(), (200, 300));
        for snake in &round.snakes {
            assert_eq!((snake.dx, snake.dy), (0, 0));
            assert_eq!(snake.length, 1);
            assert!(snake.tail.is_empty());
            assert!(snake.effect.is_none());
        }
        assert!(round.bonuses.is_empty());
    }

    #[test]
    fn food_spawns_on_a_free_grid_cell() {
        let round = test_round();
        let (fx, fy) = round.food;
        assert!(fx >= 0 && fx < BOARD_WIDTH);
        assert!(fy >= 0 && fy < BOARD_HEIGHT);
        assert_eq!(fx % SQUARE_SIZE, 0);
        assert_eq!(fy % SQUARE_SIZE, 0);
        assert_ne!((fx, fy), round.snakes[0].head());
        assert_ne!((fx, fy), round.snakes[1].head());
    }

    #[test]
    fn first_input_starts_motion_in_any_direction() {
        let mut round = test_round();
        round.apply_input(0, "UP");
        assert_eq!((round.snakes[0].dx, round.snakes[0].dy), (0, -SQUARE_SIZE));

        round.step();
        assert_eq!(round.snakes[0].head(), (400, 280));
        assert_eq!(round.snakes[0].tail, vec![(400, 300)]);
        assert_eq!(round.snakes[0].length, 1);
    }

    #[test]
    fn parallel_and_reverse_turns_are_rejected() {
        let mut round = test_round();
        round.apply_input(0, "RIGHT");
        assert_eq!((round.snakes[0].dx, round.snakes[0].dy), (SQUARE_SIZE, 0));

        // Same axis, both senses: no-ops.
        round.apply_input(0, "RIGHT");
        assert_eq!((round.snakes[0].dx, round.snakes[0].dy), (SQUARE_SIZE, 0));
        round.apply_input(0, "LEFT");
        assert_eq!((round.snakes[0].dx, round.snakes[0].dy), (SQUARE_SIZE, 0));

        // Perpendicular turn accepted.
        round.apply_input(0, "UP");
        assert_eq!((round.snakes[0].dx, round.snakes[0].dy), (0, -SQUARE_SIZE));
    }

    #[test]
    fn unknown_tokens_are_ignored() {
        let mut round = test_round();
        round.apply_input(0, "JUMP");
        round.apply_input(0, "");
        round.apply_input(0, "left");
        assert_eq!((round.snakes[0].dx, round.snakes[0].dy), (0, 0));
    }

    #[test]
    fn head_wraps_around_both_axes() {
        let mut round = test_round();
        round.snakes[0].x = BOARD_WIDTH - SQUARE_SIZE;
        round.apply_input(0, "RIGHT");
        round.step();
        assert_eq!(round.snakes[0].x, 0);

        let mut round = test_round();
        round.snakes[0].y = 0;
        round.apply_input(0, "UP");
        round.step();
        assert_eq!(round.snakes[0].y, BOARD_HEIGHT - SQUARE_SIZE);
    }

    #[test]
    fn trail_length_tracks_min_of_ticks_and_length() {
        let mut round = test_round();
        round.snakes[0].length = 3;
        round.apply_input(0, "RIGHT");
        for ticks in 1..=5 {
            round.step();
            assert!(round.running, "snake should not self-collide while moving");
            assert_eq!(round.snakes[0].tail.len(), ticks.min(3));
        }
    }

    #[test]
    fn food_pickup_grows_snake_and_relocates_food() {
        let mut round = test_round();
        round.food = (420, 300);
        round.apply_input(0, "RIGHT");
        round.step();

        assert_eq!(round.snakes[0].head(), (420, 300));
        assert_eq!(round.snakes[0].length, 2);
        assert_ne!(round.food, (420, 300));
        assert!(!round.is_occupied(round.food));
    }

    #[test]
    fn food_untouched_without_pickup() {
        let mut round = test_round();
        let food = round.food;
        for _ in 0..20 {
            round.step();
        }
        assert_eq!(round.food, food);
        assert_eq!(round.snakes[0].length, 1);
        assert_eq!(round.snakes[1].length, 1);
    }

    #[test]
    fn grow_and_shrink_change_length_immediately() {
        let mut round = test_round();
        round.snakes[0].apply_effect(BonusKind::Grow);
        assert_eq!(round.snakes[0].length, 4);

        round.snakes[0].apply_effect(BonusKind::Shrink);
        assert_eq!(round.snakes[0].length, 1);

        // Shrink never drops below one cell.
        round.snakes[0].apply_effect(BonusKind::Shrink);
        assert_eq!(round.snakes[0].length, 1);
    }

    #[test]
    fn new_effect_replaces_old_and_restarts_timer() {
        let mut round = test_round();
        round.snakes[0].apply_effect(BonusKind::Ghost);
        round.snakes[0].effect.as_mut().unwrap().ticks_left = 5;

        round.snakes[0].apply_effect(BonusKind::Turbo);
        let effect = round.snakes[0].effect.as_ref().unwrap();
        assert_eq!(effect.kind, BonusKind::Turbo);
        assert_eq!(effect.ticks_left, EFFECT_DURATION_TICKS);
    }

    #[test]
    fn effect_expires_after_its_duration() {
        let mut round = test_round();
        // Off the shared row so the long run never meets the other snake.
        round.snakes[0].y = 100;
        round.apply_input(0, "RIGHT");
        round.snakes[0].apply_effect(BonusKind::Ghost);
        for _ in 0..EFFECT_DURATION_TICKS - 1 {
            round.step();
            assert!(round.snakes[0].effect.is_some());
        }
        round.step();
        assert!(round.snakes[0].effect.is_none());
    }

    #[test]
    fn turbo_moves_twice_per_tick() {
        let mut round = test_round();
        round.apply_input(0, "RIGHT");
        round.snakes[0].apply_effect(BonusKind::Turbo);
        round.step();
        assert_eq!(round.snakes[0].head(), (440, 300));
        // Only the latest sub-move survives in a length-1 trail.
        assert_eq!(round.snakes[0].tail, vec![(420, 300)]);
    }

    #[test]
    fn turtle_moves_on_even_ticks_only() {
        let mut round = test_round();
        round.apply_input(0, "RIGHT");
        round.snakes[0].apply_effect(BonusKind::Turtle);

        round.step(); // tick 1, odd: no move
        assert_eq!(round.snakes[0].head(), (400, 300));
        round.step(); // tick 2, even: one move
        assert_eq!(round.snakes[0].head(), (420, 300));
    }

    #[test]
    fn reverse_inverts_incoming_directions() {
        let mut round = test_round();
        round.snakes[0].apply_effect(BonusKind::Reverse);
        round.apply_input(0, "LEFT");
        assert_eq!((round.snakes[0].dx, round.snakes[0].dy), (SQUARE_SIZE, 0));
    }

    #[test]
    fn slot_two_accepts_legacy_and_canonical_tokens() {
        let mut round = test_round();
        round.apply_input(1, "A");
        assert_eq!((round.snakes[1].dx, round.snakes[1].dy), (-SQUARE_SIZE, 0));

        let mut round = test_round();
        round.apply_input(1, "DOWN");
        assert_eq!((round.snakes[1].dx, round.snakes[1].dy), (0, SQUARE_SIZE));

        // Slot 1 does not get the legacy remap.
        let mut round = test_round();
        round.apply_input(0, "A");
        assert_eq!((round.snakes[0].dx, round.snakes[0].dy), (0, 0));
    }

    #[test]
    fn slot_two_legacy_key_passes_through_reverse() {
        let mut round = test_round();
        round.snakes[1].apply_effect(BonusKind::Reverse);
        // "A" maps to LEFT, then REVERSE inverts it to RIGHT.
        round.apply_input(1, "A");
        assert_eq!((round.snakes[1].dx, round.snakes[1].dy), (SQUARE_SIZE, 0));
    }

    #[test]
    fn self_collision_stops_the_round() {
        let mut round = test_round();
        round.snakes[0].length = 3;
        round.snakes[0].tail = vec![(420, 300), (400, 300)];
        round.apply_input(0, "RIGHT");
        round.step();
        assert!(!round.running);
    }

    #[test]
    fn cross_collision_stops_the_round() {
        let mut round = test_round();
        round.snakes[1].tail = vec![(420, 300)];
        round.snakes[1].length = 1;
        round.apply_input(0, "RIGHT");
        round.step();
        assert!(!round.running);
    }

    #[test]
    fn head_on_collision_stops_the_round() {
        let mut round = test_round();
        round.snakes[0].x = 380;
        round.snakes[1].x = 420;
        round.apply_input(0, "RIGHT");
        round.apply_input(1, "LEFT");
        round.step();
        assert_eq!(round.snakes[0].head(), round.snakes[1].head());
        assert!(!round.running);
    }

    #[test]
    fn ghost_bypasses_collision_checks() {
        let mut round = test_round();
        round.snakes[0].length = 3;
        round.snakes[0].tail = vec![(420, 300), (400, 300)];
        round.snakes[0].apply_effect(BonusKind::Ghost);
        round.apply_input(0, "RIGHT");
        round.step();
        assert!(round.running);
    }

    #[test]
    fn head_on_with_one_ghost_is_survivable() {
        let mut round = test_round();
        round.snakes[0].x = 380;
        round.snakes[1].x = 420;
        round.snakes[0].apply_effect(BonusKind::Ghost);
        round.apply_input(0, "RIGHT");
        round.apply_input(1, "LEFT");
        round.step();
        assert_eq!(round.snakes[0].head(), round.snakes[1].head());
        assert!(round.running);
    }

    #[test]
    fn frozen_round_never_advances() {
        let mut round = test_round();
        round.snakes[0].length = 3;
        round.snakes[0].tail = vec![(420, 300), (400, 300)];
        round.apply_input(0, "RIGHT");
        round.step();
        assert!(!round.running);

        let tick = round.tick;
        let head = round.snakes[0].head();
        let tail = round.snakes[0].tail.clone();
        let length = round.snakes[0].length;
        for _ in 0..5 {
            round.step();
        }
        assert_eq!(round.tick, tick);
        assert_eq!(round.snakes[0].head(), head);
        assert_eq!(round.snakes[0].tail, tail);
        assert_eq!(round.snakes[0].length, length);
    }

    #[test]
    fn contested_bonus_goes_to_slot_one() {
        let mut round = test_round();
        round.snakes[0].x = 380;
        round.snakes[1].x = 420;
        round.bonuses.push(Bonus {
            x: 400,
            y: 300,
            kind: BonusKind::Ghost,
        });
        round.apply_input(0, "RIGHT");
        round.apply_input(1, "LEFT");
        round.step();

        // Both heads land on the bonus cell; slot 1 claims it first. The
        // GHOST it grants also defuses the head-on collision.
        assert!(round.bonuses.is_empty());
        assert_eq!(
            round.snakes[0].effect.as_ref().map(|e| e.kind),
            Some(BonusKind::Ghost)
        );
        assert!(round.snakes[1].effect.is_none());
        assert!(round.running);
    }

    #[test]
    fn bonus_pickup_applies_and_consumes_bonus() {
        let mut round = test_round();
        round.bonuses.push(Bonus {
            x: 420,
            y: 300,
            kind: BonusKind::Turbo,
        });
        round.apply_input(0, "RIGHT");
        round.step();

        assert!(round.bonuses.is_empty());
        let effect = round.snakes[0].effect.as_ref().unwrap();
        assert_eq!(effect.kind, BonusKind::Turbo);
        // Expiry already decremented once on the pickup tick.
        assert_eq!(effect.ticks_left, EFFECT_DURATION_TICKS - 1);
    }

    #[test]
    fn bonus_population_stays_under_cap() {
        let mut round = test_round();
        let mut seen = 0usize;
        for _ in 0..2000 {
            round.step();
            assert!(round.bonuses.len() <= MAX_BONUSES);
            seen = seen.max(round.bonuses.len());
        }
        assert!(seen > 0, "expected at least one bonus spawn in 2000 ticks");
        for bonus in &round.bonuses {
            assert_eq!(bonus.x % SQUARE_SIZE, 0);
            assert_eq!(bonus.y % SQUARE_SIZE, 0);
        }
    }

    #[test]
    fn snapshot_reflects_round_state() {
        let mut round = test_round();
        round.apply_input(0, "RIGHT");
        round.snakes[0].apply_effect(BonusKind::Turbo);
        round.step();

        let snapshot = round.snapshot();
        assert!(snapshot.running);
        assert_eq!(snapshot.snakes.len(), SLOT_COUNT);
        assert_eq!(snapshot.snakes[0].x, round.snakes[0].x);
        assert_eq!(snapshot.snakes[0].bonus, Some(BonusKind::Turbo));
        assert_eq!(snapshot.snakes[0].speed, 2);
        assert!(!snapshot.snakes[0].ghost);
        assert_eq!(snapshot.snakes[1].speed, 1);
        assert_eq!(snapshot.food.x, round.food.0);
        assert_eq!(snapshot.meta.width, BOARD_WIDTH);
        assert_eq!(snapshot.meta.square, SQUARE_SIZE);
    }
}
