//! Snapshot buffering and wrap-aware interpolation.
//!
//! Snapshots arrive at the server tick rate, well below the render rate.
//! The buffer keeps the two most recent ones and, for every frame in
//! between, blends them with an alpha derived from wall-clock time since
//! the latest arrival. Coordinates live on a toroidal board, so a naive
//! lerp across the wraparound seam would sweep the snake the long way
//! around the screen; [`lerp_wrapped`] shifts one endpoint by a full board
//! dimension first whenever the raw difference exceeds half of it.

use shared::{BoardMeta, BonusKind, BonusView, Color, FoodView, Snapshot};
use std::time::Instant;

/// Alpha per second of elapsed time. At 8 ticks/s a new snapshot lands
/// every 125 ms, so alpha reaches 1.0 just before the next one arrives.
pub const SMOOTHING: f32 = 12.0;

/// One snake prepared for drawing: head and tail positions blended
/// between the two retained snapshots.
#[derive(Debug, Clone)]
pub struct SnakeSprite {
    pub x: f32,
    pub y: f32,
    pub tail: Vec<(f32, f32)>,
    pub color: Color,
    pub bonus: Option<BonusKind>,
    pub timer: u32,
    pub ghost: bool,
    pub mirror: bool,
}

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone)]
pub struct SceneView {
    pub running: bool,
    pub food: FoodView,
    pub bonuses: Vec<BonusView>,
    pub snakes: Vec<SnakeSprite>,
    pub meta: BoardMeta,
}

/// Retains the previous and current snapshot together with the current
/// one's arrival time. A single writer (the render loop draining the
/// network channel) updates all three fields together, so a frame never
/// sees a fresh snapshot with a stale timestamp.
pub struct SnapshotBuffer {
    previous: Option<Snapshot>,
    current: Option<Snapshot>,
    received_at: Option<Instant>,
}

impl SnapshotBuffer {
    pub fn new() -> Self {
        Self {
            previous: None,
            current: None,
            received_at: None,
        }
    }

    /// Installs a freshly received snapshot, rotating the current one into
    /// the previous slot.
    pub fn push(&mut self, snapshot: Snapshot, now: Instant) {
        self.previous = self.current.take();
        self.current = Some(snapshot);
        self.received_at = Some(now);
    }

    pub fn current(&self) -> Option<&Snapshot> {
        self.current.as_ref()
    }

    /// Elapsed-time fraction between the two retained snapshots, clamped
    /// to [0, 1].
    pub fn alpha(&self, now: Instant) -> f32 {
        match self.received_at {
            Some(at) => (now.duration_since(at).as_secs_f32() * SMOOTHING).clamp(0.0, 1.0),
            None => 1.0,
        }
    }

    /// Builds the blended frame, or `None` before the first snapshot.
    /// Without a previous snapshot the current one renders verbatim; trail
    /// segments past the shorter of the two trails take the current
    /// snapshot's raw position, which only matters across a length change.
    pub fn view(&self, now: Instant) -> Option<SceneView> {
        let current = self.current.as_ref()?;
        let alpha = self.alpha(now);
        let width = current.meta.width as f32;
        let height = current.meta.height as f32;

        let snakes = current
            .snakes
            .iter()
            .enumerate()
            .map(|(index, snake)| {
                let previous = self
                    .previous
                    .as_ref()
                    .and_then(|snapshot| snapshot.snakes.get(index));

                let (x, y, tail) = match previous {
                    Some(prev) => {
                        let x = lerp_wrapped(prev.x as f32, snake.x as f32, alpha, width);
                        let y = lerp_wrapped(prev.y as f32, snake.y as f32, alpha, height);

                        let shared_len = prev.tail.len().min(snake.tail.len());
                        let mut tail: Vec<(f32, f32)> = (0..shared_len)
                            .map(|i| {
                                (
                                    lerp_wrapped(
                                        prev.tail[i].0 as f32,
                                        snake.tail[i].0 as f32,
                                        alpha,
                                        width,
                                    ),
                                    lerp_wrapped(
                                        prev.tail[i].1 as f32,
                                        snake.tail[i].1 as f32,
                                        alpha,
                                        height,
                                    ),
                                )
                            })
                            .collect();
                        for segment in &snake.tail[shared_len..] {
                            tail.push((segment.0 as f32, segment.1 as f32));
                        }
                        (x, y, tail)
                    }
                    None => (
                        snake.x as f32,
                        snake.y as f32,
                        snake
                            .tail
                            .iter()
                            .map(|segment| (segment.0 as f32, segment.1 as f32))
                            .collect(),
                    ),
                };

                SnakeSprite {
                    x,
                    y,
                    tail,
                    color: snake.color,
                    bonus: snake.bonus,
                    timer: snake.timer,
                    ghost: snake.ghost,
                    mirror: snake.mirror,
                }
            })
            .collect();

        Some(SceneView {
            running: current.running,
            food: current.food.clone(),
            bonuses: current.bonuses.clone(),
            snakes,
            meta: current.meta.clone(),
        })
    }
}

impl Default for SnapshotBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Linear interpolation on a circle of circumference `max`. When the raw
/// difference exceeds half the dimension the motion actually crossed the
/// seam, so the lower endpoint is shifted up by a full dimension before
/// blending and the result is folded back into [0, max).
pub fn lerp_wrapped(prev: f32, curr: f32, alpha: f32, max: f32) -> f32 {
    let mut prev = prev;
    let mut curr = curr;
    let diff = curr - prev;
    if diff.abs() > max / 2.0 {
        if diff > 0.0 {
            prev += max;
        } else {
            curr += max;
        }
    }
    (prev + (curr - prev) * alpha).rem_euclid(max)
}
