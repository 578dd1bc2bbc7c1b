//! Macroquad drawing for the interpolated scene: bonus legend, board
//! entities, trails with depth shading, and the per-snake effect HUD.

use crate::interpolation::{SceneView, SnakeSprite};
use macroquad::prelude::*;
use shared::{BonusKind, TICK_RATE};

/// Vertical space reserved above the board for the legend and HUD.
pub const BOARD_OFFSET_Y: f32 = 50.0;

fn to_color(color: shared::Color) -> Color {
    Color::from_rgba(color.0, color.1, color.2, 255)
}

pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Renderer
    }

    pub fn render(&self, scene: &SceneView, player: Option<u8>) {
        clear_background(BLACK);
        self.draw_legend();

        let square = scene.meta.square as f32;

        draw_rectangle(
            scene.food.x as f32,
            scene.food.y as f32 + BOARD_OFFSET_Y,
            square,
            square,
            to_color(scene.food.color),
        );

        for bonus in &scene.bonuses {
            draw_rectangle(
                bonus.x as f32,
                bonus.y as f32 + BOARD_OFFSET_Y,
                square,
                square,
                to_color(bonus.color),
            );
        }

        for (index, snake) in scene.snakes.iter().enumerate() {
            self.draw_snake(snake, square);
            self.draw_effect_label(snake, index);
        }

        if let Some(player) = player {
            draw_text(
                &format!("You are Player {}", player),
                screen_width() - 180.0,
                20.0,
                16.0,
                GRAY,
            );
        }

        if !scene.running {
            draw_text(
                "Game over - press R for a new round",
                screen_width() / 2.0 - 160.0,
                screen_height() / 2.0,
                24.0,
                WHITE,
            );
        }
    }

    /// Placeholder frame shown until the first snapshot arrives.
    pub fn render_waiting(&self, url: &str) {
        clear_background(BLACK);
        draw_text(
            &format!("Connecting to {}...", url),
            20.0,
            screen_height() / 2.0,
            24.0,
            GRAY,
        );
    }

    fn draw_snake(&self, snake: &SnakeSprite, square: f32) {
        // Older segments fade toward the background.
        for (index, segment) in snake.tail.iter().enumerate() {
            let shade = (255 - (index as i32) * 15).max(50) as u8;
            let fade = 255 - shade;
            let color = (
                snake.color.0.saturating_sub(fade),
                snake.color.1.saturating_sub(fade),
                snake.color.2.saturating_sub(fade),
            );
            draw_rectangle(
                segment.0,
                segment.1 + BOARD_OFFSET_Y,
                square,
                square,
                to_color(color),
            );
        }

        let head_color = if snake.ghost {
            // Ghost snakes render translucent.
            Color::from_rgba(snake.color.0, snake.color.1, snake.color.2, 140)
        } else {
            to_color(snake.color)
        };
        draw_rectangle(snake.x, snake.y + BOARD_OFFSET_Y, square, square, head_color);
    }

    fn draw_effect_label(&self, snake: &SnakeSprite, index: usize) {
        if let Some(kind) = snake.bonus {
            let seconds_left = snake.timer / TICK_RATE;
            draw_text(
                &format!("{} ({}s)", kind.name(), seconds_left),
                10.0,
                40.0 + index as f32 * 18.0,
                16.0,
                WHITE,
            );
        }
    }

    fn draw_legend(&self) {
        draw_text("Bonuses:", 10.0, 18.0, 20.0, LIGHTGRAY);
        let mut x = 100.0;
        for kind in BonusKind::ALL {
            draw_rectangle(x, 8.0, 12.0, 12.0, to_color(kind.color()));
            draw_text(kind.name(), x + 16.0, 18.0, 14.0, LIGHTGRAY);
            x += 100.0;
        }
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}
