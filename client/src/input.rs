//! Keyboard sampling for the render loop.
//!
//! Player 1 steers with the arrow keys, player 2 with WASD; both map to
//! the same four canonical wire tokens before anything leaves the
//! process. Sampling is edge-triggered once per frame, which also bounds
//! the outbound message rate to the render cadence.

use macroquad::prelude::*;
use shared::Direction;

/// One user intention captured during a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerAction {
    Steer(Direction),
    NewRound,
    Quit,
}

pub struct InputManager {
    player: Option<u8>,
}

impl InputManager {
    pub fn new() -> Self {
        Self { player: None }
    }

    /// Called once the welcome message assigns our slot; until then only
    /// quit is honored.
    pub fn set_player(&mut self, player: u8) {
        self.player = Some(player);
    }

    /// Samples this frame's key presses. Directions win over reset when
    /// both are hit in the same frame, matching one-action-per-frame
    /// semantics.
    pub fn poll(&self) -> Option<PlayerAction> {
        if is_key_pressed(KeyCode::Escape) {
            return Some(PlayerAction::Quit);
        }

        if let Some(direction) = self.steer_direction() {
            return Some(PlayerAction::Steer(direction));
        }

        if is_key_pressed(KeyCode::R) {
            return Some(PlayerAction::NewRound);
        }

        None
    }

    fn steer_direction(&self) -> Option<Direction> {
        match self.player {
            Some(1) => {
                if is_key_pressed(KeyCode::Left) {
                    Some(Direction::Left)
                } else if is_key_pressed(KeyCode::Right) {
                    Some(Direction::Right)
                } else if is_key_pressed(KeyCode::Up) {
                    Some(Direction::Up)
                } else if is_key_pressed(KeyCode::Down) {
                    Some(Direction::Down)
                } else {
                    None
                }
            }
            Some(2) => {
                if is_key_pressed(KeyCode::A) {
                    Some(Direction::Left)
                } else if is_key_pressed(KeyCode::D) {
                    Some(Direction::Right)
                } else if is_key_pressed(KeyCode::W) {
                    Some(Direction::Up)
                } else if is_key_pressed(KeyCode::S) {
                    Some(Direction::Down)
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}
