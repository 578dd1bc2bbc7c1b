//! # Snake Duel Client Library
//!
//! Client-side implementation for the two-player snake game: a macroquad
//! render loop fed by a background websocket thread.
//!
//! ## Architecture Overview
//!
//! The server is fully authoritative; the client never simulates. It
//! receives JSON state snapshots at the server tick rate and blends
//! consecutive ones for display, so the picture moves at the render rate
//! even though the game only advances eight times per second.
//!
//! ## Module Organization
//!
//! ### Network Module (`network`)
//! Owns the websocket on a dedicated thread with its own tokio runtime
//! and exchanges typed messages with the render loop over channels.
//!
//! ### Interpolation Module (`interpolation`)
//! Buffers the last two snapshots and produces per-frame scene views with
//! wrap-aware position blending across the toroidal board seam.
//!
//! ### Input Module (`input`)
//! Samples the keyboard once per frame and maps the assigned player's
//! keys to canonical direction tokens.
//!
//! ### Rendering Module (`rendering`)
//! Draws the scene with macroquad: the bonus legend, food and bonus
//! pickups, both snakes with fading trails, and the effect HUD.

pub mod input;
pub mod interpolation;
pub mod network;
pub mod rendering;
