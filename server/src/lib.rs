//! # Snake Duel Server
//!
//! Authoritative server for the two-player snake game. It owns the
//! canonical round state, advances it at a fixed tick rate, and streams
//! JSON snapshots to both connected players over websockets.
//!
//! ## Architecture
//!
//! All game rules live in [`game::Round`], a pure state machine advanced
//! one tick at a time. [`session::Session`] wraps it with the only four
//! operations the rest of the server may perform: queue an input for a
//! slot, reset, tick once, and (implicitly, via tick) serialize. The
//! network layer in [`network`] runs one task per connection plus a single
//! tick/broadcast task; connections communicate with the tick loop only
//! through their slot's single-element input cell and a one-snapshot
//! outbound frame queue (late connections lose frames, never get history).
//!
//! Clients are trusted exactly as far as the protocol requires: slot
//! identity comes from connection order, malformed messages are ignored,
//! and a third connection is told the server is full and dropped.

pub mod game;
pub mod network;
pub mod session;
