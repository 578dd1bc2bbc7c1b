//! Session state for one server process: the canonical round, the per-slot
//! pending-input cells, and the slot table mapping player slots to their
//! connection's outbound queue.
//!
//! Input cells hold at most one token each with most-recent-overwrite
//! semantics: inputs arriving faster than the tick rate coalesce to the
//! latest one, and the tick drains each cell exactly once.

use crate::game::{Round, SLOT_COUNT};
use log::info;
use shared::Snapshot;
use tokio::sync::mpsc::Sender;

/// Owns the authoritative [`Round`] and the queued inputs. All mutation of
/// game state goes through these four operations.
pub struct Session {
    round: Round,
    pending: [Option<String>; SLOT_COUNT],
}

impl Session {
    pub fn new() -> Self {
        Self {
            round: Round::new(),
            pending: Default::default(),
        }
    }

    /// Deterministic session for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            round: Round::with_seed(seed),
            pending: Default::default(),
        }
    }

    /// Stores a direction token for the slot, replacing any unprocessed one.
    pub fn queue_input(&mut self, slot: usize, key: String) {
        self.pending[slot] = Some(key);
    }

    /// Drops a slot's pending input, used when its connection goes away.
    pub fn clear_input(&mut self, slot: usize) {
        self.pending[slot] = None;
    }

    /// Replaces the round wholesale. Accepted from either player at any
    /// time; in-flight snapshots of the old round are unaffected.
    pub fn reset(&mut self) {
        info!("starting a new round");
        self.round = Round::new();
    }

    /// One tick: apply the latest queued input per slot, advance the engine
    /// if the round is still running, and serialize the result. Runs (and
    /// broadcasts) even when the round is frozen so clients keep seeing the
    /// terminal frame.
    pub fn tick(&mut self) -> Snapshot {
        for slot in 0..SLOT_COUNT {
            if let Some(key) = self.pending[slot].take() {
                self.round.apply_input(slot, &key);
            }
        }
        self.round.step();
        self.round.snapshot()
    }

    #[cfg(test)]
    pub fn round(&self) -> &Round {
        &self.round
    }

    #[cfg(test)]
    pub fn round_mut(&mut self) -> &mut Round {
        &mut self.round
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks which player slots are taken and how to reach their connections.
/// The first connection gets slot 1, the second slot 2; a slot frees up the
/// moment its connection closes. Each sender is a one-snapshot-deep bounded
/// queue: a connection that stops draining loses frames, it never queues
/// history.
pub struct SlotTable {
    senders: [Option<Sender<String>>; SLOT_COUNT],
}

impl SlotTable {
    pub fn new() -> Self {
        Self {
            senders: Default::default(),
        }
    }

    /// Claims the lowest free slot for a connection, or `None` when full.
    pub fn claim(&mut self, sender: Sender<String>) -> Option<usize> {
        for (slot, entry) in self.senders.iter_mut().enumerate() {
            if entry.is_none() {
                *entry = Some(sender);
                return Some(slot);
            }
        }
        None
    }

    pub fn release(&mut self, slot: usize) {
        self.senders[slot] = None;
    }

    /// Snapshot of the currently connected slots and their outbound queues.
    pub fn senders(&self) -> Vec<(usize, Sender<String>)> {
        self.senders
            .iter()
            .enumerate()
            .filter_map(|(slot, entry)| entry.clone().map(|sender| (slot, sender)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.senders.iter().filter(|entry| entry.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SlotTable {
    fn default() -> Self {
        Self::new()
    }
}
