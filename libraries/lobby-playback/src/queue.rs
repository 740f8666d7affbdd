//! Upcoming-tracks queue
//!
//! Plain FIFO: tracks play in the order they were added. The same track may
//! be queued several times; each entry is distinct.
//!
//! ```text
//! Currently Playing: Track A   (transport state)
//! ─────────────────────────────
//! Queue (head first):
//!   - Track B   <- next `Next` takes this one
//!   - Track C
//!   - Track B
//! ```

use lobby_core::types::Track;
use std::collections::VecDeque;

/// Insertion-ordered queue of pending tracks
///
/// Only the transport machine's advance operation consumes entries.
/// Everything else gets read-only access.
#[derive(Debug, Clone, Default)]
pub struct Queue {
    tracks: VecDeque<Track>,
}

impl Queue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Append track to the tail
    pub fn enqueue(&mut self, track: Track) {
        self.tracks.push_back(track);
    }

    /// Remove and return the head
    pub(crate) fn dequeue(&mut self) -> Option<Track> {
        self.tracks.pop_front()
    }

    /// Peek at the head without removing it
    pub fn peek(&self) -> Option<&Track> {
        self.tracks.front()
    }

    /// Iterate in play order (head first)
    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter()
    }

    /// Number of queued tracks
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Check if queue is empty
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}
