//! Per-guild FIFO of pending tracks.

use std::collections::VecDeque;

use crate::playback::track::Track;

/// Ordered queue of tracks waiting to play in one guild.
///
/// Strict FIFO: tracks come out in the order they went in. The controller
/// is the only dequeuer; command handlers only append or clear.
#[derive(Debug, Default)]
pub struct GuildQueue {
    tracks: VecDeque<Track>,
}

impl GuildQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a track at the tail.
    pub fn enqueue(&mut self, track: Track) {
        self.tracks.push_back(track);
    }

    /// Remove and return the head of the queue.
    pub fn dequeue_head(&mut self) -> Option<Track> {
        self.tracks.pop_front()
    }

    /// Drop every pending track, returning how many were removed.
    pub fn clear(&mut self) -> usize {
        let dropped = self.tracks.len();
        self.tracks.clear();
        dropped
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Cloned view of the pending tracks, head first.
    pub fn snapshot(&self) -> Vec<Track> {
        self.tracks.iter().cloned().collect()
    }
}
