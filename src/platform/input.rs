//! Input capture
//!
//! Events land in a single pending slot that the frame loop drains once per
//! tick. A newer event overwrites an older one that has not been consumed
//! yet: delivery is at most one event per tick, and intermediate events
//! during a frame drop are lost.

use serde::{Deserialize, Serialize};

/// Latest-wins single-slot buffer
#[derive(Debug, Clone)]
pub struct PendingEvent<T> {
    slot: Option<T>,
    dropped: u64,
}

impl<T: std::fmt::Debug> PendingEvent<T> {
    pub fn new() -> Self {
        Self {
            slot: None,
            dropped: 0,
        }
    }

    /// Store an event, replacing any unconsumed one
    pub fn post(&mut self, event: T) {
        if let Some(previous) = self.slot.replace(event) {
            self.dropped += 1;
            log::trace!("Dropped unconsumed input {:?}", previous);
        }
    }

    /// Take the pending event, leaving the slot empty
    pub fn take(&mut self) -> Option<T> {
        self.slot.take()
    }

    pub fn is_pending(&self) -> bool {
        self.slot.is_some()
    }

    /// Events overwritten before a tick consumed them
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl<T: std::fmt::Debug> Default for PendingEvent<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// What a key press means to the games
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyAction {
    /// Tap in the reaction game, jump in the arcade
    Hit,
    /// Quit the current session
    Stop,
    Pause,
    /// Arcade dialogue/menu movement
    Left,
    Right,
}

/// Map a `KeyboardEvent.key` value
pub fn map_key(key: &str) -> Option<KeyAction> {
    match key {
        " " | "Enter" | "ArrowUp" | "w" | "W" => Some(KeyAction::Hit),
        "Escape" | "q" | "Q" => Some(KeyAction::Stop),
        "p" | "P" => Some(KeyAction::Pause),
        "ArrowLeft" | "a" | "A" => Some(KeyAction::Left),
        "ArrowRight" | "d" | "D" => Some(KeyAction::Right),
        _ => None,
    }
}
