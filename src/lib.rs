//! Speed Tap - reaction and arcade runner mini-games for the browser
//!
//! Core modules:
//! - `sim`: Game engines (reaction scoring and rounds, arcade runner)
//! - `sprite`: Sprite sheet animation
//! - `platform`: Browser/native platform abstraction (time, input, frames)
//! - `mode`: Mode/level records the engines are configured from
//! - `records`: Realtime record store contract and local cache
//! - `settings`, `highscores`: LocalStorage-backed preferences and leaderboards

pub mod assets;
pub mod highscores;
pub mod mode;
pub mod platform;
pub mod records;
pub mod settings;
pub mod sim;
pub mod sprite;

pub use highscores::{GameKind, HighScores};
pub use mode::{GameMode, Level};
pub use settings::{Difficulty, Settings};

/// Game configuration constants
pub mod consts {
    /// Level speed used when a record carries none (or garbage)
    pub const DEFAULT_SPEED: f64 = 1.0;
    /// Countdown used when a mode carries no timer (seconds)
    pub const DEFAULT_TIMER_SECS: f64 = 3.0;
    /// Shortest countdown a mode may ask for (seconds)
    pub const MIN_COUNTDOWN_SECS: f64 = 1.0;

    /// Reaction game lives
    pub const REACTION_MAX_LIVES: u8 = 5;

    /// Longest frame the arcade simulates in one tick (ms)
    pub const MAX_FRAME_MS: f64 = 100.0;
}
