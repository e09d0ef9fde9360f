//! Game mode / level records
//!
//! Modes are owned by the backend and handed to the engines by value. The
//! engines read them but never write back.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::consts::{DEFAULT_SPEED, DEFAULT_TIMER_SECS};

/// Display color of a mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeColor {
    Green,
    Blue,
    Yellow,
    Orange,
    Red,
    Purple,
    #[default]
    #[serde(other)]
    Neutral,
}

impl ModeColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModeColor::Green => "green",
            ModeColor::Blue => "blue",
            ModeColor::Yellow => "yellow",
            ModeColor::Orange => "orange",
            ModeColor::Red => "red",
            ModeColor::Purple => "purple",
            ModeColor::Neutral => "neutral",
        }
    }
}

/// A reaction game mode or arcade level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameMode {
    #[serde(default)]
    pub id: String,
    /// Display name ("easy", "hard", "Level 3", ...)
    #[serde(default)]
    pub level: String,
    /// Target reaction speed in ms (arcade: world speed)
    #[serde(default = "default_speed", deserialize_with = "lenient_number")]
    pub speed: f64,
    /// Countdown length in seconds
    #[serde(default = "default_timer", deserialize_with = "lenient_number")]
    pub timer: f64,
    #[serde(default)]
    pub color: ModeColor,
}

/// Arcade levels share the mode record shape
pub type Level = GameMode;

impl Default for GameMode {
    fn default() -> Self {
        Self {
            id: String::new(),
            level: String::from("default"),
            speed: DEFAULT_SPEED,
            timer: DEFAULT_TIMER_SECS,
            color: ModeColor::Neutral,
        }
    }
}

#[derive(Debug, Error)]
pub enum ModeError {
    #[error("malformed mode record: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl GameMode {
    pub fn new(id: impl Into<String>, level: impl Into<String>, speed: f64, timer: f64) -> Self {
        Self {
            id: id.into(),
            level: level.into(),
            speed,
            timer,
            color: ModeColor::Neutral,
        }
    }

    /// Decode a record as delivered by the record store
    pub fn from_json(json: &str) -> Result<Self, ModeError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Speed with the zero/NaN/negative guard applied
    pub fn effective_speed(&self) -> f64 {
        crate::sim::scoring::sanitize_speed(self.speed)
    }

    /// Countdown seconds with the same guard
    pub fn effective_timer(&self) -> f64 {
        if self.timer.is_finite() && self.timer > 0.0 {
            self.timer
        } else {
            DEFAULT_TIMER_SECS
        }
    }
}

fn default_speed() -> f64 {
    DEFAULT_SPEED
}

fn default_timer() -> f64 {
    DEFAULT_TIMER_SECS
}

/// Accepts numbers, numeric strings and null
fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    })
}
