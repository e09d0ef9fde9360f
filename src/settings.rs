//! Game settings and preferences
//!
//! Persisted as JSON in LocalStorage, separate from high scores.

use serde::{Deserialize, Serialize};

/// Arcade difficulty preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" | "medium" | "med" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Milliseconds between obstacle/pickup rolls
    pub fn hazard_cooldown_ms(&self) -> f64 {
        match self {
            Difficulty::Easy => 2000.0,
            Difficulty::Normal => 1500.0,
            Difficulty::Hard => 1000.0,
        }
    }

    /// Chance an obstacle lands on the tail tile per roll
    pub fn obstacle_chance(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.4,
            Difficulty::Normal => 0.55,
            Difficulty::Hard => 0.7,
        }
    }

    /// Chance a health pickup lands on the tail tile per roll
    pub fn health_chance(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.25,
            Difficulty::Normal => 0.15,
            Difficulty::Hard => 0.1,
        }
    }

    pub fn arcade_lives(&self) -> u8 {
        match self {
            Difficulty::Easy => 5,
            Difficulty::Normal => 3,
            Difficulty::Hard => 2,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Arcade difficulty
    pub difficulty: Difficulty,

    // === Sprites ===
    /// Sprite animation frames per second
    pub sprite_fps: f32,
    /// Root that asset paths resolve against
    pub asset_root: String,

    // === HUD ===
    /// Show FPS counter
    pub show_fps: bool,
    /// Show the reaction points table under the timer
    pub show_points_table: bool,

    // === Accessibility ===
    /// Reduced motion (sprites hold their first frame)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Normal,

            sprite_fps: 12.0,
            asset_root: String::from("/static"),

            show_fps: false,
            show_points_table: true,

            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Create settings for a difficulty preset
    pub fn from_difficulty(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            ..Self::default()
        }
    }

    /// Sprite FPS, with bad values replaced by the default
    pub fn effective_sprite_fps(&self) -> f32 {
        if self.sprite_fps.is_finite() && self.sprite_fps > 0.0 {
            self.sprite_fps.min(60.0)
        } else {
            Self::default().sprite_fps
        }
    }

    /// Frame pinned on sprites when motion is reduced
    pub fn pinned_sprite_frame(&self) -> Option<u32> {
        self.reduced_motion.then_some(0)
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "speedtap_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match serde_json::from_str(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {}", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_parse() {
        assert_eq!(Difficulty::from_str("HARD"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::from_str("med"), Some(Difficulty::Normal));
        assert_eq!(Difficulty::from_str("nightmare"), None);
    }

    #[test]
    fn test_from_difficulty_keeps_other_defaults() {
        let settings = Settings::from_difficulty(Difficulty::Easy);
        assert_eq!(settings.difficulty, Difficulty::Easy);
        assert_eq!(settings.asset_root, Settings::default().asset_root);
        assert!(settings.show_points_table);
    }

    #[test]
    fn test_harder_means_more_hazards() {
        let easy = Difficulty::Easy;
        let hard = Difficulty::Hard;
        assert!(hard.hazard_cooldown_ms() < easy.hazard_cooldown_ms());
        assert!(hard.obstacle_chance() > easy.obstacle_chance());
        assert!(hard.health_chance() < easy.health_chance());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"difficulty":"Hard"}"#).unwrap();
        assert_eq!(settings.difficulty, Difficulty::Hard);
        assert_eq!(settings.sprite_fps, Settings::default().sprite_fps);
    }

    #[test]
    fn test_sprite_fps_guard() {
        let mut settings = Settings::default();
        settings.sprite_fps = 0.0;
        assert_eq!(settings.effective_sprite_fps(), 12.0);
        settings.sprite_fps = 240.0;
        assert_eq!(settings.effective_sprite_fps(), 60.0);
        settings.reduced_motion = true;
        assert_eq!(settings.pinned_sprite_frame(), Some(0));
    }
}
