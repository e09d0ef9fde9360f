//! High score leaderboard system
//!
//! One leaderboard per game and mode, persisted to LocalStorage. Keeps the
//! top 10 results.

use serde::{Deserialize, Serialize};

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// Which game a leaderboard belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameKind {
    Reaction,
    Arcade,
}

impl GameKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameKind::Reaction => "reaction",
            GameKind::Arcade => "arcade",
        }
    }
}

/// A single high score entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighScoreEntry {
    /// Points (reaction) or feet (arcade)
    pub score: u64,
    /// Best clocked reaction in the run, reaction game only
    #[serde(default)]
    pub best_time_ms: Option<f64>,
    /// Unix timestamp (ms) when achieved
    pub timestamp: f64,
}

/// High score leaderboard
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    /// Create empty leaderboard
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// LocalStorage key for a game/mode pair
    pub fn storage_key(game: GameKind, mode_id: &str) -> String {
        format!("speedtap_highscores_{}_{}", game.as_str(), mode_id)
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        // Check if score beats the lowest entry
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Get the rank a score would achieve (1-indexed, None if doesn't qualify)
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Add a new score to the leaderboard (if it qualifies)
    /// Returns the rank achieved (1-indexed) or None if didn't qualify
    pub fn add_score(
        &mut self,
        score: u64,
        best_time_ms: Option<f64>,
        timestamp: f64,
    ) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }

        let entry = HighScoreEntry {
            score,
            best_time_ms,
            timestamp,
        };

        // Sorted descending by score; ties keep the older entry first
        let pos = self.entries.iter().position(|e| score > e.score);
        let rank = match pos {
            Some(i) => {
                self.entries.insert(i, entry);
                i + 1
            }
            None => {
                self.entries.push(entry);
                self.entries.len()
            }
        };

        self.entries.truncate(MAX_HIGH_SCORES);

        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// Fastest reaction across all entries
    pub fn best_time(&self) -> Option<f64> {
        self.entries
            .iter()
            .filter_map(|e| e.best_time_ms)
            .min_by(f64::total_cmp)
    }

    /// Load a leaderboard from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load(game: GameKind, mode_id: &str) -> Self {
        let key = Self::storage_key(game, mode_id);
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(&key) {
                if let Ok(scores) = serde_json::from_str::<HighScores>(&json) {
                    log::info!("Loaded {} high scores for {}", scores.entries.len(), key);
                    return scores;
                }
            }
        }

        log::info!("No high scores for {}, starting fresh", key);
        Self::new()
    }

    /// Save a leaderboard to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self, game: GameKind, mode_id: &str) {
        let key = Self::storage_key(game, mode_id);
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(&key, &json);
                log::info!("High scores saved ({} entries)", self.entries.len());
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(_game: GameKind, _mode_id: &str) -> Self {
        Self::new()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self, _game: GameKind, _mode_id: &str) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_never_qualifies() {
        let scores = HighScores::new();
        assert!(!scores.qualifies(0));
        assert_eq!(scores.potential_rank(0), None);
    }

    #[test]
    fn test_insert_sorted_and_ranked() {
        let mut scores = HighScores::new();
        assert_eq!(scores.add_score(100, Some(210.0), 1.0), Some(1));
        assert_eq!(scores.add_score(300, Some(180.0), 2.0), Some(1));
        assert_eq!(scores.add_score(200, None, 3.0), Some(2));
        let ordered: Vec<u64> = scores.entries.iter().map(|e| e.score).collect();
        assert_eq!(ordered, vec![300, 200, 100]);
        assert_eq!(scores.top_score(), Some(300));
        assert_eq!(scores.best_time(), Some(180.0));
    }

    #[test]
    fn test_full_board_trims() {
        let mut scores = HighScores::new();
        for i in 1..=MAX_HIGH_SCORES as u64 {
            scores.add_score(i * 10, None, i as f64);
        }
        assert!(!scores.qualifies(10));
        assert_eq!(scores.add_score(5, None, 0.0), None);
        assert_eq!(scores.add_score(55, None, 0.0), Some(6));
        assert_eq!(scores.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(scores.entries.last().map(|e| e.score), Some(20));
    }

    #[test]
    fn test_storage_key() {
        assert_eq!(
            HighScores::storage_key(GameKind::Arcade, "lvl-2"),
            "speedtap_highscores_arcade_lvl-2"
        );
    }
}
