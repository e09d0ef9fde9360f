//! Arcade runner state and tunables
//!
//! Everything a run needs lives in [`ArcadeState`]. A restart throws the
//! whole value away and builds a new one from the level.

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Rect;
use super::jump::Jumper;
use crate::mode::Level;
use crate::settings::Difficulty;

/// Screen y of the ground line
pub const GROUND_Y: f32 = 200.0;

/// Run phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArcadePhase {
    /// Waiting for the first jump; the tile window fills but nothing moves
    Ready,
    Playing,
    Paused,
    /// Out of lives; world frozen, tiles kept
    GameOver,
}

/// A fixed-width segment of terrain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub id: u32,
    /// World-space offset of the left edge
    pub x: f32,
    /// Screen y of the tile surface
    pub y: f32,
    #[serde(default)]
    pub has_obstacle: bool,
    #[serde(default)]
    pub has_health: bool,
}

/// Tunables for a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArcadeConfig {
    pub tile_width: f32,
    /// Screen offset of world x = 0
    pub left_padding: f32,
    pub max_tiles: usize,
    /// Pixels per second per unit of level speed
    pub scroll_factor: f32,
    /// Tile spawn interval is `tile_spawn_base / speed` ms
    pub tile_spawn_base: f64,
    /// Interval between hazard rolls
    pub hazard_cooldown_ms: f64,
    pub obstacle_chance: f32,
    pub health_chance: f32,
    /// Feet added by a health pickup
    pub health_bonus_feet: f32,
    /// Feet per second per unit of level speed
    pub feet_factor: f32,
    pub max_lives: u8,
    pub pixel_scale: f32,
    /// Jump height before pixel scaling
    pub jump_height: f32,
    /// Jump speed before pixel scaling (pixels per second)
    pub jump_speed: f32,
    /// Player hit box while standing
    pub player_box: Rect,
    /// Obstacle box relative to its tile's (screen x, surface y)
    pub obstacle_box: Rect,
    /// Pickup box relative to its tile's (screen x, surface y)
    pub health_box: Rect,
}

impl Default for ArcadeConfig {
    fn default() -> Self {
        Self::for_difficulty(Difficulty::default())
    }
}

impl ArcadeConfig {
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        let pixel_scale = 2.0;
        Self {
            tile_width: 64.0,
            left_padding: 32.0,
            max_tiles: 24,
            scroll_factor: 40.0,
            tile_spawn_base: 100.0,
            hazard_cooldown_ms: difficulty.hazard_cooldown_ms(),
            obstacle_chance: difficulty.obstacle_chance(),
            health_chance: difficulty.health_chance(),
            health_bonus_feet: 50.0,
            feet_factor: 1.0,
            max_lives: difficulty.arcade_lives(),
            pixel_scale,
            jump_height: 40.0,
            jump_speed: 200.0,
            player_box: Rect::new(96.0, GROUND_Y - 40.0, 32.0, 40.0),
            obstacle_box: Rect::new(16.0, -24.0, 32.0, 24.0),
            health_box: Rect::new(20.0, -64.0, 24.0, 24.0),
        }
    }

    pub fn tile_spawn_interval_ms(&self, speed: f64) -> f64 {
        self.tile_spawn_base / speed
    }
}

/// Complete state of one arcade run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArcadeState {
    level: Level,
    pub config: ArcadeConfig,
    pub phase: ArcadePhase,
    pub lives: u8,
    pub max_lives: u8,
    /// Distance score
    pub feet: f32,
    /// Active tiles keyed by id; ids grow with spawn order
    pub tiles: BTreeMap<u32, Tile>,
    pub first_tile_id: Option<u32>,
    pub last_tile_id: Option<u32>,
    pub obstacles_hit: BTreeSet<u32>,
    pub health_hit: BTreeSet<u32>,
    pub player: Jumper,
    /// Time spent playing
    pub time_ms: f64,
    pub(crate) spawn_timer_ms: f64,
    pub(crate) hazard_timer_ms: f64,
    /// World x of the newest tile ever spawned, kept after it is culled
    tail_x: Option<f32>,
    next_id: u32,
}

impl ArcadeState {
    pub fn new(level: Level, config: ArcadeConfig) -> Self {
        let max_lives = config.max_lives.max(1);
        let mut state = Self {
            level,
            phase: ArcadePhase::Ready,
            lives: max_lives,
            max_lives,
            feet: 0.0,
            tiles: BTreeMap::new(),
            first_tile_id: None,
            last_tile_id: None,
            obstacles_hit: BTreeSet::new(),
            health_hit: BTreeSet::new(),
            player: Jumper::new(config.player_box.top()),
            time_ms: 0.0,
            spawn_timer_ms: 0.0,
            hazard_timer_ms: 0.0,
            tail_x: None,
            next_id: 1,
            config,
        };

        // Seed the window with the first ground tile
        state.spawn_tile();
        state
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    /// Level speed with the zero/NaN guard
    pub fn speed(&self) -> f64 {
        self.level.effective_speed()
    }

    /// Discard everything and start over from the same level
    pub fn restart(&mut self) {
        *self = Self::new(self.level.clone(), self.config.clone());
        log::info!("Arcade run restarted");
    }

    /// Append a tile after the current tail. Returns its id, or None when full.
    pub fn spawn_tile(&mut self) -> Option<u32> {
        if self.tiles.len() >= self.config.max_tiles {
            return None;
        }
        let x = self
            .last_tile()
            .map(|tail| tail.x)
            .or(self.tail_x)
            .map_or(0.0, |tail_x| tail_x + self.config.tile_width);
        self.tail_x = Some(x);
        let id = self.next_id;
        self.next_id += 1;
        self.tiles.insert(
            id,
            Tile {
                id,
                x,
                y: GROUND_Y,
                has_obstacle: false,
                has_health: false,
            },
        );
        self.sync_window();
        Some(id)
    }

    /// Move the world left by `dx` pixels
    pub fn scroll_by(&mut self, dx: f32) {
        for tile in self.tiles.values_mut() {
            tile.x -= dx;
        }
        if let Some(tail_x) = self.tail_x.as_mut() {
            *tail_x -= dx;
        }
    }

    /// Drop head tiles whose right edge has scrolled past the left boundary
    pub fn remove_offscreen_tiles(&mut self) -> usize {
        let mut removed = 0;
        while let Some(head) = self.first_tile() {
            if head.x + self.config.tile_width + self.config.left_padding >= 0.0 {
                break;
            }
            let id = head.id;
            self.tiles.remove(&id);
            self.obstacles_hit.remove(&id);
            self.health_hit.remove(&id);
            self.sync_window();
            removed += 1;
        }
        removed
    }

    /// Re-derive head/tail from the ordered id sequence
    fn sync_window(&mut self) {
        self.first_tile_id = self.tiles.keys().next().copied();
        self.last_tile_id = self.tiles.keys().next_back().copied();
    }

    pub fn first_tile(&self) -> Option<&Tile> {
        self.first_tile_id.and_then(|id| self.tiles.get(&id))
    }

    pub fn last_tile(&self) -> Option<&Tile> {
        self.last_tile_id.and_then(|id| self.tiles.get(&id))
    }

    pub fn last_tile_mut(&mut self) -> Option<&mut Tile> {
        self.last_tile_id.and_then(|id| self.tiles.get_mut(&id))
    }

    /// Player hit box at the current jump height
    pub fn player_rect(&self) -> Rect {
        let lift = self.player.top - self.player.rest_top;
        self.config.player_box.translated(Vec2::new(0.0, lift))
    }

    /// Screen position of a tile's top-left corner
    pub fn tile_origin(&self, tile: &Tile) -> Vec2 {
        Vec2::new(tile.x + self.config.left_padding, tile.y)
    }

    pub fn obstacle_rect(&self, tile: &Tile) -> Rect {
        self.config.obstacle_box.translated(self.tile_origin(tile))
    }

    pub fn health_rect(&self, tile: &Tile) -> Rect {
        self.config.health_box.translated(self.tile_origin(tile))
    }
}

/// Tile as the view sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileView {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub obstacle: bool,
    pub obstacle_hit: bool,
    pub health: bool,
    pub health_taken: bool,
}

/// One-way copy handed to the view every frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcadeSnapshot {
    pub phase: ArcadePhase,
    pub lives: u8,
    pub max_lives: u8,
    pub feet: u32,
    pub player_top: f32,
    pub airborne: bool,
    pub tiles: Vec<TileView>,
}

impl From<&ArcadeState> for ArcadeSnapshot {
    fn from(s: &ArcadeState) -> Self {
        Self {
            phase: s.phase,
            lives: s.lives,
            max_lives: s.max_lives,
            feet: s.feet.floor() as u32,
            player_top: s.player.top,
            airborne: s.player.airborne(),
            tiles: s
                .tiles
                .values()
                .map(|t| TileView {
                    id: t.id,
                    x: t.x + s.config.left_padding,
                    y: t.y,
                    obstacle: t.has_obstacle,
                    obstacle_hit: s.obstacles_hit.contains(&t.id),
                    health: t.has_health,
                    health_taken: s.health_hit.contains(&t.id),
                })
                .collect(),
        }
    }
}
