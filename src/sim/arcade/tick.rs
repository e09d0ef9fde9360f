//! Per-frame arcade simulation
//!
//! Order within a playing tick: jump, scroll and cull, spawn tiles, advance
//! feet, roll hazards, then resolve collisions.

use serde::{Deserialize, Serialize};

use super::collision::hits;
use super::state::{ArcadePhase, ArcadeState};
use crate::sim::random::RandomSource;

/// Input for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArcadeInput {
    /// Jump (the first one starts the run)
    pub jump: bool,
    /// Pause toggle
    pub pause: bool,
    /// Rebuild the run after game over
    pub restart: bool,
    /// Quit: force game over
    pub stop: bool,
}

/// Notable things that happened during a tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ArcadeEvent {
    Started,
    ObstacleHit { tile_id: u32, lives: u8 },
    HealthCollected { tile_id: u32, lives: u8 },
    GameOver { feet: u32 },
    Restarted,
}

/// Advance the run by `elapsed_ms` of real time
pub fn tick<R: RandomSource + ?Sized>(
    state: &mut ArcadeState,
    input: &ArcadeInput,
    elapsed_ms: f64,
    rng: &mut R,
) -> Vec<ArcadeEvent> {
    let mut events = Vec::new();
    let elapsed_ms = elapsed_ms.max(0.0);
    let elapsed_secs = (elapsed_ms / 1000.0) as f32;

    if input.stop && state.phase != ArcadePhase::GameOver {
        end_run(state, &mut events);
    }

    if input.restart && state.phase == ArcadePhase::GameOver {
        state.restart();
        events.push(ArcadeEvent::Restarted);
        return events;
    }

    if input.pause {
        match state.phase {
            ArcadePhase::Playing => {
                state.phase = ArcadePhase::Paused;
                log::debug!("Arcade paused");
                return events;
            }
            ArcadePhase::Paused => {
                state.phase = ArcadePhase::Playing;
                log::debug!("Arcade resumed");
            }
            _ => {}
        }
    }

    if input.jump {
        let height = state.config.jump_height * state.config.pixel_scale;
        match state.phase {
            ArcadePhase::Ready => {
                state.phase = ArcadePhase::Playing;
                state.player.request(height);
                log::info!("Arcade run started at speed {}", state.speed());
                events.push(ArcadeEvent::Started);
            }
            ArcadePhase::Playing => {
                state.player.request(height);
            }
            _ => {}
        }
    }

    let jump_speed = state.config.jump_speed * state.config.pixel_scale;

    match state.phase {
        ArcadePhase::Ready => {
            fill_window(state, elapsed_ms);
        }
        ArcadePhase::Playing => {
            state.time_ms += elapsed_ms;
            state.player.update(elapsed_secs, jump_speed);

            scroll(state, elapsed_secs);
            state.remove_offscreen_tiles();
            fill_window(state, elapsed_ms);

            state.feet += state.speed() as f32 * state.config.feet_factor * elapsed_secs;

            roll_hazards(state, elapsed_ms, rng);
            resolve_collisions(state, &mut events);
        }
        ArcadePhase::GameOver => {
            // Let an in-flight jump land; nothing else moves
            state.player.update(elapsed_secs, jump_speed);
        }
        ArcadePhase::Paused => {}
    }

    events
}

fn scroll(state: &mut ArcadeState, elapsed_secs: f32) {
    let dx = state.speed() as f32 * state.config.scroll_factor * elapsed_secs;
    state.scroll_by(dx);
}

/// Spawn one tile per elapsed `tile_spawn_base / speed` interval, however
/// many intervals the tick covers. Time owed while the window is full is dropped.
fn fill_window(state: &mut ArcadeState, elapsed_ms: f64) {
    let interval = state.config.tile_spawn_interval_ms(state.speed());
    state.spawn_timer_ms += elapsed_ms;
    while state.spawn_timer_ms >= interval {
        if state.spawn_tile().is_none() {
            state.spawn_timer_ms = 0.0;
            return;
        }
        state.spawn_timer_ms -= interval;
    }
}

/// On each cooldown elapse, roll an obstacle and a pickup onto the tail tile
fn roll_hazards<R: RandomSource + ?Sized>(
    state: &mut ArcadeState,
    elapsed_ms: f64,
    rng: &mut R,
) {
    state.hazard_timer_ms += elapsed_ms;
    if state.hazard_timer_ms < state.config.hazard_cooldown_ms {
        return;
    }
    state.hazard_timer_ms = 0.0;

    let obstacle = rng.draw() < state.config.obstacle_chance;
    let health = rng.draw() < state.config.health_chance;
    if let Some(tail) = state.last_tile_mut() {
        tail.has_obstacle |= obstacle;
        tail.has_health |= health;
        if obstacle || health {
            log::trace!(
                "Tile {} rolled obstacle={} health={}",
                tail.id,
                obstacle,
                health
            );
        }
    }
}

fn resolve_collisions(state: &mut ArcadeState, events: &mut Vec<ArcadeEvent>) {
    let player = state.player_rect();

    let obstacle_hits: Vec<u32> = state
        .tiles
        .values()
        .filter(|t| t.has_obstacle && !state.obstacles_hit.contains(&t.id))
        .filter(|t| hits(&player, &state.obstacle_rect(t)))
        .map(|t| t.id)
        .collect();

    for tile_id in obstacle_hits {
        state.obstacles_hit.insert(tile_id);
        state.lives = state.lives.saturating_sub(1);
        events.push(ArcadeEvent::ObstacleHit {
            tile_id,
            lives: state.lives,
        });
        if state.lives == 0 {
            end_run(state, events);
            return;
        }
    }

    let health_hits: Vec<u32> = state
        .tiles
        .values()
        .filter(|t| t.has_health && !state.health_hit.contains(&t.id))
        .filter(|t| hits(&player, &state.health_rect(t)))
        .map(|t| t.id)
        .collect();

    for tile_id in health_hits {
        state.health_hit.insert(tile_id);
        state.lives = state.lives.saturating_add(1).min(state.max_lives);
        state.feet += state.config.health_bonus_feet;
        events.push(ArcadeEvent::HealthCollected {
            tile_id,
            lives: state.lives,
        });
    }
}

fn end_run(state: &mut ArcadeState, events: &mut Vec<ArcadeEvent>) {
    state.phase = ArcadePhase::GameOver;
    let feet = state.feet.floor() as u32;
    log::info!("Arcade game over at {} feet", feet);
    events.push(ArcadeEvent::GameOver { feet });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::GameMode;
    use crate::sim::arcade::state::{ArcadeConfig, ArcadeSnapshot, GROUND_Y, Tile};
    use crate::sim::random::ScriptedRandom;

    const FRAME_MS: f64 = 1000.0 / 60.0;

    fn config() -> ArcadeConfig {
        ArcadeConfig {
            max_tiles: 8,
            hazard_cooldown_ms: 500.0,
            obstacle_chance: 0.5,
            health_chance: 0.5,
            ..ArcadeConfig::default()
        }
    }

    fn state() -> ArcadeState {
        ArcadeState::new(GameMode::new("l1", "Level 1", 5.0, 0.0), config())
    }

    fn jump() -> ArcadeInput {
        ArcadeInput {
            jump: true,
            ..Default::default()
        }
    }

    /// Put a tile carrying an obstacle right under the player
    fn plant_obstacle(s: &mut ArcadeState) -> u32 {
        let id = 999;
        let player = s.config.player_box;
        let x = player.left() - s.config.left_padding - s.config.obstacle_box.left();
        s.tiles.insert(
            id,
            Tile {
                id,
                x,
                y: GROUND_Y,
                has_obstacle: true,
                has_health: false,
            },
        );
        id
    }

    #[test]
    fn test_ready_fills_window_without_scrolling() {
        let mut s = state();
        let mut rng = ScriptedRandom::constant(0.0);
        for _ in 0..100 {
            tick(&mut s, &ArcadeInput::default(), FRAME_MS, &mut rng);
        }
        assert_eq!(s.phase, ArcadePhase::Ready);
        assert_eq!(s.tiles.len(), s.config.max_tiles);
        assert_eq!(s.first_tile().unwrap().x, 0.0);
        assert_eq!(s.feet, 0.0);
        assert!(s.tiles.values().all(|t| !t.has_obstacle));
    }

    #[test]
    fn test_first_jump_starts_run() {
        let mut s = state();
        let mut rng = ScriptedRandom::constant(1.0);
        let events = tick(&mut s, &jump(), FRAME_MS, &mut rng);
        assert_eq!(events, vec![ArcadeEvent::Started]);
        assert_eq!(s.phase, ArcadePhase::Playing);
        assert!(s.player.airborne());
        assert!(s.feet > 0.0);
    }

    #[test]
    fn test_feet_grow_with_time() {
        let mut s = state();
        let mut rng = ScriptedRandom::constant(1.0);
        tick(&mut s, &jump(), 0.0, &mut rng);
        let mut last = s.feet;
        for _ in 0..120 {
            tick(&mut s, &ArcadeInput::default(), FRAME_MS, &mut rng);
            assert!(s.feet >= last);
            last = s.feet;
        }
        // speed 5 * factor 1 for two seconds
        assert!((s.feet - 10.0).abs() < 0.01);
    }

    #[test]
    fn test_tiles_scroll_and_cull() {
        let mut s = state();
        let mut rng = ScriptedRandom::constant(1.0);
        tick(&mut s, &jump(), 0.0, &mut rng);
        let first = s.first_tile_id;
        // 5 * 40 px/s; tile 1 leaves after (64 + 32) / 200 s
        for _ in 0..60 {
            tick(&mut s, &ArcadeInput::default(), FRAME_MS, &mut rng);
        }
        assert_ne!(s.first_tile_id, first);
        assert!(s.tiles.len() <= s.config.max_tiles);
        let head = s.first_tile().unwrap();
        assert!(head.x + s.config.tile_width + s.config.left_padding >= 0.0);
        let xs: Vec<f32> = s.tiles.values().map(|t| t.x).collect();
        assert!(xs.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(s.last_tile_id, s.tiles.keys().next_back().copied());
    }

    #[test]
    fn test_fast_level_keeps_window_full() {
        // 1 ms spawn interval; each frame scrolls further than a tile
        let mut s = ArcadeState::new(
            GameMode::new("fast", "Fast", 100.0, 0.0),
            ArcadeConfig::default(),
        );
        let mut rng = ScriptedRandom::constant(1.0);
        for _ in 0..3 {
            tick(&mut s, &ArcadeInput::default(), FRAME_MS, &mut rng);
        }
        assert_eq!(s.tiles.len(), s.config.max_tiles);

        tick(&mut s, &jump(), FRAME_MS, &mut rng);
        let width = s.config.tile_width;
        for _ in 0..3000 {
            tick(&mut s, &ArcadeInput::default(), FRAME_MS, &mut rng);
            assert_eq!(s.tiles.len(), s.config.max_tiles);
            let xs: Vec<f32> = s.tiles.values().map(|t| t.x).collect();
            assert!(xs.windows(2).all(|w| (w[1] - w[0] - width).abs() < 0.5));
            let tail = s.last_tile().unwrap();
            assert!(tail.x > width * (s.config.max_tiles as f32 - 4.0));
        }
    }

    #[test]
    fn test_health_at_u8_max_lives_saturates() {
        let mut s = ArcadeState::new(
            GameMode::new("l1", "Level 1", 5.0, 0.0),
            ArcadeConfig {
                max_lives: u8::MAX,
                ..config()
            },
        );
        let mut rng = ScriptedRandom::constant(1.0);
        s.phase = ArcadePhase::Playing;
        s.player.top -= 40.0;
        let id = plant_obstacle(&mut s);
        if let Some(tile) = s.tiles.get_mut(&id) {
            tile.has_obstacle = false;
            tile.has_health = true;
        }
        assert_eq!(s.lives, u8::MAX);
        tick(&mut s, &ArcadeInput::default(), 0.0, &mut rng);
        assert_eq!(s.lives, u8::MAX);
        assert!(s.health_hit.contains(&id));
    }

    #[test]
    fn test_hazards_only_on_tail_tile() {
        let mut s = state();
        // obstacle roll passes, health roll fails
        let mut rng = ScriptedRandom::new([0.1, 0.9]);
        tick(&mut s, &jump(), 0.0, &mut rng);
        let mut tail = None;
        let mut elapsed = 0.0;
        while elapsed < 500.0 {
            tick(&mut s, &ArcadeInput::default(), 10.0, &mut rng);
            elapsed += 10.0;
            if tail.is_none() && s.tiles.values().any(|t| t.has_obstacle) {
                tail = s.last_tile_id;
            }
        }
        let marked: Vec<u32> = s
            .tiles
            .values()
            .filter(|t| t.has_obstacle)
            .map(|t| t.id)
            .collect();
        assert_eq!(marked.len(), 1);
        assert_eq!(Some(marked[0]), tail);
        assert!(s.tiles.values().all(|t| !t.has_health));
    }

    #[test]
    fn test_failed_roll_waits_for_next_cooldown() {
        let mut s = state();
        let mut rng = ScriptedRandom::constant(0.99);
        tick(&mut s, &jump(), 0.0, &mut rng);
        for _ in 0..200 {
            tick(&mut s, &ArcadeInput::default(), FRAME_MS, &mut rng);
        }
        assert!(s.tiles.values().all(|t| !t.has_obstacle && !t.has_health));
    }

    #[test]
    fn test_obstacle_costs_one_life_once() {
        let mut s = state();
        let mut rng = ScriptedRandom::constant(1.0);
        s.phase = ArcadePhase::Playing;
        let id = plant_obstacle(&mut s);
        let lives = s.lives;

        let events = tick(&mut s, &ArcadeInput::default(), 0.0, &mut rng);
        assert!(events.contains(&ArcadeEvent::ObstacleHit {
            tile_id: id,
            lives: lives - 1
        }));
        assert!(s.obstacles_hit.contains(&id));

        for _ in 0..5 {
            tick(&mut s, &ArcadeInput::default(), 0.0, &mut rng);
        }
        assert_eq!(s.lives, lives - 1);
    }

    #[test]
    fn test_jump_clears_obstacle() {
        let mut s = state();
        let mut rng = ScriptedRandom::constant(1.0);
        s.phase = ArcadePhase::Playing;
        s.player.request(s.config.jump_height * s.config.pixel_scale);
        s.player.top -= 30.0;
        let id = plant_obstacle(&mut s);
        tick(&mut s, &ArcadeInput::default(), 0.0, &mut rng);
        assert!(!s.obstacles_hit.contains(&id));
        assert_eq!(s.lives, s.max_lives);
    }

    #[test]
    fn test_last_life_ends_run_and_freezes() {
        let mut s = state();
        let mut rng = ScriptedRandom::constant(1.0);
        s.phase = ArcadePhase::Playing;
        s.lives = 1;
        plant_obstacle(&mut s);
        let events = tick(&mut s, &ArcadeInput::default(), 0.0, &mut rng);
        assert_eq!(s.phase, ArcadePhase::GameOver);
        assert!(matches!(events.last(), Some(ArcadeEvent::GameOver { .. })));

        let feet = s.feet;
        let tiles = s.tiles.clone();
        for _ in 0..30 {
            tick(&mut s, &jump(), FRAME_MS, &mut rng);
        }
        assert_eq!(s.feet, feet);
        assert_eq!(s.tiles, tiles);
        assert_eq!(s.phase, ArcadePhase::GameOver);
    }

    #[test]
    fn test_health_heals_capped_and_adds_feet() {
        let mut s = state();
        let mut rng = ScriptedRandom::constant(1.0);
        s.phase = ArcadePhase::Playing;
        // Pickup hovers at jump height
        s.player.top -= 40.0;
        let id = plant_obstacle(&mut s);
        if let Some(tile) = s.tiles.get_mut(&id) {
            tile.has_obstacle = false;
            tile.has_health = true;
        }
        let events = tick(&mut s, &ArcadeInput::default(), 0.0, &mut rng);
        assert!(events.contains(&ArcadeEvent::HealthCollected {
            tile_id: id,
            lives: s.max_lives
        }));
        assert_eq!(s.lives, s.max_lives);
        assert_eq!(s.feet, s.config.health_bonus_feet);

        tick(&mut s, &ArcadeInput::default(), 0.0, &mut rng);
        assert_eq!(s.feet, s.config.health_bonus_feet);
    }

    #[test]
    fn test_pause_freezes_world() {
        let mut s = state();
        let mut rng = ScriptedRandom::constant(1.0);
        tick(&mut s, &jump(), FRAME_MS, &mut rng);
        let pause = ArcadeInput {
            pause: true,
            ..Default::default()
        };
        tick(&mut s, &pause, FRAME_MS, &mut rng);
        assert_eq!(s.phase, ArcadePhase::Paused);
        let feet = s.feet;
        for _ in 0..10 {
            tick(&mut s, &ArcadeInput::default(), FRAME_MS, &mut rng);
        }
        assert_eq!(s.feet, feet);
        tick(&mut s, &pause, FRAME_MS, &mut rng);
        assert_eq!(s.phase, ArcadePhase::Playing);
        assert!(s.feet > feet);
    }

    #[test]
    fn test_restart_after_game_over() {
        let mut s = state();
        let mut rng = ScriptedRandom::constant(1.0);
        let stop = ArcadeInput {
            stop: true,
            ..Default::default()
        };
        tick(&mut s, &stop, FRAME_MS, &mut rng);
        assert_eq!(s.phase, ArcadePhase::GameOver);
        let restart = ArcadeInput {
            restart: true,
            ..Default::default()
        };
        let events = tick(&mut s, &restart, FRAME_MS, &mut rng);
        assert_eq!(events, vec![ArcadeEvent::Restarted]);
        assert_eq!(s.phase, ArcadePhase::Ready);
        assert_eq!(s.tiles.len(), 1);
    }

    #[test]
    fn test_seeded_runs_match() {
        use crate::sim::random::RunSeed;
        let mut a = state();
        let mut b = state();
        let mut rng_a = RunSeed(7).to_rng();
        let mut rng_b = RunSeed(7).to_rng();
        tick(&mut a, &jump(), 0.0, &mut rng_a);
        tick(&mut b, &jump(), 0.0, &mut rng_b);
        for i in 0..600 {
            let input = if i % 45 == 0 { jump() } else { ArcadeInput::default() };
            tick(&mut a, &input, FRAME_MS, &mut rng_a);
            tick(&mut b, &input, FRAME_MS, &mut rng_b);
        }
        assert_eq!(ArcadeSnapshot::from(&a), ArcadeSnapshot::from(&b));
    }
}
