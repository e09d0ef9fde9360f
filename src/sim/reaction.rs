//! Speed-tap reaction game
//!
//! Round lifecycle:
//! `Interim -> CountDown -> Waiting -> Interim | GameOver`, with
//! `GameOver -> Interim` only through an explicit hit (restart).
//!
//! Each tick applies the pending trigger first, then advances time-based
//! transitions by the real elapsed time.

use serde::{Deserialize, Serialize};

use super::scoring::{PointBucket, POINT_BUCKETS, points_table, score_in_table};
use crate::consts::{MIN_COUNTDOWN_SECS, REACTION_MAX_LIVES};
use crate::mode::GameMode;

/// Current round state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReactionState {
    /// Between rounds, starts the next one on the following update
    Interim,
    /// Countdown running, tapping now is a miss
    CountDown,
    /// Reaction window, tapping now is scored
    Waiting,
    /// Out of lives
    GameOver,
}

/// Discrete external trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trigger {
    /// Tap / click / key. Restarts from GameOver.
    Hit,
    /// Quit the session
    Stop,
}

/// Something the view layer may want to react to
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ReactionEvent {
    /// A hit during the reaction window
    Scored { clocked_ms: f64, points: u32 },
    /// Tapped before the reaction window opened
    EarlyTap,
    /// Session ended
    GameOver { score: u64 },
    /// Session reset from GameOver
    Restarted,
}

/// Complete reaction game session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionSession {
    mode: GameMode,
    pub state: ReactionState,
    pub score: u64,
    pub lives: u8,
    pub max_lives: u8,
    /// Consecutive scoring hits
    pub streak: u32,
    /// Clocked times in ms, append-only within a session
    pub time_log: Vec<f64>,
    pub best_time: Option<f64>,
    pub average_time: Option<f64>,
    /// Countdown length for the current round (seconds)
    pub timer: f64,
    pub timer_min: f64,
    pub timer_max: f64,
    /// Seconds left on the countdown
    pub time_left: f64,
    /// Milliseconds spent in the reaction window this round
    pub time_waiting: f64,
    /// Last clocked reaction
    pub clocked_time: Option<f64>,
    waiting: bool,
    stopped: bool,
    points: [PointBucket; POINT_BUCKETS],
}

impl ReactionSession {
    /// Start a session for the selected mode
    pub fn new(mode: GameMode) -> Self {
        let timer_min = MIN_COUNTDOWN_SECS;
        let timer_max = mode.effective_timer().max(timer_min);
        let points = points_table(mode.effective_speed());
        log::debug!(
            "Reaction session for mode '{}' (speed {} ms, timer {} s)",
            mode.level,
            mode.effective_speed(),
            timer_max
        );
        Self {
            mode,
            state: ReactionState::Interim,
            score: 0,
            lives: REACTION_MAX_LIVES,
            max_lives: REACTION_MAX_LIVES,
            streak: 0,
            time_log: Vec::new(),
            best_time: None,
            average_time: None,
            timer: timer_max,
            timer_min,
            timer_max,
            time_left: timer_max,
            time_waiting: 0.0,
            clocked_time: None,
            waiting: false,
            stopped: false,
            points,
        }
    }

    pub fn mode(&self) -> &GameMode {
        &self.mode
    }

    pub fn points_table(&self) -> &[PointBucket] {
        &self.points
    }

    /// Zero score, lives and log; keep the mode
    pub fn reset(&mut self) {
        self.state = ReactionState::Interim;
        self.score = 0;
        self.lives = self.max_lives;
        self.streak = 0;
        self.time_log.clear();
        self.best_time = None;
        self.average_time = None;
        self.clocked_time = None;
        self.reset_timer();
        self.time_waiting = 0.0;
        self.waiting = false;
        self.stopped = false;
    }

    /// Start the next round's countdown
    pub fn next_round(&mut self) {
        self.waiting = false;
        self.stopped = false;
        self.time_waiting = 0.0;
        self.reset_timer();
        self.state = ReactionState::CountDown;
    }

    fn reset_timer(&mut self) {
        self.timer = self.timer_max;
        self.time_left = self.timer;
    }

    /// Apply an external trigger
    pub fn apply(&mut self, trigger: Trigger) -> Option<ReactionEvent> {
        match trigger {
            Trigger::Stop => self.game_over(),
            Trigger::Hit => match self.state {
                ReactionState::GameOver => {
                    self.reset();
                    log::info!("Reaction session restarted");
                    Some(ReactionEvent::Restarted)
                }
                ReactionState::Waiting => Some(self.clock_hit()),
                ReactionState::Interim | ReactionState::CountDown => {
                    self.streak = 0;
                    self.reset_timer();
                    if self.lose_life() {
                        self.game_over()
                    } else {
                        Some(ReactionEvent::EarlyTap)
                    }
                }
            },
        }
    }

    fn clock_hit(&mut self) -> ReactionEvent {
        self.stopped = true;
        self.waiting = false;

        let clocked = self.time_waiting;
        self.clocked_time = Some(clocked);
        self.best_time = Some(self.best_time.map_or(clocked, |best| best.min(clocked)));
        self.time_log.push(clocked);
        self.average_time = average(&self.time_log);

        let points = score_in_table(&self.points, clocked);
        self.score += u64::from(points);
        log::debug!("Clocked {:.0} ms for {} points", clocked, points);

        if points > 0 {
            self.streak += 1;
        } else {
            self.streak = 0;
            if self.lose_life() {
                if let Some(event) = self.game_over() {
                    return event;
                }
            }
        }
        self.state = ReactionState::Interim;
        ReactionEvent::Scored {
            clocked_ms: clocked,
            points,
        }
    }

    /// Returns true when this took the last life
    fn lose_life(&mut self) -> bool {
        self.lives = self.lives.saturating_sub(1);
        self.lives == 0
    }

    fn game_over(&mut self) -> Option<ReactionEvent> {
        if self.state == ReactionState::GameOver {
            return None;
        }
        self.waiting = false;
        self.stopped = true;
        self.state = ReactionState::GameOver;
        log::info!("Reaction game over: score {}", self.score);
        Some(ReactionEvent::GameOver { score: self.score })
    }

    /// Advance time-based transitions by `elapsed_ms`
    pub fn update(&mut self, elapsed_ms: f64) {
        let elapsed_ms = elapsed_ms.max(0.0);
        match self.state {
            ReactionState::Interim => self.next_round(),
            ReactionState::CountDown => {
                self.time_left -= elapsed_ms / 1000.0;
                if self.time_left <= 0.0 {
                    self.time_left = 0.0;
                    self.time_waiting = 0.0;
                    self.waiting = true;
                    self.state = ReactionState::Waiting;
                }
            }
            ReactionState::Waiting => {
                if self.waiting && !self.stopped {
                    self.time_waiting += elapsed_ms;
                }
            }
            ReactionState::GameOver => {}
        }
    }
}

/// Rounded mean of a non-empty log
fn average(log: &[f64]) -> Option<f64> {
    if log.is_empty() {
        return None;
    }
    Some((log.iter().sum::<f64>() / log.len() as f64).round())
}

/// One simulation tick: trigger first, then time
pub fn tick(
    session: &mut ReactionSession,
    trigger: Option<Trigger>,
    elapsed_ms: f64,
) -> Option<ReactionEvent> {
    let event = trigger.and_then(|t| session.apply(t));
    session.update(elapsed_ms);
    event
}

/// Pure form of [`tick`]: returns the next session instead of mutating
pub fn transition(
    mut session: ReactionSession,
    trigger: Option<Trigger>,
    elapsed_ms: f64,
) -> (ReactionSession, Option<ReactionEvent>) {
    let event = tick(&mut session, trigger, elapsed_ms);
    (session, event)
}

/// One-way copy handed to the view every frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionSnapshot {
    pub state: ReactionState,
    pub score: u64,
    pub lives: u8,
    pub max_lives: u8,
    pub streak: u32,
    pub time_left: f64,
    pub time_waiting: f64,
    pub clocked_time: Option<f64>,
    pub best_time: Option<f64>,
    pub average_time: Option<f64>,
    pub rounds: usize,
}

impl From<&ReactionSession> for ReactionSnapshot {
    fn from(s: &ReactionSession) -> Self {
        Self {
            state: s.state,
            score: s.score,
            lives: s.lives,
            max_lives: s.max_lives,
            streak: s.streak,
            time_left: s.time_left,
            time_waiting: s.time_waiting,
            clocked_time: s.clocked_time,
            best_time: s.best_time,
            average_time: s.average_time,
            rounds: s.time_log.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const FRAME_MS: f64 = 1000.0 / 60.0;

    fn session() -> ReactionSession {
        ReactionSession::new(GameMode::new("m", "normal", 1000.0, 2.0))
    }

    /// Tick without input until the reaction window opens
    fn run_to_waiting(s: &mut ReactionSession) {
        for _ in 0..10_000 {
            if s.state == ReactionState::Waiting {
                return;
            }
            tick(s, None, FRAME_MS);
        }
        panic!("never reached Waiting");
    }

    #[test]
    fn test_interim_starts_countdown() {
        let mut s = session();
        assert_eq!(s.state, ReactionState::Interim);
        tick(&mut s, None, FRAME_MS);
        assert_eq!(s.state, ReactionState::CountDown);
        assert_eq!(s.time_left, s.timer_max);
    }

    #[test]
    fn test_countdown_reaches_waiting() {
        let mut s = session();
        tick(&mut s, None, 0.0);
        tick(&mut s, None, 1500.0);
        assert_eq!(s.state, ReactionState::CountDown);
        assert!((s.time_left - 0.5).abs() < 1e-9);
        tick(&mut s, None, 500.0);
        assert_eq!(s.state, ReactionState::Waiting);
    }

    #[test]
    fn test_waiting_accumulates_and_scores() {
        let mut s = session();
        run_to_waiting(&mut s);
        tick(&mut s, None, 150.0);
        tick(&mut s, None, 100.0);
        assert_eq!(s.time_waiting, 250.0);

        let event = tick(&mut s, Some(Trigger::Hit), FRAME_MS);
        assert_eq!(
            event,
            Some(ReactionEvent::Scored {
                clocked_ms: 250.0,
                points: 64
            })
        );
        assert_eq!(s.score, 64);
        assert_eq!(s.streak, 1);
        assert_eq!(s.time_log, vec![250.0]);
        assert_eq!(s.best_time, Some(250.0));
        assert_eq!(s.average_time, Some(250.0));
        // Back to Interim, and the same tick's update starts the next round
        assert_eq!(s.state, ReactionState::CountDown);
    }

    #[test]
    fn test_best_and_average_over_rounds() {
        let mut s = session();
        for wait in [300.0, 201.0, 400.0] {
            run_to_waiting(&mut s);
            tick(&mut s, None, wait);
            tick(&mut s, Some(Trigger::Hit), 0.0);
        }
        assert_eq!(s.time_log, vec![300.0, 201.0, 400.0]);
        assert_eq!(s.best_time, Some(201.0));
        assert_eq!(s.average_time, Some(300.0));
        assert_eq!(s.streak, 3);
    }

    #[test]
    fn test_slow_hit_costs_a_life() {
        let mut s = session();
        run_to_waiting(&mut s);
        tick(&mut s, None, 1200.0);
        let event = tick(&mut s, Some(Trigger::Hit), 0.0);
        assert_eq!(
            event,
            Some(ReactionEvent::Scored {
                clocked_ms: 1200.0,
                points: 0
            })
        );
        assert_eq!(s.lives, 4);
        assert_eq!(s.streak, 0);
        assert_eq!(s.time_log.len(), 1);
    }

    #[test]
    fn test_five_early_taps_end_the_game() {
        let mut s = session();
        tick(&mut s, None, FRAME_MS);
        assert_eq!(s.state, ReactionState::CountDown);
        for i in 1..=5u8 {
            tick(&mut s, Some(Trigger::Hit), FRAME_MS);
            if i < 5 {
                assert_eq!(s.state, ReactionState::CountDown);
                assert_eq!(s.lives, 5 - i);
            }
        }
        assert_eq!(s.state, ReactionState::GameOver);
        assert_eq!(s.lives, 0);
    }

    #[test]
    fn test_early_tap_resets_countdown() {
        let mut s = session();
        tick(&mut s, None, 0.0);
        tick(&mut s, None, 1000.0);
        assert!(s.time_left < s.timer_max);
        s.apply(Trigger::Hit);
        assert_eq!(s.state, ReactionState::CountDown);
        assert_eq!(s.time_left, s.timer_max);
        assert_eq!(s.streak, 0);
    }

    #[test]
    fn test_hit_in_game_over_restarts() {
        let mut s = session();
        run_to_waiting(&mut s);
        tick(&mut s, None, 200.0);
        tick(&mut s, Some(Trigger::Hit), 0.0);
        assert!(s.score > 0);
        tick(&mut s, Some(Trigger::Stop), 0.0);
        assert_eq!(s.state, ReactionState::GameOver);

        let event = s.apply(Trigger::Hit);
        assert_eq!(event, Some(ReactionEvent::Restarted));
        assert_eq!(s.state, ReactionState::Interim);
        assert_eq!(s.score, 0);
        assert_eq!(s.lives, s.max_lives);
        assert_eq!(s.streak, 0);
        assert!(s.time_log.is_empty());
        assert_eq!(s.mode().level, "normal");

        s.update(FRAME_MS);
        assert_eq!(s.state, ReactionState::CountDown);
    }

    #[test]
    fn test_game_over_is_frozen() {
        let mut s = session();
        s.apply(Trigger::Stop);
        let before = ReactionSnapshot::from(&s);
        for _ in 0..10 {
            tick(&mut s, None, 500.0);
        }
        assert_eq!(ReactionSnapshot::from(&s), before);
        // A second stop does not re-announce game over
        assert_eq!(s.apply(Trigger::Stop), None);
    }

    #[test]
    fn test_transition_leaves_input_untouched() {
        let s = session();
        let (next, _) = transition(s.clone(), Some(Trigger::Hit), FRAME_MS);
        assert_eq!(s.lives, 5);
        assert_eq!(next.lives, 4);
    }

    #[test]
    fn test_zero_speed_mode_does_not_panic() {
        let mut s = ReactionSession::new(GameMode::new("z", "broken", 0.0, f64::NAN));
        assert_eq!(s.timer_max, crate::consts::DEFAULT_TIMER_SECS);
        run_to_waiting(&mut s);
        tick(&mut s, None, 0.5);
        tick(&mut s, Some(Trigger::Hit), 0.0);
        assert_eq!(s.score, 1);
    }

    fn trigger() -> impl Strategy<Value = Option<Trigger>> {
        prop_oneof![
            6 => Just(None),
            3 => Just(Some(Trigger::Hit)),
            1 => Just(Some(Trigger::Stop)),
        ]
    }

    proptest! {
        #[test]
        fn prop_session_invariants(
            steps in proptest::collection::vec((trigger(), 0.0f64..400.0), 1..300)
        ) {
            let mut s = session();
            for (t, elapsed) in steps {
                let before = s.clone();
                let event = tick(&mut s, t, elapsed);
                prop_assert!(s.lives <= s.max_lives);
                if event == Some(ReactionEvent::Restarted) {
                    prop_assert!(s.time_log.is_empty());
                } else {
                    prop_assert!(s.score >= before.score);
                    prop_assert!(s.time_log.starts_with(&before.time_log));
                }
                if s.lives == 0 {
                    prop_assert_eq!(s.state, ReactionState::GameOver);
                }
                if let Some(best) = s.best_time {
                    prop_assert!(s.time_log.iter().all(|&t| best <= t));
                }
            }
        }
    }
}
