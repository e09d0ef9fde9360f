//! Two-phase jump animation
//!
//! A jump rises to `top - height` and falls back to the resting offset.
//! While airborne, one extra jump (a double jump) is accepted per ground
//! contact; any further requests are ignored until landing.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum JumpPhase {
    Grounded,
    /// Rising toward `target` (screen y)
    Ascending { target: f32 },
    /// Falling back to the resting offset
    Descending,
}

/// Vertical state of the player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jumper {
    /// Current top edge (screen y)
    pub top: f32,
    /// Top edge when standing on the ground
    pub rest_top: f32,
    pub phase: JumpPhase,
    pub double_jump_used: bool,
}

impl Jumper {
    pub fn new(rest_top: f32) -> Self {
        Self {
            top: rest_top,
            rest_top,
            phase: JumpPhase::Grounded,
            double_jump_used: false,
        }
    }

    pub fn airborne(&self) -> bool {
        self.phase != JumpPhase::Grounded
    }

    /// Start a jump of `height` pixels. Returns false when the request is ignored.
    pub fn request(&mut self, height: f32) -> bool {
        if self.airborne() {
            if self.double_jump_used {
                log::trace!("Jump ignored, double jump already used");
                return false;
            }
            self.double_jump_used = true;
        }
        self.phase = JumpPhase::Ascending {
            target: self.top - height,
        };
        true
    }

    /// Move by `speed` pixels per second for `elapsed_secs`
    pub fn update(&mut self, elapsed_secs: f32, speed: f32) {
        let step = speed * elapsed_secs.max(0.0);
        match self.phase {
            JumpPhase::Grounded => {}
            JumpPhase::Ascending { target } => {
                self.top -= step;
                if self.top <= target {
                    self.top = target;
                    self.phase = JumpPhase::Descending;
                }
            }
            JumpPhase::Descending => {
                self.top += step;
                if self.top >= self.rest_top {
                    self.top = self.rest_top;
                    self.phase = JumpPhase::Grounded;
                    self.double_jump_used = false;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_jump_cycle() {
        let mut j = Jumper::new(160.0);
        assert!(j.request(80.0));
        j.update(0.1, 400.0);
        assert_eq!(j.top, 120.0);
        j.update(0.1, 400.0);
        assert_eq!(j.top, 80.0);
        assert_eq!(j.phase, JumpPhase::Descending);
        j.update(0.1, 400.0);
        j.update(0.2, 400.0);
        assert_eq!(j.top, 160.0);
        assert_eq!(j.phase, JumpPhase::Grounded);
    }

    #[test]
    fn test_one_double_jump_per_landing() {
        let mut j = Jumper::new(160.0);
        assert!(j.request(80.0));
        j.update(0.1, 400.0);
        // Double jump rises from the current height
        assert!(j.request(80.0));
        assert_eq!(j.phase, JumpPhase::Ascending { target: 40.0 });
        assert!(!j.request(80.0));

        for _ in 0..100 {
            j.update(0.05, 400.0);
        }
        assert!(!j.airborne());
        assert!(!j.double_jump_used);
        assert!(j.request(80.0));
        assert!(j.request(80.0));
    }
}
