//! Screen-space hit boxes

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in screen pixels (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Top-left corner
    pub min: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            min: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.min.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.min.x + self.size.x
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.min.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.min.y + self.size.y
    }

    /// Same rectangle moved by `offset`
    pub fn translated(&self, offset: Vec2) -> Self {
        Self {
            min: self.min + offset,
            size: self.size,
        }
    }
}

/// Player-versus-target overlap.
///
/// Horizontal spans must overlap and the player's feet must be below the
/// target's top edge. Targets sit on the ground, so there is no check for
/// the player being fully underneath one.
pub fn hits(player: &Rect, target: &Rect) -> bool {
    player.left() < target.right()
        && player.right() > target.left()
        && player.bottom() > target.top()
}
