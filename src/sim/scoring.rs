//! Reaction time to points mapping
//!
//! A mode's target speed is split into ten buckets. Bucket `i` has threshold
//! `floor(speed * (10 - i) / 10)` ms and is worth `floor((10i + 10)^2 / 100)`
//! points, so thresholds shrink as points grow.

use serde::{Deserialize, Serialize};

/// Number of buckets in a points table
pub const POINT_BUCKETS: usize = 10;

/// One row of a points table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointBucket {
    /// Slowest reaction (ms) that still qualifies for this bucket
    pub threshold_ms: u32,
    pub points: u32,
}

/// Build the ordered points table for a target speed in milliseconds
pub fn points_table(target_speed_ms: f64) -> [PointBucket; POINT_BUCKETS] {
    let speed = sanitize_speed(target_speed_ms);
    std::array::from_fn(|i| {
        let i = i as u32;
        let step = 10 * i + 10;
        PointBucket {
            threshold_ms: (speed * f64::from(10 - i) / 10.0).floor() as u32,
            points: step * step / 100,
        }
    })
}

/// Points for a clocked reaction against a target speed.
///
/// Filters the buckets the reaction qualifies for (`reaction <= threshold`)
/// and takes the *last* match. Returns 0 when no bucket qualifies.
pub fn score_for_reaction(reaction_ms: f64, target_speed_ms: f64) -> u32 {
    score_in_table(&points_table(target_speed_ms), reaction_ms)
}

/// Same lookup against a precomputed table
pub fn score_in_table(table: &[PointBucket], reaction_ms: f64) -> u32 {
    table
        .iter()
        .filter(|bucket| reaction_ms <= f64::from(bucket.threshold_ms))
        .last()
        .map(|bucket| bucket.points)
        .unwrap_or(0)
}

/// Speeds that are absent, non-finite or not positive fall back to 1 ms
pub fn sanitize_speed(speed: f64) -> f64 {
    if speed.is_finite() && speed > 0.0 {
        speed
    } else {
        crate::consts::DEFAULT_SPEED
    }
}
