//! Simulation module
//!
//! All gameplay logic lives here. This module must stay deterministic:
//! - Elapsed time is passed in, never sampled
//! - Randomness comes from an injected [`RandomSource`]
//! - Stable iteration order (by tile id)
//! - No rendering or platform dependencies

pub mod arcade;
pub mod random;
pub mod reaction;
pub mod scoring;

pub use arcade::{ArcadeConfig, ArcadeEvent, ArcadeInput, ArcadePhase, ArcadeSnapshot, ArcadeState};
pub use random::{RandomSource, RunSeed, ScriptedRandom};
pub use reaction::{
    ReactionEvent, ReactionSession, ReactionSnapshot, ReactionState, Trigger, transition,
};
pub use scoring::{PointBucket, points_table, score_for_reaction};
