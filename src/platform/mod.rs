//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Time sampling and frame deltas
//! - Input events (single pending slot, key mapping)
//! - Frame callback scheduling and teardown

pub mod frame;
pub mod input;
pub mod time;

pub use frame::{CancelToken, FrameLoop};
pub use input::{KeyAction, PendingEvent, map_key};
pub use time::{DeltaClock, now_ms};
