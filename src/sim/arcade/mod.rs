//! Side-scrolling arcade runner
//!
//! The world scrolls left under a fixed player. Tiles stream in on the
//! right, hazards and pickups are rolled onto the newest tile, and the
//! player jumps to clear obstacles.

pub mod collision;
pub mod jump;
pub mod state;
pub mod tick;

pub use collision::Rect;
pub use jump::{JumpPhase, Jumper};
pub use state::{ArcadeConfig, ArcadePhase, ArcadeSnapshot, ArcadeState, Tile};
pub use tick::{ArcadeEvent, ArcadeInput, tick};
