//! Sprite sheet animation
//!
//! [`SpriteDriver`] steps a frame index at a fixed FPS. It does not touch the
//! page itself: bound [`SpriteLayer`]s receive the resulting background
//! offset, and every bound layer shares one step index so they stay in
//! lockstep.

use serde::{Deserialize, Serialize};

/// Layout of one animation row in a sprite sheet
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpriteSheet {
    pub frame_width: f32,
    pub frame_height: f32,
    /// Frames (columns) in the row
    pub frames: u32,
    /// Row of the sheet to play
    pub row: u32,
}

/// CSS `background-position` offset in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BackgroundOffset {
    pub x: f32,
    pub y: f32,
}

impl BackgroundOffset {
    pub fn css(&self) -> String {
        format!("{}px {}px", self.x, self.y)
    }
}

/// A visual layer the driver writes offsets into
pub trait SpriteLayer {
    /// A paused layer holds the shared step for everyone
    fn is_paused(&self) -> bool {
        false
    }

    fn apply(&mut self, offset: BackgroundOffset);
}

/// Fixed-FPS frame stepper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpriteDriver {
    pub sheet: SpriteSheet,
    fps: f32,
    pause: bool,
    explicit_frame: Option<u32>,
    step: u32,
    pending_ms: f64,
    /// Offset must be re-applied on the next tick
    dirty: bool,
}

impl SpriteDriver {
    pub fn new(sheet: SpriteSheet, fps: f32) -> Self {
        Self {
            sheet,
            fps,
            pause: false,
            explicit_frame: None,
            step: 0,
            pending_ms: 0.0,
            dirty: true,
        }
    }

    /// Milliseconds between steps
    pub fn interval_ms(&self) -> f64 {
        let fps = if self.fps.is_finite() && self.fps > 0.0 {
            self.fps
        } else {
            1.0
        };
        1000.0 / f64::from(fps)
    }

    pub fn set_fps(&mut self, fps: f32) {
        self.fps = fps;
    }

    pub fn set_row(&mut self, row: u32) {
        if self.sheet.row != row {
            self.sheet.row = row;
            self.dirty = true;
        }
    }

    pub fn paused(&self) -> bool {
        self.pause
    }

    pub fn set_pause(&mut self, pause: bool) {
        if self.pause != pause {
            self.pause = pause;
            self.restart_clock();
        }
    }

    pub fn explicit_frame(&self) -> Option<u32> {
        self.explicit_frame
    }

    /// Pin a frame; `None` hands control back to autoplay
    pub fn set_explicit_frame(&mut self, frame: Option<u32>) {
        if self.explicit_frame != frame {
            self.explicit_frame = frame;
            self.restart_clock();
        }
    }

    fn restart_clock(&mut self) {
        self.pending_ms = 0.0;
        self.dirty = true;
    }

    /// Autoplay step index
    pub fn step(&self) -> u32 {
        self.step
    }

    fn frame_count(&self) -> u32 {
        self.sheet.frames.max(1)
    }

    /// Frame currently shown
    pub fn frame(&self) -> u32 {
        match self.explicit_frame {
            Some(frame) => frame.min(self.frame_count() - 1),
            None => self.step,
        }
    }

    pub fn offset(&self) -> BackgroundOffset {
        BackgroundOffset {
            x: -(self.frame() as f32 * self.sheet.frame_width),
            y: -(self.sheet.row as f32 * self.sheet.frame_height),
        }
    }

    /// Advance the clock. Returns the frame to apply when the layers need
    /// rewriting this tick.
    pub fn advance(&mut self, elapsed_ms: f64, layer_paused: bool) -> Option<u32> {
        let held = self.pause || self.explicit_frame.is_some() || layer_paused;
        let mut stepped = false;

        if !held {
            let interval = self.interval_ms();
            self.pending_ms += elapsed_ms.max(0.0);
            if self.pending_ms >= interval {
                // One step per tick; a long stall does not fast-forward
                self.pending_ms = (self.pending_ms - interval).min(interval);
                self.step = (self.step + 1) % self.frame_count();
                stepped = true;
            }
        }

        if stepped || self.dirty {
            self.dirty = false;
            Some(self.frame())
        } else {
            None
        }
    }

    /// Advance and write the offset to every bound layer
    pub fn tick(&mut self, elapsed_ms: f64, layers: &mut [&mut dyn SpriteLayer]) -> bool {
        let layer_paused = layers.iter().any(|layer| layer.is_paused());
        if self.advance(elapsed_ms, layer_paused).is_none() {
            return false;
        }
        let offset = self.offset();
        for layer in layers.iter_mut() {
            layer.apply(offset);
        }
        true
    }
}

/// Browser binding: writes `background-position` on an element
#[cfg(target_arch = "wasm32")]
pub mod css {
    use super::{BackgroundOffset, SpriteLayer};
    use web_sys::HtmlElement;

    pub struct CssSpriteLayer {
        element: HtmlElement,
    }

    impl CssSpriteLayer {
        pub fn new(element: HtmlElement) -> Self {
            Self { element }
        }
    }

    impl SpriteLayer for CssSpriteLayer {
        fn is_paused(&self) -> bool {
            let by_style = self
                .element
                .style()
                .get_property_value("animation-play-state")
                .map(|v| v == "paused")
                .unwrap_or(false);
            let by_data = self.element.dataset().get("paused").as_deref() == Some("true");
            by_style || by_data
        }

        fn apply(&mut self, offset: BackgroundOffset) {
            if let Err(e) = self
                .element
                .style()
                .set_property("background-position", &offset.css())
            {
                log::warn!("Failed to set sprite offset: {:?}", e);
            }
        }
    }
}
