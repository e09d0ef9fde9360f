//! Wall-clock delta sampling

/// Milliseconds from a monotonic-ish clock
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or_else(js_sys::Date::now)
}

/// Milliseconds since the first call
#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    use std::sync::OnceLock;
    use std::time::Instant;

    static START: OnceLock<Instant> = OnceLock::new();
    START.get_or_init(Instant::now).elapsed().as_secs_f64() * 1000.0
}

/// Turns successive timestamps into elapsed milliseconds
#[derive(Debug, Clone, Default)]
pub struct DeltaClock {
    last: Option<f64>,
}

impl DeltaClock {
    pub fn new() -> Self {
        Self { last: None }
    }

    /// Elapsed ms since the previous sample. The first sample yields 0, and
    /// a clock that runs backwards yields 0 rather than a negative delta.
    pub fn sample(&mut self, now: f64) -> f64 {
        let elapsed = match self.last {
            Some(last) => (now - last).max(0.0),
            None => 0.0,
        };
        self.last = Some(now);
        elapsed
    }

    /// Like [`sample`](Self::sample) but capped, for physics that must not
    /// jump after a stalled tab
    pub fn sample_clamped(&mut self, now: f64, max_ms: f64) -> f64 {
        self.sample(now).min(max_ms)
    }

    /// Forget the previous sample (e.g. after resuming from a hidden tab)
    pub fn reset(&mut self) {
        self.last = None;
    }
}
