//! Frame callback scheduling
//!
//! Every stateful loop owns a [`FrameLoop`]. Cancelling it (or dropping it)
//! unregisters the pending callback, and a callback that still fires after
//! cancellation returns without touching any state.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Shared cancellation flag
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Rc<Cell<bool>>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

/// Callback slot shared with the scheduled frame. Emptied on cancel so
/// whatever the callback captured is dropped with it.
type Callback = Rc<RefCell<Option<Box<dyn FnMut(f64)>>>>;

/// A recurring per-frame callback, receiving the frame timestamp in ms
pub struct FrameLoop {
    token: CancelToken,
    callback: Callback,
    #[cfg(target_arch = "wasm32")]
    handle: Rc<Cell<Option<i32>>>,
}

impl FrameLoop {
    pub fn token(&self) -> CancelToken {
        self.token.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Whether the callback (and what it captured) is still held
    pub fn holds_callback(&self) -> bool {
        self.callback.borrow().is_some()
    }
}

/// Drop the callback. A callback cancelling its own loop is still borrowed;
/// the frame releases it once the call returns.
fn release(callback: &Callback) {
    if let Ok(mut slot) = callback.try_borrow_mut() {
        slot.take();
    }
}

fn boxed<F: FnMut(f64) + 'static>(callback: F) -> Callback {
    Rc::new(RefCell::new(Some(Box::new(callback))))
}

#[cfg(target_arch = "wasm32")]
mod browser {
    use std::cell::Cell;
    use std::rc::Rc;

    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::Closure;

    use super::{Callback, CancelToken, FrameLoop, boxed, release};

    impl FrameLoop {
        /// Schedule `callback` on every animation frame until cancelled
        pub fn start<F: FnMut(f64) + 'static>(callback: F) -> Self {
            let token = CancelToken::new();
            let handle = Rc::new(Cell::new(None));
            let callback = boxed(callback);
            schedule(token.clone(), handle.clone(), callback.clone());
            Self {
                token,
                callback,
                handle,
            }
        }

        pub fn cancel(&mut self) {
            if self.token.is_cancelled() {
                return;
            }
            self.token.cancel();
            if let Some(id) = self.handle.take() {
                if let Some(window) = web_sys::window() {
                    let _ = window.cancel_animation_frame(id);
                }
            }
            release(&self.callback);
            log::debug!("Frame loop cancelled");
        }
    }

    fn schedule(token: CancelToken, handle: Rc<Cell<Option<i32>>>, callback: Callback) {
        let Some(window) = web_sys::window() else {
            log::warn!("No window; frame loop not scheduled");
            return;
        };
        let next_token = token.clone();
        let next_handle = handle.clone();
        let closure = Closure::once(move |time: f64| {
            if next_token.is_cancelled() {
                release(&callback);
                return;
            }
            if let Some(f) = callback.borrow_mut().as_mut() {
                f(time);
            }
            if next_token.is_cancelled() {
                release(&callback);
            } else {
                schedule(next_token, next_handle, callback);
            }
        });
        match window.request_animation_frame(closure.as_ref().unchecked_ref()) {
            Ok(id) => handle.set(Some(id)),
            Err(e) => log::warn!("requestAnimationFrame failed: {:?}", e),
        }
        closure.forget();
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl FrameLoop {
    /// Register `callback`; natively frames are driven with [`pump`](Self::pump)
    pub fn start<F: FnMut(f64) + 'static>(callback: F) -> Self {
        Self {
            token: CancelToken::new(),
            callback: boxed(callback),
        }
    }

    /// Run one frame at `time`. Returns false once cancelled.
    pub fn pump(&mut self, time: f64) -> bool {
        if self.token.is_cancelled() {
            return false;
        }
        if let Some(f) = self.callback.borrow_mut().as_mut() {
            f(time);
        }
        true
    }

    pub fn cancel(&mut self) {
        if !self.token.is_cancelled() {
            self.token.cancel();
            release(&self.callback);
            log::debug!("Frame loop cancelled");
        }
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        self.cancel();
    }
}
