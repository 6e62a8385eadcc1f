use std::ffi::c_void;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::engine::FrameReadyCallback;
use crate::host::RepaintScheduler;

/// Carries "a new frame is ready" signals from engine threads to the UI
/// scheduler, collapsing bursts into a single repaint request.
///
/// The engine may fire its callback from any thread and at any rate. The
/// bridge keeps one pending bit: the first notification after a consumed
/// frame requests a repaint, every further one before the next frame only
/// re-confirms the bit. The renderer clears the bit at the top of each
/// frame with [`take_pending`](Self::take_pending), re-arming the edge.
pub struct RedrawBridge {
    scheduler: Arc<dyn RepaintScheduler>,
    pending: AtomicBool,
}

impl RedrawBridge {
    pub fn new(scheduler: Arc<dyn RepaintScheduler>) -> Self {
        Self {
            scheduler,
            pending: AtomicBool::new(false),
        }
    }

    /// Records a frame-ready signal. Safe to call from any thread.
    pub fn notify_frame_ready(&self) {
        if !self.pending.swap(true, Ordering::AcqRel) {
            self.scheduler.request_repaint();
        }
    }

    /// Consumes the pending bit, returning whether a signal arrived since
    /// the last call.
    pub fn take_pending(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    /// Callback descriptor for the engine, pointing back at this bridge.
    ///
    /// Non-owning: the `Arc` anchored in the item's state keeps the bridge
    /// alive until the engine's destroy call has quiesced its callbacks.
    pub(crate) fn engine_callback(&self) -> FrameReadyCallback {
        FrameReadyCallback {
            notify: frame_ready_trampoline,
            ctx: self as *const Self as *mut c_void,
        }
    }
}

/// C-callable trampoline the engine fires when a frame is ready.
///
/// # Safety
///
/// `ctx` must point at a live [`RedrawBridge`] for the duration of the call.
pub(crate) unsafe extern "C" fn frame_ready_trampoline(ctx: *mut c_void) {
    if ctx.is_null() {
        return;
    }
    let bridge = unsafe { &*(ctx as *const RedrawBridge) };
    bridge.notify_frame_ready();
}
