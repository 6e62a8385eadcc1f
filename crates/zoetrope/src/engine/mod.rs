//! Media-engine seam.
//!
//! A playback engine plugs into the bridge by implementing [`RenderEngine`]:
//! opaque render-context creation from a tagged parameter list, the per-frame
//! update/render/report-swap operations, and registration of the frame-ready
//! callback the engine fires from its own worker threads. Callback types are
//! C-shaped so adapters over C engine APIs can pass them through untouched.

mod params;

#[cfg(feature = "mpv")]
pub mod mpv;

use std::ffi::{c_char, c_void};
use std::num::NonZeroU64;

use thiserror::Error;

pub use params::{CreationSpec, RenderApiType, RenderParam, RenderParamList};

/// C shape of the engine's proc-address lookup callback.
pub type GetProcAddressFn =
    unsafe extern "C" fn(ctx: *mut c_void, name: *const c_char) -> *mut c_void;

/// C shape of the engine's frame-ready notification callback.
pub type FrameReadyFn = unsafe extern "C" fn(ctx: *mut c_void);

/// Proc-address resolver handed to the engine at context creation.
///
/// The engine calls `resolve` with `ctx` as the first argument, synchronously
/// and repeatedly, during and after initialization. `ctx` must stay valid
/// until the render context is destroyed.
#[derive(Debug, Copy, Clone)]
pub struct ProcResolver {
    pub resolve: GetProcAddressFn,
    pub ctx: *mut c_void,
}

// SAFETY: a ProcResolver only transports a function pointer and its opaque
// context across the seam; dereferencing happens inside `resolve`, whose
// pointee the producer keeps alive and thread-safe for the registration's
// lifetime.
unsafe impl Send for ProcResolver {}
unsafe impl Sync for ProcResolver {}

/// Frame-ready callback registered with the engine after context creation.
///
/// The engine invokes `notify(ctx)` from an arbitrary thread whenever a new
/// frame is ready to present. The callback must return promptly.
#[derive(Debug, Copy, Clone)]
pub struct FrameReadyCallback {
    pub notify: FrameReadyFn,
    pub ctx: *mut c_void,
}

// SAFETY: same transport-only argument as ProcResolver; the producer keeps
// `ctx` alive and thread-safe until the engine guarantees quiescence.
unsafe impl Send for FrameReadyCallback {}
unsafe impl Sync for FrameReadyCallback {}

impl FrameReadyCallback {
    /// Invokes the callback the way the engine would.
    ///
    /// # Safety
    /// `ctx` must still satisfy the contract it was registered under: alive,
    /// and safe to touch from the calling thread.
    pub unsafe fn invoke(&self) {
        unsafe { (self.notify)(self.ctx) }
    }
}

/// Opaque engine-owned render context.
///
/// Non-null by construction; a successfully initialized owning item holds
/// exactly one for its whole life and never recreates it. Adapters map their
/// native context pointer or id into the wrapped value.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct RenderContextHandle(NonZeroU64);

impl RenderContextHandle {
    #[inline]
    pub const fn from_raw(raw: NonZeroU64) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn as_raw(self) -> NonZeroU64 {
        self.0
    }
}

/// Failures reported by a [`RenderEngine`].
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine returned a failure status from context creation.
    #[error("render context creation failed (engine status {status})")]
    ContextCreation { status: i32 },

    /// The parameter list violated the engine's contract.
    #[error("malformed render parameter list: {reason}")]
    BadParamList { reason: &'static str },
}

/// Render interface of an embedded media engine.
///
/// Implementations are shared across threads: creation and the per-frame
/// operations run on the host's render thread, while teardown may run from
/// whichever thread drops the owning item.
pub trait RenderEngine: Send + Sync {
    /// Creates the engine's render context from an ordered, sentinel-
    /// terminated parameter list.
    ///
    /// The engine may call the list's [`ProcResolver`] synchronously before
    /// this returns. Failure must leave the engine with no context; the
    /// caller treats it as fatal.
    fn create_render_context(
        &self,
        params: &RenderParamList,
    ) -> Result<RenderContextHandle, EngineError>;

    /// Registers the frame-ready callback for `handle`.
    ///
    /// The engine may fire it immediately and from any thread afterwards.
    fn set_frame_ready_callback(&self, handle: RenderContextHandle, callback: FrameReadyCallback);

    /// Drains engine-internal scheduling work accumulated since the last
    /// frame.
    fn update(&self, handle: RenderContextHandle);

    /// Renders the current frame using a parameter list carrying the target
    /// descriptor and flip flag.
    ///
    /// Engine-level render failures are not surfaced here; implementations
    /// log them and the frame is simply wrong on screen.
    fn render(&self, handle: RenderContextHandle, params: &RenderParamList);

    /// Acknowledges presentation of the last rendered frame.
    ///
    /// The engine's internal handshake stalls its dispatch queue until this
    /// arrives, so it must follow every render call before the next update.
    fn report_swap(&self, handle: RenderContextHandle);

    /// Destroys `handle`.
    ///
    /// Must not return while a frame-ready callback is executing and must
    /// guarantee no further invocations afterwards; callers release callback
    /// state as soon as this returns.
    fn destroy_render_context(&self, handle: RenderContextHandle);
}
