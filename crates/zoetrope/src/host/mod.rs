//! Host UI framework seam.
//!
//! Everything the bridge needs from the embedding framework lives behind two
//! traits: [`GraphicsHost`] for graphics-context and render-target access on
//! the render thread, and [`RepaintScheduler`] for the fire-and-forget
//! repaint request that may arrive from any thread. `repaint_queue` provides
//! a ready-made scheduler for hosts that drain repaint intents from a loop
//! instead of owning a native event queue.

mod queue;

use std::ffi::{CStr, c_void};
use std::num::NonZeroUsize;

use raw_window_handle::RawDisplayHandle;

pub use queue::{QueuedScheduler, RepaintReceiver, repaint_queue};

/// Non-owning token for a native graphics context.
///
/// The wrapped value is host-defined (typically the address of the
/// framework's context object or a native context id). Validity is tied to
/// the host's context lifecycle; the bridge only stores and compares tokens,
/// it never dereferences them.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct GraphicsContextRef(NonZeroUsize);

impl GraphicsContextRef {
    #[inline]
    pub const fn from_raw(raw: NonZeroUsize) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn as_raw(self) -> NonZeroUsize {
        self.0
    }
}

/// Per-frame description of the host's active off-screen target.
///
/// Constructed fresh each frame from the framework's current FBO and handed
/// to the engine's render call. Never cached across frames; the host may
/// reallocate the target between frames (resizes, surface rebuilds).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RenderTarget {
    /// Native framebuffer object name as the host's GL context knows it.
    pub fbo: u32,

    /// Target width in pixels.
    pub width: u32,

    /// Target height in pixels.
    pub height: u32,

    /// GL internal format of the color attachment, or 0 when unspecified.
    ///
    /// 0 lets the engine query the attachment itself, which is correct for
    /// framework-allocated FBOs.
    pub internal_format: i32,
}

impl RenderTarget {
    /// Describes `fbo` with an unspecified internal format.
    #[inline]
    pub const fn new(fbo: u32, width: u32, height: u32) -> Self {
        Self {
            fbo,
            width,
            height,
            internal_format: 0,
        }
    }
}

/// Render-thread services the embedding framework provides.
///
/// All methods except `display_handle` are called on the framework's render
/// thread, either directly by the bridge or re-entered through the engine's
/// proc-address callback while an engine call is on the stack. Implementations
/// must therefore not assume a quiescent engine when these run.
pub trait GraphicsHost: Send + Sync {
    /// Returns the graphics context currently bound on the calling thread,
    /// if any.
    fn current_context(&self) -> Option<GraphicsContextRef>;

    /// Binds `context` on the calling thread, using the owning item's
    /// off-screen surface.
    ///
    /// Returns false when the context cannot be bound here (wrong thread,
    /// surface gone). Must not panic; the resolver treats false as
    /// "resolution unavailable".
    fn make_current(&self, context: GraphicsContextRef) -> bool;

    /// Looks up a graphics-API entry point by name in `context`.
    ///
    /// Only called while `context` is current on the calling thread. A null
    /// return means the symbol does not exist; the engine copes with missing
    /// entry points according to its own rules.
    fn resolve_proc_address(&self, context: GraphicsContextRef, name: &CStr) -> *mut c_void;

    /// Describes the framework's active off-screen target for this frame.
    fn current_target(&self) -> RenderTarget;

    /// Native display connection for engines that talk to the windowing
    /// system directly.
    ///
    /// The default reports no connection, which makes the bridge omit the
    /// platform-display parameter at context creation. Only hosts on
    /// windowing systems the engine supports should override this.
    fn display_handle(&self) -> Option<RawDisplayHandle> {
        None
    }
}

/// Fire-and-forget repaint request into the UI framework.
///
/// Invoked from arbitrary threads, including engine worker threads, so
/// implementations must be thread-safe and must never block the caller. The
/// framework is free to coalesce requests; callers only rely on "at least one
/// repaint happens eventually".
pub trait RepaintScheduler: Send + Sync {
    fn request_repaint(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nz(raw: usize) -> NonZeroUsize {
        NonZeroUsize::new(raw).unwrap()
    }

    #[test]
    fn context_tokens_compare_by_value() {
        let a = GraphicsContextRef::from_raw(nz(0x1000));
        let b = GraphicsContextRef::from_raw(nz(0x1000));
        let c = GraphicsContextRef::from_raw(nz(0x2000));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_raw().get(), 0x1000);
    }

    #[test]
    fn target_defaults_to_unspecified_format() {
        let target = RenderTarget::new(7, 1920, 1080);
        assert_eq!(target.fbo, 7);
        assert_eq!(target.width, 1920);
        assert_eq!(target.height, 1080);
        assert_eq!(target.internal_format, 0);
    }
}
