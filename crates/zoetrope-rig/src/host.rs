use std::ffi::{CStr, c_void};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use zoetrope::host::{GraphicsContextRef, GraphicsHost, RenderTarget};

static PROC_SENTINEL: u8 = 0;

/// Stand-in for a UI framework's render-thread surface: one fake graphics
/// context, a rotating FBO target, and a proc resolver that hands out a
/// sentinel address while counting lookups.
pub struct HeadlessHost {
    bound: AtomicBool,
    frames_served: AtomicU64,
    resolved: AtomicU64,
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self {
            bound: AtomicBool::new(false),
            frames_served: AtomicU64::new(0),
            resolved: AtomicU64::new(0),
        }
    }

    /// Marks the fake context current, as a render thread would before its
    /// first frame.
    pub fn bind(&self) {
        self.bound.store(true, Ordering::Release);
    }

    pub fn resolved(&self) -> u64 {
        self.resolved.load(Ordering::Relaxed)
    }
}

impl GraphicsHost for HeadlessHost {
    fn current_context(&self) -> Option<GraphicsContextRef> {
        if self.bound.load(Ordering::Acquire) {
            Some(GraphicsContextRef::from_raw(NonZeroUsize::MIN))
        } else {
            None
        }
    }

    fn make_current(&self, _context: GraphicsContextRef) -> bool {
        self.bound.store(true, Ordering::Release);
        true
    }

    fn resolve_proc_address(&self, _context: GraphicsContextRef, name: &CStr) -> *mut c_void {
        self.resolved.fetch_add(1, Ordering::Relaxed);
        log::debug!("resolving {name:?}");
        &PROC_SENTINEL as *const u8 as *mut c_void
    }

    // A window being resized: the target switches size every 30 frames.
    fn current_target(&self) -> RenderTarget {
        const SIZES: [(u32, u32); 3] = [(1920, 1080), (1280, 720), (960, 540)];
        let frame = self.frames_served.fetch_add(1, Ordering::Relaxed);
        let (width, height) = SIZES[(frame / 30) as usize % SIZES.len()];
        RenderTarget::new(3, width, height)
    }
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new()
    }
}
