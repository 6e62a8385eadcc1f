use std::ffi::{CStr, c_char, c_void};
use std::sync::Arc;

use crate::engine::ProcResolver;
use crate::host::{GraphicsContextRef, GraphicsHost};

/// Everything the engine's proc-address callback needs, pinned behind a box
/// owned by the item's [`ViewState`](super::ViewState).
///
/// The engine may call back during context creation (on the render thread)
/// or later from its own threads. In both cases the graphics context this
/// state was created against must be current before any symbol is resolved,
/// so the resolver re-checks and rebinds on every call.
pub(crate) struct ResolverState {
    host: Arc<dyn GraphicsHost>,
    context: GraphicsContextRef,
}

impl ResolverState {
    pub(crate) fn new(host: Arc<dyn GraphicsHost>, context: GraphicsContextRef) -> Self {
        Self { host, context }
    }

    /// Callback descriptor pointing at this state. The returned value is
    /// only valid while the box holding `self` stays anchored.
    pub(crate) fn as_proc_resolver(&self) -> ProcResolver {
        ProcResolver {
            resolve: resolve_proc_address,
            ctx: self as *const Self as *mut c_void,
        }
    }

    fn resolve(&self, name: &CStr) -> *mut c_void {
        let current = self.host.current_context() == Some(self.context);
        if !current && !self.host.make_current(self.context) {
            log::warn!(
                "cannot resolve {:?}: graphics context not current and rebinding failed",
                name
            );
            return std::ptr::null_mut();
        }
        self.host.resolve_proc_address(self.context, name)
    }
}

/// C-callable trampoline handed to the engine as its proc resolver.
///
/// # Safety
///
/// `ctx` must point at a live [`ResolverState`] and `name` at a
/// NUL-terminated string, both valid for the duration of the call.
pub(crate) unsafe extern "C" fn resolve_proc_address(
    ctx: *mut c_void,
    name: *const c_char,
) -> *mut c_void {
    if ctx.is_null() || name.is_null() {
        return std::ptr::null_mut();
    }
    let state = unsafe { &*(ctx as *const ResolverState) };
    let name = unsafe { CStr::from_ptr(name) };
    state.resolve(name)
}
