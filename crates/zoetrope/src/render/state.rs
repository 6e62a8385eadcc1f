use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use parking_lot::Mutex;

use super::notify::RedrawBridge;
use super::resolver::ResolverState;
use crate::engine::{RenderContextHandle, RenderEngine};

/// Lifecycle of one owning item's engine render context.
///
/// Exactly one `Uninitialized -> Initializing -> Ready` walk happens per
/// item. `Failed` is terminal; a failed item never retries.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum InitState {
    Uninitialized = 0,
    Initializing = 1,
    Ready = 2,
    Failed = 3,
}

impl InitState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Uninitialized,
            1 => Self::Initializing,
            2 => Self::Ready,
            _ => Self::Failed,
        }
    }
}

/// Outcome of claiming the one-time initialization slot.
pub(crate) enum InitClaim {
    /// Caller owns initialization and must finish with `install` or
    /// `fail_init`.
    Claimed,
    /// Initialization already completed; here is the handle.
    Ready(RenderContextHandle),
    /// A previous attempt failed, is still running, or the item was torn
    /// down. No new attempt is allowed.
    Refused,
}

type ReadySignal = Box<dyn FnOnce() + Send>;

/// Shared per-item state the owning UI item and the renderer both touch.
///
/// The item owns the `Arc`; the renderer keeps only a `Weak` and upgrades it
/// per frame, so a dying item invalidates render-time borrows cooperatively
/// instead of leaving dangling references. Everything the engine points back
/// into (resolver state, redraw bridge) is anchored here and released only
/// after the render context is destroyed.
pub struct ViewState {
    init: AtomicU8,
    alive: AtomicBool,
    handle: Mutex<Option<RenderContextHandle>>,
    engine: Mutex<Option<Arc<dyn RenderEngine>>>,
    resolver: Mutex<Option<Box<ResolverState>>>,
    bridge: Mutex<Option<Arc<RedrawBridge>>>,
    ready_signal: Mutex<Option<ReadySignal>>,
}

impl ViewState {
    pub fn new() -> Self {
        Self {
            init: AtomicU8::new(InitState::Uninitialized as u8),
            alive: AtomicBool::new(true),
            handle: Mutex::new(None),
            engine: Mutex::new(None),
            resolver: Mutex::new(None),
            bridge: Mutex::new(None),
            ready_signal: Mutex::new(None),
        }
    }

    pub fn init_state(&self) -> InitState {
        InitState::from_u8(self.init.load(Ordering::Acquire))
    }

    /// Handle of the engine render context, once initialized.
    pub fn render_context(&self) -> Option<RenderContextHandle> {
        *self.handle.lock()
    }

    /// False once teardown has begun; renderers skip frames for dead items.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Registers the one-shot "ready to render" signal.
    ///
    /// Replaces any previous registration. Fired once when initialization
    /// completes; registrations made after that never fire.
    pub fn on_ready(&self, signal: impl FnOnce() + Send + 'static) {
        *self.ready_signal.lock() = Some(Box::new(signal));
    }

    /// Begins teardown: destroys the render context and releases everything
    /// the engine pointed back into. Idempotent.
    ///
    /// Callers serialize this against in-flight frames the same way the
    /// framework serializes rendering; the engine's destroy call then
    /// guarantees callback quiescence before the anchors drop.
    pub fn shutdown(&self) {
        self.alive.store(false, Ordering::Release);

        let engine = self.engine.lock().take();
        let handle = self.handle.lock().take();
        if let (Some(engine), Some(handle)) = (engine, handle) {
            log::debug!("destroying engine render context");
            engine.destroy_render_context(handle);
        }

        self.bridge.lock().take();
        self.resolver.lock().take();
        self.ready_signal.lock().take();
    }

    /// Claims the one-time initialization slot.
    pub(crate) fn begin_init(&self) -> InitClaim {
        let claimed = self.init.compare_exchange(
            InitState::Uninitialized as u8,
            InitState::Initializing as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        match claimed {
            Ok(_) => InitClaim::Claimed,
            Err(state) if state == InitState::Ready as u8 => match self.render_context() {
                Some(handle) => InitClaim::Ready(handle),
                // Ready with the handle already torn down: the item is gone.
                None => InitClaim::Refused,
            },
            Err(_) => InitClaim::Refused,
        }
    }

    /// Completes initialization: anchors everything the engine holds raw
    /// pointers into, publishes the handle, then flips the state to Ready.
    pub(crate) fn install(
        &self,
        engine: Arc<dyn RenderEngine>,
        handle: RenderContextHandle,
        resolver: Box<ResolverState>,
        bridge: Arc<RedrawBridge>,
    ) {
        *self.engine.lock() = Some(engine);
        *self.resolver.lock() = Some(resolver);
        *self.bridge.lock() = Some(bridge);
        *self.handle.lock() = Some(handle);
        self.init.store(InitState::Ready as u8, Ordering::Release);
    }

    /// Marks initialization as permanently failed.
    pub(crate) fn fail_init(&self) {
        self.init.store(InitState::Failed as u8, Ordering::Release);
    }

    /// Fires the ready signal, if one is registered. At most once ever.
    pub(crate) fn signal_ready(&self) {
        let signal = self.ready_signal.lock().take();
        if let Some(signal) = signal {
            signal();
        }
    }

    pub(crate) fn bridge(&self) -> Option<Arc<RedrawBridge>> {
        self.bridge.lock().clone()
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ViewState {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineError, FrameReadyCallback, RenderParamList};
    use crate::host::{GraphicsContextRef, GraphicsHost, RenderTarget, RepaintScheduler};
    use std::ffi::{CStr, c_void};
    use std::num::{NonZeroU64, NonZeroUsize};
    use std::sync::atomic::AtomicUsize;

    struct NullHost;

    impl GraphicsHost for NullHost {
        fn current_context(&self) -> Option<GraphicsContextRef> {
            None
        }
        fn make_current(&self, _context: GraphicsContextRef) -> bool {
            false
        }
        fn resolve_proc_address(&self, _context: GraphicsContextRef, _name: &CStr) -> *mut c_void {
            std::ptr::null_mut()
        }
        fn current_target(&self) -> RenderTarget {
            RenderTarget::new(0, 0, 0)
        }
    }

    struct NullScheduler;

    impl RepaintScheduler for NullScheduler {
        fn request_repaint(&self) {}
    }

    #[derive(Default)]
    struct DestroyCountingEngine {
        destroys: AtomicUsize,
    }

    impl RenderEngine for DestroyCountingEngine {
        fn create_render_context(
            &self,
            _params: &RenderParamList,
        ) -> Result<RenderContextHandle, EngineError> {
            Ok(handle())
        }
        fn set_frame_ready_callback(
            &self,
            _handle: RenderContextHandle,
            _callback: FrameReadyCallback,
        ) {
        }
        fn update(&self, _handle: RenderContextHandle) {}
        fn render(&self, _handle: RenderContextHandle, _params: &RenderParamList) {}
        fn report_swap(&self, _handle: RenderContextHandle) {}
        fn destroy_render_context(&self, _handle: RenderContextHandle) {
            self.destroys.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn handle() -> RenderContextHandle {
        RenderContextHandle::from_raw(NonZeroU64::new(0xBEEF).unwrap())
    }

    fn installed_view(engine: &Arc<DestroyCountingEngine>) -> ViewState {
        let view = ViewState::new();
        assert!(matches!(view.begin_init(), InitClaim::Claimed));
        let host: Arc<dyn GraphicsHost> = Arc::new(NullHost);
        let context = GraphicsContextRef::from_raw(NonZeroUsize::new(0x10).unwrap());
        let resolver = Box::new(ResolverState::new(host, context));
        let bridge = Arc::new(RedrawBridge::new(Arc::new(NullScheduler)));
        view.install(engine.clone() as Arc<dyn RenderEngine>, handle(), resolver, bridge);
        view
    }

    // ── initialization machine ────────────────────────────────────────────

    #[test]
    fn fresh_view_is_uninitialized_and_alive() {
        let view = ViewState::new();
        assert_eq!(view.init_state(), InitState::Uninitialized);
        assert!(view.is_alive());
        assert!(view.render_context().is_none());
    }

    #[test]
    fn first_claim_wins_and_installs() {
        let engine = Arc::new(DestroyCountingEngine::default());
        let view = installed_view(&engine);
        assert_eq!(view.init_state(), InitState::Ready);
        assert_eq!(view.render_context(), Some(handle()));
    }

    #[test]
    fn second_claim_returns_the_handle() {
        let engine = Arc::new(DestroyCountingEngine::default());
        let view = installed_view(&engine);
        match view.begin_init() {
            InitClaim::Ready(h) => assert_eq!(h, handle()),
            _ => panic!("expected Ready claim"),
        }
    }

    #[test]
    fn claim_while_initializing_is_refused() {
        let view = ViewState::new();
        assert!(matches!(view.begin_init(), InitClaim::Claimed));
        assert!(matches!(view.begin_init(), InitClaim::Refused));
    }

    #[test]
    fn failed_init_is_terminal() {
        let view = ViewState::new();
        assert!(matches!(view.begin_init(), InitClaim::Claimed));
        view.fail_init();
        assert_eq!(view.init_state(), InitState::Failed);
        assert!(matches!(view.begin_init(), InitClaim::Refused));
        assert!(view.render_context().is_none());
    }

    // ── ready signal ──────────────────────────────────────────────────────

    #[test]
    fn ready_signal_fires_at_most_once() {
        let fired = Arc::new(AtomicUsize::new(0));
        let view = ViewState::new();
        let counter = fired.clone();
        view.on_ready(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        view.signal_ready();
        view.signal_ready();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unregistered_ready_signal_is_a_no_op() {
        let view = ViewState::new();
        view.signal_ready();
    }

    // ── teardown ──────────────────────────────────────────────────────────

    #[test]
    fn shutdown_destroys_the_context_once() {
        let engine = Arc::new(DestroyCountingEngine::default());
        let view = installed_view(&engine);
        view.shutdown();
        view.shutdown();
        assert_eq!(engine.destroys.load(Ordering::SeqCst), 1);
        assert!(!view.is_alive());
        assert!(view.render_context().is_none());
    }

    #[test]
    fn drop_runs_teardown() {
        let engine = Arc::new(DestroyCountingEngine::default());
        {
            let _view = installed_view(&engine);
        }
        assert_eq!(engine.destroys.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn shutdown_without_init_is_harmless() {
        let engine = Arc::new(DestroyCountingEngine::default());
        let view = ViewState::new();
        view.shutdown();
        assert_eq!(engine.destroys.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn claim_after_shutdown_is_refused() {
        let engine = Arc::new(DestroyCountingEngine::default());
        let view = installed_view(&engine);
        view.shutdown();
        assert!(matches!(view.begin_init(), InitClaim::Refused));
    }
}
