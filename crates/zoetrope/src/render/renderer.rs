use std::sync::{Arc, Weak};

use raw_window_handle::RawDisplayHandle;

use super::notify::RedrawBridge;
use super::resolver::ResolverState;
use super::state::{InitClaim, ViewState};
use crate::BridgeError;
use crate::engine::{RenderApiType, RenderContextHandle, RenderEngine, RenderParam, RenderParamList};
use crate::host::{GraphicsHost, RepaintScheduler};

/// Knobs for engine render-context creation.
///
/// The defaults match a GPU-accelerated embedded player: the modern render
/// backend, manual frame driving, and no vertical flip (the host FBO is
/// already oriented for on-screen composition).
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Graphics API the engine renders through.
    pub api: RenderApiType,
    /// Engine video-output backend selected at context creation.
    pub backend: String,
    /// Hands render-loop pacing to the host instead of the engine.
    pub advanced_control: bool,
    /// Vertical flip applied when blitting into the host target.
    pub flip_y: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            api: RenderApiType::OpenGl,
            backend: "gpu-next".to_owned(),
            advanced_control: true,
            flip_y: false,
        }
    }
}

/// Drives the engine's update/render/report-swap handshake against the
/// host's current FBO, creating the engine render context on first use.
///
/// All of [`render_frame`](Self::render_frame) relies on the host invoking
/// it from its single render thread, one frame at a time; that external
/// serialization, not a lock here, is what keeps the handshake ordered.
/// The renderer holds the item's state only weakly, so an item destroyed
/// between frames downgrades the next call to a no-op.
pub struct FboRenderer {
    engine: Arc<dyn RenderEngine>,
    host: Arc<dyn GraphicsHost>,
    scheduler: Arc<dyn RepaintScheduler>,
    view: Weak<ViewState>,
    config: RendererConfig,
}

impl FboRenderer {
    pub fn new(
        engine: Arc<dyn RenderEngine>,
        host: Arc<dyn GraphicsHost>,
        scheduler: Arc<dyn RepaintScheduler>,
        view: &Arc<ViewState>,
        config: RendererConfig,
    ) -> Self {
        Self {
            engine,
            host,
            scheduler,
            view: Arc::downgrade(view),
            config,
        }
    }

    /// Renders one frame into the host's current target.
    ///
    /// Fixed order: ensure the render context exists, drain engine-internal
    /// work, render into the target acquired this frame, acknowledge the
    /// swap, then ask the host for the next repaint. Reordering deadlocks
    /// the engine's dispatch queue, so the sequence never varies.
    ///
    /// Initialization failures are fatal: a diagnostic is logged and the
    /// process panics, since an item without a render context has no
    /// degraded mode to fall back to.
    pub fn render_frame(&self) {
        let Some(view) = self.view.upgrade() else {
            log::debug!("skipping frame: owning item already dropped");
            return;
        };
        if !view.is_alive() {
            log::debug!("skipping frame: owning item is tearing down");
            return;
        }

        let handle = self.ensure_render_context(&view);

        // Consume the frame-ready intent this frame answers, re-arming the
        // bridge for the next engine notification.
        if let Some(bridge) = view.bridge() {
            bridge.take_pending();
        }

        self.engine.update(handle);

        let target = self.host.current_target();
        log::trace!(
            "rendering into fbo {} at {}x{}",
            target.fbo,
            target.width,
            target.height
        );

        let mut params = RenderParamList::new();
        params.push(RenderParam::Target(target));
        params.push(RenderParam::FlipY(self.config.flip_y));
        let params = params.finish();

        self.engine.render(handle, &params);
        self.engine.report_swap(handle);

        self.scheduler.request_repaint();
    }

    /// Returns the render context, creating it on the first frame.
    fn ensure_render_context(&self, view: &Arc<ViewState>) -> RenderContextHandle {
        match view.begin_init() {
            InitClaim::Ready(handle) => handle,
            InitClaim::Claimed => match self.initialize(view) {
                Ok(handle) => handle,
                Err(err) => {
                    view.fail_init();
                    log::error!("render context initialization failed: {err}");
                    panic!("{err}");
                }
            },
            InitClaim::Refused => {
                let state = view.init_state();
                log::error!("render context initialization refused (state {state:?})");
                panic!("render context initialization refused (state {state:?})");
            }
        }
    }

    /// One-time context creation: capture the host graphics context, hand
    /// the engine its parameter list, register the frame-ready callback,
    /// then publish the handle and fire the item's ready signal.
    fn initialize(&self, view: &Arc<ViewState>) -> Result<RenderContextHandle, BridgeError> {
        let context = self
            .host
            .current_context()
            .ok_or(BridgeError::NoGraphicsContext)?;

        // Boxed before the descriptor is taken: the engine keeps the raw
        // pointer and may resolve through it during creation already.
        let resolver = Box::new(ResolverState::new(self.host.clone(), context));

        let mut params = RenderParamList::new();
        params.push(RenderParam::ApiType(self.config.api));
        params.push(RenderParam::InitParams(resolver.as_proc_resolver()));
        params.push(RenderParam::AdvancedControl(self.config.advanced_control));
        params.push(RenderParam::BackendName(self.config.backend.clone()));
        if let Some(display) = platform_display_param(self.host.as_ref()) {
            params.push(display);
        }
        let params = params.finish();

        let handle = self.engine.create_render_context(&params)?;

        let bridge = Arc::new(RedrawBridge::new(self.scheduler.clone()));
        self.engine
            .set_frame_ready_callback(handle, bridge.engine_callback());

        view.install(self.engine.clone(), handle, resolver, bridge);
        view.signal_ready();

        log::info!(
            "engine render context ready (backend {}, advanced control {})",
            self.config.backend,
            self.config.advanced_control
        );
        Ok(handle)
    }
}

/// Platform-display entry for the creation list, on windowing systems that
/// need one. Platforms outside the known set simply omit the entry.
fn platform_display_param(host: &dyn GraphicsHost) -> Option<RenderParam> {
    match host.display_handle()? {
        RawDisplayHandle::Xlib(xlib) => xlib
            .display
            .map(|display| RenderParam::X11Display(display.as_ptr())),
        _ => None,
    }
}
