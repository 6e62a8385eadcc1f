use std::num::NonZeroU64;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use zoetrope::engine::{
    EngineError, FrameReadyCallback, RenderContextHandle, RenderEngine, RenderParamList,
};

/// Counters the rig prints after a run.
#[derive(Debug, Clone, Copy)]
pub struct SimStats {
    pub notifications: u64,
    pub updates: u64,
    pub renders: u64,
    pub swaps: u64,
}

/// Software stand-in for a media engine: validates the creation contract,
/// probes the proc resolver the way a GL loader would, and fires the
/// frame-ready callback from its own worker thread at a fixed rate.
pub struct SimEngine {
    notify_interval: Duration,
    notifications: Arc<AtomicU64>,
    updates: AtomicU64,
    renders: AtomicU64,
    swaps: AtomicU64,
    stop: Arc<AtomicBool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl SimEngine {
    pub fn new(notify_hz: u64) -> Self {
        let hz = notify_hz.max(1);
        Self {
            notify_interval: Duration::from_secs_f64(1.0 / hz as f64),
            notifications: Arc::new(AtomicU64::new(0)),
            updates: AtomicU64::new(0),
            renders: AtomicU64::new(0),
            swaps: AtomicU64::new(0),
            stop: Arc::new(AtomicBool::new(false)),
            worker: Mutex::new(None),
        }
    }

    pub fn stats(&self) -> SimStats {
        SimStats {
            notifications: self.notifications.load(Ordering::Relaxed),
            updates: self.updates.load(Ordering::Relaxed),
            renders: self.renders.load(Ordering::Relaxed),
            swaps: self.swaps.load(Ordering::Relaxed),
        }
    }
}

impl RenderEngine for SimEngine {
    fn create_render_context(
        &self,
        params: &RenderParamList,
    ) -> Result<RenderContextHandle, EngineError> {
        let spec = params.creation_spec()?;

        log::info!(
            "sim engine: creating render context (backend {:?}, advanced control {:?})",
            spec.backend,
            spec.advanced_control
        );

        // A GL loader would pull dozens of symbols here; a few stand in.
        for name in [c"glGetString", c"glGenFramebuffers", c"glBlitFramebuffer"] {
            let addr = unsafe { (spec.resolver.resolve)(spec.resolver.ctx, name.as_ptr()) };
            if addr.is_null() {
                log::warn!("sim engine: {name:?} did not resolve");
            }
        }

        Ok(RenderContextHandle::from_raw(NonZeroU64::MIN))
    }

    fn set_frame_ready_callback(&self, _handle: RenderContextHandle, callback: FrameReadyCallback) {
        let stop = self.stop.clone();
        let notifications = self.notifications.clone();
        let interval = self.notify_interval;
        let worker = thread::Builder::new()
            .name("sim-engine-notify".to_owned())
            .spawn(move || {
                while !stop.load(Ordering::Acquire) {
                    thread::sleep(interval);
                    if stop.load(Ordering::Acquire) {
                        break;
                    }
                    unsafe { callback.invoke() };
                    notifications.fetch_add(1, Ordering::Relaxed);
                }
            });
        match worker {
            Ok(handle) => *self.worker.lock() = Some(handle),
            Err(err) => log::warn!("sim engine: could not spawn notify worker: {err}"),
        }
    }

    fn update(&self, _handle: RenderContextHandle) {
        self.updates.fetch_add(1, Ordering::Relaxed);
    }

    fn render(&self, _handle: RenderContextHandle, params: &RenderParamList) {
        if let Some(target) = params.target() {
            log::trace!(
                "sim engine: frame into fbo {} at {}x{}",
                target.fbo,
                target.width,
                target.height
            );
        }
        self.renders.fetch_add(1, Ordering::Relaxed);
    }

    fn report_swap(&self, _handle: RenderContextHandle) {
        self.swaps.fetch_add(1, Ordering::Relaxed);
    }

    // Quiesces the notify worker before returning, so no callback can fire
    // after the owning item releases its bridge.
    fn destroy_render_context(&self, _handle: RenderContextHandle) {
        self.stop.store(true, Ordering::Release);
        if let Some(worker) = self.worker.lock().take() {
            if worker.join().is_err() {
                log::warn!("sim engine: notify worker panicked");
            }
        }
        log::debug!("sim engine: render context destroyed");
    }
}
