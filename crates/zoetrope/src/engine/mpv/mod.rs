//! libmpv adapter.
//!
//! Implements [`RenderEngine`] over the libmpv render API. The embedder owns
//! the mpv client handle (created and configured elsewhere, with `vo=libmpv`)
//! and keeps it alive for the adapter's lifetime; this module only drives the
//! render side. Enabled by the `mpv` cargo feature, which links the system
//! libmpv.

pub mod ffi;

use std::ffi::{CStr, c_int, c_void};
use std::num::NonZeroU64;
use std::ptr;

use super::{
    EngineError, FrameReadyCallback, RenderApiType, RenderContextHandle, RenderEngine,
    RenderParamList,
};

/// [`RenderEngine`] backed by a libmpv client.
pub struct MpvRenderEngine {
    client: *mut ffi::mpv_handle,
}

// SAFETY: libmpv client handles are documented thread-safe, and the render
// context functions are only reached through the `RenderEngine` contract,
// which pins them to the host's render thread apart from teardown.
unsafe impl Send for MpvRenderEngine {}
unsafe impl Sync for MpvRenderEngine {}

impl MpvRenderEngine {
    /// Wraps an existing mpv client handle.
    ///
    /// # Safety
    /// `client` must be a valid, initialized mpv client handle that outlives
    /// the adapter. The adapter never destroys it.
    pub unsafe fn from_client(client: *mut ffi::mpv_handle) -> Self {
        Self { client }
    }
}

impl RenderEngine for MpvRenderEngine {
    fn create_render_context(
        &self,
        params: &RenderParamList,
    ) -> Result<RenderContextHandle, EngineError> {
        let spec = params.creation_spec()?;
        let api_name = match spec.api {
            RenderApiType::OpenGl => ffi::MPV_RENDER_API_TYPE_OPENGL,
        };
        if let Some(name) = spec.backend {
            // Stock libmpv has no render param for backend selection; the
            // gpu backend comes from the client's own options.
            log::debug!("gpu backend hint '{name}' noted; no render-param mapping");
        }

        // Payload storage must not move between here and the create call.
        let mut init_params = ffi::mpv_opengl_init_params {
            get_proc_address: Some(spec.resolver.resolve),
            get_proc_address_ctx: spec.resolver.ctx,
        };
        let mut advanced: c_int = spec.advanced_control.unwrap_or(false) as c_int;

        let mut c_params: Vec<ffi::mpv_render_param> = Vec::with_capacity(5);
        c_params.push(param(
            ffi::MPV_RENDER_PARAM_API_TYPE,
            api_name.as_ptr() as *mut c_void,
        ));
        c_params.push(param(
            ffi::MPV_RENDER_PARAM_OPENGL_INIT_PARAMS,
            &mut init_params as *mut ffi::mpv_opengl_init_params as *mut c_void,
        ));
        if spec.advanced_control.is_some() {
            c_params.push(param(
                ffi::MPV_RENDER_PARAM_ADVANCED_CONTROL,
                &mut advanced as *mut c_int as *mut c_void,
            ));
        }
        if let Some(display) = spec.x11_display {
            c_params.push(param(ffi::MPV_RENDER_PARAM_X11_DISPLAY, display));
        }
        c_params.push(param(ffi::MPV_RENDER_PARAM_INVALID, ptr::null_mut()));

        let mut ctx: *mut ffi::mpv_render_context = ptr::null_mut();
        // SAFETY: the array is sentinel-terminated, every data pointer stays
        // valid across the call, and `client` is valid per `from_client`.
        let status =
            unsafe { ffi::mpv_render_context_create(&mut ctx, self.client, c_params.as_mut_ptr()) };
        if status < 0 {
            log::error!("mpv_render_context_create: {}", error_text(status));
            return Err(EngineError::ContextCreation { status });
        }

        let raw = NonZeroU64::new(ctx as u64).ok_or(
            // Null context with a success status would be an engine bug.
            EngineError::ContextCreation { status: -1 },
        )?;
        log::debug!("mpv render context created");
        Ok(RenderContextHandle::from_raw(raw))
    }

    fn set_frame_ready_callback(&self, handle: RenderContextHandle, callback: FrameReadyCallback) {
        // SAFETY: `handle` maps back to the context pointer this adapter
        // created; the callback context outlives the registration per the
        // FrameReadyCallback contract.
        unsafe {
            ffi::mpv_render_context_set_update_callback(
                context_ptr(handle),
                Some(callback.notify),
                callback.ctx,
            );
        }
    }

    fn update(&self, handle: RenderContextHandle) {
        // SAFETY: `handle` is a live context created by this adapter.
        let flags = unsafe { ffi::mpv_render_context_update(context_ptr(handle)) };
        if flags & ffi::MPV_RENDER_UPDATE_FRAME != 0 {
            log::trace!("engine reports a queued frame");
        }
    }

    fn render(&self, handle: RenderContextHandle, params: &RenderParamList) {
        if params.api_type().is_some() || params.proc_resolver().is_some() {
            log::warn!("skipping render: creation entries in render parameter list");
            return;
        }
        let Some(target) = params.target() else {
            log::warn!("skipping render: no target descriptor in parameter list");
            return;
        };

        let mut fbo = ffi::mpv_opengl_fbo {
            fbo: target.fbo as c_int,
            w: target.width as c_int,
            h: target.height as c_int,
            internal_format: target.internal_format as c_int,
        };
        let mut flip: c_int = params.flip_y().unwrap_or(false) as c_int;

        let mut c_params = [
            param(
                ffi::MPV_RENDER_PARAM_OPENGL_FBO,
                &mut fbo as *mut ffi::mpv_opengl_fbo as *mut c_void,
            ),
            param(
                ffi::MPV_RENDER_PARAM_FLIP_Y,
                &mut flip as *mut c_int as *mut c_void,
            ),
            param(ffi::MPV_RENDER_PARAM_INVALID, ptr::null_mut()),
        ];

        // SAFETY: live context, sentinel-terminated array, payloads on the
        // stack for the duration of the call.
        let status =
            unsafe { ffi::mpv_render_context_render(context_ptr(handle), c_params.as_mut_ptr()) };
        if status < 0 {
            log::warn!("mpv_render_context_render: {}", error_text(status));
        }
    }

    fn report_swap(&self, handle: RenderContextHandle) {
        // SAFETY: live context created by this adapter.
        unsafe { ffi::mpv_render_context_report_swap(context_ptr(handle)) }
    }

    fn destroy_render_context(&self, handle: RenderContextHandle) {
        // mpv_render_context_free blocks until in-flight callbacks return
        // and never fires them again.
        // SAFETY: live context created by this adapter, destroyed once.
        unsafe { ffi::mpv_render_context_free(context_ptr(handle)) }
        log::debug!("mpv render context destroyed");
    }
}

fn param(type_: ffi::mpv_render_param_type, data: *mut c_void) -> ffi::mpv_render_param {
    ffi::mpv_render_param { type_, data }
}

fn context_ptr(handle: RenderContextHandle) -> *mut ffi::mpv_render_context {
    handle.as_raw().get() as *mut ffi::mpv_render_context
}

fn error_text(status: c_int) -> String {
    // SAFETY: mpv_error_string returns a static string for any input.
    let text = unsafe { ffi::mpv_error_string(status) };
    if text.is_null() {
        return format!("engine status {status}");
    }
    // SAFETY: non-null, nul-terminated, static lifetime.
    unsafe { CStr::from_ptr(text) }.to_string_lossy().into_owned()
}
