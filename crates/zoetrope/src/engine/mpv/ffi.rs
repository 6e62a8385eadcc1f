//! Raw libmpv render-API declarations.
//!
//! Hand-written subset of `mpv/render.h` and `mpv/render_gl.h` covering what
//! the adapter drives. Layouts follow client API 2.x; the deprecated
//! `extra_exts` fields are gone from `mpv_opengl_init_params` there.

#![allow(non_camel_case_types)]

use std::ffi::{CStr, c_char, c_int, c_void};

#[repr(C)]
pub struct mpv_handle {
    _unused: [u8; 0],
}

#[repr(C)]
pub struct mpv_render_context {
    _unused: [u8; 0],
}

pub type mpv_render_param_type = c_int;

pub const MPV_RENDER_PARAM_INVALID: mpv_render_param_type = 0;
pub const MPV_RENDER_PARAM_API_TYPE: mpv_render_param_type = 1;
pub const MPV_RENDER_PARAM_OPENGL_INIT_PARAMS: mpv_render_param_type = 2;
pub const MPV_RENDER_PARAM_OPENGL_FBO: mpv_render_param_type = 3;
pub const MPV_RENDER_PARAM_FLIP_Y: mpv_render_param_type = 4;
pub const MPV_RENDER_PARAM_X11_DISPLAY: mpv_render_param_type = 8;
pub const MPV_RENDER_PARAM_ADVANCED_CONTROL: mpv_render_param_type = 10;

pub const MPV_RENDER_API_TYPE_OPENGL: &CStr = c"opengl";

pub const MPV_RENDER_UPDATE_FRAME: u64 = 1;

#[repr(C)]
pub struct mpv_render_param {
    pub type_: mpv_render_param_type,
    pub data: *mut c_void,
}

#[repr(C)]
pub struct mpv_opengl_init_params {
    pub get_proc_address:
        Option<unsafe extern "C" fn(ctx: *mut c_void, name: *const c_char) -> *mut c_void>,
    pub get_proc_address_ctx: *mut c_void,
}

#[repr(C)]
pub struct mpv_opengl_fbo {
    pub fbo: c_int,
    pub w: c_int,
    pub h: c_int,
    pub internal_format: c_int,
}

#[link(name = "mpv")]
unsafe extern "C" {
    pub fn mpv_render_context_create(
        res: *mut *mut mpv_render_context,
        mpv: *mut mpv_handle,
        params: *mut mpv_render_param,
    ) -> c_int;

    pub fn mpv_render_context_set_update_callback(
        ctx: *mut mpv_render_context,
        callback: Option<unsafe extern "C" fn(cb_ctx: *mut c_void)>,
        callback_ctx: *mut c_void,
    );

    pub fn mpv_render_context_update(ctx: *mut mpv_render_context) -> u64;

    pub fn mpv_render_context_render(
        ctx: *mut mpv_render_context,
        params: *mut mpv_render_param,
    ) -> c_int;

    pub fn mpv_render_context_report_swap(ctx: *mut mpv_render_context);

    pub fn mpv_render_context_free(ctx: *mut mpv_render_context);

    pub fn mpv_error_string(error: c_int) -> *const c_char;
}
