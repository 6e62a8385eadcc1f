//! Zoetrope bridges an off-screen render target owned by a host UI framework
//! to the render pipeline of an embedded media engine.
//!
//! The host side contributes a graphics context, a per-frame FBO and a repaint
//! scheduler (`host`). The engine side contributes an opaque render context
//! driven through a strict update/render/report-swap handshake (`engine`).
//! The `render` module couples the two: lazy one-time context creation on the
//! host's render thread, the per-frame handshake, and the cross-thread path
//! that turns engine frame-ready notifications into coalesced repaints.

pub mod engine;
pub mod host;
pub mod render;

pub mod logging;

mod error;

pub use error::BridgeError;
