//! The render-thread core: lazy engine-context initialization, the
//! per-frame update/render/report-swap handshake, and the cross-thread
//! frame-ready path back into the host's repaint scheduling.
//!
//! One [`ViewState`] per owning UI item anchors everything the engine
//! holds raw pointers into; one [`FboRenderer`] per item drives frames on
//! the host's render thread; one [`RedrawBridge`] per item coalesces
//! engine notifications into repaint requests.

mod notify;
mod renderer;
mod resolver;
mod state;

pub use notify::RedrawBridge;
pub use renderer::{FboRenderer, RendererConfig};
pub use state::{InitState, ViewState};
