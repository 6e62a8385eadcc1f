use thiserror::Error;

use crate::engine::EngineError;

/// Failures that leave the bridge unable to render.
///
/// Both variants are unrecoverable: a missing graphics context is a
/// precondition violation by the host, and a refused render context leaves
/// the owning item with no defined degraded mode. The renderer logs a
/// diagnostic and panics when it hits either; there is no retry path.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The calling thread has no native graphics context bound.
    #[error("no active graphics context on the render thread")]
    NoGraphicsContext,

    /// The engine reported a failure while creating its render context.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_errors_nest_with_their_status() {
        let err = BridgeError::from(EngineError::ContextCreation { status: -3 });
        let text = err.to_string();
        assert!(text.contains("render context creation failed"));
        assert!(text.contains("-3"));
    }

    #[test]
    fn missing_context_names_the_render_thread() {
        let text = BridgeError::NoGraphicsContext.to_string();
        assert!(text.contains("graphics context"));
    }
}
