// error.rs - Overlay Error Types
//
// Every failure the overlay can surface to application code. Errors raised on
// the render thread travel back to the caller through the ready/closed signals
// wrapped in `RenderThread`, so every waiter sees the same cause.

use std::sync::Arc;

use thiserror::Error;

use crate::ui::TextureHandle;

/// Errors reported by the overlay
#[derive(Debug, Error)]
pub enum OverlayError {
    /// `start()` was called on an overlay that was already started
    #[error("overlay is already started")]
    AlreadyStarted,

    #[error("overlay has been disposed")]
    Disposed,

    /// Window, device or renderer construction failed
    #[error("overlay initialization failed: {0}")]
    Init(String),

    /// A native Win32/D3D11 call failed
    #[cfg(windows)]
    #[error("native call failed: {0}")]
    Windows(#[from] windows::core::Error),

    /// A GPU operation failed after initialization
    #[error("gpu operation failed: {0}")]
    Gpu(String),

    /// No image was registered under this name or path
    #[error("texture by name: {0} not found")]
    TextureNotFound(String),

    /// A draw call referenced a texture handle that was never registered
    #[error("draw call references unregistered texture {0:?}")]
    UnknownTexture(TextureHandle),

    /// The draw list contains a feature this renderer does not implement
    #[error("unsupported draw command: {0}")]
    Unsupported(&'static str),

    /// Image decoding failed
    #[error("failed to load image: {0}")]
    Image(#[from] image::ImageError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be parsed or serialized
    #[error("invalid overlay configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// An application hook returned an error
    #[error("overlay hook failed: {0}")]
    Hook(#[from] anyhow::Error),

    /// An error raised on the render thread, shared with every waiter
    #[error("render thread failed: {0}")]
    RenderThread(Arc<OverlayError>),

    #[error("render thread panicked")]
    ThreadPanicked,
}

impl OverlayError {
    /// True if this error, or the render-thread error it wraps, matches `pred`
    pub fn is(&self, pred: impl Fn(&OverlayError) -> bool) -> bool {
        match self {
            OverlayError::RenderThread(inner) => inner.is(pred),
            other => pred(other),
        }
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, OverlayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_render_thread_errors_can_be_matched() {
        let err = OverlayError::RenderThread(Arc::new(OverlayError::Unsupported("user callbacks")));
        assert!(err.is(|e| matches!(e, OverlayError::Unsupported(_))));
        assert!(!err.is(|e| matches!(e, OverlayError::AlreadyStarted)));
        assert_eq!(
            err.to_string(),
            "render thread failed: unsupported draw command: user callbacks"
        );
    }

    #[test]
    fn texture_not_found_names_the_key() {
        let err = OverlayError::TextureNotFound("logo.png".into());
        assert_eq!(err.to_string(), "texture by name: logo.png not found");
    }
}
