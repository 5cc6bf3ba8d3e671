//! RustOverlay - Clickable Transparent Overlay
//!
//! A borderless, topmost, fully transparent window that renders an
//! immediate-mode UI with Direct3D 11 on a dedicated render thread. The
//! window lets mouse input through to whatever is beneath it until the UI
//! wants to capture the mouse.
//!
//! The core (lifecycle, input translation, click-through, frame rendering)
//! is platform-neutral and talks to the OS through the traits in
//! [`platform`]. [`Win32Overlay`] is the ready-made Windows flavor.

pub mod click_through;
pub mod config;
pub mod constants;
pub mod error;
pub mod input;
pub mod overlay;
pub mod platform;
pub mod renderer;
pub mod signal;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use config::OverlayConfig;
pub use error::{OverlayError, Result};
pub use overlay::{Frame, ImageInfo, LifecycleState, Overlay, OverlayApp, OverlayControl};
pub use platform::{GpuBackend, NativeWindow, Platform, WindowHandle, WindowRect};
pub use renderer::{FrameRenderer, TextureStore};
pub use ui::{
    DrawCommand, DrawData, DrawList, DrawVert, FontGlyphRange, MouseButton, MouseCursor, TextureHandle,
    UiLayer,
};

#[cfg(windows)]
pub use platform::windows::{D3D11Gpu, Win32Platform, Win32Window};

/// Overlay backed by a Win32 window and a Direct3D 11 device
#[cfg(windows)]
pub type Win32Overlay = Overlay<Win32Platform>;
