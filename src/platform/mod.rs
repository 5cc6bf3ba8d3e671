// platform/mod.rs - Platform Abstraction Layer
//
// The overlay core never calls the OS or the GPU directly. It talks to a
// native window through `NativeWindow` and to the graphics device through
// `GpuBackend`; a `Platform` creates both on the render thread. The Win32 +
// Direct3D 11 implementation lives in `platform::windows`.

#[cfg(windows)]
pub mod windows;

use std::num::NonZeroIsize;
use std::path::Path;

use raw_window_handle::{RawWindowHandle, Win32WindowHandle};

use crate::config::OverlayConfig;
use crate::error::Result;
use crate::ui::{Modifiers, MouseButton, MouseCursor};

/// Opaque native window handle (an HWND on Windows)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct WindowHandle(pub isize);

impl WindowHandle {
    pub const NULL: WindowHandle = WindowHandle(0);

    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Handle in `raw-window-handle` form, for interop with other graphics crates
    pub fn raw_window_handle(self) -> Option<RawWindowHandle> {
        let hwnd = NonZeroIsize::new(self.0)?;
        Some(RawWindowHandle::Win32(Win32WindowHandle::new(hwnd)))
    }
}

/// Window position and size in screen pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl WindowRect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// How a WM_SIZE came about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeKind {
    Restored,
    Minimized,
    Maximized,
    Other,
}

/// Button message flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    Down,
    Up,
    DoubleClick,
}

/// Native window messages the overlay cares about, already decoded
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WindowEvent {
    Resized { kind: SizeKind, width: u32, height: u32 },
    Destroyed,
    Focus(bool),
    MouseButton { button: MouseButton, action: ButtonAction },
    /// Vertical wheel, in native units (120 per notch)
    Wheel(i16),
    /// Horizontal wheel, in native units (120 per notch)
    HorizontalWheel(i16),
    /// Key message; `system` marks the WM_SYSKEY* variants sent while Alt is held
    Key { code: u16, down: bool, system: bool },
    /// One UTF-16 code unit
    Char(u16),
    /// WM_SETCURSOR; `client_area` is true for HTCLIENT hits
    SetCursor { client_area: bool },
}

/// Whether a message was fully handled or should fall through to default processing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResponse {
    Handled,
    NotHandled,
}

impl EventResponse {
    pub fn is_handled(self) -> bool {
        self == EventResponse::Handled
    }
}

/// A native top-level window owned by the render thread
pub trait NativeWindow {
    fn handle(&self) -> WindowHandle;

    /// Dispatch at most `max_messages` queued messages without blocking,
    /// feeding every decoded event to `sink`. Returns the number delivered.
    fn pump_events(
        &mut self,
        max_messages: usize,
        sink: &mut dyn FnMut(WindowEvent) -> EventResponse,
    ) -> usize;

    /// Current extended window style
    fn ex_style(&self) -> u32;
    fn set_ex_style(&mut self, style: u32);
    fn set_focus(&mut self);

    /// Pointer position in client coordinates, if it can be sampled
    fn cursor_position(&self) -> Option<[f32; 2]>;
    /// Apply `cursor` now and keep re-applying it whenever a client-area
    /// `SetCursor` event is answered `Handled`
    fn set_cursor(&mut self, cursor: MouseCursor);
    fn modifiers(&self) -> Modifiers;

    fn move_window(&mut self, rect: WindowRect);
    fn set_icon(&mut self, path: &Path) -> Result<()>;

    /// Destroy the native window; safe to call more than once
    fn destroy(&mut self);
}

/// Buffer roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    Vertex,
    Index,
    Constant,
}

/// Texel encoding of uploaded RGBA8 images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    Rgba8Unorm,
    Rgba8UnormSrgb,
}

impl TextureFormat {
    pub fn for_srgb(srgb: bool) -> Self {
        if srgb {
            TextureFormat::Rgba8UnormSrgb
        } else {
            TextureFormat::Rgba8Unorm
        }
    }
}

/// Pixels for a new texture, tightly packed RGBA8 rows
#[derive(Debug, Clone, Copy)]
pub struct TextureData<'a> {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub pixels: &'a [u8],
}

/// Scissor rectangle in render-target pixels (right/bottom exclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScissorRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

/// Graphics device, context and swap chain used by the frame renderer
///
/// Buffers and textures release their GPU memory when dropped.
pub trait GpuBackend {
    type Buffer;
    /// A shader-resource view
    type Texture;

    fn create_buffer(&mut self, kind: BufferKind, size_bytes: usize) -> Result<Self::Buffer>;
    /// Map the buffer once for writing, copy `chunks` back to back, unmap
    fn upload(&mut self, buffer: &Self::Buffer, chunks: &[&[u8]]) -> Result<()>;
    fn create_texture(&mut self, data: TextureData<'_>) -> Result<Self::Texture>;

    /// Create the swap chain on first use, resize its buffers afterwards
    fn resize_surface(&mut self, window: WindowHandle, width: u32, height: u32) -> Result<()>;
    /// Bind the back buffer and clear it
    fn begin_target(&mut self, clear_color: [f32; 4]);
    /// Viewport, input layout, shaders, alpha blend, no depth, scissor on, no culling
    fn setup_render_state(
        &mut self,
        display_size: [f32; 2],
        vertices: &Self::Buffer,
        indices: &Self::Buffer,
        constants: &Self::Buffer,
    );
    fn set_scissor(&mut self, rect: ScissorRect);
    fn bind_texture(&mut self, texture: &Self::Texture);
    fn draw_indexed(&mut self, index_count: u32, first_index: u32, base_vertex: i32);
    fn present(&mut self, vsync: bool) -> Result<()>;
    /// Release render target view, back buffer and swap chain
    fn release_surface(&mut self);
}

/// Creates the native pieces of an overlay on the render thread
pub trait Platform: 'static {
    type Window: NativeWindow + 'static;
    type Gpu: GpuBackend + 'static;

    /// Graphics device first, then window class and window
    fn create(config: &OverlayConfig) -> Result<(Self::Window, Self::Gpu)>;

    /// Number of attached displays
    fn monitor_count() -> usize;
}
