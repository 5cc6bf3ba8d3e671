// ui/mod.rs - Immediate-mode UI Contract
//
// The overlay does not ship a widget library. Whatever immediate-mode UI the
// application uses (Dear ImGui bindings, a custom one, a test double) plugs in
// through `UiLayer`: it receives input, builds a frame, and hands back a
// `DrawData` list that the frame renderer turns into GPU draw calls.

mod keys;

pub use keys::{map_virtual_key, vk, Key};

use std::path::Path;
use std::time::Duration;

use crate::constants::{input, textures};
use crate::error::Result;

/// Opaque texture id carried by draw commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u64);

impl TextureHandle {
    /// "No texture" - draw calls with this id bind nothing
    pub const NULL: TextureHandle = TextureHandle(0);
    /// Reserved id of the font atlas
    pub const FONT_ATLAS: TextureHandle = TextureHandle(textures::FONT_ATLAS_HANDLE);

    pub fn is_null(self) -> bool {
        self == Self::NULL
    }
}

/// One UI vertex, laid out exactly as the vertex shader reads it
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DrawVert {
    pub pos: [f32; 2],
    pub uv: [f32; 2],
    /// Packed RGBA8 color
    pub col: u32,
}

/// 16-bit indices
pub type DrawIdx = u16;

/// A single command within a draw list
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Draw `count` indices starting at `idx_offset`, relative to this list
    Elements {
        count: u32,
        /// Clip rectangle as (min x, min y, max x, max y) in display coordinates
        clip_rect: [f32; 4],
        texture: TextureHandle,
        vtx_offset: u32,
        idx_offset: u32,
    },
    /// A user callback embedded in the list; never supported by this renderer
    Callback,
}

/// Vertices, indices and commands for one UI window/layer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawList {
    pub vertices: Vec<DrawVert>,
    pub indices: Vec<DrawIdx>,
    pub commands: Vec<DrawCommand>,
}

/// Everything the UI produced for one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawData {
    /// Top-left of the visible UI space (0,0 for a single viewport)
    pub display_pos: [f32; 2],
    pub display_size: [f32; 2],
    pub lists: Vec<DrawList>,
}

impl DrawData {
    pub fn total_vertex_count(&self) -> usize {
        self.lists.iter().map(|l| l.vertices.len()).sum()
    }

    pub fn total_index_count(&self) -> usize {
        self.lists.iter().map(|l| l.indices.len()).sum()
    }

    /// Minimized windows report a zero or negative display size
    pub fn is_visible(&self) -> bool {
        self.display_size[0] > 0.0 && self.display_size[1] > 0.0
    }
}

/// Logical mouse buttons, in UI button-index order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Extra1,
    Extra2,
}

impl MouseButton {
    pub const ALL: [MouseButton; input::MOUSE_BUTTON_COUNT] = [
        MouseButton::Left,
        MouseButton::Right,
        MouseButton::Middle,
        MouseButton::Extra1,
        MouseButton::Extra2,
    ];
}

/// Cursor shapes the UI may ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MouseCursor {
    /// Hide the OS cursor (the UI draws its own, or wants none)
    None,
    #[default]
    Arrow,
    TextInput,
    ResizeAll,
    ResizeNS,
    ResizeEW,
    ResizeNESW,
    ResizeNWSE,
    Hand,
    NotAllowed,
}

/// Modifier state, polled from the OS every frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub super_key: bool,
}

/// Predefined glyph sets a font can be rasterized with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontGlyphRange {
    English,
    ChineseSimplifiedCommon,
    ChineseFull,
    Japanese,
    Korean,
    Thai,
    Vietnamese,
    Cyrillic,
}

/// Glyphs to rasterize when adding a font file to the atlas
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GlyphRanges<'a> {
    Named(FontGlyphRange),
    /// Inclusive codepoint intervals
    Custom(&'a [(u32, u32)]),
}

/// A queued font replacement, applied on the render thread between frames
#[derive(Debug, Clone, PartialEq)]
pub enum FontRequest {
    /// The UI layer's built-in font
    Default,
    Named {
        path: std::path::PathBuf,
        size: f32,
        range: FontGlyphRange,
    },
    Custom {
        path: std::path::PathBuf,
        size: f32,
        ranges: Vec<(u32, u32)>,
    },
}

/// RGBA32 pixels of a freshly built font atlas
#[derive(Debug, Clone, Copy)]
pub struct FontAtlas<'a> {
    pub width: u32,
    pub height: u32,
    pub pixels: &'a [u8],
}

/// The immediate-mode UI the overlay drives
///
/// Input setters queue events for the next frame. `begin_frame` and
/// `end_frame` bracket the application's render hook once per frame.
pub trait UiLayer {
    fn set_display_size(&mut self, size: [f32; 2]);
    fn display_size(&self) -> [f32; 2];

    fn begin_frame(&mut self, delta: Duration);
    /// Finish the frame and produce its draw list
    fn end_frame(&mut self) -> &DrawData;

    fn add_mouse_pos(&mut self, pos: [f32; 2]);
    fn add_mouse_button(&mut self, button: MouseButton, down: bool);
    fn add_mouse_wheel(&mut self, horizontal: f32, vertical: f32);
    fn add_key(&mut self, key: Key, down: bool);
    /// One UTF-16 code unit from WM_CHAR
    fn add_input_character(&mut self, unit: u16);
    fn add_focus(&mut self, focused: bool);

    fn want_capture_mouse(&self) -> bool;
    fn want_capture_keyboard(&self) -> bool;
    fn is_any_mouse_down(&self) -> bool;
    /// Cursor the UI wants displayed; `MouseCursor::None` when it draws its own
    fn mouse_cursor(&self) -> MouseCursor;
    /// False when the application disabled OS cursor changes
    fn cursor_change_allowed(&self) -> bool {
        true
    }

    fn clear_fonts(&mut self);
    fn add_default_font(&mut self);
    fn add_font_from_file(&mut self, path: &Path, size_pixels: f32, glyphs: GlyphRanges<'_>) -> Result<()>;
    /// Rasterize the atlas and expose its RGBA32 pixels
    fn build_font_atlas(&mut self) -> FontAtlas<'_>;
    fn set_font_texture(&mut self, handle: TextureHandle);
    /// Drop the CPU-side atlas pixels once they live on the GPU
    fn clear_font_atlas_data(&mut self);
}
