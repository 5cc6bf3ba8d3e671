// constants.rs - Overlay-wide Constants
//
// Centralized constants for window defaults, input scaling, texture handles
// and GPU buffer sizing.

/// Overlay window defaults
pub mod window {
    /// Default window title (also the window class name)
    pub const DEFAULT_TITLE: &str = "Overlay";
    /// Default window width before the first maximize
    pub const DEFAULT_WIDTH: u32 = 800;
    /// Default window height before the first maximize
    pub const DEFAULT_HEIGHT: u32 = 600;
    /// Upper bound on messages dispatched per frame so input never starves rendering
    pub const MAX_MESSAGES_PER_FRAME: usize = 64;
}

/// Extended window style bits driven by the click-through controller
pub mod style {
    /// WS_EX_TRANSPARENT - mouse input passes through to windows below
    pub const EX_TRANSPARENT: u32 = 0x0000_0020;
    /// WS_EX_LAYERED - required alongside EX_TRANSPARENT for hit-test passthrough
    pub const EX_LAYERED: u32 = 0x0008_0000;
}

/// Input translation
pub mod input {
    /// Native wheel units per notch (WHEEL_DELTA)
    pub const WHEEL_DELTA: f32 = 120.0;
    /// Number of logical mouse buttons (left, right, middle, two extra)
    pub const MOUSE_BUTTON_COUNT: usize = 5;
}

/// Texture handle space
pub mod textures {
    /// Reserved handle of the font atlas texture
    pub const FONT_ATLAS_HANDLE: u64 = 1;
    /// First handle handed out to user textures (and again after a full clear)
    pub const FIRST_USER_HANDLE: u64 = 100;
}

/// GPU buffer sizing
pub mod buffers {
    /// Initial vertex capacity, and the headroom added on every regrow
    pub const VERTEX_SLACK: usize = 5000;
    /// Initial index capacity, and the headroom added on every regrow
    pub const INDEX_SLACK: usize = 10000;
    /// Size of the projection constant buffer (one 4x4 f32 matrix)
    pub const CONSTANT_BUFFER_SIZE: usize = 16 * 4;
}
