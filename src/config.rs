// config.rs - Overlay Configuration
//
// Startup options for the overlay window and render loop. Persisted as JSON
// in the user's config directory so an application can remember where its
// overlay lives between runs.

use std::fs;
use std::path::{Path, PathBuf};

use log::{error, info};
use serde::{Deserialize, Serialize};

use crate::constants::window;
use crate::error::Result;
use crate::platform::WindowRect;

/// Options used when the overlay window is created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Window title, also used as the window class name
    pub title: String,
    /// Opt the process into DPI awareness before creating the window
    pub dpi_aware: bool,
    /// Initial window position and size
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    /// Maximize the window when it is first shown
    pub maximize: bool,
    /// Present with vsync
    pub vsync: bool,
    /// Messages dispatched per frame before rendering continues
    pub max_messages_per_frame: usize,
    /// Render target clear color (RGBA); alpha 0 keeps the desktop visible
    pub clear_color: [f32; 4],
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            title: window::DEFAULT_TITLE.to_string(),
            dpi_aware: false,
            x: 0,
            y: 0,
            width: window::DEFAULT_WIDTH,
            height: window::DEFAULT_HEIGHT,
            maximize: true,
            vsync: true,
            max_messages_per_frame: window::MAX_MESSAGES_PER_FRAME,
            clear_color: [0.0; 4],
        }
    }
}

impl OverlayConfig {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_dpi_awareness(mut self, dpi_aware: bool) -> Self {
        self.dpi_aware = dpi_aware;
        self
    }

    pub fn with_position(mut self, x: i32, y: i32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_maximize(mut self, maximize: bool) -> Self {
        self.maximize = maximize;
        self
    }

    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    /// Initial window rectangle
    pub fn rect(&self) -> WindowRect {
        WindowRect::new(self.x, self.y, self.width, self.height)
    }

    /// Default location: `<config dir>/RustOverlay/overlay.json`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("RustOverlay")
            .join("overlay.json")
    }

    /// Read a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        let config = serde_json::from_str(&contents)?;
        info!("Overlay config loaded from {:?}", path.as_ref());
        Ok(config)
    }

    /// Read a configuration file, falling back to defaults if it is missing or invalid
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load overlay config {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Write the configuration as pretty-printed JSON, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!("Overlay config saved to {:?}", path);
        Ok(())
    }
}
