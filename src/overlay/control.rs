// overlay/control.rs - Thread-safe Overlay Control Handle
//
// Everything application code may do to a running overlay from any thread.
// Calls either flip shared atomics, touch the image cache, or enqueue a
// request that the render thread drains after presenting a frame.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicIsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use log::{info, warn};

use super::state::{LifecycleState, StateCell};
use crate::config::OverlayConfig;
use crate::error::{OverlayError, Result};
use crate::platform::{WindowHandle, WindowRect};
use crate::signal::{CancellationFlag, Signal};
use crate::ui::{FontGlyphRange, FontRequest, TextureHandle};

/// Outcome delivered through the ready and closed signals
pub(crate) type ThreadResult = std::result::Result<(), Arc<OverlayError>>;

/// A texture created from an image, with its pixel size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub handle: TextureHandle,
    pub width: u32,
    pub height: u32,
}

/// Work queued for the render thread
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum OverlayRequest {
    Font(FontRequest),
    /// Release `handle`, unless `key` was cached again under that same handle
    ReleaseTexture { key: String, handle: TextureHandle },
    Reposition(WindowRect),
    Icon(PathBuf),
}

/// State shared by the overlay, its control handles and the render thread
#[derive(Debug)]
pub(crate) struct Shared {
    pub cancel: CancellationFlag,
    pub state: StateCell,
    pub ready: Signal<ThreadResult>,
    pub closed: Signal<ThreadResult>,
    pub vsync: AtomicBool,
    pub rect: Mutex<WindowRect>,
    pub window: AtomicIsize,
    pub images: RwLock<HashMap<String, ImageInfo>>,
}

/// Cloneable handle for controlling an overlay from any thread
#[derive(Debug, Clone)]
pub struct OverlayControl {
    shared: Arc<Shared>,
    requests: Sender<OverlayRequest>,
}

impl OverlayControl {
    pub(crate) fn new(config: &OverlayConfig) -> (Self, Receiver<OverlayRequest>) {
        let (requests, receiver) = mpsc::channel();
        let shared = Shared {
            cancel: CancellationFlag::new(),
            state: StateCell::default(),
            ready: Signal::new(),
            closed: Signal::new(),
            vsync: AtomicBool::new(config.vsync),
            rect: Mutex::new(config.rect()),
            window: AtomicIsize::new(0),
            images: RwLock::new(HashMap::new()),
        };
        (
            Self {
                shared: Arc::new(shared),
                requests,
            },
            receiver,
        )
    }

    pub(crate) fn shared(&self) -> &Shared {
        &self.shared
    }

    fn send(&self, request: OverlayRequest) -> bool {
        // Fails only once the render thread is gone
        self.requests.send(request).is_ok()
    }

    /// Ask the render thread to exit after the current frame. Repeated calls are no-ops.
    pub fn close(&self) {
        if self.shared.cancel.cancel() {
            info!("Overlay close requested");
        }
    }

    pub fn is_closing(&self) -> bool {
        self.shared.cancel.is_cancelled()
    }

    pub fn state(&self) -> LifecycleState {
        self.shared.state.get()
    }

    /// Block until the render thread has exited and its teardown ran
    pub fn wait_for_shutdown(&self) -> Result<()> {
        self.shared.closed.wait().map_err(OverlayError::RenderThread)
    }

    pub fn vsync(&self) -> bool {
        self.shared.vsync.load(Ordering::Relaxed)
    }

    pub fn set_vsync(&self, vsync: bool) {
        self.shared.vsync.store(vsync, Ordering::Relaxed);
    }

    pub fn window_handle(&self) -> WindowHandle {
        WindowHandle(self.shared.window.load(Ordering::SeqCst))
    }

    pub(crate) fn set_window_handle(&self, handle: WindowHandle) {
        self.shared.window.store(handle.0, Ordering::SeqCst);
    }

    pub fn rect(&self) -> WindowRect {
        *self.shared.rect.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn position(&self) -> (i32, i32) {
        self.rect().position()
    }

    pub fn size(&self) -> (u32, u32) {
        self.rect().size()
    }

    pub fn set_position(&self, x: i32, y: i32) {
        let rect = self.update_rect(|rect| {
            rect.x = x;
            rect.y = y;
        });
        self.send(OverlayRequest::Reposition(rect));
    }

    pub fn set_size(&self, width: u32, height: u32) {
        let rect = self.update_rect(|rect| {
            rect.width = width;
            rect.height = height;
        });
        self.send(OverlayRequest::Reposition(rect));
    }

    pub(crate) fn update_rect(&self, change: impl FnOnce(&mut WindowRect)) -> WindowRect {
        let mut rect = self.shared.rect.lock().unwrap_or_else(PoisonError::into_inner);
        change(&mut rect);
        *rect
    }

    /// Queue a font replacement using one of the predefined glyph sets.
    /// Returns false, queuing nothing, if the font file does not exist.
    pub fn replace_font(&self, path: impl AsRef<Path>, size: f32, range: FontGlyphRange) -> bool {
        let path = path.as_ref();
        if !path.is_file() {
            warn!("Font file not found: {}", path.display());
            return false;
        }
        self.send(OverlayRequest::Font(FontRequest::Named {
            path: path.to_path_buf(),
            size,
            range,
        }))
    }

    /// Queue a font replacement with explicit inclusive codepoint ranges
    pub fn replace_font_with_ranges(
        &self,
        path: impl AsRef<Path>,
        size: f32,
        ranges: &[(u32, u32)],
    ) -> bool {
        let path = path.as_ref();
        if !path.is_file() {
            warn!("Font file not found: {}", path.display());
            return false;
        }
        self.send(OverlayRequest::Font(FontRequest::Custom {
            path: path.to_path_buf(),
            size,
            ranges: ranges.to_vec(),
        }))
    }

    /// Go back to the UI layer's built-in font
    pub fn reset_font(&self) -> bool {
        self.send(OverlayRequest::Font(FontRequest::Default))
    }

    /// Replace the window icon with an `.ico` file
    pub fn set_icon(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        if !path.is_file() {
            warn!("Icon file not found: {}", path.display());
            return false;
        }
        self.send(OverlayRequest::Icon(path.to_path_buf()))
    }

    pub fn has_image(&self, key: &str) -> bool {
        self.images().contains_key(key)
    }

    pub fn try_get_image(&self, key: &str) -> Option<ImageInfo> {
        self.images().get(key).copied()
    }

    pub fn get_image(&self, key: &str) -> Result<ImageInfo> {
        self.try_get_image(key)
            .ok_or_else(|| OverlayError::TextureNotFound(key.to_string()))
    }

    /// Forget an image and release its texture on the render thread
    ///
    /// Re-adding the same key before the release is applied keeps the
    /// texture alive.
    pub fn remove_image(&self, key: &str) -> bool {
        match self.take_image(key) {
            Some(info) => {
                self.send(OverlayRequest::ReleaseTexture {
                    key: key.to_string(),
                    handle: info.handle,
                });
                true
            }
            None => false,
        }
    }

    /// False when `key` was re-added and now owns `handle` again
    pub(crate) fn release_is_current(&self, key: &str, handle: TextureHandle) -> bool {
        self.try_get_image(key).map(|info| info.handle) != Some(handle)
    }

    fn images(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, ImageInfo>> {
        self.shared.images.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn cache_image(&self, key: &str, info: ImageInfo) {
        self.shared
            .images
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), info);
    }

    pub(crate) fn take_image(&self, key: &str) -> Option<ImageInfo> {
        self.shared
            .images
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
    }

    pub(crate) fn clear_images(&self) -> usize {
        let mut images = self.shared.images.write().unwrap_or_else(PoisonError::into_inner);
        let count = images.len();
        images.clear();
        count
    }
}
