// overlay/mod.rs - Overlay Lifecycle Controller
//
// `Overlay` owns one dedicated render thread. `start` spawns it and returns
// once the window, device and renderer exist; `close` asks it to stop at the
// next frame boundary; `dispose` joins it. Application code plugs in through
// `OverlayApp` and draws through the per-frame `Frame` view.

mod control;
mod render_loop;
mod state;

pub use control::{ImageInfo, OverlayControl};
pub use state::{LifecycleState, MessageRouter, StateCell};

use std::marker::PhantomData;
use std::path::Path;
use std::sync::mpsc::Receiver;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use image::RgbaImage;
use log::{error, info};

use control::OverlayRequest;
use crate::config::OverlayConfig;
use crate::error::{OverlayError, Result};
use crate::platform::Platform;
use crate::renderer::TextureStore;
use crate::ui::UiLayer;

/// Application hooks driven by the render thread
///
/// Every hook runs on the render thread. Errors end the render loop and are
/// reported through `start` (before ready) or `wait_for_shutdown` (after).
pub trait OverlayApp: Send + 'static {
    /// Build the UI layer; called once on the render thread before ready fires
    fn create_ui(&mut self) -> anyhow::Result<Box<dyn UiLayer>>;

    /// Draw one frame
    fn render(&mut self, frame: &mut Frame<'_>) -> anyhow::Result<()>;

    /// Runs after the ready signal and before the first frame
    fn post_initialized(&mut self, _control: &OverlayControl) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs after each frame is presented and queued requests are applied
    fn post_frame(&mut self, _control: &OverlayControl) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs after the last frame, before GPU resources are released
    fn on_closed(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    /// The overlay went back to click-through; release any drag state
    fn focus_lost(&mut self, _control: &OverlayControl) {}
}

/// Render-thread view handed to `OverlayApp::render`
pub struct Frame<'a> {
    ui: &'a mut dyn UiLayer,
    textures: &'a mut dyn TextureStore,
    control: &'a OverlayControl,
    delta: Duration,
}

impl<'a> Frame<'a> {
    pub(crate) fn new(
        ui: &'a mut dyn UiLayer,
        textures: &'a mut dyn TextureStore,
        control: &'a OverlayControl,
        delta: Duration,
    ) -> Self {
        Self {
            ui,
            textures,
            control,
            delta,
        }
    }

    pub fn ui(&mut self) -> &mut dyn UiLayer {
        &mut *self.ui
    }

    pub fn control(&self) -> &OverlayControl {
        self.control
    }

    /// Time since the previous frame
    pub fn delta(&self) -> Duration {
        self.delta
    }

    /// Load an image file into a texture keyed by its path, or return the
    /// texture already loaded for that path
    pub fn add_or_get_image(&mut self, path: impl AsRef<Path>, srgb: bool) -> Result<ImageInfo> {
        let path = path.as_ref();
        let key = path.to_string_lossy().into_owned();
        self.add_or_get_named_image(path, &key, srgb)
    }

    /// Load an image file but cache it under `name` instead of its path
    pub fn add_or_get_named_image(
        &mut self,
        path: impl AsRef<Path>,
        name: &str,
        srgb: bool,
    ) -> Result<ImageInfo> {
        if let Some(info) = self.control.try_get_image(name) {
            return Ok(info);
        }
        let image = image::open(path.as_ref())?.to_rgba8();
        self.upload(name, &image, srgb)
    }

    /// Upload in-memory RGBA pixels under `name`, or return the existing texture
    pub fn add_or_get_rgba_image(&mut self, name: &str, image: &RgbaImage, srgb: bool) -> Result<ImageInfo> {
        if let Some(info) = self.control.try_get_image(name) {
            return Ok(info);
        }
        self.upload(name, image, srgb)
    }

    fn upload(&mut self, key: &str, image: &RgbaImage, srgb: bool) -> Result<ImageInfo> {
        let handle = self.textures.upload_image(key, image, srgb)?;
        let info = ImageInfo {
            handle,
            width: image.width(),
            height: image.height(),
        };
        self.control.cache_image(key, info);
        Ok(info)
    }

    /// Release an image's texture immediately
    pub fn remove_image(&mut self, key: &str) -> bool {
        match self.control.take_image(key) {
            Some(info) => self.textures.release_texture(info.handle),
            None => false,
        }
    }
}

/// A transparent, click-through overlay window on its own render thread
pub struct Overlay<P: Platform> {
    config: OverlayConfig,
    control: OverlayControl,
    requests: Option<Receiver<OverlayRequest>>,
    thread: Option<JoinHandle<()>>,
    started: bool,
    disposed: bool,
    _platform: PhantomData<fn() -> P>,
}

impl<P: Platform> Overlay<P> {
    pub fn new(config: OverlayConfig) -> Self {
        let (control, requests) = OverlayControl::new(&config);
        Self {
            config,
            control,
            requests: Some(requests),
            thread: None,
            started: false,
            disposed: false,
            _platform: PhantomData,
        }
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    /// Handle usable from any thread, valid before and after start
    pub fn control(&self) -> OverlayControl {
        self.control.clone()
    }

    pub fn state(&self) -> LifecycleState {
        self.control.state()
    }

    /// Number of attached displays
    pub fn number_video_displays() -> usize {
        P::monitor_count()
    }

    /// Spawn the render thread and wait until the overlay is ready
    ///
    /// Fails with `AlreadyStarted` on every call after the first, without
    /// touching the running overlay, and with `Disposed` after `dispose`.
    pub fn start<A: OverlayApp>(&mut self, app: A) -> Result<()> {
        if self.disposed {
            return Err(OverlayError::Disposed);
        }
        if self.started {
            return Err(OverlayError::AlreadyStarted);
        }
        let requests = self.requests.take().ok_or(OverlayError::AlreadyStarted)?;
        self.started = true;

        let config = self.config.clone();
        let control = self.control.clone();
        let handle = thread::Builder::new()
            .name(format!("{}-render", self.config.title))
            .spawn(move || render_loop::run::<P, A>(config, app, control, requests))?;
        self.thread = Some(handle);

        match self.control.shared().ready.wait() {
            Ok(()) => {
                info!("Overlay '{}' is ready", self.config.title);
                Ok(())
            }
            Err(e) => Err(OverlayError::RenderThread(e)),
        }
    }

    /// Start the overlay and block until it shuts down
    pub fn run<A: OverlayApp>(&mut self, app: A) -> Result<()> {
        self.start(app)?;
        self.wait_for_shutdown()
    }

    /// Request shutdown; the render thread exits at the next frame boundary
    pub fn close(&self) {
        self.control.close();
    }

    /// Block until the render thread has finished. Returns immediately for an
    /// overlay that was never started; `OverlayControl::wait_for_shutdown`
    /// instead blocks until the overlay is started and closed, or disposed.
    pub fn wait_for_shutdown(&self) -> Result<()> {
        if !self.started {
            return Ok(());
        }
        self.control.wait_for_shutdown()
    }

    /// Stop and join the render thread and drop every cached image.
    /// Only the first call does any work.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.control.close();

        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                error!("Render thread of '{}' panicked", self.config.title);
            }
        }

        let shared = self.control.shared();
        // Never started, or the thread died without reporting
        shared.closed.set(Ok(()));
        shared.state.set(LifecycleState::Closed);

        let dropped = self.control.clear_images();
        info!("Overlay '{}' disposed ({} cached images dropped)", self.config.title, dropped);
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl<P: Platform> Drop for Overlay<P> {
    fn drop(&mut self) {
        self.dispose();
    }
}
