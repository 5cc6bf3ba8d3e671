// overlay/render_loop.rs - Render Thread Body
//
// Everything that runs on the dedicated render thread: native object
// creation, the ready handshake, the per-frame sequence, and teardown.
// The window, device, renderer and UI never leave this thread.

use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::Instant;

use log::{debug, error, info, warn};

use super::control::{OverlayRequest, Shared};
use super::state::{LifecycleState, MessageRouter};
use super::{Frame, OverlayApp, OverlayControl};
use crate::click_through::ClickThroughController;
use crate::config::OverlayConfig;
use crate::error::{OverlayError, Result};
use crate::input::InputTranslator;
use crate::platform::{EventResponse, GpuBackend, NativeWindow, Platform, SizeKind, WindowEvent, WindowHandle};
use crate::renderer::{FrameRenderer, TextureStore};
use crate::ui::UiLayer;

/// Errors from the render thread are shared by every waiter
fn shared_error(error: OverlayError) -> Arc<OverlayError> {
    match error {
        OverlayError::RenderThread(inner) => inner,
        other => Arc::new(other),
    }
}

/// Fires both signals if the thread unwinds before reporting, so no caller
/// blocks forever on a dead render thread
struct SignalGuard<'a> {
    shared: &'a Shared,
}

impl Drop for SignalGuard<'_> {
    fn drop(&mut self) {
        let panicked = Arc::new(OverlayError::ThreadPanicked);
        let unreported_ready = self.shared.ready.set(Err(panicked.clone()));
        let unreported_closed = self.shared.closed.set(Err(panicked));
        if unreported_ready || unreported_closed {
            error!("Render thread ended without reporting its outcome");
            self.shared.cancel.cancel();
            self.shared.state.set(LifecycleState::Closed);
        }
    }
}

/// Thread entry point
pub(super) fn run<P: Platform, A: OverlayApp>(
    config: OverlayConfig,
    mut app: A,
    control: OverlayControl,
    requests: Receiver<OverlayRequest>,
) {
    let shared = control.shared();
    let _guard = SignalGuard { shared };
    info!("Render thread started for '{}'", config.title);
    shared.state.set(LifecycleState::Initializing);

    let mut session = match Session::<P>::create(&config, &mut app, &control) {
        Ok(session) => session,
        Err(e) => {
            error!("Overlay initialization failed: {}", e);
            let e = shared_error(e);
            shared.state.set(LifecycleState::Closed);
            shared.ready.set(Err(e.clone()));
            shared.closed.set(Err(e));
            return;
        }
    };

    shared.state.set(LifecycleState::Ready);
    shared.ready.set(Ok(()));

    let mut result = session.run(&mut app, &control, &requests);
    shared.state.set(LifecycleState::ClosingDown);
    if let Err(e) = &result {
        error!("Render loop failed: {}", e);
    }

    let closed_hook = app.on_closed().map_err(OverlayError::Hook);
    session.teardown(&control);
    drop(session);

    match closed_hook {
        Err(e) if result.is_ok() => result = Err(e),
        Err(e) => warn!("on_closed failed after an earlier error: {}", e),
        Ok(()) => {}
    }

    shared.state.set(LifecycleState::Closed);
    shared.closed.set(result.map_err(shared_error));
    info!("Render thread for '{}' exited", config.title);
}

/// Native objects and per-frame state owned by the render thread
struct Session<P: Platform> {
    ui: Box<dyn UiLayer>,
    input: InputTranslator,
    click_through: ClickThroughController,
    router: MessageRouter,
    last_frame: Instant,
    max_messages: usize,
    clear_color: [f32; 4],
    renderer: FrameRenderer<P::Gpu>,
    window: P::Window,
}

impl<P: Platform> Session<P> {
    /// Device, window, UI, renderer, then input handling. A window that was
    /// created is destroyed again if a later step fails.
    fn create(config: &OverlayConfig, app: &mut impl OverlayApp, control: &OverlayControl) -> Result<Self> {
        let (mut window, gpu) = P::create(config)?;
        let handle = window.handle();
        control.set_window_handle(handle);
        info!("Overlay window created ({:?})", handle);

        let assembled = (|| -> Result<_> {
            let mut ui = app.create_ui()?;
            let mut renderer = FrameRenderer::new(gpu)?;
            renderer.upload_font_atlas(ui.as_mut())?;
            let click_through = ClickThroughController::new(&mut window);
            Ok((ui, renderer, click_through))
        })();

        let (ui, renderer, click_through) = match assembled {
            Ok(parts) => parts,
            Err(e) => {
                window.destroy();
                control.set_window_handle(WindowHandle::NULL);
                return Err(e);
            }
        };

        let mut session = Self {
            ui,
            input: InputTranslator::new(),
            click_through,
            router: MessageRouter::new(),
            last_frame: Instant::now(),
            max_messages: config.max_messages_per_frame.max(1),
            clear_color: config.clear_color,
            renderer,
            window,
        };

        // Creation messages (the initial WM_SIZE among them) wait in the router
        session.pump(control)?;
        Ok(session)
    }

    fn run(&mut self, app: &mut impl OverlayApp, control: &OverlayControl, requests: &Receiver<OverlayRequest>) -> Result<()> {
        let deferred = self.router.mark_ready();
        debug!("Replaying {} window messages received before ready", deferred.len());
        for event in deferred {
            self.handle_window_event(event, control)?;
        }

        app.post_initialized(control)?;
        // Fonts requested during initialization apply before the first frame
        self.apply_requests(control, requests)?;

        control.shared().state.set(LifecycleState::Running);
        self.last_frame = Instant::now();
        while !control.is_closing() {
            self.frame(app, control, requests)?;
        }
        info!("Render loop observed cancellation");
        Ok(())
    }

    fn frame(&mut self, app: &mut impl OverlayApp, control: &OverlayControl, requests: &Receiver<OverlayRequest>) -> Result<()> {
        self.pump(control)?;

        let wants_capture = self.input.update(self.ui.as_mut(), &mut self.window);
        if self.click_through.update(&mut self.window, wants_capture).focus_lost() {
            app.focus_lost(control);
        }

        let now = Instant::now();
        let delta = now - self.last_frame;
        self.last_frame = now;

        self.ui.begin_frame(delta);
        app.render(&mut Frame::new(self.ui.as_mut(), &mut self.renderer, control, delta))?;
        let draw_data = self.ui.end_frame();

        self.renderer.gpu_mut().begin_target(self.clear_color);
        self.renderer.render(draw_data)?;
        self.renderer.gpu_mut().present(control.vsync())?;

        self.apply_requests(control, requests)?;
        app.post_frame(control)?;
        Ok(())
    }

    /// Dispatch queued window messages; input goes straight to the UI,
    /// lifecycle messages go through the router
    fn pump(&mut self, control: &OverlayControl) -> Result<()> {
        let mut lifecycle = Vec::new();
        let Self { window, ui, input, max_messages, .. } = &mut *self;
        window.pump_events(*max_messages, &mut |event: WindowEvent| match event {
            WindowEvent::Resized { .. } | WindowEvent::Destroyed => {
                lifecycle.push(event);
                EventResponse::NotHandled
            }
            other => input.process_event(ui.as_mut(), &other),
        });

        for event in lifecycle {
            if let Some(event) = self.router.route(event) {
                self.handle_window_event(event, control)?;
            }
        }
        Ok(())
    }

    fn handle_window_event(&mut self, event: WindowEvent, control: &OverlayControl) -> Result<()> {
        match event {
            WindowEvent::Resized {
                kind: SizeKind::Restored | SizeKind::Maximized,
                width,
                height,
            } if width > 0 && height > 0 => {
                control.update_rect(|rect| {
                    rect.width = width;
                    rect.height = height;
                });
                let handle = self.window.handle();
                self.renderer.gpu_mut().resize_surface(handle, width, height)?;
                self.ui.set_display_size([width as f32, height as f32]);
                debug!("Swap chain resized to {}x{}", width, height);
            }
            WindowEvent::Resized { kind: SizeKind::Minimized, .. } => {
                self.ui.set_display_size([0.0, 0.0]);
            }
            WindowEvent::Destroyed => {
                info!("Overlay window destroyed, closing");
                control.close();
            }
            _ => {}
        }
        Ok(())
    }

    fn apply_requests(&mut self, control: &OverlayControl, requests: &Receiver<OverlayRequest>) -> Result<()> {
        while let Ok(request) = requests.try_recv() {
            match request {
                OverlayRequest::Font(font) => self.renderer.reload_font(self.ui.as_mut(), &font)?,
                OverlayRequest::ReleaseTexture { key, handle } => {
                    if control.release_is_current(&key, handle) {
                        self.renderer.release_texture(handle);
                    } else {
                        debug!("Keeping texture {:?}, '{}' was added again", handle, key);
                    }
                }
                OverlayRequest::Reposition(rect) => self.window.move_window(rect),
                OverlayRequest::Icon(path) => {
                    if let Err(e) = self.window.set_icon(&path) {
                        warn!("Failed to set overlay icon {}: {}", path.display(), e);
                    }
                }
            }
        }
        Ok(())
    }

    /// Textures and buffers, then the surface, then the window
    fn teardown(&mut self, control: &OverlayControl) {
        self.renderer.shutdown();
        self.window.destroy();
        control.set_window_handle(WindowHandle::NULL);
        info!("Overlay resources released");
    }
}
