// tests/common/mod.rs - Mock Platform, GPU and UI
//
// Each test registers a `Probe` under a unique overlay title. The mock
// platform looks the probe up when the render thread creates the window, so
// tests running in parallel never observe each other's counters.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use std::thread;
use std::time::{Duration, Instant};

use rustoverlay::platform::{
    BufferKind, EventResponse, GpuBackend, NativeWindow, Platform, ScissorRect, SizeKind, TextureData,
    TextureFormat, WindowEvent, WindowHandle, WindowRect,
};
use rustoverlay::ui::{FontAtlas, GlyphRanges, Key, Modifiers, MouseButton, MouseCursor};
use rustoverlay::{DrawData, Frame, OverlayApp, OverlayConfig, OverlayControl, OverlayError, TextureHandle, UiLayer};

pub const MOCK_HWND: isize = 0x1000;
/// WS_EX_ACCEPTFILES | WS_EX_TOPMOST
pub const BASE_EX_STYLE: u32 = 0x0000_0018;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Everything the mocks record
#[derive(Debug, Default, Clone)]
pub struct Stats {
    pub windows_created: usize,
    pub windows_destroyed: usize,
    pub styles: Vec<u32>,
    pub focus_calls: usize,
    pub cursors: Vec<MouseCursor>,
    pub moves: Vec<WindowRect>,
    pub icons: Vec<PathBuf>,

    pub buffers: Vec<(BufferKind, usize)>,
    pub live_buffers: usize,
    pub uploads: Vec<(BufferKind, usize)>,
    pub textures_created: usize,
    pub live_textures: usize,
    pub texture_formats: Vec<TextureFormat>,
    pub surfaces: Vec<(u32, u32)>,
    pub surface_released: usize,
    pub scissors: Vec<ScissorRect>,
    pub binds: Vec<u64>,
    pub draws: Vec<(u32, u32, i32)>,
    pub presents: usize,

    pub ui_events: Vec<String>,
    pub hooks: Vec<&'static str>,
    pub frames: usize,
    pub focus_lost: usize,
    pub fonts: Vec<String>,
    pub font_texture: Option<TextureHandle>,
}

/// Shared between a test, its mocks and its app
#[derive(Debug, Default)]
pub struct Probe {
    stats: Mutex<Stats>,
    pending: Mutex<VecDeque<WindowEvent>>,
    pub want_capture: AtomicBool,
    pub fail_window: AtomicBool,
    pub draw_data: Mutex<DrawData>,
}

impl Probe {
    pub fn stats(&self) -> MutexGuard<'_, Stats> {
        self.stats.lock().unwrap()
    }

    pub fn snapshot(&self) -> Stats {
        self.stats().clone()
    }

    pub fn push_event(&self, event: WindowEvent) {
        self.pending.lock().unwrap().push_back(event);
    }

    /// Poll until `condition` holds or two seconds pass
    pub fn wait_until(&self, condition: impl Fn(&Stats) -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if condition(&self.stats()) {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        false
    }
}

fn probes() -> &'static Mutex<HashMap<String, Arc<Probe>>> {
    static PROBES: OnceLock<Mutex<HashMap<String, Arc<Probe>>>> = OnceLock::new();
    PROBES.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Register a fresh probe for overlays titled `title`
pub fn probe(title: &str) -> Arc<Probe> {
    init_logging();
    let probe = Arc::new(Probe::default());
    probes().lock().unwrap().insert(title.to_string(), probe.clone());
    probe
}

pub fn config(title: &str) -> OverlayConfig {
    OverlayConfig::default()
        .with_title(title)
        .with_size(640, 480)
        .with_maximize(false)
        .with_vsync(false)
}

// ---------------------------------------------------------------------------
// Platform

pub struct MockPlatform;

impl Platform for MockPlatform {
    type Window = MockWindow;
    type Gpu = MockGpu;

    fn create(config: &OverlayConfig) -> rustoverlay::Result<(MockWindow, MockGpu)> {
        let probe = probes()
            .lock()
            .unwrap()
            .get(&config.title)
            .cloned()
            .ok_or_else(|| OverlayError::Init(format!("no probe registered for '{}'", config.title)))?;
        if probe.fail_window.load(Ordering::SeqCst) {
            return Err(OverlayError::Init("window creation refused".into()));
        }

        let gpu = MockGpu::new(probe.clone());
        probe.stats().windows_created += 1;
        // Creation sends the first WM_SIZE before anyone is listening
        let kind = if config.maximize { SizeKind::Maximized } else { SizeKind::Restored };
        probe.push_event(WindowEvent::Resized { kind, width: config.width, height: config.height });
        Ok((MockWindow::new(probe), gpu))
    }

    fn monitor_count() -> usize {
        2
    }
}

// ---------------------------------------------------------------------------
// Window

pub struct MockWindow {
    probe: Arc<Probe>,
    style: u32,
    destroyed: bool,
}

impl MockWindow {
    pub fn new(probe: Arc<Probe>) -> Self {
        Self { probe, style: BASE_EX_STYLE, destroyed: false }
    }
}

impl NativeWindow for MockWindow {
    fn handle(&self) -> WindowHandle {
        if self.destroyed {
            WindowHandle::NULL
        } else {
            WindowHandle(MOCK_HWND)
        }
    }

    fn pump_events(&mut self, max_messages: usize, sink: &mut dyn FnMut(WindowEvent) -> EventResponse) -> usize {
        let mut delivered = 0;
        while delivered < max_messages {
            let Some(event) = self.probe.pending.lock().unwrap().pop_front() else {
                break;
            };
            sink(event);
            delivered += 1;
        }
        delivered
    }

    fn ex_style(&self) -> u32 {
        self.style
    }

    fn set_ex_style(&mut self, style: u32) {
        self.style = style;
        self.probe.stats().styles.push(style);
    }

    fn set_focus(&mut self) {
        self.probe.stats().focus_calls += 1;
    }

    fn cursor_position(&self) -> Option<[f32; 2]> {
        Some([10.0, 20.0])
    }

    fn set_cursor(&mut self, cursor: MouseCursor) {
        self.probe.stats().cursors.push(cursor);
    }

    fn modifiers(&self) -> Modifiers {
        Modifiers::default()
    }

    fn move_window(&mut self, rect: WindowRect) {
        self.probe.stats().moves.push(rect);
    }

    fn set_icon(&mut self, path: &Path) -> rustoverlay::Result<()> {
        self.probe.stats().icons.push(path.to_path_buf());
        Ok(())
    }

    fn destroy(&mut self) {
        if !self.destroyed {
            self.destroyed = true;
            self.probe.stats().windows_destroyed += 1;
        }
    }
}

impl Drop for MockWindow {
    fn drop(&mut self) {
        self.destroy();
    }
}

// ---------------------------------------------------------------------------
// GPU

pub struct MockBuffer {
    pub kind: BufferKind,
    pub size: usize,
    probe: Arc<Probe>,
}

impl Drop for MockBuffer {
    fn drop(&mut self) {
        self.probe.stats().live_buffers -= 1;
    }
}

pub struct MockTexture {
    pub width: u32,
    pub height: u32,
    probe: Arc<Probe>,
}

impl Drop for MockTexture {
    fn drop(&mut self) {
        self.probe.stats().live_textures -= 1;
    }
}

pub struct MockGpu {
    probe: Arc<Probe>,
    fail_textures: bool,
}

impl MockGpu {
    pub fn new(probe: Arc<Probe>) -> Self {
        Self { probe, fail_textures: false }
    }

    pub fn failing_textures(probe: Arc<Probe>) -> Self {
        Self { probe, fail_textures: true }
    }
}

impl GpuBackend for MockGpu {
    type Buffer = MockBuffer;
    type Texture = MockTexture;

    fn create_buffer(&mut self, kind: BufferKind, size_bytes: usize) -> rustoverlay::Result<MockBuffer> {
        let mut stats = self.probe.stats();
        stats.buffers.push((kind, size_bytes));
        stats.live_buffers += 1;
        Ok(MockBuffer { kind, size: size_bytes, probe: self.probe.clone() })
    }

    fn upload(&mut self, buffer: &MockBuffer, chunks: &[&[u8]]) -> rustoverlay::Result<()> {
        let total: usize = chunks.iter().map(|c| c.len()).sum();
        assert!(total <= buffer.size, "upload of {} bytes into {} byte buffer", total, buffer.size);
        self.probe.stats().uploads.push((buffer.kind, total));
        Ok(())
    }

    fn create_texture(&mut self, data: TextureData<'_>) -> rustoverlay::Result<MockTexture> {
        if self.fail_textures {
            return Err(OverlayError::Gpu("texture creation refused".into()));
        }
        assert_eq!(data.pixels.len(), (data.width * data.height * 4) as usize);
        let mut stats = self.probe.stats();
        stats.textures_created += 1;
        stats.live_textures += 1;
        stats.texture_formats.push(data.format);
        Ok(MockTexture { width: data.width, height: data.height, probe: self.probe.clone() })
    }

    fn resize_surface(&mut self, window: WindowHandle, width: u32, height: u32) -> rustoverlay::Result<()> {
        assert_eq!(window, WindowHandle(MOCK_HWND));
        self.probe.stats().surfaces.push((width, height));
        Ok(())
    }

    fn begin_target(&mut self, _clear_color: [f32; 4]) {}

    fn setup_render_state(
        &mut self,
        _display_size: [f32; 2],
        _vertices: &MockBuffer,
        _indices: &MockBuffer,
        _constants: &MockBuffer,
    ) {
    }

    fn set_scissor(&mut self, rect: ScissorRect) {
        self.probe.stats().scissors.push(rect);
    }

    fn bind_texture(&mut self, texture: &MockTexture) {
        // Identify textures by their width in tests
        self.probe.stats().binds.push(texture.width as u64);
    }

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, base_vertex: i32) {
        self.probe.stats().draws.push((index_count, first_index, base_vertex));
    }

    fn present(&mut self, _vsync: bool) -> rustoverlay::Result<()> {
        self.probe.stats().presents += 1;
        thread::sleep(Duration::from_millis(1));
        Ok(())
    }

    fn release_surface(&mut self) {
        self.probe.stats().surface_released += 1;
    }
}

// ---------------------------------------------------------------------------
// UI

/// UI layer double: records input, serves the probe's draw data
pub struct MockUi {
    probe: Arc<Probe>,
    display_size: [f32; 2],
    frame: DrawData,
    buttons_down: [bool; 5],
    atlas: Vec<u8>,
    atlas_width: u32,
}

impl MockUi {
    pub fn new(probe: Arc<Probe>) -> Self {
        Self {
            probe,
            display_size: [0.0, 0.0],
            frame: DrawData::default(),
            buttons_down: [false; 5],
            atlas: Vec::new(),
            atlas_width: 0,
        }
    }

    fn record(&self, event: String) {
        self.probe.stats().ui_events.push(event);
    }
}

impl UiLayer for MockUi {
    fn set_display_size(&mut self, size: [f32; 2]) {
        self.display_size = size;
        self.record(format!("display {}x{}", size[0], size[1]));
    }

    fn display_size(&self) -> [f32; 2] {
        self.display_size
    }

    fn begin_frame(&mut self, _delta: Duration) {}

    fn end_frame(&mut self) -> &DrawData {
        self.frame = self.probe.draw_data.lock().unwrap().clone();
        self.frame.display_size = self.display_size;
        &self.frame
    }

    fn add_mouse_pos(&mut self, _pos: [f32; 2]) {}

    fn add_mouse_button(&mut self, button: MouseButton, down: bool) {
        let index = MouseButton::ALL.iter().position(|b| *b == button).unwrap();
        self.buttons_down[index] = down;
        self.record(format!("button {:?} {}", button, down));
    }

    fn add_mouse_wheel(&mut self, horizontal: f32, vertical: f32) {
        self.record(format!("wheel {} {}", horizontal, vertical));
    }

    fn add_key(&mut self, _key: Key, _down: bool) {}

    fn add_input_character(&mut self, unit: u16) {
        self.record(format!("char {}", unit));
    }

    fn add_focus(&mut self, focused: bool) {
        self.record(format!("focus {}", focused));
    }

    fn want_capture_mouse(&self) -> bool {
        self.probe.want_capture.load(Ordering::SeqCst)
    }

    fn want_capture_keyboard(&self) -> bool {
        false
    }

    fn is_any_mouse_down(&self) -> bool {
        self.buttons_down.iter().any(|down| *down)
    }

    fn mouse_cursor(&self) -> MouseCursor {
        MouseCursor::Arrow
    }

    fn clear_fonts(&mut self) {
        self.probe.stats().fonts.clear();
        self.atlas_width = 0;
    }

    fn add_default_font(&mut self) {
        self.probe.stats().fonts.push("default".into());
        self.atlas_width = 2;
    }

    fn add_font_from_file(&mut self, path: &Path, size_pixels: f32, _glyphs: GlyphRanges<'_>) -> rustoverlay::Result<()> {
        if !path.is_file() {
            return Err(OverlayError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            )));
        }
        self.probe.stats().fonts.push(format!("{}@{}", path.display(), size_pixels));
        self.atlas_width = 4;
        Ok(())
    }

    fn build_font_atlas(&mut self) -> FontAtlas<'_> {
        if self.atlas_width == 0 {
            self.add_default_font();
        }
        self.atlas = vec![255; (self.atlas_width * 2 * 4) as usize];
        FontAtlas { width: self.atlas_width, height: 2, pixels: &self.atlas }
    }

    fn set_font_texture(&mut self, handle: TextureHandle) {
        self.probe.stats().font_texture = Some(handle);
    }

    fn clear_font_atlas_data(&mut self) {
        self.atlas.clear();
    }
}

// ---------------------------------------------------------------------------
// Application

type RenderHook = Box<dyn FnMut(&mut Frame<'_>, &Probe) -> anyhow::Result<()> + Send>;

/// Records every hook; optionally closes itself after a number of frames
pub struct TestApp {
    pub probe: Arc<Probe>,
    pub close_after: Option<usize>,
    pub fail_create_ui: bool,
    pub fail_on_closed: bool,
    pub on_render: Option<RenderHook>,
}

impl TestApp {
    pub fn new(probe: Arc<Probe>) -> Self {
        Self { probe, close_after: None, fail_create_ui: false, fail_on_closed: false, on_render: None }
    }

    pub fn closing_after(mut self, frames: usize) -> Self {
        self.close_after = Some(frames);
        self
    }

    pub fn rendering(mut self, hook: impl FnMut(&mut Frame<'_>, &Probe) -> anyhow::Result<()> + Send + 'static) -> Self {
        self.on_render = Some(Box::new(hook));
        self
    }
}

impl OverlayApp for TestApp {
    fn create_ui(&mut self) -> anyhow::Result<Box<dyn UiLayer>> {
        self.probe.stats().hooks.push("create_ui");
        if self.fail_create_ui {
            anyhow::bail!("no UI for you");
        }
        Ok(Box::new(MockUi::new(self.probe.clone())))
    }

    fn render(&mut self, frame: &mut Frame<'_>) -> anyhow::Result<()> {
        let frames = {
            let mut stats = self.probe.stats();
            stats.frames += 1;
            if stats.hooks.last() != Some(&"render") {
                stats.hooks.push("render");
            }
            stats.frames
        };
        if let Some(hook) = self.on_render.as_mut() {
            hook(frame, &self.probe)?;
        }
        if self.close_after.is_some_and(|limit| frames >= limit) {
            frame.control().close();
        }
        Ok(())
    }

    fn post_initialized(&mut self, _control: &OverlayControl) -> anyhow::Result<()> {
        self.probe.stats().hooks.push("post_initialized");
        Ok(())
    }

    fn on_closed(&mut self) -> anyhow::Result<()> {
        self.probe.stats().hooks.push("on_closed");
        if self.fail_on_closed {
            anyhow::bail!("cleanup failed");
        }
        Ok(())
    }

    fn focus_lost(&mut self, _control: &OverlayControl) {
        self.probe.stats().focus_lost += 1;
    }
}
