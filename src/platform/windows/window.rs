// platform/windows/window.rs - Win32 Overlay Window
//
// Borderless topmost popup whose client area is made transparent with DWM.
// The window procedure decodes the handful of messages the overlay cares
// about and hands them to the sink installed by `pump_events`; anything that
// arrives outside a pump (creation messages, DestroyWindow) is kept in a
// backlog and delivered by the next pump.

use std::collections::{HashMap, VecDeque};
use std::ffi::c_void;
use std::mem;
use std::path::Path;
use std::ptr::NonNull;
use std::sync::{Mutex, PoisonError};

use lazy_static::lazy_static;
use log::{debug, info, warn};
use windows::core::PCWSTR;
use windows::Win32::Foundation::{HINSTANCE, HWND, LPARAM, LRESULT, POINT, WPARAM};
use windows::Win32::Graphics::Dwm::DwmExtendFrameIntoClientArea;
use windows::Win32::Graphics::Gdi::ScreenToClient;
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Controls::MARGINS;
use windows::Win32::UI::Input::KeyboardAndMouse::{GetKeyState, SetFocus};
use windows::Win32::UI::WindowsAndMessaging::*;

use crate::config::OverlayConfig;
use crate::error::{OverlayError, Result};
use crate::platform::{
    ButtonAction, EventResponse, NativeWindow, SizeKind, WindowEvent, WindowHandle, WindowRect,
};
use crate::ui::{vk, Modifiers, MouseButton, MouseCursor};
use crate::utils::{hiword, loword, signed_hiword, wide_string};

// WM_SIZE / WM_SETCURSOR / WM_XBUTTON* parameter values
const SIZE_RESTORED: usize = 0;
const SIZE_MINIMIZED: usize = 1;
const SIZE_MAXIMIZED: usize = 2;
const HT_CLIENT: u16 = 1;
const XBUTTON_1: u16 = 1;
const ICON_SMALL: usize = 0;
const ICON_BIG: usize = 1;

lazy_static! {
    /// Live windows per registered class name
    static ref CLASS_USERS: Mutex<HashMap<String, usize>> = Mutex::new(HashMap::new());
}

type Sink = dyn FnMut(WindowEvent) -> EventResponse;

/// Per-window data reachable from the window procedure through GWLP_USERDATA
struct WindowState {
    backlog: VecDeque<WindowEvent>,
    /// Set only for the duration of `pump_events`
    sink: Option<NonNull<Sink>>,
    delivered: usize,
    /// Cursor re-applied on handled WM_SETCURSOR; `Some(None)` hides it
    cursor: Option<Option<HCURSOR>>,
}

impl WindowState {
    fn deliver(&mut self, event: WindowEvent) -> EventResponse {
        match self.sink {
            Some(mut sink) => {
                self.delivered += 1;
                // SAFETY: the pointer is installed by pump_events and cleared
                // before the closure it points to goes out of scope
                unsafe { sink.as_mut()(event) }
            }
            None => {
                self.backlog.push_back(event);
                EventResponse::NotHandled
            }
        }
    }

    fn apply_cursor(&self) {
        if let Some(cursor) = self.cursor {
            unsafe {
                SetCursor(cursor);
            }
        }
    }
}

/// Decode a window message into the events the overlay consumes
pub(crate) fn decode_message(msg: u32, wparam: usize, lparam: isize) -> Option<WindowEvent> {
    let lparam = lparam as usize;
    let button = |button, action| Some(WindowEvent::MouseButton { button, action });
    let extra = || {
        if hiword(wparam) == XBUTTON_1 {
            MouseButton::Extra1
        } else {
            MouseButton::Extra2
        }
    };

    match msg {
        WM_SIZE => {
            let kind = match wparam {
                SIZE_RESTORED => SizeKind::Restored,
                SIZE_MINIMIZED => SizeKind::Minimized,
                SIZE_MAXIMIZED => SizeKind::Maximized,
                _ => SizeKind::Other,
            };
            Some(WindowEvent::Resized {
                kind,
                width: loword(lparam) as u32,
                height: hiword(lparam) as u32,
            })
        }
        WM_DESTROY => Some(WindowEvent::Destroyed),
        WM_SETFOCUS => Some(WindowEvent::Focus(true)),
        WM_KILLFOCUS => Some(WindowEvent::Focus(false)),

        WM_LBUTTONDOWN => button(MouseButton::Left, ButtonAction::Down),
        WM_LBUTTONDBLCLK => button(MouseButton::Left, ButtonAction::DoubleClick),
        WM_LBUTTONUP => button(MouseButton::Left, ButtonAction::Up),
        WM_RBUTTONDOWN => button(MouseButton::Right, ButtonAction::Down),
        WM_RBUTTONDBLCLK => button(MouseButton::Right, ButtonAction::DoubleClick),
        WM_RBUTTONUP => button(MouseButton::Right, ButtonAction::Up),
        WM_MBUTTONDOWN => button(MouseButton::Middle, ButtonAction::Down),
        WM_MBUTTONDBLCLK => button(MouseButton::Middle, ButtonAction::DoubleClick),
        WM_MBUTTONUP => button(MouseButton::Middle, ButtonAction::Up),
        WM_XBUTTONDOWN => button(extra(), ButtonAction::Down),
        WM_XBUTTONDBLCLK => button(extra(), ButtonAction::DoubleClick),
        WM_XBUTTONUP => button(extra(), ButtonAction::Up),

        WM_MOUSEWHEEL => Some(WindowEvent::Wheel(signed_hiword(wparam))),
        WM_MOUSEHWHEEL => Some(WindowEvent::HorizontalWheel(signed_hiword(wparam))),

        WM_KEYDOWN | WM_SYSKEYDOWN | WM_KEYUP | WM_SYSKEYUP => Some(WindowEvent::Key {
            code: wparam as u16,
            down: msg == WM_KEYDOWN || msg == WM_SYSKEYDOWN,
            system: msg == WM_SYSKEYDOWN || msg == WM_SYSKEYUP,
        }),
        WM_CHAR => Some(WindowEvent::Char(wparam as u16)),
        WM_SETCURSOR => Some(WindowEvent::SetCursor {
            client_area: loword(lparam) == HT_CLIENT,
        }),
        _ => None,
    }
}

unsafe extern "system" fn window_proc(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if msg == WM_NCCREATE {
        let create = &*(lparam.0 as *const CREATESTRUCTW);
        SetWindowLongPtrW(hwnd, GWLP_USERDATA, create.lpCreateParams as isize);
        return DefWindowProcW(hwnd, msg, wparam, lparam);
    }

    let state = GetWindowLongPtrW(hwnd, GWLP_USERDATA) as *mut WindowState;
    if msg == WM_NCDESTROY {
        SetWindowLongPtrW(hwnd, GWLP_USERDATA, 0);
    }
    if state.is_null() {
        return DefWindowProcW(hwnd, msg, wparam, lparam);
    }

    if let Some(event) = decode_message(msg, wparam.0, lparam.0) {
        let state = &mut *state;
        if state.deliver(event).is_handled() {
            if let WindowEvent::SetCursor { .. } = event {
                state.apply_cursor();
                return LRESULT(1);
            }
            return LRESULT(0);
        }
    }
    DefWindowProcW(hwnd, msg, wparam, lparam)
}

fn acquire_class(name: &str, hinstance: HINSTANCE) -> Result<()> {
    let mut users = CLASS_USERS.lock().unwrap_or_else(PoisonError::into_inner);
    if !users.contains_key(name) {
        let class_name = wide_string(name);
        let wc = WNDCLASSEXW {
            cbSize: mem::size_of::<WNDCLASSEXW>() as u32,
            style: CS_HREDRAW | CS_VREDRAW | CS_PARENTDC,
            lpfnWndProc: Some(window_proc),
            hInstance: hinstance,
            hCursor: unsafe { LoadCursorW(None, IDC_ARROW) }.unwrap_or_default(),
            lpszClassName: PCWSTR(class_name.as_ptr()),
            ..Default::default()
        };
        if unsafe { RegisterClassExW(&wc) } == 0 {
            return Err(OverlayError::Init(format!("failed to register window class '{}'", name)));
        }
        debug!("Registered window class '{}'", name);
    }
    *users.entry(name.to_string()).or_insert(0) += 1;
    Ok(())
}

fn release_class(name: &str, hinstance: HINSTANCE) {
    let mut users = CLASS_USERS.lock().unwrap_or_else(PoisonError::into_inner);
    let Some(count) = users.get_mut(name) else {
        return;
    };
    *count -= 1;
    if *count == 0 {
        users.remove(name);
        let class_name = wide_string(name);
        unsafe {
            let _ = UnregisterClassW(PCWSTR(class_name.as_ptr()), Some(hinstance));
        }
        debug!("Unregistered window class '{}'", name);
    }
}

fn cursor_id(cursor: MouseCursor) -> Option<PCWSTR> {
    match cursor {
        MouseCursor::None => None,
        MouseCursor::Arrow => Some(IDC_ARROW),
        MouseCursor::TextInput => Some(IDC_IBEAM),
        MouseCursor::ResizeAll => Some(IDC_SIZEALL),
        MouseCursor::ResizeNS => Some(IDC_SIZENS),
        MouseCursor::ResizeEW => Some(IDC_SIZEWE),
        MouseCursor::ResizeNESW => Some(IDC_SIZENESW),
        MouseCursor::ResizeNWSE => Some(IDC_SIZENWSE),
        MouseCursor::Hand => Some(IDC_HAND),
        MouseCursor::NotAllowed => Some(IDC_NO),
    }
}

fn key_down(vk: u16) -> bool {
    unsafe { GetKeyState(vk as i32) < 0 }
}

/// The overlay's native window
pub struct Win32Window {
    hwnd: HWND,
    hinstance: HINSTANCE,
    class_name: String,
    state: *mut WindowState,
    icon: Option<HICON>,
}

impl Win32Window {
    /// Register the class if needed, create the popup, show it and extend
    /// the DWM frame over the whole client area
    pub fn create(config: &OverlayConfig) -> Result<Self> {
        let hinstance: HINSTANCE = unsafe { GetModuleHandleW(None) }?.into();
        acquire_class(&config.title, hinstance)?;

        let state = Box::into_raw(Box::new(WindowState {
            backlog: VecDeque::new(),
            sink: None,
            delivered: 0,
            cursor: None,
        }));

        let class_name = wide_string(&config.title);
        let created = unsafe {
            CreateWindowExW(
                WS_EX_ACCEPTFILES | WS_EX_TOPMOST,
                PCWSTR(class_name.as_ptr()),
                PCWSTR(class_name.as_ptr()),
                WS_POPUP,
                config.x,
                config.y,
                config.width as i32,
                config.height as i32,
                None,
                None,
                Some(hinstance),
                Some(state as *const c_void),
            )
        };

        let hwnd = match created {
            Ok(hwnd) => hwnd,
            Err(e) => {
                // SAFETY: no window references the state
                drop(unsafe { Box::from_raw(state) });
                release_class(&config.title, hinstance);
                return Err(e.into());
            }
        };

        let mut window = Self {
            hwnd,
            hinstance,
            class_name: config.title.clone(),
            state,
            icon: None,
        };

        unsafe {
            let _ = ShowWindow(hwnd, if config.maximize { SW_MAXIMIZE } else { SW_SHOW });
            let margins = MARGINS {
                cxLeftWidth: -1,
                cxRightWidth: -1,
                cyTopHeight: -1,
                cyBottomHeight: -1,
            };
            if let Err(e) = DwmExtendFrameIntoClientArea(hwnd, &margins) {
                window.destroy();
                return Err(e.into());
            }
        }

        info!("Created overlay window '{}' ({:?})", config.title, hwnd);
        Ok(window)
    }

    fn is_alive(&self) -> bool {
        !self.hwnd.is_invalid()
    }
}

impl NativeWindow for Win32Window {
    fn handle(&self) -> WindowHandle {
        WindowHandle(self.hwnd.0 as isize)
    }

    fn pump_events(&mut self, max_messages: usize, sink: &mut dyn FnMut(WindowEvent) -> EventResponse) -> usize {
        if self.state.is_null() {
            return 0;
        }

        // SAFETY: only the lifetime is erased; the pointer is cleared below,
        // before `sink` is released by the caller
        let sink: NonNull<Sink> = unsafe { mem::transmute(NonNull::from(sink)) };
        let state = self.state;
        unsafe {
            (*state).sink = Some(sink);
            (*state).delivered = 0;

            while let Some(event) = (*state).backlog.pop_front() {
                (*state).deliver(event);
            }

            let mut msg = MSG::default();
            let mut dispatched = 0;
            while dispatched < max_messages && PeekMessageW(&mut msg, None, 0, 0, PM_REMOVE).as_bool() {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
                dispatched += 1;
            }

            (*state).sink = None;
            (*state).delivered
        }
    }

    fn ex_style(&self) -> u32 {
        unsafe { GetWindowLongPtrW(self.hwnd, GWL_EXSTYLE) as u32 }
    }

    fn set_ex_style(&mut self, style: u32) {
        unsafe {
            SetWindowLongPtrW(self.hwnd, GWL_EXSTYLE, style as isize);
        }
    }

    fn set_focus(&mut self) {
        unsafe {
            let _ = SetFocus(Some(self.hwnd));
        }
    }

    fn cursor_position(&self) -> Option<[f32; 2]> {
        let mut point = POINT::default();
        unsafe {
            GetCursorPos(&mut point).ok()?;
            if !ScreenToClient(self.hwnd, &mut point).as_bool() {
                return None;
            }
        }
        Some([point.x as f32, point.y as f32])
    }

    fn set_cursor(&mut self, cursor: MouseCursor) {
        let handle = match cursor_id(cursor) {
            Some(id) => match unsafe { LoadCursorW(None, id) } {
                Ok(handle) => Some(handle),
                Err(e) => {
                    warn!("Failed to load cursor {:?}: {:?}", cursor, e);
                    return;
                }
            },
            None => None,
        };
        if !self.state.is_null() {
            unsafe {
                (*self.state).cursor = Some(handle);
            }
        }
        unsafe {
            SetCursor(handle);
        }
    }

    fn modifiers(&self) -> Modifiers {
        Modifiers {
            ctrl: key_down(vk::CONTROL),
            shift: key_down(vk::SHIFT),
            alt: key_down(vk::MENU),
            super_key: key_down(vk::LWIN) || key_down(vk::RWIN),
        }
    }

    fn move_window(&mut self, rect: WindowRect) {
        unsafe {
            if let Err(e) = MoveWindow(self.hwnd, rect.x, rect.y, rect.width as i32, rect.height as i32, true) {
                warn!("MoveWindow failed: {:?}", e);
            }
        }
    }

    fn set_icon(&mut self, path: &Path) -> Result<()> {
        let path = wide_string(&path.to_string_lossy());
        unsafe {
            let handle = LoadImageW(None, PCWSTR(path.as_ptr()), IMAGE_ICON, 0, 0, LR_LOADFROMFILE)?;
            let icon = HICON(handle.0);
            SendMessageW(self.hwnd, WM_SETICON, Some(WPARAM(ICON_BIG)), Some(LPARAM(icon.0 as isize)));
            SendMessageW(self.hwnd, WM_SETICON, Some(WPARAM(ICON_SMALL)), Some(LPARAM(icon.0 as isize)));
            if let Some(old) = self.icon.replace(icon) {
                let _ = DestroyIcon(old);
            }
        }
        Ok(())
    }

    fn destroy(&mut self) {
        if !self.is_alive() {
            return;
        }
        unsafe {
            if let Err(e) = DestroyWindow(self.hwnd) {
                warn!("DestroyWindow failed: {:?}", e);
            }
            if let Some(icon) = self.icon.take() {
                let _ = DestroyIcon(icon);
            }
            if !self.state.is_null() {
                drop(Box::from_raw(self.state));
                self.state = std::ptr::null_mut();
            }
        }
        release_class(&self.class_name, self.hinstance);
        self.hwnd = HWND::default();
        info!("Destroyed overlay window '{}'", self.class_name);
    }
}

impl Drop for Win32Window {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_size_messages() {
        let event = decode_message(WM_SIZE, SIZE_MAXIMIZED, (1080 << 16) | 1920);
        assert_eq!(
            event,
            Some(WindowEvent::Resized { kind: SizeKind::Maximized, width: 1920, height: 1080 })
        );
        let event = decode_message(WM_SIZE, SIZE_MINIMIZED, 0);
        assert_eq!(event, Some(WindowEvent::Resized { kind: SizeKind::Minimized, width: 0, height: 0 }));
    }

    #[test]
    fn decodes_extra_buttons_and_wheel() {
        assert_eq!(
            decode_message(WM_XBUTTONDOWN, 2 << 16, 0),
            Some(WindowEvent::MouseButton { button: MouseButton::Extra2, action: ButtonAction::Down })
        );
        assert_eq!(
            decode_message(WM_MOUSEWHEEL, 0xFF88_0000, 0),
            Some(WindowEvent::Wheel(-120))
        );
    }

    #[test]
    fn system_keys_are_flagged() {
        assert_eq!(
            decode_message(WM_SYSKEYUP, 0x73, 0),
            Some(WindowEvent::Key { code: 0x73, down: false, system: true })
        );
        assert_eq!(decode_message(WM_SETCURSOR, 0, 1), Some(WindowEvent::SetCursor { client_area: true }));
        assert_eq!(decode_message(WM_PAINT, 0, 0), None);
    }
}
