// input.rs - Native Input Translation
//
// Converts decoded window messages into UI input events, keeps the OS cursor
// in sync with what the UI asks for, and runs the per-frame poll that drives
// click-through: pointer position, modifiers and the stuck-button watchdog.

use log::debug;

use crate::constants::input::WHEEL_DELTA;
use crate::platform::{ButtonAction, EventResponse, NativeWindow, WindowEvent};
use crate::ui::{map_virtual_key, Key, MouseButton, MouseCursor, UiLayer};

/// Stateful translator between the native window and the UI layer
#[derive(Debug, Default)]
pub struct InputTranslator {
    last_cursor: Option<MouseCursor>,
}

impl InputTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cursor most recently applied to the window
    pub fn last_cursor(&self) -> Option<MouseCursor> {
        self.last_cursor
    }

    /// Feed one window event into the UI
    ///
    /// A handled `SetCursor` tells the window to re-apply the cursor last
    /// passed to `NativeWindow::set_cursor` instead of the class cursor.
    pub fn process_event(&mut self, ui: &mut dyn UiLayer, event: &WindowEvent) -> EventResponse {
        match *event {
            WindowEvent::Focus(focused) => ui.add_focus(focused),
            WindowEvent::MouseButton { button, action } => {
                ui.add_mouse_button(button, action != ButtonAction::Up);
            }
            WindowEvent::Wheel(delta) => ui.add_mouse_wheel(0.0, delta as f32 / WHEEL_DELTA),
            WindowEvent::HorizontalWheel(delta) => {
                ui.add_mouse_wheel(-(delta as f32) / WHEEL_DELTA, 0.0);
            }
            WindowEvent::Key { code, down, .. } => {
                if let Some(key) = map_virtual_key(code) {
                    // Windows only reports PrintScreen on release
                    if key == Key::PrintScreen && !down {
                        ui.add_key(key, true);
                    }
                    ui.add_key(key, down);
                }
            }
            WindowEvent::Char(unit) => ui.add_input_character(unit),
            WindowEvent::SetCursor { client_area: true } => {
                if ui.cursor_change_allowed() {
                    return EventResponse::Handled;
                }
            }
            WindowEvent::SetCursor { client_area: false }
            | WindowEvent::Resized { .. }
            | WindowEvent::Destroyed => {}
        }
        EventResponse::NotHandled
    }

    /// Per-frame poll. Returns whether the UI wants pointer capture.
    pub fn update(&mut self, ui: &mut dyn UiLayer, window: &mut dyn NativeWindow) -> bool {
        // Under click-through most pointer movement never arrives as messages
        if let Some(pos) = window.cursor_position() {
            ui.add_mouse_pos(pos);
        }

        // Modifier transitions are missed when focus changes mid-press
        let modifiers = window.modifiers();
        ui.add_key(Key::ModCtrl, modifiers.ctrl);
        ui.add_key(Key::ModShift, modifiers.shift);
        ui.add_key(Key::ModAlt, modifiers.alt);
        ui.add_key(Key::ModSuper, modifiers.super_key);

        let cursor = ui.mouse_cursor();
        if self.last_cursor != Some(cursor) && ui.cursor_change_allowed() {
            self.last_cursor = Some(cursor);
            window.set_cursor(cursor);
        }

        let wants_capture = ui.want_capture_mouse();
        if !wants_capture {
            Self::release_stuck_buttons(ui);
        }
        wants_capture
    }

    /// Force every button up if the UI still believes one is held
    pub fn release_stuck_buttons(ui: &mut dyn UiLayer) -> bool {
        if !ui.is_any_mouse_down() {
            return false;
        }
        debug!("Releasing mouse buttons held while capture was lost");
        for button in MouseButton::ALL {
            ui.add_mouse_button(button, false);
        }
        true
    }
}
