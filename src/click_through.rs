// click_through.rs - Click-Through Controller
//
// Toggles the overlay between "clickable" (the window receives mouse and
// keyboard input) and "click-through" (input falls to whatever is beneath).
// Transitions are edge-triggered so the native style is only rewritten when
// the desired state actually changes.

use log::debug;

use crate::constants::style;
use crate::platform::NativeWindow;

/// Result of one per-frame evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    BecameClickable,
    /// Switched to click-through. The overlay lost input focus, so any drag
    /// state held by the application should be released.
    BecameClickThrough,
}

impl Transition {
    /// True when dependents must be told that focus was lost
    pub fn focus_lost(self) -> bool {
        self == Transition::BecameClickThrough
    }
}

/// Two-state machine over the window's extended style
#[derive(Debug)]
pub struct ClickThroughController {
    clickable: bool,
    clickable_style: u32,
    click_through_style: u32,
}

impl ClickThroughController {
    /// Capture the window's current style as the clickable baseline, then
    /// force the overlay into click-through mode
    pub fn new(window: &mut dyn NativeWindow) -> Self {
        let clickable_style = window.ex_style();
        let mut controller = Self {
            clickable: true,
            clickable_style,
            click_through_style: clickable_style | style::EX_LAYERED | style::EX_TRANSPARENT,
        };
        controller.update(window, false);
        controller
    }

    pub fn is_clickable(&self) -> bool {
        self.clickable
    }

    pub fn clickable_style(&self) -> u32 {
        self.clickable_style
    }

    pub fn click_through_style(&self) -> u32 {
        self.click_through_style
    }

    /// Apply `want_clickable` if it differs from the current state
    pub fn update(&mut self, window: &mut dyn NativeWindow, want_clickable: bool) -> Transition {
        if self.clickable == want_clickable {
            return Transition::Unchanged;
        }

        self.clickable = want_clickable;
        if want_clickable {
            window.set_ex_style(self.clickable_style);
            // Transparent-to-input windows never get focus on their own
            window.set_focus();
            debug!("Overlay is now clickable");
            Transition::BecameClickable
        } else {
            window.set_ex_style(self.click_through_style);
            debug!("Overlay is now click-through");
            Transition::BecameClickThrough
        }
    }
}
