// ui/keys.rs - Virtual Key Mapping
//
// Maps Windows virtual-key codes onto the abstract key identifiers the UI
// layer understands. Codes outside the table produce no key event.

/// Windows virtual-key codes used by the mapping table
pub mod vk {
    pub const BACK: u16 = 0x08;
    pub const TAB: u16 = 0x09;
    pub const RETURN: u16 = 0x0D;
    pub const SHIFT: u16 = 0x10;
    pub const CONTROL: u16 = 0x11;
    pub const MENU: u16 = 0x12;
    pub const PAUSE: u16 = 0x13;
    pub const CAPITAL: u16 = 0x14;
    pub const ESCAPE: u16 = 0x1B;
    pub const SPACE: u16 = 0x20;
    pub const PRIOR: u16 = 0x21;
    pub const NEXT: u16 = 0x22;
    pub const END: u16 = 0x23;
    pub const HOME: u16 = 0x24;
    pub const LEFT: u16 = 0x25;
    pub const UP: u16 = 0x26;
    pub const RIGHT: u16 = 0x27;
    pub const DOWN: u16 = 0x28;
    pub const SNAPSHOT: u16 = 0x2C;
    pub const INSERT: u16 = 0x2D;
    pub const DELETE: u16 = 0x2E;
    pub const KEY_0: u16 = 0x30;
    pub const KEY_9: u16 = 0x39;
    pub const KEY_A: u16 = 0x41;
    pub const KEY_Z: u16 = 0x5A;
    pub const LWIN: u16 = 0x5B;
    pub const RWIN: u16 = 0x5C;
    pub const APPS: u16 = 0x5D;
    pub const NUMPAD0: u16 = 0x60;
    pub const NUMPAD9: u16 = 0x69;
    pub const MULTIPLY: u16 = 0x6A;
    pub const ADD: u16 = 0x6B;
    pub const SUBTRACT: u16 = 0x6D;
    pub const DECIMAL: u16 = 0x6E;
    pub const DIVIDE: u16 = 0x6F;
    pub const F1: u16 = 0x70;
    pub const F24: u16 = 0x87;
    pub const NUMLOCK: u16 = 0x90;
    pub const SCROLL: u16 = 0x91;
    pub const LSHIFT: u16 = 0xA0;
    pub const RSHIFT: u16 = 0xA1;
    pub const LCONTROL: u16 = 0xA2;
    pub const RCONTROL: u16 = 0xA3;
    pub const LMENU: u16 = 0xA4;
    pub const RMENU: u16 = 0xA5;
    pub const BROWSER_BACK: u16 = 0xA6;
    pub const BROWSER_FORWARD: u16 = 0xA7;
    pub const OEM_1: u16 = 0xBA;
    pub const OEM_PLUS: u16 = 0xBB;
    pub const OEM_COMMA: u16 = 0xBC;
    pub const OEM_MINUS: u16 = 0xBD;
    pub const OEM_PERIOD: u16 = 0xBE;
    pub const OEM_2: u16 = 0xBF;
    pub const OEM_3: u16 = 0xC0;
    pub const OEM_4: u16 = 0xDB;
    pub const OEM_5: u16 = 0xDC;
    pub const OEM_6: u16 = 0xDD;
    pub const OEM_7: u16 = 0xDE;
}

/// Abstract key identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Tab,
    LeftArrow,
    RightArrow,
    UpArrow,
    DownArrow,
    PageUp,
    PageDown,
    Home,
    End,
    Insert,
    Delete,
    Backspace,
    Space,
    Enter,
    Escape,
    LeftCtrl,
    LeftShift,
    LeftAlt,
    LeftSuper,
    RightCtrl,
    RightShift,
    RightAlt,
    RightSuper,
    Menu,
    Num0,
    Num1,
    Num2,
    Num3,
    Num4,
    Num5,
    Num6,
    Num7,
    Num8,
    Num9,
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    F13,
    F14,
    F15,
    F16,
    F17,
    F18,
    F19,
    F20,
    F21,
    F22,
    F23,
    F24,
    Apostrophe,
    Comma,
    Minus,
    Period,
    Slash,
    Semicolon,
    Equal,
    LeftBracket,
    Backslash,
    RightBracket,
    GraveAccent,
    CapsLock,
    ScrollLock,
    NumLock,
    PrintScreen,
    Pause,
    Keypad0,
    Keypad1,
    Keypad2,
    Keypad3,
    Keypad4,
    Keypad5,
    Keypad6,
    Keypad7,
    Keypad8,
    Keypad9,
    KeypadDecimal,
    KeypadDivide,
    KeypadMultiply,
    KeypadSubtract,
    KeypadAdd,
    AppBack,
    AppForward,
    /// Generic modifier keys (either side)
    ModCtrl,
    ModShift,
    ModAlt,
    ModSuper,
}

const DIGITS: [Key; 10] = [
    Key::Num0, Key::Num1, Key::Num2, Key::Num3, Key::Num4,
    Key::Num5, Key::Num6, Key::Num7, Key::Num8, Key::Num9,
];

const LETTERS: [Key; 26] = [
    Key::A, Key::B, Key::C, Key::D, Key::E, Key::F, Key::G, Key::H, Key::I,
    Key::J, Key::K, Key::L, Key::M, Key::N, Key::O, Key::P, Key::Q, Key::R,
    Key::S, Key::T, Key::U, Key::V, Key::W, Key::X, Key::Y, Key::Z,
];

const FUNCTION_KEYS: [Key; 24] = [
    Key::F1, Key::F2, Key::F3, Key::F4, Key::F5, Key::F6, Key::F7, Key::F8,
    Key::F9, Key::F10, Key::F11, Key::F12, Key::F13, Key::F14, Key::F15, Key::F16,
    Key::F17, Key::F18, Key::F19, Key::F20, Key::F21, Key::F22, Key::F23, Key::F24,
];

const KEYPAD_DIGITS: [Key; 10] = [
    Key::Keypad0, Key::Keypad1, Key::Keypad2, Key::Keypad3, Key::Keypad4,
    Key::Keypad5, Key::Keypad6, Key::Keypad7, Key::Keypad8, Key::Keypad9,
];

/// Translate a virtual-key code, `None` for codes the UI has no key for
pub fn map_virtual_key(code: u16) -> Option<Key> {
    let key = match code {
        vk::F1..=vk::F24 => FUNCTION_KEYS[(code - vk::F1) as usize],
        vk::NUMPAD0..=vk::NUMPAD9 => KEYPAD_DIGITS[(code - vk::NUMPAD0) as usize],
        vk::KEY_A..=vk::KEY_Z => LETTERS[(code - vk::KEY_A) as usize],
        vk::KEY_0..=vk::KEY_9 => DIGITS[(code - vk::KEY_0) as usize],
        vk::TAB => Key::Tab,
        vk::LEFT => Key::LeftArrow,
        vk::RIGHT => Key::RightArrow,
        vk::UP => Key::UpArrow,
        vk::DOWN => Key::DownArrow,
        vk::PRIOR => Key::PageUp,
        vk::NEXT => Key::PageDown,
        vk::HOME => Key::Home,
        vk::END => Key::End,
        vk::INSERT => Key::Insert,
        vk::DELETE => Key::Delete,
        vk::BACK => Key::Backspace,
        vk::SPACE => Key::Space,
        vk::RETURN => Key::Enter,
        vk::ESCAPE => Key::Escape,
        vk::OEM_7 => Key::Apostrophe,
        vk::OEM_COMMA => Key::Comma,
        vk::OEM_MINUS => Key::Minus,
        vk::OEM_PERIOD => Key::Period,
        vk::OEM_2 => Key::Slash,
        vk::OEM_1 => Key::Semicolon,
        vk::OEM_PLUS => Key::Equal,
        vk::OEM_4 => Key::LeftBracket,
        vk::OEM_5 => Key::Backslash,
        vk::OEM_6 => Key::RightBracket,
        vk::OEM_3 => Key::GraveAccent,
        vk::CAPITAL => Key::CapsLock,
        vk::SCROLL => Key::ScrollLock,
        vk::NUMLOCK => Key::NumLock,
        vk::SNAPSHOT => Key::PrintScreen,
        vk::PAUSE => Key::Pause,
        vk::DECIMAL => Key::KeypadDecimal,
        vk::DIVIDE => Key::KeypadDivide,
        vk::MULTIPLY => Key::KeypadMultiply,
        vk::SUBTRACT => Key::KeypadSubtract,
        vk::ADD => Key::KeypadAdd,
        vk::SHIFT => Key::ModShift,
        vk::CONTROL => Key::ModCtrl,
        vk::MENU => Key::ModAlt,
        vk::LSHIFT => Key::LeftShift,
        vk::LCONTROL => Key::LeftCtrl,
        vk::LMENU => Key::LeftAlt,
        vk::LWIN => Key::LeftSuper,
        vk::RSHIFT => Key::RightShift,
        vk::RCONTROL => Key::RightCtrl,
        vk::RMENU => Key::RightAlt,
        vk::RWIN => Key::RightSuper,
        vk::APPS => Key::Menu,
        vk::BROWSER_BACK => Key::AppBack,
        vk::BROWSER_FORWARD => Key::AppForward,
        _ => return None,
    };
    Some(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contiguous_ranges_map_in_order() {
        assert_eq!(map_virtual_key(0x41), Some(Key::A));
        assert_eq!(map_virtual_key(0x5A), Some(Key::Z));
        assert_eq!(map_virtual_key(0x30), Some(Key::Num0));
        assert_eq!(map_virtual_key(0x39), Some(Key::Num9));
        assert_eq!(map_virtual_key(0x70), Some(Key::F1));
        assert_eq!(map_virtual_key(0x87), Some(Key::F24));
        assert_eq!(map_virtual_key(0x65), Some(Key::Keypad5));
    }

    #[test]
    fn modifiers_have_generic_and_sided_variants() {
        assert_eq!(map_virtual_key(vk::CONTROL), Some(Key::ModCtrl));
        assert_eq!(map_virtual_key(vk::LCONTROL), Some(Key::LeftCtrl));
        assert_eq!(map_virtual_key(vk::RMENU), Some(Key::RightAlt));
        assert_eq!(map_virtual_key(vk::LWIN), Some(Key::LeftSuper));
    }

    #[test]
    fn oem_and_navigation_keys() {
        assert_eq!(map_virtual_key(vk::OEM_3), Some(Key::GraveAccent));
        assert_eq!(map_virtual_key(vk::OEM_PLUS), Some(Key::Equal));
        assert_eq!(map_virtual_key(vk::PRIOR), Some(Key::PageUp));
        assert_eq!(map_virtual_key(vk::BROWSER_FORWARD), Some(Key::AppForward));
        assert_eq!(map_virtual_key(vk::APPS), Some(Key::Menu));
    }

    #[test]
    fn unknown_codes_are_ignored() {
        assert_eq!(map_virtual_key(0x00), None);
        assert_eq!(map_virtual_key(0x0C), None); // VK_CLEAR
        assert_eq!(map_virtual_key(0xFF), None);
        assert_eq!(map_virtual_key(0x1234), None);
    }
}
