// utils.rs - Common Utility Functions
//
// Shared helpers for packing/unpacking native message parameters.

/// Convert a Rust string to a null-terminated wide string (UTF-16) for Windows API
#[cfg(windows)]
pub fn wide_string(s: &str) -> Vec<u16> {
    use std::ffi::OsStr;
    use std::os::windows::ffi::OsStrExt;
    OsStr::new(s).encode_wide().chain(std::iter::once(0)).collect()
}

/// Low 16 bits of a message parameter, unsigned
pub fn loword(value: usize) -> u16 {
    (value & 0xFFFF) as u16
}

/// High 16 bits of the low 32 bits of a message parameter, unsigned
pub fn hiword(value: usize) -> u16 {
    ((value >> 16) & 0xFFFF) as u16
}

/// High word reinterpreted as signed, as used by wheel deltas
pub fn signed_hiword(value: usize) -> i16 {
    hiword(value) as i16
}
