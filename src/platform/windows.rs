// platform/windows.rs - Win32 + Direct3D 11 Platform
//
// Wires the Win32 window and the D3D11 backend into a `Platform` the overlay
// core can start on its render thread.

mod d3d11;
mod window;

pub use d3d11::D3D11Gpu;
pub use window::Win32Window;

use log::debug;
use windows::Win32::UI::WindowsAndMessaging::{GetSystemMetrics, SetProcessDPIAware, SM_CMONITORS};

use crate::config::OverlayConfig;
use crate::error::Result;
use crate::platform::Platform;

/// Native Windows desktop
pub struct Win32Platform;

impl Platform for Win32Platform {
    type Window = Win32Window;
    type Gpu = D3D11Gpu;

    fn create(config: &OverlayConfig) -> Result<(Win32Window, D3D11Gpu)> {
        if config.dpi_aware {
            let aware = unsafe { SetProcessDPIAware() };
            debug!("SetProcessDPIAware: {}", aware.as_bool());
        }
        let gpu = D3D11Gpu::new()?;
        let window = Win32Window::create(config)?;
        Ok((window, gpu))
    }

    fn monitor_count() -> usize {
        unsafe { GetSystemMetrics(SM_CMONITORS) }.max(0) as usize
    }
}
